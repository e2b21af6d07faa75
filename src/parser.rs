//! Equation grammar.
//!
//! Precedence, loosest first: `+ -`, `* /` and juxtaposition, unary sign, `^`/`**`
//! (right associative, so `-x^2` is `-(x^2)` and `x^-2` is allowed). `dy/dx`, `d2y/dx2`,
//! `d^2y/dx^2`, `y'` and `y''` are single derivative tokens, never a division.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{alpha1, char, digit1, multispace0};
use nom::combinator::{all_consuming, map, not, opt, peek, recognize};
use nom::error::{ErrorKind, ParseError};
use nom::multi::{fold_many0, many0_count};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;
use num_bigint::BigInt;
use num_traits::Num;

use crate::equation::{Equation, InitialCondition};
use crate::error::{Result, SolveError};
use crate::expr::{self, is_arbitrary_constant, Expr, Rational};

const FUNCTIONS: [&str; 15] = [
    "arcsin", "arccos", "arctan", "asin", "acos", "atan", "sqrt", "sin", "cos", "tan", "exp",
    "log", "abs", "ln", "pi",
];

/// Error carried through the nom combinators: where parsing stopped and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError<'a> {
    pub input: &'a str,
    pub message: String,
}

impl<'a> SyntaxError<'a> {
    fn new(input: &'a str, message: impl Into<String>) -> Self {
        SyntaxError {
            input,
            message: message.into(),
        }
    }
}

impl<'a> ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        let message = match input.chars().next() {
            None => "unexpected end of input".to_string(),
            Some(c) => format!("unexpected '{c}' ({kind:?})"),
        };
        SyntaxError { input, message }
    }

    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }

    fn or(self, other: Self) -> Self {
        // the branch that got further explains the failure better
        if other.input.len() < self.input.len() {
            other
        } else {
            self
        }
    }
}

type PResult<'a, T> = IResult<&'a str, T, SyntaxError<'a>>;

/// Names of the independent and dependent variables the grammar recognises.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grammar {
    pub independent: String,
    pub dependent: String,
}

impl Default for Grammar {
    fn default() -> Self {
        Grammar::new("x", "y")
    }
}

/// Parses an expression over `x` and `y`.
pub fn parse_expr(input: &str) -> Result<Expr> {
    Grammar::default().expr(input)
}

/// Parses an equation in `x` and `y`, with optional `;`-separated initial conditions.
pub fn parse_equation(input: &str) -> Result<Equation> {
    Grammar::default().equation(input)
}

impl Grammar {
    pub fn new(independent: impl Into<String>, dependent: impl Into<String>) -> Self {
        Grammar {
            independent: independent.into(),
            dependent: dependent.into(),
        }
    }

    pub fn expr(&self, input: &str) -> Result<Expr> {
        check_balanced(input, 0)?;
        match all_consuming(ws(|i| self.sum(i)))(input) {
            Ok((_, expr)) => Ok(expr),
            Err(e) => Err(to_solve_error(input, 0, e)),
        }
    }

    /// The first segment is the equation; every following segment is an initial condition.
    pub fn equation(&self, text: &str) -> Result<Equation> {
        let mut segments = split_segments(text).into_iter();
        let (offset, body) = segments
            .next()
            .ok_or_else(|| SolveError::parse("empty equation", 1))?;
        check_balanced(body, offset)?;
        let sides = all_consuming(tuple((
            ws(|i| self.sum(i)),
            preceded(char('='), ws(|i| self.sum(i))),
        )))(body);
        let (lhs, rhs) = match sides {
            Ok((_, sides)) => sides,
            Err(e) => {
                let err = to_solve_error(body, offset, e);
                tracing::debug!(target: "parser", input = body, error = %err, "rejected");
                return Err(err);
            }
        };
        // single letters other than the variables are parameters, but the constant names are taken
        let mut symbols = lhs.free_symbols().into_iter().chain(rhs.free_symbols());
        if let Some(name) = symbols.find(|s| is_arbitrary_constant(s)) {
            let column = offset + body.find(name.as_str()).unwrap_or(0) + 1;
            return Err(SolveError::parse(
                format!("'{name}' is reserved for constants of integration"),
                column,
            ));
        }
        let mut conditions = Vec::new();
        for (offset, segment) in segments {
            conditions.push(self.condition(segment, offset)?);
        }
        let equation = Equation::from_sides(lhs, rhs, self, conditions)?;
        tracing::debug!(target: "parser", %equation, order = equation.order(), "parsed equation");
        Ok(equation)
    }

    /// `y(x0) = v`, `y'(x0) = v`, ...
    pub fn initial_condition(&self, text: &str) -> Result<InitialCondition> {
        self.condition(text.trim(), 0)
    }

    fn condition(&self, text: &str, offset: usize) -> Result<InitialCondition> {
        check_balanced(text, offset)?;
        let parsed = all_consuming(tuple((
            ws(tag(self.dependent.as_str())),
            many0_count(char('\'')),
            delimited(ws(char('(')), |i| self.sum(i), ws(char(')'))),
            preceded(ws(char('=')), |i| self.sum(i)),
        )))(text);
        // the point and value are checked for stray variables once the solution is known
        let (_, (_, order, at, value)) = parsed.map_err(|e| to_solve_error(text, offset, e))?;
        Ok(InitialCondition {
            order: order as u32,
            at,
            value,
        })
    }

    fn sum<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (rest, init) = self.product(input)?;
        fold_many0(
            pair(ws(alt((char('+'), char('-')))), |i| self.product(i)),
            move || init.clone(),
            |acc, (op, rhs)| match op {
                '+' => expr::add(acc, rhs),
                _ => expr::sub(acc, rhs),
            },
        )(rest)
    }

    fn product<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (rest, init) = self.unary(input)?;
        fold_many0(
            alt((
                pair(
                    ws(alt((terminated(char('*'), not(char('*'))), char('/')))),
                    |i| self.unary(i),
                ),
                // juxtaposition: `2x`, `x y`, `(x+1)(x-1)`, `(x+y)dx`
                map(|i| self.power(i), |rhs| ('*', rhs)),
            )),
            move || init.clone(),
            |acc, (op, rhs)| match op {
                '*' => expr::mul(acc, rhs),
                _ => expr::div(acc, rhs),
            },
        )(rest)
    }

    fn unary<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        alt((
            map(preceded(ws(char('-')), |i| self.unary(i)), expr::neg),
            preceded(ws(char('+')), |i| self.unary(i)),
            |i| self.power(i),
        ))(input)
    }

    fn power<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (rest, base) = self.primary(input)?;
        match preceded(ws(alt((tag("**"), tag("^")))), |i| self.unary(i))(rest) {
            Ok((next, exponent)) => Ok((next, expr::pow(base, exponent))),
            Err(nom::Err::Error(_)) => Ok((rest, base)),
            Err(e) => Err(e),
        }
    }

    fn primary<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, _) = multispace0(input)?;
        let (rest, expr) = alt((
            |i| self.parens(i),
            |i| self.leibniz(i),
            number,
            |i| self.word(i),
        ))(input)?;
        let (rest, _) = multispace0(rest)?;
        Ok((rest, expr))
    }

    fn parens<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        delimited(char('('), ws(|i| self.sum(i)), char(')'))(input)
    }

    /// `dy/dx`, `d2y/dx2`, `d^2y/dx^2`
    fn leibniz<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let order = || opt(preceded(opt(char('^')), digit1));
        let (rest, (_, top, _, _, _, _, bottom)) = tuple((
            char('d'),
            order(),
            ws(tag(self.dependent.as_str())),
            ws(char('/')),
            char('d'),
            tag(self.independent.as_str()),
            order(),
        ))(input)?;
        let (rest, _) = not(peek(alpha1))(rest)?;
        let parse_order = |o: Option<&str>| o.map_or(Some(1), |d| d.parse::<u32>().ok());
        match (parse_order(top), parse_order(bottom)) {
            (Some(a), Some(b)) if a == b && a > 0 => Ok((
                rest,
                Expr::derivative(&self.dependent, &self.independent, a),
            )),
            _ => Err(nom::Err::Failure(SyntaxError::new(
                input,
                "derivative orders in numerator and denominator differ",
            ))),
        }
    }

    /// Function applications, constants and variable names.
    fn word<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (after_run, run) = alpha1(input)?;
        let first = self.first_token(run).ok_or_else(|| {
            nom::Err::Failure(SyntaxError::new(input, format!("unknown symbol '{run}'")))
        })?;
        let rest = &input[first.len()..];
        match first {
            "pi" => Ok((rest, Expr::var("pi"))),
            "e" => Ok((rest, Expr::e())),
            name if FUNCTIONS.contains(&name) => {
                let (rest, arg) = delimited(ws(char('(')), |i| self.sum(i), char(')'))(rest)
                    .map_err(|_| {
                        nom::Err::Failure(SyntaxError::new(
                            rest,
                            format!("expected '(' after {name}"),
                        ))
                    })?;
                Ok((rest, apply(name, arg)))
            }
            d if d.len() > 1 => Ok((rest, Expr::var(d))),
            letter => self.symbol(letter, rest, after_run.len() == rest.len()),
        }
    }

    /// A single-letter symbol, with an optional numeric suffix (`C1`), primes and `(x)`.
    fn symbol<'a>(&self, letter: &'a str, rest: &'a str, ends_run: bool) -> PResult<'a, Expr> {
        let (rest, digits) = if ends_run {
            opt(digit1)(rest)?
        } else {
            (rest, None)
        };
        let name = format!("{letter}{}", digits.unwrap_or(""));
        let (rest, primes) = many0_count(char('\''))(rest)?;
        if primes > 0 {
            if name != self.dependent {
                return Err(nom::Err::Failure(SyntaxError::new(
                    rest,
                    format!("only {} can carry primes", self.dependent),
                )));
            }
            return Ok((
                rest,
                Expr::derivative(&self.dependent, &self.independent, primes as u32),
            ));
        }
        if name == self.dependent {
            // `y(x)` is the same as `y`
            let call = tuple((
                ws(char('(')),
                tag(self.independent.as_str()),
                ws(char(')')),
            ))(rest);
            if let Ok((after, _)) = call {
                return Ok((after, Expr::var(name)));
            }
        }
        Ok((rest, Expr::var(name)))
    }

    /// Longest known token at the start of a run of letters. A run that does not split into
    /// known tokens is only accepted when it is a single letter.
    fn first_token<'r>(&self, run: &'r str) -> Option<&'r str> {
        if run.len() == 1 {
            return Some(run);
        }
        let mut pos = 0;
        let mut first = None;
        while pos < run.len() {
            let token = self.known_token(&run[pos..])?;
            first.get_or_insert(&run[pos..pos + token]);
            pos += token;
        }
        first
    }

    fn known_token(&self, s: &str) -> Option<usize> {
        let differentials = [
            format!("d{}", self.independent),
            format!("d{}", self.dependent),
        ];
        FUNCTIONS
            .iter()
            .copied()
            .chain(differentials.iter().map(String::as_str))
            .filter(|w| s.starts_with(w))
            .map(str::len)
            .max()
            .or_else(|| {
                [self.independent.as_str(), self.dependent.as_str(), "e"]
                    .into_iter()
                    .find(|v| s.starts_with(v))
                    .map(str::len)
            })
    }
}

fn apply(name: &str, arg: Expr) -> Expr {
    match name {
        "sin" => Expr::Sin(arg.boxed()),
        "cos" => Expr::Cos(arg.boxed()),
        "tan" => Expr::Tan(arg.boxed()),
        "asin" | "arcsin" => Expr::Asin(arg.boxed()),
        "acos" | "arccos" => Expr::Acos(arg.boxed()),
        "atan" | "arctan" => Expr::Atan(arg.boxed()),
        "exp" => Expr::Exp(arg.boxed()),
        "sqrt" => Expr::sqrt(arg),
        "abs" => Expr::Abs(arg.boxed()),
        _ => Expr::Log(arg.boxed()),
    }
}

/// Integer or decimal literal, converted to an exact rational.
fn number(input: &str) -> PResult<'_, Expr> {
    let (rest, text) = recognize(pair(digit1, opt(pair(char('.'), digit1))))(input)?;
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
    let digits = format!("{int_part}{frac_part}");
    let numer = BigInt::from_str_radix(&digits, 10)
        .map_err(|_| nom::Err::Failure(SyntaxError::new(input, "malformed number")))?;
    let denom = num_traits::pow(BigInt::from(10), frac_part.len());
    Ok((rest, Expr::Constant(Rational::new(numer, denom))))
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn split_segments(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == ';' || c == '\n' {
            push_segment(&mut out, text, start, i);
            start = i + 1;
        }
    }
    push_segment(&mut out, text, start, text.len());
    out
}

fn push_segment<'a>(out: &mut Vec<(usize, &'a str)>, text: &'a str, start: usize, end: usize) {
    let raw = &text[start..end];
    let trimmed = raw.trim_start();
    if !trimmed.trim_end().is_empty() {
        out.push((start + raw.len() - trimmed.len(), trimmed.trim_end()));
    }
}

fn check_balanced(text: &str, offset: usize) -> Result<()> {
    let mut open = Vec::new();
    for (i, c) in text.char_indices() {
        match c {
            '(' => open.push(i),
            ')' if open.pop().is_none() => {
                return Err(SolveError::parse("unmatched ')'", offset + i + 1));
            }
            _ => {}
        }
    }
    match open.first() {
        Some(i) => Err(SolveError::parse("unmatched '('", offset + i + 1)),
        None => Ok(()),
    }
}

fn to_solve_error(text: &str, offset: usize, err: nom::Err<SyntaxError<'_>>) -> SolveError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let column = offset + text.len() - e.input.len() + 1;
            let message = if e.input.is_empty() {
                "unexpected end of input".to_string()
            } else {
                e.message
            };
            SolveError::parse(message, column)
        }
        nom::Err::Incomplete(_) => SolveError::parse("incomplete input", offset + text.len() + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, int, mul, neg, pow};

    #[test]
    fn implicit_multiplication() {
        let e = parse_expr("2xy").unwrap();
        assert_eq!(e, mul(mul(int(2), Expr::var("x")), Expr::var("y")));
    }

    #[test]
    fn unary_minus_binds_looser_than_power() {
        let e = parse_expr("-x^2").unwrap();
        assert_eq!(e, neg(pow(Expr::var("x"), int(2))));
        let e = parse_expr("x**-2").unwrap();
        assert_eq!(e, pow(Expr::var("x"), neg(int(2))));
    }

    #[test]
    fn leibniz_and_prime_notation_agree() {
        let a = parse_expr("dy/dx + y").unwrap();
        let b = parse_expr("y' + y").unwrap();
        assert_eq!(a, b);
        assert_eq!(
            parse_expr("d^2y/dx^2").unwrap(),
            parse_expr("y''").unwrap()
        );
        assert_eq!(parse_expr("d2y/dx2").unwrap(), Expr::derivative("y", "x", 2));
    }

    #[test]
    fn decimals_are_exact() {
        assert_eq!(parse_expr("2.5").unwrap(), Expr::constant(5, 2));
    }

    #[test]
    fn unknown_words_are_rejected() {
        let err = parse_expr("foo + x").unwrap_err();
        assert_eq!(err.kind(), "parse_error");
    }

    #[test]
    fn numbered_constants() {
        assert_eq!(
            parse_expr("C1 + x").unwrap(),
            add(Expr::var("C1"), Expr::var("x"))
        );
    }

    #[test]
    fn parameters_are_symbols_but_constant_names_are_reserved() {
        let eq = parse_equation("y' = k*y").unwrap();
        assert!(eq.residual().free_symbols().contains("k"));
        let err = parse_equation("y' = C*y").unwrap_err();
        assert_eq!(err.kind(), "parse_error");
        assert!(err.message().contains("reserved"));
    }

    #[test]
    fn segments_keep_their_offsets() {
        assert_eq!(
            split_segments("y' = y; y(0) = 1"),
            vec![(0, "y' = y"), (8, "y(0) = 1")]
        );
    }
}
