use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use odekit::api::{respond, respond_json, SolveRequest};
use odekit::{solve_summary, EquationClass, SolverConfig, Solver};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML file with solver limits
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an equation and print the derivation
    Solve {
        /// The equation, optionally followed by `; y(0) = 1` style conditions
        equation: String,
        /// Method to use (separable, homogeneous, exact, linear, bernoulli, reducible,
        /// constant-coef, undetermined, integrating-factor); detected when omitted
        #[arg(long = "type", short = 't')]
        class: Option<String>,
        /// Print the JSON response instead of text
        #[arg(long)]
        json: bool,
    },
    /// Read a JSON request from stdin and write the JSON response
    Json,
    /// Report which method applies and why
    Classify {
        equation: String,
        #[arg(long = "type", short = 't')]
        class: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SolverConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SolverConfig::default(),
    };
    let solver = Solver::new(config);

    match cli.command {
        Commands::Solve {
            equation,
            class,
            json,
        } => {
            let class = class.as_deref().map(str::parse::<EquationClass>).transpose()?;
            if json {
                let request = SolveRequest {
                    equation,
                    equation_type: class,
                    initial_conditions: Vec::new(),
                };
                println!("{}", serde_json::to_string_pretty(&respond(&solver, &request))?);
                return Ok(());
            }
            let result = match class {
                Some(class) => solver.solve(&equation, class),
                None => solver.solve_auto(&equation),
            };
            match result {
                Ok(result) => {
                    for line in solve_summary(&result) {
                        println!("{line}");
                    }
                }
                Err(err) => bail!("{} ({})", err, err.kind()),
            }
        }
        Commands::Json => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("reading the request from stdin")?;
            println!("{}", respond_json(&solver, &body));
        }
        Commands::Classify { equation, class } => {
            let class = class.as_deref().map(str::parse::<EquationClass>).transpose()?;
            match solver.classify(&equation, class) {
                Ok(found) => println!("{}: {}", found.class, found.reason),
                Err(err) => bail!("{} ({})", err, err.kind()),
            }
        }
    }
    Ok(())
}
