mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::loan::LoanArgs;

/// Mortgage amortization schedules with decimal precision
#[derive(Parser)]
#[command(
    name = "msim",
    version,
    about = "Mortgage amortization schedules with decimal precision",
    long_about = "Computes level payments, full amortization schedules, yearly \
                  aggregates, and best/worst-case payments for capped/floored \
                  variable rates. Schedules export as CSV with fixed decimal \
                  precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Full amortization result: summary, schedule, and yearly aggregates
    Amortize(LoanArgs),
    /// Monthly schedule rows shaped for export (rate to 5 dp, money to 2 dp)
    Schedule(LoanArgs),
    /// Yearly aggregate rows shaped for export
    Yearly(LoanArgs),
    /// Summary payment figures only
    Payment(LoanArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::loan::run_amortize(args),
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::Yearly(args) => commands::loan::run_yearly(args),
        Commands::Payment(args) => commands::loan::run_payment(args),
        Commands::Version => {
            println!("msim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
