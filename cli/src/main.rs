//! CLI entry point for proforma.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use proforma::VolumeBasis;

use proforma_cli::commands::Session;
use proforma_cli::config::{Config, Preset, ScenarioConfig};
use proforma_cli::input::{Override, parse_basis};

#[derive(Parser)]
#[command(name = "proforma")]
#[command(about = "Pro-forma income statement scenarios for exchange operators")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "proforma.toml", global = true)]
    config: PathBuf,

    #[command(flatten)]
    scenario: ScenarioArgs,

    /// Override a baseline figure, e.g. --set brokerage_fees=(1,250)
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    overrides: Vec<Override>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ScenarioArgs {
    /// Start from a named scenario
    #[arg(long, value_enum, global = true)]
    preset: Option<Preset>,

    /// Commission rate change in basis points
    #[arg(long, allow_negative_numbers = true, global = true)]
    commission_bps: Option<f64>,

    /// Traded value change in percent
    #[arg(long, allow_negative_numbers = true, global = true)]
    volume_pct: Option<f64>,

    /// Interest rate change in basis points
    #[arg(long, allow_negative_numbers = true, global = true)]
    rate_bps: Option<f64>,

    /// Volume basis: total or adtv
    #[arg(long, value_parser = parse_basis, global = true)]
    basis: Option<VolumeBasis>,
}

impl From<ScenarioArgs> for ScenarioConfig {
    fn from(args: ScenarioArgs) -> Self {
        ScenarioConfig {
            preset: args.preset,
            commission_rate_delta_bps: args.commission_bps,
            traded_value_change_pct: args.volume_pct,
            interest_rate_delta_bps: args.rate_bps,
            volume_basis: args.basis,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Show the pro-forma income statement
    Evaluate,

    /// Net profit grid over the configured sensitivity axes
    Matrix,

    /// Bridge baseline net profit to scenario net profit line by line
    Bridge,

    /// Investment income under each interest-rate move
    Rates,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let session = match Session::new(config, cli.scenario.into(), &cli.overrides) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(e.exit_code());
        }
    };

    let result = match cli.command {
        Command::Evaluate => session.evaluate(cli.json),
        Command::Matrix => session.matrix(cli.json),
        Command::Bridge => session.bridge(cli.json),
        Command::Rates => session.rates(cli.json),
    };

    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(e.exit_code());
        }
    }
}
