use clap::{Args, Parser, Subcommand};

use heritage::api::{
    InputError, SimulationArgs, build_baseline, build_input, run_http_server, simulation_report,
};
use heritage::config::{ServerConfig, init_logging};

#[derive(Parser, Debug)]
#[command(name = "heritage", about = "Real-estate portfolio tracker and simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the web app and JSON API.
    Serve(ServerConfig),
    /// Evaluate one scenario and print the report as JSON.
    Simulate(SimulateCommand),
}

#[derive(Args, Debug)]
struct SimulateCommand {
    #[command(flatten)]
    simulation: SimulationArgs,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    baseline_net_worth: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    baseline_monthly_income: f64,
}

#[derive(Debug, thiserror::Error)]
enum SimulateError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

fn simulate(command: SimulateCommand) -> Result<String, SimulateError> {
    let input = build_input(command.simulation)?;
    let baseline = build_baseline(
        command.baseline_net_worth,
        command.baseline_monthly_income,
    )?;
    Ok(serde_json::to_string_pretty(&simulation_report(
        input, baseline,
    ))?)
}

#[tokio::main]
async fn main() {
    init_logging();

    match Cli::parse().command {
        Command::Serve(config) => {
            if let Err(e) = run_http_server(config).await {
                log::error!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Simulate(command) => match simulate(command) {
            Ok(report) => println!("{report}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
    }
}
