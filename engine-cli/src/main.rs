//! Entry point: config -> logging -> engine construction -> adapter wiring -> run().

use anyhow::Context;
use clap::Parser;
use engine_core::prelude::*;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Event-driven equities trading engine")]
struct Cli {
    /// Path to a JSON or TOML config file (default: config/config.json)
    #[arg(long)]
    config: Option<String>,

    /// Emit logs as JSON instead of plain text
    #[arg(long)]
    json_logs: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("engine exited with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let args = Cli::parse();

    let config = Config::load(args.config.as_deref())?;

    let _log_guard = engine_core::utils::logger::init_logger(
        "info",
        &config.engine_settings.log_file_path,
        args.json_logs,
    )?;

    tracing::info!(mode = %config.engine_settings.mode, "loaded configuration");

    let mode: EngineMode = config.engine_settings.mode.parse()?;

    let scripting = ScriptingInterface::new(
        config.scripting.publish_endpoint.clone(),
        config.scripting.subscribe_endpoint.clone(),
    );
    let mut engine = EngineCore::new(mode, scripting);

    match mode {
        EngineMode::Mock => {
            engine.set_market_data_handler(Box::new(MockMarketDataHandler::new(
                config.mock_csv_path.clone(),
                engine.sender(),
            )));
        }
        EngineMode::Live => {
            anyhow::bail!(
                "live mode has no BrokerClient wired into this binary: the broker gateway's \
                 wire-level client (framing, auth, the full callback surface) is out of scope \
                 for this crate; implement engine_core::market_data::BrokerClient and wire a \
                 LiveGatewayAdapter in a downstream binary to run in live mode"
            );
        }
    }

    engine.connect_market_data()?;

    let shutdown_sender = engine.sender();
    ctrlc::set_handler(move || {
        tracing::warn!("received SIGINT, posting shutdown");
        shutdown_sender.push(Event::Shutdown);
    })
    .context("failed to install SIGINT handler")?;

    engine.run()?;
    Ok(())
}
