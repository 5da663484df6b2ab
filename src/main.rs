//! Contract manifest checker.
//!
//! Loads the configured manifest, validates every channel's contract and
//! prints the normalized manifest on stdout.

use std::process::ExitCode;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use event_contracts::adapters::manifest::{render_manifest, ManifestLoader};
use event_contracts::config::{AppConfig, LoggingConfig};
use event_contracts::domain::contract::Direction;

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let json_layer = logging.json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!logging.json).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = config.validate() {
        eprintln!("Invalid configuration: {err}");
        return ExitCode::FAILURE;
    }

    init_tracing(&config.logging);

    let Some(path) = config.contracts.manifest_path.as_ref() else {
        tracing::warn!("No manifest configured, set EVENT_CONTRACTS__CONTRACTS__MANIFEST_PATH");
        return ExitCode::SUCCESS;
    };

    let loader = ManifestLoader::new(config.contracts.max_events_per_direction);
    let registry = match loader.load_file(path) {
        Ok(registry) => registry,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "Manifest rejected");
            return ExitCode::FAILURE;
        }
    };

    for (channel, bundle) in registry.iter() {
        tracing::info!(
            channel = %channel,
            client_to_server = bundle.map(Direction::ClientToServer).len(),
            server_to_client = bundle.map(Direction::ServerToClient).len(),
            inter_server = bundle.map(Direction::InterServer).len(),
            shared_state = bundle.shared_state().len(),
            "Channel contract loaded"
        );
    }
    tracing::info!(
        channels = registry.len(),
        ack_timeout_ms = config.contracts.default_ack_timeout_ms,
        "Manifest valid"
    );

    match render_manifest(&registry) {
        Ok(rendered) => {
            print!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to render manifest");
            ExitCode::FAILURE
        }
    }
}
