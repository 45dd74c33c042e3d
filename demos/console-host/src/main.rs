//! Console host for the editor bridge.
//!
//! Run with: cargo run -p console-host-demo
//!
//! Connects to `ws://$EDITOR_BRIDGE_HOST:$EDITOR_BRIDGE_PORT/` and reads host
//! events from stdin: `focus`, `blur`, `reconnect`, `activate-session`,
//! `config <host> <port>`, `status`, `quit`.

mod host;
mod shell;

use std::sync::Arc;

use anyhow::Context;
use editor_bridge_core::{ConnectionConfig, HostCommand, SessionId, WindowState};
use editor_bridge_session::{BridgeController, EditorHosts};
use editor_bridge_transport::WebSocketConnector;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::host::ConsoleHost;

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Focus(bool),
    Host(HostCommand),
    Config(ConnectionConfig),
    Status,
    Quit,
}

fn parse_input(line: &str) -> anyhow::Result<Option<Input>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let input = match verb {
        "focus" => Input::Focus(true),
        "blur" => Input::Focus(false),
        "reconnect" => Input::Host(HostCommand::Reconnect),
        "activate-session" => Input::Host(HostCommand::ActivateSession),
        "status" => Input::Status,
        "quit" | "exit" => Input::Quit,
        "config" => {
            let host = words.next().context("usage: config <host> <port>")?;
            let port = words
                .next()
                .context("usage: config <host> <port>")?
                .parse()
                .context("port must be a number between 1 and 65535")?;
            let config = ConnectionConfig::new(host, port);
            config.validate()?;
            Input::Config(config)
        }
        other => anyhow::bail!("unknown input: {other}"),
    };
    Ok(Some(input))
}

// Bus handlers and host callbacks share one thread, so `deactivate` never
// interleaves with a half-run command.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ConnectionConfig::from_env().context("invalid bridge configuration")?;
    let session_id = SessionId::new(Uuid::new_v4().to_string());
    let host = Arc::new(ConsoleHost::new());

    let controller = BridgeController::new(
        session_id,
        WebSocketConnector::new(),
        config,
        EditorHosts::from_single(&host),
    );
    tracing::info!(session = %controller.session_id(), "Console host started");

    if let Err(e) = controller.activate().await {
        tracing::warn!("{e}; type `reconnect` to retry");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_input(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("{e:#}");
                continue;
            }
        };

        let result = match input {
            Input::Focus(focused) => controller.window_state_changed(WindowState { focused }),
            Input::Host(command) => controller.run_host_command(command).await,
            Input::Config(config) => controller.configuration_changed(config).await.map(|_| ()),
            Input::Status => {
                tracing::info!(
                    connection = ?controller.connection_state(),
                    activation = ?controller.activation_state(),
                    server = %controller.connection().config().authority(),
                    "Status"
                );
                for terminal in host.describe_terminals() {
                    tracing::info!("{terminal}");
                }
                Ok(())
            }
            Input::Quit => break,
        };

        if let Err(e) = result {
            tracing::warn!("{e}");
        }
    }

    controller.deactivate();
    Ok(())
}
