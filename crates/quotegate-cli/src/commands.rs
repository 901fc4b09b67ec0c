use std::time::Duration;

use quotegate_core::{DownstreamConfig, GatewayConfig, Protocol, QuotesClient, SymbolSet};
use serde_json::Value;
use tracing::info;

use crate::cli::{Cli, Command, ProtocolArg};
use crate::error::CliError;

impl From<ProtocolArg> for Protocol {
    fn from(value: ProtocolArg) -> Self {
        match value {
            ProtocolArg::Http => Self::Http,
            ProtocolArg::Https => Self::Https,
        }
    }
}

/// Environment configuration with command-line overrides applied.
pub fn resolve_config(cli: &Cli) -> Result<GatewayConfig, CliError> {
    let mut config = GatewayConfig::from_env()?;
    let call_timeout = cli
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(config.downstream.call_timeout);
    let protocol = cli
        .protocol
        .map(Protocol::from)
        .unwrap_or(config.downstream.protocol);
    let service = cli
        .service
        .clone()
        .unwrap_or_else(|| config.downstream.service.clone());

    config.downstream = DownstreamConfig::new(protocol, service)?.with_call_timeout(call_timeout);
    Ok(config)
}

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    let config = resolve_config(cli)?;
    info!(
        service = %config.downstream.service,
        protocol = %config.downstream.protocol,
        "using downstream"
    );
    let client = QuotesClient::from_config(config);

    let value = match &cli.command {
        Command::Quote(args) => serde_json::to_value(client.get_quote(&args.symbol).await)?,
        Command::Quotes(args) => serde_json::to_value(client.get_quotes(&args.list).await)?,
        Command::Multi(args) => {
            let symbols = SymbolSet::new(args.symbols.iter().cloned());
            serde_json::to_value(client.get_multiple_quotes(&symbols).await)?
        }
        Command::Companies(args) => serde_json::to_value(client.get_companies(&args.name).await)?,
        Command::Instance => serde_json::to_value(client.get_instance_info().await)?,
        Command::Kill => kill_output(client.kill_instance().await?),
        Command::Breakers => serde_json::to_value(client.breaker_snapshots())?,
    };
    Ok(value)
}

/// Keeps JSON bodies structured and wraps anything else as a string.
fn kill_output(body: String) -> Value {
    match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => Value::String(body),
    }
}
