//! CLI argument definitions for quotegate.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Quote for one symbol |
//! | `quotes` | Quotes for a comma-separated list |
//! | `multi` | Quotes for several symbols in one call |
//! | `companies` | Companies matching a name or symbol |
//! | `instance` | Downstream instance metadata |
//! | `kill` | Ask the downstream instance to shut down |
//! | `breakers` | Breaker state per operation |
//!
//! # Examples
//!
//! ```bash
//! quotegate quote AAPL
//! quotegate quotes AAPL,MSFT --pretty
//! QUOTEGATE_QUOTES_SERVICE=localhost:8086 quotegate companies pivotal
//! RUST_LOG=quotegate_core=debug quotegate instance
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Resilient quote lookups against a downstream quotes service.
#[derive(Debug, Parser)]
#[command(name = "quotegate", author, version, about)]
pub struct Cli {
    /// Downstream protocol. Overrides QUOTEGATE_DOWNSTREAM_PROTOCOL.
    #[arg(long, global = true, value_enum)]
    pub protocol: Option<ProtocolArg>,

    /// Downstream service address or name. Overrides QUOTEGATE_QUOTES_SERVICE.
    #[arg(long, global = true)]
    pub service: Option<String>,

    /// Budget per downstream call in milliseconds. Overrides QUOTEGATE_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Pretty-print JSON output.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProtocolArg {
    Http,
    Https,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the quote for one symbol.
    Quote(SymbolArgs),
    /// Fetch quotes for a comma-separated symbol list.
    Quotes(ListArgs),
    /// Fetch quotes for several symbols in one downstream call.
    Multi(MultiArgs),
    /// Search companies by name or symbol.
    Companies(NameArgs),
    /// Show downstream instance metadata.
    Instance,
    /// Ask the downstream instance to terminate. Not circuit-protected.
    Kill,
    /// Show circuit breaker state per operation.
    Breakers,
}

#[derive(Debug, Args)]
pub struct SymbolArgs {
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Symbols separated by commas, e.g. AAPL,MSFT.
    pub list: String,
}

#[derive(Debug, Args)]
pub struct MultiArgs {
    pub symbols: Vec<String>,
}

#[derive(Debug, Args)]
pub struct NameArgs {
    pub name: String,
}
