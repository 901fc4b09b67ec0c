//! Substitute results served when a guarded call cannot complete.
//!
//! Every function here is pure: no I/O, no failure paths, output fixed by
//! the request alone.

use crate::domain::{CompanyInfo, InstanceInfo, Quote, SymbolSet};

/// `FAILED` placeholder for the requested symbol.
pub fn quote(symbol: &str) -> Quote {
    Quote::failed(symbol)
}

/// An empty batch. Callers must read this as fully degraded, not as "no
/// matches".
pub fn quotes(_symbols: &SymbolSet) -> Vec<Quote> {
    Vec::new()
}

pub fn companies(_name: &str) -> Vec<CompanyInfo> {
    Vec::new()
}

pub fn instance_info() -> InstanceInfo {
    InstanceInfo::placeholder()
}
