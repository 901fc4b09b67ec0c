//! # Domain Models
//!
//! Request-scoped values exchanged with the downstream quotes service.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Quote`] | Quote record, opaque apart from `symbol` and `status` |
//! | [`QuoteStatus`] | `OK`, `FAILED` or a downstream-provided flag |
//! | [`CompanyInfo`] | Company search match |
//! | [`InstanceInfo`] | Downstream instance metadata |
//! | [`SymbolSet`] | Caller-ordered symbols, duplicates kept |

mod company;
mod instance;
mod quote;
mod symbol_set;

pub use company::CompanyInfo;
pub use instance::{InstanceInfo, APPLICATION_NAME, CONTAINER_ADDR, INSTANCE_ADDR, INSTANCE_INDEX};
pub use quote::{Quote, QuoteStatus};
pub use symbol_set::SymbolSet;
