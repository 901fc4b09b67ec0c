use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome flag carried by a quote record.
///
/// The downstream may send any string here; values other than `OK` and
/// `FAILED` are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuoteStatus {
    Ok,
    Failed,
    Other(String),
}

impl QuoteStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => "OK",
            Self::Failed => "FAILED",
            Self::Other(value) => value,
        }
    }
}

impl Display for QuoteStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for QuoteStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "OK" => Self::Ok,
            "FAILED" => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl From<QuoteStatus> for String {
    fn from(value: QuoteStatus) -> Self {
        match value {
            QuoteStatus::Other(value) => value,
            other => other.as_str().to_owned(),
        }
    }
}

/// Quote record as served by the downstream quotes service.
///
/// Only `symbol` and `status` carry meaning for the gateway. Every other
/// field (`name`, `lastPrice`, `timestamp`, `changeYTD`, ...) is kept as raw
/// JSON in [`Quote::fields`] and re-encoded exactly as received. An empty
/// `symbol` means unset, which is what [`Quote::default`] produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QuoteStatus>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Quote {
    /// Placeholder quote for a symbol whose lookup could not be completed.
    pub fn failed(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            status: Some(QuoteStatus::Failed),
            ..Self::default()
        }
    }

    /// Opaque downstream field by its wire name, e.g. `"lastPrice"`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == Some(QuoteStatus::Failed)
    }
}
