//! Builds the wire requests sent to the downstream quotes service.
//!
//! | Call | Request |
//! |------|---------|
//! | batch quotes | `GET /v1/quotes?q=A,B,C` |
//! | company search | `GET /v1/company/{name}` |
//! | instance info | `GET /v1/basics` |
//! | admin kill | `GET /v1/basics?doit=true` |

use crate::config::Protocol;
use crate::domain::SymbolSet;
use crate::http_client::HttpRequest;

const JSON: &str = "application/json";

/// Request factory bound to one resolved downstream address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallShaper {
    base_url: String,
    timeout_ms: u64,
}

impl CallShaper {
    pub fn new(protocol: Protocol, address: &str, timeout_ms: u64) -> Self {
        Self {
            base_url: format!("{protocol}://{}", address.trim_end_matches('/')),
            timeout_ms,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One call covering every symbol, or `None` when there is nothing to ask.
    ///
    /// Symbols are encoded one by one so the separating commas stay literal.
    pub fn batch_quotes(&self, symbols: &SymbolSet) -> Option<HttpRequest> {
        if symbols.is_empty() {
            return None;
        }
        let query = symbols
            .iter()
            .map(|symbol| urlencoding::encode(symbol).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        Some(self.json_get(&format!("/v1/quotes?q={query}")))
    }

    pub fn company_search(&self, name: &str) -> HttpRequest {
        self.json_get(&format!("/v1/company/{}", urlencoding::encode(name)))
    }

    pub fn instance_info(&self) -> HttpRequest {
        self.json_get("/v1/basics")
    }

    pub fn kill_instance(&self) -> HttpRequest {
        HttpRequest::get(format!("{}/v1/basics?doit=true", self.base_url))
            .with_timeout_ms(self.timeout_ms)
    }

    fn json_get(&self, path_and_query: &str) -> HttpRequest {
        HttpRequest::get(format!("{}{path_and_query}", self.base_url))
            .with_header("Accept", JSON)
            .with_timeout_ms(self.timeout_ms)
    }
}
