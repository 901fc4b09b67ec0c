use std::fmt::{Display, Formatter};

/// Ordered symbols exactly as the caller supplied them.
///
/// No validation, trimming or de-duplication happens here; the downstream
/// decides what a symbol means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSet(Vec<String>);

impl SymbolSet {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(symbols.into_iter().map(Into::into).collect())
    }

    pub fn single(symbol: impl Into<String>) -> Self {
        Self(vec![symbol.into()])
    }

    /// Splits a comma-separated list into its tokens.
    ///
    /// Trailing empty tokens are dropped, so `"ABC,"` is one symbol. A list
    /// with no comma at all, including `""`, is a single token.
    pub fn from_comma_list(list: &str) -> Self {
        let mut tokens: Vec<&str> = list.split(',').collect();
        if tokens.len() > 1 {
            while tokens.last().is_some_and(|token| token.is_empty()) {
                tokens.pop();
            }
        }
        Self::new(tokens)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Comma-joined form used on the wire, input order preserved.
    pub fn joined(&self) -> String {
        self.0.join(",")
    }
}

impl Display for SymbolSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.joined())
    }
}

impl<S: Into<String>> FromIterator<S> for SymbolSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<String>> for SymbolSet {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}
