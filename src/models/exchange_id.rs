use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one of the supported exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    Coinbase,
    Kraken,
    Mexc,
    Kucoin,
}

impl ExchangeId {
    /// All supported exchanges, in display order
    pub const ALL: [ExchangeId; 4] = [
        ExchangeId::Coinbase,
        ExchangeId::Kraken,
        ExchangeId::Mexc,
        ExchangeId::Kucoin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Coinbase => "coinbase",
            ExchangeId::Kraken => "kraken",
            ExchangeId::Mexc => "mexc",
            ExchangeId::Kucoin => "kucoin",
        }
    }

    /// Parse from a query-parameter value
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "coinbase" => Ok(ExchangeId::Coinbase),
            "kraken" => Ok(ExchangeId::Kraken),
            "mexc" => Ok(ExchangeId::Mexc),
            "kucoin" => Ok(ExchangeId::Kucoin),
            _ => Err(format!(
                "Invalid exchange: '{}'. Valid values: coinbase, kraken, mexc, kucoin, all",
                s
            )),
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exchange selector for queries that accept a single exchange or "all"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeSelect {
    All,
    One(ExchangeId),
}

impl ExchangeSelect {
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.eq_ignore_ascii_case("all") {
            Ok(ExchangeSelect::All)
        } else {
            ExchangeId::parse(s).map(ExchangeSelect::One)
        }
    }
}

impl fmt::Display for ExchangeSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeSelect::All => write!(f, "all"),
            ExchangeSelect::One(id) => write!(f, "{}", id),
        }
    }
}
