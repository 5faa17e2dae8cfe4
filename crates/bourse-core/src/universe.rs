//! Ticker universes scanned by the ranker and offered by the dashboard.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Symbol, ValidationError};

const CAC40_TICKERS: &[&str] = &[
    "AC.PA", "ACA.PA", "AI.PA", "AIR.PA", "BN.PA", "BNP.PA", "CA.PA", "CAP.PA", "CS.PA", "DG.PA",
    "DSY.PA", "EDEN.PA", "EL.PA", "EN.PA", "ENGI.PA", "ERF.PA", "GLE.PA", "HO.PA", "KER.PA",
    "LR.PA", "MC.PA", "ML.PA", "MT.AS", "OR.PA", "ORA.PA", "PUB.PA", "RI.PA", "RMS.PA", "RNO.PA",
    "SAF.PA", "SAN.PA", "SGO.PA", "STLAP.PA", "STMPA.PA", "SU.PA", "TEP.PA", "TTE.PA", "URW.PA",
    "VIE.PA", "VIV.PA",
];

const SP500_TICKERS: &[&str] = &[
    // Technology
    "AAPL", "MSFT", "NVDA", "GOOGL", "GOOG", "META", "AVGO", "ORCL", "CRM", "AMD", "ADBE", "INTC",
    "CSCO", "QCOM", "TXN", "NOW", "IBM", "AMAT", "MU", "INTU", "ACN", "ADI", "LRCX", "KLAC",
    // Healthcare
    "LLY", "UNH", "JNJ", "ABBV", "MRK", "PFE", "TMO", "ABT", "DHR", "BMY", "AMGN", "GILD", "MDT",
    "ISRG", "VRTX", "CVS", "ELV", "SYK",
    // Financials
    "BRK-B", "JPM", "V", "MA", "BAC", "WFC", "GS", "MS", "AXP", "SCHW", "BLK", "C", "SPGI", "CB",
    "PGR", "MMC",
    // Consumer
    "AMZN", "TSLA", "HD", "MCD", "NKE", "SBUX", "LOW", "TJX", "BKNG", "WMT", "PG", "KO", "PEP",
    "COST", "PM", "MDLZ", "CL",
    // Industrials and energy
    "CAT", "BA", "HON", "UPS", "GE", "RTX", "DE", "LMT", "UNP", "ETN", "XOM", "CVX", "COP",
    "SLB", "EOG",
    // Communication, utilities, materials, real estate
    "NFLX", "DIS", "CMCSA", "VZ", "T", "TMUS", "NEE", "DUK", "SO", "LIN", "SHW", "APD", "PLD",
    "AMT", "EQIX",
];

/// Stock market whose constituents form a universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Cac40,
    Sp500,
}

impl Market {
    pub const ALL: [Self; 2] = [Self::Cac40, Self::Sp500];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cac40 => "cac40",
            Self::Sp500 => "sp500",
        }
    }

    pub const fn tickers(self) -> &'static [&'static str] {
        match self {
            Self::Cac40 => CAC40_TICKERS,
            Self::Sp500 => SP500_TICKERS,
        }
    }
}

impl Display for Market {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cac40" | "cac" => Ok(Self::Cac40),
            "sp500" | "s&p" | "sp" => Ok(Self::Sp500),
            other => Err(ValidationError::InvalidMarket {
                value: other.to_owned(),
            }),
        }
    }
}

/// Ordered, duplicate-free list of tickers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Universe {
    symbols: Vec<Symbol>,
}

impl Universe {
    /// Constituents of one market, sorted.
    pub fn for_market(market: Market) -> Result<Self, ValidationError> {
        Self::sorted(market.tickers().iter().copied())
    }

    /// Union of every market, sorted and deduplicated.
    pub fn combined() -> Result<Self, ValidationError> {
        Self::sorted(
            Market::ALL
                .iter()
                .flat_map(|market| market.tickers().iter().copied()),
        )
    }

    /// Parses a newline- or comma-separated list, keeping first occurrences.
    ///
    /// Blank entries and `#` comments are ignored.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let mut seen = BTreeSet::new();
        let mut symbols = Vec::new();
        for line in text.lines() {
            let content = line.split('#').next().unwrap_or_default();
            for entry in content.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                let symbol = Symbol::parse(entry)?;
                if seen.insert(symbol.clone()) {
                    symbols.push(symbol);
                }
            }
        }
        Ok(Self { symbols })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text)?)
    }

    fn sorted<'a>(tickers: impl Iterator<Item = &'a str>) -> Result<Self, ValidationError> {
        let symbols = tickers
            .map(Symbol::parse)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            symbols: symbols.into_iter().collect(),
        })
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
