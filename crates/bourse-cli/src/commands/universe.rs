use bourse_core::{Market, Symbol};
use serde::Serialize;

use crate::cli::{MarketArg, UniverseArgs};
use crate::error::CliError;

use super::{universe_for, CommandResult};

#[derive(Debug, Serialize)]
struct UniverseResponseData {
    markets: Vec<Market>,
    count: usize,
    symbols: Vec<Symbol>,
}

pub fn run(args: &UniverseArgs) -> Result<CommandResult, CliError> {
    let markets = match args.market {
        MarketArg::Cac40 => vec![Market::Cac40],
        MarketArg::Sp500 => vec![Market::Sp500],
        MarketArg::All => Market::ALL.to_vec(),
    };
    let universe = universe_for(args.market)?;

    let data = serde_json::to_value(UniverseResponseData {
        markets,
        count: universe.len(),
        symbols: universe.into_symbols(),
    })?;
    Ok(CommandResult::ok(data))
}
