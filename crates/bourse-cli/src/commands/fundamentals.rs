use bourse_core::{Dashboard, EnvelopeError, Symbol};
use serde::Serialize;

use crate::cli::FundamentalsArgs;
use crate::error::CliError;

use super::dashboard::FundamentalsData;
use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
struct FundamentalsResponseData {
    fundamentals: Vec<FundamentalsData>,
}

pub async fn run(args: &FundamentalsArgs, context: &Context) -> Result<CommandResult, CliError> {
    let symbols = args
        .symbols
        .iter()
        .map(|raw| Symbol::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let dashboard = Dashboard::new(context.source());
    let mut fundamentals = Vec::with_capacity(symbols.len());
    let mut errors = Vec::new();

    for symbol in &symbols {
        let panel = dashboard.load_fundamentals(symbol).await;
        if let Some(error) = &panel.error {
            errors.push(EnvelopeError::from(error).with_symbol(symbol.as_str()));
        }
        fundamentals.push(FundamentalsData {
            available: panel.is_available(),
            fundamentals: panel.fundamentals,
        });
    }

    let data = serde_json::to_value(FundamentalsResponseData { fundamentals })?;
    Ok(CommandResult::ok(data).with_errors(errors))
}
