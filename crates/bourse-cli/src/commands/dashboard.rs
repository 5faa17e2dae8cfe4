use bourse_core::{
    ChartOutcome, ChartView, Dashboard, EnvelopeError, FundamentalsSnapshot, ResolvedRange,
    SessionState, Symbol,
};
use serde::Serialize;

use crate::cli::{DashboardArgs, MarketArg};
use crate::error::CliError;

use super::{parse_time_range, universe_for, CommandResult, Context};

#[derive(Debug, Serialize)]
struct DashboardResponseData {
    symbol: Symbol,
    range_tag: &'static str,
    range: ResolvedRange,
    chart: Option<ChartView>,
    fundamentals: FundamentalsData,
}

#[derive(Debug, Serialize)]
pub(super) struct FundamentalsData {
    #[serde(flatten)]
    pub fundamentals: FundamentalsSnapshot,
    pub available: bool,
}

pub async fn run(args: &DashboardArgs, context: &Context) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    if let Some(market) = args.market {
        ensure_member(&symbol, market)?;
    }

    let range = parse_time_range(
        &args.range,
        args.start.as_deref(),
        args.end.as_deref(),
        context.today,
    )?;
    let resolved = range.resolve(context.today)?;
    let session = SessionState {
        log_scale: args.log_scale,
    };

    let view = Dashboard::new(context.source())
        .load(symbol, range, context.today, &session)
        .await?;

    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    match &view.chart {
        ChartOutcome::Ready(chart) => {
            if chart.widened {
                warnings.push(format!(
                    "no session today for {}, showing from {}",
                    view.symbol, chart.range.start
                ));
            }
            if let Some(reason) = &chart.change_error {
                warnings.push(format!("price change undefined for {}: {reason}", view.symbol));
            }
        }
        ChartOutcome::Unavailable(error) => {
            errors.push(EnvelopeError::from(error).with_symbol(view.symbol.as_str()));
        }
    }
    if let Some(error) = &view.fundamentals.error {
        warnings.push(format!(
            "fundamentals unavailable for {}: {}",
            view.symbol,
            error.message()
        ));
    }

    let data = serde_json::to_value(DashboardResponseData {
        range_tag: range.tag(),
        range: view.chart.view().map_or(resolved, |chart| chart.range),
        chart: view.chart.view().cloned(),
        fundamentals: FundamentalsData {
            available: view.fundamentals.is_available(),
            fundamentals: view.fundamentals.fundamentals,
        },
        symbol: view.symbol,
    })?;

    let mut result = CommandResult::ok(data).with_errors(errors);
    for warning in warnings {
        result = result.with_warning(warning);
    }
    Ok(result)
}

fn ensure_member(symbol: &Symbol, market: MarketArg) -> Result<(), CliError> {
    let universe = universe_for(market)?;
    if universe.contains(symbol) {
        Ok(())
    } else {
        Err(CliError::Command(format!(
            "{symbol} is not listed in the selected market"
        )))
    }
}
