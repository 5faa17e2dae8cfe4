use std::io::Write;

use bourse_core::{
    RankProgress, ResolvedRange, Universe, VariationPeriod, VariationRanker, VariationRecord,
};
use serde::Serialize;

use crate::cli::RankArgs;
use crate::error::CliError;

use super::{universe_for, CommandResult, Context};

#[derive(Debug, Serialize)]
struct RankResponseData {
    period: VariationPeriod,
    window: ResolvedRange,
    total: usize,
    ranked: usize,
    records: Vec<VariationRecord>,
    skipped: Vec<SkippedData>,
}

#[derive(Debug, Serialize)]
struct SkippedData {
    symbol: String,
    code: &'static str,
    reason: String,
}

pub async fn run(args: &RankArgs, context: &Context) -> Result<CommandResult, CliError> {
    let period: VariationPeriod = args.period.parse()?;
    let universe = match &args.universe_file {
        Some(path) => Universe::from_file(path)?,
        None => universe_for(args.market)?,
    };

    let ranker = VariationRanker::new(context.source(), context.settings.max_concurrency);
    let show_progress = args.progress;
    let report = ranker
        .rank(universe.symbols(), period, context.today, |progress| {
            if show_progress {
                report_progress(progress);
            }
        })
        .await?;

    let records = report
        .top(args.limit.unwrap_or(report.records.len()))
        .to_vec();

    let data = serde_json::to_value(RankResponseData {
        period: report.period,
        window: report.window,
        total: report.total,
        ranked: report.records.len(),
        records,
        skipped: report
            .skipped
            .iter()
            .map(|skipped| SkippedData {
                symbol: skipped.symbol.to_string(),
                code: skipped.reason.code(),
                reason: skipped.reason.to_string(),
            })
            .collect(),
    })?;

    let mut result = CommandResult::ok(data);
    if report.is_empty() {
        result = result.with_warning("nothing to show: no ticker could be ranked");
    } else if !report.skipped.is_empty() {
        result = result.with_warning(format!(
            "{} of {} tickers skipped",
            report.skipped.len(),
            report.total
        ));
    }
    Ok(result)
}

fn report_progress(progress: RankProgress) {
    let mut stderr = std::io::stderr().lock();
    let _ = write!(
        stderr,
        "\rranking {}/{} ({:.0}%)",
        progress.completed,
        progress.total,
        progress.fraction() * 100.0
    );
    if progress.completed == progress.total {
        let _ = writeln!(stderr);
    }
    let _ = stderr.flush();
}
