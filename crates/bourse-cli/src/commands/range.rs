use bourse_core::ResolvedRange;
use serde::Serialize;

use crate::cli::RangeArgs;
use crate::error::CliError;

use super::{parse_time_range, CommandResult, Context};

#[derive(Debug, Serialize)]
struct RangeResponseData {
    tag: &'static str,
    #[serde(flatten)]
    resolved: ResolvedRange,
    retries_when_empty: bool,
}

pub fn run(args: &RangeArgs, context: &Context) -> Result<CommandResult, CliError> {
    let range = parse_time_range(
        &args.tag,
        args.start.as_deref(),
        args.end.as_deref(),
        context.today,
    )?;

    let data = serde_json::to_value(RangeResponseData {
        tag: range.tag(),
        resolved: range.resolve(context.today)?,
        retries_when_empty: range.retries_when_empty(),
    })?;
    Ok(CommandResult::ok(data))
}
