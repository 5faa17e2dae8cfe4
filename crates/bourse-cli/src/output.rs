use bourse_core::{Envelope, Trend};
use serde::Deserialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

const NOT_AVAILABLE: &str = "N/A";

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(envelope)?),
    }
    Ok(())
}

fn render_table(envelope: &Envelope<Value>) -> Result<String, CliError> {
    let data = &envelope.data;
    let mut out = match envelope.meta.command.as_str() {
        "dashboard" => dashboard_table(data),
        "fundamentals" => fundamentals_table(data),
        "rank" => rank_table(data),
        "universe" => universe_table(data),
        "range" => range_table(data),
        _ => {
            let mut out = String::new();
            for line in serde_json::to_string_pretty(data)?.lines() {
                out.push_str(&format!("  {line}\n"));
            }
            out
        }
    };

    if !envelope.meta.warnings.is_empty() {
        out.push_str("warnings:\n");
        for warning in &envelope.meta.warnings {
            out.push_str(&format!("  - {warning}\n"));
        }
    }
    if !envelope.errors.is_empty() {
        out.push_str("errors:\n");
        for error in &envelope.errors {
            out.push_str(&format!("  - {}: {}\n", error.code, error.message));
        }
    }

    let sources = envelope
        .meta
        .source_chain
        .iter()
        .map(|source| source.as_str())
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&format!(
        "[{} | {} | {} ms | cache_hit={}]\n",
        envelope.meta.request_id, sources, envelope.meta.latency_ms, envelope.meta.cache_hit
    ));
    Ok(out)
}

fn dashboard_table(data: &Value) -> String {
    let mut out = format!(
        "{}  range {}  {}..{} ({})\n",
        text(&data["symbol"]),
        text(&data["range_tag"]),
        text(&data["range"]["start"]),
        text(&data["range"]["end"]),
        text(&data["range"]["interval"]),
    );

    let chart = &data["chart"];
    if chart.is_null() {
        out.push_str("chart       : not available\n");
    } else {
        let closes = chart["closes"].as_array().map_or(0, Vec::len);
        let last_ma = chart["moving_average"]
            .as_array()
            .and_then(|values| values.last())
            .and_then(Value::as_f64);
        out.push_str(&format!("bars        : {closes}\n"));
        out.push_str(&format!(
            "first close : {}\n",
            price(chart["change"]["first_close"].as_f64())
        ));
        out.push_str(&format!(
            "last close  : {}\n",
            price(chart["change"]["last_close"].as_f64())
        ));
        out.push_str(&format!(
            "change      : {} ({})\n",
            chart["change"]["ratio"]
                .as_f64()
                .map_or_else(|| NOT_AVAILABLE.to_owned(), percent),
            text(&chart["trend"])
        ));
        out.push_str(&format!("ma50        : {}\n", price(last_ma)));
        out.push_str(&format!("axis        : {}\n", text(&chart["axis"])));
    }

    out.push_str("fundamentals:\n");
    out.push_str(&fundamentals_rows(&data["fundamentals"], "  "));
    out
}

fn fundamentals_table(data: &Value) -> String {
    let mut out = String::new();
    for entry in data["fundamentals"].as_array().into_iter().flatten() {
        out.push_str(&format!("{}\n", text(&entry["symbol"])));
        out.push_str(&fundamentals_rows(entry, "  "));
    }
    out
}

fn fundamentals_rows(panel: &Value, indent: &str) -> String {
    [
        ("market cap", amount(panel["market_cap"].as_f64())),
        ("trailing P/E", price(panel["trailing_pe"].as_f64())),
        ("revenue", amount(panel["total_revenue"].as_f64())),
        (
            "market cap/revenue",
            price(panel["market_cap_to_revenue"].as_f64()),
        ),
    ]
    .iter()
    .map(|(label, value)| format!("{indent}{label:<19}: {value}\n"))
    .collect()
}

fn rank_table(data: &Value) -> String {
    let mut out = format!(
        "period {}  {}..{}  ranked {}/{}\n",
        text(&data["period"]),
        text(&data["window"]["start"]),
        text(&data["window"]["end"]),
        data["ranked"].as_u64().unwrap_or_default(),
        data["total"].as_u64().unwrap_or_default(),
    );

    let records = data["records"].as_array().cloned().unwrap_or_default();
    if records.is_empty() {
        out.push_str("nothing to show\n");
    } else {
        out.push_str(&format!(
            "  {:>4}  {:<10} {:>22} {:>10}\n",
            "#", "TICKER", "VARIATION", "PERCENT"
        ));
        for (index, record) in records.iter().enumerate() {
            let marker = Trend::deserialize(&record["trend"]).map_or(' ', Trend::marker);
            out.push_str(&format!(
                "{marker} {:>4}  {:<10} {:>22} {:>10}\n",
                index + 1,
                text(&record["symbol"]),
                amount(record["variation"].as_f64()),
                record["percentage"]
                    .as_f64()
                    .map_or_else(|| NOT_AVAILABLE.to_owned(), percent),
            ));
        }
    }

    let skipped = data["skipped"].as_array().cloned().unwrap_or_default();
    if !skipped.is_empty() {
        out.push_str("skipped:\n");
        for entry in &skipped {
            out.push_str(&format!(
                "  {:<10} {}\n",
                text(&entry["symbol"]),
                text(&entry["reason"])
            ));
        }
    }
    out
}

fn universe_table(data: &Value) -> String {
    let symbols = data["symbols"]
        .as_array()
        .into_iter()
        .flatten()
        .map(text)
        .collect::<Vec<_>>();
    let mut out = format!("{} tickers\n", symbols.len());
    for row in symbols.chunks(8) {
        out.push_str(&format!("  {}\n", row.join("  ")));
    }
    out
}

fn range_table(data: &Value) -> String {
    format!(
        "tag      : {}\nstart    : {}\nend      : {}\ninterval : {}\nretry    : {}\n",
        text(&data["tag"]),
        text(&data["start"]),
        text(&data["end"]),
        text(&data["interval"]),
        data["retries_when_empty"].as_bool().unwrap_or_default(),
    )
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => NOT_AVAILABLE.to_owned(),
        other => other.to_string(),
    }
}

fn price(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_owned(), |v| format!("{v:.2}"))
}

fn percent(ratio: f64) -> String {
    format!("{:+.2}%", ratio * 100.0)
}

/// Whole amount with thousands separators, sign kept.
fn amount(value: Option<f64>) -> String {
    let Some(value) = value else {
        return NOT_AVAILABLE.to_owned();
    };
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && grouped != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}
