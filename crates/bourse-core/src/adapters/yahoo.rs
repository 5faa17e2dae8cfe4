use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::config::Settings;
use crate::data_source::{HistoryRequest, MarketDataSource, SourceError, SourceFuture};
use crate::domain::calendar::format_date;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse};
use crate::{Bar, MarketSnapshot, PriceSeries, ProviderId, Symbol, UtcDateTime};

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_ENDPOINT: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_ENDPOINT: &str = "https://fc.yahoo.com";
const CRUMB_ENDPOINTS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const REFERER: &str = "https://finance.yahoo.com/";
const SUMMARY_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData";

// ============================================================================
// Session crumb
// ============================================================================

#[derive(Debug, Clone)]
struct Crumb {
    value: String,
    fetched_at: Instant,
}

/// Yahoo cookie/crumb session.
///
/// quoteSummary rejects requests without a crumb bound to the session cookie.
/// The cookie lands in the transport's cookie jar when `fc.yahoo.com` is
/// visited; the crumb is then read from `getcrumb` and appended to queries.
#[derive(Debug)]
pub struct YahooSession {
    crumb: Mutex<Option<Crumb>>,
    ttl: Duration,
    auth: HttpAuth,
}

impl YahooSession {
    pub fn new(cookie_override: Option<String>) -> Self {
        Self {
            crumb: Mutex::new(None),
            ttl: Duration::from_secs(3600),
            auth: cookie_override.map_or(HttpAuth::None, HttpAuth::Cookie),
        }
    }

    pub fn auth(&self) -> &HttpAuth {
        &self.auth
    }

    fn lock(&self) -> MutexGuard<'_, Option<Crumb>> {
        self.crumb.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cached(&self) -> Option<String> {
        self.lock()
            .as_ref()
            .filter(|crumb| crumb.fetched_at.elapsed() < self.ttl)
            .map(|crumb| crumb.value.clone())
    }

    /// Drops the cached crumb so the next call re-authenticates.
    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    pub async fn crumb(
        &self,
        http_client: &dyn HttpClient,
        timeout_ms: u64,
    ) -> Result<String, SourceError> {
        if let Some(crumb) = self.cached() {
            return Ok(crumb);
        }

        let cookie_request = HttpRequest::get(COOKIE_ENDPOINT)
            .with_header("referer", REFERER)
            .with_auth(&self.auth)
            .with_timeout_ms(timeout_ms);
        // fc.yahoo.com answers 404 while still setting the session cookie.
        http_client.execute(cookie_request).await.map_err(|e| {
            SourceError::unavailable(format!("failed to fetch yahoo cookie: {}", e.message()))
        })?;

        for endpoint in CRUMB_ENDPOINTS {
            let request = HttpRequest::get(endpoint)
                .with_header("referer", REFERER)
                .with_auth(&self.auth)
                .with_timeout_ms(timeout_ms);

            let response = match http_client.execute(request).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::debug!(endpoint, error = %error, "crumb endpoint failed");
                    continue;
                }
            };

            if response.status == 429 {
                return Err(SourceError::rate_limited(
                    "yahoo rate limited while fetching crumb",
                ));
            }

            if let Some(value) = parse_crumb(&response) {
                *self.lock() = Some(Crumb {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                });
                return Ok(value);
            }
        }

        Err(SourceError::unavailable(
            "failed to fetch yahoo crumb from all endpoints",
        ))
    }
}

fn parse_crumb(response: &HttpResponse) -> Option<String> {
    if !response.is_success() {
        return None;
    }
    let body = response.body.trim();
    let looks_like_html = body.contains("<html") || body.contains("<!DOCTYPE");
    let valid = !body.is_empty() && body.len() < 100 && !body.contains(char::is_whitespace);
    (valid && !looks_like_html && !body.to_ascii_lowercase().contains("too many requests"))
        .then(|| body.to_owned())
}

// ============================================================================
// Yahoo Adapter
// ============================================================================

/// Yahoo Finance adapter for the chart and quoteSummary endpoints.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    session: Arc<YahooSession>,
    timeout_ms: u64,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, settings: &Settings) -> Self {
        Self {
            http_client,
            session: Arc::new(YahooSession::new(settings.yahoo_cookie.clone())),
            timeout_ms: settings.http_timeout_ms,
        }
    }

    async fn fetch_history(&self, req: &HistoryRequest) -> Result<PriceSeries, SourceError> {
        let request = HttpRequest::get(format!("{CHART_ENDPOINT}/{}", req.symbol))
            .with_query(
                "period1",
                UtcDateTime::start_of(req.start).unix_timestamp().to_string(),
            )
            .with_query(
                "period2",
                UtcDateTime::start_of(req.end).unix_timestamp().to_string(),
            )
            .with_query("interval", req.interval.as_str())
            .with_query("includePrePost", "false")
            .with_header("referer", REFERER)
            .with_auth(self.session.auth())
            .with_timeout_ms(self.timeout_ms);

        tracing::debug!(
            symbol = %req.symbol,
            start = %format_date(req.start),
            end = %format_date(req.end),
            interval = %req.interval,
            "fetching yahoo chart"
        );

        let response = self.send(request).await?;
        if response.status == 404 {
            return Err(SourceError::not_found(format!(
                "yahoo has no chart for '{}'",
                req.symbol
            )));
        }
        // A window without sessions comes back as a 400 carrying a chart error.
        if response.status == 400 && reports_missing_data(&response.body) {
            tracing::debug!(symbol = %req.symbol, "yahoo has no bars in the window");
            return Ok(PriceSeries::empty(
                req.symbol.clone(),
                req.interval,
                req.start,
                req.end,
            ));
        }
        let response = ensure_success(response)?;
        parse_chart_response(&response.body, req)
    }

    async fn fetch_snapshot(&self, symbol: &Symbol) -> Result<MarketSnapshot, SourceError> {
        let mut refreshed = false;
        loop {
            let crumb = self
                .session
                .crumb(self.http_client.as_ref(), self.timeout_ms)
                .await?;
            let request = HttpRequest::get(format!("{SUMMARY_ENDPOINT}/{symbol}"))
                .with_query("modules", SUMMARY_MODULES)
                .with_query("crumb", crumb)
                .with_header("referer", REFERER)
                .with_auth(self.session.auth())
                .with_timeout_ms(self.timeout_ms);

            tracing::debug!(%symbol, "fetching yahoo quote summary");
            let response = self.send(request).await?;

            if response.is_auth_failure() && !refreshed {
                tracing::debug!(%symbol, status = response.status, "yahoo session stale, re-authenticating");
                self.session.invalidate();
                refreshed = true;
                continue;
            }
            if response.status == 404 {
                return Err(SourceError::not_found(format!(
                    "yahoo has no quote summary for '{symbol}'"
                )));
            }

            let response = ensure_success(response)?;
            return parse_summary_response(&response.body, symbol);
        }
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SourceError> {
        self.http_client.execute(request).await.map_err(|error| {
            if error.retryable() {
                SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
            } else {
                SourceError::internal(format!("yahoo transport error: {}", error.message()))
            }
        })
    }
}

impl MarketDataSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, PriceSeries> {
        Box::pin(async move { self.fetch_history(&req).await })
    }

    fn snapshot<'a>(&'a self, symbol: Symbol) -> SourceFuture<'a, MarketSnapshot> {
        Box::pin(async move { self.fetch_snapshot(&symbol).await })
    }
}

fn ensure_success(response: HttpResponse) -> Result<HttpResponse, SourceError> {
    match response.status {
        status if (200..300).contains(&status) => Ok(response),
        429 => Err(SourceError::rate_limited("yahoo returned status 429")),
        status => Err(SourceError::unavailable(format!(
            "yahoo returned status {status}"
        ))),
    }
}

fn reports_missing_data(body: &str) -> bool {
    serde_json::from_str::<YahooChartResponse>(body)
        .ok()
        .and_then(|response| response.chart.error)
        .is_some_and(|error| error.is_missing_data())
}

fn parse_chart_response(body: &str, req: &HistoryRequest) -> Result<PriceSeries, SourceError> {
    let chart: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    let empty = || PriceSeries::empty(req.symbol.clone(), req.interval, req.start, req.end);

    if let Some(error) = chart.chart.error {
        if error.is_missing_data() {
            return Ok(empty());
        }
        return Err(error.into_source_error());
    }

    let Some(result) = chart.chart.result.and_then(|results| results.into_iter().next()) else {
        return Ok(empty());
    };
    let (Some(timestamps), Some(quote)) = (
        result.timestamp,
        result.indicators.quote.into_iter().next(),
    ) else {
        return Ok(empty());
    };

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts_value) in timestamps.into_iter().enumerate() {
        let field = |values: &[Option<f64>]| values.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            continue;
        };

        let ts = UtcDateTime::from_unix(ts_value)
            .map_err(|e| SourceError::internal(format!("invalid chart timestamp: {e}")))?;
        let volume = quote
            .volume
            .get(i)
            .copied()
            .flatten()
            .and_then(|v| u64::try_from(v).ok());

        match Bar::new(ts, open, high, low, close, volume) {
            Ok(bar) => bars.push(bar),
            Err(error) => {
                tracing::debug!(symbol = %req.symbol, %ts, %error, "dropping inconsistent yahoo bar");
            }
        }
    }

    Ok(PriceSeries::new(
        req.symbol.clone(),
        req.interval,
        req.start,
        req.end,
        bars,
    ))
}

fn parse_summary_response(body: &str, symbol: &Symbol) -> Result<MarketSnapshot, SourceError> {
    let summary: YahooQuoteSummaryResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo quote summary: {e}")))?;

    if let Some(error) = summary.quote_summary.error {
        return Err(error.into_source_error());
    }

    let result = summary
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::not_found(format!("no quote summary for '{symbol}'")))?;

    let price = result.price.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let stats = result.default_key_statistics.unwrap_or_default();
    let financial = result.financial_data.unwrap_or_default();

    let market_cap = raw(&price.market_cap).or_else(|| raw(&detail.market_cap));
    let revenue = raw(&financial.total_revenue).or_else(|| raw(&financial.revenue));
    let current_price =
        raw(&price.regular_market_price).or_else(|| raw(&financial.current_price));

    MarketSnapshot::new(symbol.clone(), UtcDateTime::now())
        .with_market_cap(market_cap)
        .and_then(|s| s.with_trailing_pe(raw(&detail.trailing_pe)))
        .and_then(|s| s.with_total_revenue(revenue))
        .and_then(|s| s.with_shares_outstanding(raw(&stats.shares_outstanding)))
        .and_then(|s| s.with_regular_market_price(current_price))
        .map(|s| s.with_currency(price.currency))
        .map_err(|e| SourceError::internal(format!("invalid yahoo snapshot for '{symbol}': {e}")))
}

fn raw(value: &Option<YahooRawValue>) -> Option<f64> {
    value
        .as_ref()
        .and_then(|value| value.raw)
        .filter(|value| value.is_finite())
}

// Yahoo Finance API response structures

#[derive(Debug, Clone, Deserialize)]
struct YahooApiError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

impl YahooApiError {
    fn is_missing_data(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|description| description.starts_with("Data doesn't exist"))
    }

    fn into_source_error(self) -> SourceError {
        let message = format!(
            "yahoo API error {}: {}",
            self.code,
            self.description.unwrap_or_default()
        );
        if self.code.eq_ignore_ascii_case("not found") {
            SourceError::not_found(message)
        } else {
            SourceError::unavailable(message)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: YahooQuoteSummaryData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteSummaryData {
    #[serde(default)]
    result: Option<Vec<YahooQuoteSummaryResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuoteSummaryResult {
    #[serde(default)]
    price: Option<YahooPrice>,
    #[serde(default)]
    summary_detail: Option<YahooSummaryDetail>,
    #[serde(default)]
    default_key_statistics: Option<YahooKeyStatistics>,
    #[serde(default)]
    financial_data: Option<YahooFinancialData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooPrice {
    #[serde(default)]
    regular_market_price: Option<YahooRawValue>,
    #[serde(default)]
    market_cap: Option<YahooRawValue>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooSummaryDetail {
    #[serde(default, rename = "trailingPE")]
    trailing_pe: Option<YahooRawValue>,
    #[serde(default)]
    market_cap: Option<YahooRawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooKeyStatistics {
    #[serde(default)]
    shares_outstanding: Option<YahooRawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooFinancialData {
    #[serde(default)]
    total_revenue: Option<YahooRawValue>,
    #[serde(default)]
    revenue: Option<YahooRawValue>,
    #[serde(default)]
    current_price: Option<YahooRawValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`, or `{}` when absent.
#[derive(Debug, Clone, Deserialize)]
struct YahooRawValue {
    #[serde(default)]
    raw: Option<f64>,
}
