use time::macros::time;
use time::{Date, Duration, Time, Weekday};

use crate::data_source::{HistoryRequest, MarketDataSource, SourceError, SourceFuture};
use crate::{Bar, Interval, MarketSnapshot, PriceSeries, ProviderId, Symbol, UtcDateTime};

const SESSION_OPEN: Time = time!(14:30);
const SESSION_MINUTES: i64 = 390;

/// Offline source generating deterministic prices from the ticker.
///
/// Weekends hold no sessions, so a one-day query on a Saturday comes back
/// empty just like the live source. The same `(symbol, date)` always yields
/// the same close, whatever window it was queried through.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    today: Date,
}

impl SyntheticSource {
    pub fn new(today: Date) -> Self {
        Self { today }
    }

    fn daily_close(seed: u64, date: Date) -> f64 {
        let base = 20.0 + (seed % 480) as f64;
        let day = f64::from(date.to_julian_day());
        let phase = (seed % 628) as f64 / 100.0;
        let wave = 0.15 * (day / 23.0 + phase).sin() + 0.05 * (day / 7.0).cos();
        let drift = ((seed >> 16) % 40) as f64 / 10_000.0 * (day - 2_451_545.0) / 365.0;
        let noise = unit(mix(seed, date.to_julian_day() as u64)) * 0.02;
        round_cents(base * (1.0 + wave + noise + drift).max(0.05))
    }

    fn bars_for_day(seed: u64, date: Date, interval: Interval) -> Vec<Bar> {
        let close = Self::daily_close(seed, date);
        let previous = Self::daily_close(seed, date.previous_day().unwrap_or(date));
        let session_start = date.with_time(SESSION_OPEN).assume_utc();

        let (steps, step) = match interval {
            Interval::OneDay => {
                let ts = UtcDateTime::start_of(date);
                return bar(seed, ts, previous, close).into_iter().collect();
            }
            Interval::ThirtyMinutes => (SESSION_MINUTES / 30, Duration::minutes(30)),
            Interval::OneMinute => (SESSION_MINUTES, Duration::minutes(1)),
        };

        let mut bars = Vec::with_capacity(steps as usize);
        let mut last = previous;
        for i in 0..steps {
            let progress = (i + 1) as f64 / steps as f64;
            let jitter = unit(mix(seed, (date.to_julian_day() as u64) << 16 | i as u64)) * 0.004;
            let price = round_cents(previous + (close - previous) * progress + previous * jitter);
            let price = if i + 1 == steps { close } else { price.max(0.01) };

            let Ok(ts) = UtcDateTime::from_offset_datetime(session_start + step * i as i32) else {
                continue;
            };
            bars.extend(bar(seed ^ i as u64, ts, last, price));
            last = price;
        }
        bars
    }

    fn generate(&self, req: &HistoryRequest) -> PriceSeries {
        let seed = seed_of(&req.symbol);
        let mut bars = Vec::new();
        let mut date = req.start;
        while date < req.end {
            if !matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday) {
                bars.extend(Self::bars_for_day(seed, date, req.interval));
            }
            match date.next_day() {
                Some(next) => date = next,
                None => break,
            }
        }
        PriceSeries::new(req.symbol.clone(), req.interval, req.start, req.end, bars)
    }

    fn build_snapshot(&self, symbol: Symbol) -> Result<MarketSnapshot, SourceError> {
        let seed = seed_of(&symbol);
        let price = Self::daily_close(seed, self.today);
        let shares = ((seed >> 8) % 5_000 + 100) as f64 * 1_000_000.0;
        let market_cap = price * shares;
        let revenue = market_cap / (1.0 + ((seed >> 24) % 8) as f64);
        let trailing_pe = 8.0 + ((seed >> 32) % 300) as f64 / 10.0;
        let currency = match symbol.exchange_suffix() {
            Some("PA") => "EUR",
            _ => "USD",
        };

        MarketSnapshot::new(symbol, UtcDateTime::start_of(self.today))
            .with_market_cap(Some(market_cap))
            .and_then(|s| s.with_trailing_pe(Some(trailing_pe)))
            .and_then(|s| s.with_total_revenue(Some(revenue)))
            .and_then(|s| s.with_shares_outstanding(Some(shares)))
            .and_then(|s| s.with_regular_market_price(Some(price)))
            .map(|s| s.with_currency(Some(currency.to_owned())))
            .map_err(|e| SourceError::internal(format!("synthetic snapshot invalid: {e}")))
    }
}

impl MarketDataSource for SyntheticSource {
    fn id(&self) -> ProviderId {
        ProviderId::Synthetic
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, PriceSeries> {
        Box::pin(async move { Ok(self.generate(&req)) })
    }

    fn snapshot<'a>(&'a self, symbol: Symbol) -> SourceFuture<'a, MarketSnapshot> {
        Box::pin(async move { self.build_snapshot(symbol) })
    }
}

fn bar(seed: u64, ts: UtcDateTime, open: f64, close: f64) -> Option<Bar> {
    let spread = 0.002 + unit(mix(seed, ts.unix_timestamp() as u64)).abs() * 0.01;
    let high = round_cents(open.max(close) * (1.0 + spread));
    let low = round_cents(open.min(close) * (1.0 - spread));
    let volume = 10_000 + mix(seed, ts.unix_timestamp() as u64 ^ 0xA5A5) % 990_000;
    Bar::new(ts, open, high.max(open.max(close)), low.min(open.min(close)), close, Some(volume)).ok()
}

fn seed_of(symbol: &Symbol) -> u64 {
    // FNV-1a
    symbol
        .as_str()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        })
}

fn mix(seed: u64, salt: u64) -> u64 {
    let mut x = seed ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x
}

/// Maps a hash onto `[-1, 1)`.
fn unit(value: u64) -> f64 {
    (value % 2_000_000) as f64 / 1_000_000.0 - 1.0
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
