//! Scripted in-memory data source shared by the behavior tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use bourse_core::{
    Bar, HistoryRequest, MarketDataSource, MarketSnapshot, PriceSeries, ProviderId, SourceError,
    SourceFuture, Symbol, UtcDateTime,
};

type HistoryScript = Result<Vec<f64>, SourceError>;

/// Answers from per-ticker scripts and records every call.
///
/// History scripts are consumed in order; the last one repeats once the
/// queue is down to a single entry. Unscripted tickers get an empty series.
#[derive(Default)]
pub struct ScriptedSource {
    histories: Mutex<HashMap<Symbol, VecDeque<HistoryScript>>>,
    snapshots: HashMap<Symbol, Result<MarketSnapshot, SourceError>>,
    history_calls: Mutex<Vec<HistoryRequest>>,
    snapshot_calls: Mutex<Vec<Symbol>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(self, symbol: &str, closes: &[f64]) -> Self {
        self.with_history_script(symbol, Ok(closes.to_vec()))
    }

    pub fn with_history_error(self, symbol: &str, error: SourceError) -> Self {
        self.with_history_script(symbol, Err(error))
    }

    pub fn with_history_script(self, symbol: &str, script: HistoryScript) -> Self {
        self.histories
            .lock()
            .expect("history scripts should not be poisoned")
            .entry(sym(symbol))
            .or_default()
            .push_back(script);
        self
    }

    pub fn with_snapshot(mut self, snapshot: MarketSnapshot) -> Self {
        self.snapshots.insert(snapshot.symbol.clone(), Ok(snapshot));
        self
    }

    pub fn with_snapshot_error(mut self, symbol: &str, error: SourceError) -> Self {
        self.snapshots.insert(sym(symbol), Err(error));
        self
    }

    pub fn history_calls(&self) -> Vec<HistoryRequest> {
        self.history_calls
            .lock()
            .expect("call log should not be poisoned")
            .clone()
    }

    pub fn snapshot_calls(&self) -> Vec<Symbol> {
        self.snapshot_calls
            .lock()
            .expect("call log should not be poisoned")
            .clone()
    }

    fn next_history(&self, req: &HistoryRequest) -> Result<PriceSeries, SourceError> {
        self.history_calls
            .lock()
            .expect("call log should not be poisoned")
            .push(req.clone());

        let script = {
            let mut histories = self
                .histories
                .lock()
                .expect("history scripts should not be poisoned");
            match histories.get_mut(&req.symbol) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        let closes = match script {
            Some(script) => script?,
            None => Vec::new(),
        };
        Ok(series(req, &closes))
    }
}

impl MarketDataSource for ScriptedSource {
    fn id(&self) -> ProviderId {
        ProviderId::Synthetic
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, PriceSeries> {
        Box::pin(async move { self.next_history(&req) })
    }

    fn snapshot<'a>(&'a self, symbol: Symbol) -> SourceFuture<'a, MarketSnapshot> {
        Box::pin(async move {
            self.snapshot_calls
                .lock()
                .expect("call log should not be poisoned")
                .push(symbol.clone());
            self.snapshots
                .get(&symbol)
                .cloned()
                .unwrap_or_else(|| Err(SourceError::not_found(format!("no snapshot for {symbol}"))))
        })
    }
}

pub fn sym(value: &str) -> Symbol {
    Symbol::parse(value).expect("valid symbol")
}

/// Snapshot carrying only the fields the ranker reads.
pub fn snapshot(symbol: &str, price: Option<f64>, shares: Option<f64>) -> MarketSnapshot {
    MarketSnapshot::new(sym(symbol), UtcDateTime::now())
        .with_regular_market_price(price)
        .and_then(|s| s.with_shares_outstanding(shares))
        .expect("valid snapshot")
}

/// One flat bar per step of the request interval, starting at `start`.
fn series(req: &HistoryRequest, closes: &[f64]) -> PriceSeries {
    let origin = UtcDateTime::start_of(req.start).into_inner();
    let step = req.interval.duration();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let ts = UtcDateTime::from_offset_datetime(origin + step * i as i32)
                .expect("utc timestamp");
            Bar::new(ts, *close, *close, *close, *close, Some(1_000)).expect("valid bar")
        })
        .collect();
    PriceSeries::new(req.symbol.clone(), req.interval, req.start, req.end, bars)
}
