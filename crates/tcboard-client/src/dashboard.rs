use crate::client_ext::MarketData;
use crate::schema::{CompanyOverview, HistoryPoint, Range, TickerOverview};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, trace, warn};

pub const DEFAULT_TICKER: &str = "VHM";

/// Shown when a search fails outside of the per-section guards.
pub const SEARCH_FAILED: &str = "Failed to call the market-data API. Check the relay.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing searched yet.
    #[default]
    Idle,
    Loading,
    /// Every section was fetched.
    Ready,
    /// At least one section failed and is shown as "no data".
    PartialReady,
}

/// A user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Snapshot
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

/// Everything the dashboard displays. Never mutated in place: each transition
/// returns a new snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub selected_ticker: String,
    pub range: Range,
    pub overview: Option<TickerOverview>,
    pub company: Option<CompanyOverview>,
    pub history: Vec<HistoryPoint>,
    pub phase: Phase,
    pub notice: Option<Notice>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            selected_ticker: DEFAULT_TICKER.to_string(),
            range: Range::default(),
            overview: None,
            company: None,
            history: vec![],
            phase: Phase::Idle,
            notice: None,
        }
    }
}

impl DashboardState {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn with_range(&self, range: Range) -> Self {
        Self {
            range,
            ..self.clone()
        }
    }

    /// Sections cleared, loading flag raised; ticker and range kept.
    fn loading(&self) -> Self {
        Self {
            selected_ticker: self.selected_ticker.clone(),
            range: self.range,
            phase: Phase::Loading,
            ..Default::default()
        }
    }

    fn settled(&self, ticker: &str, sections: Sections) -> Self {
        let phase = if sections.degraded {
            Phase::PartialReady
        } else {
            Phase::Ready
        };
        Self {
            selected_ticker: ticker.to_uppercase(),
            range: self.range,
            overview: sections.overview,
            company: sections.company,
            history: sections.history,
            phase,
            notice: None,
        }
    }

    /// Loading left with nothing displayed and a notice; the previous ticker stays selected.
    fn failed(&self, message: &str) -> Self {
        Self {
            phase: Phase::PartialReady,
            notice: Some(Notice {
                message: message.to_string(),
            }),
            ..self.clone()
        }
    }
}

struct Sections {
    overview: Option<TickerOverview>,
    company: Option<CompanyOverview>,
    history: Vec<HistoryPoint>,
    degraded: bool,
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Orchestration
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

/// Drives [`DashboardState`] transitions against a [`MarketData`] source and
/// publishes every snapshot (including the Loading one) to subscribers.
pub struct Dashboard<S: ?Sized> {
    source: Arc<S>,
    snapshots: watch::Sender<DashboardState>,
}

impl<S> Dashboard<S>
where
    S: MarketData + ?Sized + 'static,
{
    pub fn new(source: Arc<S>) -> Self {
        let (snapshots, _) = watch::channel(DashboardState::default());
        Self { source, snapshots }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.snapshots.subscribe()
    }

    fn publish(&self, state: DashboardState) -> DashboardState {
        self.snapshots.send_replace(state.clone());
        state
    }

    /// Fetches overview, company and history for `ticker` concurrently.
    ///
    /// A failing section is logged and shown as "no data"; the other two are
    /// unaffected. An empty `ticker` returns `state` untouched.
    pub async fn search(&self, state: &DashboardState, ticker: &str) -> DashboardState {
        if ticker.is_empty() {
            trace!("empty ticker; search skipped");
            return state.clone();
        }
        let loading = self.publish(state.loading());
        debug!("searching {ticker} over {}", loading.range);

        let overview = tokio::spawn({
            let source = Arc::clone(&self.source);
            let ticker = ticker.to_string();
            async move { source.fetch_ticker_overview(&ticker).await }
        });
        let company = tokio::spawn({
            let source = Arc::clone(&self.source);
            let ticker = ticker.to_string();
            async move { source.fetch_company_overview(&ticker).await }
        });
        let history = tokio::spawn({
            let source = Arc::clone(&self.source);
            let ticker = ticker.to_string();
            let range = loading.range;
            async move { source.fetch_ticker_history(&ticker, range).await }
        });

        let (overview, company, history) = match tokio::join!(overview, company, history) {
            (Ok(overview), Ok(company), Ok(history)) => (overview, company, history),
            (overview, company, history) => {
                for e in [overview.err(), company.err(), history.err()]
                    .into_iter()
                    .flatten()
                {
                    error!("search for {ticker} aborted: {e}");
                }
                return self.publish(loading.failed(SEARCH_FAILED));
            }
        };

        let degraded = overview.is_err() || company.is_err() || history.is_err();
        let sections = Sections {
            overview: settle("overview", ticker, overview),
            company: settle("company", ticker, company),
            history: settle("history", ticker, history),
            degraded,
        };
        self.publish(loading.settled(ticker, sections))
    }

    /// Switches the history range, then repeats the whole search.
    pub async fn set_range(&self, state: &DashboardState, range: Range) -> DashboardState {
        let ticker = state.selected_ticker.clone();
        self.search(&state.with_range(range), &ticker).await
    }

    pub async fn refresh(&self, state: &DashboardState) -> DashboardState {
        self.search(state, &state.selected_ticker).await
    }
}

/// Keeps a section's value, or degrades it to its "no data" form.
fn settle<T: Default>(section: &str, ticker: &str, result: anyhow::Result<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!("{section} for {ticker} unavailable: {e}");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, Overview};
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Canned sections; `None` makes that section fail.
    #[derive(Default)]
    struct FakeMarket {
        overview: Option<Overview>,
        company: Option<Overview>,
        history: Option<Vec<HistoryPoint>>,
        panic_on_history: bool,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MarketData for FakeMarket {
        async fn fetch_ticker_overview(&self, ticker: &str) -> Result<Option<TickerOverview>> {
            self.requested.lock().unwrap().push(format!("overview {ticker}"));
            match &self.overview {
                Some(overview) => Ok(Some(overview.clone())),
                None => bail!("overview down"),
            }
        }

        async fn fetch_company_overview(&self, ticker: &str) -> Result<Option<CompanyOverview>> {
            self.requested.lock().unwrap().push(format!("company {ticker}"));
            match &self.company {
                Some(company) => Ok(Some(company.clone())),
                None => bail!("company down"),
            }
        }

        async fn fetch_ticker_history(&self, ticker: &str, range: Range) -> Result<Vec<HistoryPoint>> {
            self.requested.lock().unwrap().push(format!("history {ticker} {range}"));
            if self.panic_on_history {
                panic!("history exploded");
            }
            match &self.history {
                Some(history) => Ok(history.clone()),
                None => bail!("history down"),
            }
        }

        async fn search_tickers(&self, _: &str) -> Result<Vec<String>> {
            bail!("unused")
        }
    }

    fn record(pairs: &[(&str, f64)]) -> Overview {
        Overview(
            pairs
                .iter()
                .map(|(k, v)| {
                    let n = serde_json::Number::from_f64(*v).unwrap();
                    (k.to_string(), Field::Number(n))
                })
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn history() -> Vec<HistoryPoint> {
        vec![
            HistoryPoint { date: "2024-01-01".into(), close: 40.0 },
            HistoryPoint { date: "2024-01-02".into(), close: 41.5 },
        ]
    }

    fn healthy() -> FakeMarket {
        FakeMarket {
            overview: Some(record(&[("lastPrice", 41.5)])),
            company: Some(record(&[("employees", 1200.0)])),
            history: Some(history()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_search_selects_uppercased_ticker() {
        let dashboard = Dashboard::new(Arc::new(healthy()));
        let state = dashboard.search(&DashboardState::default(), "fpt").await;

        assert_eq!(state.selected_ticker, "FPT");
        assert_eq!(state.phase, Phase::Ready);
        assert!(!state.is_loading());
        assert!(state.overview.is_some());
        assert!(state.company.is_some());
        assert_eq!(state.history, history());
        assert_eq!(state.notice, None);
    }

    #[tokio::test]
    async fn test_empty_ticker_is_a_no_op() {
        let source = Arc::new(healthy());
        let dashboard = Dashboard::new(source.clone());
        let before = DashboardState::default();

        let after = dashboard.search(&before, "").await;
        assert_eq!(after, before);
        assert!(source.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_overview_does_not_block_other_sections() {
        let dashboard = Dashboard::new(Arc::new(FakeMarket {
            overview: None,
            ..healthy()
        }));
        let state = dashboard.search(&DashboardState::default(), "vhm").await;

        assert_eq!(state.phase, Phase::PartialReady);
        assert!(!state.is_loading());
        assert_eq!(state.overview, None);
        assert!(state.company.is_some());
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.selected_ticker, "VHM");
        assert_eq!(state.notice, None);
    }

    #[tokio::test]
    async fn test_all_sections_failing_is_still_displayable() {
        let dashboard = Dashboard::new(Arc::new(FakeMarket::default()));
        let state = dashboard.search(&DashboardState::default(), "ssi").await;

        assert_eq!(state.phase, Phase::PartialReady);
        assert_eq!(state.selected_ticker, "SSI");
        assert_eq!(state.overview, None);
        assert_eq!(state.company, None);
        assert!(state.history.is_empty());
        assert_eq!(state.notice, None);
    }

    #[tokio::test]
    async fn test_unexpected_failure_raises_notice_and_leaves_loading() {
        let dashboard = Dashboard::new(Arc::new(FakeMarket {
            panic_on_history: true,
            ..healthy()
        }));
        let before = DashboardState {
            selected_ticker: "VIC".into(),
            ..Default::default()
        };
        let state = dashboard.search(&before, "fpt").await;

        assert!(!state.is_loading());
        assert_eq!(state.notice.as_ref().map(|n| n.message.as_str()), Some(SEARCH_FAILED));
        assert_eq!(state.selected_ticker, "VIC");
        assert_eq!(state.overview, None);
        assert!(state.history.is_empty());
    }

    #[tokio::test]
    async fn test_loading_snapshot_is_published_first() {
        let dashboard = Dashboard::new(Arc::new(healthy()));
        let mut snapshots = dashboard.subscribe();
        let previous = dashboard.search(&DashboardState::default(), "VHM").await;

        // a subscriber that only looks now sees the settled snapshot
        assert_eq!(*snapshots.borrow_and_update(), previous);

        let stale = previous.clone();
        let search = dashboard.search(&stale, "VNM");
        let loading = async {
            snapshots.changed().await.unwrap();
            snapshots.borrow_and_update().clone()
        };
        let (settled, loading) = tokio::join!(search, loading);

        assert!(loading.is_loading());
        assert_eq!(loading.overview, None);
        assert!(loading.history.is_empty());
        assert_eq!(loading.selected_ticker, "VHM");
        assert_eq!(settled.selected_ticker, "VNM");
    }

    #[tokio::test]
    async fn test_range_change_repeats_full_search() {
        let source = Arc::new(healthy());
        let dashboard = Dashboard::new(source.clone());
        let state = dashboard.search(&DashboardState::default(), "hpg").await;
        source.requested.lock().unwrap().clear();

        let state = dashboard.set_range(&state, Range::OneYear).await;
        assert_eq!(state.range, Range::OneYear);
        assert_eq!(state.selected_ticker, "HPG");

        let mut requested = source.requested.lock().unwrap().clone();
        requested.sort();
        assert_eq!(requested, ["company HPG", "history HPG 1y", "overview HPG"]);
    }

    #[tokio::test]
    async fn test_refresh_keeps_ticker_and_range() {
        let source = Arc::new(healthy());
        let dashboard = Dashboard::new(source.clone());
        let state = DashboardState {
            selected_ticker: "MWG".into(),
            range: Range::SixMonths,
            ..Default::default()
        };

        let state = dashboard.refresh(&state).await;
        assert_eq!(state.selected_ticker, "MWG");
        assert_eq!(state.range, Range::SixMonths);
        assert!(source
            .requested
            .lock()
            .unwrap()
            .contains(&"history MWG 6m".to_string()));
    }
}
