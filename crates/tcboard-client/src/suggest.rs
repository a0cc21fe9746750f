use crate::client_ext::MarketData;
use crate::debounce::Debouncer;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{trace, warn};

/// Offered when the remote search is unavailable.
pub const FALLBACK_TICKERS: [&str; 11] = [
    "VHM", "VIC", "VNM", "SSI", "MSN", "FPT", "VCB", "HPG", "BVH", "MWG", "PSC",
];

/// Ticker suggestions for a partial query. Never fails: an empty query gives
/// nothing, and a failed remote search falls back to [`FALLBACK_TICKERS`].
pub async fn fetch_ticker_suggestions<S>(source: &S, query: &str) -> Vec<String>
where
    S: MarketData + ?Sized,
{
    if query.is_empty() {
        return vec![];
    }
    match source.search_tickers(query).await {
        Ok(tickers) => tickers,
        Err(e) => {
            warn!("ticker search for {query:?} failed, using fallback list: {e}");
            fallback_suggestions(query)
        }
    }
}

pub fn fallback_suggestions(query: &str) -> Vec<String> {
    let needle = query.to_uppercase();
    FALLBACK_TICKERS
        .iter()
        .filter(|ticker| ticker.contains(&needle))
        .map(|ticker| ticker.to_string())
        .collect()
}

// -------------------------------------------------------------------------------------------------

/// Debounced search-as-you-type. Results are published on a watch channel;
/// see [`Suggester::subscribe`].
pub struct Suggester<S: ?Sized> {
    source: Arc<S>,
    debouncer: Debouncer,
    suggestions: watch::Sender<Vec<String>>,
}

impl<S> Suggester<S>
where
    S: MarketData + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, debouncer: Debouncer) -> Self {
        let (suggestions, _) = watch::channel(vec![]);
        Self {
            source,
            debouncer,
            suggestions,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.suggestions.subscribe()
    }

    /// Latest published suggestions.
    pub fn current(&self) -> Vec<String> {
        self.suggestions.borrow().clone()
    }

    /// Call on every keystroke; the lookup only runs once typing pauses.
    pub fn search_input(&mut self, text: &str) {
        let source = Arc::clone(&self.source);
        let suggestions = self.suggestions.clone();
        let text = text.to_string();
        self.debouncer.call(async move {
            let found = fetch_ticker_suggestions(source.as_ref(), &text).await;
            trace!("{} suggestions for {text:?}", found.len());
            suggestions.send_replace(found);
        });
    }
}
