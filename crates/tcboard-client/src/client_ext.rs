use crate::schema::{
    normalize_history, CompanyOverview, Field, HistoryPoint, Overview, Range, TickerOverview,
};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};
use url::{form_urlencoded, Url};

pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:8080/.netlify/functions/proxy";

/// The upstream market-data endpoints, as seen through the relay.
///
/// Implementations return errors freely; containing them is the caller's job
/// (see [`Dashboard::search`] and [`fetch_ticker_suggestions`]).
///
/// [`Dashboard::search`]: crate::dashboard::Dashboard::search
/// [`fetch_ticker_suggestions`]: crate::suggest::fetch_ticker_suggestions
#[async_trait]
pub trait MarketData: Send + Sync {
    /// `/tcanalysis/v1/ticker/{ticker}/overview`
    async fn fetch_ticker_overview(&self, ticker: &str) -> Result<Option<TickerOverview>>;

    /// `/tcanalysis/v1/company/{ticker}/overview`
    async fn fetch_company_overview(&self, ticker: &str) -> Result<Option<CompanyOverview>>;

    /// `/tcanalysis/v1/ticker/{ticker}/history?range={range}`
    async fn fetch_ticker_history(&self, ticker: &str, range: Range) -> Result<Vec<HistoryPoint>>;

    /// `/tcanalysis/v1/search?query={query}`, without any fallback.
    async fn search_tickers(&self, query: &str) -> Result<Vec<String>>;
}

// -------------------------------------------------------------------------------------------------

/// [`MarketData`] over HTTP, every request going through the relay at `base`.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: Client,
    base: Url,
}

impl RelayClient {
    pub fn new(base: &str, user_agent: &str) -> Result<Self> {
        let base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            bail!("relay URL {base} cannot carry a path");
        }
        let http = reqwest::ClientBuilder::new()
            .user_agent(user_agent)
            .build()?;
        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The relay URL for an upstream path; each segment is percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("relay URL {} cannot carry a path", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `.../search?query=<q>`, with spaces sent as `%20` rather than `+`.
    pub fn search_url(&self, query: &str) -> Result<Url> {
        let mut url = self.endpoint(&["tcanalysis", "v1", "search"])?;
        let query: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        // a literal `+` is already `%2B`, so every `+` left is a space
        url.set_query(Some(&format!("query={}", query.replace('+', "%20"))));
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        trace!("GET {url}");
        let response = self.http.get(url.clone()).send().await?.error_for_status()?;
        let data = response.json::<T>().await?;
        debug!("GET {url} deserialized");
        Ok(data)
    }
}

#[async_trait]
impl MarketData for RelayClient {
    async fn fetch_ticker_overview(&self, ticker: &str) -> Result<Option<TickerOverview>> {
        let url = self.endpoint(&["tcanalysis", "v1", "ticker", ticker, "overview"])?;
        let body: Value = self.fetch(url).await?;
        Ok(Overview::from_body(body))
    }

    async fn fetch_company_overview(&self, ticker: &str) -> Result<Option<CompanyOverview>> {
        let url = self.endpoint(&["tcanalysis", "v1", "company", ticker, "overview"])?;
        let body: Value = self.fetch(url).await?;
        Ok(Overview::from_body(body))
    }

    async fn fetch_ticker_history(&self, ticker: &str, range: Range) -> Result<Vec<HistoryPoint>> {
        let mut url = self.endpoint(&["tcanalysis", "v1", "ticker", ticker, "history"])?;
        url.query_pairs_mut().append_pair("range", range.code());
        let body: Value = self.fetch(url).await?;
        Ok(normalize_history(&body))
    }

    async fn search_tickers(&self, query: &str) -> Result<Vec<String>> {
        let found: SearchResponse = self.fetch(self.search_url(query)?).await?;
        Ok(found
            .items
            .into_iter()
            .filter_map(|item| item.ticker)
            .map(|ticker| ticker.to_string())
            .collect())
    }
}

// -------------------------------------------------------------------------------------------------
// Deserialization

// { "items": [ { "ticker": "VNM", ... }, ... ] }
#[derive(Deserialize, Debug)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

// items without a ticker are skipped; numeric tickers are kept as text
#[derive(Deserialize, Debug)]
struct SearchItem {
    #[serde(default)]
    ticker: Option<Field>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
