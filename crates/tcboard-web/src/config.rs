use dotenv::var;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_PREFIX: &str = "/.netlify/functions/proxy";
pub const DEFAULT_UPSTREAM_HOST: &str = "https://apipubaws.tcbs.com.vn";
pub const DEFAULT_REFERER: &str = "https://tcinvest.tcbs.com.vn/";

/// Relay settings, read from the environment (or a `.env` file).
///
/// | variable           | default                          |
/// |--------------------|----------------------------------|
/// | `RELAY_ADDR`       | `127.0.0.1:8080`                 |
/// | `RELAY_PREFIX`     | `/.netlify/functions/proxy`      |
/// | `UPSTREAM_HOST`    | `https://apipubaws.tcbs.com.vn`  |
/// | `UPSTREAM_REFERER` | `https://tcinvest.tcbs.com.vn/`  |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub addr: String,
    pub prefix: String,
    pub upstream_host: String,
    pub referer: String,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self {
            addr: var("RELAY_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string()),
            prefix: var("RELAY_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string()),
            upstream_host: var("UPSTREAM_HOST")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_HOST.to_string()),
            referer: var("UPSTREAM_REFERER").unwrap_or_else(|_| DEFAULT_REFERER.to_string()),
        }
    }

    /// Same settings, forwarding to a different upstream host.
    pub fn with_upstream(mut self, upstream_host: impl Into<String>) -> Self {
        self.upstream_host = upstream_host.into();
        self
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            upstream_host: DEFAULT_UPSTREAM_HOST.to_string(),
            referer: DEFAULT_REFERER.to_string(),
        }
    }
}
