use crate::config::RelayConfig;
use crate::error::RelayError;
use actix_web::{
    http::{header, Method, StatusCode},
    web, HttpRequest, HttpResponse, HttpResponseBuilder,
};
use log::{debug, trace};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER};
use url::Url;

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Relay: `<prefix>/<upstream-path>?<query>`  ->  `<upstream-host>/<upstream-path>?<query>`
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Shared by every worker; holds nothing that changes between requests.
pub struct Relay {
    pub config: RelayConfig,
    client: reqwest::Client,
}

impl Relay {
    /// Builds the pooled client with the fixed `Accept` and `Referer` headers attached.
    pub fn new(config: RelayConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(REFERER, HeaderValue::from_str(&config.referer)?);
        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()?;
        Ok(Self { config, client })
    }

    /// Upstream target for an inbound `path` and raw `query`.
    pub fn target(&self, path: &str, query: &str) -> Result<Url, RelayError> {
        target_url(&self.config.upstream_host, &self.config.prefix, path, query)
    }
}

/// Strips `prefix` from `path` (a path without it is forwarded as is) and
/// appends `?query` only when the query is non-empty.
///
/// Only the path and query of `host` are replaced, so the target always stays
/// on the configured host. Whatever follows the prefix must be empty or start
/// with `/`; `<prefix>@other.host/...` is refused.
pub fn target_url(host: &str, prefix: &str, path: &str, query: &str) -> Result<Url, RelayError> {
    let upstream_path = path.strip_prefix(prefix).unwrap_or(path);
    if !upstream_path.is_empty() && !upstream_path.starts_with('/') {
        return Err(RelayError::Route(path.to_string()));
    }
    let mut target = Url::parse(host)?;
    target.set_path(upstream_path);
    target.set_query(Some(query).filter(|query| !query.is_empty()));
    Ok(target)
}

/// Permissive CORS headers, attached to every relay response.
pub fn cors(builder: &mut HttpResponseBuilder) -> &mut HttpResponseBuilder {
    builder
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .insert_header((
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            "Content-Type, Authorization",
        ))
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"))
}

// -------------------------------------------------------------------------------------------------

/// Entry point for every inbound request; preflights are answered locally,
/// everything else is forwarded upstream as a GET.
pub async fn dispatch(
    req: HttpRequest,
    relay: web::Data<Relay>,
) -> Result<HttpResponse, RelayError> {
    if *req.method() == Method::OPTIONS {
        return Ok(preflight());
    }
    forward(&req, &relay).await
}

pub fn preflight() -> HttpResponse {
    cors(&mut HttpResponse::NoContent()).finish()
}

pub async fn forward(req: &HttpRequest, relay: &Relay) -> Result<HttpResponse, RelayError> {
    let target = relay.target(req.path(), req.query_string())?;
    trace!("forwarding {} to {target}", req.path());

    let response = relay.client.get(target.clone()).send().await?;
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/json")
        .to_string();
    let body = response.text().await?;
    debug!("{target} answered {status} ({} bytes)", body.len());

    let status = StatusCode::from_u16(status).map_err(|_| RelayError::Status(status))?;
    Ok(cors(&mut HttpResponse::build(status))
        .insert_header((header::CONTENT_TYPE, content_type))
        .body(body))
}

////////////////////////////////////////////////////////////////////////////////////////////////////
