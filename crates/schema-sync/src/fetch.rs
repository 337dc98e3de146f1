//! Conditional HTTP fetch of a single schema.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{
    ACCEPT, ETAG, HeaderMap, HeaderName, HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED,
};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::SyncOptions;
use crate::error::FetchError;
use crate::meta::Validator;

/// Media type requested from the schema server.
pub const SCHEMA_MEDIA_TYPE: &str = "application/schema+json";

/// Result of a successful conditional fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// 304: the cached entry is current.
    NotModified,
    /// 2xx with at least one validator and a JSON body.
    Fresh { validator: Validator, payload: Value },
}

/// Issues one conditional GET per call. Implementations hold no per-schema state.
pub trait Fetcher {
    fn fetch(&self, url: &Url, validator: Option<&Validator>) -> Result<FetchOutcome, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, url: &Url, validator: Option<&Validator>) -> Result<FetchOutcome, FetchError> {
        (**self).fetch(url, validator)
    }
}

/// Ask the server to inline cross-document references.
///
/// Appends `bundle=1`, joining with `&` when the URL already has a query.
pub fn bundle_url(url: &Url) -> Url {
    let mut bundled = url.clone();
    bundled.query_pairs_mut().append_pair("bundle", "1");
    bundled
}

/// Request headers for a fetch, conditional when a validator is given.
pub(crate) fn request_headers(validator: Option<&Validator>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(SCHEMA_MEDIA_TYPE));

    let Some(validator) = validator else {
        return headers;
    };
    if let Some(ref etag) = validator.etag
        && let Ok(value) = HeaderValue::from_str(etag)
    {
        headers.insert(IF_NONE_MATCH, value);
    }
    if let Some(ref last_modified) = validator.last_modified
        && let Ok(value) = HeaderValue::from_str(last_modified)
    {
        headers.insert(IF_MODIFIED_SINCE, value);
    }
    headers
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// [`Fetcher`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_payload_size: u64,
}

impl HttpFetcher {
    pub fn new(opts: &SyncOptions) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(opts.connect_timeout)
            .timeout(opts.timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            max_payload_size: opts.max_payload_size,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url, validator: Option<&Validator>) -> Result<FetchOutcome, FetchError> {
        debug!(%url, conditional = validator.is_some(), "requesting schema");

        let response = self
            .client
            .get(url.as_str())
            .headers(request_headers(validator))
            .send()?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        if let Some(content_length) = response.content_length()
            && content_length > self.max_payload_size
        {
            return Err(FetchError::PayloadTooLarge {
                size: content_length,
                limit: self.max_payload_size,
            });
        }

        // Extract headers before consuming response
        let validator = Validator {
            etag: header_string(response.headers(), ETAG),
            last_modified: header_string(response.headers(), LAST_MODIFIED),
        };
        if validator.is_empty() {
            return Err(FetchError::ValidatorMissing);
        }

        let body = response.bytes()?;

        // Verify size limit for streaming responses
        if body.len() as u64 > self.max_payload_size {
            return Err(FetchError::PayloadTooLarge {
                size: body.len() as u64,
                limit: self.max_payload_size,
            });
        }

        let payload = serde_json::from_slice(&body).map_err(FetchError::Parse)?;
        debug!(
            %url,
            etag = ?validator.etag,
            last_modified = ?validator.last_modified,
            "received schema"
        );

        Ok(FetchOutcome::Fresh { validator, payload })
    }
}
