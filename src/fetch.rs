//! Conditional HTTP GET

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{CONTENT_TYPE, IF_MODIFIED_SINCE, LAST_MODIFIED};
use reqwest::StatusCode;

use crate::cache::Timestamp;
use crate::config::{HTTP_TIMEOUT, USER_AGENT};

/// Result of a conditional GET
#[derive(Debug)]
pub enum FetchResponse {
    NotModified,
    Fresh {
        last_modified: Option<Timestamp>,
        /// `charset` parameter of the `Content-Type` header
        charset: Option<String>,
        body: Vec<u8>,
    },
}

pub trait Fetch {
    /// GET `url`, sending `If-Modified-Since` when a previous timestamp is known
    fn fetch(&self, url: &str, if_modified_since: Option<Timestamp>) -> Result<FetchResponse>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, if_modified_since: Option<Timestamp>) -> Result<FetchResponse> {
        let mut request = self.client.get(url);
        if let Some(ts) = if_modified_since {
            request = request.header(IF_MODIFIED_SINCE, http_date(&ts));
        }

        let response = request
            .send()
            .with_context(|| format!("Failed to fetch: {}", url))?;

        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(FetchResponse::NotModified);
        }

        let response = response
            .error_for_status()
            .with_context(|| format!("Unexpected response from {}", url))?;

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| DateTime::parse_from_rfc2822(s.trim()).ok());

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_param);

        let body = response
            .bytes()
            .with_context(|| format!("Failed to read response: {}", url))?;

        Ok(FetchResponse::Fresh {
            last_modified,
            charset,
            body: body.to_vec(),
        })
    }
}

/// Extract the `charset` parameter from a `Content-Type` value
pub fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Format a timestamp as an IMF-fixdate ("Sun, 06 Nov 1994 08:49:37 GMT")
pub fn http_date(ts: &Timestamp) -> String {
    ts.with_timezone(&Utc)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
