use std::io::{self, Read};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::read::GzDecoder;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_SNAPSHOT_URL: &str = "https://www.toggl.com/api/v8/me?with_related_data=true";

#[derive(Debug, Clone, Error)]
pub enum TogglError {
    #[error("Invalid API token.")]
    Unauthorized,
    #[error("Toggl subscription required.")]
    PaymentRequired,
    #[error("Toggl API rate limit reached.")]
    RateLimited,
    #[error("{0}")]
    ServerError(String),
    #[error("{0}")]
    Network(String),
    #[error("Could not decode response: {0}")]
    Decode(String),
}

/// Anything that can hand over the text of a full account snapshot.
pub trait SnapshotSource {
    fn fetch_snapshot(&self) -> Result<String, TogglError>;
}

#[derive(Clone)]
pub struct TogglClient {
    client: Client,
    token: String,
    url: String,
}

impl TogglClient {
    pub fn new(token: String) -> Result<Self, TogglError> {
        let client = Client::builder()
            .user_agent("togglsync")
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| TogglError::Network(err.to_string()))?;
        Ok(Self {
            client,
            token,
            url: DEFAULT_SNAPSHOT_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn fetch(&self) -> Result<String, TogglError> {
        let credentials = STANDARD.encode(format!("{}:api_token", self.token));
        debug!(url = %self.url, "sending snapshot request");
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT_ENCODING, "gzip")
            .header("Authorization", format!("Basic {}", credentials))
            .send()
            .map_err(|err| TogglError::Network(err.to_string()))?;

        let status = response.status();
        let gzipped = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("gzip"));
        debug!(status = status.as_u16(), gzipped, "snapshot response received");

        let bytes = response
            .bytes()
            .map_err(|err| TogglError::Network(err.to_string()))?;
        let body = decode_response(&bytes, gzipped);
        check_status(status, body.as_deref().unwrap_or_default())?;
        body.map_err(|err| TogglError::Decode(err.to_string()))
    }
}

/// Maps a response status to the client error it stands for. `body` is only quoted for
/// statuses without a dedicated variant.
fn check_status(status: StatusCode, body: &str) -> Result<(), TogglError> {
    match status.as_u16() {
        200 | 202 => Ok(()),
        401 | 403 => Err(TogglError::Unauthorized),
        402 => Err(TogglError::PaymentRequired),
        429 => Err(TogglError::RateLimited),
        _ if status.is_server_error() => {
            Err(TogglError::ServerError(format!("Toggl API error: {}", status)))
        }
        _ => Err(TogglError::Network(format!(
            "Toggl API error: {}: {}",
            status,
            body.trim()
        ))),
    }
}

impl SnapshotSource for TogglClient {
    fn fetch_snapshot(&self) -> Result<String, TogglError> {
        self.fetch()
    }
}

/// True when `bytes` starts with the gzip magic number.
pub fn looks_gzipped(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x1f, 0x8b])
}

pub fn decode_body(bytes: &[u8], gzipped: bool) -> Result<String, io::Error> {
    if gzipped {
        let mut text = String::new();
        GzDecoder::new(bytes).read_to_string(&mut text)?;
        return Ok(text);
    }

    String::from_utf8(bytes.to_vec()).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

/// Decompresses when either the `Content-Encoding` header or the magic number says gzip.
fn decode_response(bytes: &[u8], gzip_header: bool) -> Result<String, io::Error> {
    decode_body(bytes, gzip_header || looks_gzipped(bytes))
}
