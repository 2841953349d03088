use std::io::Write;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};

use crate::error::HarvestError;
use crate::pixabay::default_headers;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Upper bound on a whole GET, body included. Only a stalled transfer reaches it.
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTimeouts {
    /// Whole HEAD request.
    pub probe: Duration,
    /// Establishing the connection for the GET.
    pub connect: Duration,
    /// Whole GET, body included.
    pub transfer: Duration,
}

impl Default for ImageTimeouts {
    fn default() -> Self {
        Self {
            probe: PROBE_TIMEOUT,
            connect: CONNECT_TIMEOUT,
            transfer: TRANSFER_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageProbe {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

pub trait ImageClient: Send + Sync {
    /// Metadata-only request made before the transfer.
    fn probe(&self, url: &str) -> Result<ImageProbe, HarvestError>;
    /// Streams the body into `out` and returns the number of bytes written.
    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64, HarvestError>;
}

#[derive(Clone)]
pub struct ImageHttpClient {
    client: Client,
    timeouts: ImageTimeouts,
}

impl ImageHttpClient {
    pub fn new(user_agent: Option<&str>) -> Result<Self, HarvestError> {
        Self::with_timeouts(user_agent, ImageTimeouts::default())
    }

    /// A large image on a slow link keeps streaming past `connect`; only
    /// `transfer` bounds the full download.
    pub fn with_timeouts(
        user_agent: Option<&str>,
        timeouts: ImageTimeouts,
    ) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .default_headers(default_headers(user_agent)?)
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.transfer)
            .build()
            .map_err(|err| HarvestError::ImageHttp(err.to_string()))?;
        Ok(Self { client, timeouts })
    }

    fn ensure_success(
        response: reqwest::blocking::Response,
        url: &str,
    ) -> Result<reqwest::blocking::Response, HarvestError> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(HarvestError::ImageStatus {
            status: response.status().as_u16(),
            url: url.to_string(),
        })
    }
}

impl ImageClient for ImageHttpClient {
    fn probe(&self, url: &str) -> Result<ImageProbe, HarvestError> {
        let response = self
            .client
            .head(url)
            .timeout(self.timeouts.probe)
            .send()
            .map_err(|err| HarvestError::ImageHttp(err.to_string()))?;
        let response = Self::ensure_success(response, url)?;
        let headers = response.headers();
        Ok(ImageProbe {
            content_type: headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.to_string()),
            content_length: headers
                .get(CONTENT_LENGTH)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok()),
        })
    }

    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64, HarvestError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| HarvestError::ImageHttp(err.to_string()))?;
        let mut response = Self::ensure_success(response, url)?;
        std::io::copy(&mut response, out)
            .map_err(|err| HarvestError::ImageHttp(format!("transfer {url}: {err}")))
    }
}
