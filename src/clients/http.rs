use http::StatusCode;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use rquest::{Client, RequestBuilder, Response};
use rquest_util::Emulation;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::Settings;
use crate::error::{Error, Result};

/// One browser-emulating HTTP client with the configured default headers.
pub struct HttpClient {
    client: Client,
    headers: HeaderMap,
}

impl HttpClient {
    pub fn new(settings: &Settings, emulation: Emulation) -> Result<Self> {
        let mut headers = HeaderMap::new();

        for (key, value) in settings.http.headers.iter() {
            if let (Ok(header_name), Ok(header_value)) = (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(header_name, header_value);
            } else {
                error!(header_key = key, header_value = value, "Invalid header value");
            }
        }

        debug!(emulation = ?emulation, "Creating client with emulation");

        let client = Client::builder()
            .emulation(emulation)
            .timeout(Duration::from_secs(settings.http.timeout_secs))
            .build()?;

        Ok(Self { client, headers })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        let mut request = self.client.get(url);
        for (key, value) in self.headers.iter() {
            request = request.header(key, value);
        }
        request
    }

    /// Sends a request, mapping throttling and blocking statuses onto typed
    /// errors so the retry layer can tell them apart.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;

        debug!(
            status = response.status().as_u16(),
            url = %response.url(),
            "Response received"
        );

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimit),
            StatusCode::FORBIDDEN => Err(Error::Forbidden),
            status if !status.is_success() => Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            }),
            _ => Ok(response),
        }
    }
}
