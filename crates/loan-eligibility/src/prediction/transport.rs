use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};

use super::wire::WireRecord;

/// Outbound seam to the scoring service. Implementations return the raw
/// response body of a successful (2xx) exchange.
pub trait PredictionTransport: Send + Sync {
    fn send(&self, record: &WireRecord)
        -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// Failure observed while exchanging a record with the scoring service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No usable response: connection refused, DNS, timeout, reset.
    #[error("scoring service unreachable: {0}")]
    Network(String),
    /// The service answered with a non-success status.
    #[error("scoring service responded with status {status}")]
    Server { status: u16, body: String },
    /// A success status whose body could not be decoded as text.
    #[error("scoring service returned a malformed body: {0}")]
    MalformedBody(String),
}

/// reqwest-backed transport posting JSON to a configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpPredictionTransport {
    client: Client,
    endpoint: Url,
}

impl HttpPredictionTransport {
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl PredictionTransport for HttpPredictionTransport {
    async fn send(&self, record: &WireRecord) -> Result<String, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(record)
            .send()
            .await
            .map_err(|err| TransportError::Network(describe(&err)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Server {
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|err| {
            if err.is_decode() {
                TransportError::MalformedBody(describe(&err))
            } else {
                TransportError::Network(describe(&err))
            }
        })
    }
}

fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
