use loan_eligibility::error::AppError;
use loan_eligibility::prediction::{
    LoanField, PredictionTransport, RawFieldSet, TransportError, WireRecord,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// One canned scoring response, optionally delayed to simulate latency.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedReply {
    pub(crate) delay: Duration,
    pub(crate) result: Result<String, TransportError>,
}

impl ScriptedReply {
    pub(crate) fn body(body: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(body.to_string()),
        }
    }

    pub(crate) fn failure(error: TransportError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    pub(crate) fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Offline scoring service: replies are consumed in call order and every
/// outbound record is kept for inspection.
#[derive(Default, Clone)]
pub(crate) struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    sent: Arc<Mutex<Vec<WireRecord>>>,
}

impl ScriptedTransport {
    pub(crate) fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            sent: Arc::default(),
        }
    }

    pub(crate) fn sent(&self) -> Vec<WireRecord> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }
}

impl PredictionTransport for ScriptedTransport {
    async fn send(&self, record: &WireRecord) -> Result<String, TransportError> {
        self.sent
            .lock()
            .expect("sent mutex poisoned")
            .push(record.clone());
        let reply = self
            .replies
            .lock()
            .expect("replies mutex poisoned")
            .pop_front();

        match reply {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.result
            }
            None => Err(TransportError::Network(
                "scripted scoring service has no replies left".to_string(),
            )),
        }
    }
}

/// Parse a `name=value` assignment such as `loanAmount=128`.
pub(crate) fn parse_field_assignment(raw: &str) -> Result<(LoanField, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, found '{raw}'"))?;
    let field = name
        .trim()
        .parse::<LoanField>()
        .map_err(|err| err.to_string())?;
    Ok((field, value.to_string()))
}

/// Load a flat JSON object of field names to raw strings.
pub(crate) fn load_field_file(path: &Path) -> Result<RawFieldSet, AppError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|err| AppError::Input(format!("{}: {err}", path.display())))
}
