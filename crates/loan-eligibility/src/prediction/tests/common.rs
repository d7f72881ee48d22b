use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::prediction::domain::{LoanField, RawFieldSet};
use crate::prediction::orchestrator::PredictionOrchestrator;
use crate::prediction::transport::{PredictionTransport, TransportError};
use crate::prediction::wire::{CreditHistoryEncoding, WireRecord};

pub(super) const APPROVED_BODY: &str = r#"{"prediction": 1}"#;
pub(super) const DENIED_BODY: &str = r#"{"prediction": 0}"#;

pub(super) fn valid_fields() -> RawFieldSet {
    RawFieldSet::new()
        .with(LoanField::Gender, "Male")
        .with(LoanField::Married, "Yes")
        .with(LoanField::Dependents, "1")
        .with(LoanField::Education, "Graduate")
        .with(LoanField::SelfEmployed, "No")
        .with(LoanField::ApplicantIncome, "4583")
        .with(LoanField::CoapplicantIncome, "1508")
        .with(LoanField::LoanAmount, "128")
        .with(LoanField::LoanAmountTerm, "360")
        .with(LoanField::CreditHistory, "Yes")
        .with(LoanField::PropertyArea, "Rural")
}

/// Valid form with a different loan amount so records can be told apart.
pub(super) fn alternate_fields() -> RawFieldSet {
    valid_fields().with(LoanField::LoanAmount, "66")
}

pub(super) fn invalid_fields() -> RawFieldSet {
    let mut fields = valid_fields()
        .with(LoanField::Gender, "M")
        .with(LoanField::ApplicantIncome, "-4583")
        .with(LoanField::PropertyArea, "rural");
    fields.remove(LoanField::LoanAmountTerm);
    fields
}

pub(super) fn orchestrator<T: PredictionTransport>(transport: T) -> PredictionOrchestrator<T> {
    PredictionOrchestrator::new(transport, CreditHistoryEncoding::Label)
}

/// Replies from a fixed script, in order, and records every record sent.
#[derive(Default, Clone)]
pub(super) struct MemoryTransport {
    replies: Arc<Mutex<VecDeque<Result<String, TransportError>>>>,
    sent: Arc<Mutex<Vec<Value>>>,
}

impl MemoryTransport {
    pub(super) fn replying(replies: Vec<Result<String, TransportError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            sent: Arc::default(),
        }
    }

    pub(super) fn sent(&self) -> Vec<Value> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }
}

impl PredictionTransport for MemoryTransport {
    async fn send(&self, record: &WireRecord) -> Result<String, TransportError> {
        self.sent
            .lock()
            .expect("sent mutex poisoned")
            .push(serde_json::to_value(record).expect("record serializes"));
        self.replies
            .lock()
            .expect("reply mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted reply".to_string())))
    }
}

type Gate = oneshot::Sender<Result<String, TransportError>>;

/// Holds every call open until the test releases it, so responses can be
/// delivered in any order.
#[derive(Default, Clone)]
pub(super) struct GatedTransport {
    gates: Arc<Mutex<Vec<Option<Gate>>>>,
    sent: Arc<Mutex<Vec<Value>>>,
}

impl GatedTransport {
    pub(super) fn calls(&self) -> usize {
        self.gates.lock().expect("gate mutex poisoned").len()
    }

    pub(super) async fn wait_for_calls(&self, count: usize) {
        while self.calls() < count {
            tokio::task::yield_now().await;
        }
    }

    pub(super) fn release(&self, call: usize, reply: Result<String, TransportError>) {
        let gate = self.gates.lock().expect("gate mutex poisoned")[call]
            .take()
            .expect("call not yet released");
        gate.send(reply).expect("caller still waiting");
    }

    pub(super) fn sent(&self) -> Vec<Value> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }
}

impl PredictionTransport for GatedTransport {
    async fn send(&self, record: &WireRecord) -> Result<String, TransportError> {
        let (gate, reply) = oneshot::channel();
        self.sent
            .lock()
            .expect("sent mutex poisoned")
            .push(serde_json::to_value(record).expect("record serializes"));
        self.gates
            .lock()
            .expect("gate mutex poisoned")
            .push(Some(gate));

        reply
            .await
            .unwrap_or_else(|_| Err(TransportError::Network("gate dropped".to_string())))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
