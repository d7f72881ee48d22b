use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::builder::{build_application, ValidationFailure};
use super::domain::{LoanApplication, RawFieldSet};
use super::interpreter::{interpret, PredictionOutcome};
use super::transport::{PredictionTransport, TransportError};
use super::validator::ValidationError;
use super::wire::{CreditHistoryEncoding, WireRecord};

const NETWORK_MESSAGE: &str =
    "We could not reach the scoring service. Check your connection and try again.";
const SERVER_MESSAGE: &str =
    "The scoring service could not process the application right now. Please try again later.";

/// Monotonically increasing identity of one dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{:06}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// One or more fields failed local checks; nothing was sent.
    Validation,
    /// No response arrived.
    Network,
    /// A response arrived with a non-success status.
    Server,
    /// A success response whose body did not match the expected schema.
    Parse,
}

/// Classified failure as surfaced to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionFailure {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    /// Diagnostic detail for logs; never shown to the user.
    #[serde(skip)]
    pub cause: Option<String>,
}

impl PredictionFailure {
    fn validation(failure: ValidationFailure) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: failure.to_string(),
            errors: failure.errors,
            cause: None,
        }
    }

    fn from_transport(error: TransportError) -> Self {
        let (kind, message) = match &error {
            TransportError::Network(_) => (ErrorKind::Network, NETWORK_MESSAGE.to_string()),
            TransportError::Server { .. } => (ErrorKind::Server, SERVER_MESSAGE.to_string()),
            TransportError::MalformedBody(_) => (ErrorKind::Parse, error.to_string()),
        };
        let cause = match &error {
            TransportError::Server { status, body } if !body.is_empty() => {
                format!("status {status}: {body}")
            }
            _ => error.to_string(),
        };

        Self {
            kind,
            message,
            errors: Vec::new(),
            cause: Some(cause),
        }
    }

    fn parse(message: String) -> Self {
        Self {
            kind: ErrorKind::Parse,
            message: format!("Unexpected response from the scoring service: {message}"),
            errors: Vec::new(),
            cause: Some(message),
        }
    }
}

/// Lifecycle of the prediction form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RequestState {
    Idle,
    Validating,
    Submitting { request_id: RequestId },
    Succeeded { outcome: PredictionOutcome },
    Failed { failure: PredictionFailure },
}

impl RequestState {
    pub const fn label(&self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Validating => "validating",
            RequestState::Submitting { .. } => "submitting",
            RequestState::Succeeded { .. } => "succeeded",
            RequestState::Failed { .. } => "failed",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::Submitting { .. })
    }
}

/// What `begin` decided: either a request to put on the wire, or a state
/// that settled without any network traffic.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Send(PendingPrediction),
    Settled(RequestState),
}

/// A validated record waiting for its transport exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPrediction {
    pub request_id: RequestId,
    pub record: WireRecord,
}

/// Result of a submit or completion from the caller's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The call settled the orchestrator into this state.
    Settled(RequestState),
    /// A newer submit (or a reset) took over; this result was discarded.
    Superseded { request_id: RequestId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no validated application is available to resubmit")]
pub struct NothingToResubmit;

struct Session {
    state: RequestState,
    active: Option<RequestId>,
    issued: u64,
    last_application: Option<LoanApplication>,
}

/// Owns the request state and drives the submit lifecycle.
///
/// The state lock is only held for synchronous transitions, never across
/// the transport await, so a new submit proceeds while an older request is
/// still outstanding. Completions are applied only when their request id is
/// still the active one (last submit wins).
pub struct PredictionOrchestrator<T> {
    transport: T,
    encoding: CreditHistoryEncoding,
    session: Mutex<Session>,
}

impl<T> PredictionOrchestrator<T>
where
    T: PredictionTransport,
{
    pub fn new(transport: T, encoding: CreditHistoryEncoding) -> Self {
        Self {
            transport,
            encoding,
            session: Mutex::new(Session {
                state: RequestState::Idle,
                active: None,
                issued: 0,
                last_application: None,
            }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> RequestState {
        self.lock().state.clone()
    }

    /// The most recent application that passed validation.
    pub fn last_application(&self) -> Option<LoanApplication> {
        self.lock().last_application.clone()
    }

    /// Validate, dispatch, and settle one submission.
    pub async fn submit(&self, fields: RawFieldSet) -> SubmitOutcome {
        match self.begin(fields) {
            Dispatch::Send(pending) => self.exchange(pending).await,
            Dispatch::Settled(state) => SubmitOutcome::Settled(state),
        }
    }

    /// Send the last validated application again without re-entering fields.
    pub async fn resubmit(&self) -> Result<SubmitOutcome, NothingToResubmit> {
        let pending = self.begin_resubmit()?;
        Ok(self.exchange(pending).await)
    }

    /// Return to `Idle`, dropping any outcome, error, or in-flight request.
    pub fn reset(&self) {
        let mut session = self.lock();
        if let Some(request_id) = session.active.take() {
            debug!(%request_id, "reset supersedes in-flight prediction request");
        }
        session.state = RequestState::Idle;
    }

    /// Synchronous half of `submit`: supersede, validate, and allocate a
    /// request id.
    pub fn begin(&self, fields: RawFieldSet) -> Dispatch {
        let mut session = self.lock();
        if let Some(request_id) = session.active.take() {
            debug!(%request_id, "new submission supersedes in-flight prediction request");
        }
        session.state = RequestState::Validating;

        match build_application(&fields) {
            Ok(application) => {
                let pending = self.dispatch(&mut session, &application);
                session.last_application = Some(application);
                Dispatch::Send(pending)
            }
            Err(failure) => {
                info!(
                    invalid_fields = failure.errors.len(),
                    "prediction request rejected by validation"
                );
                session.state = RequestState::Failed {
                    failure: PredictionFailure::validation(failure),
                };
                Dispatch::Settled(session.state.clone())
            }
        }
    }

    pub fn begin_resubmit(&self) -> Result<PendingPrediction, NothingToResubmit> {
        let mut session = self.lock();
        let application = session.last_application.clone().ok_or(NothingToResubmit)?;
        if let Some(request_id) = session.active.take() {
            debug!(%request_id, "resubmission supersedes in-flight prediction request");
        }
        Ok(self.dispatch(&mut session, &application))
    }

    /// Apply a transport result. Results for anything other than the active
    /// request are discarded.
    pub fn complete(
        &self,
        request_id: RequestId,
        result: Result<String, TransportError>,
    ) -> SubmitOutcome {
        let mut session = self.lock();
        if session.active != Some(request_id) {
            debug!(%request_id, "discarding superseded prediction response");
            return SubmitOutcome::Superseded { request_id };
        }
        session.active = None;

        let state = match result.map_err(PredictionFailure::from_transport) {
            Ok(body) => match interpret(&body) {
                Ok(outcome) => {
                    info!(%request_id, verdict = outcome.verdict.label(), "prediction received");
                    RequestState::Succeeded { outcome }
                }
                Err(err) => {
                    let failure = PredictionFailure::parse(err.to_string());
                    warn!(%request_id, cause = %err, "scoring response did not match schema");
                    RequestState::Failed { failure }
                }
            },
            Err(failure) => {
                warn!(
                    %request_id,
                    kind = ?failure.kind,
                    cause = failure.cause.as_deref().unwrap_or_default(),
                    "prediction request failed"
                );
                RequestState::Failed { failure }
            }
        };

        session.state = state.clone();
        SubmitOutcome::Settled(state)
    }

    async fn exchange(&self, pending: PendingPrediction) -> SubmitOutcome {
        let PendingPrediction { request_id, record } = pending;
        let result = self.transport.send(&record).await;
        self.complete(request_id, result)
    }

    fn dispatch(&self, session: &mut Session, application: &LoanApplication) -> PendingPrediction {
        session.issued += 1;
        let request_id = RequestId(session.issued);
        session.active = Some(request_id);
        session.state = RequestState::Submitting { request_id };
        info!(%request_id, "prediction request dispatched");

        PendingPrediction {
            request_id,
            record: WireRecord::encode(application, self.encoding),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        self.session.lock().expect("prediction session mutex poisoned")
    }
}
