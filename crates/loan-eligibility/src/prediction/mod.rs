//! Loan eligibility prediction: per-field validation, application assembly,
//! the request orchestrator, and interpretation of scoring responses.
//!
//! Front-ends (the CLI prompt loop, the HTTP adapter) hold a `RawFieldSet`
//! and hand it to [`PredictionOrchestrator::submit`]; everything below that
//! call is free of UI state.

pub mod builder;
pub mod domain;
pub mod interpreter;
pub mod orchestrator;
pub mod router;
pub mod transport;
pub mod validator;
pub mod wire;

#[cfg(test)]
mod tests;

pub use builder::{build_application, ValidationFailure};
pub use domain::{
    CreditHistory, Dependents, Education, FieldDescriptor, FieldDomain, FieldKind, Gender,
    LoanApplication, LoanField, PropertyArea, RawFieldSet, UnknownField, YesNo,
};
pub use interpreter::{interpret, Guidance, InterpretError, PredictionOutcome, Verdict};
pub use orchestrator::{
    Dispatch, ErrorKind, NothingToResubmit, PendingPrediction, PredictionFailure,
    PredictionOrchestrator, RequestId, RequestState, SubmitOutcome,
};
pub use router::prediction_router;
pub use transport::{HttpPredictionTransport, PredictionTransport, TransportError};
pub use validator::{validate_field, FieldValue, NumberRule, ValidationError, ValidationReason};
pub use wire::{CreditHistoryEncoding, UnknownEncoding, WireRecord};
