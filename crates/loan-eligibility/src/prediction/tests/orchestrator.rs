use super::common::*;
use crate::prediction::domain::LoanField;
use crate::prediction::interpreter::Verdict;
use crate::prediction::orchestrator::{
    Dispatch, ErrorKind, NothingToResubmit, RequestState, SubmitOutcome,
};
use crate::prediction::transport::TransportError;
use crate::prediction::validator::ValidationReason;
use serde_json::json;
use std::sync::Arc;

fn verdict_of(outcome: &SubmitOutcome) -> Option<Verdict> {
    match outcome {
        SubmitOutcome::Settled(RequestState::Succeeded { outcome }) => Some(outcome.verdict),
        _ => None,
    }
}

fn failure_kind(state: &RequestState) -> Option<ErrorKind> {
    match state {
        RequestState::Failed { failure } => Some(failure.kind),
        _ => None,
    }
}

#[test]
fn starts_idle() {
    let orchestrator = orchestrator(MemoryTransport::default());
    assert_eq!(orchestrator.state(), RequestState::Idle);
    assert!(orchestrator.last_application().is_none());
}

#[tokio::test]
async fn invalid_submission_never_reaches_transport() {
    let transport = MemoryTransport::replying(vec![Ok(APPROVED_BODY.to_string())]);
    let orchestrator = orchestrator(transport.clone());

    let outcome = orchestrator.submit(invalid_fields()).await;

    let SubmitOutcome::Settled(RequestState::Failed { failure }) = outcome else {
        panic!("expected validation failure");
    };
    assert_eq!(failure.kind, ErrorKind::Validation);
    let fields: Vec<LoanField> = failure.errors.iter().map(|error| error.field).collect();
    assert_eq!(
        fields,
        vec![
            LoanField::Gender,
            LoanField::ApplicantIncome,
            LoanField::LoanAmountTerm,
            LoanField::PropertyArea,
        ]
    );
    assert_eq!(failure.errors[2].reason, ValidationReason::Required);
    assert!(failure.message.contains("gender"));
    assert!(failure.message.contains("propertyArea"));
    assert!(transport.sent().is_empty());
    assert_eq!(failure_kind(&orchestrator.state()), Some(ErrorKind::Validation));
    assert!(orchestrator.last_application().is_none());
}

#[tokio::test]
async fn valid_submission_sends_exactly_one_wire_record() {
    let transport = MemoryTransport::replying(vec![Ok(APPROVED_BODY.to_string())]);
    let orchestrator = orchestrator(transport.clone());

    let outcome = orchestrator.submit(valid_fields()).await;

    assert_eq!(verdict_of(&outcome), Some(Verdict::Approved));
    assert_eq!(
        transport.sent(),
        vec![json!({
            "gender": "Male",
            "married": "Yes",
            "dependents": "1",
            "education": "Graduate",
            "selfEmployed": "No",
            "applicantIncome": 4583.0,
            "coapplicantIncome": 1508.0,
            "loanAmount": 128.0,
            "loanAmountTerm": 360,
            "creditHistory": "Yes",
            "propertyArea": "Rural",
        })]
    );
}

#[tokio::test]
async fn zero_prediction_is_denied() {
    let orchestrator = orchestrator(MemoryTransport::replying(vec![Ok(DENIED_BODY.to_string())]));

    let outcome = orchestrator.submit(valid_fields()).await;

    assert_eq!(verdict_of(&outcome), Some(Verdict::Denied));
    let RequestState::Succeeded { outcome } = orchestrator.state() else {
        panic!("expected succeeded state");
    };
    assert!(outcome.guidance.intro.contains("improve your chances"));
}

#[tokio::test]
async fn missing_prediction_is_a_parse_failure() {
    let orchestrator = orchestrator(MemoryTransport::replying(vec![Ok(
        r#"{"label": "Y"}"#.to_string()
    )]));

    orchestrator.submit(valid_fields()).await;

    let RequestState::Failed { failure } = orchestrator.state() else {
        panic!("expected failed state");
    };
    assert_eq!(failure.kind, ErrorKind::Parse);
    assert!(failure.message.contains("missing the `prediction` field"));
}

#[tokio::test]
async fn malformed_body_is_a_parse_failure() {
    let orchestrator = orchestrator(MemoryTransport::replying(vec![Err(
        TransportError::MalformedBody("invalid utf-8".to_string()),
    )]));

    orchestrator.submit(valid_fields()).await;

    assert_eq!(failure_kind(&orchestrator.state()), Some(ErrorKind::Parse));
}

#[tokio::test]
async fn server_errors_surface_generic_message_and_keep_cause() {
    let orchestrator = orchestrator(MemoryTransport::replying(vec![Err(
        TransportError::Server {
            status: 500,
            body: "Traceback (most recent call last): KeyError 'feature1'".to_string(),
        },
    )]));

    orchestrator.submit(valid_fields()).await;

    let RequestState::Failed { failure } = orchestrator.state() else {
        panic!("expected failed state");
    };
    assert_eq!(failure.kind, ErrorKind::Server);
    assert!(!failure.message.contains("Traceback"));
    let cause = failure.cause.expect("cause retained");
    assert!(cause.contains("500"));
    assert!(cause.contains("KeyError"));
}

#[tokio::test]
async fn network_failure_keeps_application_for_resubmission() {
    let transport = MemoryTransport::replying(vec![
        Err(TransportError::Network("connection refused".to_string())),
        Ok(APPROVED_BODY.to_string()),
    ]);
    let orchestrator = orchestrator(transport.clone());

    orchestrator.submit(valid_fields()).await;

    let RequestState::Failed { failure } = orchestrator.state() else {
        panic!("expected failed state");
    };
    assert_eq!(failure.kind, ErrorKind::Network);
    assert!(!failure.message.contains("connection refused"));
    assert!(orchestrator.last_application().is_some());

    let outcome = orchestrator.resubmit().await.expect("application retained");

    assert_eq!(verdict_of(&outcome), Some(Verdict::Approved));
    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
}

#[tokio::test]
async fn resubmit_requires_a_validated_application() {
    let orchestrator = orchestrator(MemoryTransport::default());

    assert_eq!(orchestrator.resubmit().await, Err(NothingToResubmit));

    orchestrator.submit(invalid_fields()).await;
    assert_eq!(orchestrator.resubmit().await, Err(NothingToResubmit));
}

#[tokio::test]
async fn reset_clears_outcome_and_error() {
    let orchestrator = orchestrator(MemoryTransport::replying(vec![
        Ok(APPROVED_BODY.to_string()),
        Err(TransportError::Network("timed out".to_string())),
    ]));

    orchestrator.submit(valid_fields()).await;
    assert!(matches!(orchestrator.state(), RequestState::Succeeded { .. }));
    orchestrator.reset();
    assert_eq!(orchestrator.state(), RequestState::Idle);

    orchestrator.submit(valid_fields()).await;
    assert_eq!(failure_kind(&orchestrator.state()), Some(ErrorKind::Network));
    orchestrator.reset();
    assert_eq!(orchestrator.state(), RequestState::Idle);
}

#[tokio::test]
async fn failed_state_accepts_a_new_submit() {
    let orchestrator = orchestrator(MemoryTransport::replying(vec![
        Ok("not json".to_string()),
        Ok(DENIED_BODY.to_string()),
    ]));

    orchestrator.submit(valid_fields()).await;
    assert_eq!(failure_kind(&orchestrator.state()), Some(ErrorKind::Parse));

    let outcome = orchestrator.submit(valid_fields()).await;
    assert_eq!(verdict_of(&outcome), Some(Verdict::Denied));
}

#[test]
fn begin_allocates_increasing_request_ids() {
    let orchestrator = orchestrator(MemoryTransport::default());

    let Dispatch::Send(first) = orchestrator.begin(valid_fields()) else {
        panic!("valid form dispatches");
    };
    let Dispatch::Send(second) = orchestrator.begin(valid_fields()) else {
        panic!("valid form dispatches");
    };

    assert!(second.request_id > first.request_id);
    assert_eq!(
        orchestrator.state(),
        RequestState::Submitting {
            request_id: second.request_id
        }
    );
}

#[test]
fn stale_completion_is_discarded() {
    let orchestrator = orchestrator(MemoryTransport::default());
    let Dispatch::Send(first) = orchestrator.begin(valid_fields()) else {
        panic!("valid form dispatches");
    };
    let Dispatch::Send(second) = orchestrator.begin(alternate_fields()) else {
        panic!("valid form dispatches");
    };

    let stale = orchestrator.complete(first.request_id, Ok(DENIED_BODY.to_string()));

    assert_eq!(
        stale,
        SubmitOutcome::Superseded {
            request_id: first.request_id
        }
    );
    assert!(orchestrator.state().is_in_flight());

    let fresh = orchestrator.complete(second.request_id, Ok(APPROVED_BODY.to_string()));
    assert_eq!(verdict_of(&fresh), Some(Verdict::Approved));

    let late = orchestrator.complete(second.request_id, Ok(DENIED_BODY.to_string()));
    assert!(matches!(late, SubmitOutcome::Superseded { .. }));
    assert!(matches!(orchestrator.state(), RequestState::Succeeded { .. }));
}

#[test]
fn reset_while_in_flight_discards_the_response() {
    let orchestrator = orchestrator(MemoryTransport::default());
    let Dispatch::Send(pending) = orchestrator.begin(valid_fields()) else {
        panic!("valid form dispatches");
    };

    orchestrator.reset();
    let outcome = orchestrator.complete(pending.request_id, Ok(APPROVED_BODY.to_string()));

    assert!(matches!(outcome, SubmitOutcome::Superseded { .. }));
    assert_eq!(orchestrator.state(), RequestState::Idle);
}

#[test]
fn invalid_submit_supersedes_in_flight_request() {
    let orchestrator = orchestrator(MemoryTransport::default());
    let Dispatch::Send(pending) = orchestrator.begin(valid_fields()) else {
        panic!("valid form dispatches");
    };

    let Dispatch::Settled(state) = orchestrator.begin(invalid_fields()) else {
        panic!("invalid form settles immediately");
    };
    assert_eq!(failure_kind(&state), Some(ErrorKind::Validation));

    let outcome = orchestrator.complete(pending.request_id, Ok(APPROVED_BODY.to_string()));
    assert!(matches!(outcome, SubmitOutcome::Superseded { .. }));
    assert_eq!(failure_kind(&orchestrator.state()), Some(ErrorKind::Validation));
}

#[tokio::test]
async fn second_submit_wins_when_its_response_arrives_first() {
    let transport = GatedTransport::default();
    let orchestrator = Arc::new(orchestrator(transport.clone()));

    let first = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.submit(valid_fields()).await }
    });
    transport.wait_for_calls(1).await;
    let second = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.submit(alternate_fields()).await }
    });
    transport.wait_for_calls(2).await;

    transport.release(1, Ok(APPROVED_BODY.to_string()));
    let second = second.await.expect("second task completes");
    assert_eq!(verdict_of(&second), Some(Verdict::Approved));

    transport.release(0, Ok(DENIED_BODY.to_string()));
    let first = first.await.expect("first task completes");
    assert!(matches!(first, SubmitOutcome::Superseded { .. }));

    let RequestState::Succeeded { outcome } = orchestrator.state() else {
        panic!("expected succeeded state");
    };
    assert_eq!(outcome.verdict, Verdict::Approved);
    assert_eq!(transport.sent()[1]["loanAmount"], json!(66.0));
}

#[tokio::test]
async fn second_submit_wins_when_its_response_arrives_last() {
    let transport = GatedTransport::default();
    let orchestrator = Arc::new(orchestrator(transport.clone()));

    let first = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.submit(valid_fields()).await }
    });
    transport.wait_for_calls(1).await;
    let second = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.submit(alternate_fields()).await }
    });
    transport.wait_for_calls(2).await;

    transport.release(0, Ok(APPROVED_BODY.to_string()));
    let first = first.await.expect("first task completes");
    assert!(matches!(first, SubmitOutcome::Superseded { .. }));
    assert!(orchestrator.state().is_in_flight());

    transport.release(1, Err(TransportError::Network("connection reset".to_string())));
    let second = second.await.expect("second task completes");
    let SubmitOutcome::Settled(state) = second else {
        panic!("second submit settles");
    };
    assert_eq!(failure_kind(&state), Some(ErrorKind::Network));
    assert_eq!(failure_kind(&orchestrator.state()), Some(ErrorKind::Network));
}
