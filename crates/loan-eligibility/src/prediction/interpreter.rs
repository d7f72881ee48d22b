use serde::Serialize;
use serde_json::Value;

/// Binary decision returned by the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Approved,
    Denied,
}

impl Verdict {
    pub const fn label(self) -> &'static str {
        match self {
            Verdict::Approved => "Approved",
            Verdict::Denied => "Denied",
        }
    }

    pub const fn guidance(self) -> &'static Guidance {
        match self {
            Verdict::Approved => &APPROVED_GUIDANCE,
            Verdict::Denied => &DENIED_GUIDANCE,
        }
    }
}

/// Fixed copy shown alongside a verdict.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Guidance {
    pub headline: &'static str,
    pub intro: &'static str,
    pub steps: [&'static str; 3],
    pub closing: &'static str,
}

pub static APPROVED_GUIDANCE: Guidance = Guidance {
    headline: "Congratulations on the predicted approval! 🎉",
    intro: "Here are your next steps:",
    steps: [
        "Start planning your homeownership journey or business venture.",
        "Consult with a financial advisor to manage your finances effectively.",
        "Ensure that all required documentation is in order for the next steps.",
    ],
    closing: "Good luck, and enjoy this exciting journey ahead!",
};

pub static DENIED_GUIDANCE: Guidance = Guidance {
    headline: "Don't be discouraged by this decision. You can still improve! 💪",
    intro: "Consider these tips to improve your chances next time:",
    steps: [
        "Work on building your credit score by paying off debts and keeping balances low.",
        "Consider ways to increase your income, such as a side job or further education.",
        "Create a detailed budget to manage your finances more effectively.",
    ],
    closing: "Stay positive and keep working towards your goals!",
};

/// Verdict plus the guidance block it selects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutcome {
    pub verdict: Verdict,
    pub guidance: &'static Guidance,
}

impl PredictionOutcome {
    pub fn from_verdict(verdict: Verdict) -> Self {
        Self {
            verdict,
            guidance: verdict.guidance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterpretError {
    #[error("response body is not valid JSON ({0})")]
    NotJson(String),
    #[error("response body is not a JSON object")]
    NotAnObject,
    #[error("response is missing the `prediction` field")]
    MissingPrediction,
    #[error("unrecognized prediction value {0}")]
    UnrecognizedValue(String),
}

/// Map a scoring response body onto a verdict.
///
/// Only `1`/`0` (numeric) and `true`/`false` are recognized. Anything else,
/// including probabilities and label strings, is rejected rather than read
/// as a denial.
pub fn interpret(body: &str) -> Result<PredictionOutcome, InterpretError> {
    let parsed: Value =
        serde_json::from_str(body).map_err(|err| InterpretError::NotJson(err.to_string()))?;
    let object = parsed.as_object().ok_or(InterpretError::NotAnObject)?;
    let indicator = object
        .get("prediction")
        .ok_or(InterpretError::MissingPrediction)?;

    let verdict = match indicator {
        Value::Bool(true) => Verdict::Approved,
        Value::Bool(false) => Verdict::Denied,
        Value::Number(number) => match number.as_f64() {
            Some(value) if value == 1.0 => Verdict::Approved,
            Some(value) if value == 0.0 => Verdict::Denied,
            _ => return Err(InterpretError::UnrecognizedValue(number.to_string())),
        },
        other => return Err(InterpretError::UnrecognizedValue(other.to_string())),
    };

    Ok(PredictionOutcome::from_verdict(verdict))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_is_approved_with_next_steps() {
        let outcome = interpret(r#"{ "prediction": 1 }"#).expect("recognized");
        assert_eq!(outcome.verdict, Verdict::Approved);
        assert_eq!(outcome.guidance, &APPROVED_GUIDANCE);
        assert_eq!(outcome.guidance.intro, "Here are your next steps:");
    }

    #[test]
    fn zero_is_denied_with_improvement_tips() {
        let outcome = interpret(r#"{ "prediction": 0 }"#).expect("recognized");
        assert_eq!(outcome.verdict, Verdict::Denied);
        assert_eq!(outcome.guidance, &DENIED_GUIDANCE);
    }

    #[test]
    fn booleans_and_integral_floats_are_recognized() {
        assert_eq!(
            interpret(r#"{"prediction": true}"#).map(|o| o.verdict),
            Ok(Verdict::Approved)
        );
        assert_eq!(
            interpret(r#"{"prediction": false}"#).map(|o| o.verdict),
            Ok(Verdict::Denied)
        );
        assert_eq!(
            interpret(r#"{"prediction": 1.0}"#).map(|o| o.verdict),
            Ok(Verdict::Approved)
        );
    }

    #[test]
    fn extra_fields_are_ignored() {
        let outcome =
            interpret(r#"{"prediction": 0, "model": "v3"}"#).expect("recognized");
        assert_eq!(outcome.verdict, Verdict::Denied);
    }

    #[test]
    fn missing_prediction_is_a_parse_failure() {
        assert_eq!(
            interpret(r#"{"error": "model offline"}"#),
            Err(InterpretError::MissingPrediction)
        );
    }

    #[test]
    fn unrecognized_values_are_not_treated_as_denied() {
        for body in [
            r#"{"prediction": 0.73}"#,
            r#"{"prediction": 2}"#,
            r#"{"prediction": "Y"}"#,
            r#"{"prediction": null}"#,
        ] {
            assert!(
                matches!(interpret(body), Err(InterpretError::UnrecognizedValue(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert_eq!(interpret("[1]"), Err(InterpretError::NotAnObject));
        assert!(matches!(
            interpret("<html>502</html>"),
            Err(InterpretError::NotJson(_))
        ));
    }
}
