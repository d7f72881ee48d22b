use std::fmt;

use serde::Serialize;

use super::domain::{
    CreditHistory, Dependents, Education, FieldDomain, Gender, LoanField, PropertyArea, YesNo,
};

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationReason {
    Required,
    InvalidEnum { allowed: Vec<&'static str> },
    InvalidNumber { rule: NumberRule },
}

/// Numeric constraint a field failed to meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberRule {
    NonNegative,
    Positive,
    PositiveInteger,
}

impl NumberRule {
    const fn describe(self) -> &'static str {
        match self {
            Self::NonNegative => "a non-negative number",
            Self::Positive => "a number greater than zero",
            Self::PositiveInteger => "a whole number greater than zero",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::Required => f.write_str("is required"),
            ValidationReason::InvalidEnum { allowed } => {
                write!(f, "must be one of: {}", allowed.join(", "))
            }
            ValidationReason::InvalidNumber { rule } => write!(f, "must be {}", rule.describe()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: LoanField,
    pub reason: ValidationReason,
}

impl ValidationError {
    fn new(field: LoanField, reason: ValidationReason) -> Self {
        Self { field, reason }
    }
}

/// Coerced value of a single field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Gender(Gender),
    Married(YesNo),
    Dependents(Dependents),
    Education(Education),
    SelfEmployed(YesNo),
    ApplicantIncome(f64),
    CoapplicantIncome(f64),
    LoanAmount(f64),
    LoanAmountTerm(u32),
    CreditHistory(CreditHistory),
    PropertyArea(PropertyArea),
}

/// Validate one edit. Front-ends call this as the user types; the builder
/// calls the same rules for the whole form on submit.
pub fn validate_field(field: LoanField, raw: &str) -> Result<FieldValue, ValidationError> {
    let value = match field {
        LoanField::Gender => FieldValue::Gender(choice(field, raw)?),
        LoanField::Married => FieldValue::Married(choice(field, raw)?),
        LoanField::Dependents => FieldValue::Dependents(choice(field, raw)?),
        LoanField::Education => FieldValue::Education(choice(field, raw)?),
        LoanField::SelfEmployed => FieldValue::SelfEmployed(choice(field, raw)?),
        LoanField::ApplicantIncome => FieldValue::ApplicantIncome(amount(field, raw)?),
        LoanField::CoapplicantIncome => FieldValue::CoapplicantIncome(amount(field, raw)?),
        LoanField::LoanAmount => FieldValue::LoanAmount(loan_amount(raw)?),
        LoanField::LoanAmountTerm => FieldValue::LoanAmountTerm(term(field, raw)?),
        LoanField::CreditHistory => FieldValue::CreditHistory(choice(field, raw)?),
        LoanField::PropertyArea => FieldValue::PropertyArea(choice(field, raw)?),
    };
    Ok(value)
}

pub(super) fn choice<T: FieldDomain>(field: LoanField, raw: &str) -> Result<T, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::new(field, ValidationReason::Required));
    }

    T::from_label(raw).ok_or_else(|| {
        ValidationError::new(
            field,
            ValidationReason::InvalidEnum {
                allowed: T::labels(),
            },
        )
    })
}

pub(super) fn amount(field: LoanField, raw: &str) -> Result<f64, ValidationError> {
    parse_real(field, raw, NumberRule::NonNegative, |value| value >= 0.0)
}

pub(super) fn loan_amount(raw: &str) -> Result<f64, ValidationError> {
    parse_real(LoanField::LoanAmount, raw, NumberRule::Positive, |value| {
        value > 0.0
    })
}

pub(super) fn term(field: LoanField, raw: &str) -> Result<u32, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, ValidationReason::Required));
    }

    match trimmed.parse::<u32>() {
        Ok(months) if months > 0 => Ok(months),
        _ => Err(ValidationError::new(
            field,
            ValidationReason::InvalidNumber {
                rule: NumberRule::PositiveInteger,
            },
        )),
    }
}

fn parse_real(
    field: LoanField,
    raw: &str,
    rule: NumberRule,
    accept: impl Fn(f64) -> bool,
) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, ValidationReason::Required));
    }

    // `f64::from_str` accepts "inf" and "NaN", neither of which is an amount.
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && accept(value) => Ok(value),
        _ => Err(ValidationError::new(
            field,
            ValidationReason::InvalidNumber { rule },
        )),
    }
}
