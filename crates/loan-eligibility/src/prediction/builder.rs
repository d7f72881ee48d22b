use std::fmt;

use serde::Serialize;

use super::domain::{
    CreditHistory, Dependents, Education, Gender, LoanApplication, LoanField, PropertyArea,
    RawFieldSet, YesNo,
};
use super::validator::{self, ValidationError, ValidationReason};

/// Every field that failed validation for one submission, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub errors: Vec<ValidationError>,
}

impl ValidationFailure {
    pub fn fields(&self) -> Vec<LoanField> {
        self.errors.iter().map(|error| error.field).collect()
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        match self.errors.len() {
            1 => write!(f, "1 field failed validation: {details}"),
            count => write!(f, "{count} fields failed validation: {details}"),
        }
    }
}

impl std::error::Error for ValidationFailure {}

/// Collects per-field results so a single pass reports every failure.
struct FieldCollector<'a> {
    fields: &'a RawFieldSet,
    errors: Vec<ValidationError>,
}

impl<'a> FieldCollector<'a> {
    fn take<T>(
        &mut self,
        field: LoanField,
        rule: impl FnOnce(&str) -> Result<T, ValidationError>,
    ) -> Option<T> {
        let outcome = match self.fields.get(field) {
            Some(raw) => rule(raw),
            None => Err(ValidationError {
                field,
                reason: ValidationReason::Required,
            }),
        };

        match outcome {
            Ok(value) => Some(value),
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }
}

/// Validate a complete form and assemble the immutable application record.
pub fn build_application(fields: &RawFieldSet) -> Result<LoanApplication, ValidationFailure> {
    let mut collector = FieldCollector {
        fields,
        errors: Vec::new(),
    };

    let gender = collector.take(LoanField::Gender, |raw| {
        validator::choice::<Gender>(LoanField::Gender, raw)
    });
    let married = collector.take(LoanField::Married, |raw| {
        validator::choice::<YesNo>(LoanField::Married, raw)
    });
    let dependents = collector.take(LoanField::Dependents, |raw| {
        validator::choice::<Dependents>(LoanField::Dependents, raw)
    });
    let education = collector.take(LoanField::Education, |raw| {
        validator::choice::<Education>(LoanField::Education, raw)
    });
    let self_employed = collector.take(LoanField::SelfEmployed, |raw| {
        validator::choice::<YesNo>(LoanField::SelfEmployed, raw)
    });
    let applicant_income = collector.take(LoanField::ApplicantIncome, |raw| {
        validator::amount(LoanField::ApplicantIncome, raw)
    });
    let coapplicant_income = collector.take(LoanField::CoapplicantIncome, |raw| {
        validator::amount(LoanField::CoapplicantIncome, raw)
    });
    let loan_amount = collector.take(LoanField::LoanAmount, validator::loan_amount);
    let loan_amount_term = collector.take(LoanField::LoanAmountTerm, |raw| {
        validator::term(LoanField::LoanAmountTerm, raw)
    });
    let credit_history = collector.take(LoanField::CreditHistory, |raw| {
        validator::choice::<CreditHistory>(LoanField::CreditHistory, raw)
    });
    let property_area = collector.take(LoanField::PropertyArea, |raw| {
        validator::choice::<PropertyArea>(LoanField::PropertyArea, raw)
    });

    match (
        gender,
        married,
        dependents,
        education,
        self_employed,
        applicant_income,
        coapplicant_income,
        loan_amount,
        loan_amount_term,
        credit_history,
        property_area,
    ) {
        (
            Some(gender),
            Some(married),
            Some(dependents),
            Some(education),
            Some(self_employed),
            Some(applicant_income),
            Some(coapplicant_income),
            Some(loan_amount),
            Some(loan_amount_term),
            Some(credit_history),
            Some(property_area),
        ) if collector.errors.is_empty() => Ok(LoanApplication {
            gender,
            married,
            dependents,
            education,
            self_employed,
            applicant_income,
            coapplicant_income,
            loan_amount,
            loan_amount_term,
            credit_history,
            property_area,
        }),
        _ => Err(ValidationFailure {
            errors: collector.errors,
        }),
    }
}
