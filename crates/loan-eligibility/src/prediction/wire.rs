use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::domain::{
    CreditHistory, Dependents, Education, Gender, LoanApplication, PropertyArea, YesNo,
};

/// How `creditHistory` is written to the scoring endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreditHistoryEncoding {
    /// `"Yes"` / `"No"`.
    #[default]
    Label,
    /// `1` / `0`.
    Flag,
}

impl fmt::Display for CreditHistoryEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label => f.write_str("label"),
            Self::Flag => f.write_str("flag"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown credit history encoding `{0}` (expected `label` or `flag`)")]
pub struct UnknownEncoding(pub String);

impl FromStr for CreditHistoryEncoding {
    type Err = UnknownEncoding;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "label" => Ok(Self::Label),
            "flag" => Ok(Self::Flag),
            _ => Err(UnknownEncoding(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum CreditHistoryValue {
    Label(CreditHistory),
    Flag(u8),
}

/// JSON body posted to the scoring endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecord {
    gender: Gender,
    married: YesNo,
    dependents: Dependents,
    education: Education,
    self_employed: YesNo,
    applicant_income: f64,
    coapplicant_income: f64,
    loan_amount: f64,
    loan_amount_term: u32,
    credit_history: CreditHistoryValue,
    property_area: PropertyArea,
}

impl WireRecord {
    pub fn encode(application: &LoanApplication, encoding: CreditHistoryEncoding) -> Self {
        let credit_history = application.credit_history();
        let credit_history = match encoding {
            CreditHistoryEncoding::Label => CreditHistoryValue::Label(credit_history),
            CreditHistoryEncoding::Flag => CreditHistoryValue::Flag(credit_history.flag()),
        };

        Self {
            gender: application.gender(),
            married: application.married(),
            dependents: application.dependents(),
            education: application.education(),
            self_employed: application.self_employed(),
            applicant_income: application.applicant_income(),
            coapplicant_income: application.coapplicant_income(),
            loan_amount: application.loan_amount(),
            loan_amount_term: application.loan_amount_term(),
            credit_history,
            property_area: application.property_area(),
        }
    }
}
