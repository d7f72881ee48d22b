use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of string values accepted for a categorical loan field.
pub trait FieldDomain: Copy + Sized + 'static {
    const VALUES: &'static [Self];

    fn label(self) -> &'static str;

    /// Exact, case-sensitive lookup of a domain value.
    fn from_label(raw: &str) -> Option<Self> {
        Self::VALUES.iter().copied().find(|value| value.label() == raw)
    }

    fn labels() -> Vec<&'static str> {
        Self::VALUES.iter().map(|value| value.label()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl FieldDomain for Gender {
    const VALUES: &'static [Self] = &[Self::Male, Self::Female, Self::Other];

    fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

/// Shared yes/no answer used by the marital and self-employment questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl FieldDomain for YesNo {
    const VALUES: &'static [Self] = &[Self::Yes, Self::No];

    fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dependents {
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3+")]
    ThreeOrMore,
}

impl FieldDomain for Dependents {
    const VALUES: &'static [Self] = &[Self::Zero, Self::One, Self::Two, Self::ThreeOrMore];

    fn label(self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::Two => "2",
            Self::ThreeOrMore => "3+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Education {
    Graduate,
    #[serde(rename = "Not Graduate")]
    NotGraduate,
}

impl FieldDomain for Education {
    const VALUES: &'static [Self] = &[Self::Graduate, Self::NotGraduate];

    fn label(self) -> &'static str {
        match self {
            Self::Graduate => "Graduate",
            Self::NotGraduate => "Not Graduate",
        }
    }
}

/// Whether the applicant has a credit history meeting guidelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreditHistory {
    Yes,
    No,
}

impl CreditHistory {
    /// Numeric flag understood by scoring models trained on the 1/0 encoding.
    pub const fn flag(self) -> u8 {
        match self {
            Self::Yes => 1,
            Self::No => 0,
        }
    }
}

impl FieldDomain for CreditHistory {
    const VALUES: &'static [Self] = &[Self::Yes, Self::No];

    fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyArea {
    Urban,
    Semiurban,
    Rural,
}

impl FieldDomain for PropertyArea {
    const VALUES: &'static [Self] = &[Self::Urban, Self::Semiurban, Self::Rural];

    fn label(self) -> &'static str {
        match self {
            Self::Urban => "Urban",
            Self::Semiurban => "Semiurban",
            Self::Rural => "Rural",
        }
    }
}

/// Every input collected on the loan form, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoanField {
    Gender,
    Married,
    Dependents,
    Education,
    SelfEmployed,
    ApplicantIncome,
    CoapplicantIncome,
    LoanAmount,
    LoanAmountTerm,
    CreditHistory,
    PropertyArea,
}

/// How a field's raw input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Choice,
    Amount,
    Term,
}

impl LoanField {
    pub const fn ordered() -> [Self; 11] {
        [
            Self::Gender,
            Self::Married,
            Self::Dependents,
            Self::Education,
            Self::SelfEmployed,
            Self::ApplicantIncome,
            Self::CoapplicantIncome,
            Self::LoanAmount,
            Self::LoanAmountTerm,
            Self::CreditHistory,
            Self::PropertyArea,
        ]
    }

    /// Key used in raw field sets and on the wire.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::Married => "married",
            Self::Dependents => "dependents",
            Self::Education => "education",
            Self::SelfEmployed => "selfEmployed",
            Self::ApplicantIncome => "applicantIncome",
            Self::CoapplicantIncome => "coapplicantIncome",
            Self::LoanAmount => "loanAmount",
            Self::LoanAmountTerm => "loanAmountTerm",
            Self::CreditHistory => "creditHistory",
            Self::PropertyArea => "propertyArea",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Gender => "Gender",
            Self::Married => "Married",
            Self::Dependents => "Dependents",
            Self::Education => "Education",
            Self::SelfEmployed => "Self employed",
            Self::ApplicantIncome => "Applicant income (monthly)",
            Self::CoapplicantIncome => "Co-applicant income (monthly)",
            Self::LoanAmount => "Loan amount (thousands)",
            Self::LoanAmountTerm => "Loan term (months)",
            Self::CreditHistory => "Credit history meets guidelines",
            Self::PropertyArea => "Property area",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Self::ApplicantIncome | Self::CoapplicantIncome | Self::LoanAmount => {
                FieldKind::Amount
            }
            Self::LoanAmountTerm => FieldKind::Term,
            _ => FieldKind::Choice,
        }
    }

    /// Accepted values for choice fields; empty for numeric inputs.
    pub fn options(self) -> Vec<&'static str> {
        match self {
            Self::Gender => Gender::labels(),
            Self::Married | Self::SelfEmployed => YesNo::labels(),
            Self::Dependents => Dependents::labels(),
            Self::Education => Education::labels(),
            Self::CreditHistory => CreditHistory::labels(),
            Self::PropertyArea => PropertyArea::labels(),
            Self::ApplicantIncome
            | Self::CoapplicantIncome
            | Self::LoanAmount
            | Self::LoanAmountTerm => Vec::new(),
        }
    }

    pub fn descriptor(self) -> FieldDescriptor {
        FieldDescriptor {
            name: self.name(),
            label: self.label(),
            kind: self.kind(),
            options: self.options(),
        }
    }
}

impl fmt::Display for LoanField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown loan field `{0}`")]
pub struct UnknownField(pub String);

impl FromStr for LoanField {
    type Err = UnknownField;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|field| field.name() == raw)
            .ok_or_else(|| UnknownField(raw.to_string()))
    }
}

/// Form metadata so front-ends can render inputs without duplicating domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
}

/// Unvalidated form input keyed by field name, exactly as the user typed it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFieldSet(BTreeMap<String, String>);

impl RawFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, field: LoanField, value: impl Into<String>) -> Self {
        self.set(field.name(), value);
        self
    }

    pub fn get(&self, field: LoanField) -> Option<&str> {
        self.0.get(field.name()).map(String::as_str)
    }

    pub fn remove(&mut self, field: LoanField) -> Option<String> {
        self.0.remove(field.name())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawFieldSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Validated loan scenario. Only the application builder can construct one.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanApplication {
    pub(super) gender: Gender,
    pub(super) married: YesNo,
    pub(super) dependents: Dependents,
    pub(super) education: Education,
    pub(super) self_employed: YesNo,
    pub(super) applicant_income: f64,
    pub(super) coapplicant_income: f64,
    pub(super) loan_amount: f64,
    pub(super) loan_amount_term: u32,
    pub(super) credit_history: CreditHistory,
    pub(super) property_area: PropertyArea,
}

impl LoanApplication {
    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn married(&self) -> YesNo {
        self.married
    }

    pub fn dependents(&self) -> Dependents {
        self.dependents
    }

    pub fn education(&self) -> Education {
        self.education
    }

    pub fn self_employed(&self) -> YesNo {
        self.self_employed
    }

    pub fn applicant_income(&self) -> f64 {
        self.applicant_income
    }

    pub fn coapplicant_income(&self) -> f64 {
        self.coapplicant_income
    }

    pub fn loan_amount(&self) -> f64 {
        self.loan_amount
    }

    pub fn loan_amount_term(&self) -> u32 {
        self.loan_amount_term
    }

    pub fn credit_history(&self) -> CreditHistory {
        self.credit_history
    }

    pub fn property_area(&self) -> PropertyArea {
        self.property_area
    }
}
