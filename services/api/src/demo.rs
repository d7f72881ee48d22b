use crate::infra::{ScriptedReply, ScriptedTransport};
use crate::predict::render_outcome;
use clap::Args;
use loan_eligibility::error::AppError;
use loan_eligibility::prediction::{
    CreditHistoryEncoding, LoanField, PredictionOrchestrator, RawFieldSet, TransportError,
};
use std::io::{self, Write};
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Simulated latency of the request that gets superseded, in milliseconds
    #[arg(long, default_value_t = 250)]
    pub(crate) latency_ms: u64,
    /// Wire encoding for the credit history field (`label` or `flag`)
    #[arg(long, default_value_t = CreditHistoryEncoding::Label)]
    pub(crate) credit_history: CreditHistoryEncoding,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            latency_ms: 250,
            credit_history: CreditHistoryEncoding::Label,
        }
    }
}

const APPROVED: &str = r#"{"prediction": 1}"#;
const DENIED: &str = r#"{"prediction": 0}"#;

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let stdout = io::stdout();
    let mut output = stdout.lock();
    walkthrough(&args, &mut output).await
}

async fn walkthrough<W: Write>(args: &DemoArgs, output: &mut W) -> Result<(), AppError> {
    let latency = Duration::from_millis(args.latency_ms);
    let transport = ScriptedTransport::new([
        ScriptedReply::body(APPROVED),
        ScriptedReply::body(DENIED),
        ScriptedReply::body(APPROVED).after(latency),
        ScriptedReply::body(DENIED),
        ScriptedReply::failure(TransportError::Network("connection refused".to_string())),
        ScriptedReply::body(APPROVED),
    ]);
    let orchestrator = PredictionOrchestrator::new(transport, args.credit_history);

    writeln!(output, "Loan eligibility demo (offline scoring service)")?;

    writeln!(output, "\n1. Strong application")?;
    let outcome = orchestrator.submit(strong_application()).await;
    render_outcome(&outcome, output)?;
    if let Some(record) = orchestrator.transport().sent().first() {
        let wire = serde_json::to_string_pretty(record)
            .map_err(|err| AppError::Input(err.to_string()))?;
        writeln!(output, "Wire record sent:\n{wire}")?;
    }

    writeln!(output, "\n2. Application without credit history")?;
    let outcome = orchestrator.submit(weak_application()).await;
    render_outcome(&outcome, output)?;

    writeln!(output, "\n3. Form with typos (never leaves the client)")?;
    let typo_form = strong_application()
        .with(LoanField::Gender, "male")
        .with(LoanField::LoanAmount, "0")
        .with(LoanField::LoanAmountTerm, "12.5");
    let outcome = orchestrator.submit(typo_form).await;
    render_outcome(&outcome, output)?;

    writeln!(
        output,
        "\n4. Two quick submissions; the first reply arrives {}ms late",
        args.latency_ms
    )?;
    let (first, second) = tokio::join!(
        orchestrator.submit(strong_application()),
        orchestrator.submit(weak_application()),
    );
    render_outcome(&first, output)?;
    render_outcome(&second, output)?;
    writeln!(output, "Final state: {}", orchestrator.state().label())?;

    writeln!(output, "\n5. Scoring service unreachable, then resent")?;
    let outcome = orchestrator.submit(strong_application()).await;
    render_outcome(&outcome, output)?;
    let outcome = orchestrator
        .resubmit()
        .await
        .map_err(|err| AppError::Input(err.to_string()))?;
    render_outcome(&outcome, output)?;

    orchestrator.reset();
    writeln!(output, "\nAfter reset: {}", orchestrator.state().label())?;
    Ok(())
}

fn strong_application() -> RawFieldSet {
    RawFieldSet::new()
        .with(LoanField::Gender, "Male")
        .with(LoanField::Married, "Yes")
        .with(LoanField::Dependents, "0")
        .with(LoanField::Education, "Graduate")
        .with(LoanField::SelfEmployed, "No")
        .with(LoanField::ApplicantIncome, "6000")
        .with(LoanField::CoapplicantIncome, "1800")
        .with(LoanField::LoanAmount, "141")
        .with(LoanField::LoanAmountTerm, "360")
        .with(LoanField::CreditHistory, "Yes")
        .with(LoanField::PropertyArea, "Semiurban")
}

fn weak_application() -> RawFieldSet {
    RawFieldSet::new()
        .with(LoanField::Gender, "Female")
        .with(LoanField::Married, "No")
        .with(LoanField::Dependents, "3+")
        .with(LoanField::Education, "Not Graduate")
        .with(LoanField::SelfEmployed, "Yes")
        .with(LoanField::ApplicantIncome, "1800")
        .with(LoanField::CoapplicantIncome, "0")
        .with(LoanField::LoanAmount, "200")
        .with(LoanField::LoanAmountTerm, "180")
        .with(LoanField::CreditHistory, "No")
        .with(LoanField::PropertyArea, "Rural")
}
