use crate::infra::{load_field_file, parse_field_assignment};
use clap::Args;
use loan_eligibility::config::{parse_endpoint, AppConfig};
use loan_eligibility::error::AppError;
use loan_eligibility::prediction::{
    validate_field, ErrorKind, FieldKind, HttpPredictionTransport, LoanField,
    PredictionOrchestrator, PredictionTransport, RawFieldSet, RequestState, SubmitOutcome,
};
use loan_eligibility::telemetry;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct PredictArgs {
    /// Field assignment such as `loanAmount=128`; repeat for each field
    #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_field_assignment)]
    pub(crate) fields: Vec<(LoanField, String)>,
    /// JSON object of field names to values, applied before `--field`
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    /// Prompt for every field, re-asking until each value is valid
    #[arg(short, long)]
    pub(crate) interactive: bool,
    /// Override the configured scoring endpoint
    #[arg(long)]
    pub(crate) endpoint: Option<String>,
}

pub(crate) async fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let PredictArgs {
        fields: assignments,
        input,
        interactive,
        endpoint,
    } = args;

    let mut config = AppConfig::load()?;
    if let Some(endpoint) = endpoint {
        config.predictor.endpoint = parse_endpoint(&endpoint)?;
    }
    telemetry::init(&config.telemetry)?;

    let mut fields = match input {
        Some(path) => load_field_file(&path)?,
        None => RawFieldSet::new(),
    };
    for (field, value) in assignments {
        fields.set(field.name(), value);
    }

    let transport =
        HttpPredictionTransport::new(config.predictor.endpoint.clone(), config.predictor.timeout)?;
    let orchestrator = PredictionOrchestrator::new(transport, config.predictor.credit_history);

    let stdout = io::stdout();
    let mut output = stdout.lock();
    if interactive {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        interactive_session(&orchestrator, fields, &mut input, &mut output).await?;
    } else {
        let outcome = orchestrator.submit(fields).await;
        render_outcome(&outcome, &mut output)?;
    }
    Ok(())
}

/// Prompt for every field, then submit, offering to resend the same
/// application while the scoring service is unreachable or failing.
pub(crate) async fn interactive_session<T, R, W>(
    orchestrator: &PredictionOrchestrator<T>,
    mut fields: RawFieldSet,
    input: &mut R,
    output: &mut W,
) -> Result<SubmitOutcome, AppError>
where
    T: PredictionTransport,
    R: BufRead,
    W: Write,
{
    for field in LoanField::ordered() {
        prompt_field(field, &mut fields, input, output)?;
    }

    let mut outcome = orchestrator.submit(fields).await;
    render_outcome(&outcome, output)?;

    while is_retryable(&outcome) {
        write!(output, "Resend the same application? [y/N]: ")?;
        output.flush()?;
        let Some(answer) = read_line(input)? else {
            break;
        };
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            break;
        }
        outcome = orchestrator
            .resubmit()
            .await
            .map_err(|err| AppError::Input(err.to_string()))?;
        render_outcome(&outcome, output)?;
    }

    Ok(outcome)
}

fn prompt_field<R, W>(
    field: LoanField,
    fields: &mut RawFieldSet,
    input: &mut R,
    output: &mut W,
) -> Result<(), AppError>
where
    R: BufRead,
    W: Write,
{
    loop {
        let current = fields.get(field).map(str::to_string);
        write!(output, "{}", field.label())?;
        match field.kind() {
            FieldKind::Choice => write!(output, " [{}]", field.options().join("/"))?,
            FieldKind::Amount => write!(output, " (amount)")?,
            FieldKind::Term => write!(output, " (months)")?,
        }
        if let Some(current) = &current {
            write!(output, " <{current}>")?;
        }
        write!(output, ": ")?;
        output.flush()?;

        let line = read_line(input)?.ok_or_else(|| {
            AppError::Input(format!("input ended before {} was provided", field.name()))
        })?;
        let value = match (line.is_empty(), current) {
            (true, Some(current)) => current,
            _ => line,
        };

        match validate_field(field, &value) {
            Ok(_) => {
                fields.set(field.name(), value);
                return Ok(());
            }
            Err(err) => writeln!(output, "  {err}")?,
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn is_retryable(outcome: &SubmitOutcome) -> bool {
    matches!(
        outcome,
        SubmitOutcome::Settled(RequestState::Failed { failure })
            if matches!(failure.kind, ErrorKind::Network | ErrorKind::Server)
    )
}

/// Human-readable rendering of a settled submission.
pub(crate) fn render_outcome<W: Write>(outcome: &SubmitOutcome, output: &mut W) -> io::Result<()> {
    match outcome {
        SubmitOutcome::Settled(RequestState::Succeeded { outcome }) => {
            let guidance = outcome.guidance;
            writeln!(output, "Prediction: {}", outcome.verdict.label())?;
            writeln!(output, "{}", guidance.headline)?;
            writeln!(output, "{}", guidance.intro)?;
            for step in guidance.steps {
                writeln!(output, "  - {step}")?;
            }
            writeln!(output, "{}", guidance.closing)
        }
        SubmitOutcome::Settled(RequestState::Failed { failure }) => {
            writeln!(output, "Prediction failed: {}", failure.message)?;
            for error in &failure.errors {
                writeln!(output, "  - {error}")?;
            }
            Ok(())
        }
        SubmitOutcome::Settled(state) => writeln!(output, "State: {}", state.label()),
        SubmitOutcome::Superseded { request_id } => writeln!(
            output,
            "Request {request_id} was superseded by a newer submission"
        ),
    }
}
