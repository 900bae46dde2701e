//! Fill command: walk the wizard in the terminal and submit

use crate::client::{ApiClient, HttpPinDirectory};
use anyhow::{bail, Context};
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use udyam_forms::{FieldDescriptor, FieldKind, FormController, PinDirectory, SubmissionSink, SubmitStatus};

pub const BACK_COMMAND: &str = ":back";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Value(String),
    /// Leave the current value as is.
    Keep,
    Back,
}

/// Source of field answers for the wizard.
pub trait Prompter {
    /// Interactive prompters get another try after validation errors.
    fn interactive(&self) -> bool;

    fn ask(&mut self, field: &FieldDescriptor, current: &str, error: Option<&str>) -> io::Result<Answer>;
}

/// Line-oriented prompts over any reader and writer.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

pub fn stdio_prompter() -> LinePrompter<io::StdinLock<'static>, io::Stdout> {
    LinePrompter::new(io::stdin().lock(), io::stdout())
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn interactive(&self) -> bool {
        true
    }

    fn ask(&mut self, field: &FieldDescriptor, current: &str, error: Option<&str>) -> io::Result<Answer> {
        if let Some(error) = error {
            writeln!(self.output, "  {}", error.red())?;
        }
        if field.kind == FieldKind::Select {
            for (i, option) in field.options.iter().enumerate() {
                writeln!(self.output, "    {}) {}", i + 1, option.label)?;
            }
        }
        let mark = if field.required { "*" } else { "" };
        if !current.is_empty() {
            write!(self.output, "{}{} [{}]: ", field.display_label(), mark, current)?;
        } else if let Some(hint) = field.placeholder.as_deref().filter(|p| !p.is_empty()) {
            write!(self.output, "{}{} ({}): ", field.display_label(), mark, hint.dimmed())?;
        } else {
            write!(self.output, "{}{}: ", field.display_label(), mark)?;
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        let line = line.trim();
        if line == BACK_COMMAND {
            return Ok(Answer::Back);
        }
        if line.is_empty() {
            return Ok(Answer::Keep);
        }
        if field.kind == FieldKind::Select {
            if let Some(option) = line
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| field.options.get(i))
            {
                return Ok(Answer::Value(option.value.clone()));
            }
        }
        Ok(Answer::Value(line.to_string()))
    }
}

/// Answers read from a YAML or JSON mapping of field name to value.
#[derive(Debug, Default)]
pub struct AnswersPrompter {
    answers: BTreeMap<String, String>,
}

impl AnswersPrompter {
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let raw: BTreeMap<String, serde_yaml::Value> =
            serde_yaml::from_str(content).context("answers must be a mapping of field name to value")?;
        let mut answers = BTreeMap::new();
        for (name, value) in raw {
            let value = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Null => String::new(),
                _ => bail!("answer for {} must be a scalar", name),
            };
            answers.insert(name, value);
        }
        Ok(Self { answers })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content)
    }
}

impl Prompter for AnswersPrompter {
    fn interactive(&self) -> bool {
        false
    }

    fn ask(&mut self, field: &FieldDescriptor, _current: &str, _error: Option<&str>) -> io::Result<Answer> {
        Ok(match self.answers.get(&field.name) {
            Some(value) => Answer::Value(value.clone()),
            None => Answer::Keep,
        })
    }
}

fn render_progress(form: &FormController) {
    let progress = form.progress();
    let title = progress.titles.get(progress.step).cloned().unwrap_or_default();
    println!(
        "\n{} {}",
        format!("[{}/{} · {}%]", progress.step + 1, progress.total, progress.percent()).cyan(),
        title.bold()
    );
}

fn report_errors(form: &FormController) {
    for (name, message) in form.errors() {
        eprintln!("  {} {}: {}", "✗".red(), name, message);
    }
}

/// Drive `form` to a successful submission and return the new record id.
pub async fn run_wizard<P, D, S>(
    form: &mut FormController,
    prompter: &mut P,
    pins: &D,
    sink: &S,
) -> anyhow::Result<String>
where
    P: Prompter,
    D: PinDirectory + ?Sized,
    S: SubmissionSink + ?Sized,
{
    loop {
        render_progress(form);
        let fields = form.current_step().fields.clone();
        let mut moved_back = false;

        for field in &fields {
            let current = form.value(&field.name).unwrap_or_default().to_string();
            let error = form.error(&field.name).map(str::to_string);
            match prompter.ask(field, &current, error.as_deref())? {
                Answer::Back => {
                    if form.back() {
                        moved_back = true;
                        break;
                    }
                }
                Answer::Keep => {}
                Answer::Value(raw) => {
                    if let Some(ticket) = form.set_value(&field.name, &raw)? {
                        if form.lookup_pin(ticket, pins).await {
                            println!("  {}", "District and state filled from PIN code".dimmed());
                        }
                    }
                }
            }
        }
        if moved_back {
            continue;
        }

        if !form.is_last_step() {
            if !form.next() {
                report_errors(form);
                if !prompter.interactive() {
                    bail!("step {} has invalid fields", form.current_step_index() + 1);
                }
            }
            continue;
        }

        let status = form.submit_via(sink).await?.clone();
        match status {
            SubmitStatus::Submitted { id } => return Ok(id),
            SubmitStatus::Failed { reason } => {
                if form.errors().is_empty() {
                    bail!("submission failed: {}", reason);
                }
                report_errors(form);
                if !prompter.interactive() {
                    bail!("submission rejected: {}", reason);
                }
            }
            SubmitStatus::Editing => {
                report_errors(form);
                if !prompter.interactive() {
                    bail!("final step has invalid fields");
                }
            }
        }
    }
}

pub async fn handle(
    client: &ApiClient,
    pin_url: &str,
    answers: Option<&Path>,
    schema_file: Option<&Path>,
) -> anyhow::Result<()> {
    let schema = client.load_schema(schema_file).await?;
    let pins = HttpPinDirectory::new(pin_url)?;
    let mut form = FormController::new(Arc::new(schema));

    let id = match answers {
        Some(path) => {
            let mut prompter = AnswersPrompter::load(path)?;
            run_wizard(&mut form, &mut prompter, &pins, client).await?
        }
        None => {
            println!("{}", format!("Type {} to return to the previous step.", BACK_COMMAND).dimmed());
            let mut prompter = stdio_prompter();
            run_wizard(&mut form, &mut prompter, &pins, client).await?
        }
    };
    println!("{} {}", "Submitted:".green().bold(), id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::io::Cursor;
    use udyam_forms::{
        FieldOption, FormValues, InMemoryPinDirectory, InputTransform, RecordErrors, SchemaDocument, Step,
        SubmitError, SubmitReceipt,
    };

    fn schema() -> Arc<SchemaDocument> {
        Arc::new(
            SchemaDocument::new(vec![
                Step::new(
                    "Step 1 – Aadhaar & OTP",
                    vec![FieldDescriptor::text("mobile", "Mobile")
                        .required()
                        .with_pattern(r"^\d{10}$")
                        .with_transform(InputTransform::DigitsOnly)],
                ),
                Step::new(
                    "Step 2 – PAN Validation",
                    vec![
                        FieldDescriptor::select(
                            "orgType",
                            "Organisation",
                            vec![
                                FieldOption { label: "Proprietary".into(), value: "1".into() },
                                FieldOption { label: "Partnership".into(), value: "2".into() },
                            ],
                        )
                        .required(),
                        FieldDescriptor::text("pinCode", "PIN")
                            .with_transform(InputTransform::DigitsOnly),
                        FieldDescriptor::text("district", "District"),
                        FieldDescriptor::text("state", "State"),
                    ],
                ),
            ])
            .unwrap(),
        )
    }

    struct FakeSink {
        sent: Mutex<Vec<FormValues>>,
        reject: Option<RecordErrors>,
    }

    impl FakeSink {
        fn accepting() -> Self {
            Self { sent: Mutex::new(Vec::new()), reject: None }
        }
    }

    #[async_trait]
    impl SubmissionSink for FakeSink {
        async fn submit(&self, values: &FormValues) -> Result<SubmitReceipt, SubmitError> {
            self.sent.lock().push(values.clone());
            match &self.reject {
                Some(errors) => Err(SubmitError::Rejected(errors.clone())),
                None => Ok(SubmitReceipt { id: "rec-1".into() }),
            }
        }
    }

    fn pins() -> InMemoryPinDirectory {
        InMemoryPinDirectory::new().with_entry("110001", "Central Delhi", "Delhi")
    }

    #[tokio::test]
    async fn test_answers_file_submits_with_pin_autofill() {
        let mut prompter = AnswersPrompter::parse("mobile: 98765 43210\norgType: \"2\"\npinCode: 110001\n").unwrap();
        let sink = FakeSink::accepting();
        let mut form = FormController::new(schema());

        let id = run_wizard(&mut form, &mut prompter, &pins(), &sink).await.unwrap();

        assert_eq!(id, "rec-1");
        let sent = sink.sent.lock();
        assert_eq!(sent[0]["mobile"], "9876543210");
        assert_eq!(sent[0]["district"], "Central Delhi");
        assert_eq!(sent[0]["state"], "Delhi");
    }

    #[tokio::test]
    async fn test_answers_file_stops_on_invalid_step() {
        let mut prompter = AnswersPrompter::parse("{\"mobile\": \"123\"}").unwrap();
        let sink = FakeSink::accepting();
        let mut form = FormController::new(schema());

        let err = run_wizard(&mut form, &mut prompter, &pins(), &sink).await.unwrap_err();

        assert!(err.to_string().contains("step 1"));
        assert!(sink.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_server_rejection_without_retry_fails() {
        let mut prompter = AnswersPrompter::parse("mobile: \"9876543210\"\norgType: \"1\"\n").unwrap();
        let mut reject = RecordErrors::new();
        reject.insert("mobile".into(), vec!["Mobile format is invalid.".into()]);
        let sink = FakeSink { sent: Mutex::new(Vec::new()), reject: Some(reject) };
        let mut form = FormController::new(schema());

        let err = run_wizard(&mut form, &mut prompter, &pins(), &sink).await.unwrap_err();

        assert!(err.to_string().contains("rejected"));
        assert_eq!(form.current_step_index(), 0);
        assert_eq!(form.error("mobile"), Some("Mobile format is invalid."));
    }

    #[tokio::test]
    async fn test_interactive_back_and_numbered_options() {
        // Step 1, step 2 (back), step 1 again, then step 2 with option 1.
        let script = "9876543210\n:back\n\n1\n\n\n\n";
        let mut prompter = LinePrompter::new(Cursor::new(script), Vec::new());
        let sink = FakeSink::accepting();
        let mut form = FormController::new(schema());

        let id = run_wizard(&mut form, &mut prompter, &pins(), &sink).await.unwrap();

        assert_eq!(id, "rec-1");
        assert_eq!(sink.sent.lock()[0]["orgType"], "1");
        assert_eq!(sink.sent.lock()[0]["mobile"], "9876543210");
    }

    #[tokio::test]
    async fn test_interactive_retries_after_error() {
        let script = "12\n9876543210\n2\n\n\n\n";
        let mut output = Vec::new();
        let mut prompter = LinePrompter::new(Cursor::new(script), &mut output);
        let sink = FakeSink::accepting();
        let mut form = FormController::new(schema());

        run_wizard(&mut form, &mut prompter, &pins(), &sink).await.unwrap();
        drop(prompter);

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("Mobile format is invalid."));
        assert!(shown.contains("1) Proprietary"));
    }

    #[tokio::test]
    async fn test_closed_input_is_an_error() {
        let mut prompter = LinePrompter::new(Cursor::new(""), Vec::new());
        let sink = FakeSink::accepting();
        let mut form = FormController::new(schema());

        assert!(run_wizard(&mut form, &mut prompter, &pins(), &sink).await.is_err());
    }

    #[test]
    fn test_answers_reject_nested_values() {
        assert!(AnswersPrompter::parse("mobile: [1, 2]").is_err());
    }
}
