//! Wizard Form Controller
//!
//! Holds the client-side form state: current step, values and inline
//! errors. Every transition is a plain `&mut self` call driven by one user
//! event or one network completion; nothing here blocks.

use crate::{
    check_fields, FieldErrors, FieldRules, FormValues, FormsError, LookupError, PinDirectory, PinLocation,
    PinLookupTicket, Result, SchemaDocument, Step, SubmissionSink, SubmitError, SubmitReceipt,
    DISTRICT_FIELD, PIN_CODE_FIELD, PIN_CODE_LEN, STATE_FIELD,
};
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum SubmitStatus {
    #[default]
    Editing,
    Submitted { id: String },
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum WizardEvent {
    StepAdvanced { from: usize, to: usize },
    SteppedBack { from: usize, to: usize },
    PinResolved { pin: String, location: PinLocation },
    Submitted { id: String },
    SubmitFailed { reason: String },
}

/// Progress bar model: zero-based step, total and titles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub step: usize,
    pub total: usize,
    pub titles: Vec<String>,
}

impl Progress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (((self.step + 1) as f64 / self.total as f64) * 100.0).round() as u8
    }
}

pub struct FormController {
    schema: Arc<SchemaDocument>,
    /// Compiled rules, one list per step.
    rules: Vec<Vec<FieldRules>>,
    current: usize,
    values: FormValues,
    errors: FieldErrors,
    status: SubmitStatus,
    pin_generation: u64,
    events: Vec<WizardEvent>,
}

impl FormController {
    /// Start on step 0 with every field empty.
    pub fn new(schema: Arc<SchemaDocument>) -> Self {
        let values = schema.fields().map(|f| (f.name.clone(), String::new())).collect();
        let rules = schema
            .steps
            .iter()
            .map(|s| s.fields.iter().map(FieldRules::compile).collect())
            .collect();
        Self {
            schema,
            rules,
            current: 0,
            values,
            errors: FieldErrors::new(),
            status: SubmitStatus::Editing,
            pin_generation: 0,
            events: Vec::new(),
        }
    }

    pub fn schema(&self) -> &SchemaDocument {
        &self.schema
    }

    pub fn current_step_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> &Step {
        &self.schema.steps[self.current]
    }

    pub fn step_count(&self) -> usize {
        self.schema.steps.len()
    }

    pub fn is_last_step(&self) -> bool {
        self.current + 1 == self.step_count()
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn status(&self) -> &SubmitStatus {
        &self.status
    }

    pub fn progress(&self) -> Progress {
        Progress {
            step: self.current,
            total: self.step_count(),
            titles: self.schema.steps.iter().map(|s| s.title.clone()).collect(),
        }
    }

    pub fn take_events(&mut self) -> Vec<WizardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Store user input after the field's transform and clear its error.
    ///
    /// Returns a lookup ticket when the PIN code reaches its full length.
    pub fn set_value(&mut self, name: &str, raw: &str) -> Result<Option<PinLookupTicket>> {
        if matches!(self.status, SubmitStatus::Submitted { .. }) {
            return Err(FormsError::AlreadySubmitted);
        }
        let field = self
            .schema
            .field(name)
            .ok_or_else(|| FormsError::UnknownField(name.to_string()))?;
        let value = field.input_transform().apply(raw);
        self.errors.remove(name);

        let mut ticket = None;
        if name == PIN_CODE_FIELD {
            // Any edit invalidates lookups still in flight.
            self.pin_generation += 1;
            if value.chars().count() == PIN_CODE_LEN {
                ticket = Some(PinLookupTicket { pin: value.clone(), generation: self.pin_generation });
            }
        }
        self.values.insert(name.to_string(), value);
        Ok(ticket)
    }

    fn validate_current(&mut self) -> bool {
        self.errors = check_fields(&self.rules[self.current], &self.values);
        self.errors.is_empty()
    }

    /// Validate the current step and advance when it is clean.
    /// Returns whether the step index moved.
    pub fn next(&mut self) -> bool {
        if matches!(self.status, SubmitStatus::Submitted { .. }) || !self.validate_current() {
            return false;
        }
        if self.is_last_step() {
            return false;
        }
        let from = self.current;
        self.current += 1;
        self.events.push(WizardEvent::StepAdvanced { from, to: self.current });
        true
    }

    /// Go back one step without validating.
    pub fn back(&mut self) -> bool {
        if self.current == 0 || matches!(self.status, SubmitStatus::Submitted { .. }) {
            return false;
        }
        let from = self.current;
        self.current -= 1;
        self.events.push(WizardEvent::SteppedBack { from, to: self.current });
        true
    }

    /// Validate the last step. `Ok(Some(values))` is the record to send,
    /// `Ok(None)` means inline errors were set.
    pub fn submit(&mut self) -> Result<Option<FormValues>> {
        if matches!(self.status, SubmitStatus::Submitted { .. }) {
            return Err(FormsError::AlreadySubmitted);
        }
        if !self.is_last_step() {
            return Err(FormsError::NotOnLastStep);
        }
        if !self.validate_current() {
            // A failure from an earlier attempt no longer describes the form.
            self.status = SubmitStatus::Editing;
            return Ok(None);
        }
        Ok(Some(self.values.clone()))
    }

    /// Record the outcome of sending the form.
    ///
    /// Field errors returned by the server are shown inline and the wizard
    /// moves to the first step holding one.
    pub fn complete_submission(&mut self, outcome: std::result::Result<SubmitReceipt, SubmitError>) {
        match outcome {
            Ok(receipt) => {
                self.events.push(WizardEvent::Submitted { id: receipt.id.clone() });
                self.status = SubmitStatus::Submitted { id: receipt.id };
            }
            Err(err) => {
                if let SubmitError::Rejected(fields) = &err {
                    self.errors = fields
                        .iter()
                        .filter_map(|(name, msgs)| msgs.first().map(|m| (name.clone(), m.clone())))
                        .collect();
                    if let Some(step) = self.errors.keys().filter_map(|n| self.schema.step_of(n)).min() {
                        self.current = step;
                    }
                }
                let reason = err.to_string();
                tracing::warn!(%reason, "submission failed");
                self.events.push(WizardEvent::SubmitFailed { reason: reason.clone() });
                self.status = SubmitStatus::Failed { reason };
            }
        }
    }

    /// Validate, send through `sink` and record the outcome.
    pub async fn submit_via<S>(&mut self, sink: &S) -> Result<&SubmitStatus>
    where
        S: SubmissionSink + ?Sized,
    {
        if let Some(values) = self.submit()? {
            let outcome = sink.submit(&values).await;
            self.complete_submission(outcome);
        }
        Ok(&self.status)
    }

    /// Apply a finished lookup. District and state are only filled while
    /// empty; stale tickets and failures leave the form untouched.
    /// Returns whether anything was written.
    pub fn apply_pin_lookup(
        &mut self,
        ticket: &PinLookupTicket,
        result: std::result::Result<PinLocation, LookupError>,
    ) -> bool {
        if ticket.generation != self.pin_generation {
            tracing::debug!(pin = %ticket.pin, "discarding stale PIN lookup");
            return false;
        }
        let location = match result {
            Ok(location) => location,
            Err(e) => {
                tracing::debug!(pin = %ticket.pin, error = %e, "PIN lookup failed");
                return false;
            }
        };
        let mut written = false;
        for (name, resolved) in [(DISTRICT_FIELD, &location.district), (STATE_FIELD, &location.state)] {
            if let Some(current) = self.values.get_mut(name) {
                if current.is_empty() && !resolved.is_empty() {
                    *current = resolved.clone();
                    self.errors.remove(name);
                    written = true;
                }
            }
        }
        self.events.push(WizardEvent::PinResolved { pin: ticket.pin.clone(), location });
        written
    }

    /// Run a lookup for `ticket` and apply it.
    pub async fn lookup_pin<D>(&mut self, ticket: PinLookupTicket, directory: &D) -> bool
    where
        D: PinDirectory + ?Sized,
    {
        let result = directory.lookup(&ticket.pin).await;
        self.apply_pin_lookup(&ticket, result)
    }
}
