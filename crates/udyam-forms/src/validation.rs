//! Validation Engine
//!
//! One rule-set per field (required, max length, pattern) compiled from the
//! descriptor. The interactive client checks a value at a time through
//! [`validate`] and [`validate_step`]; the server compiles the whole schema
//! into a [`RecordValidator`]. Both go through [`FieldRules`].
//!
//! Patterns come from HTML `pattern` attributes and follow browser regex
//! semantics, where `\d` and `\w` are ASCII only. They are rewritten to
//! ASCII classes before compiling with `regex`, whose classes are Unicode.

use crate::{FieldDescriptor, SchemaDocument, Step};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field name to the first error message, as shown inline by the client.
pub type FieldErrors = BTreeMap<String, String>;

/// Field name to every error message, as returned by the server.
pub type RecordErrors = BTreeMap<String, Vec<String>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    Required,
    TooLong { max: usize },
    Format,
    NotText,
}

impl Violation {
    pub fn message(&self, label: &str) -> String {
        match self {
            Violation::Required => format!("{label} is required."),
            Violation::TooLong { max } => format!("{label} must be at most {max} characters."),
            Violation::Format => format!("{label} format is invalid."),
            Violation::NotText => format!("{label} must be text."),
        }
    }
}

/// Rewrite the shorthand classes `\d \D \w \W` to their ASCII forms.
/// A literal `[` inside a bracket class is escaped and `[^]` becomes any
/// character.
fn ascii_classes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut chars = pattern.chars();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let Some(next) = chars.next() else {
                    out.push(c);
                    break;
                };
                let class = match next {
                    'd' => Some("digit"),
                    'D' => Some("^digit"),
                    'w' => Some("word"),
                    'W' => Some("^word"),
                    _ => None,
                };
                match (class, in_class) {
                    (Some(class), true) => {
                        out.push_str("[:");
                        out.push_str(class);
                        out.push_str(":]");
                    }
                    (Some(class), false) => {
                        out.push_str("[[:");
                        out.push_str(class);
                        out.push_str(":]]");
                    }
                    (None, _) => {
                        out.push(c);
                        out.push(next);
                    }
                }
            }
            '[' if in_class => out.push_str("\\["),
            // `[^]` matches any character.
            '[' if chars.as_str().starts_with("^]") => {
                chars.nth(1);
                out.push_str("(?s:.)");
            }
            '[' => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Compiled constraints of one field.
#[derive(Clone, Debug)]
pub struct FieldRules {
    name: String,
    label: String,
    required: bool,
    max_length: Option<usize>,
    pattern: Option<Regex>,
}

impl FieldRules {
    /// Compile a descriptor. A pattern that does not compile is dropped with
    /// a warning, so the field fails open on format.
    pub fn compile(field: &FieldDescriptor) -> Self {
        let pattern = field.pattern.as_deref().filter(|p| !p.is_empty()).and_then(|p| {
            Regex::new(&ascii_classes(p))
                .map_err(|e| {
                    tracing::warn!(field = %field.name, pattern = %p, error = %e, "invalid pattern for {}", field.display_label());
                })
                .ok()
        });
        Self {
            name: field.name.clone(),
            label: field.display_label().to_string(),
            required: field.required,
            max_length: field.max_length,
            pattern,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every rule the value breaks, in rule order.
    pub fn violations(&self, value: &str) -> Vec<Violation> {
        if value.is_empty() {
            return if self.required { vec![Violation::Required] } else { Vec::new() };
        }
        let mut out = Vec::new();
        if let Some(max) = self.max_length {
            if value.chars().count() > max {
                out.push(Violation::TooLong { max });
            }
        }
        if let Some(re) = &self.pattern {
            if !re.is_match(value) {
                out.push(Violation::Format);
            }
        }
        out
    }

    /// First broken rule as a message.
    pub fn check(&self, value: &str) -> Option<String> {
        self.violations(value).first().map(|v| v.message(&self.label))
    }

    fn check_json(&self, value: Option<&Value>) -> Vec<String> {
        let violations = match value {
            None | Some(Value::Null) => self.violations(""),
            Some(Value::String(s)) => self.violations(s),
            Some(_) => vec![Violation::NotText],
        };
        violations.iter().map(|v| v.message(&self.label)).collect()
    }
}

/// Check one value against one descriptor.
pub fn validate(value: &str, field: &FieldDescriptor) -> Option<String> {
    FieldRules::compile(field).check(value)
}

/// Check every field of a step. Missing values count as empty.
pub fn validate_step(step: &Step, values: &BTreeMap<String, String>) -> FieldErrors {
    let rules: Vec<FieldRules> = step.fields.iter().map(FieldRules::compile).collect();
    check_fields(&rules, values)
}

/// [`validate_step`] over rules compiled ahead of time.
pub fn check_fields(rules: &[FieldRules], values: &BTreeMap<String, String>) -> FieldErrors {
    rules
        .iter()
        .filter_map(|r| {
            let value = values.get(r.name()).map(String::as_str).unwrap_or("");
            r.check(value).map(|msg| (r.name().to_string(), msg))
        })
        .collect()
}

/// Whole-record validator compiled once per loaded schema.
#[derive(Clone, Debug)]
pub struct RecordValidator {
    rules: Vec<FieldRules>,
}

impl RecordValidator {
    pub fn compile(schema: &SchemaDocument) -> Self {
        Self {
            rules: schema.fields().map(FieldRules::compile).collect(),
        }
    }

    /// Validate a submitted record in one pass. Empty iff valid.
    /// Keys the schema does not know are not checked.
    pub fn validate(&self, record: &Map<String, Value>) -> RecordErrors {
        self.rules
            .iter()
            .filter_map(|rules| {
                let messages = rules.check_json(record.get(rules.name()));
                (!messages.is_empty()).then(|| (rules.name().to_string(), messages))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn mobile() -> FieldDescriptor {
        FieldDescriptor::text("mobile", "Mobile")
            .required()
            .with_pattern(r"^\d{10}$")
            .with_max_length(10)
    }

    #[test]
    fn test_rule_order() {
        let f = mobile();
        assert_eq!(validate("", &f).as_deref(), Some("Mobile is required."));
        assert_eq!(
            validate("98765432101", &f).as_deref(),
            Some("Mobile must be at most 10 characters.")
        );
        assert_eq!(validate("98765", &f).as_deref(), Some("Mobile format is invalid."));
        assert_eq!(validate("9876543210", &f), None);
    }

    #[test]
    fn test_optional_empty_passes() {
        let f = FieldDescriptor::text("panName", "Name as per PAN").with_pattern("^[A-Z]+$");
        assert_eq!(validate("", &f), None);
    }

    #[test]
    fn test_invalid_pattern_fails_open() {
        let f = FieldDescriptor::text("otp", "OTP").with_pattern("([0-9");
        assert_eq!(validate("abc", &f), None);
        // required still applies
        assert!(validate("", &f.clone().required()).is_some());
    }

    #[test]
    fn test_digit_class_is_ascii_only() {
        let f = FieldDescriptor::text("aadhaarNumber", "Aadhaar Number").with_pattern(r"^\d{12}$");
        assert_eq!(validate("123412341234", &f), None);
        assert_eq!(validate("१२३४५६७८९०१२", &f).as_deref(), Some("Aadhaar Number format is invalid."));

        let schema = SchemaDocument::new(vec![Step::new("One", vec![f])]).unwrap();
        let record = json!({ "aadhaarNumber": "१२३४५६७८९०१२" });
        let errors = RecordValidator::compile(&schema).validate(record.as_object().unwrap());
        assert_eq!(errors["aadhaarNumber"], vec!["Aadhaar Number format is invalid.".to_string()]);
    }

    #[test]
    fn test_ascii_class_rewrite() {
        assert_eq!(ascii_classes(r"^\d{6}$"), "^[[:digit:]]{6}$");
        assert_eq!(ascii_classes(r"[\w.-]+"), "[[:word:].-]+");
        assert_eq!(ascii_classes(r"\D\W\s\."), r"[[:^digit:]][[:^word:]]\s\.");
        assert_eq!(ascii_classes(r"a[^]b"), "a(?s:.)b");
        assert_eq!(ascii_classes(r"\\d"), r"\\d");
        assert_eq!(ascii_classes(r"[a[]"), r"[a\[]");

        let word = FieldDescriptor::text("panName", "Name").with_pattern(r"^\w+$");
        assert_eq!(validate("RAVI_1", &word), None);
        assert!(validate("रवि", &word).is_some());
    }

    #[test]
    fn test_max_length_counts_chars() {
        let f = FieldDescriptor::text("state", "State").with_max_length(3);
        assert_eq!(validate("ಕರ್", &f), None);
    }

    #[test]
    fn test_validate_step_collects_errors() {
        let step = Step::new(
            "Aadhaar",
            vec![
                mobile(),
                FieldDescriptor::text("aadhaarName", "Name").required(),
                FieldDescriptor::text("captcha", "Captcha"),
            ],
        );
        let mut values = BTreeMap::new();
        values.insert("mobile".to_string(), "9876543210".to_string());
        let errors = validate_step(&step, &values);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["aadhaarName"], "Name is required.");
    }

    #[test]
    fn test_precompiled_rules_match_step_check() {
        let step = Step::new(
            "Aadhaar",
            vec![
                mobile(),
                FieldDescriptor::text("otp", "OTP").required().with_pattern("([0-9"),
            ],
        );
        let rules: Vec<FieldRules> = step.fields.iter().map(FieldRules::compile).collect();
        for (m, otp) in [("", ""), ("98765", "x"), ("9876543210", "123456")] {
            let mut values = BTreeMap::new();
            values.insert("mobile".to_string(), m.to_string());
            values.insert("otp".to_string(), otp.to_string());
            assert_eq!(check_fields(&rules, &values), validate_step(&step, &values));
        }
        assert!(check_fields(&rules, &BTreeMap::new()).contains_key("otp"));
    }

    #[test]
    fn test_record_validator() {
        let schema = SchemaDocument::new(vec![
            Step::new("One", vec![mobile()]),
            Step::new(
                "Two",
                vec![FieldDescriptor::text("panNumber", "PAN")
                    .required()
                    .with_pattern("^[A-Z]{5}[0-9]{4}[A-Z]{1}$")
                    .with_max_length(10)],
            ),
        ])
        .unwrap();
        let validator = RecordValidator::compile(&schema);
        assert_eq!(validator.len(), 2);

        let ok = json!({ "mobile": "9876543210", "panNumber": "ABCDE1234F", "extra": 1 });
        assert!(validator.validate(ok.as_object().unwrap()).is_empty());

        let bad = json!({ "mobile": 98765, "panNumber": "abcde1234fgh" });
        let errors = validator.validate(bad.as_object().unwrap());
        assert_eq!(errors["mobile"], vec!["Mobile must be text.".to_string()]);
        assert_eq!(
            errors["panNumber"],
            vec![
                "PAN must be at most 10 characters.".to_string(),
                "PAN format is invalid.".to_string()
            ]
        );

        let missing = json!({});
        let errors = validator.validate(missing.as_object().unwrap());
        assert_eq!(errors["mobile"], vec!["Mobile is required.".to_string()]);
    }

    #[test]
    fn test_client_and_server_agree() {
        let schema = SchemaDocument::new(vec![Step::new("One", vec![mobile()])]).unwrap();
        let validator = RecordValidator::compile(&schema);
        for value in ["", "123", "9876543210", "98765432109", "abcdefghij"] {
            let client_ok = validate(value, &mobile()).is_none();
            let record = json!({ "mobile": value });
            let server_ok = validator.validate(record.as_object().unwrap()).is_empty();
            assert_eq!(client_ok, server_ok, "disagreement on {value:?}");
        }
    }

    proptest! {
        #[test]
        fn prop_max_length_boundary(n in 1usize..64) {
            let f = FieldDescriptor::text("f", "F").with_max_length(n);
            prop_assert!(validate(&"a".repeat(n), &f).is_none());
            prop_assert!(validate(&"a".repeat(n + 1), &f).is_some());
        }

        #[test]
        fn prop_pattern_matches_pass(v in "[A-Z]{5}[0-9]{4}[A-Z]") {
            let f = FieldDescriptor::text("pan", "PAN").with_pattern("^[A-Z]{5}[0-9]{4}[A-Z]{1}$");
            prop_assert!(validate(&v, &f).is_none());
        }

        #[test]
        fn prop_pattern_mismatch_fails(v in "[a-z]{1,12}") {
            let f = FieldDescriptor::text("pin", "PIN").with_pattern(r"^\d{6}$");
            prop_assert!(validate(&v, &f).is_some());
        }

        #[test]
        fn prop_invalid_pattern_never_fails(v in ".{1,20}") {
            let f = FieldDescriptor::text("x", "X").with_pattern("(unclosed");
            prop_assert!(validate(&v, &f).is_none());
        }

        #[test]
        fn prop_required_empty_fails(label in "[A-Za-z ]{1,10}") {
            let f = FieldDescriptor::text("x", label).required();
            prop_assert!(validate("", &f).is_some());
        }

        #[test]
        fn prop_idempotent(v in ".{0,15}") {
            let f = mobile();
            prop_assert_eq!(validate(&v, &f), validate(&v, &f));
        }
    }
}
