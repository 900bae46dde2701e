//! Schema Document model
//!
//! The document is produced offline by the scraper and read by both the
//! client and the server. It is immutable once loaded.

use crate::{FormsError, InputTransform, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path;

// =============================================================================
// Core Types
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    #[serde(alias = "input")]
    Text,
    Select,
    Textarea,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

/// Metadata for one form input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub label: String,
    #[serde(default, alias = "tag")]
    pub kind: FieldKind,
    #[serde(default = "default_input_type", alias = "type")]
    pub input_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, alias = "maxlength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_empty")]
    pub options: Vec<FieldOption>,
    /// Explicit transform; documents without one fall back to
    /// [`InputTransform::infer`] on name and input type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<InputTransform>,
}

fn default_input_type() -> String {
    "text".into()
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl FieldDescriptor {
    /// Plain text field with `id == name`.
    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            label: label.into(),
            kind: FieldKind::Text,
            input_type: default_input_type(),
            placeholder: None,
            required: false,
            pattern: None,
            max_length: None,
            options: Vec::new(),
            transform: Some(InputTransform::Identity),
        }
    }

    pub fn select(name: impl Into<String>, label: impl Into<String>, options: Vec<FieldOption>) -> Self {
        Self {
            kind: FieldKind::Select,
            input_type: "select".into(),
            options,
            ..Self::text(name, label)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn with_transform(mut self, transform: InputTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = input_type.into();
        self
    }

    /// Transform applied to raw input for this field.
    pub fn input_transform(&self) -> InputTransform {
        self.transform
            .unwrap_or_else(|| InputTransform::infer(&self.name, &self.input_type))
    }

    /// Label used in messages; scraped fields without a `<label>` fall back to the name.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub title: String,
    pub fields: Vec<FieldDescriptor>,
}

impl Step {
    pub fn new(title: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self { title: title.into(), fields }
    }
}

/// Full multi-step form definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub steps: Vec<Step>,
}

impl SchemaDocument {
    /// Build and check a document.
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        let doc = Self { generated_at: None, source: None, steps };
        doc.check()?;
        Ok(doc)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(raw)?;
        doc.check()?;
        Ok(doc)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let doc: Self = serde_json::from_value(value)?;
        doc.check()?;
        Ok(doc)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Check document invariants: at least one step, no empty step,
    /// unique field names, options on every select.
    pub fn check(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(FormsError::InvalidSchema("schema has no steps".into()));
        }
        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.fields.is_empty() {
                return Err(FormsError::InvalidSchema(format!("step '{}' has no fields", step.title)));
            }
            for field in &step.fields {
                if field.name.is_empty() {
                    return Err(FormsError::InvalidSchema(format!("field '{}' has no name", field.id)));
                }
                if !seen.insert(field.name.as_str()) {
                    return Err(FormsError::InvalidSchema(format!("duplicate field name '{}'", field.name)));
                }
                if field.kind == FieldKind::Select && field.options.is_empty() {
                    return Err(FormsError::InvalidSchema(format!("select '{}' has no options", field.name)));
                }
            }
        }
        Ok(())
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.steps.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|f| f.name == name)
    }

    /// Index of the step that owns `name`.
    pub fn step_of(&self, name: &str) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| s.fields.iter().any(|f| f.name == name))
    }

    pub fn field_count(&self) -> usize {
        self.steps.iter().map(|s| s.fields.len()).sum()
    }
}
