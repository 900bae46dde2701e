//! Output formatting

use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{Table, Tabled};
use udyam_forms::SchemaDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_str(name, true).ok()
    }

    pub fn print<T: Serialize>(&self, data: &T) {
        match self {
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(data).unwrap_or_default());
            }
            // Structured data without a table layout prints as JSON.
            OutputFormat::Json | OutputFormat::Table => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
        }
    }

    pub fn print_schema(&self, schema: &SchemaDocument) {
        match self {
            OutputFormat::Table => println!("{}", schema_table(schema)),
            _ => self.print(schema),
        }
    }

    pub fn print_errors(&self, errors: &BTreeMap<String, String>) {
        match self {
            OutputFormat::Table => {
                let rows = errors.iter().map(|(field, message)| ErrorRow {
                    field: field.clone(),
                    message: message.clone(),
                });
                println!("{}", Table::new(rows));
            }
            _ => self.print(errors),
        }
    }
}

#[derive(Tabled)]
struct FieldRow {
    step: usize,
    name: String,
    label: String,
    kind: String,
    required: bool,
    pattern: String,
    #[tabled(rename = "max")]
    max_length: String,
}

#[derive(Tabled)]
struct ErrorRow {
    field: String,
    message: String,
}

pub fn schema_table(schema: &SchemaDocument) -> String {
    let rows = schema.steps.iter().enumerate().flat_map(|(i, step)| {
        step.fields.iter().map(move |f| FieldRow {
            step: i + 1,
            name: f.name.clone(),
            label: f.display_label().to_string(),
            kind: format!("{:?}", f.kind).to_lowercase(),
            required: f.required,
            pattern: f.pattern.clone().unwrap_or_default(),
            max_length: f.max_length.map(|m| m.to_string()).unwrap_or_default(),
        })
    });
    Table::new(rows).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use udyam_forms::{FieldDescriptor, Step};

    #[test]
    fn test_schema_table_lists_fields() {
        let schema = SchemaDocument::new(vec![Step::new(
            "One",
            vec![FieldDescriptor::text("mobile", "Mobile").required().with_max_length(10)],
        )])
        .unwrap();
        let table = schema_table(&schema);
        assert!(table.contains("mobile"));
        assert!(table.contains("Mobile"));
        assert!(table.contains("10"));
    }

    #[test]
    fn test_format_names() {
        assert_eq!(OutputFormat::from_name("YAML"), Some(OutputFormat::Yaml));
        assert_eq!(OutputFormat::from_name("xml"), None);
    }
}
