//! Form field extraction from HTML snapshots
//!
//! Turns rendered registration pages into a Schema Document. Page
//! interaction (clicking the OTP button) happens in an external headless
//! browser; this module only reads the HTML it saved.

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use udyam_forms::{FieldDescriptor, FieldKind, FieldOption, FormsError, InputTransform, SchemaDocument, Step};

pub const AADHAAR_PATTERN: &str = r"^\d{12}$";
pub const PAN_PATTERN: &str = "^[A-Z]{5}[0-9]{4}[A-Z]{1}$";

pub const STEP_TITLES: [&str; 2] = ["Step 1 – Aadhaar & OTP", "Step 2 – PAN Validation"];

/// Input types that never hold user data.
const SKIPPED_TYPES: [&str; 5] = ["hidden", "submit", "button", "image", "reset"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("bad selector: {0}")]
    Selector(String),

    #[error("no form fields found in any snapshot")]
    NoFields,

    #[error(transparent)]
    Schema(#[from] FormsError),
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("{css}: {e:?}")))
}

/// Every `input`, `select` and `textarea` with an id or a name, in document order.
pub fn extract_fields(html: &str) -> Result<Vec<FieldDescriptor>, ExtractError> {
    let document = Html::parse_document(html);
    let controls = selector("input, select, textarea")?;
    let labels = selector("label[for]")?;
    let options = selector("option")?;

    let label_text: HashMap<String, String> = document
        .select(&labels)
        .filter_map(|l| {
            let target = l.value().attr("for")?;
            let text = collect_text(&l);
            (!text.is_empty()).then(|| (target.to_string(), text))
        })
        .collect();

    let mut fields = Vec::new();
    for el in document.select(&controls) {
        if let Some(field) = normalize(&el, &label_text, &options) {
            fields.push(field);
        }
    }
    Ok(fields)
}

fn collect_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn normalize(el: &ElementRef, labels: &HashMap<String, String>, options: &Selector) -> Option<FieldDescriptor> {
    let attrs = el.value();
    let attr = |name: &str| attrs.attr(name).filter(|v| !v.is_empty()).map(str::to_string);

    let id = attr("id").or_else(|| attr("name"))?;
    let name = attr("name").unwrap_or_else(|| id.clone());
    let tag = attrs.name().to_lowercase();
    let kind = match tag.as_str() {
        "select" => FieldKind::Select,
        "textarea" => FieldKind::Textarea,
        _ => FieldKind::Text,
    };
    let input_type = attr("type")
        .map(|t| t.to_lowercase())
        .unwrap_or_else(|| if kind == FieldKind::Select { "select".into() } else { "text".into() });
    if SKIPPED_TYPES.contains(&input_type.as_str()) {
        return None;
    }

    let label = labels
        .get(&id)
        .cloned()
        .or_else(|| attr("aria-label"))
        .unwrap_or_default();

    let field_options: Vec<FieldOption> = if kind == FieldKind::Select {
        el.select(options)
            .filter_map(|opt| {
                let text = collect_text(&opt);
                if text.is_empty() {
                    return None;
                }
                let value = opt.value().attr("value").filter(|v| !v.is_empty()).unwrap_or(text.as_str()).to_string();
                Some(FieldOption { label: text, value })
            })
            .collect()
    } else {
        Vec::new()
    };

    let transform = if kind == FieldKind::Select {
        InputTransform::Identity
    } else {
        InputTransform::infer(&name, &input_type)
    };

    Some(FieldDescriptor {
        id,
        name,
        label,
        kind,
        input_type,
        placeholder: attr("placeholder"),
        required: attrs.attr("required").is_some(),
        pattern: attr("pattern"),
        max_length: attr("maxlength").and_then(|m| m.trim().parse().ok()),
        options: field_options,
        transform: Some(transform),
    })
}

/// Give the first field whose id or name contains `key` a pattern, unless
/// the page already set one.
pub fn ensure_rule(fields: &mut [FieldDescriptor], key: &str, pattern: &str) {
    let hit = fields
        .iter_mut()
        .find(|f| f.id.to_lowercase().contains(key) || f.name.to_lowercase().contains(key));
    if let Some(field) = hit {
        if field.pattern.is_none() {
            field.pattern = Some(pattern.to_string());
        }
    }
}

/// Build the Schema Document from up to two snapshots (before and after the
/// OTP interaction). Names already seen in an earlier step are dropped,
/// as are selects without options and steps left empty.
pub fn build_schema(snapshots: &[String], source: &str) -> Result<SchemaDocument, ExtractError> {
    let mut seen = HashSet::new();
    let mut steps = Vec::new();

    for (index, html) in snapshots.iter().enumerate() {
        let mut fields: Vec<FieldDescriptor> = extract_fields(html)?
            .into_iter()
            .filter(|f| !(f.kind == FieldKind::Select && f.options.is_empty()))
            .filter(|f| seen.insert(f.name.clone()))
            .collect();
        match index {
            0 => ensure_rule(&mut fields, "aadhaar", AADHAAR_PATTERN),
            1 => ensure_rule(&mut fields, "pan", PAN_PATTERN),
            _ => {}
        }
        if fields.is_empty() {
            tracing::warn!(step = index + 1, "snapshot contributed no new fields");
            continue;
        }
        let title = STEP_TITLES
            .get(index)
            .map(|t| t.to_string())
            .unwrap_or_else(|| format!("Step {}", index + 1));
        steps.push(Step::new(title, fields));
    }

    if steps.is_empty() {
        return Err(ExtractError::NoFields);
    }
    let mut schema = SchemaDocument::new(steps)?;
    schema.generated_at = Some(Utc::now());
    schema.source = Some(source.to_string());
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP_ONE: &str = r#"
        <html><body><form>
          <input type="hidden" name="__VIEWSTATE" value="abc" />
          <label for="txtadharno">1. Aadhaar Number/ आधार संख्या</label>
          <input id="txtadharno" name="aadhaarNumber" type="text" maxlength="12"
                 placeholder="Your Aadhaar No" required />
          <label for="txtownername">2. Name of Entrepreneur</label>
          <input id="txtownername" name="aadhaarName" type="text" maxlength="100" />
          <input id="txtOtp" name="otp" type="text" aria-label="OTP" maxlength="6" />
          <input id="chkDecarationA" name="consent" type="checkbox" />
          <input type="submit" id="btnValidateAadhaar" value="Validate &amp; Generate OTP" />
        </form></body></html>"#;

    const STEP_TWO: &str = r#"
        <html><body><form>
          <input id="txtadharno" name="aadhaarNumber" type="text" />
          <label for="ddlTypeofOrg">3. Type of Organisation</label>
          <select id="ddlTypeofOrg" name="orgType" required>
            <option value="0">Type of Organisation</option>
            <option value="1">1. Proprietary / एकल स्वामित्व</option>
            <option>2. Hindu Undivided Family</option>
            <option value="x"></option>
          </select>
          <label for="txtPan">4.1 PAN</label>
          <input id="txtPan" name="panNumber" type="text" maxlength="10" />
          <input id="txtPinCode" name="pinCode" type="tel" maxlength="6" />
          <select id="ddlEmpty" name="empty"></select>
        </form></body></html>"#;

    #[test]
    fn test_extract_step_one() {
        let fields = extract_fields(STEP_ONE).unwrap();
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["aadhaarNumber", "aadhaarName", "otp", "consent"]);

        let aadhaar = &fields[0];
        assert_eq!(aadhaar.id, "txtadharno");
        assert_eq!(aadhaar.label, "1. Aadhaar Number/ आधार संख्या");
        assert_eq!(aadhaar.max_length, Some(12));
        assert_eq!(aadhaar.placeholder.as_deref(), Some("Your Aadhaar No"));
        assert!(aadhaar.required);
        assert_eq!(aadhaar.transform, Some(InputTransform::DigitsOnly));

        assert_eq!(fields[1].transform, Some(InputTransform::Identity));
        assert_eq!(fields[2].label, "OTP");
        assert_eq!(fields[2].transform, Some(InputTransform::DigitsOnly));
        assert_eq!(fields[3].input_type, "checkbox");
        assert_eq!(fields[3].label, "");
    }

    #[test]
    fn test_extract_select_options() {
        let fields = extract_fields(STEP_TWO).unwrap();
        let org = fields.iter().find(|f| f.name == "orgType").unwrap();
        assert_eq!(org.kind, FieldKind::Select);
        assert_eq!(org.input_type, "select");
        assert_eq!(org.transform, Some(InputTransform::Identity));
        assert_eq!(org.options.len(), 3);
        assert_eq!(org.options[1].value, "1");
        assert_eq!(org.options[2].value, "2. Hindu Undivided Family");
    }

    #[test]
    fn test_build_schema_adds_known_rules() {
        let schema = build_schema(
            &[STEP_ONE.to_string(), STEP_TWO.to_string()],
            "https://udyamregistration.gov.in/UdyamRegistration.aspx",
        )
        .unwrap();
        assert_eq!(schema.steps.len(), 2);
        assert_eq!(schema.steps[0].title, STEP_TITLES[0]);
        assert_eq!(schema.field("aadhaarNumber").unwrap().pattern.as_deref(), Some(AADHAAR_PATTERN));
        assert_eq!(schema.field("panNumber").unwrap().pattern.as_deref(), Some(PAN_PATTERN));
        assert_eq!(schema.step_of("aadhaarNumber"), Some(0));
        assert_eq!(schema.steps[1].fields.len(), 3);
        assert!(schema.field("empty").is_none());
        assert!(schema.generated_at.is_some());
    }

    #[test]
    fn test_page_pattern_is_kept() {
        let html = r#"<input id="aadhaar" name="aadhaar" pattern="^[0-9]{12}$" />"#;
        let schema = build_schema(&[html.to_string()], "file").unwrap();
        assert_eq!(schema.steps[0].fields[0].pattern.as_deref(), Some("^[0-9]{12}$"));
    }

    #[test]
    fn test_identical_snapshots_collapse() {
        let schema = build_schema(&[STEP_ONE.to_string(), STEP_ONE.to_string()], "file").unwrap();
        assert_eq!(schema.steps.len(), 1);
    }

    #[test]
    fn test_no_fields() {
        assert!(matches!(
            build_schema(&["<p>closed</p>".to_string()], "file"),
            Err(ExtractError::NoFields)
        ));
    }
}
