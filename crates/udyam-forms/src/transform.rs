//! Per-field input transforms

use serde::{Deserialize, Serialize};

/// Normalization applied to raw keyboard input before it is stored.
///
/// Chosen when the schema is authored and carried on the descriptor.
/// Descriptors without one use [`InputTransform::infer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputTransform {
    #[default]
    Identity,
    DigitsOnly,
    Uppercase,
}

impl InputTransform {
    pub fn apply(&self, raw: &str) -> String {
        match self {
            InputTransform::Identity => raw.to_string(),
            InputTransform::DigitsOnly => raw.chars().filter(|c| c.is_ascii_digit()).collect(),
            InputTransform::Uppercase => raw.to_uppercase(),
        }
    }

    /// Pick a transform from a field's name and input type.
    ///
    /// Names containing `name` keep free text; numeric input types and
    /// PIN / Aadhaar / OTP fields keep digits; everything else is uppercased.
    pub fn infer(name: &str, input_type: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("name") {
            return InputTransform::Identity;
        }
        let numeric_type = matches!(input_type, "tel" | "number");
        if numeric_type || ["pin", "aadhaar", "otp"].iter().any(|k| name.contains(k)) {
            InputTransform::DigitsOnly
        } else {
            InputTransform::Uppercase
        }
    }
}
