//! Request validation and the flattened error shape returned to clients
//!
//! Details are reported as `{"formErrors": [...], "fieldErrors": {field: [...]}}`.

use crate::errors::ApiError;
use actix_web::{error::JsonPayloadError, HttpRequest};
use risk_engine::features::feature_index;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationDetails {
    #[serde(rename = "formErrors")]
    pub form_errors: Vec<String>,
    #[serde(rename = "fieldErrors")]
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationDetails {
    pub fn form(message: impl Into<String>) -> Self {
        Self {
            form_errors: vec![message.into()],
            field_errors: BTreeMap::new(),
        }
    }

    pub fn add_field(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }
}

impl From<&ValidationErrors> for ValidationDetails {
    fn from(errors: &ValidationErrors) -> Self {
        let mut details = ValidationDetails::default();
        collect(&mut details, None, errors);
        details
    }
}

fn collect(details: &mut ValidationDetails, prefix: Option<&str>, errors: &ValidationErrors) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field),
            None => field.to_string(),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for err in field_errors {
                    details.add_field(path.clone(), message_of(err));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(details, Some(&path), nested),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(details, Some(&format!("{}[{}]", path, index)), nested);
                }
            }
        }
    }
}

fn message_of(err: &ValidationError) -> String {
    err.message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.code.to_string())
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Optional counts must be non-negative whole numbers when present
///
/// JSON does not distinguish `3` from `3.0`, so both are accepted.
pub fn whole_number(field: &str, value: Option<f64>, details: &mut ValidationDetails) {
    let Some(value) = value else {
        return;
    };

    if !value.is_finite() || value.fract() != 0.0 {
        details.add_field(field, "Expected integer, received float");
    } else if value < 0.0 {
        details.add_field(field, "Number must be greater than or equal to 0");
    }
}

/// `V1..V28` entries must be finite numbers; other keys are ignored
pub fn validate_behavioral_features(
    features: &BTreeMap<String, Value>,
) -> Result<(), ValidationError> {
    for (name, value) in features {
        if feature_index(name).is_none() {
            continue;
        }

        if value.as_f64().map_or(true, |v| !v.is_finite()) {
            let mut err = ValidationError::new("invalid_type");
            err.message = Some(Cow::Owned(format!(
                "{}: expected number, received {}",
                name,
                describe(value)
            )));
            return Err(err);
        }
    }

    Ok(())
}

/// Read a required finite number out of a JSON object
pub fn required_number(
    object: &serde_json::Map<String, Value>,
    field: &str,
    details: &mut ValidationDetails,
) -> Option<f64> {
    match object.get(field) {
        None => {
            details.add_field(field, "Required");
            None
        }
        Some(value) => match value.as_f64() {
            Some(number) if number.is_finite() => Some(number),
            _ => {
                details.add_field(
                    field,
                    format!("Expected number, received {}", describe(value)),
                );
                None
            }
        },
    }
}

/// Turn body deserialization failures into a structured 400
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::InvalidPayload(ValidationDetails::form(err.to_string())).into()
}
