use crate::validation::{
    required_number, validate_behavioral_features, whole_number, ValidationDetails,
};
use chrono::{DateTime, Utc};
use risk_engine::features::{feature_index, feature_name, FEATURE_COUNT};
use risk_engine::{BehavioralFeatures, TransactionInput};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

// ===== Users =====
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

// ===== Auth =====
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialsRequest {
    /// Normalized (email, password); None when either is missing or empty
    pub fn normalized(&self) -> Option<(String, &str)> {
        let email = self.email.as_deref()?.trim().to_lowercase();
        let password = self.password.as_deref()?;

        if email.is_empty() || password.is_empty() {
            return None;
        }

        Some((email, password))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

// ===== Heuristic Prediction =====
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub transaction: Option<Value>,
}

/// Transaction payload as accepted over HTTP, before scoring
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransactionPayload {
    #[validate(range(min = 0.0, message = "Number must be greater than or equal to 0"))]
    pub amount: f64,

    #[serde(default)]
    pub time: Option<f64>,

    #[serde(default)]
    pub card_present: Option<bool>,

    #[serde(default)]
    pub country_mismatch: Option<bool>,

    #[serde(default)]
    pub velocity_5m: Option<f64>,

    #[serde(default)]
    #[validate(custom = "validate_behavioral_features")]
    pub v: Option<BTreeMap<String, Value>>,
}

impl TransactionPayload {
    /// Parse and validate the `transaction` field of a predict request
    pub fn parse(raw: Option<Value>) -> Result<Self, ValidationDetails> {
        let raw = raw.ok_or_else(|| {
            let mut details = ValidationDetails::default();
            details.form_errors.push("Required".to_string());
            details
        })?;

        let payload: TransactionPayload = serde_json::from_value(raw)
            .map_err(|e| ValidationDetails::form(e.to_string()))?;

        let mut details = match payload.validate() {
            Ok(()) => ValidationDetails::default(),
            Err(e) => ValidationDetails::from(&e),
        };
        whole_number("time", payload.time, &mut details);
        whole_number("velocity_5m", payload.velocity_5m, &mut details);

        if details.is_empty() {
            Ok(payload)
        } else {
            Err(details)
        }
    }
}

impl From<TransactionPayload> for TransactionInput {
    fn from(payload: TransactionPayload) -> Self {
        TransactionInput {
            amount: payload.amount,
            // Whole and non-negative once validated; casts saturate
            time: payload.time.map(|t| t as u64),
            card_present: payload.card_present,
            country_mismatch: payload.country_mismatch,
            velocity_5m: payload.velocity_5m.map(|count| count as u32),
            v: payload.v.map(|features| {
                features
                    .iter()
                    .filter_map(|(name, value)| value.as_f64().map(|v| (name.as_str(), v)))
                    .collect::<BehavioralFeatures>()
            }),
        }
    }
}

// ===== Model Service Proxy =====
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelPredictRequest {
    #[serde(default)]
    pub features: Option<Value>,
}

/// Full feature vector forwarded to the model service
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFeatures {
    pub time: f64,
    pub amount: f64,
    pub v: [f64; FEATURE_COUNT],
}

impl ModelFeatures {
    /// Require `Time`, `Amount` and `V1..V28`, all finite, `Amount >= 0`
    pub fn parse(raw: Option<Value>) -> Result<Self, ValidationDetails> {
        let raw = raw.unwrap_or(Value::Null);
        let object = raw.as_object().ok_or_else(|| {
            ValidationDetails::form(format!("Expected object, received {}", kind_of(&raw)))
        })?;

        let mut details = ValidationDetails::default();

        let time = required_number(object, "Time", &mut details);
        let amount = required_number(object, "Amount", &mut details);
        if matches!(amount, Some(a) if a < 0.0) {
            details.add_field("Amount", "Number must be greater than or equal to 0");
        }

        let mut v = [0.0; FEATURE_COUNT];
        for (index, slot) in v.iter_mut().enumerate() {
            if let Some(value) = required_number(object, &feature_name(index + 1), &mut details) {
                *slot = value;
            }
        }

        match (time, amount) {
            (Some(time), Some(amount)) if details.is_empty() => {
                Ok(ModelFeatures { time, amount, v })
            }
            _ => Err(details),
        }
    }

    pub fn feature(&self, name: &str) -> Option<f64> {
        match name {
            "Time" => Some(self.time),
            "Amount" => Some(self.amount),
            _ => feature_index(name).map(|index| self.v[index - 1]),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "undefined",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Object(_) => "object",
    }
}

impl Serialize for ModelFeatures {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT + 2))?;
        map.serialize_entry("Time", &self.time)?;
        map.serialize_entry("Amount", &self.amount)?;
        for (index, value) in self.v.iter().enumerate() {
            map.serialize_entry(&feature_name(index + 1), value)?;
        }
        map.end()
    }
}

// ===== Analysis History =====
#[derive(Debug, Clone, FromRow)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub input_json: Value,
    pub result_json: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub input: Value,
    pub result: Value,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<AnalysisRecord> for AnalysisResponse {
    fn from(record: AnalysisRecord) -> Self {
        AnalysisResponse {
            id: record.id,
            user_id: record.user_id,
            input: record.input_json,
            result: record.result_json,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysesResponse {
    pub analyses: Vec<AnalysisResponse>,
}

// ===== Health Check =====
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}
