use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ApiError;

/// Every backend response: `{success, error?, ...payload}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Envelope {
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_slice(body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// Decodes the payload fields regardless of `success`.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// Decodes the payload of a successful response, or turns `success: false`
    /// into a server error carrying the server's message.
    pub fn into_payload<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Server {
                message: self.error.unwrap_or_default(),
            });
        }
        serde_json::from_value(Value::Object(self.fields))
            .map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadAck {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessStarted {
    pub before_report: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessingStatus {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub after_report: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportStatus {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub insight_report: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportPayload {
    pub report: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnsPayload {
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VisualizeAck {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VisualizationStatus {
    #[serde(default)]
    pub image_url: Option<String>,
}
