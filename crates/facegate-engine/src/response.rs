//! Wire-level response shapes for the external web layer.
//!
//! The engine's `Result`s are translated here into flat success/message
//! structures (camelCase, matching the JSON the surrounding stack
//! serves). Nothing in this module can fail; every engine error becomes a
//! structured response.

use serde::Serialize;

use facegate_core::{FaceTemplate, MatchResult};

use crate::engine::{EngineError, EngineStatus};

const MSG_ENROLLED: &str = "Face registered successfully";
const MSG_RECOGNIZED: &str = "Face recognized successfully";
const MSG_NOT_RECOGNIZED: &str =
    "Face not recognized. Please try again or use another login method.";
const MSG_NO_FACE: &str = "No face detected. Please ensure your face is clearly visible.";
const MSG_BAD_IMAGE: &str = "Invalid image data";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_label: Option<String>,
}

impl EnrollResponse {
    pub fn from_result(result: &Result<FaceTemplate, EngineError>) -> Self {
        match result {
            Ok(template) => Self {
                success: true,
                message: MSG_ENROLLED.to_string(),
                display_label: Some(template.display_label.clone()),
            },
            Err(err) => Self {
                success: false,
                message: failure_message(err),
                display_label: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_label: Option<String>,
    /// Best correlation score; present on success and on a
    /// below-threshold rejection (diagnostic), absent otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl VerifyResponse {
    pub fn from_result(result: &Result<MatchResult, EngineError>) -> Self {
        match result {
            Ok(matched) => Self {
                success: true,
                message: MSG_RECOGNIZED.to_string(),
                identifier: matched.identifier.clone(),
                display_label: matched.display_label.clone(),
                confidence: Some(matched.confidence),
            },
            Err(EngineError::NoMatch { confidence }) => Self {
                success: false,
                message: MSG_NOT_RECOGNIZED.to_string(),
                identifier: None,
                display_label: None,
                confidence: Some(confidence.max(0.0)),
            },
            Err(err) => Self {
                success: false,
                message: failure_message(err),
                identifier: None,
                display_label: None,
                confidence: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled_count: Option<usize>,
}

impl StatusResponse {
    pub fn from_status(status: &EngineStatus) -> Self {
        if status.operational() {
            Self {
                status: "ok",
                message: "Face recognition engine is running".to_string(),
                enrolled_count: status.enrolled_count,
            }
        } else {
            Self {
                status: "degraded",
                message: "Template registry is unreachable".to_string(),
                enrolled_count: None,
            }
        }
    }
}

fn failure_message(err: &EngineError) -> String {
    match err {
        EngineError::InvalidInput(msg) => (*msg).to_string(),
        EngineError::Decode(_) => MSG_BAD_IMAGE.to_string(),
        EngineError::NoFaceDetected => MSG_NO_FACE.to_string(),
        EngineError::NoMatch { .. } => MSG_NOT_RECOGNIZED.to_string(),
        EngineError::Localizer(_) | EngineError::Storage(_) => err.to_string(),
    }
}
