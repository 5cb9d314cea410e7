//! Enrollment/verification orchestrator.
//!
//! Two linear pipelines over the core stages, no retries, no partial
//! state: a failed stage is the final answer for that request, since the
//! same bytes would fail the same way again.
//!
//! Concurrency: calls are synchronous and independent. Two enrollments
//! for the same identifier race last-writer-wins; the registry's atomic
//! record replacement keeps every observable record intact, which is the
//! only guarantee made. A verify scan running alongside an enrollment may
//! or may not see the new template; that is accepted, not an error.

use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use facegate_core::decode::{self, DecodeError};
use facegate_core::{
    extract_descriptor, CorrelationMatcher, FaceTemplate, Localizer, LocalizerError, MatchResult,
    Matcher,
};

use crate::registry::{StorageError, TemplateRegistry};

/// Minimum correlation for a verification to be accepted.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.75;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("image decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("no face detected")]
    NoFaceDetected,
    #[error("face localizer unavailable: {0}")]
    Localizer(LocalizerError),
    #[error("face not recognized (best score {confidence:.3})")]
    NoMatch { confidence: f32 },
    #[error("template storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl From<LocalizerError> for EngineError {
    fn from(err: LocalizerError) -> Self {
        match err {
            LocalizerError::NoFaceDetected => EngineError::NoFaceDetected,
            other => EngineError::Localizer(other),
        }
    }
}

impl EngineError {
    /// HTTP-style status for the external web layer: bad input is 400,
    /// an unrecognized face is 401, subsystem failures are 500.
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::InvalidInput(_)
            | EngineError::Decode(_)
            | EngineError::NoFaceDetected => 400,
            EngineError::NoMatch { .. } => 401,
            EngineError::Localizer(_) | EngineError::Storage(_) => 500,
        }
    }
}

/// Liveness snapshot for the status probe.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    /// The cascade model loaded (construction would have failed otherwise).
    pub model_loaded: bool,
    /// The registry answered a scan.
    pub registry_reachable: bool,
    /// Enrolled templates at probe time; `None` when the scan failed.
    pub enrolled_count: Option<usize>,
}

impl EngineStatus {
    pub fn operational(&self) -> bool {
        self.model_loaded && self.registry_reachable
    }
}

/// Face authentication engine: enroll and verify over an injected
/// localizer and registry.
pub struct FaceAuthEngine<L: Localizer, R: TemplateRegistry> {
    localizer: L,
    registry: R,
    threshold: f32,
}

impl<L: Localizer, R: TemplateRegistry> FaceAuthEngine<L, R> {
    pub fn new(localizer: L, registry: R, threshold: f32) -> Self {
        Self {
            localizer,
            registry,
            threshold,
        }
    }

    /// Enroll `identifier` from a base64 image payload.
    ///
    /// Decode → localize → extract → persist. Any stage failure aborts;
    /// no partial template is ever written. Re-enrollment replaces the
    /// prior template.
    pub fn enroll(
        &self,
        identifier: &str,
        display_label: &str,
        payload: &str,
    ) -> Result<FaceTemplate, EngineError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(EngineError::InvalidInput("identifier is required"));
        }
        if payload.trim().is_empty() {
            return Err(EngineError::InvalidInput("image payload is required"));
        }
        let display_label = match display_label.trim() {
            "" => "User",
            label => label,
        };

        let image = decode::decode_payload(payload)?;
        let crop = self.localizer.localize(&image)?;
        let descriptor = extract_descriptor(&crop);

        let template = FaceTemplate {
            identifier: identifier.to_string(),
            display_label: display_label.to_string(),
            descriptor,
            enrolled_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        self.registry.put(&template, Some(&crop))?;

        tracing::info!(identifier, label = display_label, "face enrolled");
        Ok(template)
    }

    /// Verify a base64 image payload against every enrolled template.
    ///
    /// Decode → localize → extract → full registry scan → correlation
    /// match. A best score below the acceptance threshold (or an empty
    /// registry) is `NoMatch`, carrying the best score as diagnostic
    /// confidence.
    pub fn verify(&self, payload: &str) -> Result<MatchResult, EngineError> {
        if payload.trim().is_empty() {
            return Err(EngineError::InvalidInput("image payload is required"));
        }

        let image = decode::decode_payload(payload)?;
        let crop = self.localizer.localize(&image)?;
        let descriptor = extract_descriptor(&crop);

        let gallery = self.registry.list_all()?;
        let result = CorrelationMatcher.compare(&descriptor, &gallery, self.threshold);

        if result.matched {
            tracing::info!(
                identifier = result.identifier.as_deref().unwrap_or(""),
                confidence = result.confidence,
                "face recognized"
            );
            Ok(result)
        } else {
            tracing::info!(
                confidence = result.confidence,
                enrolled = gallery.len(),
                "face not recognized"
            );
            Err(EngineError::NoMatch {
                confidence: result.confidence,
            })
        }
    }

    /// Liveness probe: the model is loaded and the registry answers.
    pub fn status(&self) -> EngineStatus {
        match self.registry.list_all() {
            Ok(templates) => EngineStatus {
                model_loaded: true,
                registry_reachable: true,
                enrolled_count: Some(templates.len()),
            },
            Err(err) => {
                tracing::warn!(error = %err, "status probe: registry scan failed");
                EngineStatus {
                    model_loaded: true,
                    registry_reachable: false,
                    enrolled_count: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(EngineError::InvalidInput("x").status_code(), 400);
        assert_eq!(EngineError::NoFaceDetected.status_code(), 400);
        assert_eq!(EngineError::NoMatch { confidence: 0.2 }.status_code(), 401);
        assert_eq!(
            EngineError::Localizer(LocalizerError::ModelNotFound("m".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_localizer_error_mapping() {
        assert!(matches!(
            EngineError::from(LocalizerError::NoFaceDetected),
            EngineError::NoFaceDetected
        ));
        assert!(matches!(
            EngineError::from(LocalizerError::ModelLoad("bad".into())),
            EngineError::Localizer(_)
        ));
    }

    #[test]
    fn test_status_operational() {
        let status = EngineStatus {
            model_loaded: true,
            registry_reachable: true,
            enrolled_count: Some(3),
        };
        assert!(status.operational());

        let degraded = EngineStatus {
            model_loaded: true,
            registry_reachable: false,
            enrolled_count: None,
        };
        assert!(!degraded.operational());
    }
}
