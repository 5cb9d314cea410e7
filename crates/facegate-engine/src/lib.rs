//! facegate-engine — Enrollment and verification orchestration.
//!
//! Composes the facegate-core pipeline (decode → localize → extract) with
//! a durable file-backed template registry and the correlation matcher.
//! Every call is stateless; the registry on disk is the single source of
//! truth and is re-read by each verification.

pub mod config;
pub mod engine;
pub mod registry;
pub mod response;

pub use config::Config;
pub use engine::{EngineError, EngineStatus, FaceAuthEngine, DEFAULT_MATCH_THRESHOLD};
pub use registry::{FileRegistry, MemoryRegistry, StorageError, TemplateRegistry};
pub use response::{EnrollResponse, StatusResponse, VerifyResponse};
