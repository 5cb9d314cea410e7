//! Durable template registry — one JSON record per enrolled identifier.
//!
//! Each identifier maps to an independent record file
//! (`<identifier>.json`), so one corrupted record never prevents loading
//! the others: scans skip unreadable records with a warning instead of
//! aborting. Writes go through a temp file in the same directory and an
//! atomic rename, so a reader never observes a torn record and a crash
//! mid-write leaves the previous record intact.
//!
//! The registry is create-only: templates are never updated in place or
//! deleted here. Re-enrollment under the same identifier replaces the
//! whole record, last writer wins. Alongside each record an optional
//! preview JPEG of the enrolled face crop (`<identifier>_face.jpg`) is
//! kept for audit; it is never read back during matching.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use facegate_core::FaceTemplate;
use image::RgbImage;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("identifier {0:?} is not usable as a record name")]
    InvalidIdentifier(String),
    #[error("registry I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persistence seam for enrolled templates.
///
/// Injected into the engine so tests can run against an in-memory double
/// without touching disk.
pub trait TemplateRegistry {
    /// Durably persist a template, replacing any prior template under the
    /// same identifier. `preview` is the enrolled face crop, retained for
    /// audit only.
    fn put(&self, template: &FaceTemplate, preview: Option<&RgbImage>) -> Result<(), StorageError>;

    /// Every readable persisted template. Order is unspecified.
    fn list_all(&self) -> Result<Vec<FaceTemplate>, StorageError>;
}

/// Directory-backed registry.
pub struct FileRegistry {
    dir: PathBuf,
}

impl FileRegistry {
    /// Open (creating if needed) a registry rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{identifier}.json"))
    }

    fn preview_path(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{identifier}_face.jpg"))
    }
}

impl TemplateRegistry for FileRegistry {
    fn put(&self, template: &FaceTemplate, preview: Option<&RgbImage>) -> Result<(), StorageError> {
        validate_identifier(&template.identifier)?;

        let path = self.record_path(&template.identifier);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&serde_json::to_vec(template)?)?;
        tmp.as_file().sync_all()?;
        let file = tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = file.metadata()?.permissions();
            perms.set_mode(0o600);
            file.set_permissions(perms)?;
        }
        #[cfg(not(unix))]
        drop(file);

        // Preview is audit-only; losing it must not fail the enrollment.
        if let Some(crop) = preview {
            let preview_path = self.preview_path(&template.identifier);
            if let Err(err) = crop.save(&preview_path) {
                tracing::warn!(
                    path = %preview_path.display(),
                    error = %err,
                    "failed to write preview image"
                );
            }
        }

        tracing::debug!(
            identifier = %template.identifier,
            path = %path.display(),
            "template record written"
        );
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<FaceTemplate>, StorageError> {
        let mut templates = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            // A single unreadable record must not abort the whole scan.
            let template = match fs::read(&path)
                .map_err(StorageError::Io)
                .and_then(|bytes| Ok(serde_json::from_slice::<FaceTemplate>(&bytes)?))
            {
                Ok(t) => t,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable record");
                    continue;
                }
            };

            if !template.descriptor_valid() {
                tracing::warn!(
                    path = %path.display(),
                    len = template.descriptor.len(),
                    "skipping record with malformed descriptor"
                );
                continue;
            }

            templates.push(template);
        }

        Ok(templates)
    }
}

/// In-memory registry double.
#[derive(Default)]
pub struct MemoryRegistry {
    templates: std::sync::Mutex<std::collections::HashMap<String, FaceTemplate>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateRegistry for MemoryRegistry {
    fn put(&self, template: &FaceTemplate, _preview: Option<&RgbImage>) -> Result<(), StorageError> {
        validate_identifier(&template.identifier)?;
        self.templates
            .lock()
            .unwrap()
            .insert(template.identifier.clone(), template.clone());
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<FaceTemplate>, StorageError> {
        Ok(self.templates.lock().unwrap().values().cloned().collect())
    }
}

/// Identifiers become file stems; reject anything that could escape the
/// registry directory.
fn validate_identifier(identifier: &str) -> Result<(), StorageError> {
    let ok = !identifier.is_empty()
        && identifier != "."
        && identifier != ".."
        && !identifier
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '\0'));
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidIdentifier(identifier.to_string()))
    }
}
