//! End-to-end enrollment/verification scenarios over the real pipeline,
//! with the cascade detector replaced by a deterministic test localizer.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use facegate_core::detector::{crop_to_canvas, Localizer, LocalizerError};
use facegate_core::FaceTemplate;
use facegate_engine::{
    EngineError, FaceAuthEngine, FileRegistry, MemoryRegistry, StorageError, TemplateRegistry,
    DEFAULT_MATCH_THRESHOLD,
};

/// Treats the whole image as the face, unless the image is a uniform
/// blank canvas, which counts as "no face".
struct WholeImageLocalizer;

impl Localizer for WholeImageLocalizer {
    fn localize(&self, image: &RgbImage) -> Result<RgbImage, LocalizerError> {
        let first = image.pixels().next().ok_or(LocalizerError::NoFaceDetected)?;
        if image.pixels().all(|p| p == first) {
            return Err(LocalizerError::NoFaceDetected);
        }
        Ok(crop_to_canvas(image, 0, 0, image.width(), image.height()))
    }
}

/// Registry double that counts accesses through shared counters.
#[derive(Default)]
struct CountingRegistry {
    inner: MemoryRegistry,
    puts: Arc<AtomicUsize>,
    scans: Arc<AtomicUsize>,
}

impl TemplateRegistry for CountingRegistry {
    fn put(&self, template: &FaceTemplate, preview: Option<&RgbImage>) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(template, preview)
    }

    fn list_all(&self) -> Result<Vec<FaceTemplate>, StorageError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.inner.list_all()
    }
}

fn payload_of(img: &RgbImage) -> String {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(buf.into_inner()))
}

/// Warm-toned two-band capture standing in for person A.
fn image_a() -> RgbImage {
    RgbImage::from_fn(64, 64, |x, _| {
        if x < 32 {
            Rgb([200, 30, 30])
        } else {
            Rgb([170, 60, 40])
        }
    })
}

/// Cool-toned capture standing in for an unrelated person.
fn image_b() -> RgbImage {
    RgbImage::from_fn(64, 64, |x, _| {
        if x < 32 {
            Rgb([30, 40, 200])
        } else {
            Rgb([40, 70, 170])
        }
    })
}

fn file_engine(dir: &TempDir) -> FaceAuthEngine<WholeImageLocalizer, FileRegistry> {
    let registry = FileRegistry::open(dir.path()).unwrap();
    FaceAuthEngine::new(WholeImageLocalizer, registry, DEFAULT_MATCH_THRESHOLD)
}

#[test]
fn enroll_then_verify_same_image_succeeds() {
    let dir = TempDir::new().unwrap();
    let engine = file_engine(&dir);
    let payload = payload_of(&image_a());

    let template = engine.enroll("9990001111", "Asha", &payload).unwrap();
    assert_eq!(template.identifier, "9990001111");
    assert_eq!(template.display_label, "Asha");
    assert_eq!(template.descriptor.len(), facegate_core::DESCRIPTOR_LEN);

    let result = engine.verify(&payload).unwrap();
    assert!(result.matched);
    assert_eq!(result.identifier.as_deref(), Some("9990001111"));
    assert_eq!(result.display_label.as_deref(), Some("Asha"));
    assert!(
        result.confidence >= DEFAULT_MATCH_THRESHOLD,
        "self-similarity was {}",
        result.confidence
    );
}

#[test]
fn unrelated_image_is_never_accepted_as_enrolled_identity() {
    let dir = TempDir::new().unwrap();
    let engine = file_engine(&dir);

    engine
        .enroll("9990001111", "Asha", &payload_of(&image_a()))
        .unwrap();

    match engine.verify(&payload_of(&image_b())) {
        Err(EngineError::NoMatch { confidence }) => {
            assert!(confidence < DEFAULT_MATCH_THRESHOLD);
        }
        Ok(result) => {
            panic!(
                "unrelated capture accepted as {:?} at {}",
                result.identifier, result.confidence
            );
        }
        Err(other) => panic!("unexpected failure: {other}"),
    }
}

#[test]
fn reenrollment_leaves_exactly_one_template() {
    let dir = TempDir::new().unwrap();
    let engine = file_engine(&dir);

    engine
        .enroll("id-7", "First", &payload_of(&image_a()))
        .unwrap();
    engine
        .enroll("id-7", "Second", &payload_of(&image_b()))
        .unwrap();

    let registry = FileRegistry::open(dir.path()).unwrap();
    let all = registry.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].display_label, "Second");
}

#[test]
fn verify_against_empty_registry_is_no_match_with_zero_confidence() {
    let dir = TempDir::new().unwrap();
    let engine = file_engine(&dir);

    match engine.verify(&payload_of(&image_a())) {
        Err(EngineError::NoMatch { confidence }) => assert_eq!(confidence, 0.0),
        other => panic!("expected NoMatch, got {other:?}"),
    }
}

#[test]
fn blank_canvas_fails_before_any_registry_access() {
    let registry = CountingRegistry::default();
    let scans = Arc::clone(&registry.scans);
    let engine = FaceAuthEngine::new(WholeImageLocalizer, registry, DEFAULT_MATCH_THRESHOLD);

    let blank = RgbImage::from_pixel(64, 64, Rgb([255, 255, 255]));
    match engine.verify(&payload_of(&blank)) {
        Err(EngineError::NoFaceDetected) => {}
        other => panic!("expected NoFaceDetected, got {other:?}"),
    }
    assert_eq!(scans.load(Ordering::SeqCst), 0, "registry was scanned");
}

#[test]
fn missing_fields_fail_without_registry_mutation() {
    let registry = CountingRegistry::default();
    let puts = Arc::clone(&registry.puts);
    let engine = FaceAuthEngine::new(WholeImageLocalizer, registry, DEFAULT_MATCH_THRESHOLD);

    match engine.enroll("9990001111", "Asha", "") {
        Err(EngineError::InvalidInput(_)) => {}
        other => panic!("expected InvalidInput, got {other:?}"),
    }
    match engine.enroll("", "Asha", &payload_of(&image_a())) {
        Err(EngineError::InvalidInput(_)) => {}
        other => panic!("expected InvalidInput, got {other:?}"),
    }
    assert_eq!(puts.load(Ordering::SeqCst), 0, "registry was mutated");
}

#[test]
fn status_reports_enrolled_count() {
    let dir = TempDir::new().unwrap();
    let engine = file_engine(&dir);

    assert_eq!(engine.status().enrolled_count, Some(0));
    engine
        .enroll("9990001111", "Asha", &payload_of(&image_a()))
        .unwrap();
    let status = engine.status();
    assert!(status.operational());
    assert_eq!(status.enrolled_count, Some(1));
}
