use serde::{Deserialize, Serialize};

use crate::histogram::DESCRIPTOR_LEN;

/// A persisted unit of identity: one enrolled person's descriptor plus
/// metadata. Field names are camelCase on the wire, matching the JSON
/// records the surrounding web stack consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceTemplate {
    /// Unique, stable per enrolled person (phone number, account handle).
    pub identifier: String,
    /// Human-readable name; not unique.
    pub display_label: String,
    /// 768-value color-histogram descriptor (R‖G‖B, L2-normalized per channel).
    pub descriptor: Vec<f32>,
    /// RFC 3339 UTC enrollment timestamp, set once at creation.
    pub enrolled_at: String,
}

impl FaceTemplate {
    /// Whether the descriptor has the expected shape. Records failing
    /// this are skipped by registry scans.
    pub fn descriptor_valid(&self) -> bool {
        self.descriptor.len() == DESCRIPTOR_LEN && self.descriptor.iter().all(|v| v.is_finite())
    }
}

/// Result of matching a query descriptor against the enrolled gallery.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub matched: bool,
    /// Correlation of the best candidate [-1, 1]; 0.0 for an empty gallery.
    pub confidence: f32,
    /// Identifier of the matched template (if any).
    pub identifier: Option<String>,
    /// Display label of the matched template (if any).
    pub display_label: Option<String>,
}

/// Strategy for comparing a query descriptor against enrolled templates.
pub trait Matcher {
    fn compare(&self, query: &[f32], gallery: &[FaceTemplate], threshold: f32) -> MatchResult;
}

/// Pearson correlation between two equal-length vectors.
///
/// Returns a value in approximately [-1, 1]; higher is more similar.
/// Zero-variance inputs score 0.0. Accumulates in f64 so 768-term sums
/// do not lose precision.
pub fn correlation(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let mean_a = a[..n].iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().map(|&v| v as f64).sum::<f64>() / n as f64;

    let mut cov = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for i in 0..n {
        let da = a[i] as f64 - mean_a;
        let db = b[i] as f64 - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom > 0.0 {
        (cov / denom) as f32
    } else {
        0.0
    }
}

/// Full-scan correlation matcher.
///
/// Every gallery entry is scored; the best survives. Ties keep the
/// first-encountered template in scan order (strict `>` comparison).
pub struct CorrelationMatcher;

impl Matcher for CorrelationMatcher {
    fn compare(&self, query: &[f32], gallery: &[FaceTemplate], threshold: f32) -> MatchResult {
        let mut best_score = f32::NEG_INFINITY;
        let mut best_idx: Option<usize> = None;

        for (i, template) in gallery.iter().enumerate() {
            let score = correlation(query, &template.descriptor);
            if score > best_score {
                best_score = score;
                best_idx = Some(i);
            }
        }

        match best_idx {
            Some(idx) if best_score >= threshold => MatchResult {
                matched: true,
                confidence: best_score,
                identifier: Some(gallery[idx].identifier.clone()),
                display_label: Some(gallery[idx].display_label.clone()),
            },
            _ => MatchResult {
                matched: false,
                confidence: if best_score == f32::NEG_INFINITY {
                    0.0
                } else {
                    best_score
                },
                identifier: None,
                display_label: None,
            },
        }
    }
}
