//! Image heuristic analyzer
//!
//! Pure transforms from pixels to scores. Two independent heuristics:
//! - average-hash fingerprint for duplicate detection
//! - trash-likelihood score (single image) and cleaning diff (image pair)
//!
//! Thresholds are fixed placeholders (see `AnalyzerConfig`), not a trained
//! model. Identical pixels always produce identical output.

pub mod diff;
pub mod fingerprint;
pub mod trash_score;

pub use diff::{assess_cleaning, normalized_diff, CleaningAssessment, LOW_CHANGE_FLAG};
pub use fingerprint::average_hash;
pub use trash_score::{assess_trash, priority_from_severity, trash_scores, TrashAssessment, TrashScores};

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use trashio_common::scoring::{
    AfterAnalysisResponse, BeforeAnalysisResponse, BeforeDecision, CleaningDecision, MODEL_VERSION,
};

use crate::config::AnalyzerConfig;

/// Reason attached to a before-image rejection
pub const NO_TRASH_REASON: &str = "No trash detected";

/// Score a before-image
pub fn analyze_before(image: &DynamicImage, config: &AnalyzerConfig) -> BeforeAnalysisResponse {
    let rgb = image.to_rgb8();
    let scores = trash_scores(&rgb, config);
    let assessment = assess_trash(scores.trash_score, config);

    let (decision, reason) = if assessment.trash_present {
        (BeforeDecision::Approve, None)
    } else {
        (BeforeDecision::Reject, Some(NO_TRASH_REASON.to_string()))
    };

    BeforeAnalysisResponse {
        decision,
        trash_present: assessment.trash_present,
        severity: round4(assessment.severity),
        priority: assessment.priority,
        confidence: round4(assessment.confidence),
        reason,
        image_hash: Some(average_hash(image, config.hash_size)),
        flags: Vec::new(),
        model_version: MODEL_VERSION.to_string(),
    }
}

/// Compare a before/after pair
pub fn analyze_after(
    before: &DynamicImage,
    after: &DynamicImage,
    config: &AnalyzerConfig,
) -> AfterAnalysisResponse {
    let before_rgb = before.to_rgb8();
    let after_rgb = after.to_rgb8();

    let diff_score = normalized_diff(&before_rgb, &after_rgb, config.diff_canvas);
    let after_scores = trash_scores(&after_rgb, config);
    let assessment = assess_cleaning(after_scores.trash_score, diff_score, config);

    AfterAnalysisResponse {
        decision: assessment.decision,
        cleaned: assessment.decision == CleaningDecision::Accept,
        confidence: round4(assessment.confidence),
        before_image_hash: Some(average_hash(before, config.hash_size)),
        after_image_hash: Some(average_hash(after, config.hash_size)),
        diff_score: round4(diff_score),
        after_trash_score: round4(after_scores.trash_score),
        flags: assessment.flags,
        model_version: MODEL_VERSION.to_string(),
    }
}

/// ITU-R 601-2 luma, rounded to the nearest integer
pub(crate) fn grayscale(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000;
        Luma([luma as u8])
    })
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn checkerboard(size: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 { Rgb([10, 10, 10]) } else { Rgb([245, 245, 245]) }
        }))
    }

    fn flat(size: u32, shade: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, Rgb([shade, shade, shade])))
    }

    #[test]
    fn test_cluttered_image_is_approved() {
        let response = analyze_before(&checkerboard(64), &AnalyzerConfig::default());
        assert_eq!(response.decision, BeforeDecision::Approve);
        assert!(response.trash_present);
        assert!(response.reason.is_none());
        assert_eq!(response.image_hash.as_deref().map(str::len), Some(16));
    }

    #[test]
    fn test_plain_image_is_rejected_with_reason() {
        let response = analyze_before(&flat(64, 200), &AnalyzerConfig::default());
        assert_eq!(response.decision, BeforeDecision::Reject);
        assert_eq!(response.reason.as_deref(), Some(NO_TRASH_REASON));
    }

    #[test]
    fn test_clutter_then_clean_ground_is_accepted() {
        let response = analyze_after(&checkerboard(64), &flat(64, 128), &AnalyzerConfig::default());
        assert_eq!(response.decision, CleaningDecision::Accept);
        assert!(response.cleaned);
        assert!(response.flags.is_empty());
    }

    #[test]
    fn test_unchanged_clutter_is_rejected_and_flagged() {
        let image = checkerboard(64);
        let response = analyze_after(&image, &image, &AnalyzerConfig::default());
        assert_eq!(response.decision, CleaningDecision::Reject);
        assert_eq!(response.diff_score, 0.0);
        assert_eq!(response.flags, vec![LOW_CHANGE_FLAG.to_string()]);
        assert_eq!(response.before_image_hash, response.after_image_hash);
    }

    #[test]
    fn test_grayscale_extremes() {
        let rgb = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let gray = grayscale(&rgb);
        assert_eq!(gray.get_pixel(0, 0)[0], 0);
        assert_eq!(gray.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(0.35), 0.35);
    }
}
