//! Before/after cleaning comparison

use image::imageops::{self, FilterType};
use image::RgbImage;
use trashio_common::scoring::CleaningDecision;

use crate::config::AnalyzerConfig;

pub const LOW_CHANGE_FLAG: &str = "low_change_detected";

/// Outcome of comparing a before/after pair
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningAssessment {
    pub decision: CleaningDecision,
    pub confidence: f64,
    pub flags: Vec<String>,
}

/// Mean absolute per-channel difference on a fixed canvas, in [0, 1]
pub fn normalized_diff(before: &RgbImage, after: &RgbImage, canvas: u32) -> f64 {
    let before = imageops::resize(before, canvas, canvas, FilterType::CatmullRom);
    let after = imageops::resize(after, canvas, canvas, FilterType::CatmullRom);

    let mut channel_sums = [0u64; 3];
    for (b, a) in before.pixels().zip(after.pixels()) {
        for (channel, sum) in channel_sums.iter_mut().enumerate() {
            *sum += u64::from(b[channel].abs_diff(a[channel]));
        }
    }

    let pixels = f64::from(canvas) * f64::from(canvas);
    let channel_means: f64 = channel_sums.iter().map(|&s| s as f64 / pixels).sum();
    (channel_means / (255.0 * 3.0)).min(1.0)
}

/// Decide whether a cleaning is accepted
///
/// A low after-score alone is not enough: the scene must also have changed.
/// The after-score gate dominates a large diff.
pub fn assess_cleaning(after_score: f64, diff: f64, config: &AnalyzerConfig) -> CleaningAssessment {
    let mut flags = Vec::new();
    if diff < config.low_change_threshold {
        flags.push(LOW_CHANGE_FLAG.to_string());
    }

    let (decision, confidence) =
        if after_score < config.accept_max_after_score && diff >= config.accept_min_diff {
            (CleaningDecision::Accept, (0.6 + diff).min(0.99))
        } else if after_score < config.reclean_max_after_score {
            (CleaningDecision::Reclean, 0.55)
        } else {
            (CleaningDecision::Reject, 0.7)
        };

    CleaningAssessment {
        decision,
        confidence,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_decision_table() {
        let config = AnalyzerConfig::default();
        assert_eq!(assess_cleaning(0.24, 0.12, &config).decision, CleaningDecision::Accept);
        assert_eq!(assess_cleaning(0.26, 0.12, &config).decision, CleaningDecision::Reclean);
        assert_eq!(assess_cleaning(0.50, 0.99, &config).decision, CleaningDecision::Reject);
    }

    #[test]
    fn test_small_change_is_not_accepted_and_flagged() {
        let config = AnalyzerConfig::default();
        let assessment = assess_cleaning(0.1, 0.05, &config);
        assert_eq!(assessment.decision, CleaningDecision::Reclean);
        assert_eq!(assessment.flags, vec![LOW_CHANGE_FLAG.to_string()]);
    }

    #[test]
    fn test_accept_confidence_is_capped() {
        let config = AnalyzerConfig::default();
        let assessment = assess_cleaning(0.0, 0.9, &config);
        assert_eq!(assessment.confidence, 0.99);
        assert!(assessment.flags.is_empty());
    }

    #[test]
    fn test_identical_images_have_zero_diff() {
        let image = RgbImage::from_fn(50, 30, |x, y| Rgb([x as u8, y as u8, 7]));
        assert_eq!(normalized_diff(&image, &image, 64), 0.0);
    }

    #[test]
    fn test_black_vs_white_is_full_diff() {
        let black = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
        let white = RgbImage::from_pixel(10, 40, Rgb([255, 255, 255]));
        assert!((normalized_diff(&black, &white, 32) - 1.0).abs() < 1e-9);
    }
}
