//! Trash-likelihood scoring of a single image
//!
//! Visual clutter shows up as strong local edges and a wide spread of
//! intensities. The score mixes the mean edge response (weight 0.7) with the
//! grayscale standard deviation (weight 0.3), each normalised to [0, 1], and
//! clamps the sum to 1.0.

use image::{GrayImage, Luma, RgbImage};
use trashio_common::scoring::Priority;

use super::grayscale;
use crate::config::AnalyzerConfig;

/// Raw scores for one image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrashScores {
    pub trash_score: f64,
    pub edge_mean: f64,
    pub grayscale_std: f64,
}

/// Decision-ready view of a trash score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrashAssessment {
    pub trash_present: bool,
    pub severity: f64,
    pub priority: Priority,
    pub confidence: f64,
}

pub fn trash_scores(image: &RgbImage, config: &AnalyzerConfig) -> TrashScores {
    let gray = grayscale(image);
    let edges = edge_response(&gray);

    let (edge_mean, _) = mean_and_std(&edges);
    let (_, grayscale_std) = mean_and_std(&gray);

    let trash_score = ((edge_mean / 255.0) * config.edge_weight
        + (grayscale_std / 128.0) * config.contrast_weight)
        .min(1.0);

    TrashScores {
        trash_score,
        edge_mean,
        grayscale_std,
    }
}

/// Threshold a score: trash is present at or above the threshold
///
/// Confidence grows with distance from the boundary and is capped at 0.99.
pub fn assess_trash(score: f64, config: &AnalyzerConfig) -> TrashAssessment {
    let trash_present = score >= config.trash_threshold;
    let confidence = (0.55 + (score - config.trash_threshold).abs()).min(0.99);

    TrashAssessment {
        trash_present,
        severity: score,
        priority: priority_from_severity(score, config),
        confidence,
    }
}

pub fn priority_from_severity(severity: f64, config: &AnalyzerConfig) -> Priority {
    if severity >= config.high_severity {
        Priority::High
    } else if severity >= config.medium_severity {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// 3×3 edge filter: centre weight 8, neighbours -1, clamped to [0, 255]
///
/// Border pixels keep their source value.
fn edge_response(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut out = gray.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = 8 * i32::from(gray.get_pixel(x, y)[0]);
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    if nx != x || ny != y {
                        acc -= i32::from(gray.get_pixel(nx, ny)[0]);
                    }
                }
            }
            out.put_pixel(x, y, Luma([acc.clamp(0, 255) as u8]));
        }
    }

    out
}

/// Mean and population standard deviation of a grayscale image
fn mean_and_std(gray: &GrayImage) -> (f64, f64) {
    let count = (gray.width() as u64 * gray.height() as u64) as f64;
    if count == 0.0 {
        return (0.0, 0.0);
    }

    let (sum, sum_sq) = gray.pixels().fold((0.0f64, 0.0f64), |(s, sq), p| {
        let v = f64::from(p[0]);
        (s + v, sq + v * v)
    });

    let mean = sum / count;
    let variance = (sum_sq / count - mean * mean).max(0.0);
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn config() -> AnalyzerConfig {
        AnalyzerConfig::default()
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(assess_trash(0.35, &config()).trash_present);
        assert!(!assess_trash(0.349999, &config()).trash_present);
    }

    #[test]
    fn test_confidence_grows_away_from_boundary() {
        let at_boundary = assess_trash(0.35, &config()).confidence;
        let far = assess_trash(0.9, &config()).confidence;
        assert!((at_boundary - 0.55).abs() < 1e-9);
        assert!(far > at_boundary);
        assert!(assess_trash(1.0, &config()).confidence <= 0.99);
    }

    #[test]
    fn test_priority_buckets() {
        let c = config();
        assert_eq!(priority_from_severity(0.7, &c), Priority::High);
        assert_eq!(priority_from_severity(0.69, &c), Priority::Medium);
        assert_eq!(priority_from_severity(0.45, &c), Priority::Medium);
        assert_eq!(priority_from_severity(0.44, &c), Priority::Low);
    }

    #[test]
    fn test_flat_image_scores_zero() {
        let flat = RgbImage::from_pixel(40, 40, Rgb([128, 128, 128]));
        let scores = trash_scores(&flat, &config());
        // interior edge response is 0; only the copied border contributes
        assert_eq!(scores.grayscale_std, 0.0);
        assert!(scores.trash_score < 0.35);
    }

    #[test]
    fn test_checkerboard_scores_high() {
        let noisy = RgbImage::from_fn(40, 40, |x, y| {
            if (x + y) % 2 == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let scores = trash_scores(&noisy, &config());
        assert!(scores.trash_score >= 0.35, "score was {}", scores.trash_score);
        assert!(scores.trash_score <= 1.0);
    }

    #[test]
    fn test_edge_response_keeps_border() {
        let gray = GrayImage::from_fn(5, 5, |x, _| Luma([(x * 50) as u8]));
        let edges = edge_response(&gray);
        assert_eq!(edges.get_pixel(0, 2)[0], 0);
        assert_eq!(edges.get_pixel(4, 2)[0], 200);
        // linear ramp has no second derivative inside
        assert_eq!(edges.get_pixel(2, 2)[0], 0);
    }
}
