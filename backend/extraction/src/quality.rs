//! Upload quality assessment.
//!
//! Cheap local heuristics run before any capability call so obviously
//! unusable photos are bounced without spending vision quota: size floors,
//! blank-page and darkness ratios, and Laplacian-variance blur detection.

use image::{GenericImageView, GrayImage};
use serde::{Deserialize, Serialize};

/// Smallest valid PNG is ~67 bytes.
const MIN_IMAGE_BYTES: usize = 67;
const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;
const MIN_DIMENSION: u32 = 300;
/// Luma thresholds for "near white" / "near black" pixels.
const NEAR_WHITE: u8 = 240;
const NEAR_BLACK: u8 = 15;
/// Laplacian variance below this reads as blurred text.
const BLUR_VARIANCE_FLOOR: f64 = 100.0;

/// Outcome of one quality assessment, in the client-facing wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    /// 0..100; issues and warnings both cost points.
    pub score: u8,
    pub recommendations: Vec<String>,
}

impl QualityReport {
    fn rejected(issue: &str, recommendation: &str) -> Self {
        Self {
            is_valid: false,
            issues: vec![issue.to_string()],
            warnings: vec![],
            score: 0,
            recommendations: vec![recommendation.to_string()],
        }
    }
}

/// Assess one uploaded image.
pub fn assess_quality(bytes: &[u8]) -> QualityReport {
    if bytes.len() < MIN_IMAGE_BYTES {
        return QualityReport::rejected(
            "file is too small to be a valid image",
            "upload the original photo rather than a thumbnail",
        );
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return QualityReport::rejected(
            "file exceeds the 20MB upload limit",
            "export the photo at a lower resolution",
        );
    }
    let Ok(img) = image::load_from_memory(bytes) else {
        return QualityReport::rejected(
            "image could not be decoded",
            "re-export the document as PNG or JPEG",
        );
    };

    let mut issues = Vec::new();
    let mut warnings = Vec::new();
    let mut recommendations = Vec::new();
    let mut score: i32 = 100;

    let (width, height) = img.dimensions();
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        warnings.push(format!(
            "low resolution ({width}x{height}); text may be unreadable"
        ));
        recommendations.push("retake the photo closer to the document".to_string());
        score -= 20;
    }

    let gray = img.thumbnail(800, 800).to_luma8();
    let pixel_count = (gray.width() * gray.height()).max(1) as f64;

    let blank_pixels = gray.pixels().filter(|p| p.0[0] > NEAR_WHITE).count() as f64;
    if blank_pixels / pixel_count > 0.95 {
        issues.push("page appears mostly blank".to_string());
        recommendations.push("make sure the document fills the frame".to_string());
    }

    let dark_pixels = gray.pixels().filter(|p| p.0[0] < NEAR_BLACK).count() as f64;
    if dark_pixels / pixel_count > 0.80 {
        issues.push("image is too dark to read".to_string());
        recommendations.push("retake the photo with more light".to_string());
    }

    if laplacian_variance(&gray) < BLUR_VARIANCE_FLOOR {
        warnings.push("image appears blurry".to_string());
        recommendations.push("hold the camera steady and refocus".to_string());
        score -= 30;
    }

    score -= issues.len() as i32 * 40;
    let score = score.clamp(0, 100) as u8;

    QualityReport {
        is_valid: issues.is_empty() && score >= 40,
        issues,
        warnings,
        score,
        recommendations,
    }
}

/// Variance of the 4-neighbour Laplacian. Sharp text produces strong
/// responses at glyph edges; blur flattens them.
fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut count = 0.0;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = gray.get_pixel(x, y)[0] as f64;
            let lap = 4.0 * center
                - gray.get_pixel(x, y - 1)[0] as f64
                - gray.get_pixel(x, y + 1)[0] as f64
                - gray.get_pixel(x - 1, y)[0] as f64
                - gray.get_pixel(x + 1, y)[0] as f64;
            sum += lap;
            sum_sq += lap * lap;
            count += 1.0;
        }
    }
    let mean = sum / count;
    sum_sq / count - mean * mean
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_of(img: image::RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn checkerboard(size: u32) -> Vec<u8> {
        let mut img = image::RgbImage::new(size, size);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let v = if (x / 8 + y / 8) % 2 == 0 { 0 } else { 255 };
            *pixel = image::Rgb([v, v, v]);
        }
        png_of(img)
    }

    #[test]
    fn test_empty_upload_rejected() {
        let report = assess_quality(&[]);
        assert!(!report.is_valid);
        assert_eq!(report.score, 0);
        assert!(!report.issues.is_empty());
    }

    #[test]
    fn test_undecodable_upload_rejected() {
        let report = assess_quality(&[0u8; 1024]);
        assert!(!report.is_valid);
        assert!(report.issues[0].contains("decoded"));
    }

    #[test]
    fn test_sharp_document_passes() {
        let report = assess_quality(&checkerboard(400));
        assert!(report.is_valid, "issues: {:?}", report.issues);
        assert!(report.score >= 80);
    }

    #[test]
    fn test_blank_page_flagged() {
        let img = image::RgbImage::from_pixel(400, 400, image::Rgb([255, 255, 255]));
        let report = assess_quality(&png_of(img));
        assert!(!report.is_valid);
        assert!(report.issues.iter().any(|i| i.contains("blank")));
    }

    #[test]
    fn test_dark_image_flagged() {
        let img = image::RgbImage::from_pixel(400, 400, image::Rgb([5, 5, 5]));
        let report = assess_quality(&png_of(img));
        assert!(!report.is_valid);
        assert!(report.issues.iter().any(|i| i.contains("dark")));
    }

    #[test]
    fn test_low_resolution_warned_not_rejected() {
        let report = assess_quality(&checkerboard(100));
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("resolution")));
        assert!(report.score < 100);
    }
}
