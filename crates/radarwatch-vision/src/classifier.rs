//! 픽셀 분류기.
//!
//! 캡처 프레임의 각 픽셀을 흰색/파란색 밴드로 분류하고 대비를 측정한다.
//! 순수 함수: 같은 프레임과 임계값이면 항상 같은 결과를 낸다.

use image::{GrayImage, Luma, RgbImage};
use radarwatch_core::models::detection::ClassificationResult;
use radarwatch_core::models::frame::FrameSample;
use radarwatch_core::models::thresholds::ThresholdConfig;

/// 어두운 픽셀 판정 채널 상한 (모든 채널이 이 값 미만)
pub const DARK_CHANNEL_LIMIT: u8 = 10;

/// 흰색/파란색 소속 마스크 (UI 오버레이용). 소속 픽셀은 255, 아니면 0.
#[derive(Debug, Clone)]
pub struct ClassMasks {
    /// 흰색 밴드 마스크
    pub white: GrayImage,
    /// 파란색 밴드 마스크
    pub blue: GrayImage,
}

/// 픽셀 판정 기준 (채널 값 단위로 미리 계산)
#[derive(Debug, Clone, Copy)]
struct Bands {
    brightness_floor: f64,
    blue_margin: f64,
}

impl Bands {
    fn from_config(cfg: &ThresholdConfig) -> Self {
        Self {
            brightness_floor: cfg.brightness_floor(),
            blue_margin: cfg.blue_margin(),
        }
    }

    #[inline]
    fn is_white(&self, r: u8, g: u8, b: u8) -> bool {
        f64::from(r.min(g).min(b)) >= self.brightness_floor
    }

    #[inline]
    fn is_blue(&self, r: u8, g: u8, b: u8) -> bool {
        let rg_max = r.max(g);
        b > rg_max && f64::from(b - rg_max) >= self.blue_margin
    }
}

/// 프레임 분류
pub fn classify(frame: &FrameSample, cfg: &ThresholdConfig) -> ClassificationResult {
    classify_pixels(&frame.pixels, cfg)
}

/// RGB 버퍼 분류
pub fn classify_pixels(pixels: &RgbImage, cfg: &ThresholdConfig) -> ClassificationResult {
    let raw = pixels.as_raw();
    if raw.len() < 3 {
        return ClassificationResult::empty();
    }

    let bands = Bands::from_config(cfg);
    let mut white_pixels: u64 = 0;
    let mut blue_pixels: u64 = 0;
    let mut dark_pixels: u64 = 0;
    let mut total_pixels: u64 = 0;
    let mut channel_min = u8::MAX;
    let mut channel_max = u8::MIN;

    for px in raw.chunks_exact(3) {
        let (r, g, b) = (px[0], px[1], px[2]);
        total_pixels += 1;

        if bands.is_white(r, g, b) {
            white_pixels += 1;
        }
        if bands.is_blue(r, g, b) {
            blue_pixels += 1;
        }
        if r < DARK_CHANNEL_LIMIT && g < DARK_CHANNEL_LIMIT && b < DARK_CHANNEL_LIMIT {
            dark_pixels += 1;
        }

        channel_min = channel_min.min(r).min(g).min(b);
        channel_max = channel_max.max(r).max(g).max(b);
    }

    let total = total_pixels as f64;
    let contrast = channel_max - channel_min;

    ClassificationResult {
        white_ratio: white_pixels as f64 / total,
        blue_ratio: blue_pixels as f64 / total,
        contrast_ok: f64::from(contrast) >= cfg.contrast_floor(),
        white_pixels,
        blue_pixels,
        total_pixels,
        contrast,
        dark_ratio: dark_pixels as f64 / total,
    }
}

/// 흰색/파란색 소속 마스크 생성
pub fn classify_masks(frame: &FrameSample, cfg: &ThresholdConfig) -> ClassMasks {
    let (width, height) = frame.dimensions();
    let bands = Bands::from_config(cfg);
    let mut white = GrayImage::new(width, height);
    let mut blue = GrayImage::new(width, height);

    for (x, y, px) in frame.pixels.enumerate_pixels() {
        let [r, g, b] = px.0;
        if bands.is_white(r, g, b) {
            white.put_pixel(x, y, Luma([u8::MAX]));
        }
        if bands.is_blue(r, g, b) {
            blue.put_pixel(x, y, Luma([u8::MAX]));
        }
    }

    ClassMasks { white, blue }
}
