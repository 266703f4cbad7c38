//! 캡처 프레임 모델.

use chrono::{DateTime, Utc};
use image::RgbImage;
use std::time::Instant;

/// 한 틱에서 캡처한 영역 픽셀.
///
/// 생성한 틱이 단독 소유한다. UI에 넘길 때는 참조가 아니라 복사본(프리뷰)을 넘긴다.
#[derive(Debug, Clone)]
pub struct FrameSample {
    /// RGB 픽셀 버퍼
    pub pixels: RgbImage,
    /// 캡처 시각 (벽시계, 텔레메트리용)
    pub captured_at: DateTime<Utc>,
    /// 캡처 시각 (단조 시계, 디바운스 계산용)
    pub captured_instant: Instant,
}

impl FrameSample {
    /// 지금 캡처한 프레임
    pub fn new(pixels: RgbImage) -> Self {
        Self::at(pixels, Instant::now())
    }

    /// 지정된 단조 시각의 프레임 (재생/테스트용)
    pub fn at(pixels: RgbImage, captured_instant: Instant) -> Self {
        Self {
            pixels,
            captured_at: Utc::now(),
            captured_instant,
        }
    }

    /// 단색 프레임 생성
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::new(RgbImage::from_pixel(width, height, image::Rgb(rgb)))
    }

    /// (너비, 높이)
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// 전체 픽셀 수
    pub fn pixel_count(&self) -> u64 {
        let (w, h) = self.dimensions();
        u64::from(w) * u64::from(h)
    }
}
