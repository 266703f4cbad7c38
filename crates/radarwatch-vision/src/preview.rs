//! 텔레메트리 프리뷰 생성.
//!
//! fast_image_resize 기반 고속 리사이즈. 원본 비율을 유지하며 상자 안에 맞춘다.

use fast_image_resize::{images::Image as FirImage, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbImage;
use radarwatch_core::config::PreviewConfig;
use radarwatch_core::error::CoreError;
use tracing::debug;

/// 비율을 유지한 채 `max_width × max_height` 상자에 맞춘 크기
pub fn fit_within(src_w: u32, src_h: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if src_w <= max_width && src_h <= max_height {
        return (src_w, src_h);
    }

    let scale = (f64::from(max_width) / f64::from(src_w))
        .min(f64::from(max_height) / f64::from(src_h));

    let w = ((f64::from(src_w) * scale).round() as u32).clamp(1, max_width);
    let h = ((f64::from(src_h) * scale).round() as u32).clamp(1, max_height);
    (w, h)
}

/// 프리뷰 생성 (상자보다 작으면 복제)
pub fn make_preview(pixels: &RgbImage, config: &PreviewConfig) -> Result<RgbImage, CoreError> {
    let (src_w, src_h) = pixels.dimensions();

    if src_w == 0 || src_h == 0 {
        return Err(CoreError::Internal("소스 이미지 크기 0".to_string()));
    }
    if config.width == 0 || config.height == 0 {
        return Err(CoreError::Internal("프리뷰 크기 0".to_string()));
    }

    let (width, height) = fit_within(src_w, src_h, config.width, config.height);
    if (width, height) == (src_w, src_h) {
        return Ok(pixels.clone());
    }

    let src_image = FirImage::from_vec_u8(src_w, src_h, pixels.as_raw().clone(), PixelType::U8x3)
        .map_err(|e| CoreError::Internal(format!("소스 이미지 생성 실패: {e}")))?;

    let mut dst_image = FirImage::new(width, height, PixelType::U8x3);

    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| CoreError::Internal(format!("리사이즈 실패: {e}")))?;

    debug!("프리뷰 생성: {src_w}x{src_h} → {width}x{height}");

    RgbImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| CoreError::Internal("결과 이미지 생성 실패".to_string()))
}
