//! 영역 품질 점검.
//!
//! 모니터링 시작 전 좌표 점검과 1회 테스트 캡처.
//! 대부분 검은 픽셀이면 좌표가 잘못됐을 가능성이 높다.

use image::RgbImage;
use radarwatch_core::error::CaptureError;
use radarwatch_core::models::detection::ClassificationResult;
use radarwatch_core::models::display::{virtual_bounds, DisplayInfo};
use radarwatch_core::models::region::RegionSpec;
use radarwatch_core::models::thresholds::ThresholdConfig;
use radarwatch_core::ports::capture::CaptureBackend;
use std::sync::Arc;
use tracing::{info, warn};

use crate::capture::RegionCapturer;
use crate::classifier::classify;

/// 검은 픽셀 비율 경고 기준
pub const BLACK_PIXEL_WARNING_RATIO: f64 = 0.95;

/// 테스트 캡처 결과
#[derive(Debug, Clone)]
pub struct RegionProbe {
    /// 점검한 영역
    pub region: RegionSpec,
    /// 캡처된 픽셀 (PNG 저장용)
    pub pixels: RgbImage,
    /// 분류 결과
    pub classification: ClassificationResult,
    /// 검은 픽셀이 기준을 넘었는지
    pub mostly_black: bool,
}

impl RegionProbe {
    /// 검은 픽셀 백분율
    pub fn dark_percent(&self) -> f64 {
        self.classification.dark_ratio * 100.0
    }
}

/// 영역을 온전히 포함하는 디스플레이 찾기
pub fn locate_display<'a>(
    displays: &'a [DisplayInfo],
    region: &RegionSpec,
) -> Option<&'a DisplayInfo> {
    displays.iter().find(|d| d.bounds().contains(region))
}

/// 시작 전 좌표 점검.
///
/// 영역이 가상 화면 밖이면 `OffScreen`, 여러 디스플레이에 걸쳐 있으면 경고만 남긴다.
pub fn check_bounds(displays: &[DisplayInfo], region: &RegionSpec) -> Result<(), CaptureError> {
    let screen = virtual_bounds(displays).ok_or(CaptureError::NoDisplay)?;

    if !screen.contains(region) {
        return Err(CaptureError::OffScreen(format!(
            "{region} 영역이 가상 화면 {screen} 밖"
        )));
    }

    match locate_display(displays, region) {
        Some(target) => {
            info!("감시 영역 {region} → 디스플레이 '{}'", target.name);
        }
        None => {
            warn!("감시 영역 {region}이(가) 여러 디스플레이에 걸쳐 있음, 캡처가 실패할 수 있음");
        }
    }

    Ok(())
}

/// 현재 스레드에서 영역을 1회 캡처해 품질 점검
pub fn probe_region(
    backend: Arc<dyn CaptureBackend>,
    region: &RegionSpec,
    cfg: &ThresholdConfig,
) -> Result<RegionProbe, CaptureError> {
    let mut capturer = RegionCapturer::new(backend);
    let frame = capturer.capture(region)?;
    let classification = classify(&frame, cfg);
    let mostly_black = classification.dark_ratio > BLACK_PIXEL_WARNING_RATIO;

    if mostly_black {
        warn!(
            "테스트 캡처 {region}: 검은 픽셀 {:.1}%, 좌표를 확인하세요",
            classification.dark_ratio * 100.0
        );
    } else {
        info!(
            "테스트 캡처 {region}: 흰색 {:.4}, 파란색 {:.4}, 대비 {}",
            classification.white_ratio, classification.blue_ratio, classification.contrast
        );
    }

    Ok(RegionProbe {
        region: *region,
        pixels: frame.pixels,
        classification,
        mostly_black,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use radarwatch_core::ports::capture::CaptureHandle;

    struct SolidBackend([u8; 3]);

    struct SolidHandle([u8; 3]);

    impl CaptureBackend for SolidBackend {
        fn name(&self) -> &'static str {
            "solid"
        }

        fn open(&self) -> Result<Box<dyn CaptureHandle>, CaptureError> {
            Ok(Box::new(SolidHandle(self.0)))
        }

        fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError> {
            Ok(vec![display("main", 0, 0, 1920, 1080)])
        }
    }

    impl CaptureHandle for SolidHandle {
        fn grab(&mut self, region: &RegionSpec) -> Result<RgbImage, CaptureError> {
            Ok(RgbImage::from_pixel(
                region.width,
                region.height,
                image::Rgb(self.0),
            ))
        }
    }

    fn display(name: &str, x: i32, y: i32, w: u32, h: u32) -> DisplayInfo {
        DisplayInfo {
            name: name.to_string(),
            x,
            y,
            width: w,
            height: h,
            is_primary: x == 0 && y == 0,
        }
    }

    #[test]
    fn black_region_flagged() {
        let probe = probe_region(
            Arc::new(SolidBackend([0, 0, 0])),
            &RegionSpec::new(0, 0, 10, 10),
            &ThresholdConfig::default(),
        )
        .unwrap();
        assert!(probe.mostly_black);
        assert_eq!(probe.dark_percent(), 100.0);
        assert_eq!(probe.pixels.dimensions(), (10, 10));
    }

    #[test]
    fn bright_region_not_flagged() {
        let probe = probe_region(
            Arc::new(SolidBackend([90, 90, 90])),
            &RegionSpec::new(0, 0, 10, 10),
            &ThresholdConfig::default(),
        )
        .unwrap();
        assert!(!probe.mostly_black);
    }

    #[test]
    fn bounds_check_against_virtual_screen() {
        let displays = vec![
            display("left", -1280, 0, 1280, 1024),
            display("main", 0, 0, 1920, 1080),
        ];

        assert!(check_bounds(&displays, &RegionSpec::new(100, 50, 275, 275)).is_ok());
        // 두 디스플레이에 걸친 영역은 경고만
        assert!(check_bounds(&displays, &RegionSpec::new(-100, 0, 200, 200)).is_ok());
        assert!(matches!(
            check_bounds(&displays, &RegionSpec::new(1800, 900, 275, 275)),
            Err(CaptureError::OffScreen(_))
        ));
        assert_eq!(
            check_bounds(&[], &RegionSpec::new(0, 0, 1, 1)),
            Err(CaptureError::NoDisplay)
        );
    }

    #[test]
    fn locate_display_picks_containing_monitor() {
        let displays = vec![
            display("left", -1280, 0, 1280, 1024),
            display("main", 0, 0, 1920, 1080),
        ];
        let found = locate_display(&displays, &RegionSpec::new(-500, 10, 100, 100)).unwrap();
        assert_eq!(found.name, "left");
        assert!(locate_display(&displays, &RegionSpec::new(-100, 0, 200, 200)).is_none());
    }
}
