//! 영역 캡처.
//!
//! xcap 기반 [`XcapBackend`]와, 캡처 핸들을 현재 스레드에 묶어 캐싱하는 [`RegionCapturer`].
//!
//! 캡처 핸들은 `Send`가 아니므로 [`RegionCapturer`]도 `Send`가 아니다.
//! 캡처를 수행할 스레드 안에서 생성해야 하며, 다른 스레드로 옮길 수 없다.

use image::{imageops, DynamicImage, RgbImage, RgbaImage};
use radarwatch_core::error::CaptureError;
use radarwatch_core::models::display::DisplayInfo;
use radarwatch_core::models::frame::FrameSample;
use radarwatch_core::models::region::RegionSpec;
use radarwatch_core::ports::capture::{CaptureBackend, CaptureHandle};
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, warn};
use xcap::Monitor;

/// 스크린 캡처 백엔드: xcap 기반
pub struct XcapBackend;

impl XcapBackend {
    /// 새 백엔드 생성
    pub fn new() -> Self {
        Self
    }
}

impl Default for XcapBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for XcapBackend {
    fn name(&self) -> &'static str {
        "xcap"
    }

    fn open(&self) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        Ok(Box::new(XcapHandle {
            monitor: None,
            _not_send: PhantomData,
        }))
    }

    fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError> {
        let monitors =
            Monitor::all().map_err(|e| map_xcap_error("모니터 목록 조회 실패", e))?;
        if monitors.is_empty() {
            return Err(CaptureError::NoDisplay);
        }
        monitors.iter().map(display_info).collect()
    }
}

/// xcap 캡처 핸들. 영역이 속한 모니터를 캐싱한다.
struct XcapHandle {
    monitor: Option<(DisplayInfo, Monitor)>,
    _not_send: PhantomData<*const ()>,
}

impl CaptureHandle for XcapHandle {
    fn grab(&mut self, region: &RegionSpec) -> Result<RgbImage, CaptureError> {
        let cached = self
            .monitor
            .as_ref()
            .is_some_and(|(info, _)| info.bounds().contains(region));

        if !cached {
            let monitor = Monitor::from_point(region.x, region.y).map_err(|e| {
                CaptureError::OffScreen(format!("{region} 위치에 디스플레이 없음: {e}"))
            })?;
            let info = display_info(&monitor)?;
            if !info.bounds().contains(region) {
                return Err(CaptureError::OffScreen(format!(
                    "{region} 영역이 디스플레이 '{}' {} 경계를 벗어남",
                    info.name,
                    info.bounds()
                )));
            }
            debug!("캡처 대상 디스플레이: {} {}", info.name, info.bounds());
            self.monitor = Some((info, monitor));
        }

        let (info, monitor) = self.monitor.as_ref().ok_or(CaptureError::NoDisplay)?;
        let screen = monitor
            .capture_image()
            .map_err(|e| map_xcap_error("스크린 캡처 실패", e))?;

        crop_region(&screen, info, region)
    }
}

fn display_info(monitor: &Monitor) -> Result<DisplayInfo, CaptureError> {
    Ok(DisplayInfo {
        name: monitor.name().unwrap_or_default(),
        x: monitor
            .x()
            .map_err(|e| map_xcap_error("모니터 좌표 조회 실패", e))?,
        y: monitor
            .y()
            .map_err(|e| map_xcap_error("모니터 좌표 조회 실패", e))?,
        width: monitor
            .width()
            .map_err(|e| map_xcap_error("모니터 크기 조회 실패", e))?,
        height: monitor
            .height()
            .map_err(|e| map_xcap_error("모니터 크기 조회 실패", e))?,
        is_primary: monitor.is_primary().unwrap_or(false),
    })
}

/// xcap 에러 메시지를 [`CaptureError`] 분류로 매핑
pub fn map_xcap_error(context: &str, err: impl Display) -> CaptureError {
    let detail = err.to_string();
    let lower = detail.to_lowercase();
    let message = format!("{context}: {detail}");

    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized")
    {
        CaptureError::PermissionDenied(message)
    } else if lower.contains("thread") || lower.contains("context") {
        CaptureError::ContextMismatch(message)
    } else {
        CaptureError::Backend(message)
    }
}

/// 디스플레이 전체 캡처에서 영역 잘라내기.
///
/// HiDPI 디스플레이는 캡처 해상도가 논리 크기보다 크므로 배율을 적용한다.
pub fn crop_region(
    screen: &RgbaImage,
    display: &DisplayInfo,
    region: &RegionSpec,
) -> Result<RgbImage, CaptureError> {
    if display.width == 0 || display.height == 0 {
        return Err(CaptureError::NoDisplay);
    }

    let dx = i64::from(region.x) - i64::from(display.x);
    let dy = i64::from(region.y) - i64::from(display.y);
    if dx < 0 || dy < 0 {
        return Err(CaptureError::OffScreen(format!(
            "{region} 영역이 디스플레이 원점 ({}, {}) 밖",
            display.x, display.y
        )));
    }

    let scale_x = f64::from(screen.width()) / f64::from(display.width);
    let scale_y = f64::from(screen.height()) / f64::from(display.height);

    let left = (dx as f64 * scale_x).round() as u64;
    let top = (dy as f64 * scale_y).round() as u64;
    let width = ((f64::from(region.width) * scale_x).round() as u64).max(1);
    let height = ((f64::from(region.height) * scale_y).round() as u64).max(1);

    if left + width > u64::from(screen.width()) || top + height > u64::from(screen.height()) {
        return Err(CaptureError::OffScreen(format!(
            "{region} 영역이 캡처 버퍼 {}x{}를 벗어남",
            screen.width(),
            screen.height()
        )));
    }

    let cropped =
        imageops::crop_imm(screen, left as u32, top as u32, width as u32, height as u32).to_image();
    Ok(DynamicImage::ImageRgba8(cropped).to_rgb8())
}

/// 스레드 전용 캡처기.
///
/// 첫 캡처 시 핸들을 열어 캐싱하고, 컨텍스트 불일치가 보고되면
/// 핸들을 폐기·재생성한 뒤 같은 캡처를 한 번만 재시도한다.
pub struct RegionCapturer {
    backend: Arc<dyn CaptureBackend>,
    cached: Option<OwnedHandle>,
    handles_opened: u64,
}

/// 핸들과 그 핸들을 연 스레드
struct OwnedHandle {
    owner: ThreadId,
    handle: Box<dyn CaptureHandle>,
}

impl RegionCapturer {
    /// 새 캡처기 생성 (핸들은 첫 캡처 때 연다)
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            cached: None,
            handles_opened: 0,
        }
    }

    /// 영역 캡처
    pub fn capture(&mut self, region: &RegionSpec) -> Result<FrameSample, CaptureError> {
        region
            .validate()
            .map_err(|e| CaptureError::OffScreen(e.to_string()))?;

        let pixels = match self.grab_once(region) {
            Err(e) if e.is_context_mismatch() => {
                warn!("캡처 핸들 무효, 현재 스레드에서 재생성 후 재시도: {e}");
                self.reset();
                self.grab_once(region)?
            }
            other => other?,
        };

        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(CaptureError::Backend("빈 캡처 버퍼".to_string()));
        }

        Ok(FrameSample::new(pixels))
    }

    /// 캐싱된 핸들 폐기
    pub fn reset(&mut self) {
        if self.cached.take().is_some() {
            debug!(backend = self.backend.name(), "캡처 핸들 폐기");
        }
    }

    /// 지금까지 생성한 핸들 수
    pub fn handles_opened(&self) -> u64 {
        self.handles_opened
    }

    fn grab_once(&mut self, region: &RegionSpec) -> Result<RgbImage, CaptureError> {
        let current = thread::current().id();

        if self.cached.as_ref().is_some_and(|c| c.owner != current) {
            debug!(thread = ?current, "다른 스레드에서 연 캡처 핸들 폐기");
            self.cached = None;
        }

        if self.cached.is_none() {
            let handle = self.backend.open()?;
            self.handles_opened += 1;
            debug!(backend = self.backend.name(), thread = ?current, "캡처 핸들 생성");
            self.cached = Some(OwnedHandle {
                owner: current,
                handle,
            });
        }

        match self.cached.as_mut() {
            Some(cached) => cached.handle.grab(region),
            None => Err(CaptureError::NoDisplay),
        }
    }
}
