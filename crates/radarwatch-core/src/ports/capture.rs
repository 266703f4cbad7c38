//! 화면 캡처 포트.
//!
//! 구현: `radarwatch-vision` crate (xcap)
//!
//! 캡처 핸들은 컨텍스트 종속(context-affine) 리소스다. 한 스레드에서 연 핸들을
//! 다른 스레드에서 쓰면 안 되므로 [`CaptureHandle`]에는 `Send` 바운드가 없다.
//! 핸들은 항상 캡처를 수행할 스레드에서 [`CaptureBackend::open`]으로 만든다.

use image::RgbImage;

use crate::error::CaptureError;
use crate::models::display::DisplayInfo;
use crate::models::region::RegionSpec;

/// 캡처 핸들 팩토리. 스레드 간 공유 가능.
pub trait CaptureBackend: Send + Sync {
    /// 백엔드 이름 (로그용)
    fn name(&self) -> &'static str;

    /// 호출한 스레드 전용 캡처 핸들 생성
    fn open(&self) -> Result<Box<dyn CaptureHandle>, CaptureError>;

    /// 연결된 디스플레이 목록
    fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError>;
}

/// 생성된 스레드에서만 유효한 캡처 핸들
pub trait CaptureHandle {
    /// 영역 픽셀 캡처.
    ///
    /// 핸들이 현재 컨텍스트에서 무효하면 [`CaptureError::ContextMismatch`]를 반환한다.
    fn grab(&mut self, region: &RegionSpec) -> Result<RgbImage, CaptureError>;
}
