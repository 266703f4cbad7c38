//! RadarWatch 핵심 에러 타입.
//!
//! 틱 단위 에러(`CaptureError`, `AudioError`)는 모니터링 루프 안에서 흡수되고,
//! 세션 시작 실패(`SchedulerError`)만 호출자에게 전파된다.
//! 파일 기반 어댑터는 `#[from]`으로 [`CoreError`]에 래핑한다.

use thiserror::Error;

/// 영역 캡처 실패.
///
/// 모니터링 루프에서는 치명적이지 않다: 해당 틱만 건너뛰고 텔레메트리에 보고한다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// 영역이 화면(단일 디스플레이) 밖에 있음
    #[error("캡처 영역이 화면 밖: {0}")]
    OffScreen(String),

    /// OS가 화면 캡처 권한을 거부함
    #[error("화면 캡처 권한 거부: {0}")]
    PermissionDenied(String),

    /// 캡처 핸들이 현재 실행 컨텍스트(스레드)에서 유효하지 않음
    #[error("캡처 핸들 컨텍스트 불일치: {0}")]
    ContextMismatch(String),

    /// 사용 가능한 디스플레이 없음
    #[error("디스플레이를 찾을 수 없음")]
    NoDisplay,

    /// 캡처 백엔드 내부 실패
    #[error("캡처 백엔드 에러: {0}")]
    Backend(String),
}

impl CaptureError {
    /// 컨텍스트 불일치 여부 (핸들 재생성 후 1회 재시도 대상)
    pub fn is_context_mismatch(&self) -> bool {
        matches!(self, Self::ContextMismatch(_))
    }
}

/// 외부에서 전달된 설정값 오류.
///
/// 업데이트 경계에서 거부되며, 이전 설정이 계속 유효하다.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("설정 검증 실패: {field}: {message}")]
pub struct ConfigError {
    /// 검증 실패한 필드명
    pub field: String,
    /// 실패 사유
    pub message: String,
}

impl ConfigError {
    /// 새 설정 에러 생성
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 오디오 재생 실패. Alert Dispatcher에서 로그만 남기고 삼킨다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// 출력 장치/오디오 스레드 사용 불가
    #[error("오디오 장치 사용 불가: {0}")]
    Unavailable(String),

    /// 재생 실패
    #[error("사운드 재생 실패: {0}")]
    Playback(String),
}

/// 백그라운드 실행 컨텍스트 시작 실패. `start()`에 치명적이다.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// 워커 스레드 생성 실패
    #[error("모니터링 스레드 생성 실패: {0}")]
    Spawn(#[source] std::io::Error),

    /// 워커 런타임 초기화 실패
    #[error("모니터링 런타임 초기화 실패: {0}")]
    Runtime(String),

    /// 이미 모니터링 중
    #[error("이미 모니터링 세션이 실행 중")]
    AlreadyRunning,
}

/// 모니터링 세션 시작 에러 (입력 검증 또는 스케줄러 실패)
#[derive(Debug, Error)]
pub enum StartError {
    /// 영역/임계값 검증 실패
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 워커 시작 실패
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// 코어 레이어 에러.
/// 설정 파일, 프리셋 저장소 등 크레이트 경계에서 사용하는 공통 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error(transparent)]
    Validation(#[from] ConfigError),

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Preset")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 캡처 실패
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// 오디오 실패
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// 스케줄러 실패
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_mismatch_detection() {
        assert!(CaptureError::ContextMismatch("srcdc".into()).is_context_mismatch());
        assert!(!CaptureError::NoDisplay.is_context_mismatch());
    }

    #[test]
    fn config_error_message_names_field() {
        let err = ConfigError::new("white_threshold", "0.0 ~ 1.0 범위여야 함");
        let msg = err.to_string();
        assert!(msg.contains("white_threshold"));
        assert!(msg.contains("설정 검증 실패"));
    }

    #[test]
    fn start_error_wraps_both_sources() {
        let e: StartError = ConfigError::new("width", "0").into();
        assert!(matches!(e, StartError::Config(_)));
        let e: StartError = SchedulerError::AlreadyRunning.into();
        assert!(matches!(e, StartError::Scheduler(_)));
    }
}
