//! 애플리케이션 설정 구조체.
//!
//! 감시 영역, 임계값, 알림음, 프리뷰, 로그 파일 설정을 정의한다.
//! 앱 crate가 `config` crate로 파일/환경변수에서 로드한다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::audio::AlertTone;
use crate::models::preset::ActiveConfig;
use crate::models::region::RegionSpec;
use crate::models::thresholds::ThresholdConfig;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 감시 영역
    #[serde(default)]
    pub region: RegionSpec,
    /// 분류/감지 임계값
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    /// 알림 설정
    #[serde(default)]
    pub alert: AlertConfig,
    /// 프리뷰 설정
    #[serde(default)]
    pub preview: PreviewConfig,
    /// 진단 로그 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============================================================
// 알림 설정
// ============================================================

/// 알림 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// 알림음 활성화
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 합성 알림음 파라미터
    #[serde(default)]
    pub tone: AlertTone,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tone: AlertTone::default(),
        }
    }
}

// ============================================================
// 프리뷰 설정
// ============================================================

/// 텔레메트리 프리뷰 썸네일 크기
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// 프리뷰 너비
    #[serde(default = "default_preview_size")]
    pub width: u32,
    /// 프리뷰 높이
    #[serde(default = "default_preview_size")]
    pub height: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            width: default_preview_size(),
            height: default_preview_size(),
        }
    }
}

fn default_preview_size() -> u32 {
    150
}

// ============================================================
// 로그 설정
// ============================================================

/// 진단 로그 설정 (append-only 파일)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 파일 로그 활성화
    #[serde(default = "default_true")]
    pub file_enabled: bool,
    /// 로그 파일 이름 (데이터 디렉토리 기준)
    #[serde(default = "default_log_file")]
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_enabled: true,
            file_name: default_log_file(),
        }
    }
}

fn default_log_file() -> String {
    "radarwatch.log".to_string()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            region: RegionSpec::platform_default(),
            thresholds: ThresholdConfig::default(),
            alert: AlertConfig::default(),
            preview: PreviewConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// 전체 설정 검증
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.region.validate()?;
        self.thresholds.validate()?;
        self.alert.tone.validate()?;
        if self.preview.width == 0 || self.preview.height == 0 {
            return Err(ConfigError::new("preview", "프리뷰 크기는 0보다 커야 함"));
        }
        if self.logging.file_enabled && self.logging.file_name.trim().is_empty() {
            return Err(ConfigError::new("logging.file_name", "비어 있으면 안 됨"));
        }
        Ok(())
    }

    /// 검사 주기 `Duration`
    pub fn check_interval(&self) -> Duration {
        self.thresholds.check_interval()
    }

    /// 활성 설정 쌍
    pub fn active(&self) -> ActiveConfig {
        ActiveConfig {
            region: self.region,
            thresholds: self.thresholds,
        }
    }

    /// 활성 설정 쌍 반영 (검증 후)
    pub fn apply_active(&mut self, active: ActiveConfig) -> Result<(), ConfigError> {
        active.validate()?;
        self.region = active.region;
        self.thresholds = active.thresholds;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
