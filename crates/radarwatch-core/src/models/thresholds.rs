//! 임계값 설정 모델.
//!
//! 픽셀 분류 밴드와 감지 디바운스를 결정한다. 값은 틱 사이에만 바뀌며,
//! 하나의 틱은 항상 일관된 스냅샷 하나만 사용한다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// 임계값/주기 설정
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// 흰색 밴드 기준 (0.0 ~ 1.0). 모든 채널이 `white_threshold × 255` 이상이어야 흰색.
    pub white_threshold: f64,
    /// 파란색 밴드 기준 (0.0 ~ 1.0). B 채널이 R/G보다 `blue_threshold × 255` 이상 커야 파란색.
    pub blue_threshold: f64,
    /// 검사 주기 (초, > 0)
    pub check_interval_seconds: f64,
    /// 최소 대비 (0.0 이상). 채널 최댓값 − 최솟값이 `min_contrast × 255` 미만이면 판정 보류.
    pub min_contrast: f64,
    /// 매치 밴드: 색 클래스 픽셀 비율이 이 값 이상이면 해당 틱을 매치로 본다 (0 < r ≤ 1)
    pub match_ratio: f64,
    /// 무장(Armed) 후 알림까지 신호가 유지되어야 하는 시간 (초, ≥ 0)
    pub debounce_seconds: f64,
}

impl ThresholdConfig {
    /// 기본 검사 주기 (초)
    pub const DEFAULT_CHECK_INTERVAL: f64 = 0.5;

    /// 검사 주기/디바운스 상한 (초, 하루)
    pub const MAX_SECONDS: f64 = 86_400.0;

    /// 입력 범위 검증.
    ///
    /// NaN/무한대는 모든 필드에서 거부한다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_range("white_threshold", self.white_threshold)?;
        unit_range("blue_threshold", self.blue_threshold)?;

        finite("check_interval_seconds", self.check_interval_seconds)?;
        if self.check_interval_seconds <= 0.0 {
            return Err(ConfigError::new(
                "check_interval_seconds",
                "검사 주기는 0보다 커야 함",
            ));
        }
        at_most_a_day("check_interval_seconds", self.check_interval_seconds)?;

        finite("min_contrast", self.min_contrast)?;
        if self.min_contrast < 0.0 {
            return Err(ConfigError::new("min_contrast", "0 이상이어야 함"));
        }

        finite("match_ratio", self.match_ratio)?;
        if self.match_ratio <= 0.0 || self.match_ratio > 1.0 {
            return Err(ConfigError::new("match_ratio", "0 초과 1 이하여야 함"));
        }

        finite("debounce_seconds", self.debounce_seconds)?;
        if self.debounce_seconds < 0.0 {
            return Err(ConfigError::new("debounce_seconds", "0 이상이어야 함"));
        }
        at_most_a_day("debounce_seconds", self.debounce_seconds)?;

        Ok(())
    }

    /// 검사 주기 `Duration`. 검증 전 값은 `[0, MAX_SECONDS]`로 잘린다.
    pub fn check_interval(&self) -> Duration {
        clamped_duration(self.check_interval_seconds)
    }

    /// 디바운스 `Duration`
    pub fn debounce(&self) -> Duration {
        clamped_duration(self.debounce_seconds)
    }

    /// 흰색 판정 밝기 하한 (채널 값 기준)
    pub fn brightness_floor(&self) -> f64 {
        self.white_threshold * 255.0
    }

    /// 파란색 판정 최소 우세 마진 (채널 값 기준)
    pub fn blue_margin(&self) -> f64 {
        self.blue_threshold * 255.0
    }

    /// 최소 대비 (채널 값 기준)
    pub fn contrast_floor(&self) -> f64 {
        self.min_contrast * 255.0
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            white_threshold: 200.0 / 255.0,
            blue_threshold: 0.05,
            check_interval_seconds: Self::DEFAULT_CHECK_INTERVAL,
            min_contrast: 0.1,
            match_ratio: 0.001,
            debounce_seconds: Self::DEFAULT_CHECK_INTERVAL,
        }
    }
}

fn finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::new(field, "유한한 숫자여야 함"))
    }
}

fn at_most_a_day(field: &str, value: f64) -> Result<(), ConfigError> {
    if value <= ThresholdConfig::MAX_SECONDS {
        Ok(())
    } else {
        Err(ConfigError::new(field, "86400초(하루) 이하여야 함"))
    }
}

fn clamped_duration(seconds: f64) -> Duration {
    let seconds = if seconds.is_nan() {
        0.0
    } else {
        seconds.clamp(0.0, ThresholdConfig::MAX_SECONDS)
    };
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
}

fn unit_range(field: &str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::new(field, "0.0 ~ 1.0 범위여야 함"))
    }
}
