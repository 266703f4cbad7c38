//! 알림 사운드 모델.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// 재생할 사운드 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundId {
    /// 신호 감지 알림
    Alert,
    /// 사용자 요청 셀프 테스트
    Test,
}

/// 합성 알림음 파라미터
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertTone {
    /// 주파수 (Hz)
    pub frequency_hz: f32,
    /// 1회 재생 길이 (밀리초)
    pub duration_ms: u64,
    /// 재생 횟수 (≥ 1)
    pub repeats: u32,
    /// 음량 (0.0 ~ 1.0)
    pub volume: f32,
}

impl AlertTone {
    /// 1회 재생 길이
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// 파라미터 검증
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.frequency_hz.is_finite() || self.frequency_hz <= 0.0 {
            return Err(ConfigError::new("frequency_hz", "0보다 커야 함"));
        }
        if self.duration_ms == 0 {
            return Err(ConfigError::new("duration_ms", "0보다 커야 함"));
        }
        if self.repeats == 0 {
            return Err(ConfigError::new("repeats", "1 이상이어야 함"));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(ConfigError::new("volume", "0.0 ~ 1.0 범위여야 함"));
        }
        Ok(())
    }
}

impl Default for AlertTone {
    fn default() -> Self {
        Self {
            frequency_hz: 800.0,
            duration_ms: 20,
            repeats: 3,
            volume: 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tone_is_valid() {
        let tone = AlertTone::default();
        assert!(tone.validate().is_ok());
        assert_eq!(tone.duration(), Duration::from_millis(20));
    }

    #[test]
    fn zero_repeats_rejected() {
        let tone = AlertTone {
            repeats: 0,
            ..Default::default()
        };
        assert_eq!(tone.validate().unwrap_err().field, "repeats");
    }
}
