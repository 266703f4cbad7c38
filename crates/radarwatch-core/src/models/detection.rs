//! 분류 결과, 감지 상태, 감지 이벤트 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 프레임 하나의 픽셀 분류 결과 (불변, 프레임당 1개)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// 흰색 밴드 픽셀 비율 (0.0 ~ 1.0)
    pub white_ratio: f64,
    /// 파란색 밴드 픽셀 비율 (0.0 ~ 1.0)
    pub blue_ratio: f64,
    /// 대비 충족 여부. false면 판정 보류(inconclusive)
    pub contrast_ok: bool,
    /// 흰색 밴드 픽셀 수
    pub white_pixels: u64,
    /// 파란색 밴드 픽셀 수
    pub blue_pixels: u64,
    /// 전체 픽셀 수
    pub total_pixels: u64,
    /// 채널 최댓값 − 최솟값
    pub contrast: u8,
    /// 모든 채널이 10 미만인 픽셀 비율 (좌표 오류 진단용)
    pub dark_ratio: f64,
}

impl ClassificationResult {
    /// 빈 프레임 결과
    pub fn empty() -> Self {
        Self {
            white_ratio: 0.0,
            blue_ratio: 0.0,
            contrast_ok: false,
            white_pixels: 0,
            blue_pixels: 0,
            total_pixels: 0,
            contrast: 0,
            dark_ratio: 0.0,
        }
    }

    /// 색 비율이 밴드에 도달했는지 (대비 무시)
    pub fn crosses_band(&self, band: f64) -> bool {
        self.white_ratio >= band || self.blue_ratio >= band
    }

    /// 대비 부족으로 판정 보류인지
    pub fn is_inconclusive(&self) -> bool {
        !self.contrast_ok
    }

    /// 감지 상태 머신이 쓰는 매치 판정 (판정 보류는 불일치로 취급)
    pub fn is_match(&self, band: f64) -> bool {
        self.contrast_ok && self.crosses_band(band)
    }
}

/// 감지 상태 머신 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionState {
    /// 신호 없음, 무장 대기
    #[default]
    Idle,
    /// 매치 발생, 디바운스 창 열림
    Armed,
    /// 디바운스 충족, 알림 발송됨
    Alerted,
    /// 같은 신호가 계속되는 동안 재알림 억제
    Cooldown,
}

impl fmt::Display for DetectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "Idle",
            Self::Armed => "Armed",
            Self::Alerted => "Alerted",
            Self::Cooldown => "Cooldown",
        };
        f.write_str(label)
    }
}

/// 신호 감지 이벤트 (Idle→Alerted 사이클당 최대 1회)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalDetected {
    /// 알림 조건 충족 시각
    pub detected_at: DateTime<Utc>,
    /// 충족 프레임의 흰색 비율
    pub white_ratio: f64,
    /// 충족 프레임의 파란색 비율
    pub blue_ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(white: f64, blue: f64, contrast_ok: bool) -> ClassificationResult {
        ClassificationResult {
            white_ratio: white,
            blue_ratio: blue,
            contrast_ok,
            ..ClassificationResult::empty()
        }
    }

    #[test]
    fn either_class_crosses_band() {
        assert!(result(0.02, 0.0, true).is_match(0.01));
        assert!(result(0.0, 0.02, true).is_match(0.01));
        assert!(!result(0.005, 0.005, true).is_match(0.01));
    }

    #[test]
    fn low_contrast_never_matches() {
        let r = result(0.9, 0.9, false);
        assert!(r.crosses_band(0.01));
        assert!(r.is_inconclusive());
        assert!(!r.is_match(0.01));
    }

    #[test]
    fn state_default_is_idle() {
        assert_eq!(DetectionState::default(), DetectionState::Idle);
        assert_eq!(DetectionState::Cooldown.to_string(), "Cooldown");
    }
}
