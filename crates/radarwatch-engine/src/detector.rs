//! 감지 상태 머신.
//!
//! 분류 결과를 디바운스된 "신호 있음" 이벤트로 바꾼다.
//! 짧은 깜빡임은 무시하고, 같은 신호가 이어지는 동안에는 다시 알리지 않는다.
//!
//! ```text
//! Idle ──match──▶ Armed ──match, 디바운스 경과──▶ Alerted ──▶ Cooldown
//!  ▲               │                                            │
//!  └──not match────┘◀───────── not match, 디바운스 경과 ────────┘
//! ```
//!
//! 해제 쪽도 같은 디바운스를 쓴다: Cooldown에서 불일치가 디바운스 시간 이상
//! 이어져야 Idle로 돌아간다. 디바운스가 0이면 첫 불일치에서 바로 Idle.

use chrono::Utc;
use radarwatch_core::models::detection::{ClassificationResult, DetectionState, SignalDetected};
use radarwatch_core::models::thresholds::ThresholdConfig;
use std::time::Instant;
use tracing::{debug, info};

/// 한 틱의 상태 전이
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// 이전 상태
    pub from: DetectionState,
    /// 새 상태
    pub to: DetectionState,
    /// Armed→Alerted 전이에서만 발생
    pub event: Option<SignalDetected>,
}

impl Transition {
    /// 상태가 바뀌었는지
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// 디바운스 감지기
#[derive(Debug, Default)]
pub struct SignalDetector {
    state: DetectionState,
    /// Armed 진입 시각
    armed_at: Option<Instant>,
    /// Cooldown 중 첫 불일치 시각
    clear_since: Option<Instant>,
}

impl SignalDetector {
    /// Idle 상태로 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재 상태
    pub fn state(&self) -> DetectionState {
        self.state
    }

    /// Idle로 초기화
    pub fn reset(&mut self) {
        if self.state != DetectionState::Idle {
            debug!("감지기 초기화: {} → Idle", self.state);
        }
        *self = Self::default();
    }

    /// 분류 결과 하나 반영.
    ///
    /// `at`은 프레임 캡처 시각(단조 시계). 대비 부족 결과는 불일치로 취급한다.
    pub fn step(
        &mut self,
        result: &ClassificationResult,
        cfg: &ThresholdConfig,
        at: Instant,
    ) -> Transition {
        use DetectionState::*;

        let matched = result.is_match(cfg.match_ratio);
        let debounce = cfg.debounce();
        let from = self.state;
        let mut event = None;

        let to = match (from, matched) {
            (Idle, false) => Idle,
            (Idle, true) => {
                self.armed_at = Some(at);
                Armed
            }
            (Armed, true) => {
                let since = *self.armed_at.get_or_insert(at);
                if at.saturating_duration_since(since) >= debounce {
                    self.armed_at = None;
                    event = Some(SignalDetected {
                        detected_at: Utc::now(),
                        white_ratio: result.white_ratio,
                        blue_ratio: result.blue_ratio,
                    });
                    Alerted
                } else {
                    Armed
                }
            }
            (Armed, false) => {
                self.armed_at = None;
                Idle
            }
            (Alerted, _) => {
                self.clear_since = None;
                Cooldown
            }
            (Cooldown, true) => {
                self.clear_since = None;
                Cooldown
            }
            (Cooldown, false) => {
                let since = *self.clear_since.get_or_insert(at);
                if at.saturating_duration_since(since) >= debounce {
                    self.clear_since = None;
                    Idle
                } else {
                    Cooldown
                }
            }
        };

        self.state = to;
        let transition = Transition { from, to, event };

        if to == Alerted {
            info!(
                "신호 감지: 흰색 {:.4}, 파란색 {:.4} ({from} → {to})",
                result.white_ratio, result.blue_ratio
            );
        } else if transition.changed() {
            debug!(
                "상태 전이: {from} → {to} (흰색 {:.4}, 파란색 {:.4}, 대비 {})",
                result.white_ratio, result.blue_ratio, result.contrast
            );
        }

        transition
    }
}
