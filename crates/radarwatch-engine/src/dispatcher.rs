//! 알림 발송기.
//!
//! 감지 이벤트를 알림음 재생 요청으로 바꾼다. 재생 실패는 기록만 하고 삼킨다.

use radarwatch_core::error::AudioError;
use radarwatch_core::models::audio::SoundId;
use radarwatch_core::models::detection::SignalDetected;
use radarwatch_core::ports::audio::AudioPlayer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// 알림 발송기
pub struct AlertDispatcher {
    player: Arc<dyn AudioPlayer>,
    dispatched: AtomicU64,
    failures: AtomicU64,
}

impl AlertDispatcher {
    /// 새 발송기 생성
    pub fn new(player: Arc<dyn AudioPlayer>) -> Self {
        Self {
            player,
            dispatched: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// 감지 이벤트 발송
    pub async fn dispatch(&self, event: &SignalDetected) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        info!(
            "알림 발송: {} (흰색 {:.4}, 파란색 {:.4})",
            event.detected_at.format("%H:%M:%S%.3f"),
            event.white_ratio,
            event.blue_ratio
        );

        if let Err(e) = self.player.play(SoundId::Alert).await {
            self.failures.fetch_add(1, Ordering::Relaxed);
            warn!("알림음 재생 실패 (무시): {e}");
        }
    }

    /// 알림음 셀프 테스트
    pub async fn self_test(&self) -> Result<(), AudioError> {
        info!("알림음 테스트 재생");
        self.player.test().await
    }

    /// 발송한 이벤트 수
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// 재생 실패 수
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
