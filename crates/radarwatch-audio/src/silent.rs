//! 무음 플레이어.

use async_trait::async_trait;
use radarwatch_core::error::AudioError;
use radarwatch_core::models::audio::SoundId;
use radarwatch_core::ports::audio::AudioPlayer;
use tracing::debug;

/// 알림음이 꺼져 있을 때 쓰는 플레이어. 기록만 남긴다.
pub struct SilentPlayer;

#[async_trait]
impl AudioPlayer for SilentPlayer {
    async fn play(&self, sound: SoundId) -> Result<(), AudioError> {
        debug!("알림음 비활성화 상태, {sound:?} 재생 생략");
        Ok(())
    }

    async fn test(&self) -> Result<(), AudioError> {
        debug!("알림음 비활성화 상태, 테스트 재생 생략");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn silent_player_always_succeeds() {
        let player = SilentPlayer;
        assert!(player.play(SoundId::Alert).await.is_ok());
        assert!(player.test().await.is_ok());
    }
}
