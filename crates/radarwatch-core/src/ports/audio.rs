//! 오디오 재생 포트.
//!
//! 구현: `radarwatch-audio` crate (rodio)

use async_trait::async_trait;

use crate::error::AudioError;
use crate::models::audio::SoundId;

/// 알림음 재생 인터페이스.
///
/// `play`는 fire-and-forget: 재생 완료를 기다리지 않고 반환해야 한다.
/// `test`는 사용자에게 결과를 알려야 하므로 재생 완료까지 기다려도 된다.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// 사운드 재생 요청
    async fn play(&self, sound: SoundId) -> Result<(), AudioError>;

    /// 사용자 요청 셀프 테스트 재생
    async fn test(&self) -> Result<(), AudioError>;
}
