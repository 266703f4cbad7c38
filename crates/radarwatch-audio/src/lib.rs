//! # radarwatch-audio
//!
//! `AudioPlayer` 포트 구현.
//!
//! - [`player`]: rodio 사인파 알림음, 출력 장치가 없으면 콘솔 벨로 대체
//! - [`silent`]: 알림음 비활성화 시 사용하는 무음 플레이어

pub mod player;
pub mod silent;

pub use player::RodioPlayer;
pub use silent::SilentPlayer;
