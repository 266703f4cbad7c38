//! # radarwatch-engine
//!
//! 감지 파이프라인 오케스트레이션.
//!
//! - [`detector`]: 디바운스 감지 상태 머신
//! - [`dispatcher`]: 감지 이벤트 → 알림음
//! - [`monitor`]: 전용 워커 스레드 스케줄러 (start/stop/pause, 설정 스냅샷 전달)
//! - [`telemetry`]: 틱마다 게시되는 상태 스냅샷

pub mod detector;
pub mod dispatcher;
pub mod monitor;
pub mod telemetry;

pub use detector::{SignalDetector, Transition};
pub use dispatcher::AlertDispatcher;
pub use monitor::{RadarMonitor, RegionUpdate};
pub use telemetry::Telemetry;
