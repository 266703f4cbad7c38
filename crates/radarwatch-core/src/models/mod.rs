//! RadarWatch 도메인 모델.
//!
//! 감시 영역, 임계값 설정, 프레임, 분류 결과, 감지 상태 등
//! 엔진 전체가 공유하는 데이터 구조체를 정의한다.

pub mod audio;
pub mod detection;
pub mod display;
pub mod frame;
pub mod preset;
pub mod region;
pub mod thresholds;
