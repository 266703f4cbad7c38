//! # radarwatch-vision
//!
//! 영역 캡처 및 픽셀 분류 크레이트.
//! 컨텍스트 종속 캡처 핸들 관리, 색 밴드 분류, 프레임 품질 진단,
//! 텔레메트리용 프리뷰 생성을 담당한다.

pub mod capture;
pub mod classifier;
pub mod preview;
pub mod quality;
