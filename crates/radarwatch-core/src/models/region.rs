//! 감시 영역 모델.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// 기본 감시 영역 한 변 길이 (픽셀)
pub const DEFAULT_REGION_SIZE: u32 = 275;

/// 감시할 화면 직사각형 (가상 스크린 좌표).
///
/// 세션 시작 후에는 불변이다. 변경하려면 세션을 멈추고 다시 시작해야 한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionSpec {
    /// 좌상단 X (보조 모니터가 왼쪽이면 음수 가능)
    pub x: i32,
    /// 좌상단 Y
    pub y: i32,
    /// 너비 (> 0)
    pub width: u32,
    /// 높이 (> 0)
    pub height: u32,
}

impl RegionSpec {
    /// 새 영역 생성 (검증은 [`validate`](Self::validate)에서)
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 플랫폼별 기본 영역.
    ///
    /// macOS는 메뉴 바, Linux는 상단 패널을 피한다.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new(100, 100, DEFAULT_REGION_SIZE, DEFAULT_REGION_SIZE)
        } else if cfg!(target_os = "linux") {
            Self::new(100, 50, DEFAULT_REGION_SIZE, DEFAULT_REGION_SIZE)
        } else {
            Self::new(1535, 730, DEFAULT_REGION_SIZE, DEFAULT_REGION_SIZE)
        }
    }

    /// 너비/높이 검증
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::new("width", "너비는 0보다 커야 함"));
        }
        if self.height == 0 {
            return Err(ConfigError::new("height", "높이는 0보다 커야 함"));
        }
        if i64::from(self.x) + i64::from(self.width) > i64::from(i32::MAX)
            || i64::from(self.y) + i64::from(self.height) > i64::from(i32::MAX)
        {
            return Err(ConfigError::new("region", "좌표 범위 초과"));
        }
        Ok(())
    }

    /// 전체 픽셀 수
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// 오른쪽 경계 (exclusive)
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// 아래쪽 경계 (exclusive)
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// `other`가 이 영역 안에 완전히 포함되는지
    pub fn contains(&self, other: &RegionSpec) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

impl Default for RegionSpec {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl fmt::Display for RegionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {}x{}", self.x, self.y, self.width, self.height)
    }
}
