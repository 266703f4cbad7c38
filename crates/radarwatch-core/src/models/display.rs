//! 디스플레이 정보 모델.

use serde::{Deserialize, Serialize};

use super::region::RegionSpec;

/// 연결된 디스플레이 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    /// 디스플레이 이름
    pub name: String,
    /// 가상 스크린 상 원점 X
    pub x: i32,
    /// 가상 스크린 상 원점 Y
    pub y: i32,
    /// 너비 (픽셀)
    pub width: u32,
    /// 높이 (픽셀)
    pub height: u32,
    /// 주 모니터 여부
    pub is_primary: bool,
}

impl DisplayInfo {
    /// 디스플레이 영역
    pub fn bounds(&self) -> RegionSpec {
        RegionSpec::new(self.x, self.y, self.width, self.height)
    }
}

/// 모든 디스플레이를 감싸는 가상 스크린 경계.
///
/// 디스플레이가 없으면 `None`.
pub fn virtual_bounds(displays: &[DisplayInfo]) -> Option<RegionSpec> {
    let first = displays.first()?;
    let mut left = i64::from(first.x);
    let mut top = i64::from(first.y);
    let mut right = first.bounds().right();
    let mut bottom = first.bounds().bottom();

    for d in &displays[1..] {
        let b = d.bounds();
        left = left.min(i64::from(b.x));
        top = top.min(i64::from(b.y));
        right = right.max(b.right());
        bottom = bottom.max(b.bottom());
    }

    Some(RegionSpec::new(
        i32::try_from(left).ok()?,
        i32::try_from(top).ok()?,
        u32::try_from(right - left).ok()?,
        u32::try_from(bottom - top).ok()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(name: &str, x: i32, y: i32, w: u32, h: u32, primary: bool) -> DisplayInfo {
        DisplayInfo {
            name: name.to_string(),
            x,
            y,
            width: w,
            height: h,
            is_primary: primary,
        }
    }

    #[test]
    fn virtual_bounds_spans_left_monitor() {
        let displays = vec![
            display("primary", 0, 0, 1920, 1080, true),
            display("left", -1280, 100, 1280, 1024, false),
        ];
        let bounds = virtual_bounds(&displays).unwrap();
        assert_eq!(bounds, RegionSpec::new(-1280, 0, 3200, 1124));
    }

    #[test]
    fn virtual_bounds_empty() {
        assert!(virtual_bounds(&[]).is_none());
    }
}
