//! 틱 텔레메트리.

use chrono::{DateTime, Utc};
use image::RgbImage;
use radarwatch_core::models::detection::{ClassificationResult, DetectionState};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// 틱 소요 시간 이동 평균 창 크기
pub const TICK_WINDOW: usize = 10;

/// 틱마다 게시되는 상태 스냅샷
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    /// 세션 내 틱 번호 (1부터)
    pub seq: u64,
    /// 캡처 시각 (캡처 실패 틱은 None)
    pub captured_at: Option<DateTime<Utc>>,
    /// 축소 프리뷰. 캡처 실패 시 마지막 성공 프레임 유지
    pub preview: Option<RgbImage>,
    /// 분류 결과 (캡처 실패 틱은 None)
    pub classification: Option<ClassificationResult>,
    /// 감지 상태
    pub state: DetectionState,
    /// 대비 부족으로 판정 보류
    pub low_contrast: bool,
    /// 이번 틱 에러
    pub error: Option<String>,
    /// 세션 내 발송한 알림 수
    pub alerts_dispatched: u64,
    /// 이번 틱 소요 시간
    pub tick_duration: Duration,
    /// 최근 틱 소요 시간 평균
    pub avg_tick_duration: Duration,
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.seq, self.state)?;
        match (&self.classification, &self.error) {
            (_, Some(err)) => write!(f, " 에러: {err}")?,
            (Some(c), None) => write!(
                f,
                " 흰색 {:.2}% 파란색 {:.2}% 대비 {}{}",
                c.white_ratio * 100.0,
                c.blue_ratio * 100.0,
                c.contrast,
                if self.low_contrast { " (부족)" } else { "" }
            )?,
            (None, None) => {}
        }
        write!(
            f,
            " | 알림 {} | 평균 {:.1}ms",
            self.alerts_dispatched,
            self.avg_tick_duration.as_secs_f64() * 1000.0
        )
    }
}

/// 최근 N틱 소요 시간 이동 평균
#[derive(Debug, Clone)]
pub struct TickTimer {
    window: VecDeque<Duration>,
    capacity: usize,
}

impl TickTimer {
    /// 창 크기 지정 생성
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 소요 시간 기록 후 평균 반환
    pub fn record(&mut self, elapsed: Duration) -> Duration {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(elapsed);
        self.average()
    }

    /// 현재 평균
    pub fn average(&self) -> Duration {
        if self.window.is_empty() {
            return Duration::ZERO;
        }
        self.window.iter().sum::<Duration>() / self.window.len() as u32
    }
}

impl Default for TickTimer {
    fn default() -> Self {
        Self::new(TICK_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_over_last_window() {
        let mut timer = TickTimer::new(3);
        assert_eq!(timer.average(), Duration::ZERO);

        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        assert_eq!(timer.record(Duration::from_millis(30)), Duration::from_millis(20));
        // 가장 오래된 10ms가 밀려남
        assert_eq!(timer.record(Duration::from_millis(40)), Duration::from_millis(30));
    }

    #[test]
    fn display_reports_error() {
        let t = Telemetry {
            seq: 3,
            error: Some("캡처 영역이 화면 밖".to_string()),
            ..Default::default()
        };
        let line = t.to_string();
        assert!(line.starts_with("#3 Idle"));
        assert!(line.contains("캡처 영역이 화면 밖"));
    }
}
