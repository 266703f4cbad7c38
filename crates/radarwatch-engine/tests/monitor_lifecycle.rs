//! 모니터링 스케줄러 수명주기 테스트.
//!
//! 실제 워커 스레드를 짧은 주기로 돌리고, 가짜 화면/스피커로 관찰한다.

mod common;

use assert_matches::assert_matches;
use common::{frame_with_white, CountingSpeaker, FakeScreen};
use radarwatch_core::error::{CaptureError, SchedulerError, StartError};
use radarwatch_core::models::detection::DetectionState;
use radarwatch_core::models::preset::ActiveConfig;
use radarwatch_core::models::region::RegionSpec;
use radarwatch_core::models::thresholds::ThresholdConfig;
use radarwatch_engine::{RadarMonitor, RegionUpdate, Telemetry};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn region() -> RegionSpec {
    RegionSpec::new(0, 0, 100, 100)
}

fn fast(debounce: f64) -> ThresholdConfig {
    ThresholdConfig {
        check_interval_seconds: 0.01,
        debounce_seconds: debounce,
        ..Default::default()
    }
}

fn monitor(screen: &Arc<FakeScreen>, speaker: &Arc<CountingSpeaker>) -> RadarMonitor {
    RadarMonitor::new(
        screen.clone(),
        speaker.clone(),
        ActiveConfig {
            region: region(),
            thresholds: fast(0.02),
        },
    )
}

/// 조건을 만족하는 텔레메트리가 게시될 때까지 대기
async fn wait_until<F>(monitor: &RadarMonitor, pred: F) -> Telemetry
where
    F: FnMut(&Telemetry) -> bool,
{
    let mut rx = monitor.subscribe();
    let guard = tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("텔레메트리 대기 시간 초과")
        .expect("텔레메트리 채널 닫힘");
    guard.clone()
}

#[tokio::test]
async fn stop_is_idempotent() {
    let screen = FakeScreen::new();
    let speaker = CountingSpeaker::new();
    let monitor = monitor(&screen, &speaker);

    // 시작 전 중지는 no-op
    monitor.stop();
    assert!(!monitor.is_running());

    monitor.start(region(), fast(0.02)).unwrap();
    wait_until(&monitor, |t| t.seq >= 2).await;

    monitor.stop();
    monitor.stop();
    assert!(!monitor.is_running());
    assert_eq!(monitor.state(), DetectionState::Idle);
}

#[tokio::test]
async fn start_rejects_invalid_input_and_double_start() {
    let screen = FakeScreen::new();
    let speaker = CountingSpeaker::new();
    let monitor = monitor(&screen, &speaker);

    let bad = ThresholdConfig {
        white_threshold: 1.5,
        ..fast(0.02)
    };
    assert_matches!(monitor.start(region(), bad), Err(StartError::Config(e)) if e.field == "white_threshold");
    assert_matches!(
        monitor.start(RegionSpec::new(0, 0, 0, 10), fast(0.02)),
        Err(StartError::Config(_))
    );
    let huge = ThresholdConfig {
        debounce_seconds: 1e20,
        ..fast(0.02)
    };
    assert_matches!(monitor.start(region(), huge), Err(StartError::Config(e)) if e.field == "debounce_seconds");
    assert!(!monitor.is_running());

    monitor.start(region(), fast(0.02)).unwrap();
    let huge_interval = ThresholdConfig {
        check_interval_seconds: 1e20,
        ..fast(0.02)
    };
    assert!(monitor.update_config(huge_interval).is_err());
    let t = wait_until(&monitor, |t| t.seq >= 3).await;
    assert!(t.seq >= 3);
    assert_matches!(
        monitor.start(region(), fast(0.02)),
        Err(StartError::Scheduler(SchedulerError::AlreadyRunning))
    );
    monitor.stop();
}

#[tokio::test]
async fn black_screen_never_alerts() {
    let screen = FakeScreen::new();
    let speaker = CountingSpeaker::new();
    let monitor = monitor(&screen, &speaker);

    monitor.start(region(), fast(0.02)).unwrap();
    let t = wait_until(&monitor, |t| t.seq >= 10).await;
    monitor.stop();

    assert_eq!(t.state, DetectionState::Idle);
    assert!(t.low_contrast);
    assert_eq!(t.alerts_dispatched, 0);
    assert_eq!(speaker.plays(), 0);
}

#[tokio::test]
async fn continuous_signal_alerts_exactly_once() {
    let screen = FakeScreen::new();
    screen.show(frame_with_white(500));
    let speaker = CountingSpeaker::new();
    let monitor = monitor(&screen, &speaker);

    monitor.start(region(), fast(0.02)).unwrap();
    let first = wait_until(&monitor, |t| t.alerts_dispatched >= 1).await;
    let later = wait_until(&monitor, |t| t.seq >= first.seq + 20).await;
    monitor.stop();

    assert_eq!(later.alerts_dispatched, 1);
    assert_eq!(later.state, DetectionState::Cooldown);
    assert_eq!(speaker.plays(), 1);
    assert!(later.preview.is_some());
    assert!(later.avg_tick_duration < Duration::from_secs(1));
}

#[tokio::test]
async fn capture_failure_leaves_state_unchanged() {
    let screen = FakeScreen::new();
    screen.show(frame_with_white(500));
    let speaker = CountingSpeaker::new();
    let monitor = monitor(&screen, &speaker);

    // 긴 디바운스: Armed에 머무름
    monitor.start(region(), fast(60.0)).unwrap();
    let armed = wait_until(&monitor, |t| t.state == DetectionState::Armed).await;
    assert!(armed.preview.is_some());

    screen.fail_with(Some(CaptureError::PermissionDenied("화면 기록 권한 없음".into())));
    let failed = wait_until(&monitor, |t| t.error.is_some()).await;
    assert_eq!(failed.state, DetectionState::Armed);
    assert!(failed.classification.is_none());
    assert!(failed.preview.is_some(), "마지막 정상 프리뷰 유지");

    let more = wait_until(&monitor, |t| t.seq >= failed.seq + 3).await;
    assert_eq!(more.state, DetectionState::Armed);
    assert!(monitor.is_running());

    screen.fail_with(None);
    let recovered = wait_until(&monitor, |t| t.error.is_none() && t.seq > more.seq).await;
    assert_eq!(recovered.state, DetectionState::Armed);
    monitor.stop();

    assert_eq!(speaker.plays(), 0);
}

#[tokio::test]
async fn pause_keeps_detector_state() {
    let screen = FakeScreen::new();
    screen.show(frame_with_white(500));
    let speaker = CountingSpeaker::new();
    let monitor = monitor(&screen, &speaker);

    monitor.start(region(), fast(60.0)).unwrap();
    wait_until(&monitor, |t| t.state == DetectionState::Armed).await;

    monitor.pause();
    assert!(monitor.is_paused());
    // 진행 중이던 틱이 있으면 끝날 시간
    tokio::time::sleep(Duration::from_millis(50)).await;
    let paused_seq = monitor.latest().seq;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(monitor.latest().seq, paused_seq);
    assert_eq!(monitor.state(), DetectionState::Armed);

    monitor.resume();
    assert!(!monitor.is_paused());
    let resumed = wait_until(&monitor, |t| t.seq > paused_seq).await;
    assert_eq!(resumed.state, DetectionState::Armed);
    monitor.stop();
}

#[tokio::test]
async fn region_update_queued_while_running() {
    let screen = FakeScreen::new();
    let speaker = CountingSpeaker::new();
    let monitor = monitor(&screen, &speaker);
    let other = RegionSpec::new(50, 60, 70, 80);

    monitor.start(region(), fast(0.02)).unwrap();
    assert_eq!(monitor.update_region(other).unwrap(), RegionUpdate::Queued);
    assert_eq!(monitor.pending_region(), Some(other));
    assert_eq!(monitor.active_config().region, region());

    let t = wait_until(&monitor, |t| t.seq >= 3).await;
    assert!(t.seq >= 3);
    assert_eq!(screen.last_region(), Some(region()));

    monitor.stop();
    assert_eq!(monitor.active_config().region, other);
    assert_eq!(monitor.pending_region(), None);

    // 중지 상태에서는 즉시 적용
    assert_eq!(
        monitor.update_region(region()).unwrap(),
        RegionUpdate::Applied
    );
    assert_eq!(monitor.active_config().region, region());
    assert!(monitor.update_region(RegionSpec::new(0, 0, 0, 0)).is_err());
}

#[tokio::test]
async fn config_update_takes_effect_on_next_tick() {
    let screen = FakeScreen::new();
    screen.show(frame_with_white(500));
    let speaker = CountingSpeaker::new();
    let monitor = monitor(&screen, &speaker);

    // 매치 밴드 100%: 5% 흰색은 매치가 아님
    let strict = ThresholdConfig {
        match_ratio: 1.0,
        ..fast(0.0)
    };
    monitor.start(region(), strict).unwrap();
    let t = wait_until(&monitor, |t| t.seq >= 5).await;
    assert_eq!(t.state, DetectionState::Idle);

    let invalid = ThresholdConfig {
        check_interval_seconds: 0.0,
        ..strict
    };
    assert!(monitor.update_config(invalid).is_err());
    assert_eq!(monitor.active_config().thresholds, strict);

    monitor.update_config(fast(0.0)).unwrap();
    let t = wait_until(&monitor, |t| t.alerts_dispatched == 1).await;
    assert!(matches!(
        t.state,
        DetectionState::Alerted | DetectionState::Cooldown
    ));
    monitor.stop();
    assert_eq!(speaker.plays(), 1);
}

#[tokio::test]
async fn audio_failure_is_swallowed() {
    let screen = FakeScreen::new();
    screen.show(frame_with_white(500));
    let speaker = CountingSpeaker::broken();
    let monitor = monitor(&screen, &speaker);

    monitor.start(region(), fast(0.02)).unwrap();
    let alerted = wait_until(&monitor, |t| t.alerts_dispatched == 1).await;
    let later = wait_until(&monitor, |t| t.seq >= alerted.seq + 5).await;

    assert!(monitor.is_running());
    assert_eq!(later.state, DetectionState::Cooldown);
    assert!(later.error.is_none());
    monitor.stop();

    assert_eq!(speaker.plays(), 1);
    assert!(monitor.self_test_audio().await.is_err());
}

#[tokio::test]
async fn context_mismatch_recovered_in_fresh_handle() {
    let screen = FakeScreen::new();
    screen.push(Err(CaptureError::ContextMismatch("stale device context".into())));
    let speaker = CountingSpeaker::new();
    let monitor = monitor(&screen, &speaker);

    let errors = Arc::new(AtomicU64::new(0));
    let seen = errors.clone();
    monitor.on_tick(move |t| {
        if t.error.is_some() {
            seen.fetch_add(1, Ordering::SeqCst);
        }
    });

    monitor.start(region(), fast(0.02)).unwrap();
    wait_until(&monitor, |t| t.seq >= 3).await;
    monitor.stop();

    assert_eq!(errors.load(Ordering::SeqCst), 0);
    assert_eq!(screen.opens(), 2);
}

#[tokio::test]
async fn repeated_context_mismatch_surfaces_error() {
    let screen = FakeScreen::new();
    screen.fail_with(Some(CaptureError::ContextMismatch("always".into())));
    let speaker = CountingSpeaker::new();
    let monitor = monitor(&screen, &speaker);

    monitor.start(region(), fast(0.02)).unwrap();
    let t = wait_until(&monitor, |t| t.seq >= 1).await;
    monitor.stop();

    assert!(t.error.is_some());
    // 틱마다 원래 시도 1회 + 새 핸들 재시도 1회, 그 이상은 없음
    assert_eq!(screen.grabs() % 2, 0);
    assert_eq!(screen.opens(), screen.grabs() / 2 + 1);
}

#[tokio::test]
async fn tick_callbacks_run_every_tick() {
    let screen = FakeScreen::new();
    let speaker = CountingSpeaker::new();
    let monitor = monitor(&screen, &speaker);

    let ticks = Arc::new(AtomicU64::new(0));
    let counter = ticks.clone();
    monitor.on_tick(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    monitor.start(region(), fast(0.02)).unwrap();
    let t = wait_until(&monitor, |t| t.seq >= 5).await;
    assert!(ticks.load(Ordering::SeqCst) >= t.seq);
    monitor.stop();
}

#[tokio::test]
async fn restart_uses_fresh_detector() {
    let screen = FakeScreen::new();
    screen.show(frame_with_white(500));
    let speaker = CountingSpeaker::new();
    let monitor = monitor(&screen, &speaker);

    monitor.start(region(), fast(0.02)).unwrap();
    wait_until(&monitor, |t| t.alerts_dispatched == 1).await;
    monitor.stop();
    assert_eq!(monitor.state(), DetectionState::Idle);

    monitor.start(region(), fast(0.02)).unwrap();
    let t = wait_until(&monitor, |t| t.alerts_dispatched == 1).await;
    monitor.stop();

    assert!(t.seq >= 2);
    assert_eq!(speaker.plays(), 2);
}
