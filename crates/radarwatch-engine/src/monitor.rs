//! 모니터링 스케줄러.
//!
//! 전용 OS 스레드 하나가 current-thread tokio 런타임으로 파이프라인을 직렬 실행한다:
//! 설정 스냅샷 → 캡처 → 분류 → 상태 전이 → 알림 → 텔레메트리 게시.
//! 다음 틱 기한은 틱이 끝난 뒤 계산하므로 틱은 절대 겹치지 않는다.
//!
//! 제어 스레드와 워커는 `watch` 채널로만 통신한다. 워커는 틱 시작 시
//! 설정 스냅샷을 한 번 읽고, 틱 도중에는 다시 읽지 않는다.

use image::RgbImage;
use parking_lot::{Mutex, RwLock};
use radarwatch_core::config::PreviewConfig;
use radarwatch_core::error::{AudioError, ConfigError, SchedulerError, StartError};
use radarwatch_core::models::detection::DetectionState;
use radarwatch_core::models::preset::ActiveConfig;
use radarwatch_core::models::region::RegionSpec;
use radarwatch_core::models::thresholds::ThresholdConfig;
use radarwatch_core::ports::audio::AudioPlayer;
use radarwatch_core::ports::capture::CaptureBackend;
use radarwatch_vision::capture::RegionCapturer;
use radarwatch_vision::classifier::classify;
use radarwatch_vision::preview::make_preview;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::detector::SignalDetector;
use crate::dispatcher::AlertDispatcher;
use crate::telemetry::{Telemetry, TickTimer};

/// 워커 스레드 이름
const WORKER_THREAD_NAME: &str = "radarwatch-monitor";

/// 틱 콜백
pub type TickCallback = Box<dyn Fn(&Telemetry) + Send + Sync>;

/// 영역 변경 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionUpdate {
    /// 즉시 적용됨 (모니터링 중이 아님)
    Applied,
    /// 모니터링 중이라 대기열에 넣음. 중지 시 적용
    Queued,
}

/// 워커가 틱마다 읽는 설정 스냅샷
#[derive(Debug, Clone, Copy, PartialEq)]
struct TickConfig {
    region: RegionSpec,
    thresholds: ThresholdConfig,
}

/// 실행 중인 세션의 제어 핸들
struct Session {
    config_tx: watch::Sender<TickConfig>,
    pause_tx: watch::Sender<bool>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// 레이더 모니터 (제어 스레드에서 사용)
pub struct RadarMonitor {
    backend: Arc<dyn CaptureBackend>,
    dispatcher: Arc<AlertDispatcher>,
    preview: PreviewConfig,
    region: Mutex<RegionSpec>,
    pending_region: Mutex<Option<RegionSpec>>,
    thresholds: Mutex<ThresholdConfig>,
    session: Mutex<Option<Session>>,
    telemetry_tx: Arc<watch::Sender<Telemetry>>,
    callbacks: Arc<RwLock<Vec<TickCallback>>>,
}

impl RadarMonitor {
    /// 새 모니터 생성 (아직 시작하지 않음)
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        player: Arc<dyn AudioPlayer>,
        initial: ActiveConfig,
    ) -> Self {
        let (telemetry_tx, _) = watch::channel(Telemetry::default());
        Self {
            backend,
            dispatcher: Arc::new(AlertDispatcher::new(player)),
            preview: PreviewConfig::default(),
            region: Mutex::new(initial.region),
            pending_region: Mutex::new(None),
            thresholds: Mutex::new(initial.thresholds),
            session: Mutex::new(None),
            telemetry_tx: Arc::new(telemetry_tx),
            callbacks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// 프리뷰 크기 설정
    pub fn with_preview(mut self, preview: PreviewConfig) -> Self {
        self.preview = preview;
        self
    }

    /// 모니터링 시작.
    ///
    /// 입력 검증 실패는 `StartError::Config`, 스레드/런타임 생성 실패는
    /// `StartError::Scheduler`. 실패 시 실행 중인 세션은 남지 않는다.
    pub fn start(&self, region: RegionSpec, thresholds: ThresholdConfig) -> Result<(), StartError> {
        region.validate()?;
        thresholds.validate()?;

        let mut session = self.session.lock();
        if session.is_some() {
            return Err(SchedulerError::AlreadyRunning.into());
        }

        *self.region.lock() = region;
        *self.thresholds.lock() = thresholds;
        self.pending_region.lock().take();

        let (config_tx, config_rx) = watch::channel(TickConfig { region, thresholds });
        let (pause_tx, pause_rx) = watch::channel(false);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), SchedulerError>>(1);

        self.telemetry_tx.send_replace(Telemetry::default());

        let worker = Worker {
            backend: self.backend.clone(),
            dispatcher: self.dispatcher.clone(),
            preview: self.preview,
            telemetry_tx: self.telemetry_tx.clone(),
            callbacks: self.callbacks.clone(),
        };

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(SchedulerError::Runtime(e.to_string())));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                runtime.block_on(worker.run(config_rx, pause_rx, shutdown_rx));
            })
            .map_err(SchedulerError::Spawn)?;

        let ready = ready_rx.recv().unwrap_or_else(|_| {
            Err(SchedulerError::Runtime(
                "워커 스레드가 초기화 중 종료됨".to_string(),
            ))
        });
        if let Err(e) = ready {
            let _ = handle.join();
            return Err(e.into());
        }

        *session = Some(Session {
            config_tx,
            pause_tx,
            shutdown_tx,
            handle,
        });

        info!(
            "모니터링 시작: 영역 {region}, 주기 {:.2}초",
            thresholds.check_interval_seconds
        );
        Ok(())
    }

    /// 모니터링 중지 (멱등).
    ///
    /// 진행 중인 틱이 끝날 때까지 기다리고, 게시 상태를 Idle로 되돌린다.
    /// 틱 콜백 안에서 호출하면 안 된다.
    pub fn stop(&self) {
        let mut session = self.session.lock();
        let Some(active) = session.take() else {
            return;
        };

        let _ = active.shutdown_tx.send(true);
        if active.handle.join().is_err() {
            warn!("모니터링 스레드가 패닉으로 종료됨");
        }

        if let Some(region) = self.pending_region.lock().take() {
            *self.region.lock() = region;
            info!("대기 중이던 영역 변경 적용: {region}");
        }

        self.telemetry_tx.send_modify(|t| t.state = DetectionState::Idle);
        info!("모니터링 중지");
    }

    /// 일시 정지. 감지 상태는 유지된다.
    pub fn pause(&self) {
        if let Some(session) = self.session.lock().as_ref() {
            if !session.pause_tx.send_replace(true) {
                info!("모니터링 일시 정지");
            }
        }
    }

    /// 재개
    pub fn resume(&self) {
        if let Some(session) = self.session.lock().as_ref() {
            if session.pause_tx.send_replace(false) {
                info!("모니터링 재개");
            }
        }
    }

    /// 임계값 변경 (다음 틱부터 적용)
    pub fn update_config(&self, thresholds: ThresholdConfig) -> Result<(), ConfigError> {
        thresholds.validate()?;
        *self.thresholds.lock() = thresholds;

        if let Some(session) = self.session.lock().as_ref() {
            session
                .config_tx
                .send_modify(|snapshot| snapshot.thresholds = thresholds);
        }
        debug!("임계값 갱신: {thresholds:?}");
        Ok(())
    }

    /// 영역 변경. 모니터링 중이면 중지 시점까지 보류한다.
    pub fn update_region(&self, region: RegionSpec) -> Result<RegionUpdate, ConfigError> {
        region.validate()?;

        if self.session.lock().is_some() {
            *self.pending_region.lock() = Some(region);
            info!("모니터링 중: 영역 변경 {region}은(는) 중지 후 적용");
            Ok(RegionUpdate::Queued)
        } else {
            *self.region.lock() = region;
            info!("감시 영역 변경: {region}");
            Ok(RegionUpdate::Applied)
        }
    }

    /// 현재 적용 중인 영역/임계값 (보류 중인 영역 변경은 제외)
    pub fn active_config(&self) -> ActiveConfig {
        ActiveConfig {
            region: *self.region.lock(),
            thresholds: *self.thresholds.lock(),
        }
    }

    /// 저장된 설정 적용 (검증 후)
    pub fn apply_config(&self, active: ActiveConfig) -> Result<RegionUpdate, ConfigError> {
        active.validate()?;
        self.update_config(active.thresholds)?;
        self.update_region(active.region)
    }

    /// 보류 중인 영역 변경
    pub fn pending_region(&self) -> Option<RegionSpec> {
        *self.pending_region.lock()
    }

    /// 틱 콜백 등록 (워커 스레드에서 실행됨)
    pub fn on_tick<F>(&self, callback: F)
    where
        F: Fn(&Telemetry) + Send + Sync + 'static,
    {
        self.callbacks.write().push(Box::new(callback));
    }

    /// 최신 텔레메트리 구독
    pub fn subscribe(&self) -> watch::Receiver<Telemetry> {
        self.telemetry_tx.subscribe()
    }

    /// 최신 텔레메트리 복사본
    pub fn latest(&self) -> Telemetry {
        self.telemetry_tx.borrow().clone()
    }

    /// 모니터링 중인지
    pub fn is_running(&self) -> bool {
        self.session.lock().is_some()
    }

    /// 일시 정지 중인지
    pub fn is_paused(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|s| *s.pause_tx.borrow())
    }

    /// 마지막으로 게시된 감지 상태
    pub fn state(&self) -> DetectionState {
        self.telemetry_tx.borrow().state
    }

    /// 알림음 셀프 테스트
    pub async fn self_test_audio(&self) -> Result<(), AudioError> {
        self.dispatcher.self_test().await
    }
}

impl Drop for RadarMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================
// 워커
// ============================================================

/// 워커 스레드로 옮겨지는 의존성 묶음
struct Worker {
    backend: Arc<dyn CaptureBackend>,
    dispatcher: Arc<AlertDispatcher>,
    preview: PreviewConfig,
    telemetry_tx: Arc<watch::Sender<Telemetry>>,
    callbacks: Arc<RwLock<Vec<TickCallback>>>,
}

/// 세션 동안 워커 스레드에만 존재하는 상태
struct WorkerState {
    capturer: RegionCapturer,
    detector: SignalDetector,
    timer: TickTimer,
    last_preview: Option<RgbImage>,
    last_error: Option<String>,
    seq: u64,
    alerts: u64,
}

impl Worker {
    async fn run(
        self,
        mut config_rx: watch::Receiver<TickConfig>,
        mut pause_rx: watch::Receiver<bool>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        // 캡처 핸들은 이 스레드에서 열리고 이 스레드를 떠나지 않는다
        let mut state = WorkerState {
            capturer: RegionCapturer::new(self.backend.clone()),
            detector: SignalDetector::new(),
            timer: TickTimer::default(),
            last_preview: None,
            last_error: None,
            seq: 0,
            alerts: 0,
        };
        let mut next_tick = tokio::time::Instant::now();

        debug!("모니터링 루프 시작");

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            let paused = *pause_rx.borrow_and_update();

            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = pause_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep_until(next_tick), if !paused => {
                    let snapshot = *config_rx.borrow_and_update();
                    self.tick(&mut state, &snapshot).await;
                    let now = tokio::time::Instant::now();
                    next_tick = now
                        .checked_add(snapshot.thresholds.check_interval())
                        .unwrap_or_else(|| {
                            warn!("검사 주기가 시계 범위를 넘음, 기본 주기 사용");
                            now + Duration::from_secs_f64(ThresholdConfig::DEFAULT_CHECK_INTERVAL)
                        });
                }
            }
        }

        state.capturer.reset();
        debug!("모니터링 루프 종료 (틱 {}회)", state.seq);
    }

    async fn tick(&self, state: &mut WorkerState, snapshot: &TickConfig) {
        let started = Instant::now();
        state.seq += 1;

        let mut telemetry = Telemetry {
            seq: state.seq,
            ..Default::default()
        };

        match state.capturer.capture(&snapshot.region) {
            Ok(frame) => {
                let result = classify(&frame, &snapshot.thresholds);
                let transition =
                    state
                        .detector
                        .step(&result, &snapshot.thresholds, frame.captured_instant);

                if let Some(event) = transition.event {
                    state.alerts += 1;
                    self.dispatcher.dispatch(&event).await;
                }

                match make_preview(&frame.pixels, &self.preview) {
                    Ok(preview) => state.last_preview = Some(preview),
                    Err(e) => debug!("프리뷰 생성 실패: {e}"),
                }

                if state.last_error.take().is_some() {
                    info!("캡처 복구됨");
                }

                telemetry.captured_at = Some(frame.captured_at);
                telemetry.low_contrast = result.is_inconclusive();
                telemetry.classification = Some(result);
                telemetry.state = transition.to;
            }
            Err(e) => {
                let message = e.to_string();
                if state.last_error.as_deref() != Some(message.as_str()) {
                    warn!("캡처 실패, 상태 유지: {message}");
                } else {
                    debug!("캡처 실패 반복: {message}");
                }
                state.last_error = Some(message.clone());
                telemetry.error = Some(message);
                telemetry.state = state.detector.state();
            }
        }

        telemetry.preview = state.last_preview.clone();
        telemetry.alerts_dispatched = state.alerts;
        telemetry.tick_duration = started.elapsed();
        telemetry.avg_tick_duration = state.timer.record(telemetry.tick_duration);

        for callback in self.callbacks.read().iter() {
            callback(&telemetry);
        }
        self.telemetry_tx.send_replace(telemetry);
    }
}
