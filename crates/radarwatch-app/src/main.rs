//! # radarwatch
//!
//! RadarWatch 바이너리 진입점.
//! 설정/프리셋 로드, 어댑터 와이어링, 모니터링 세션 라이프사이클.

mod commands;
mod config_manager;
mod console;
mod keep_awake;
mod lifecycle;
mod logging;
mod presets;

use anyhow::{Context, Result};
use clap::Parser;
use radarwatch_audio::{RodioPlayer, SilentPlayer};
use radarwatch_core::config::AppConfig;
use radarwatch_core::models::detection::DetectionState;
use radarwatch_core::ports::audio::AudioPlayer;
use radarwatch_core::ports::capture::CaptureBackend;
use radarwatch_engine::RadarMonitor;
use radarwatch_vision::capture::XcapBackend;
use radarwatch_vision::quality::check_bounds;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config_manager::ConfigManager;
use crate::keep_awake::KeepAwake;
use crate::lifecycle::LifecycleManager;
use crate::presets::{PresetStore, PRESETS_FILE_NAME};

/// RadarWatch
///
/// 화면의 레이더 영역을 감시해 신호가 나타나면 알림음을 재생한다.
#[derive(Parser, Debug)]
#[command(name = "radarwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 감시 영역 X
    #[arg(long, allow_hyphen_values = true)]
    x: Option<i32>,

    /// 감시 영역 Y
    #[arg(long, allow_hyphen_values = true)]
    y: Option<i32>,

    /// 감시 영역 너비
    #[arg(long)]
    width: Option<u32>,

    /// 감시 영역 높이
    #[arg(long)]
    height: Option<u32>,

    /// 흰색 임계값 (0.0 ~ 1.0)
    #[arg(long)]
    white: Option<f64>,

    /// 파란색 임계값 (0.0 ~ 1.0)
    #[arg(long)]
    blue: Option<f64>,

    /// 검사 주기 (초)
    #[arg(long)]
    interval: Option<f64>,

    /// 최소 대비 (0.0 이상)
    #[arg(long)]
    min_contrast: Option<f64>,

    /// 디바운스 (초)
    #[arg(long)]
    debounce: Option<f64>,

    /// 알림음 끄기
    #[arg(long)]
    mute: bool,

    /// CLI 오버라이드를 설정 파일에 저장
    #[arg(long)]
    save: bool,

    /// 프리셋 불러오기 (설정 파일에도 반영)
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,

    /// 현재 설정을 프리셋으로 저장 후 종료
    #[arg(long, value_name = "NAME")]
    save_preset: Option<String>,

    /// 프리셋 삭제 후 종료
    #[arg(long, value_name = "NAME")]
    delete_preset: Option<String>,

    /// 프리셋 목록 출력 후 종료
    #[arg(long)]
    list_presets: bool,

    /// 디스플레이 목록 출력 후 종료
    #[arg(long)]
    list_displays: bool,

    /// 영역 테스트 캡처 후 종료 (경로를 주면 PNG 저장)
    #[arg(long, value_name = "PNG", num_args = 0..=1)]
    test_area: Option<Option<PathBuf>>,

    /// 알림음 테스트 후 종료
    #[arg(long)]
    test_sound: bool,

    /// 상태 로그 주기 (초, 0이면 끔)
    #[arg(long, default_value = "30")]
    status_interval: u64,

    /// 대화형 콘솔 끄기
    #[arg(long)]
    no_console: bool,

    /// 모니터링 중 시스템 절전 허용
    #[arg(long)]
    allow_sleep: bool,
}

impl Args {
    /// CLI 오버라이드 반영
    fn apply_overrides(&self, config: &mut AppConfig) -> bool {
        let mut changed = false;

        if let Some(v) = self.x {
            config.region.x = v;
            changed = true;
        }
        if let Some(v) = self.y {
            config.region.y = v;
            changed = true;
        }
        if let Some(v) = self.width {
            config.region.width = v;
            changed = true;
        }
        if let Some(v) = self.height {
            config.region.height = v;
            changed = true;
        }
        if let Some(v) = self.white {
            config.thresholds.white_threshold = v;
            changed = true;
        }
        if let Some(v) = self.blue {
            config.thresholds.blue_threshold = v;
            changed = true;
        }
        if let Some(v) = self.interval {
            config.thresholds.check_interval_seconds = v;
            changed = true;
        }
        if let Some(v) = self.min_contrast {
            config.thresholds.min_contrast = v;
            changed = true;
        }
        if let Some(v) = self.debounce {
            config.thresholds.debounce_seconds = v;
            changed = true;
        }
        if self.mute {
            config.alert.enabled = false;
            changed = true;
        }
        changed
    }
}

/// 배너 출력
fn print_banner(config: &AppConfig) {
    println!();
    println!("╔══════════════════════════════════════════════╗");
    println!("║                                              ║");
    println!("║   ◉  R A D A R W A T C H                     ║");
    println!("║      레이더 신호 감지 알림                   ║");
    println!("║                                              ║");
    println!("╚══════════════════════════════════════════════╝");
    println!();
    println!("  영역     {}", config.region);
    println!(
        "  임계값   흰색 {:.2} / 파란색 {:.2} / 대비 {:.2}",
        config.thresholds.white_threshold,
        config.thresholds.blue_threshold,
        config.thresholds.min_contrast
    );
    println!(
        "  주기     {}초 (디바운스 {}초)",
        config.thresholds.check_interval_seconds, config.thresholds.debounce_seconds
    );
    println!(
        "  알림음   {}",
        if config.alert.enabled { "켜짐" } else { "꺼짐" }
    );
    println!();
}

/// 알림음 플레이어 생성. 실패하면 무음으로 대체.
fn build_player(config: &AppConfig) -> Arc<dyn AudioPlayer> {
    if !config.alert.enabled {
        info!("알림음 비활성화");
        return Arc::new(SilentPlayer);
    }

    match RodioPlayer::spawn(config.alert.tone) {
        Ok(player) => {
            if !player.device_available() {
                warn!("오디오 출력 장치 없음, 콘솔 벨로 대체");
            }
            Arc::new(player)
        }
        Err(e) => {
            warn!("오디오 초기화 실패, 무음으로 실행: {e}");
            Arc::new(SilentPlayer)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 설정 로드 (로깅 초기화 전이므로 에러는 그대로 반환)
    let config_manager = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .context("설정 로드 실패")?;

    let data_dir = match ConfigManager::data_dir() {
        Ok(dir) => dir,
        Err(_) => config_manager
            .config_path()
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let log_file = logging::log_file_path(&config_manager.get().logging, &data_dir);
    if let Some(warning) = logging::init(&args.log_level, log_file.as_deref()) {
        eprintln!("⚠️  {warning}");
    }
    if let Some(path) = &log_file {
        info!("진단 로그: {}", path.display());
    }

    let presets = PresetStore::open(data_dir.join(PRESETS_FILE_NAME)).context("프리셋 로드 실패")?;

    // ── 프리셋 명령 ──

    if args.list_presets {
        commands::list_presets(&presets);
        return Ok(());
    }
    if let Some(name) = &args.delete_preset {
        return commands::delete_preset(&presets, name);
    }
    if let Some(name) = &args.preset {
        commands::load_preset(&presets, &config_manager, name)?;
    }

    // ── CLI 오버라이드 ──

    let mut config = config_manager.get();
    if args.apply_overrides(&mut config) {
        config.validate().context("CLI 인자 검증 실패")?;
        if args.save {
            config_manager.update(config.clone()).context("설정 저장 실패")?;
            info!("설정 저장: {}", config_manager.config_path().display());
        }
    }

    if let Some(name) = &args.save_preset {
        return commands::save_preset(&presets, name, &config.active());
    }

    // ── 어댑터 생성 ──

    let backend: Arc<dyn CaptureBackend> = Arc::new(XcapBackend::new());

    if args.list_displays {
        return commands::list_displays(backend.as_ref(), &config.region);
    }
    if let Some(save_to) = &args.test_area {
        commands::test_area(
            backend.clone(),
            &config.region,
            &config.thresholds,
            save_to.as_deref(),
        )?;
        return Ok(());
    }

    let player = build_player(&config);

    if args.test_sound {
        return commands::test_sound(player.as_ref()).await;
    }

    print_banner(&config);

    match backend.displays() {
        Ok(displays) => {
            if let Err(e) = check_bounds(&displays, &config.region) {
                warn!("좌표 점검 실패: {e}");
                println!("⚠️  {e}");
                println!("   --list-displays 로 디스플레이 배치를 확인하세요.");
            }
        }
        Err(e) => warn!("디스플레이 조회 실패: {e}"),
    }

    // ── 모니터링 ──

    let monitor = Arc::new(
        RadarMonitor::new(backend, player, config.active()).with_preview(config.preview),
    );

    let low_contrast = AtomicBool::new(false);
    monitor.on_tick(move |t| {
        if low_contrast.swap(t.low_contrast, Ordering::Relaxed) != t.low_contrast {
            if t.low_contrast {
                warn!("대비 부족: 판정 보류 중 (영역/밝기 확인)");
            } else {
                info!("대비 정상 복귀");
            }
        }
        if t.state == DetectionState::Alerted {
            println!("🔔 신호 감지! ({})", chrono::Local::now().format("%H:%M:%S"));
        }
    });

    // 종료 때까지 유지. 실패해도 모니터링은 계속한다.
    let _keep_awake = if args.allow_sleep {
        None
    } else {
        match KeepAwake::acquire() {
            Ok(guard) => Some(guard),
            Err(e) => {
                warn!("절전 방지 실패, 계속 진행: {e}");
                None
            }
        }
    };

    monitor
        .start(config.region, config.thresholds)
        .context("모니터링 시작 실패")?;

    let lifecycle = Arc::new(LifecycleManager::new());

    if args.status_interval > 0 {
        let monitor = monitor.clone();
        let mut shutdown = lifecycle.subscribe();
        let period = Duration::from_secs(args.status_interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => info!("상태: {}", monitor.latest()),
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    if !args.no_console {
        println!("{}", console::HELP);
        tokio::spawn(console::run(
            monitor.clone(),
            config_manager.clone(),
            lifecycle.clone(),
        ));
    }

    lifecycle.wait().await;

    // 진행 중인 틱이 끝날 때까지 기다리므로 블로킹 스레드에서 중지
    let stopper = monitor.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || stopper.stop()).await {
        warn!("모니터링 중지 실패: {e}");
    }

    let last = monitor.latest();
    info!("RadarWatch 종료 (알림 {}회)", last.alerts_dispatched);
    Ok(())
}
