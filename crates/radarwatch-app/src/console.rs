//! 대화형 콘솔.
//!
//! 모니터링 중 표준 입력으로 일시 정지/재개, 상태 조회, 영역·임계값 변경을 받는다.

use radarwatch_core::models::region::RegionSpec;
use radarwatch_core::models::thresholds::ThresholdConfig;
use radarwatch_engine::{RadarMonitor, RegionUpdate};
use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config_manager::ConfigManager;
use crate::lifecycle::LifecycleManager;

/// 콘솔 명령
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Pause,
    Resume,
    Status,
    Sound,
    Region(RegionSpec),
    White(f64),
    Blue(f64),
    Interval(f64),
    Save,
    Help,
    Quit,
}

pub const HELP: &str = "\
명령: start | stop | pause | resume | status | sound | region <x> <y> <w> <h>
      white <0~1> | blue <0~1> | interval <초> | save | help | quit";

/// 한 줄 파싱. 빈 줄은 `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();

    let cmd = match (head.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("start", []) => ConsoleCommand::Start,
        ("stop", []) => ConsoleCommand::Stop,
        ("pause" | "p", []) => ConsoleCommand::Pause,
        ("resume" | "r", []) => ConsoleCommand::Resume,
        ("status" | "s", []) => ConsoleCommand::Status,
        ("sound", []) => ConsoleCommand::Sound,
        ("save", []) => ConsoleCommand::Save,
        ("help" | "?", []) => ConsoleCommand::Help,
        ("quit" | "q" | "exit", []) => ConsoleCommand::Quit,
        ("region", [x, y, w, h]) => ConsoleCommand::Region(RegionSpec::new(
            number(x)?,
            number(y)?,
            number(w)?,
            number(h)?,
        )),
        ("white", [v]) => ConsoleCommand::White(number(v)?),
        ("blue", [v]) => ConsoleCommand::Blue(number(v)?),
        ("interval", [v]) => ConsoleCommand::Interval(number(v)?),
        _ => return Err(format!("알 수 없는 명령: {}", line.trim())),
    };
    Ok(Some(cmd))
}

fn number<T: std::str::FromStr>(s: &str) -> Result<T, String> {
    s.parse().map_err(|_| format!("숫자가 아님: {s}"))
}

/// 명령 실행. `Quit`이면 false.
pub async fn execute(
    cmd: ConsoleCommand,
    monitor: &Arc<RadarMonitor>,
    config: &ConfigManager,
) -> bool {
    match cmd {
        ConsoleCommand::Start => {
            if monitor.is_running() {
                println!("이미 모니터링 중");
            } else {
                let active = monitor.active_config();
                match monitor.start(active.region, active.thresholds) {
                    Ok(()) => println!("▶️  모니터링 시작: 영역 {}", active.region),
                    Err(e) => println!("⚠️  {e}"),
                }
            }
        }
        ConsoleCommand::Stop => {
            if !monitor.is_running() {
                println!("이미 중지됨");
            } else {
                // 진행 중인 틱을 기다리므로 블로킹 스레드에서 중지
                let stopper = monitor.clone();
                match tokio::task::spawn_blocking(move || stopper.stop()).await {
                    Ok(()) => println!("⏹  모니터링 중지 (start로 재시작)"),
                    Err(e) => warn!("모니터링 중지 실패: {e}"),
                }
            }
        }
        ConsoleCommand::Pause => {
            monitor.pause();
            println!("⏸  일시 정지");
        }
        ConsoleCommand::Resume => {
            monitor.resume();
            println!("▶️  재개");
        }
        ConsoleCommand::Status => {
            let active = monitor.active_config();
            let suffix = if !monitor.is_running() {
                " (중지됨)"
            } else if monitor.is_paused() {
                " (일시 정지)"
            } else {
                ""
            };
            println!("{}{suffix}", monitor.latest());
            println!("   영역 {}", active.region);
            if let Some(pending) = monitor.pending_region() {
                println!("   보류 중인 영역 {pending} (재시작 시 적용)");
            }
        }
        ConsoleCommand::Sound => match monitor.self_test_audio().await {
            Ok(()) => println!("🔊 알림음 재생"),
            Err(e) => println!("⚠️  {e}"),
        },
        ConsoleCommand::Region(region) => match monitor.update_region(region) {
            Ok(RegionUpdate::Applied) => println!("영역 변경: {region}"),
            Ok(RegionUpdate::Queued) => {
                println!("영역 변경 {region}: stop 후 start 시 적용 (save로 저장 가능)")
            }
            Err(e) => println!("⚠️  {e}"),
        },
        ConsoleCommand::White(v) => update_thresholds(monitor, |t| t.white_threshold = v),
        ConsoleCommand::Blue(v) => update_thresholds(monitor, |t| t.blue_threshold = v),
        ConsoleCommand::Interval(v) => {
            update_thresholds(monitor, |t| t.check_interval_seconds = v)
        }
        ConsoleCommand::Save => {
            let mut active = monitor.active_config();
            if let Some(pending) = monitor.pending_region() {
                active.region = pending;
            }
            match config.save_active(active) {
                Ok(_) => println!("💾 설정 저장: {}", config.config_path().display()),
                Err(e) => println!("⚠️  {e}"),
            }
        }
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => return false,
    }
    true
}

fn update_thresholds<F>(monitor: &RadarMonitor, edit: F)
where
    F: FnOnce(&mut ThresholdConfig),
{
    let mut thresholds = monitor.active_config().thresholds;
    edit(&mut thresholds);
    match monitor.update_config(thresholds) {
        Ok(()) => println!(
            "임계값 갱신: 흰색 {:.2} 파란색 {:.2} 주기 {}초",
            thresholds.white_threshold,
            thresholds.blue_threshold,
            thresholds.check_interval_seconds
        ),
        Err(e) => println!("⚠️  {e}"),
    }
}

/// 표준 입력을 읽는 분리된 스레드 시작.
///
/// 블로킹 읽기가 런타임 종료를 붙잡지 않도록 tokio 밖에서 읽는다.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = thread::Builder::new()
        .name("radarwatch-console".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("표준 입력 읽기 실패: {e}");
                        return;
                    }
                }
            }
            debug!("표준 입력 종료, 콘솔 비활성화");
        });
    if let Err(e) = spawned {
        warn!("콘솔 스레드 생성 실패: {e}");
    }
    rx
}

/// 콘솔 루프. `quit`이면 종료 신호를 보내고, 종료 신호를 받으면 끝난다.
pub async fn run(
    monitor: Arc<RadarMonitor>,
    config: ConfigManager,
    lifecycle: Arc<LifecycleManager>,
) {
    let mut lines = spawn_stdin_reader();
    let mut shutdown = lifecycle.subscribe();

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    return;
                };

                match parse_command(&line) {
                    Ok(Some(cmd)) => {
                        if !execute(cmd, &monitor, &config).await {
                            lifecycle.shutdown();
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(msg) => println!("{msg}\n{HELP}"),
                }
            }
            _ = shutdown.changed() => return,
        }
    }
}
