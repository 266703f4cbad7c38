//! 로깅 초기화.
//!
//! stdout fmt 레이어 + 진단 로그 파일(append) 레이어.
//! `RUST_LOG`가 있으면 그대로 쓰고, 없으면 `--log-level`을 radarwatch 크레이트에만 적용한다.

use radarwatch_core::config::LoggingConfig;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const CRATES: [&str; 5] = [
    "radarwatch",
    "radarwatch_core",
    "radarwatch_vision",
    "radarwatch_audio",
    "radarwatch_engine",
];

/// 크레이트별 필터 지시어 생성
pub fn default_directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|c| format!("{c}={level}"))
        .chain(std::iter::once("warn".to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// 로그 파일 경로 (설정이 꺼져 있으면 None)
pub fn log_file_path(config: &LoggingConfig, data_dir: &Path) -> Option<PathBuf> {
    config
        .file_enabled
        .then(|| data_dir.join(&config.file_name))
}

/// 전역 subscriber 설치.
///
/// 로그 파일을 열 수 없으면 stdout만 사용하고 경로와 함께 경고를 반환한다.
pub fn init(level: &str, log_file: Option<&Path>) -> Option<String> {
    let mut warning = None;

    let file_layer = log_file.and_then(|path| match open_append(path) {
        Ok(file) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file))
                .with_filter(env_filter(level)),
        ),
        Err(e) => {
            warning = Some(format!("로그 파일 열기 실패: {}: {e}", path.display()));
            None
        }
    });

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_filter(env_filter(level));

    let _ = tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init();

    warning
}

fn open_append(path: &Path) -> std::io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}
