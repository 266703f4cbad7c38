//! 설정 파일 관리.
//!
//! 플랫폼별 설정 디렉토리의 `config.json`을 로드/저장한다.
//! 로드 순서: 기본값 → 설정 파일 → `RADARWATCH_` 환경 변수
//! (예: `RADARWATCH_THRESHOLDS__WHITE_THRESHOLD=0.8`).

use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use parking_lot::RwLock;
use radarwatch_core::config::AppConfig;
use radarwatch_core::error::CoreError;
use radarwatch_core::models::preset::ActiveConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 설정 파일 이름
const CONFIG_FILE_NAME: &str = "config.json";

/// 환경 변수 접두사
const ENV_PREFIX: &str = "RADARWATCH";

/// 설정 관리자
///
/// 설정 파일의 로드/저장 및 런타임 설정 변경을 관리한다.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 현재 설정 (스레드 안전)
    config: Arc<RwLock<AppConfig>>,
    /// 설정 파일 경로
    config_path: PathBuf,
}

impl ConfigManager {
    /// 기본 경로로 설정 관리자 생성
    pub fn new() -> Result<Self, CoreError> {
        Self::with_path(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// 지정된 경로로 설정 관리자 생성
    ///
    /// 설정 파일이 없으면 기본 설정을 생성하고 저장한다.
    pub fn with_path(config_path: PathBuf) -> Result<Self, CoreError> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    CoreError::Config(format!(
                        "설정 디렉토리 생성 실패: {}: {e}",
                        parent.display()
                    ))
                })?;
                info!("설정 디렉토리 생성: {}", parent.display());
            }
        }

        if !config_path.exists() {
            Self::save_to_file(&config_path, &AppConfig::default_config())?;
            info!("기본 설정 파일 생성: {}", config_path.display());
        }

        let config = Self::load(&config_path)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
        })
    }

    /// 기본값 + 파일 + 환경 변수 병합 후 검증
    pub fn load(path: &Path) -> Result<AppConfig, CoreError> {
        let defaults = Config::try_from(&AppConfig::default_config())
            .map_err(|e| CoreError::Config(format!("기본 설정 변환 실패: {e}")))?;

        let merged = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Json).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                CoreError::Config(format!("설정 파일 파싱 실패: {}: {e}", path.display()))
            })?;

        let config: AppConfig = merged
            .try_deserialize()
            .map_err(|e| CoreError::Config(format!("설정 역직렬화 실패: {e}")))?;
        config.validate()?;

        debug!("설정 로드 완료: {}", path.display());
        Ok(config)
    }

    /// 현재 설정 반환 (복제본)
    pub fn get(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// 설정 검증 후 업데이트 및 파일 저장
    pub fn update(&self, new_config: AppConfig) -> Result<(), CoreError> {
        new_config.validate()?;
        Self::save_to_file(&self.config_path, &new_config)?;
        *self.config.write() = new_config;
        debug!("설정 저장 완료: {}", self.config_path.display());
        Ok(())
    }

    /// 특정 필드만 업데이트
    pub fn update_with<F>(&self, updater: F) -> Result<AppConfig, CoreError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.get();
        updater(&mut config);
        self.update(config.clone())?;
        Ok(config)
    }

    /// 활성 영역/임계값 저장
    pub fn save_active(&self, active: ActiveConfig) -> Result<AppConfig, CoreError> {
        let mut config = self.get();
        config.apply_active(active)?;
        self.update(config.clone())?;
        info!("활성 설정 저장: 영역 {}", active.region);
        Ok(config)
    }

    /// 설정 다시 로드
    pub fn reload(&self) -> Result<(), CoreError> {
        let config = Self::load(&self.config_path)?;
        *self.config.write() = config;
        info!("설정 다시 로드 완료");
        Ok(())
    }

    /// 설정 파일 경로 반환
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 플랫폼별 설정 디렉토리
    ///
    /// - macOS: `~/Library/Application Support/radarwatch/`
    /// - Windows: `%APPDATA%\radarwatch\config\`
    /// - Linux: `~/.config/radarwatch/`
    pub fn config_dir() -> Result<PathBuf, CoreError> {
        Ok(Self::project_dirs()?.config_dir().to_path_buf())
    }

    /// 플랫폼별 데이터 디렉토리 (로그, 프리셋)
    pub fn data_dir() -> Result<PathBuf, CoreError> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    fn project_dirs() -> Result<ProjectDirs, CoreError> {
        ProjectDirs::from("", "", "radarwatch")
            .ok_or_else(|| CoreError::Config("홈 디렉토리를 찾을 수 없습니다".to_string()))
    }

    /// 파일에 설정 저장
    fn save_to_file(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content).map_err(|e| {
            CoreError::Config(format!("설정 파일 저장 실패: {}: {e}", path.display()))
        })
    }
}
