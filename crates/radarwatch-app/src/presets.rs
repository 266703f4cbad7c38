//! 프리셋 저장소.
//!
//! 이름 → (영역, 임계값) 쌍을 `presets.json`에 보관한다.
//! 엔진은 활성 설정만 소비하고, 저장소 편집은 여기서만 한다.

use parking_lot::RwLock;
use radarwatch_core::error::CoreError;
use radarwatch_core::models::preset::{ActiveConfig, Preset};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 프리셋 파일 이름
pub const PRESETS_FILE_NAME: &str = "presets.json";

/// JSON 파일 기반 프리셋 저장소
#[derive(Debug)]
pub struct PresetStore {
    path: PathBuf,
    presets: RwLock<BTreeMap<String, Preset>>,
}

impl PresetStore {
    /// 저장소 열기. 파일이 없으면 빈 저장소로 시작한다.
    pub fn open(path: PathBuf) -> Result<Self, CoreError> {
        let presets = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        debug!("프리셋 {}개 로드: {}", presets.len(), path.display());
        Ok(Self {
            path,
            presets: RwLock::new(presets),
        })
    }

    /// 현재 설정을 이름으로 저장 (같은 이름은 덮어씀)
    pub fn add(&self, name: &str, active: &ActiveConfig) -> Result<Preset, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Config("프리셋 이름이 비어 있음".to_string()));
        }
        active.validate()?;

        let preset = Preset::from_active(name, active);
        let mut presets = self.presets.write();
        let previous = presets.insert(name.to_string(), preset.clone());
        if let Err(e) = self.persist(&presets) {
            match previous {
                Some(p) => presets.insert(name.to_string(), p),
                None => presets.remove(name),
            };
            return Err(e);
        }

        info!("프리셋 저장: {name}");
        Ok(preset)
    }

    /// 이름으로 조회
    pub fn get(&self, name: &str) -> Result<Preset, CoreError> {
        self.presets
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    /// 삭제
    pub fn delete(&self, name: &str) -> Result<(), CoreError> {
        let mut presets = self.presets.write();
        let removed = presets.remove(name).ok_or_else(|| not_found(name))?;
        if let Err(e) = self.persist(&presets) {
            presets.insert(name.to_string(), removed);
            return Err(e);
        }
        info!("프리셋 삭제: {name}");
        Ok(())
    }

    /// 저장된 이름 목록 (정렬됨)
    pub fn names(&self) -> Vec<String> {
        self.presets.read().keys().cloned().collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, presets: &BTreeMap<String, Preset>) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(presets)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

fn not_found(name: &str) -> CoreError {
    CoreError::NotFound {
        resource_type: "Preset".to_string(),
        id: name.to_string(),
    }
}
