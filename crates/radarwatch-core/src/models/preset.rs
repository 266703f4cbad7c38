//! 프리셋 / 활성 설정 모델.
//!
//! 엔진은 활성 설정을 소비만 한다. 저장소 입출력은 외부(앱) 책임.

use serde::{Deserialize, Serialize};

use super::region::RegionSpec;
use super::thresholds::ThresholdConfig;
use crate::error::ConfigError;

/// 현재 활성화된 영역 + 임계값 쌍 (직렬화 교환 단위)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveConfig {
    /// 감시 영역
    #[serde(default)]
    pub region: RegionSpec,
    /// 임계값
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

impl ActiveConfig {
    /// 영역과 임계값 모두 검증
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.region.validate()?;
        self.thresholds.validate()
    }
}

/// 이름이 붙은 설정 쌍
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// 프리셋 이름
    pub name: String,
    /// 감시 영역
    pub region: RegionSpec,
    /// 임계값
    pub thresholds: ThresholdConfig,
}

impl Preset {
    /// 활성 설정으로부터 프리셋 생성
    pub fn from_active(name: impl Into<String>, active: &ActiveConfig) -> Self {
        Self {
            name: name.into(),
            region: active.region,
            thresholds: active.thresholds,
        }
    }

    /// 활성 설정으로 변환
    pub fn to_active(&self) -> ActiveConfig {
        ActiveConfig {
            region: self.region,
            thresholds: self.thresholds,
        }
    }
}
