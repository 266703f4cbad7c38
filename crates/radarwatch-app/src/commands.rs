//! 1회성 CLI 명령.
//!
//! 명령 처리 후 프로세스는 모니터링 없이 종료한다.

use anyhow::{Context, Result};
use radarwatch_core::models::display::virtual_bounds;
use radarwatch_core::models::preset::ActiveConfig;
use radarwatch_core::models::region::RegionSpec;
use radarwatch_core::models::thresholds::ThresholdConfig;
use radarwatch_core::ports::audio::AudioPlayer;
use radarwatch_core::ports::capture::CaptureBackend;
use radarwatch_vision::quality::{locate_display, probe_region, RegionProbe};
use std::path::Path;
use std::sync::Arc;

use crate::config_manager::ConfigManager;
use crate::presets::PresetStore;

/// 연결된 디스플레이 목록 출력
pub fn list_displays(backend: &dyn CaptureBackend, region: &RegionSpec) -> Result<()> {
    let displays = backend.displays().context("디스플레이 조회 실패")?;

    println!("🖥  디스플레이 {}개 ({})", displays.len(), backend.name());
    for (i, d) in displays.iter().enumerate() {
        println!(
            "  [{i}] {}{}: ({}, {}) {}x{}",
            d.name,
            if d.is_primary { " (주)" } else { "" },
            d.x,
            d.y,
            d.width,
            d.height
        );
    }
    if let Some(screen) = virtual_bounds(&displays) {
        println!("   가상 화면: {screen}");
    }

    match locate_display(&displays, region) {
        Some(d) => println!("✅ 현재 감시 영역 {region} → '{}'", d.name),
        None => println!("⚠️  현재 감시 영역 {region}이(가) 한 디스플레이 안에 있지 않음"),
    }
    Ok(())
}

/// 영역 테스트 캡처. `save_to`가 있으면 PNG로 저장한다.
pub fn test_area(
    backend: Arc<dyn CaptureBackend>,
    region: &RegionSpec,
    thresholds: &ThresholdConfig,
    save_to: Option<&Path>,
) -> Result<RegionProbe> {
    let probe = probe_region(backend, region, thresholds)
        .with_context(|| format!("영역 {region} 테스트 캡처 실패"))?;

    let c = &probe.classification;
    println!("📷 테스트 캡처 {region}");
    println!("   픽셀: {}", c.total_pixels);
    println!(
        "   흰색 {:.2}% / 파란색 {:.2}% / 검은색 {:.1}%",
        c.white_ratio * 100.0,
        c.blue_ratio * 100.0,
        probe.dark_percent()
    );
    println!(
        "   대비 {}{}",
        c.contrast,
        if c.contrast_ok { "" } else { " (부족, 판정 보류)" }
    );
    if c.is_match(thresholds.match_ratio) {
        println!("   🔔 현재 설정으로 신호 매치");
    }
    if probe.mostly_black {
        println!("⚠️  검은 픽셀이 대부분입니다. 좌표가 올바른지 확인하세요.");
    }

    if let Some(path) = save_to {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("디렉토리 생성 실패: {}", parent.display()))?;
            }
        }
        probe
            .pixels
            .save(path)
            .with_context(|| format!("PNG 저장 실패: {}", path.display()))?;
        println!("💾 저장: {}", path.display());
    }

    Ok(probe)
}

/// 알림음 셀프 테스트
pub async fn test_sound(player: &dyn AudioPlayer) -> Result<()> {
    println!("🔊 알림음 테스트...");
    match player.test().await {
        Ok(()) => {
            println!("✅ 알림음 재생 완료");
            Ok(())
        }
        Err(e) => {
            println!("⚠️  {e} (콘솔 벨로 대체)");
            Err(e).context("알림음 테스트 실패")
        }
    }
}

/// 프리셋 목록 출력
pub fn list_presets(store: &PresetStore) {
    let names = store.names();
    if names.is_empty() {
        println!("저장된 프리셋 없음 ({})", store.path().display());
        return;
    }
    println!("📋 프리셋 {}개", names.len());
    for name in names {
        if let Ok(p) = store.get(&name) {
            println!(
                "  - {name}: {} 흰색 {:.2} 파란색 {:.2} 주기 {}초",
                p.region,
                p.thresholds.white_threshold,
                p.thresholds.blue_threshold,
                p.thresholds.check_interval_seconds
            );
        }
    }
}

/// 현재 활성 설정을 프리셋으로 저장
pub fn save_preset(store: &PresetStore, name: &str, active: &ActiveConfig) -> Result<()> {
    store
        .add(name, active)
        .with_context(|| format!("프리셋 '{name}' 저장 실패"))?;
    println!("💾 프리셋 저장: {name}");
    Ok(())
}

/// 프리셋 삭제
pub fn delete_preset(store: &PresetStore, name: &str) -> Result<()> {
    store
        .delete(name)
        .with_context(|| format!("프리셋 '{name}' 삭제 실패"))?;
    println!("🗑  프리셋 삭제: {name}");
    Ok(())
}

/// 프리셋을 활성 설정으로 불러오고 `config.json`에도 반영
pub fn load_preset(
    store: &PresetStore,
    config: &ConfigManager,
    name: &str,
) -> Result<ActiveConfig> {
    let preset = store
        .get(name)
        .with_context(|| format!("프리셋 '{name}' 불러오기 실패"))?;
    let active = preset.to_active();
    config
        .save_active(active)
        .context("프리셋을 설정 파일에 반영 실패")?;
    println!("📂 프리셋 적용: {name} {}", active.region);
    Ok(active)
}
