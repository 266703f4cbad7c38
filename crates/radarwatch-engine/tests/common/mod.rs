//! 통합 테스트 공용 가짜 어댑터.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use parking_lot::Mutex;
use radarwatch_core::error::{AudioError, CaptureError};
use radarwatch_core::models::audio::SoundId;
use radarwatch_core::models::display::DisplayInfo;
use radarwatch_core::models::region::RegionSpec;
use radarwatch_core::ports::audio::AudioPlayer;
use radarwatch_core::ports::capture::{CaptureBackend, CaptureHandle};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 검은 배경 위에 흰 픽셀 `count`개를 찍은 100×100 프레임
pub fn frame_with_white(count: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
    for i in 0..count.min(10_000) {
        img.put_pixel(i % 100, i / 100, Rgb([255, 255, 255]));
    }
    img
}

/// 전부 검은 프레임
pub fn black_frame() -> RgbImage {
    RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]))
}

/// 테스트가 내용을 바꿀 수 있는 가짜 화면
#[derive(Default)]
pub struct FakeScreen {
    shared: Arc<ScreenState>,
}

#[derive(Default)]
pub struct ScreenState {
    /// 현재 화면 (None이면 검은 화면)
    frame: Mutex<Option<RgbImage>>,
    /// 우선 소비되는 1회성 결과
    script: Mutex<VecDeque<Result<RgbImage, CaptureError>>>,
    /// 설정되면 모든 캡처가 이 에러로 실패
    failure: Mutex<Option<CaptureError>>,
    /// 요청된 영역 기록
    regions: Mutex<Vec<RegionSpec>>,
    pub opens: AtomicUsize,
    pub grabs: AtomicUsize,
}

impl FakeScreen {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn show(&self, frame: RgbImage) {
        *self.shared.frame.lock() = Some(frame);
    }

    pub fn push(&self, outcome: Result<RgbImage, CaptureError>) {
        self.shared.script.lock().push_back(outcome);
    }

    pub fn fail_with(&self, error: Option<CaptureError>) {
        *self.shared.failure.lock() = error;
    }

    pub fn opens(&self) -> usize {
        self.shared.opens.load(Ordering::SeqCst)
    }

    pub fn grabs(&self) -> usize {
        self.shared.grabs.load(Ordering::SeqCst)
    }

    pub fn last_region(&self) -> Option<RegionSpec> {
        self.shared.regions.lock().last().copied()
    }
}

struct FakeHandle {
    shared: Arc<ScreenState>,
}

impl CaptureBackend for FakeScreen {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn open(&self) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        self.shared.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeHandle {
            shared: self.shared.clone(),
        }))
    }

    fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError> {
        Ok(vec![DisplayInfo {
            name: "fake".to_string(),
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
            is_primary: true,
        }])
    }
}

impl CaptureHandle for FakeHandle {
    fn grab(&mut self, region: &RegionSpec) -> Result<RgbImage, CaptureError> {
        self.shared.grabs.fetch_add(1, Ordering::SeqCst);
        self.shared.regions.lock().push(*region);

        if let Some(outcome) = self.shared.script.lock().pop_front() {
            return outcome;
        }
        if let Some(err) = self.shared.failure.lock().clone() {
            return Err(err);
        }
        Ok(self.shared.frame.lock().clone().unwrap_or_else(black_frame))
    }
}

/// 재생 횟수만 세는 스피커
#[derive(Default)]
pub struct CountingSpeaker {
    pub plays: AtomicUsize,
    pub tests: AtomicUsize,
    pub broken: bool,
}

impl CountingSpeaker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            broken: true,
            ..Default::default()
        })
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioPlayer for CountingSpeaker {
    async fn play(&self, _sound: SoundId) -> Result<(), AudioError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(AudioError::Playback("스피커 고장".to_string()));
        }
        Ok(())
    }

    async fn test(&self) -> Result<(), AudioError> {
        self.tests.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(AudioError::Unavailable("스피커 없음".to_string()));
        }
        Ok(())
    }
}
