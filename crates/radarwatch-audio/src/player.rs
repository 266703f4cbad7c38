//! rodio 알림음 플레이어.
//!
//! 출력 스트림은 `Send`가 아니므로 전용 오디오 스레드가 소유하고,
//! 재생 요청은 채널로 전달한다. `play()`는 재생을 기다리지 않는다.

use async_trait::async_trait;
use radarwatch_core::error::AudioError;
use radarwatch_core::models::audio::{AlertTone, SoundId};
use radarwatch_core::ports::audio::AudioPlayer;
use rodio::source::SineWave;
use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// 오디오 스레드 요청
struct PlayRequest {
    sound: SoundId,
    /// 재생 완료 통지 (테스트 재생만 기다린다)
    done: Option<oneshot::Sender<Result<(), AudioError>>>,
}

/// 오디오 스레드가 소유하는 출력 장치
struct RodioOutput {
    _stream: OutputStream,
    sink: Sink,
}

impl RodioOutput {
    fn open_default() -> Option<Self> {
        match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                stream.log_on_drop(false);
                let sink = Sink::connect_new(stream.mixer());
                Some(Self {
                    _stream: stream,
                    sink,
                })
            }
            Err(e) => {
                warn!("오디오 출력 장치 열기 실패, 콘솔 벨로 대체: {e}");
                None
            }
        }
    }

    /// 톤 + 같은 길이의 무음을 `repeats`회 큐에 넣기
    fn queue(&self, tone: &AlertTone) {
        for _ in 0..tone.repeats {
            self.sink.append(
                SineWave::new(tone.frequency_hz)
                    .take_duration(tone.duration())
                    .amplify(tone.volume),
            );
            self.sink.append(
                SineWave::new(tone.frequency_hz)
                    .take_duration(tone.duration())
                    .amplify(0.0),
            );
        }
    }
}

/// rodio 기반 `AudioPlayer` 구현
pub struct RodioPlayer {
    requests: mpsc::Sender<PlayRequest>,
    device_available: bool,
    background_failures: Arc<AtomicU64>,
}

impl RodioPlayer {
    /// 오디오 스레드 시작 후 기본 출력 장치 열기
    pub fn spawn(tone: AlertTone) -> Result<Self, AudioError> {
        Self::spawn_with(tone, RodioOutput::open_default)
    }

    fn spawn_with(
        tone: AlertTone,
        open: fn() -> Option<RodioOutput>,
    ) -> Result<Self, AudioError> {
        tone.validate()
            .map_err(|e| AudioError::Unavailable(e.to_string()))?;

        let (requests, rx) = mpsc::channel::<PlayRequest>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<bool>(1);
        let background_failures = Arc::new(AtomicU64::new(0));
        let failures = background_failures.clone();

        thread::Builder::new()
            .name("radarwatch-audio".to_string())
            .spawn(move || {
                let output = open();
                let _ = ready_tx.send(output.is_some());
                serve(&tone, output.as_ref(), rx, &failures);
                debug!("오디오 스레드 종료");
            })
            .map_err(|e| AudioError::Unavailable(format!("오디오 스레드 생성 실패: {e}")))?;

        let device_available = ready_rx
            .recv()
            .map_err(|_| AudioError::Unavailable("오디오 스레드 초기화 실패".to_string()))?;

        if device_available {
            info!(
                "알림음 준비: {}Hz, {}ms × {}",
                tone.frequency_hz, tone.duration_ms, tone.repeats
            );
        }

        Ok(Self {
            requests,
            device_available,
            background_failures,
        })
    }

    /// 출력 장치 사용 가능 여부 (false면 콘솔 벨)
    pub fn device_available(&self) -> bool {
        self.device_available
    }

    /// 기다리지 않는 `play()`에서 발생한 재생 실패 누적 횟수
    pub fn background_failures(&self) -> u64 {
        self.background_failures.load(Ordering::Relaxed)
    }

    fn send(&self, request: PlayRequest) -> Result<(), AudioError> {
        self.requests
            .send(request)
            .map_err(|_| AudioError::Unavailable("오디오 스레드 종료됨".to_string()))
    }
}

#[async_trait]
impl AudioPlayer for RodioPlayer {
    async fn play(&self, sound: SoundId) -> Result<(), AudioError> {
        self.send(PlayRequest { sound, done: None })
    }

    async fn test(&self) -> Result<(), AudioError> {
        let (done, wait) = oneshot::channel();
        self.send(PlayRequest {
            sound: SoundId::Test,
            done: Some(done),
        })?;

        wait.await
            .map_err(|_| AudioError::Unavailable("오디오 스레드 응답 없음".to_string()))?
    }
}

/// 오디오 스레드 요청 처리 루프. 송신측이 모두 drop되면 종료.
///
/// 기다리지 않는 재생의 실패는 호출자에게 돌아가지 않으므로 여기서 기록한다.
/// 첫 실패만 warn, 이후는 debug.
fn serve(
    tone: &AlertTone,
    output: Option<&RodioOutput>,
    rx: mpsc::Receiver<PlayRequest>,
    failures: &AtomicU64,
) {
    while let Ok(request) = rx.recv() {
        debug!("사운드 재생: {:?}", request.sound);

        let result = match output {
            Some(output) => {
                output.queue(tone);
                if request.done.is_some() {
                    output.sink.sleep_until_end();
                }
                Ok(())
            }
            None => ring_bell(tone.repeats).and(Err(AudioError::Unavailable(
                "출력 장치 없음, 콘솔 벨 사용".to_string(),
            ))),
        };

        match request.done {
            Some(done) => {
                let _ = done.send(result);
            }
            None => {
                if let Err(e) = result {
                    if failures.fetch_add(1, Ordering::Relaxed) == 0 {
                        warn!("알림음 재생 실패: {e}");
                    } else {
                        debug!("알림음 재생 실패: {e}");
                    }
                }
            }
        }
    }
}

/// 콘솔 벨 (BEL 문자)
fn ring_bell(times: u32) -> Result<(), AudioError> {
    let mut out = std::io::stdout().lock();
    for _ in 0..times.max(1) {
        out.write_all(b"\x07")
            .map_err(|e| AudioError::Playback(format!("콘솔 벨 실패: {e}")))?;
    }
    out.flush()
        .map_err(|e| AudioError::Playback(format!("콘솔 벨 실패: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_device() -> Option<RodioOutput> {
        None
    }

    #[tokio::test]
    async fn bell_fallback_play_does_not_fail() {
        let player = RodioPlayer::spawn_with(AlertTone::default(), no_device).unwrap();
        assert!(!player.device_available());
        assert!(player.play(SoundId::Alert).await.is_ok());
    }

    #[tokio::test]
    async fn bell_fallback_play_failures_are_counted() {
        let player = RodioPlayer::spawn_with(AlertTone::default(), no_device).unwrap();
        player.play(SoundId::Alert).await.unwrap();
        player.play(SoundId::Alert).await.unwrap();

        // 요청은 순서대로 처리되므로 test() 응답 시점엔 앞선 play가 끝나 있다
        assert!(player.test().await.is_err());
        assert_eq!(player.background_failures(), 2);
    }

    #[tokio::test]
    async fn bell_fallback_test_reports_unavailable() {
        let player = RodioPlayer::spawn_with(AlertTone::default(), no_device).unwrap();
        let err = player.test().await.unwrap_err();
        assert!(matches!(err, AudioError::Unavailable(_)));
    }

    #[test]
    fn invalid_tone_rejected() {
        let tone = AlertTone {
            volume: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            RodioPlayer::spawn_with(tone, no_device),
            Err(AudioError::Unavailable(_))
        ));
    }
}
