//! 라이프사이클 관리.
//!
//! 종료 신호 전파, OS 시그널 핸들링.

use tokio::sync::watch;
use tracing::{info, warn};

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LifecycleManager {
    /// 새 라이프사이클 관리자 생성
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    /// 종료 수신기 복제
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// 종료 요청 여부
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// 종료 신호 발송 (중복 호출 무해)
    pub fn shutdown(&self) {
        if self.shutdown_tx.send_replace(true) {
            return;
        }
        info!("종료 신호 발송");
    }

    /// 종료 신호 대기 (OS 시그널 또는 [`shutdown`](Self::shutdown) 호출)
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        tokio::select! {
            _ = wait_for_os_signal() => self.shutdown(),
            _ = rx.wait_for(|stop| *stop) => {}
        }
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

/// OS 시그널 대기 (SIGINT, SIGTERM). 핸들러 등록 실패 시 Ctrl+C로 대체.
async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => info!("SIGINT 수신"),
                    _ = sigterm.recv() => info!("SIGTERM 수신"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("유닉스 시그널 핸들러 등록 실패, Ctrl+C로 대체: {e}");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C 수신"),
        Err(e) => {
            warn!("Ctrl+C 핸들러 등록 실패: {e}");
            std::future::pending::<()>().await;
        }
    }
}
