//! 절전 방지.
//!
//! 무인 모니터링 중 화면이 꺼지면 모든 캡처가 검은 화면이 되므로,
//! 세션 동안 시스템 유휴 절전과 화면 끄기를 막는다.
//!
//! - macOS: `caffeinate -d -i -w <pid>`
//! - Linux: `systemd-inhibit ... tail --pid=<pid> -f /dev/null`
//! - Windows: `SetThreadExecutionState`
//!
//! 보조 프로세스는 이 프로세스가 비정상 종료해도 pid 감시로 스스로 끝난다.

use radarwatch_core::error::CoreError;
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::{debug, info, warn};

/// 절전 방지 보조 프로세스 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InhibitCommand {
    pub program: &'static str,
    pub args: Vec<String>,
}

/// 운영체제별 보조 프로세스 명령. 외부 명령이 필요 없거나 지원하지 않으면 `None`.
pub fn inhibit_command(os: &str, pid: u32) -> Option<InhibitCommand> {
    match os {
        "macos" => Some(InhibitCommand {
            program: "caffeinate",
            args: vec!["-d".into(), "-i".into(), "-w".into(), pid.to_string()],
        }),
        "linux" => Some(InhibitCommand {
            program: "systemd-inhibit",
            args: vec![
                "--what=idle:sleep".into(),
                "--who=radarwatch".into(),
                "--why=레이더 영역 모니터링 중".into(),
                "--mode=block".into(),
                "tail".into(),
                format!("--pid={pid}"),
                "-f".into(),
                "/dev/null".into(),
            ],
        }),
        _ => None,
    }
}

enum Inhibitor {
    Child(Child),
    #[cfg(windows)]
    ExecutionState,
    Released,
}

/// 절전 방지 가드. drop 시 해제된다.
pub struct KeepAwake {
    inhibitor: Inhibitor,
}

impl KeepAwake {
    /// 현재 플랫폼의 방식으로 절전 방지 시작
    pub fn acquire() -> Result<Self, CoreError> {
        #[cfg(windows)]
        {
            windows::enable()?;
            info!("절전 방지 활성화 (SetThreadExecutionState)");
            Ok(Self {
                inhibitor: Inhibitor::ExecutionState,
            })
        }

        #[cfg(not(windows))]
        {
            let command = inhibit_command(std::env::consts::OS, std::process::id()).ok_or_else(
                || {
                    CoreError::Internal(format!(
                        "{}에서는 절전 방지를 지원하지 않음",
                        std::env::consts::OS
                    ))
                },
            )?;
            let guard = Self::spawn(&command)?;
            info!("절전 방지 활성화 ({})", command.program);
            Ok(guard)
        }
    }

    /// 보조 프로세스 실행. 즉시 종료했다면 실패로 본다.
    fn spawn(command: &InhibitCommand) -> Result<Self, CoreError> {
        let mut child = Command::new(command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CoreError::Internal(format!("{} 실행 실패: {e}", command.program)))?;

        if let Ok(Some(status)) = child.try_wait() {
            return Err(CoreError::Internal(format!(
                "{} 즉시 종료: {status}",
                command.program
            )));
        }

        Ok(Self {
            inhibitor: Inhibitor::Child(child),
        })
    }

    /// 절전 방지 해제 (멱등). 보조 프로세스가 있었다면 종료 상태를 돌려준다.
    fn release(&mut self) -> Option<ExitStatus> {
        match std::mem::replace(&mut self.inhibitor, Inhibitor::Released) {
            Inhibitor::Child(mut child) => {
                if let Err(e) = child.kill() {
                    debug!("절전 방지 프로세스 종료 신호 실패: {e}");
                }
                match child.wait() {
                    Ok(status) => {
                        info!("절전 방지 해제");
                        Some(status)
                    }
                    Err(e) => {
                        warn!("절전 방지 프로세스 회수 실패: {e}");
                        None
                    }
                }
            }
            #[cfg(windows)]
            Inhibitor::ExecutionState => {
                windows::disable();
                info!("절전 방지 해제");
                None
            }
            Inhibitor::Released => None,
        }
    }
}

impl Drop for KeepAwake {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(windows)]
mod windows {
    use radarwatch_core::error::CoreError;
    use windows_sys::Win32::System::Power::{
        SetThreadExecutionState, ES_CONTINUOUS, ES_DISPLAY_REQUIRED, ES_SYSTEM_REQUIRED,
    };

    pub fn enable() -> Result<(), CoreError> {
        // SAFETY: 플래그만 받는 Win32 호출, 포인터 인자 없음
        let previous = unsafe {
            SetThreadExecutionState(ES_CONTINUOUS | ES_SYSTEM_REQUIRED | ES_DISPLAY_REQUIRED)
        };
        if previous == 0 {
            return Err(CoreError::Internal(
                "SetThreadExecutionState 실패".to_string(),
            ));
        }
        Ok(())
    }

    pub fn disable() {
        // SAFETY: 위와 같음
        unsafe {
            SetThreadExecutionState(ES_CONTINUOUS);
        }
    }
}
