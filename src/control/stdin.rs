use super::{parse_command, ControlEvent, ControlSource};
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Control commands typed on standard input
///
/// A helper thread blocks on stdin and forwards parsed commands; the frame
/// loop only ever waits on the channel with a timeout.
pub struct StdinControl {
    events: Receiver<ControlEvent>,
    closed: bool,
}

impl StdinControl {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("stdin-control".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if let Some(event) = parse_command(&line) {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                }
                tracing::debug!("Control input closed");
            });
        if let Err(e) = spawned {
            tracing::warn!("Failed to start control input thread: {}", e);
        }

        Self {
            events: rx,
            closed: false,
        }
    }
}

impl ControlSource for StdinControl {
    fn poll(&mut self, timeout: Duration) -> Option<ControlEvent> {
        if self.closed {
            thread::sleep(timeout);
            return None;
        }

        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }
}
