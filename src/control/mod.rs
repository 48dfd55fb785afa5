mod stdin;

pub use stdin::StdinControl;

use std::collections::VecDeque;
use std::time::Duration;

/// Key code of the escape key
pub const ESCAPE: char = '\u{1b}';

/// Input delivered between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Quit,
    SetEdgeThreshold(i32),
    SetKernelSize(i32),
}

/// Trait for interactive control input
pub trait ControlSource {
    /// Wait at most `timeout` for the next event
    fn poll(&mut self, timeout: Duration) -> Option<ControlEvent>;
}

impl<C: ControlSource + ?Sized> ControlSource for Box<C> {
    fn poll(&mut self, timeout: Duration) -> Option<ControlEvent> {
        (**self).poll(timeout)
    }
}

/// No interactive input, only paces the loop
#[derive(Debug, Default, Clone, Copy)]
pub struct NoControl;

impl ControlSource for NoControl {
    fn poll(&mut self, timeout: Duration) -> Option<ControlEvent> {
        if !timeout.is_zero() {
            std::thread::sleep(timeout);
        }
        None
    }
}

/// Replays a fixed list of events keyed by frame number
///
/// The frame loop polls once per frame, so the n-th poll follows frame n.
#[derive(Debug, Default, Clone)]
pub struct ScriptedControl {
    script: VecDeque<(u64, ControlEvent)>,
    polls: u64,
}

impl ScriptedControl {
    /// `script` holds (frame, event) pairs, fired after that frame at the earliest
    pub fn new<I: IntoIterator<Item = (u64, ControlEvent)>>(script: I) -> Self {
        let mut script: Vec<_> = script.into_iter().collect();
        script.sort_by_key(|(frame, _)| *frame);
        Self {
            script: script.into(),
            polls: 0,
        }
    }
}

impl ControlSource for ScriptedControl {
    fn poll(&mut self, _timeout: Duration) -> Option<ControlEvent> {
        self.polls += 1;
        match self.script.front() {
            Some((frame, _)) if *frame <= self.polls => self.script.pop_front().map(|(_, e)| e),
            _ => None,
        }
    }
}

/// Parse one line of control input
///
/// `q`, `quit` or escape stop the loop; `t N` / `thresh N` set the edge
/// threshold and `k N` / `kernel N` the kernel size.
pub fn parse_command(line: &str) -> Option<ControlEvent> {
    let line = line.trim_matches(|c: char| c.is_whitespace());
    if line.is_empty() {
        return None;
    }
    if line.starts_with(ESCAPE) {
        return Some(ControlEvent::Quit);
    }

    let mut parts = line.split_whitespace();
    let command = parts.next()?.to_ascii_lowercase();
    let value = parts.next().and_then(|v| v.parse::<i32>().ok());

    match (command.as_str(), value) {
        ("q" | "quit", _) => Some(ControlEvent::Quit),
        ("t" | "thresh" | "threshold", Some(v)) => Some(ControlEvent::SetEdgeThreshold(v)),
        ("k" | "kernel", Some(v)) => Some(ControlEvent::SetKernelSize(v)),
        _ => {
            tracing::warn!("Ignoring control input {:?}", line);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quit_codes() {
        assert_eq!(parse_command("q"), Some(ControlEvent::Quit));
        assert_eq!(parse_command("  QUIT \n"), Some(ControlEvent::Quit));
        assert_eq!(parse_command("\u{1b}"), Some(ControlEvent::Quit));
    }

    #[test]
    fn parses_parameter_changes() {
        assert_eq!(parse_command("t 40"), Some(ControlEvent::SetEdgeThreshold(40)));
        assert_eq!(parse_command("kernel -2"), Some(ControlEvent::SetKernelSize(-2)));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("k"), None);
        assert_eq!(parse_command("zoom 3"), None);
    }

    #[test]
    fn scripted_events_fire_after_their_frame() {
        let mut control = ScriptedControl::new([
            (2, ControlEvent::Quit),
            (1, ControlEvent::SetKernelSize(3)),
        ]);
        let wait = Duration::ZERO;

        assert_eq!(control.poll(wait), Some(ControlEvent::SetKernelSize(3)));
        assert_eq!(control.poll(wait), Some(ControlEvent::Quit));
        assert_eq!(control.poll(wait), None);
    }
}
