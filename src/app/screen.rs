use std::time::Duration;

use crossterm::event::KeyEvent;
use ratatui::Frame;

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Events a screen can receive from the runner. Timer events carry the
/// generation they were scheduled with so a screen can ignore stale ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    TimerFired(u64),
}

/// Side effects a screen may request from the runner. The runner injects the
/// resulting event into the same stream; no screen owns a thread or a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    DismissNotification { generation: u64, after: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<O> {
    Continue,
    Schedule(Effect),
    Complete(O),
}

/// A modal full-terminal state machine. The runner draws, waits for one
/// event, dispatches it, and repeats until the screen completes.
pub trait Screen {
    type Outcome;

    fn init(&mut self) -> Option<Effect> {
        None
    }

    fn on_event(&mut self, event: ScreenEvent) -> Step<Self::Outcome>;

    fn draw(&self, frame: &mut Frame);
}
