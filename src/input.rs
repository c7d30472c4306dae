use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseEventKind};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    SelectLabil,
    SelectStable,
    ToggleFreeze,
    Reset,
    Quit,
}

/// Everything the event queue held this frame: key commands in arrival
/// order and the latest pointer sample, if the mouse moved at all.
pub(crate) struct FrameInput {
    pub(crate) commands: Vec<Command>,
    pub(crate) pointer: Option<(u16, u16)>,
    pub(crate) resized: bool,
}

/// Drain pending events without blocking the frame. Mouse events collapse
/// to the newest position; a burst of queued keys is capped so a paste
/// cannot stall the loop.
pub(crate) fn collect_frame_input(budget: Duration) -> anyhow::Result<FrameInput> {
    let mut out = FrameInput {
        commands: Vec::new(),
        pointer: None,
        resized: false,
    };
    let poll = Duration::from_millis(1).min(budget);
    while event::poll(poll)? {
        match event::read()? {
            Event::Key(k) => {
                if let Some(cmd) = map_key(&k) {
                    out.commands.push(cmd);
                }
            }
            Event::Mouse(m) => match m.kind {
                MouseEventKind::Moved | MouseEventKind::Down(_) | MouseEventKind::Drag(_) => {
                    out.pointer = Some((m.column, m.row));
                }
                _ => {}
            },
            Event::Resize(_, _) => out.resized = true,
            _ => {}
        }
        if out.commands.len() >= 32 {
            break;
        }
    }
    Ok(out)
}

fn map_key(k: &KeyEvent) -> Option<Command> {
    if k.kind != KeyEventKind::Press && k.kind != KeyEventKind::Repeat {
        return None;
    }
    match k.code {
        KeyCode::Char('1') => Some(Command::SelectLabil),
        KeyCode::Char('2') => Some(Command::SelectStable),
        KeyCode::Char(' ') => Some(Command::ToggleFreeze),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Reset),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}
