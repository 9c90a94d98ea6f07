use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::runtime::LapEvent;
use crate::stopwatch::{Control, Stopwatch};
use crate::ui::control_at;

/// What the main loop should do after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Redraw,
    Quit,
}

/// Apply one event to the stopwatch drawn over `area`.
pub fn handle_event(sw: &mut Stopwatch, event: &LapEvent, area: Rect) -> Flow {
    match event {
        LapEvent::Tick => {
            if sw.is_running() {
                sw.tick();
                Flow::Redraw
            } else {
                Flow::Continue
            }
        }
        LapEvent::Resize => Flow::Redraw,
        LapEvent::Mouse(mouse) => handle_mouse(sw, mouse, area),
        LapEvent::Key(key) => handle_key(sw, key),
        LapEvent::Closed => Flow::Quit,
    }
}

pub fn handle_key(sw: &mut Stopwatch, key: &KeyEvent) -> Flow {
    // ctrl+c to quit
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Char(' ') | KeyCode::Enter => sw.activate_focused(),
        KeyCode::Tab | KeyCode::BackTab => sw.focus_next(),
        KeyCode::Char('r') => sw.reset(),
        _ => return Flow::Continue,
    }
    Flow::Redraw
}

/// A left click on a control presses it; any other click refocuses the toggle.
fn handle_mouse(sw: &mut Stopwatch, mouse: &MouseEvent, area: Rect) -> Flow {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            match control_at(sw, area, mouse.column, mouse.row) {
                Some(Control::Toggle) => sw.toggle_start(),
                Some(Control::Reset) => sw.reset(),
                None => sw.on_click(),
            }
            Flow::Redraw
        }
        MouseEventKind::Down(_) => {
            sw.on_click();
            Flow::Redraw
        }
        _ => Flow::Continue,
    }
}
