use std::rc::Rc;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::records::RecordList;
use crate::stopwatch::{Control, Stopwatch};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const CONTROL_GAP: u16 = 2;

const LEGEND: &str = "(space/enter) press focused / (tab) switch focus / (r)eset / (esc)ape";

impl Widget for &Stopwatch {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = screen_chunks(area);

        let timer_style = if self.is_running() {
            bold_style.fg(Color::Green)
        } else {
            bold_style
        };
        Paragraph::new(Span::styled(self.display().to_string(), timer_style))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        for (control, rect) in control_areas(self, area) {
            let style = if self.focus() == control {
                bold_style.add_modifier(Modifier::REVERSED)
            } else {
                dim_style
            };
            Paragraph::new(Span::styled(control_text(self, control), style)).render(rect, buf);
        }

        let summary = self.summary();
        for (text, chunk) in [
            (summary.average_text(), chunks[4]),
            (summary.recent_average_text(), chunks[5]),
            (summary.count_text(), chunks[6]),
        ] {
            Paragraph::new(Span::styled(text, bold_style))
                .alignment(Alignment::Center)
                .render(chunk, buf);
        }

        let items = self
            .records()
            .iter()
            .map(|t| ListItem::new(t.to_string()))
            .collect_vec();
        List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Recorded Times"))
            .render(chunks[7], buf);

        Paragraph::new(Span::styled(LEGEND, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[8], buf);
    }
}

fn screen_chunks(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // elapsed time
            Constraint::Length(1), // padding
            Constraint::Length(1), // controls
            Constraint::Length(1), // padding
            Constraint::Length(1), // average
            Constraint::Length(1), // last five
            Constraint::Length(1), // solve count
            Constraint::Min(3),    // record list
            Constraint::Length(1), // legend
        ])
        .split(area)
}

fn control_text(sw: &Stopwatch, control: Control) -> String {
    match control {
        Control::Toggle => format!("[ {} ]", sw.label()),
        Control::Reset => format!("[ {} ]", Control::Reset),
    }
}

/// Where each control is drawn when the stopwatch fills `area`.
///
/// Both buttons sit centered on one row with a two-cell gap.
pub fn control_areas(sw: &Stopwatch, area: Rect) -> [(Control, Rect); 2] {
    let row = screen_chunks(area)[2];
    let toggle_width = control_text(sw, Control::Toggle).width() as u16;
    let reset_width = control_text(sw, Control::Reset).width() as u16;
    let total = toggle_width + CONTROL_GAP + reset_width;

    let start = row.x + (row.width / 2).saturating_sub(total / 2);
    let toggle = Rect::new(start, row.y, toggle_width, row.height).intersection(row);
    let reset = Rect::new(
        start + toggle_width + CONTROL_GAP,
        row.y,
        reset_width,
        row.height,
    )
    .intersection(row);

    [(Control::Toggle, toggle), (Control::Reset, reset)]
}

/// The control under a terminal cell, if any.
pub fn control_at(sw: &Stopwatch, area: Rect, column: u16, row: u16) -> Option<Control> {
    control_areas(sw, area)
        .into_iter()
        .find(|(_, rect)| rect.contains(Position::new(column, row)))
        .map(|(control, _)| control)
}

/// Plain-text rendering of the history, newest first, for `--print`.
pub fn history_report(records: &RecordList) -> String {
    let summary = records.summary();
    records
        .iter()
        .map(|t| t.to_string())
        .chain([
            summary.average_text(),
            summary.recent_average_text(),
            summary.count_text(),
        ])
        .join("\n")
}
