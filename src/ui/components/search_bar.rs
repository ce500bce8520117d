use crate::app::{AppState, Mode};
use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

pub fn render(f: &mut Frame, state: &AppState, area: Rect) {
    let focused = state.mode == Mode::Search;
    let border_color = if focused {
        state.theme.cursor
    } else {
        state.theme.muted
    };

    let content = if state.search.is_empty() && !focused {
        Span::styled("/ to search", Style::default().fg(state.theme.muted))
    } else {
        Span::styled(
            state.search.as_str().to_string(),
            Style::default().fg(state.theme.foreground),
        )
    };

    let title = format!(
        " Search ({}/{}) ",
        state.visible.len(),
        state.repository.len()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(border_color));

    f.render_widget(Paragraph::new(Line::from(content)).block(block), area);

    if focused {
        let before_cursor = &state.search.as_str()[..state.search.cursor];
        let x = area.x + 1 + before_cursor.width() as u16;
        f.set_cursor_position(Position::new(x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}
