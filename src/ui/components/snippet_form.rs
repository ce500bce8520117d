use super::centered_rect;
use crate::app::{AppState, FormField, SnippetForm};
use crate::snippet::SnippetKind;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

/// Text rows shown for the content field; longer content scrolls with the cursor.
const CONTENT_ROWS: u16 = 5;

fn field_height(field: FormField) -> u16 {
    match field {
        FormField::Content => CONTENT_ROWS + 3,
        _ => 4,
    }
}

pub fn render(f: &mut Frame, state: &AppState, form: &SnippetForm) {
    let area = centered_rect(70, 60, f.area());
    let title = if form.is_edit() {
        " Edit Snippet "
    } else {
        " Add Snippet "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_bottom(" Enter save  Esc cancel  Tab next field  A-Enter new line ")
        .style(Style::default().bg(state.theme.background));
    let inner = block.inner(area);

    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let fields = form.visible_fields();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            fields
                .iter()
                .map(|field| Constraint::Length(field_height(*field)))
                .chain(std::iter::once(Constraint::Min(0))),
        )
        .split(inner);

    for (field, row) in fields.iter().zip(rows.iter()) {
        render_field(f, state, form, *field, *row);
    }
}

fn render_field(f: &mut Frame, state: &AppState, form: &SnippetForm, field: FormField, area: Rect) {
    let focused = form.focus == field;
    let error = form.field_error(field);

    let border_color = match (error.is_some(), focused) {
        (true, _) => state.theme.error,
        (false, true) => state.theme.cursor,
        (false, false) => state.theme.muted,
    };

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(field_height(field) - 1),
            Constraint::Length(1),
        ])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", field.label()))
        .border_style(Style::default().fg(border_color));

    let visible_rows = parts[0].height.saturating_sub(2);
    let scroll = form
        .input(field)
        .map(|input| (input.cursor_line().0 as u16).saturating_sub(visible_rows.saturating_sub(1)))
        .unwrap_or(0);

    let body = match field {
        FormField::Kind => Text::from(kind_selector(state, form.kind)),
        FormField::ImageFile if form.image_path.is_empty() && form.embedded_image.is_some() => {
            Text::from(Span::styled(
                "(embedded image kept; type a path to replace, Backspace to drop)",
                Style::default().fg(state.theme.muted),
            ))
        }
        _ => Text::styled(
            form.input(field)
                .map(|input| input.as_str().to_string())
                .unwrap_or_default(),
            Style::default().fg(state.theme.foreground),
        ),
    };
    f.render_widget(
        Paragraph::new(body).block(block).scroll((scroll, 0)),
        parts[0],
    );

    if let Some(message) = error {
        f.render_widget(
            Paragraph::new(Span::styled(
                format!(" {message}"),
                Style::default().fg(state.theme.error),
            )),
            parts[1],
        );
    }

    if focused && let Some(input) = form.input(field) {
        let (line, before_cursor) = input.cursor_line();
        let x = parts[0].x + 1 + before_cursor.width() as u16;
        let y = parts[0].y + 1 + (line as u16).saturating_sub(scroll);
        f.set_cursor_position(Position::new(
            x.min(parts[0].right().saturating_sub(2)),
            y.min(parts[0].bottom().saturating_sub(2)),
        ));
    }
}

fn kind_selector(state: &AppState, kind: SnippetKind) -> Line<'static> {
    let option = |label: &'static str, selected: bool| {
        if selected {
            Span::styled(
                format!("[{label}]"),
                Style::default()
                    .fg(state.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(format!(" {label} "), Style::default().fg(state.theme.muted))
        }
    };

    Line::from(vec![
        option("text", kind == SnippetKind::Text),
        Span::raw("  "),
        option("image", kind == SnippetKind::Image),
    ])
}
