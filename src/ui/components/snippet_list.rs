use crate::app::AppState;
use crate::snippet::{Snippet, SnippetBody};
use crate::utils::unicode::{single_line, truncate_to_width};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

const SOURCE_PREVIEW_WIDTH: usize = 48;

pub fn render(f: &mut Frame, state: &AppState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Snippets ");
    let items = state.visible_items();

    if items.is_empty() {
        let message = if state.repository.is_empty() {
            "No snippets yet. Press n to add one."
        } else {
            "No snippets match the search."
        };
        let empty = Paragraph::new(Span::styled(message, Style::default().fg(state.theme.muted)))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let available_width = area.width.saturating_sub(4) as usize;
    let rows: Vec<ListItem> = items
        .iter()
        .map(|snippet| ListItem::new(snippet_lines(state, snippet, available_width)))
        .collect();

    let list = List::new(rows)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(state.theme.cursor)
                .add_modifier(Modifier::REVERSED),
        )
        .highlight_symbol("> ");

    let mut list_state = ListState::default().with_selected(Some(state.cursor_position));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn snippet_lines(state: &AppState, snippet: &Snippet, width: usize) -> Vec<Line<'static>> {
    let title_style = Style::default()
        .fg(state.theme.foreground)
        .add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(state.theme.muted);

    let (tag, tag_style, preview) = match &snippet.body {
        SnippetBody::Text { content } => ("text", muted, single_line(content)),
        SnippetBody::Image {
            image_src,
            image_kind,
        } => (
            "image",
            Style::default().fg(state.theme.accent),
            format!(
                "{image_kind}: {}",
                truncate_to_width(image_src, SOURCE_PREVIEW_WIDTH)
            ),
        ),
    };

    let title_width = width.saturating_sub(tag.len() + 3);
    vec![
        Line::from(vec![
            Span::styled(truncate_to_width(&snippet.title, title_width), title_style),
            Span::styled(format!(" [{tag}]"), tag_style),
        ]),
        Line::from(Span::styled(
            format!("  {}", truncate_to_width(&preview, width.saturating_sub(2))),
            muted,
        )),
    ]
}
