use crate::app::AppState;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn render(f: &mut Frame, state: &AppState, area: Rect) {
    let base_style = Style::default()
        .fg(state.theme.status_bar_fg)
        .bg(state.theme.status_bar_bg);

    let left_content = format!(" {} | {} snippets", state.mode, state.repository.len());

    let (message, message_style) = if state.show_copied() {
        (
            " Copied! ".to_string(),
            base_style
                .fg(state.theme.success)
                .add_modifier(Modifier::BOLD),
        )
    } else if let Some((message, _)) = &state.status_message {
        (format!(" {message} "), base_style.add_modifier(Modifier::BOLD))
    } else if state.copy_in_flight {
        (" copying... ".to_string(), base_style)
    } else {
        (String::new(), base_style)
    };

    let hint = "? help  q quit";
    let version_text = format!("v{VERSION}");

    let used = left_content.chars().count()
        + message.chars().count()
        + hint.len()
        + version_text.len()
        + 3;
    let padding = (area.width as usize).saturating_sub(used);

    let status = Paragraph::new(Line::from(vec![
        Span::styled(left_content, base_style),
        Span::styled(message, message_style),
        Span::styled(format!("{:>padding$} {hint} {version_text} ", ""), base_style),
    ]))
    .style(base_style);

    f.render_widget(status, area);
}
