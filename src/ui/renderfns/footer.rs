use crate::ui::context::Status;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar with view breadcrumb and the latest status message
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], status: Option<&Status>) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };
    spans.push(Span::styled(part.clone(), style));
  }

  match status {
    Some(Status::Info(message)) => {
      spans.push(Span::raw("   "));
      spans.push(Span::styled(message.clone(), Style::default().fg(Color::Green)));
    }
    Some(Status::Error(message)) => {
      spans.push(Span::raw("   "));
      spans.push(Span::styled(
        format!("error: {}", message),
        Style::default().fg(Color::Red),
      ));
    }
    None => {}
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
