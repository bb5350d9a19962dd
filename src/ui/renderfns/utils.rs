use ratatui::prelude::Color;

/// Truncate to at most `max_len` characters, ending in "..." when cut
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    return s.to_string();
  }
  let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
  format!("{}...", kept)
}

const NOTE_COLORS: [Color; 6] = [
  Color::Yellow,
  Color::LightBlue,
  Color::Green,
  Color::LightRed,
  Color::LightYellow,
  Color::LightGreen,
];

/// Color for the note at `index`, cycling so neighbouring notes differ
pub fn note_color(index: usize) -> Color {
  NOTE_COLORS[index % NOTE_COLORS.len()]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_counts_characters() {
    assert_eq!(truncate("日本語のメモ", 5), "日本...");
  }

  #[test]
  fn test_note_color_cycles() {
    assert_eq!(note_color(0), note_color(6));
    assert_ne!(note_color(0), note_color(1));
  }
}
