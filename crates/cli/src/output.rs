//! Console output for the CLI.
//!
//! [`ConsoleSink`] renders engine lines on stdout, mapping [`StyleConfig`]
//! onto owo-colors styles when the terminal supports them.

use std::io::{self, Write};

use hearth_lib::output::{Attribute, Color, OutputSink, StyleConfig};
use owo_colors::{AnsiColors, OwoColorize, Stream, Style};

/// Writes engine output to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink {
  no_color: bool,
}

impl ConsoleSink {
  pub fn new(no_color: bool) -> Self {
    Self { no_color }
  }
}

impl OutputSink for ConsoleSink {
  fn print_line(&mut self, text: &str, style: &StyleConfig) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    if self.no_color || *style == StyleConfig::PLAIN {
      return writeln!(stdout, "{}", text);
    }
    let owo = to_owo(style);
    writeln!(stdout, "{}", text.if_supports_color(Stream::Stdout, |s| s.style(owo)))
  }
}

fn ansi(color: Color) -> AnsiColors {
  match color {
    Color::Black => AnsiColors::Black,
    Color::Red => AnsiColors::Red,
    Color::Green => AnsiColors::Green,
    Color::Yellow => AnsiColors::Yellow,
    Color::Blue => AnsiColors::Blue,
    Color::Magenta => AnsiColors::Magenta,
    Color::Cyan => AnsiColors::Cyan,
    Color::White => AnsiColors::White,
  }
}

/// Translate an engine style into an owo-colors style.
pub fn to_owo(config: &StyleConfig) -> Style {
  let mut style = Style::new();
  if let Some(fg) = config.foreground {
    style = style.color(ansi(fg));
  }
  if let Some(bg) = config.background {
    style = style.on_color(ansi(bg));
  }
  match config.attribute {
    Some(Attribute::Bold) => style.bold(),
    Some(Attribute::Dim) => style.dimmed(),
    Some(Attribute::Italic) => style.italic(),
    Some(Attribute::Underline) => style.underline(),
    None => style,
  }
}
