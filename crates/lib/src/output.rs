//! Output sink contract.
//!
//! The engine never writes to the terminal directly. Everything user-visible
//! goes through an [`OutputSink`] with a [`StyleConfig`]; the CLI provides a
//! colored console implementation and tests use [`MemorySink`].

use std::io;

/// Terminal colors recognized by [`StyleConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
  Black,
  Red,
  Green,
  Yellow,
  Blue,
  Magenta,
  Cyan,
  White,
}

/// Text attributes recognized by [`StyleConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
  Bold,
  Dim,
  Italic,
  Underline,
}

/// How a line should be styled. Unset options leave the terminal default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleConfig {
  pub foreground: Option<Color>,
  pub background: Option<Color>,
  pub attribute: Option<Attribute>,
}

impl StyleConfig {
  pub const PLAIN: StyleConfig = StyleConfig {
    foreground: None,
    background: None,
    attribute: None,
  };

  pub fn foreground(mut self, color: Color) -> Self {
    self.foreground = Some(color);
    self
  }

  pub fn background(mut self, color: Color) -> Self {
    self.background = Some(color);
    self
  }

  pub fn attribute(mut self, attribute: Attribute) -> Self {
    self.attribute = Some(attribute);
    self
  }

  /// Startup banner.
  pub fn banner() -> Self {
    Self::PLAIN.foreground(Color::Cyan).attribute(Attribute::Bold)
  }

  /// Failed build banner.
  pub fn failure() -> Self {
    Self::PLAIN.foreground(Color::Red).attribute(Attribute::Bold)
  }

  /// Successful build banner.
  pub fn success() -> Self {
    Self::PLAIN.foreground(Color::Green).attribute(Attribute::Bold)
  }

  /// Secondary details such as error origins.
  pub fn detail() -> Self {
    Self::PLAIN.attribute(Attribute::Dim)
  }
}

/// Destination for user-visible lines.
pub trait OutputSink {
  fn print_line(&mut self, text: &str, style: &StyleConfig) -> io::Result<()>;
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
  fn print_line(&mut self, text: &str, style: &StyleConfig) -> io::Result<()> {
    (**self).print_line(text, style)
  }
}

/// Sink that records lines in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
  lines: Vec<(String, StyleConfig)>,
}

impl MemorySink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lines(&self) -> impl Iterator<Item = &str> {
    self.lines.iter().map(|(text, _)| text.as_str())
  }

  pub fn styled_lines(&self) -> &[(String, StyleConfig)] {
    &self.lines
  }

  /// All recorded text joined by newlines.
  pub fn text(&self) -> String {
    self.lines().collect::<Vec<_>>().join("\n")
  }
}

impl OutputSink for MemorySink {
  fn print_line(&mut self, text: &str, style: &StyleConfig) -> io::Result<()> {
    self.lines.push((text.to_string(), *style));
    Ok(())
  }
}

/// A [`MemorySink`] that can be handed to the driver while the caller keeps a view of it.
#[derive(Debug, Default, Clone)]
pub struct SharedSink(std::rc::Rc<std::cell::RefCell<MemorySink>>);

impl SharedSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn text(&self) -> String {
    self.0.borrow().text()
  }

  pub fn styled_lines(&self) -> Vec<(String, StyleConfig)> {
    self.0.borrow().styled_lines().to_vec()
  }
}

impl OutputSink for SharedSink {
  fn print_line(&mut self, text: &str, style: &StyleConfig) -> io::Result<()> {
    self.0.borrow_mut().print_line(text, style)
  }
}
