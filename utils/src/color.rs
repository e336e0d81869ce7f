//! Helper for writing colors and font styles to the terminal.
//!
//! The terminal style is reset whenever a `ColorOutput` is dropped, so a
//! function should create its own `ColorOutput` from the raw writer and let
//! it go out of scope on return. Coloring failures are ignored.
use std::{
    fmt,
    io::{self, Write},
};
use termcolor::{Color, ColorSpec, WriteColor};

pub struct ColorOutput<'a> {
    writer: &'a mut dyn WriteColor,
    spec: ColorSpec,
}

impl<'a> ColorOutput<'a> {
    pub fn new(writer: &'a mut dyn WriteColor) -> Self {
        writer.reset().ok();

        Self {
            writer,
            spec: ColorSpec::new(),
        }
    }

    /// `None` is the terminal's default color.
    pub fn set_color(&mut self, color: Option<Color>) {
        self.spec.set_fg(color);
        self.writer.set_color(&self.spec).ok();
    }

    pub fn set_bold(&mut self, yes: bool) {
        self.spec.set_bold(yes);
        self.writer.set_color(&self.spec).ok();
    }

    /// Write `text` in the given style and restore the previous style.
    pub fn write_styled(
        &mut self,
        color: Option<Color>,
        bold: bool,
        text: impl fmt::Display,
    ) -> io::Result<()> {
        let previous = self.spec.clone();
        self.set_color(color);
        self.set_bold(bold);
        let res = write!(self.writer, "{}", text);
        self.spec = previous;
        self.writer.set_color(&self.spec).ok();
        res
    }

    pub fn writer(&mut self) -> &mut dyn WriteColor {
        self.writer
    }
}

impl<'a> Drop for ColorOutput<'a> {
    fn drop(&mut self) {
        self.writer.reset().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    #[test]
    fn plain_buffer_receives_text_only() {
        let mut buffer = Buffer::no_color();
        {
            let mut output = ColorOutput::new(&mut buffer);
            output.write_styled(Some(Color::Red), true, "error").unwrap();
            write!(output.writer(), ": oops").unwrap();
        }
        assert_eq!("error: oops", String::from_utf8_lossy(buffer.as_slice()));
    }
}
