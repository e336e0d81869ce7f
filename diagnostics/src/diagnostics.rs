//! The diagnostics object controls the output of warnings and errors generated
//! by the compiler during the lexing, parsing and semantic analysis phases.
//! It also tracks the messages emitted so far for flow control.
//!
//! Messages are kept in the order they were emitted. Emitting a message that
//! equals an earlier one (same level, same location, same text) is a no-op,
//! so a phase may be rerun over the same input without duplicating output.
//!
//! This implementation is NOT thread-safe.
use asciifile::{Span, Spanned};
use failure::AsFail;
use std::{ascii::escape_default, cell::RefCell, fmt, io::Write};
use termcolor::{Color, WriteColor};
use utils::color::ColorOutput;

pub struct Diagnostics {
    messages: RefCell<Vec<Message>>,
    writer: RefCell<Box<dyn WriteColor>>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MessageLevel {
    Error,
    Warning,
}

impl MessageLevel {
    fn color(self) -> Option<Color> {
        // `None` means default color
        match self {
            MessageLevel::Error => Some(Color::Red),
            MessageLevel::Warning => Some(Color::Yellow),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageLevel::Error => "error",
            MessageLevel::Warning => "warning",
        }
    }
}

/// Zero based rows and columns of the first and last character.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Location {
    pub start: (usize, usize),
    pub end: (usize, usize),
}

impl Location {
    pub fn line_number(&self) -> usize {
        self.start.0 + 1
    }
}

impl<'f> From<Span<'f>> for Location {
    fn from(span: Span<'f>) -> Self {
        let (start, end) = (span.start_position(), span.end_position());
        Location {
            start: (start.row(), start.column()),
            end: (end.row(), end.column()),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Message {
    pub level: MessageLevel,
    pub location: Option<Location>,
    pub text: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(
                f,
                "{}: {} at {}:{}",
                self.level.name(),
                self.text,
                location.line_number(),
                location.start.1
            ),
            None => write!(f, "{}: {}", self.level.name(), self.text),
        }
    }
}

impl Diagnostics {
    pub fn new(writer: Box<dyn WriteColor>) -> Self {
        Self {
            writer: RefCell::new(writer),
            messages: RefCell::new(Vec::new()),
        }
    }

    /// True when an error message was emitted, false
    /// if only warnings were emitted.
    pub fn errored(&self) -> bool {
        self.count(MessageLevel::Error) > 0
    }

    pub fn count(&self, level: MessageLevel) -> usize {
        self.messages
            .borrow()
            .iter()
            .filter(|msg| msg.level == level)
            .count()
    }

    /// Snapshot of all messages in emission order.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.borrow().clone()
    }

    pub fn write_statistics(&self) {
        let mut writer = self.writer.borrow_mut();
        let mut output = ColorOutput::new(&mut **writer);

        output.set_bold(true);

        if self.errored() {
            output.set_color(MessageLevel::Error.color());
            writeln!(
                output.writer(),
                "Compilation aborted due to {}",
                match self.count(MessageLevel::Error) {
                    1 => "an error".to_string(),
                    n => format!("{} errors", n),
                }
            )
            .ok();
        } else {
            output.set_color(Some(Color::Green));
            writeln!(
                output.writer(),
                "Compilation finished successfully {}",
                match self.count(MessageLevel::Warning) {
                    0 => "without warnings".to_string(),
                    1 => "with a warning".to_string(),
                    n => format!("with {} warnings", n),
                }
            )
            .ok();
        }
    }

    /// Generate an error or a warning that is printed to the
    /// writer given in the `new` constructor. Most of the time
    /// this will be stderr.
    pub fn emit(&self, level: MessageLevel, kind: Box<dyn AsFail>) {
        let msg = Message {
            level,
            location: None,
            text: kind.as_fail().to_string(),
        };
        if self.record(&msg) {
            let mut writer = self.writer.borrow_mut();
            write_header(&mut **writer, &msg);
        }
    }

    pub fn warning(&self, kind: Box<dyn AsFail>) {
        self.emit(MessageLevel::Warning, kind)
    }

    pub fn error(&self, kind: Box<dyn AsFail>) {
        self.emit(MessageLevel::Error, kind)
    }

    pub fn emit_with_source_snippet(
        &self,
        level: MessageLevel,
        spanned: Spanned<'_, Box<dyn AsFail>>,
    ) {
        let msg = Message {
            level,
            location: Some(Location::from(spanned.span)),
            text: spanned.data.as_fail().to_string(),
        };
        if self.record(&msg) {
            let mut writer = self.writer.borrow_mut();
            write_header(&mut **writer, &msg);
            write_snippet(&mut **writer, level, spanned.span);
        }
    }

    pub fn warning_with_source_snippet(&self, spanned: Spanned<'_, Box<dyn AsFail>>) {
        self.emit_with_source_snippet(MessageLevel::Warning, spanned)
    }

    pub fn error_with_source_snippet(&self, spanned: Spanned<'_, Box<dyn AsFail>>) {
        self.emit_with_source_snippet(MessageLevel::Error, spanned)
    }

    /// Returns false if an equal message was recorded before.
    fn record(&self, msg: &Message) -> bool {
        let mut messages = self.messages.borrow_mut();
        if messages.contains(msg) {
            return false;
        }
        messages.push(msg.clone());
        true
    }
}

const TAB_WIDTH: usize = 4;
const HIGHLIGHT: Option<Color> = Some(Color::Cyan);

fn write_header(writer: &mut dyn WriteColor, msg: &Message) {
    let mut output = ColorOutput::new(writer);
    output
        .write_styled(msg.level.color(), true, format_args!("{}: ", msg.level.name()))
        .ok();
    writeln!(output.writer(), "{}", msg.text).ok();
}

fn write_snippet(writer: &mut dyn WriteColor, level: MessageLevel, span: Span<'_>) {
    let mut output = ColorOutput::new(writer);
    let (start, end) = (span.start_position(), span.end_position());
    let line_number_width = end.line_number().to_string().len();

    // has to have the same width as the line markers with line numbers,
    // otherwise the indicators are misaligned
    let empty_line_marker = format!(" {} | ", " ".repeat(line_number_width));

    output
        .write_styled(HIGHLIGHT, true, &empty_line_marker)
        .ok();
    writeln!(output.writer()).ok();

    if !span.is_multiline() {
        output
            .write_styled(
                HIGHLIGHT,
                true,
                format_args!(
                    " {} | ",
                    pad_left(&start.line_number().to_string(), line_number_width)
                ),
            )
            .ok();

        let formatter = LineFormatter::new(start.line());
        formatter.render(output.writer());
        writeln!(output.writer()).ok();

        let indicator = format!(
            "{spaces}{markers}",
            spaces = " ".repeat(formatter.actual_column(start.column())),
            markers = "^".repeat(
                (formatter.actual_column(end.column() + 1)
                    - formatter.actual_column(start.column()))
                .max(1)
            )
        );

        output
            .write_styled(HIGHLIGHT, true, &empty_line_marker)
            .ok();
        output.write_styled(level.color(), true, indicator).ok();
        writeln!(output.writer()).ok();
    } else {
        let source = start.file().as_str();
        for (row, line) in source
            .split('\n')
            .enumerate()
            .skip(start.row())
            .take(end.row() - start.row() + 1)
        {
            output
                .write_styled(
                    HIGHLIGHT,
                    true,
                    format_args!(" {} |", pad_left(&(row + 1).to_string(), line_number_width)),
                )
                .ok();
            // mark every line of a multiline span at its start
            output.write_styled(level.color(), true, "> ").ok();
            LineFormatter::new(line).render(output.writer());
            writeln!(output.writer()).ok();
        }

        output
            .write_styled(HIGHLIGHT, true, &empty_line_marker)
            .ok();
        writeln!(output.writer()).ok();
    }

    writeln!(output.writer()).ok();
}

pub fn u8_to_printable_representation(byte: u8) -> String {
    escape_default(byte).map(|b| b as char).collect()
}

struct LineFormatter<'a> {
    line: &'a str,
}

impl<'a> LineFormatter<'a> {
    fn new(line: &'a str) -> Self {
        Self { line }
    }

    fn render(&self, writer: &mut dyn WriteColor) {
        let mut output = ColorOutput::new(writer);

        for chr in self.line.chars() {
            let (text, color) = self.render_char(chr);
            output.write_styled(color, color.is_some(), text).ok();
        }
    }

    /// Each printed character does not take up exactly one monospace grid
    /// cell, e.g. a TAB is rendered as 4 spaces. Returns the number of grid
    /// cells rendered before the given column.
    fn actual_column(&self, col: usize) -> usize {
        self.line
            .chars()
            .take(col)
            .map(|chr| self.render_char(chr).0.len())
            .sum()
    }

    fn render_char(&self, chr: char) -> (String, Option<Color>) {
        match chr {
            '\t' => (" ".repeat(TAB_WIDTH), None),
            '\r' => (String::new(), None),
            chr if chr.is_control() => (
                format!("{{{}}}", u8_to_printable_representation(chr as u8)),
                HIGHLIGHT,
            ),
            _ => (chr.to_string(), None),
        }
    }
}

pub fn pad_left(s: &str, pad: usize) -> String {
    format!(
        "{padding}{string}",
        padding = " ".repeat(pad.saturating_sub(s.len())),
        string = s
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use asciifile::AsciiFile;
    use failure::Fail;
    use std::{io, rc::Rc};
    use termcolor::{Buffer, ColorSpec};

    #[derive(Debug, Fail)]
    #[fail(display = "{}", _0)]
    struct TestError(&'static str);

    /// Writer that shares its buffer with the test body.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            io::Write::write(&mut *self.0.borrow_mut(), buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl WriteColor for SharedBuffer {
        fn supports_color(&self) -> bool {
            false
        }
        fn set_color(&mut self, _spec: &ColorSpec) -> io::Result<()> {
            Ok(())
        }
        fn reset(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn spanned_error<'f>(span: Span<'f>, text: &'static str) -> Spanned<'f, Box<dyn AsFail>> {
        Spanned::new(span, Box::new(TestError(text)))
    }

    #[test]
    fn test_pad_left() {
        let tests = vec![("a", "    a"), ("", "          "), ("a", "a"), ("", "")];

        for (input, expected) in tests {
            assert_eq!(expected, pad_left(input, expected.len()));
        }

        // not enough padding does not truncate string
        assert_eq!("a", pad_left("a", 0));
    }

    #[test]
    fn messages_keep_emission_order_and_counts() {
        let diagnostics = Diagnostics::new(Box::new(Buffer::no_color()));
        diagnostics.warning(Box::new(TestError("first")));
        diagnostics.error(Box::new(TestError("second")));
        diagnostics.warning(Box::new(TestError("third")));

        let texts = diagnostics
            .messages()
            .into_iter()
            .map(|msg| msg.text)
            .collect::<Vec<_>>();
        assert_eq!(vec!["first", "second", "third"], texts);
        assert_eq!(2, diagnostics.count(MessageLevel::Warning));
        assert_eq!(1, diagnostics.count(MessageLevel::Error));
        assert!(diagnostics.errored());
    }

    #[test]
    fn warnings_alone_do_not_error() {
        let diagnostics = Diagnostics::new(Box::new(Buffer::no_color()));
        diagnostics.warning(Box::new(TestError("harmless")));
        assert!(!diagnostics.errored());
    }

    #[test]
    fn duplicate_messages_are_recorded_once() {
        let file = AsciiFile::new(b"int x;\nint y;").unwrap();
        let positions = file.iter().collect::<Vec<_>>();
        let x = Span::from_single_position(positions[4]);
        let y = Span::from_single_position(positions[11]);

        let diagnostics = Diagnostics::new(Box::new(Buffer::no_color()));
        diagnostics.error_with_source_snippet(spanned_error(x, "bad"));
        diagnostics.error_with_source_snippet(spanned_error(x, "bad"));
        diagnostics.error_with_source_snippet(spanned_error(y, "bad"));
        diagnostics.warning_with_source_snippet(spanned_error(x, "bad"));

        let messages = diagnostics.messages();
        assert_eq!(3, messages.len());
        assert_eq!(Some(Location { start: (0, 4), end: (0, 4) }), messages[0].location);
        assert_eq!(Some(Location { start: (1, 4), end: (1, 4) }), messages[1].location);
        assert_eq!(MessageLevel::Warning, messages[2].level);
    }

    #[test]
    fn snippet_marks_the_span() {
        let file = AsciiFile::new(b"class A {\n\tint x = true;\n}").unwrap();
        let positions = file.iter().collect::<Vec<_>>();
        let span = Span::new(positions[19], positions[22]);
        assert_eq!("true", span.as_str());

        let buffer = SharedBuffer::default();
        let diagnostics = Diagnostics::new(Box::new(buffer.clone()));
        diagnostics.error_with_source_snippet(spanned_error(span, "wrong type"));

        let output = String::from_utf8(buffer.0.borrow().clone()).unwrap();
        let expected = format!(
            "error: wrong type\n   | \n 2 |     int x = true;\n   | {}^^^^\n\n",
            " ".repeat(12)
        );
        assert_eq!(expected, output);
    }

    #[test]
    fn statistics_summarize_errors() {
        let buffer = SharedBuffer::default();
        let diagnostics = Diagnostics::new(Box::new(buffer.clone()));
        diagnostics.error(Box::new(TestError("one")));
        diagnostics.error(Box::new(TestError("two")));
        diagnostics.write_statistics();

        let output = String::from_utf8(buffer.0.borrow().clone()).unwrap();
        assert!(output.ends_with("Compilation aborted due to 2 errors\n"));
    }
}
