//! All state shared by the lexer, parser, type checker and backends.
use asciifile::{AsciiFile, Span, Spanned};
use diagnostics::{Diagnostics, MessageLevel};
use failure::Fail;
use termcolor::WriteColor;

pub struct Context<'f> {
    pub file: &'f AsciiFile<'f>,
    pub diagnostics: Diagnostics,
}

impl<'f> Context<'f> {
    pub fn new(file: &'f AsciiFile<'f>, writer: Box<dyn WriteColor>) -> Self {
        Self {
            file,
            diagnostics: Diagnostics::new(writer),
        }
    }

    /// A context whose diagnostics output is discarded. Messages are still
    /// recorded and can be inspected through `diagnostics.messages()`.
    pub fn dummy(file: &'f AsciiFile<'f>) -> Self {
        Self::new(file, Box::new(dummy_writer()))
    }

    pub fn error<E: Fail>(&self, span: Span<'f>, error: E) {
        self.diagnostics
            .error_with_source_snippet(Spanned::new(span, Box::new(error)));
    }

    pub fn warning<E: Fail>(&self, span: Span<'f>, error: E) {
        self.diagnostics
            .warning_with_source_snippet(Spanned::new(span, Box::new(error)));
    }

    pub fn report<E: Fail>(&self, level: MessageLevel, error: Spanned<'f, E>) {
        let Spanned { span, data } = error;
        self.diagnostics
            .emit_with_source_snippet(level, Spanned::new(span, Box::new(data)));
    }
}

/// A `WriteColor` meant for tests.
pub fn dummy_writer() -> impl WriteColor {
    termcolor::NoColor::new(std::io::sink())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Fail)]
    #[fail(display = "something odd")]
    struct Odd;

    #[test]
    fn reports_reach_diagnostics() {
        let file = AsciiFile::new(b"x").unwrap();
        let context = Context::dummy(&file);
        let span = file.iter().next().unwrap().to_single_char_span();
        context.warning(span, Odd);
        context.report(MessageLevel::Error, Spanned::new(span, Odd));

        let messages = context.diagnostics.messages();
        assert_eq!(2, messages.len());
        assert_eq!("warning: something odd at 1:0", messages[0].to_string());
        assert!(context.diagnostics.errored());
    }
}
