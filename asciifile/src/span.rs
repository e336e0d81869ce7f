//! # Input File Ranges
//!
//! A `Span` is equivalent to a slice of the input file annotated with
//! line and column of start and end indices.
//!
//! The range defined by the start and end position of a `Span` is inclusive on
//! both sides. As a result, `as_str()` contains the character pointed at by
//! the start position and the character pointed to by the end position. This
//! way no fake end of file position is needed to point at the last character
//! of the input, and an empty `Span` cannot be constructed.
use crate::Position;
use std::{
    cmp::{max, min},
    fmt,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Span<'f> {
    /// position of the first char in the span.
    start: Position<'f>,
    /// position of the last char in the span.
    end: Position<'f>,
}

impl<'f> Span<'f> {
    pub fn new(a: Position<'f>, b: Position<'f>) -> Self {
        Self {
            start: min(a, b),
            end: max(a, b),
        }
    }

    /// Creates a span containing only the given position
    ///
    /// ```
    /// use asciifile::{AsciiFile, Span};
    ///
    /// let file = AsciiFile::new(b"ABCD").unwrap();
    /// let position = file.iter().nth(2).unwrap();
    /// let span = Span::from_single_position(position);
    /// assert_eq!("C", span.as_str());
    /// ```
    pub fn from_single_position(position: Position<'f>) -> Self {
        Span {
            start: position,
            end: position,
        }
    }

    pub fn as_str(&self) -> &'f str {
        &self.start.file().as_str()[self.start.byte_offset()..=self.end.byte_offset()]
    }

    pub fn start_position(&self) -> Position<'f> {
        self.start
    }

    pub fn end_position(&self) -> Position<'f> {
        self.end
    }

    /// Check if a span extends over multiple lines
    ///
    /// ```
    /// use asciifile::{AsciiFile, Span};
    ///
    /// let file = AsciiFile::new(b"a\nb").unwrap();
    /// let first = file.iter().next().unwrap();
    /// let last = file.iter().last().unwrap();
    /// assert!(Span::new(first, last).is_multiline());
    /// ```
    pub fn is_multiline(&self) -> bool {
        self.start.row() != self.end.row()
    }

    /// extends the span to include the given position
    pub fn extend_to_position(self, position: &Position<'f>) -> Span<'f> {
        Span::combine(&position.to_single_char_span(), &self)
    }

    pub fn combine(a: &Span<'f>, b: &Span<'f>) -> Span<'f> {
        Span {
            start: min(a.start, b.start),
            end: max(a.end, b.end),
        }
    }

    pub fn from_positions(positions: &[Position<'f>]) -> Option<Self> {
        let (head, tail) = positions.split_first()?;
        Some(
            tail.iter()
                .fold(Span::from_single_position(*head), |span, position| {
                    span.extend_to_position(position)
                }),
        )
    }
}

impl fmt::Display for Span<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AsciiFile;

    #[test]
    fn span_is_inclusive() {
        let file = AsciiFile::new(b"abcdfeghAAA").unwrap();
        let positions = file
            .iter()
            .take_while(|position| position.chr().is_lowercase())
            .collect::<Vec<_>>();

        let span = Span::from_positions(&positions).unwrap();
        assert_eq!("abcdfegh", span.as_str());
        assert!(Span::from_positions(&[]).is_none());
    }

    #[test]
    fn combine_orders_positions() {
        let file = AsciiFile::new(b"x = y;").unwrap();
        let positions = file.iter().collect::<Vec<_>>();
        let left = Span::from_single_position(positions[4]);
        let right = Span::new(positions[2], positions[0]);
        let combined = Span::combine(&left, &right);
        assert_eq!("x = y", combined.as_str());
        assert_eq!("1:0-1:4", combined.to_string());
    }
}
