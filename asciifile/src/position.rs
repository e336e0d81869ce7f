//! A character of a file together with its location.
//!
//! There is no end of file character. The end of file is modeled using
//! the `None` case of `Option`.
use crate::{AsciiFile, PositionIterator, Span};
use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display},
};

#[derive(Copy, Clone)]
pub struct Position<'f> {
    byte_offset: usize,
    row: usize,
    column: usize,
    file: &'f AsciiFile<'f>,
}

impl<'f> Position<'f> {
    /// Create a new Position object pointing at the first character
    /// of a file. Returns `None` for empty files.
    pub fn at_file_start(file: &'f AsciiFile<'f>) -> Option<Self> {
        file.byte(0).map(|_| Self {
            byte_offset: 0,
            row: 0,
            column: 0,
            file,
        })
    }

    pub fn to_single_char_span(self) -> Span<'f> {
        Span::from_single_position(self)
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn file(&self) -> &'f AsciiFile<'f> {
        self.file
    }

    /// Get the character at this position. Always within the ASCII range.
    pub fn chr(&self) -> char {
        self.file.byte(self.byte_offset).unwrap_or(b'\0') as char
    }

    /// Zero based row. To get the line number, add `1`.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn line_number(&self) -> usize {
        self.row + 1
    }

    /// Zero based column within the row.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Get the position immediately following this position or `None` if
    /// this is the last position in the file.
    pub fn next(&self) -> Option<Position<'f>> {
        self.file.byte(self.byte_offset + 1)?;
        let (row, column) = if self.chr() == '\n' {
            (self.row + 1, 0)
        } else {
            (self.row, self.column + 1)
        };
        Some(Self {
            byte_offset: self.byte_offset + 1,
            row,
            column,
            file: self.file,
        })
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }

    /// Source code line containing the position, without the newline.
    pub fn line(&self) -> &'f str {
        self.file.line_containing(self.byte_offset)
    }

    pub fn iter(&self) -> PositionIterator<'f> {
        PositionIterator::new(Some(*self))
    }
}

impl PartialOrd for Position<'_> {
    fn partial_cmp(&self, other: &Position<'_>) -> Option<Ordering> {
        if !std::ptr::eq(self.file, other.file) {
            return None;
        }
        Some(self.byte_offset.cmp(&other.byte_offset))
    }
}

impl Ord for Position<'_> {
    fn cmp(&self, other: &Position<'_>) -> Ordering {
        debug_assert!(
            std::ptr::eq(self.file, other.file),
            "comparing positions of different files"
        );
        self.byte_offset.cmp(&other.byte_offset)
    }
}

impl PartialEq for Position<'_> {
    fn eq(&self, rhs: &Position<'_>) -> bool {
        self.byte_offset == rhs.byte_offset && std::ptr::eq(self.file, rhs.file)
    }
}

impl Eq for Position<'_> {}

impl Display for Position<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}:{}", self.line_number(), self.column())
    }
}

impl Debug for Position<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "Position{{row: {:?}, col: {:?}, byte_offset: {:?}}}",
            self.row, self.column, self.byte_offset,
        )
    }
}
