use crate::{Position, PositionIterator};
use failure::Fail;
use std::fmt;

pub struct AsciiFile<'m> {
    mapping: &'m [u8],
}

#[derive(Debug, Fail)]
pub enum EncodingError {
    #[fail(
        display = "input contains non-ascii character at line {}, byte offset {}: {}<?>",
        line, position, prev
    )]
    NotAscii {
        line: usize,
        position: usize,
        prev: String,
    },
}

const ENCODING_ERROR_MAX_CONTEXT_LENGTH: usize = 80;

impl<'m> AsciiFile<'m> {
    // cost: O(fileLen) since we need to check if all chars are ASCII
    pub fn new(mapping: &'m [u8]) -> Result<AsciiFile<'m>, EncodingError> {
        if let Some(position) = mapping.iter().position(|c| !c.is_ascii()) {
            let line_start = line_start_idx(mapping, position);
            let context_start = line_start.max(
                position
                    .checked_sub(ENCODING_ERROR_MAX_CONTEXT_LENGTH)
                    .unwrap_or(0),
            );
            let dots = if context_start > line_start { "..." } else { "" };
            // everything before `position` is ASCII, hence valid UTF-8
            let prev = String::from_utf8_lossy(&mapping[context_start..position]);
            let line = mapping[..position].iter().filter(|&&b| b == b'\n').count() + 1;

            return Err(EncodingError::NotAscii {
                line,
                position,
                prev: format!("{}{}", dots, prev),
            });
        }

        Ok(AsciiFile { mapping })
    }

    pub fn as_str(&self) -> &'m str {
        // checked to be ASCII in `new`, and ASCII is a subset of UTF-8
        std::str::from_utf8(self.mapping).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub(crate) fn byte(&self, byte_offset: usize) -> Option<u8> {
        self.mapping.get(byte_offset).cloned()
    }

    /// Source text of the line containing `byte_offset`, without the
    /// trailing newline. A newline character belongs to the line it
    /// terminates.
    pub fn line_containing(&self, byte_offset: usize) -> &'m str {
        let byte_offset = byte_offset.min(self.mapping.len());
        let start = line_start_idx(self.mapping, byte_offset);
        let end = self.mapping[byte_offset..]
            .iter()
            .position(|&chr| chr == b'\n')
            .map(|pos| pos + byte_offset)
            .unwrap_or_else(|| self.mapping.len());
        &self.as_str()[start..end]
    }

    pub fn iter<'f>(&'f self) -> PositionIterator<'f> {
        PositionIterator::new(Position::at_file_start(self))
    }
}

fn line_start_idx(mapping: &[u8], byte_offset: usize) -> usize {
    mapping[..byte_offset]
        .iter()
        .rposition(|&chr| chr == b'\n')
        .map(|pos| pos + 1)
        .unwrap_or(0)
}

impl fmt::Debug for AsciiFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AsciiFile({} bytes)", self.mapping.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_ascii_input() {
        let err = AsciiFile::new("class A {}\nint ä;".as_bytes()).unwrap_err();
        match err {
            EncodingError::NotAscii {
                line,
                position,
                prev,
            } => {
                assert_eq!(2, line);
                assert_eq!(15, position);
                assert_eq!("int ", prev);
            }
        }
    }

    #[test]
    fn line_containing_excludes_newline() {
        let file = AsciiFile::new(b"banana\napple\n\nkiwi").unwrap();
        assert_eq!("banana", file.line_containing(0));
        assert_eq!("banana", file.line_containing(6));
        assert_eq!("apple", file.line_containing(7));
        assert_eq!("", file.line_containing(13));
        assert_eq!("kiwi", file.line_containing(16));
    }
}
