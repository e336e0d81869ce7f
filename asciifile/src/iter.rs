use crate::{Position, Span};

#[derive(Copy, Clone, Debug)]
pub struct PositionIterator<'f> {
    /// Always points to the next character to emit
    position_to_emit: Option<Position<'f>>,
}

impl<'f> Iterator for PositionIterator<'f> {
    type Item = Position<'f>;
    fn next(&mut self) -> Option<Position<'f>> {
        let position = self.position_to_emit?;
        self.position_to_emit = position.next();
        Some(position)
    }
}

impl<'f> PositionIterator<'f> {
    pub fn new(position: Option<Position<'f>>) -> Self {
        Self {
            position_to_emit: position,
        }
    }

    /// Look at the next `n` characters without advancing the iterator.
    /// If there are less than `n` characters, return `None`.
    pub fn peek_exactly(&self, n: usize) -> Option<Span<'f>> {
        self.peek_at_most(n)
            .filter(|span| span.as_str().len() == n)
    }

    /// Look at the next `n` characters without advancing the iterator.
    ///
    /// If there are less than `n` charcters left, the returned Span will be
    /// shortened to the maximal possible length. A span must contain at
    /// least one character, so `None` is returned at the end of the file.
    pub fn peek_at_most(&self, n: usize) -> Option<Span<'f>> {
        debug_assert!(n >= 1);
        let span_start = self.position_to_emit?;
        let span_end = self.take(n).last()?;
        Some(Span::new(span_start, span_end))
    }

    pub fn matches(&self, wanted: &str) -> bool {
        match self.peek_exactly(wanted.len()) {
            None => wanted.is_empty(),
            Some(span) => span.as_str() == wanted,
        }
    }

    pub fn peek(&self) -> Option<Position<'f>> {
        self.position_to_emit
    }

    pub fn eof_reached(&self) -> bool {
        self.peek().is_none()
    }
}

#[cfg(test)]
mod tests {
    use crate::AsciiFile;

    #[test]
    fn peeking_does_not_advance() {
        let file = AsciiFile::new(b"one\ntwo").unwrap();
        let mut iter = file.iter();

        while iter.peek().is_some() {
            let peeked = iter.peek();
            assert_eq!(peeked, iter.next());
        }

        assert!(iter.eof_reached());
    }

    #[test]
    fn peeking_multiple_chars() {
        let input = "one\ntwo three";
        let file = AsciiFile::new(input.as_bytes()).unwrap();
        let iter = file.iter();

        assert_eq!(input, iter.peek_at_most(input.len() + 1).unwrap().as_str());
        assert!(iter.peek_exactly(input.len() + 1).is_none());
        assert_eq!("on", iter.peek_exactly(2).unwrap().as_str());
        assert!(iter.matches("one\n"));
        assert!(!iter.matches("two"));
    }
}
