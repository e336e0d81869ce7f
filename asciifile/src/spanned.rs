use crate::{MaybeSpanned, Span};
use std::{fmt, ops::Deref};

/// A value together with the source range it was produced from. Tokens,
/// AST nodes and diagnostics all carry their location this way.
#[derive(Debug, Clone)]
pub struct Spanned<'f, T> {
    pub span: Span<'f>,
    pub data: T,
}

impl<'f, T> Spanned<'f, T> {
    pub fn new(span: Span<'f>, data: T) -> Self {
        Spanned { span, data }
    }

    /// Same location, new data.
    pub fn map<U, F>(&self, f: F) -> Spanned<'f, U>
    where
        F: FnOnce(&T) -> U,
    {
        Spanned::new(self.span, f(&self.data))
    }
}

/// Equality ignores the span, so the same node parsed from two places in
/// the source compares equal.
impl<'f, T: PartialEq> PartialEq for Spanned<'f, T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<'f, T: Eq> Eq for Spanned<'f, T> {}

impl<'f, T> Deref for Spanned<'f, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.data, self.span)
    }
}

impl<'f, T> From<Spanned<'f, T>> for MaybeSpanned<'f, T> {
    fn from(spanned: Spanned<'f, T>) -> Self {
        MaybeSpanned::WithSpan(spanned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AsciiFile;

    #[test]
    fn equality_ignores_the_span() {
        let file = AsciiFile::new(b"xx").unwrap();
        let mut positions = file.iter();
        let first = positions.next().unwrap().to_single_char_span();
        let second = positions.next().unwrap().to_single_char_span();

        assert_eq!(Spanned::new(first, 'x'), Spanned::new(second, 'x'));
        assert_eq!("1 at 1:1", Spanned::new(second, 1).to_string());
        assert_eq!(second, Spanned::new(second, 1).map(|n| n + 1).span);

        let maybe: MaybeSpanned<'_, i32> = Spanned::new(first, 1).into();
        assert_eq!(Some(first), maybe.span());
    }
}
