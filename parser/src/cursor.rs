use asciifile::Span;
use lexer::Token;
use utils::MultiPeekable;

/// The input ended while the parser still expected a token.
#[derive(Debug, PartialEq, Eq)]
pub struct EOF;

/// Token stream with arbitrary lookahead. It remembers where the last
/// consumed token ended, which is also where the AST node under
/// construction ends.
pub struct TokenCursor<'f, I>
where
    I: Iterator<Item = Token<'f>>,
{
    tokens: MultiPeekable<I>,
    last_consumed: Option<Span<'f>>,
}

impl<'f, I> TokenCursor<'f, I>
where
    I: Iterator<Item = Token<'f>>,
{
    pub fn new(tokens: I) -> Self {
        Self {
            tokens: MultiPeekable::new(tokens),
            last_consumed: None,
        }
    }

    pub fn bump(&mut self) -> Result<Token<'f>, EOF> {
        let token = self.tokens.next().ok_or(EOF)?;
        self.last_consumed = Some(token.span);
        Ok(token)
    }

    /// The `n`th token after the cursor, `lookahead(0)` being the next one.
    pub fn lookahead(&mut self, n: usize) -> Result<&Token<'f>, EOF> {
        self.tokens.peek_nth(n).ok_or(EOF)
    }

    pub fn at_end(&mut self) -> bool {
        self.tokens.peek().is_none()
    }

    pub fn last_span(&self) -> Option<Span<'f>> {
        self.last_consumed
    }

    pub fn next_span(&mut self) -> Result<Span<'f>, EOF> {
        self.lookahead(0).map(|token| token.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asciifile::{AsciiFile, Spanned};
    use lexer::TokenKind;

    #[test]
    fn tracks_the_last_consumed_token() {
        let file = AsciiFile::new(b"ab").unwrap();
        let spans: Vec<_> = file.iter().map(|p| p.to_single_char_span()).collect();
        let tokens = spans
            .iter()
            .map(|span| Spanned::new(*span, TokenKind::Whitespace))
            .collect::<Vec<_>>();

        let mut cursor = TokenCursor::new(tokens.into_iter());
        assert_eq!(None, cursor.last_span());
        assert_eq!(Ok(spans[1]), cursor.lookahead(1).map(|t| t.span));
        assert_eq!(Err(EOF), cursor.lookahead(2).map(|t| t.span));

        cursor.bump().unwrap();
        assert_eq!(Some(spans[0]), cursor.last_span());
        assert_eq!(Ok(spans[1]), cursor.next_span());

        cursor.bump().unwrap();
        assert!(cursor.at_end());
        assert_eq!(Err(EOF), cursor.bump().map(|t| t.span));
        assert_eq!(Some(spans[1]), cursor.last_span());
    }
}
