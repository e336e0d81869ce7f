use lexer::TokenKind::{self, *};
use std::fmt;

/// A token in the format of `--lextest`. The `Display` of `TokenKind` is
/// meant for error messages and quotes keywords and operators.
pub struct Output<'token> {
    token: &'token TokenKind<'token>,
}

impl<'token> Output<'token> {
    pub fn new(token: &'token TokenKind<'token>) -> Self {
        Self { token }
    }
}

impl<'token> fmt::Display for Output<'token> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self.token {
            Keyword(keyword) => write!(f, "{}", keyword),
            Operator(operator) => write!(f, "{}", operator),
            Identifier(symbol) => write!(f, "identifier {}", symbol),
            IntegerLiteral(lit) => write!(f, "integer literal {}", lit),
            CharLiteral(c) => write!(f, "character literal '{}'", c.escape_default()),
            StringLiteral(s) => write!(f, "string literal \"{}\"", s.escape_default()),
            Comment(body) => write!(f, "/*{}*/", body),
            Whitespace => write!(f, ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexer::{Keyword as Kw, Operator as Op};

    #[test]
    fn tokens_in_lextest_format() {
        let cases = vec![
            (Keyword(Kw::Class), "class"),
            (Operator(Op::DoubleAmpersand), "&&"),
            (IntegerLiteral("0042"), "integer literal 0042"),
            (CharLiteral('\n'), "character literal '\\n'"),
            (StringLiteral("a\"b".to_string()), "string literal \"a\\\"b\""),
        ];
        for (token, expected) in &cases {
            assert_eq!(*expected, Output::new(token).to_string());
        }
    }
}
