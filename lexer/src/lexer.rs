//! Turns a MiniJava source file into a stream of tokens.
//!
//! Whitespace and comments are emitted as tokens as well, consumers that
//! are not interested in them (the parser) filter them out. Lexical errors
//! are yielded as `Err` items, the iterator continues behind them. Illegal
//! characters are skipped with a warning.
use asciifile::{Position, PositionIterator, Span, Spanned};
use compiler_shared::context::Context;
use derive_more::Display;
use diagnostics::u8_to_printable_representation;
use failure::Fail;
use lazy_static::lazy_static;
use std::{collections::HashMap, convert::TryFrom, result::Result};
use strtab::{StringTable, Symbol};
use strum::IntoEnumIterator;

macro_rules! match_op {
    ($input:expr, $( ($token_string:expr, $token:expr) ),+: $len:expr, $default:expr) => {{
        match $input.peek_at_most($len) {
            Some(span) => match span.as_str() {
                $(
                    $token_string => match_op!($input, span, $len, $token),
                )+
                _ => $default,
            },
            None => $default,
        }
    }};
    ($input:expr, $span:ident, $len:expr, $right:expr) => {{
        debug_assert!($len >= 1);
        for _ in 0..$len {
            $input.next();
        }
        Some(Token::new($span, TokenKind::Operator($right)))
    }};
}

pub type TokenResult<'f> = Result<Token<'f>, LexicalError<'f>>;

pub type Token<'f> = Spanned<'f, TokenKind<'f>>;
pub type LexicalError<'f> = Spanned<'f, ErrorKind>;

/// The literal text of an integer, its value is computed later so that a
/// preceding minus sign can be taken into account.
pub type IntLit<'f> = &'f str;

/// Keywords are single-ticked, operators back-ticked
#[derive(Debug, PartialEq, Eq, Clone, Display)]
pub enum TokenKind<'f> {
    #[display(fmt = "'{}'", _0)]
    Keyword(Keyword),
    #[display(fmt = "`{}`", _0)]
    Operator(Operator),
    #[display(fmt = "identifier `{}`", _0)]
    Identifier(Symbol<'f>),
    #[display(fmt = "integer literal `{}`", _0)]
    IntegerLiteral(IntLit<'f>),
    #[display(fmt = "char literal {:?}", _0)]
    CharLiteral(char),
    #[display(fmt = "string literal {:?}", _0)]
    StringLiteral(String),
    #[display(fmt = "a comment")]
    Comment(&'f str),
    #[display(fmt = "whitespace")]
    Whitespace,
}

#[derive(Debug, Fail, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    #[fail(display = "Unterminated comment")]
    UnclosedComment,
    #[fail(display = "Unterminated string literal")]
    UnterminatedStringLiteral,
    #[fail(display = "Incorrectly terminated char literal")]
    IncorrectlyTerminatedCharLiteral,
}

/// Problems that are reported to the diagnostics directly, after which
/// lexing continues as if nothing happened.
#[derive(Debug, Fail)]
pub enum Warning {
    #[fail(display = "Ignoring illegal character '{}'", _0)]
    IllegalCharacter(String),
}

#[derive(Debug, Fail)]
pub enum RecoverableError {
    #[fail(display = "Unknown string escape sequence: \\{}", _0)]
    UnknownEscapeSequence(char),
}

#[derive(
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Hash,
    PartialOrd,
    Ord,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Abstract,
    Boolean,
    Char,
    Class,
    Do,
    Else,
    Extends,
    False,
    If,
    Implements,
    Int,
    Interface,
    Long,
    New,
    Null,
    Private,
    Protected,
    Public,
    Return,
    Static,
    Super,
    This,
    True,
    Void,
    While,
}

lazy_static! {
    /// Reserved words, built once per process.
    static ref KEYWORDS: HashMap<String, Keyword> =
        Keyword::iter().map(|keyword| (keyword.to_string(), keyword)).collect();
}

impl TryFrom<&str> for Keyword {
    type Error = ();

    fn try_from(s: &str) -> Result<Keyword, Self::Error> {
        KEYWORDS.get(s).cloned().ok_or(())
    }
}

// Use non-semantic names, since e.g. '<' might mean more than 'less-than'
#[derive(
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Hash,
    PartialOrd,
    Ord,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum Operator {
    #[strum(serialize = "!=")]
    ExclaimEqual,
    #[strum(serialize = "!")]
    Exclaim,
    #[strum(serialize = "(")]
    LeftParen,
    #[strum(serialize = ")")]
    RightParen,
    #[strum(serialize = "*")]
    Star,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = ",")]
    Comma,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = ".")]
    Dot,
    #[strum(serialize = "/")]
    Slash,
    #[strum(serialize = ";")]
    Semicolon,
    #[strum(serialize = "<=")]
    LeftChevronEqual,
    #[strum(serialize = "<")]
    LeftChevron,
    #[strum(serialize = "==")]
    DoubleEqual,
    #[strum(serialize = "=")]
    Equal,
    #[strum(serialize = ">=")]
    RightChevronEqual,
    #[strum(serialize = ">")]
    RightChevron,
    #[strum(serialize = "%")]
    Percent,
    #[strum(serialize = "&&")]
    DoubleAmpersand,
    #[strum(serialize = "&")]
    Ampersand,
    #[strum(serialize = "[")]
    LeftBracket,
    #[strum(serialize = "]")]
    RightBracket,
    #[strum(serialize = "^")]
    Caret,
    #[strum(serialize = "{")]
    LeftBrace,
    #[strum(serialize = "}")]
    RightBrace,
    #[strum(serialize = "||")]
    DoublePipe,
    #[strum(serialize = "|")]
    Pipe,
}

pub struct Lexer<'f, 's> {
    input: PositionIterator<'f>,
    strtab: &'s mut StringTable<'f>,
    context: &'f Context<'f>,
}

/// Whitespace characters of MiniJava
fn is_minijava_whitespace(c: char) -> bool {
    match c {
        ' ' | '\n' | '\r' | '\t' | '\x0c' => true,
        _ => false,
    }
}

impl<'f, 's> Lexer<'f, 's> {
    pub fn new(strtab: &'s mut StringTable<'f>, context: &'f Context<'f>) -> Self {
        let input = context.file.iter();

        Self {
            context,
            strtab,
            input,
        }
    }

    fn lex_token(&mut self) -> Option<TokenResult<'f>> {
        loop {
            let position = self.input.peek()?;
            let token = match position.chr() {
                'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier_or_keyword(),
                '0'..='9' => self.lex_integer_literal(),
                c if is_minijava_whitespace(c) => self.lex_whitespace(),
                '/' if self.input.matches("/*") => self.lex_comment(),
                '/' if self.input.matches("//") => self.lex_line_comment(),
                '"' => self.lex_string_literal(),
                '\'' => self.lex_char_literal(),
                _ => match self.lex_operator() {
                    Some(token) => Ok(token),
                    None => {
                        self.input.next();
                        self.context.warning(
                            position.to_single_char_span(),
                            Warning::IllegalCharacter(u8_to_printable_representation(
                                position.chr() as u8,
                            )),
                        );
                        continue;
                    }
                },
            };
            return Some(token);
        }
    }

    fn next_position(&mut self) -> Position<'f> {
        self.input
            .next()
            .expect("caller must ensure there is a character left")
    }

    fn lex_identifier_or_keyword(&mut self) -> TokenResult<'f> {
        let span = self.lex_while(|position| match position.chr() {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => true,
            _ => false,
        });

        let kind = match Keyword::try_from(span.as_str()) {
            Ok(keyword) => TokenKind::Keyword(keyword),
            Err(()) => TokenKind::Identifier(self.strtab.intern(span.as_str())),
        };

        Ok(Token::new(span, kind))
    }

    /// The whole digit run is one literal, leading zeros included.
    fn lex_integer_literal(&mut self) -> TokenResult<'f> {
        let span = self.lex_while(|position| position.chr().is_ascii_digit());
        Ok(Token::new(span, TokenKind::IntegerLiteral(span.as_str())))
    }

    fn lex_comment(&mut self) -> TokenResult<'f> {
        debug_assert!(self.input.matches("/*"));

        let comment_start = self.next_position();
        let mut last = self.next_position();
        let mut body: Option<Span<'f>> = None;

        loop {
            if self.input.matches("*/") {
                self.next_position();
                let comment_end = self.next_position();
                return Ok(Token::new(
                    Span::new(comment_start, comment_end),
                    TokenKind::Comment(body.map(|body| body.as_str()).unwrap_or("")),
                ));
            }

            let position = match self.input.next() {
                Some(position) => position,
                None => {
                    return Err(LexicalError::new(
                        Span::new(comment_start, last),
                        ErrorKind::UnclosedComment,
                    ));
                }
            };

            body = Some(match body {
                Some(body) => body.extend_to_position(&position),
                None => position.to_single_char_span(),
            });
            last = position;
        }
    }

    fn lex_line_comment(&mut self) -> TokenResult<'f> {
        let span = self.lex_while(|position| position.chr() != '\n');
        Ok(Token::new(span, TokenKind::Comment(&span.as_str()[2..])))
    }

    fn lex_whitespace(&mut self) -> TokenResult<'f> {
        let span = self.lex_while(|position| is_minijava_whitespace(position.chr()));
        Ok(Token::new(span, TokenKind::Whitespace))
    }

    /// Decode the escape sequence whose backslash was just consumed.
    fn lex_escape_sequence(&mut self, backslash: Position<'f>) -> char {
        let escaped = match self.input.next() {
            Some(position) => position,
            None => return '\0',
        };
        match escaped.chr() {
            'n' => '\n',
            't' => '\t',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            unknown => {
                self.context.error(
                    Span::new(backslash, escaped),
                    RecoverableError::UnknownEscapeSequence(unknown),
                );
                '\0'
            }
        }
    }

    /// String literals may span multiple lines, only the end of the
    /// file terminates them early.
    fn lex_string_literal(&mut self) -> TokenResult<'f> {
        let opening_quote = self.next_position();
        let mut value = String::new();

        loop {
            let position = match self.input.next() {
                Some(position) => position,
                None => {
                    return Err(LexicalError::new(
                        opening_quote.to_single_char_span(),
                        ErrorKind::UnterminatedStringLiteral,
                    ));
                }
            };

            match position.chr() {
                '"' => {
                    return Ok(Token::new(
                        Span::new(opening_quote, position),
                        TokenKind::StringLiteral(value),
                    ));
                }
                '\\' => value.push(self.lex_escape_sequence(position)),
                chr => value.push(chr),
            }
        }
    }

    fn lex_char_literal(&mut self) -> TokenResult<'f> {
        let opening_quote = self.next_position();

        let value = match self.input.next() {
            Some(position) if position.chr() == '\\' => self.lex_escape_sequence(position),
            Some(position) => position.chr(),
            None => {
                return Err(LexicalError::new(
                    opening_quote.to_single_char_span(),
                    ErrorKind::IncorrectlyTerminatedCharLiteral,
                ));
            }
        };

        match self.input.peek() {
            Some(position) if position.chr() == '\'' => {
                self.input.next();
                Ok(Token::new(
                    Span::new(opening_quote, position),
                    TokenKind::CharLiteral(value),
                ))
            }
            Some(position) => Err(LexicalError::new(
                Span::new(opening_quote, position),
                ErrorKind::IncorrectlyTerminatedCharLiteral,
            )),
            None => Err(LexicalError::new(
                opening_quote.to_single_char_span(),
                ErrorKind::IncorrectlyTerminatedCharLiteral,
            )),
        }
    }

    fn lex_operator(&mut self) -> Option<Token<'f>> {
        use self::Operator::*;

        match_op!(
            self.input,
            ("!=", ExclaimEqual),
            ("<=", LeftChevronEqual),
            ("==", DoubleEqual),
            (">=", RightChevronEqual),
            ("&&", DoubleAmpersand),
            ("||", DoublePipe):
            2,
            match_op!(
                self.input,
                ("!", Exclaim),
                ("(", LeftParen),
                (")", RightParen),
                ("*", Star),
                ("+", Plus),
                (",", Comma),
                ("-", Minus),
                (".", Dot),
                ("/", Slash),
                (";", Semicolon),
                ("<", LeftChevron),
                ("=", Equal),
                (">", RightChevron),
                ("%", Percent),
                ("&", Ampersand),
                ("[", LeftBracket),
                ("]", RightBracket),
                ("^", Caret),
                ("{", LeftBrace),
                ("}", RightBrace),
                ("|", Pipe):
                1,
                None
            )
        )
    }

    /// Consumes the input one character at a time until the predicate is
    /// no longer true. The next character must exist and is always consumed.
    fn lex_while<P>(&mut self, predicate: P) -> Span<'f>
    where
        P: Fn(Position<'f>) -> bool,
    {
        let mut consumed = self.next_position().to_single_char_span();

        while let Some(peeked) = self.input.peek() {
            if !predicate(peeked) {
                break;
            }

            let position = self.next_position();
            consumed = consumed.extend_to_position(&position);
        }

        consumed
    }
}

impl<'f, 's> Iterator for Lexer<'f, 's> {
    type Item = TokenResult<'f>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lex_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asciifile::AsciiFile;
    use diagnostics::{Message, MessageLevel};

    /// Lex `input` and render every non-trivia token, errors prefixed
    /// with `!`.
    fn lex(input: &str) -> (Vec<String>, Vec<Message>) {
        let file = AsciiFile::new(input.as_bytes()).unwrap();
        let context = Context::dummy(&file);
        let mut strtab = StringTable::new();
        let tokens = Lexer::new(&mut strtab, &context)
            .filter_map(|result| match result {
                Ok(Spanned {
                    data: TokenKind::Whitespace,
                    ..
                })
                | Ok(Spanned {
                    data: TokenKind::Comment(_),
                    ..
                }) => None,
                Ok(token) => Some(token.data.to_string()),
                Err(err) => Some(format!("!{} at {}", err.data, err.span.start_position())),
            })
            .collect();
        (tokens, context.diagnostics.messages())
    }

    #[test]
    fn minijava_whitespace() {
        let chars = "\x07\x08\x0b"; // \a \b \v
        for c in chars.chars() {
            assert_eq!(is_minijava_whitespace(c), false)
        }
        assert!(is_minijava_whitespace('\x0c'));
    }

    #[test]
    fn keywords_and_identifiers() {
        let (tokens, messages) = lex("class Foo extends Bar { long x; interfaces }");
        assert_eq!(
            vec![
                "'class'",
                "identifier `Foo`",
                "'extends'",
                "identifier `Bar`",
                "`{`",
                "'long'",
                "identifier `x`",
                "`;`",
                "identifier `interfaces`",
                "`}`",
            ],
            tokens
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn keyword_table_round_trips_every_keyword() {
        for keyword in Keyword::iter() {
            assert_eq!(Ok(keyword), Keyword::try_from(keyword.to_string().as_str()));
        }
        assert_eq!(Err(()), Keyword::try_from("String"));
    }

    #[test]
    fn longest_operator_wins() {
        let (tokens, _) = lex("a<=b<c!=!d&&e&f||g|h==i=j");
        let operators = tokens
            .into_iter()
            .filter(|token| token.starts_with('`'))
            .collect::<Vec<_>>();
        assert_eq!(
            vec!["`<=`", "`<`", "`!=`", "`!`", "`&&`", "`&`", "`||`", "`|`", "`==`", "`=`"],
            operators
        );
    }

    #[test]
    fn integer_literals_are_kept_as_text() {
        let (tokens, _) = lex("2147483648 0 007+1");
        assert_eq!(
            vec![
                "integer literal `2147483648`",
                "integer literal `0`",
                "integer literal `007`",
                "`+`",
                "integer literal `1`",
            ],
            tokens
        );
    }

    #[test]
    fn char_and_string_escapes() {
        let (tokens, messages) = lex(r#"'a' '\n' '\'' "tab\there \"quoted\"\\""#);
        assert_eq!(
            vec![
                "char literal 'a'",
                "char literal '\\n'",
                "char literal '\\''",
                r#"string literal "tab\there \"quoted\"\\""#,
            ],
            tokens
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn unknown_escape_is_reported_and_lexing_continues() {
        let (tokens, messages) = lex(r#""a\qb" x"#);
        assert_eq!(vec![r#"string literal "a\0b""#, "identifier `x`"], tokens);
        assert_eq!(1, messages.len());
        assert_eq!(MessageLevel::Error, messages[0].level);
        assert_eq!("Unknown string escape sequence: \\q", messages[0].text);
    }

    #[test]
    fn unterminated_string_is_reported_once_at_opening_quote() {
        let (tokens, _) = lex("x = 1;\ny = \"never\nclosed");
        assert_eq!(
            vec![
                "identifier `x`",
                "`=`",
                "integer literal `1`",
                "`;`",
                "identifier `y`",
                "`=`",
                "!Unterminated string literal at 2:4",
            ],
            tokens
        );
    }

    #[test]
    fn incorrectly_terminated_char_literal() {
        let (tokens, _) = lex("'ab'");
        assert_eq!("!Incorrectly terminated char literal at 1:0", tokens[0]);
        assert_eq!("identifier `b`", tokens[1]);
    }

    #[test]
    fn unclosed_comment() {
        let (tokens, _) = lex("a /* b");
        assert_eq!(
            vec!["identifier `a`", "!Unterminated comment at 1:2"],
            tokens
        );
    }

    #[test]
    fn comments_are_skipped() {
        let (tokens, messages) = lex("a // b c\n/* d */ e /**/ f");
        assert_eq!(
            vec!["identifier `a`", "identifier `e`", "identifier `f`"],
            tokens
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn block_comments_do_not_nest() {
        let (tokens, messages) = lex("a /* b /* c */ d");
        assert_eq!(vec!["identifier `a`", "identifier `d`"], tokens);
        assert!(messages.is_empty());
    }

    #[test]
    fn illegal_characters_are_skipped_with_a_warning() {
        let (tokens, messages) = lex("a # b");
        assert_eq!(vec!["identifier `a`", "identifier `b`"], tokens);
        assert_eq!(1, messages.len());
        assert_eq!(MessageLevel::Warning, messages[0].level);
        assert_eq!("Ignoring illegal character '#'", messages[0].text);
    }
}
