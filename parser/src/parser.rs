//! Recursive descent parser for MiniJava, with an operator precedence
//! parser for binary expressions.
//!
//! The parser stops at the first syntax error.
pub mod ast;
mod cursor;

use self::cursor::{TokenCursor, EOF};
use asciifile::{
    MaybeSpanned::{self, *},
    Span, Spanned,
};
use derive_more::Display;
use failure::Fail;
use lexer::{IntLit, Keyword, Operator, Token, TokenKind};
use std::fmt;
use strtab::Symbol;

type Precedence = usize;
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryKind {
    Binary(ast::BinaryOp),
    Relational(ast::RelOp),
    Assign,
}

#[rustfmt::skip]
const BINARY_OPERATORS: &[(Operator, BinaryKind, Precedence, Assoc)] = &[
    (Operator::Star,              BinaryKind::Binary(ast::BinaryOp::Mul),              1, Assoc::Left),
    (Operator::Slash,             BinaryKind::Binary(ast::BinaryOp::Div),              1, Assoc::Left),
    (Operator::Percent,           BinaryKind::Binary(ast::BinaryOp::Mod),              1, Assoc::Left),

    (Operator::Plus,              BinaryKind::Binary(ast::BinaryOp::Add),              2, Assoc::Left),
    (Operator::Minus,             BinaryKind::Binary(ast::BinaryOp::Sub),              2, Assoc::Left),

    (Operator::LeftChevron,       BinaryKind::Relational(ast::RelOp::LessThan),        3, Assoc::Left),
    (Operator::LeftChevronEqual,  BinaryKind::Relational(ast::RelOp::LessEquals),      3, Assoc::Left),
    (Operator::RightChevron,      BinaryKind::Relational(ast::RelOp::GreaterThan),     3, Assoc::Left),
    (Operator::RightChevronEqual, BinaryKind::Relational(ast::RelOp::GreaterEquals),   3, Assoc::Left),

    (Operator::DoubleEqual,       BinaryKind::Relational(ast::RelOp::Equals),          4, Assoc::Left),
    (Operator::ExclaimEqual,      BinaryKind::Relational(ast::RelOp::NotEquals),       4, Assoc::Left),

    (Operator::Ampersand,         BinaryKind::Binary(ast::BinaryOp::BitAnd),           5, Assoc::Left),
    (Operator::Caret,             BinaryKind::Binary(ast::BinaryOp::BitXor),           6, Assoc::Left),
    (Operator::Pipe,              BinaryKind::Binary(ast::BinaryOp::BitOr),            7, Assoc::Left),

    (Operator::DoubleAmpersand,   BinaryKind::Binary(ast::BinaryOp::LogicalAnd),       8, Assoc::Left),
    (Operator::DoublePipe,        BinaryKind::Binary(ast::BinaryOp::LogicalOr),        9, Assoc::Left),

    (Operator::Equal,             BinaryKind::Assign,                                 10, Assoc::Right),
];

#[derive(Debug, Clone, Fail)]
pub enum SyntaxError {
    #[fail(display = "expected {}, found {}", expected, actual)]
    UnexpectedToken { actual: String, expected: String },
    #[fail(display = "unexpected end of file")]
    UnexpectedEOF,
}

impl<'f> From<EOF> for MaybeSpanned<'f, SyntaxError> {
    fn from(_: EOF) -> Self {
        MaybeSpanned::WithoutSpan(SyntaxError::UnexpectedEOF)
    }
}

pub trait ExpectedToken<'f>: fmt::Debug + fmt::Display {
    type Yields;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields>;

    fn matches(&self, token: &TokenKind<'f>) -> bool {
        self.matching(token).is_some()
    }
}

#[derive(Debug, Clone, Display)]
#[display(fmt = "{}", _0)]
struct Exactly<'f>(TokenKind<'f>);
#[derive(Debug, Clone, Display)]
#[display(fmt = "a binary operator")]
struct BinaryOp;
#[derive(Debug, Clone, Display)]
#[display(fmt = "a unary operator")]
struct UnaryOp;
#[derive(Debug, Clone, Display)]
#[display(fmt = "an identifier")]
struct Identifier;
#[derive(Debug, Clone, Display)]
#[display(fmt = "an integer literal")]
struct IntegerLiteral;
#[derive(Debug, Clone, Display)]
#[display(fmt = "a char literal")]
struct CharLiteral;
#[derive(Debug, Clone, Display)]
#[display(fmt = "a string literal")]
struct StringLiteral;
#[derive(Debug, Clone, Display)]
#[display(fmt = "a primitive type")]
struct PrimitiveType;
/// Tokens that may follow `(Identifier)` if it is a cast and not a
/// parenthesized variable. A `-` is not among them, `(a) - b` is a
/// subtraction.
#[derive(Debug, Clone, Display)]
#[display(fmt = "the start of a cast operand")]
struct CastOperandStart;

impl<'f> From<Operator> for Exactly<'f> {
    fn from(op: Operator) -> Self {
        Exactly(TokenKind::Operator(op))
    }
}

impl<'f> From<Keyword> for Exactly<'f> {
    fn from(kw: Keyword) -> Self {
        Exactly(TokenKind::Keyword(kw))
    }
}

fn exactly<'f>(thing: impl Into<Exactly<'f>>) -> Exactly<'f> {
    thing.into()
}

impl<'f> ExpectedToken<'f> for Exactly<'f> {
    type Yields = ();
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        if &self.0 == token {
            Some(())
        } else {
            None
        }
    }
}

impl<'f> ExpectedToken<'f> for BinaryOp {
    type Yields = (BinaryKind, Precedence, Assoc);
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::Operator(op) => BINARY_OPERATORS
                .iter()
                .find(|(this_op, _, _, _)| this_op == op)
                .map(|(_, kind, prec, assoc)| (*kind, *prec, *assoc)),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for UnaryOp {
    type Yields = ast::UnaryOp;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::Operator(Operator::Exclaim) => Some(ast::UnaryOp::Not),
            TokenKind::Operator(Operator::Minus) => Some(ast::UnaryOp::Neg),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for Identifier {
    type Yields = Symbol<'f>;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::Identifier(ident) => Some(*ident),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for IntegerLiteral {
    type Yields = IntLit<'f>;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::IntegerLiteral(lit) => Some(*lit),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for CharLiteral {
    type Yields = char;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::CharLiteral(c) => Some(*c),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for StringLiteral {
    type Yields = String;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::StringLiteral(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for PrimitiveType {
    type Yields = ast::BasicType<'f>;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::Keyword(Keyword::Int) => Some(ast::BasicType::Int),
            TokenKind::Keyword(Keyword::Long) => Some(ast::BasicType::Long),
            TokenKind::Keyword(Keyword::Char) => Some(ast::BasicType::Char),
            TokenKind::Keyword(Keyword::Boolean) => Some(ast::BasicType::Boolean),
            TokenKind::Keyword(Keyword::Void) => Some(ast::BasicType::Void),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for CastOperandStart {
    type Yields = ();
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::Identifier(_)
            | TokenKind::IntegerLiteral(_)
            | TokenKind::CharLiteral(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::Operator(Operator::LeftParen)
            | TokenKind::Operator(Operator::Exclaim)
            | TokenKind::Keyword(Keyword::This)
            | TokenKind::Keyword(Keyword::Super)
            | TokenKind::Keyword(Keyword::New)
            | TokenKind::Keyword(Keyword::Null)
            | TokenKind::Keyword(Keyword::True)
            | TokenKind::Keyword(Keyword::False) => Some(()),
            _ => None,
        }
    }
}

pub type SyntaxResult<'f, T> = Result<T, MaybeSpanned<'f, SyntaxError>>;
type ParserResult<'f, T> = SyntaxResult<'f, Spanned<'f, T>>;

pub struct Parser<'f, I>
where
    I: Iterator<Item = Token<'f>>,
{
    tokens: TokenCursor<'f, I>,
    arena: ast::ExprArena<'f>,
}

macro_rules! spanned {
    ($self:expr, $code:expr) => {{
        let start = $self.tokens.next_span();
        let data: SyntaxResult<'f, _> = $code;
        let data = data?;
        let end = $self
            .tokens
            .last_span()
            .expect("a parsed node consumed at least one token")
            .end_position();
        // `$code` reports a missing first token with a better message.
        let start = start?.start_position();

        let node: SyntaxResult<'f, _> = Ok(Spanned::new(Span::new(start, end), data));
        node
    }};
}

impl<'f, I> Parser<'f, I>
where
    I: Iterator<Item = Token<'f>>,
{
    /// The token stream must not contain whitespace or comments.
    pub fn new(tokens: I) -> Self {
        Parser {
            tokens: TokenCursor::new(tokens),
            arena: ast::ExprArena::new(),
        }
    }

    #[allow(clippy::needless_pass_by_value)]
    fn omnomnom<E>(&mut self, want: E) -> SyntaxResult<'f, Spanned<'f, E::Yields>>
    where
        E: ExpectedToken<'f>,
    {
        let actual = self.tokens.bump()?;

        want.matching(&actual.data)
            .map(|yielded| actual.map(|_| yielded))
            .ok_or_else(|| {
                WithSpan(Spanned {
                    span: actual.span,
                    data: SyntaxError::UnexpectedToken {
                        actual: actual.data.to_string(),
                        expected: want.to_string(),
                    },
                })
            })
    }

    #[allow(clippy::needless_pass_by_value)]
    fn omnomnoptional<E>(&mut self, want: E) -> SyntaxResult<'f, Option<Spanned<'f, E::Yields>>>
    where
        E: ExpectedToken<'f>,
    {
        let yielded = match self.tokens.lookahead(0) {
            Ok(got) => want.matching(&got.data),
            Err(EOF) => return Ok(None),
        };

        match yielded {
            Some(yielded) => {
                let got = self.tokens.bump()?;
                Ok(Some(got.map(|_| yielded)))
            }
            None => Ok(None),
        }
    }

    #[allow(clippy::needless_pass_by_value)]
    fn tastes_like<E>(&mut self, want: E) -> bool
    where
        E: ExpectedToken<'f>,
    {
        self.nth_tastes_like(0, want)
    }

    /// `false` if the input ends before the `n`th token.
    #[allow(clippy::needless_pass_by_value)]
    fn nth_tastes_like<E>(&mut self, n: usize, want: E) -> bool
    where
        E: ExpectedToken<'f>,
    {
        self.tokens
            .lookahead(n)
            .map(|got| want.matches(&got.data))
            .unwrap_or(false)
    }

    /// Consume the next token and report it as unexpected.
    fn unexpected<T>(&mut self, expected: &str) -> SyntaxResult<'f, T> {
        let actual = self.tokens.bump()?;
        Err(WithSpan(Spanned {
            span: actual.span,
            data: SyntaxError::UnexpectedToken {
                actual: actual.data.to_string(),
                expected: expected.to_string(),
            },
        }))
    }

    fn alloc(&mut self, expr: Spanned<'f, ast::Expr<'f>>) -> ast::ExprId {
        self.arena.alloc(expr)
    }

    pub fn parse(&mut self) -> SyntaxResult<'f, ast::Program<'f>> {
        let mut classes = Vec::new();
        while !self.tokens.at_end() {
            classes.push(self.parse_class_declaration()?);
        }

        Ok(ast::Program {
            classes,
            arena: std::mem::replace(&mut self.arena, ast::ExprArena::new()),
        })
    }

    fn parse_class_declaration(&mut self) -> ParserResult<'f, ast::ClassDeclaration<'f>> {
        spanned!(self, {
            let mut is_abstract = false;
            loop {
                if self.omnomnoptional(exactly(Keyword::Public))?.is_some() {
                    continue;
                }
                if self.omnomnoptional(exactly(Keyword::Abstract))?.is_some() {
                    is_abstract = true;
                    continue;
                }
                break;
            }

            let kind = if self.omnomnoptional(exactly(Keyword::Class))?.is_some() {
                ast::ClassKind::Class
            } else if self.omnomnoptional(exactly(Keyword::Interface))?.is_some() {
                ast::ClassKind::Interface
            } else {
                return self.unexpected("keyword `class` or `interface`");
            };
            let name = self.omnomnom(Identifier)?;

            let mut parent = None;
            let mut interfaces = Vec::new();
            match kind {
                ast::ClassKind::Class => {
                    if self.omnomnoptional(exactly(Keyword::Extends))?.is_some() {
                        parent = Some(self.omnomnom(Identifier)?);
                    }
                    if self.omnomnoptional(exactly(Keyword::Implements))?.is_some() {
                        interfaces = self.parse_identifier_list()?;
                    }
                }
                ast::ClassKind::Interface => {
                    if self.omnomnoptional(exactly(Keyword::Extends))?.is_some() {
                        interfaces = self.parse_identifier_list()?;
                    }
                }
            }

            let mut members = Vec::new();
            self.omnomnom(exactly(Operator::LeftBrace))?;
            while self
                .omnomnoptional(exactly(Operator::RightBrace))?
                .is_none()
            {
                members.push(self.parse_class_member()?);
            }

            Ok(ast::ClassDeclaration {
                kind,
                is_abstract,
                name,
                parent,
                interfaces,
                members,
            })
        })
    }

    fn parse_identifier_list(&mut self) -> SyntaxResult<'f, Vec<Spanned<'f, Symbol<'f>>>> {
        let mut list = vec![self.omnomnom(Identifier)?];
        while self.omnomnoptional(exactly(Operator::Comma))?.is_some() {
            list.push(self.omnomnom(Identifier)?);
        }
        Ok(list)
    }

    fn parse_modifiers(&mut self) -> SyntaxResult<'f, ast::Modifiers> {
        let mut modifiers = ast::Modifiers::default();
        loop {
            if self.omnomnoptional(exactly(Keyword::Public))?.is_some() {
                modifiers.visibility = ast::Visibility::Public;
            } else if self.omnomnoptional(exactly(Keyword::Protected))?.is_some() {
                modifiers.visibility = ast::Visibility::Protected;
            } else if self.omnomnoptional(exactly(Keyword::Private))?.is_some() {
                modifiers.visibility = ast::Visibility::Private;
            } else if self.omnomnoptional(exactly(Keyword::Static))?.is_some() {
                modifiers.is_static = true;
            } else if self.omnomnoptional(exactly(Keyword::Abstract))?.is_some() {
                modifiers.is_abstract = true;
            } else {
                return Ok(modifiers);
            }
        }
    }

    fn parse_class_member(&mut self) -> ParserResult<'f, ast::ClassMember<'f>> {
        spanned!(self, {
            let modifiers = self.parse_modifiers()?;
            let ty = self.parse_type()?;
            let name = self.omnomnom(Identifier)?.data;

            let kind = if self.tastes_like(exactly(Operator::LeftParen)) {
                let params = self.parse_parameter_declarations()?;
                let body = if self.omnomnoptional(exactly(Operator::Semicolon))?.is_some() {
                    None
                } else {
                    Some(self.parse_block()?)
                };

                ast::ClassMemberKind::Method(ty, params, body)
            } else {
                self.omnomnom(exactly(Operator::Semicolon))?;
                ast::ClassMemberKind::Field(ty)
            };

            Ok(ast::ClassMember {
                kind,
                name,
                modifiers,
            })
        })
    }

    fn parse_parameter_declarations(&mut self) -> ParserResult<'f, ast::ParameterList<'f>> {
        self.parse_parenthesized_list(|parser| parser.parse_parameter())
    }

    fn parse_parameter(&mut self) -> ParserResult<'f, ast::Parameter<'f>> {
        spanned!(self, {
            let ty = self.parse_type()?;
            let name = self.omnomnom(Identifier)?.data;
            Ok(ast::Parameter { ty, name })
        })
    }

    fn parse_type(&mut self) -> ParserResult<'f, ast::Type<'f>> {
        spanned!(self, {
            let basic = self.parse_basic_type()?;

            let mut array_depth = 0;
            while self
                .omnomnoptional(exactly(Operator::LeftBracket))?
                .is_some()
            {
                self.omnomnom(exactly(Operator::RightBracket))?;
                array_depth += 1;
            }

            Ok(ast::Type { basic, array_depth })
        })
    }

    fn parse_basic_type(&mut self) -> ParserResult<'f, ast::BasicType<'f>> {
        if let Some(primitive) = self.omnomnoptional(PrimitiveType)? {
            Ok(primitive)
        } else if let Some(sym) = self.omnomnoptional(Identifier)? {
            Ok(sym.map(|sym| ast::BasicType::Custom(*sym)))
        } else {
            self.unexpected("a primitive type or an identifier")
        }
    }

    fn parse_block(&mut self) -> ParserResult<'f, ast::Block<'f>> {
        spanned!(self, {
            self.omnomnom(exactly(Operator::LeftBrace))?;

            let mut statements = Vec::new();
            while self
                .omnomnoptional(exactly(Operator::RightBrace))?
                .is_none()
            {
                statements.push(self.parse_block_statement()?);
            }

            Ok(ast::Block { statements })
        })
    }

    fn parse_statement(&mut self) -> ParserResult<'f, ast::Stmt<'f>> {
        self.parse_statement_or_local_var(false)
    }

    fn parse_block_statement(&mut self) -> ParserResult<'f, ast::Stmt<'f>> {
        self.parse_statement_or_local_var(true)
    }

    fn looks_like_local_var_decl(&mut self) -> bool {
        (self.tastes_like(PrimitiveType) || self.tastes_like(Identifier))
            && (self.nth_tastes_like(1, Identifier)
                || (self.nth_tastes_like(1, exactly(Operator::LeftBracket))
                    && self.nth_tastes_like(2, exactly(Operator::RightBracket))))
    }

    // Local variable declarations are only allowed directly inside a block,
    // not e.g. as the body of an `if`.
    fn parse_statement_or_local_var(
        &mut self,
        allow_local_var_decl: bool,
    ) -> ParserResult<'f, ast::Stmt<'f>> {
        spanned!(self, {
            use self::ast::Stmt::*;

            if self.tastes_like(exactly(Operator::LeftBrace)) {
                Ok(Block(self.parse_block()?))
            } else if self.omnomnoptional(exactly(Operator::Semicolon))?.is_some() {
                Ok(Empty)
            } else if self.omnomnoptional(exactly(Keyword::If))?.is_some() {
                let cond = self.parse_condition()?;

                let if_arm = self.parse_statement()?;
                let else_arm = if self.omnomnoptional(exactly(Keyword::Else))?.is_some() {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };

                Ok(If(cond, Box::new(if_arm), else_arm))
            } else if self.omnomnoptional(exactly(Keyword::While))?.is_some() {
                let cond = self.parse_condition()?;
                let body = self.parse_statement()?;

                Ok(While(cond, Box::new(body)))
            } else if self.omnomnoptional(exactly(Keyword::Do))?.is_some() {
                let body = self.parse_statement()?;
                self.omnomnom(exactly(Keyword::While))?;
                let cond = self.parse_condition()?;
                self.omnomnom(exactly(Operator::Semicolon))?;

                Ok(DoWhile(Box::new(body), cond))
            } else if self.omnomnoptional(exactly(Keyword::Return))?.is_some() {
                let expr = if !self.tastes_like(exactly(Operator::Semicolon)) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };

                self.omnomnom(exactly(Operator::Semicolon))?;

                Ok(Return(expr))
            } else if allow_local_var_decl && self.looks_like_local_var_decl() {
                let ty = self.parse_type()?;
                let name = self.omnomnom(Identifier)?;
                let init = if self.omnomnoptional(exactly(Operator::Equal))?.is_some() {
                    Some(self.parse_expression()?)
                } else {
                    None
                };

                self.omnomnom(exactly(Operator::Semicolon))?;

                Ok(LocalVariableDeclaration(ty, name, init))
            } else {
                let expr = self.parse_expression()?;
                self.omnomnom(exactly(Operator::Semicolon))?;

                Ok(Expression(expr))
            }
        })
    }

    /// `( EXPR )` after `if` and `while`
    fn parse_condition(&mut self) -> SyntaxResult<'f, ast::ExprId> {
        self.omnomnom(exactly(Operator::LeftParen))?;
        let cond = self.parse_expression()?;
        self.omnomnom(exactly(Operator::RightParen))?;
        Ok(cond)
    }

    fn parse_expression(&mut self) -> SyntaxResult<'f, ast::ExprId> {
        self.parse_binary_expression()
    }

    /// This uses an adapted version of Djikstras original "Shunting Yard"
    /// algorithm [1]. While this traditionally only converts to RPN, it is
    /// combined with an RPN evaluator [2] to build the AST of the
    /// expression on the fly instead. This can also be seen
    /// as a non-recursive variant of precedence climbing [3].
    ///
    /// [1]: https://en.wikipedia.org/wiki/Shunting-yard_algorithm
    /// [2]: https://en.wikipedia.org/wiki/Reverse_Polish_notation#Postfix_evaluation_algorithm
    /// [3]: https://eli.thegreenplace.net/2012/08/02/parsing-expressions-by-precedence-climbing
    fn parse_binary_expression(&mut self) -> SyntaxResult<'f, ast::ExprId> {
        let mut operator_stack: Vec<(BinaryKind, Precedence, Assoc)> = Vec::new();
        let mut operand_stack: Vec<ast::ExprId> = Vec::new();

        // Invariant: we only construct valid RPN, so there are always two
        // operands for every operator.
        fn rpn_eval<'f>(
            arena: &mut ast::ExprArena<'f>,
            operand_stack: &mut Vec<ast::ExprId>,
            kind: BinaryKind,
        ) {
            debug_assert!(operand_stack.len() >= 2);
            let (rhs, lhs) = match (operand_stack.pop(), operand_stack.pop()) {
                (Some(rhs), Some(lhs)) => (rhs, lhs),
                _ => return,
            };
            let span = Span::combine(&arena.span(lhs), &arena.span(rhs));
            let data = match kind {
                BinaryKind::Binary(op) => ast::Expr::Binary(op, lhs, rhs),
                BinaryKind::Relational(op) => ast::Expr::Relational(op, lhs, rhs),
                BinaryKind::Assign => ast::Expr::Assignment(lhs, rhs),
            };
            operand_stack.push(arena.alloc(Spanned { span, data }));
        }

        operand_stack.push(self.parse_unary_expression()?);

        // Convert to RPN, but "evaluate" RPN on-the-fly (where "evaluate" means
        // constructing an AST)
        while let Some((kind, prec, assoc)) =
            self.omnomnoptional(BinaryOp)?.map(|spanned| spanned.data)
        {
            // This is the part that replaces the recursion from precedence climbing.
            // Instead, we use an explicit `operator_stack` of operands that we need to
            // defer because we have one with higher precedence in our hands
            while let Some(&(top_kind, top_prec, top_assoc)) = operator_stack.last() {
                if top_prec < prec || top_assoc == Assoc::Left && top_prec == prec {
                    operator_stack.pop();
                    rpn_eval(&mut self.arena, &mut operand_stack, top_kind);
                } else {
                    break;
                }
            }

            operator_stack.push((kind, prec, assoc));
            operand_stack.push(self.parse_unary_expression()?);
        }

        // Consume remaining operators
        while let Some((kind, _, _)) = operator_stack.pop() {
            rpn_eval(&mut self.arena, &mut operand_stack, kind)
        }

        debug_assert_eq!(operand_stack.len(), 1);
        match operand_stack.pop() {
            Some(expr) => Ok(expr),
            None => Err(WithoutSpan(SyntaxError::UnexpectedEOF)),
        }
    }

    /// `(Type) expr` is a cast if `Type` is primitive, or if `Type` is an
    /// identifier and the token behind `)` cannot continue a binary
    /// expression.
    fn looks_like_cast(&mut self) -> bool {
        if !self.tastes_like(exactly(Operator::LeftParen))
            || !self.nth_tastes_like(2, exactly(Operator::RightParen))
        {
            return false;
        }
        self.nth_tastes_like(1, PrimitiveType)
            || (self.nth_tastes_like(1, Identifier) && self.nth_tastes_like(3, CastOperandStart))
    }

    fn parse_unary_expression(&mut self) -> SyntaxResult<'f, ast::ExprId> {
        if let Some(op) = self.omnomnoptional(UnaryOp)? {
            let folds_into_literal = op.data == ast::UnaryOp::Neg
                && self.tastes_like(IntegerLiteral)
                && !self.nth_tastes_like(1, exactly(Operator::Dot))
                && !self.nth_tastes_like(1, exactly(Operator::LeftBracket));

            if folds_into_literal {
                let lit = self.omnomnom(IntegerLiteral)?;
                let span = Span::combine(&op.span, &lit.span);
                return Ok(self.alloc(Spanned::new(span, ast::Expr::NegInt(lit))));
            }

            let operand = self.parse_unary_expression()?;
            let span = Span::combine(&op.span, &self.arena.span(operand));
            Ok(self.alloc(Spanned::new(span, ast::Expr::Unary(op.data, operand))))
        } else if self.looks_like_cast() {
            let open = self.omnomnom(exactly(Operator::LeftParen))?;
            let ty = self.parse_type()?;
            self.omnomnom(exactly(Operator::RightParen))?;

            let operand = self.parse_unary_expression()?;
            let span = Span::combine(&open.span, &self.arena.span(operand));
            Ok(self.alloc(Spanned::new(
                span,
                ast::Expr::Cast(ty, operand, ast::CastKind::Explicit),
            )))
        } else {
            self.parse_postfix_expression()
        }
    }

    fn parse_postfix_expression(&mut self) -> SyntaxResult<'f, ast::ExprId> {
        let mut expr = self.parse_primary_expression()?;

        loop {
            let expr_span = self.arena.span(expr);
            let node = if self.omnomnoptional(exactly(Operator::Dot))?.is_some() {
                let adressee = self.omnomnom(Identifier)?;

                if self.tastes_like(exactly(Operator::LeftParen)) {
                    // method call: EXPR.ident(arg1, arg2, ...)
                    let args = self.parse_argument_list()?;

                    Spanned {
                        span: Span::combine(&expr_span, &args.span),
                        data: ast::Expr::MethodInvocation(expr, adressee, args),
                    }
                } else {
                    // member reference: EXPR.ident
                    Spanned {
                        span: Span::combine(&expr_span, &adressee.span),
                        data: ast::Expr::FieldAccess(expr, adressee),
                    }
                }
            } else if self
                .omnomnoptional(exactly(Operator::LeftBracket))?
                .is_some()
            {
                // array access: EXPR[EXPR]
                let index_expr = self.parse_expression()?;
                let spanned = self.omnomnom(exactly(Operator::RightBracket))?;

                Spanned {
                    span: Span::combine(&expr_span, &spanned.span),
                    data: ast::Expr::ArrayAccess(expr, index_expr),
                }
            } else {
                break;
            };
            expr = self.alloc(node);
        }

        Ok(expr)
    }

    fn parse_primary_expression(&mut self) -> SyntaxResult<'f, ast::ExprId> {
        let expr = spanned!(self, {
            use self::ast::Expr::*;

            if let Some(adressee) = self.omnomnoptional(Identifier)? {
                if self.tastes_like(exactly(Operator::LeftParen)) {
                    // method call on `this`
                    let args = self.parse_argument_list()?;
                    Ok(ThisMethodInvocation(adressee, args))
                } else {
                    Ok(Var(adressee))
                }
            } else if self.omnomnoptional(exactly(Operator::LeftParen))?.is_some() {
                // parenthesized expression, no node of its own
                let expr = self.parse_expression()?;
                self.omnomnom(exactly(Operator::RightParen))?;
                return Ok(expr);
            } else if self.omnomnoptional(exactly(Keyword::New))?.is_some() {
                if self.nth_tastes_like(1, exactly(Operator::LeftParen)) {
                    let new_type = self.omnomnom(Identifier)?;

                    self.omnomnom(exactly(Operator::LeftParen))?;
                    self.omnomnom(exactly(Operator::RightParen))?;
                    Ok(NewObject(new_type))
                } else {
                    let new_type = self.parse_basic_type()?;
                    self.omnomnom(exactly(Operator::LeftBracket))?;
                    let first_index_expr = self.parse_expression()?;
                    self.omnomnom(exactly(Operator::RightBracket))?;

                    let mut array_depth = 0;
                    while self.tastes_like(exactly(Operator::LeftBracket))
                        && self.nth_tastes_like(1, exactly(Operator::RightBracket))
                    {
                        self.omnomnom(exactly(Operator::LeftBracket))?;
                        self.omnomnom(exactly(Operator::RightBracket))?;
                        array_depth += 1;
                    }

                    Ok(NewArray(new_type, first_index_expr, array_depth))
                }
            } else if self.omnomnoptional(exactly(Keyword::Null))?.is_some() {
                Ok(Null)
            } else if self.omnomnoptional(exactly(Keyword::False))?.is_some() {
                Ok(Boolean(false))
            } else if self.omnomnoptional(exactly(Keyword::True))?.is_some() {
                Ok(Boolean(true))
            } else if self.omnomnoptional(exactly(Keyword::This))?.is_some() {
                Ok(This)
            } else if self.omnomnoptional(exactly(Keyword::Super))?.is_some() {
                if !self.tastes_like(exactly(Operator::Dot)) {
                    return self.unexpected("`.` after 'super'");
                }
                Ok(Super)
            } else if let Some(lit) = self.omnomnoptional(IntegerLiteral)? {
                Ok(Int(lit))
            } else if let Some(c) = self.omnomnoptional(CharLiteral)? {
                Ok(Char(c.data))
            } else if let Some(s) = self.omnomnoptional(StringLiteral)? {
                Ok(Str(s.data))
            } else {
                self.unexpected("primary expression")
            }
        })?;
        Ok(self.alloc(expr))
    }

    fn parse_argument_list(&mut self) -> ParserResult<'f, ast::ArgumentList> {
        self.parse_parenthesized_list(|parser| parser.parse_expression())
    }

    fn parse_parenthesized_list<F, T>(&mut self, parse_element: F) -> ParserResult<'f, Vec<T>>
    where
        F: Fn(&mut Self) -> SyntaxResult<'f, T>,
    {
        spanned!(self, {
            let mut list = Vec::new();
            self.omnomnom(exactly(Operator::LeftParen))?;

            if !self.tastes_like(exactly(Operator::RightParen)) {
                list.push(parse_element(self)?);
                while self.omnomnoptional(exactly(Operator::Comma))?.is_some() {
                    list.push(parse_element(self)?);
                }
            }

            self.omnomnom(exactly(Operator::RightParen))?;

            Ok(list)
        })
    }
}

#[cfg(test)]
#[allow(clippy::string_lit_as_bytes)]
mod tests {
    use super::*;
    use asciifile::AsciiFile;
    use compiler_shared::context::Context;
    use lexer::Lexer;
    use strtab::StringTable;
    use utils::assert_matches;

    macro_rules! lex_input {
        ($itervar:ident = $input:expr) => {
            let mut strtab = StringTable::new();
            let input = AsciiFile::new($input.as_bytes()).unwrap();
            let ctx = Context::dummy(&input);
            let $itervar = Lexer::new(&mut strtab, &ctx)
                .map(|r| r.unwrap())
                .filter(|t| match t.data {
                    TokenKind::Whitespace | TokenKind::Comment(_) => false,
                    _ => true,
                });
        };
    }

    /// Render an expression tree in prefix notation, e.g. `(+ 3 (* 4 7))`.
    fn render(arena: &ast::ExprArena<'_>, id: ast::ExprId) -> String {
        use self::ast::Expr::*;
        match &arena[id].data {
            Binary(op, lhs, rhs) => {
                format!("({} {} {})", op, render(arena, *lhs), render(arena, *rhs))
            }
            Relational(op, lhs, rhs) => {
                format!("({} {} {})", op, render(arena, *lhs), render(arena, *rhs))
            }
            Assignment(lhs, rhs) => format!("(= {} {})", render(arena, *lhs), render(arena, *rhs)),
            Unary(op, expr) => format!("({} {})", op, render(arena, *expr)),
            Cast(ty, expr, _) => format!(
                "(cast {}{} {})",
                render_basic(&ty.basic.data),
                "[]".repeat(ty.array_depth as usize),
                render(arena, *expr)
            ),
            MethodInvocation(target, name, args) => format!(
                "(call {}.{}{})",
                render(arena, *target),
                name.data,
                args.iter()
                    .map(|arg| format!(" {}", render(arena, *arg)))
                    .collect::<String>()
            ),
            ThisMethodInvocation(name, args) => format!(
                "(call {}{})",
                name.data,
                args.iter()
                    .map(|arg| format!(" {}", render(arena, *arg)))
                    .collect::<String>()
            ),
            FieldAccess(target, name) => format!("{}.{}", render(arena, *target), name.data),
            ArrayAccess(target, index) => {
                format!("{}[{}]", render(arena, *target), render(arena, *index))
            }
            Null => "null".to_string(),
            Boolean(b) => b.to_string(),
            Int(lit) => lit.data.to_string(),
            NegInt(lit) => format!("-{}", lit.data),
            Char(c) => format!("{:?}", c),
            Str(s) => format!("{:?}", s),
            Var(name) => name.data.to_string(),
            This => "this".to_string(),
            Super => "super".to_string(),
            NewObject(name) => format!("(new {})", name.data),
            NewArray(basic, size, depth) => format!(
                "(new {}[{}]{})",
                render_basic(&basic.data),
                render(arena, *size),
                "[]".repeat(*depth as usize)
            ),
        }
    }

    fn render_basic(basic: &ast::BasicType<'_>) -> String {
        match basic {
            ast::BasicType::Custom(name) => name.to_string(),
            other => ast::BasicTypeDiscriminants::from(other)
                .to_string()
                .to_lowercase(),
        }
    }

    macro_rules! assert_expr {
        ($input:expr, $expected:expr) => {{
            lex_input!(lx = $input);
            let mut parser = Parser::new(lx);
            let expr = parser.parse_expression().unwrap();
            assert!(parser.tokens.at_end(), "trailing input in {:?}", $input);
            assert_eq!($expected, render(&parser.arena, expr));
        }};
    }

    #[test]
    fn hello_world() {
        lex_input!(
            lx = r#"
            class Foo {
                public static void main(String[] args) {
                    System.out.println(42);
                }
            }
        "#
        );
        assert_matches!(Parser::new(lx).parse(), Ok(_))
    }

    #[test]
    fn empty_input_is_an_empty_program() {
        lex_input!(lx = "  ");
        let program = Parser::new(lx).parse().unwrap();
        assert!(program.classes.is_empty());
        assert!(program.arena.is_empty());
    }

    #[test]
    fn missing_semicolon() {
        lex_input!(
            lx = r#"
            class Foo {
                public static void main(String[] args) {
                    System.out.println(42)
                }
            }
        "#
        );
        match Parser::new(lx).parse() {
            Err(WithSpan(err)) => {
                assert_eq!("expected `;`, found `}`", err.data.to_string());
                assert_eq!(5, err.span.start_position().line_number());
            }
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn unexpected_eof() {
        lex_input!(lx = "class Foo { int x;");
        assert_matches!(
            Parser::new(lx).parse(),
            Err(WithoutSpan(SyntaxError::UnexpectedEOF))
        );
    }

    #[test]
    fn invalid_basic_type() {
        lex_input!(
            lx = r#"
            class Foo {
                public static 42 foo() {}
            }
        "#
        );
        assert_matches!(Parser::new(lx).parse(), Err(_));
    }

    #[test]
    fn invalid_statement() {
        lex_input!(
            lx = r#"
            class Foo {
                public static void main(String[] args) {
                    []42;
                }
            }
        "#
        );
        assert_matches!(Parser::new(lx).parse(), Err(_));
    }

    #[test]
    fn invalid_expression() {
        lex_input!(
            lx = r#"
            class Foo {
                public int foo() {
                    return + 42;
                }
            }
        "#
        );
        assert_matches!(Parser::new(lx).parse(), Err(_));
    }

    #[test]
    fn local_var_decl_not_allowed_as_if_body() {
        lex_input!(lx = "if (x) int y = 5;");
        assert_matches!(Parser::new(lx).parse_statement(), Err(_));
    }

    #[test]
    fn else_with_empty_statement() {
        lex_input!(lx = r#"if(angry) {} else;"#);
        let mut p = Parser::new(lx);
        let stmt = p.parse_statement().unwrap();
        match stmt.data {
            ast::Stmt::If(_, _, Some(else_arm)) => assert_eq!(ast::Stmt::Empty, else_arm.data),
            other => panic!("not an if with else: {:?}", other),
        }
    }

    #[test]
    fn do_while_statement() {
        lex_input!(lx = r#"do { i = i + 1; } while (i < 10);"#);
        let mut p = Parser::new(lx);
        let stmt = p.parse_statement().unwrap();
        match stmt.data {
            ast::Stmt::DoWhile(body, cond) => {
                assert_matches!(body.data, ast::Stmt::Block(_));
                assert_eq!("(< i 10)", render(&p.arena, cond));
            }
            other => panic!("not a do-while: {:?}", other),
        }
    }

    #[test]
    fn local_variable_declarations() {
        lex_input!(lx = r#"{ long[][] a; char c = 'x'; Foo f; x[1] = 2; }"#);
        let mut p = Parser::new(lx);
        let block = p.parse_block().unwrap();
        let kinds = block
            .statements
            .iter()
            .map(|stmt| ast::StmtDiscriminants::from(&stmt.data).to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            vec![
                "LocalVariableDeclaration",
                "LocalVariableDeclaration",
                "LocalVariableDeclaration",
                "Expression"
            ],
            kinds
        );
        match &block.statements[0].data {
            ast::Stmt::LocalVariableDeclaration(ty, name, None) => {
                assert_eq!(ast::BasicType::Long, ty.basic.data);
                assert_eq!(2, ty.array_depth);
                assert_eq!("a", name.data.as_str());
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn class_declaration_span() {
        lex_input!(
            lx = r#"
            class Foo {
                public int x;
            }
        "#
        );
        let program = Parser::new(lx).parse().unwrap();
        let class = &program.classes[0];
        let start = class.span.start_position();
        let end = class.span.end_position();

        assert_eq!(start.line_number(), 2);
        assert_eq!(start.column(), 12);
        assert_eq!(end.line_number(), 4);
        assert_eq!(end.column(), 12);
        assert!(class.span.as_str().starts_with("class Foo {"));
        assert!(class.span.as_str().ends_with('}'));
    }

    #[test]
    fn interfaces_and_inheritance() {
        lex_input!(
            lx = r#"
            interface Shape extends Named, Sized {
                int area();
            }
            abstract class Base implements Shape {
                public abstract int area();
                protected static long counter;
            }
            class Square extends Base implements Shape, Named {
                private int side;
                public int area() { return side * side; }
            }
        "#
        );
        let program = Parser::new(lx).parse().unwrap();
        fn names(list: &[Spanned<'_, Symbol<'_>>]) -> Vec<String> {
            list.iter().map(|name| name.data.to_string()).collect()
        }

        let shape = &program.classes[0].data;
        assert_eq!(ast::ClassKind::Interface, shape.kind);
        assert!(shape.parent.is_none());
        assert_eq!(vec!["Named", "Sized"], names(&shape.interfaces));
        match &shape.members[0].data.kind {
            ast::ClassMemberKind::Method(_, params, None) => assert!(params.is_empty()),
            other => panic!("expected a method without body, got {:?}", other),
        }

        let base = &program.classes[1].data;
        assert_eq!(ast::ClassKind::Class, base.kind);
        assert!(base.is_abstract);
        let area = &base.members[0].data;
        assert!(area.modifiers.is_abstract);
        assert_eq!(ast::Visibility::Public, area.modifiers.visibility);
        let counter = &base.members[1].data;
        assert!(counter.modifiers.is_static);
        assert_eq!(ast::Visibility::Protected, counter.modifiers.visibility);
        assert_matches!(&counter.kind, ast::ClassMemberKind::Field(_));

        let square = &program.classes[2].data;
        assert!(!square.is_abstract);
        assert_eq!("Base", square.parent.as_ref().unwrap().data.as_str());
        assert_eq!(vec!["Shape", "Named"], names(&square.interfaces));
        assert_eq!(
            ast::Visibility::Package,
            ast::Modifiers::default().visibility
        );
    }

    #[test]
    fn interface_cannot_have_parent_class() {
        lex_input!(lx = "interface A implements B {}");
        assert_matches!(Parser::new(lx).parse(), Err(_));
    }

    mod expr {
        use super::*;

        #[test]
        fn precedence() {
            assert_expr!("3 + 4 * 7 + 9 / 7 * 42", "(+ (+ 3 (* 4 7)) (* (/ 9 7) 42))");
            assert_expr!("a || b && c == d", "(|| a (&& b (== c d)))");
            assert_expr!("a < b == c >= d", "(== (< a b) (>= c d))");
            assert_expr!("a | b ^ c & d", "(| a (^ b (& c d)))");
            assert_expr!("a & b == c", "(& a (== b c))");
            assert_expr!("a - b - c", "(- (- a b) c)");
        }

        #[test]
        fn assignment_is_right_associative() {
            assert_expr!("a = b = c || d", "(= a (= b (|| c d)))");
        }

        #[test]
        fn unary_operators() {
            assert_expr!("!-x", "(! (- x))");
            assert_expr!("-x * y", "(* (- x) y)");
            assert_expr!("!!b", "(! (! b))");
        }

        #[test]
        fn negative_literals_are_folded() {
            assert_expr!("-2147483648", "-2147483648");
            assert_expr!("- 5 + 3", "(+ -5 3)");
            assert_expr!("--5", "(- -5)");
            assert_expr!("-(5)", "(- 5)");
        }

        #[test]
        fn postfix_expressions() {
            assert_expr!(
                "System.out.println(a[1][2], this.foo())",
                "(call System.out.println a[1][2] (call this.foo))"
            );
            assert_expr!("bar(1).baz", "(call bar 1).baz");
            assert_expr!("super.run(x)", "(call super.run x)");
            assert_expr!("super.count", "super.count");
        }

        #[test]
        fn super_needs_member_access() {
            lex_input!(lx = "super + 1");
            assert_matches!(Parser::new(lx).parse_expression(), Err(_));
        }

        #[test]
        fn literals_and_allocations() {
            assert_expr!("'a' < 98", "(< 'a' 98)");
            assert_expr!("\"hi\" + null", "(+ \"hi\" null)");
            assert_expr!("new Foo()", "(new Foo)");
            assert_expr!("new int[n + 1][][]", "(new int[(+ n 1)][][])");
            assert_expr!("new char[3]", "(new char[3])");
            assert_expr!("true != false", "(!= true false)");
        }

        #[test]
        fn casts() {
            assert_expr!("(long) x + 1", "(+ (cast long x) 1)");
            assert_expr!("(char) (c + 1)", "(cast char (+ c 1))");
            assert_expr!("(Foo) bar", "(cast Foo bar)");
            assert_expr!("(Foo) this.bar()", "(cast Foo (call this.bar))");
            assert_expr!("(int) -x", "(cast int (- x))");
            assert_expr!("-(int) x", "(- (cast int x))");
        }

        #[test]
        fn parenthesized_identifiers_are_not_casts() {
            assert_expr!("(a) - b", "(- a b)");
            assert_expr!("(a) + b", "(+ a b)");
            assert_expr!("(a)", "a");
            assert_expr!("(a).b", "a.b");
        }

        #[test]
        fn expression_spans() {
            lex_input!(lx = "foo(1, 2) + -3");
            let mut parser = Parser::new(lx);
            let expr = parser.parse_expression().unwrap();
            assert_eq!("foo(1, 2) + -3", parser.arena.span(expr).as_str());
            match parser.arena[expr].data {
                ast::Expr::Binary(ast::BinaryOp::Add, lhs, rhs) => {
                    assert_eq!("foo(1, 2)", parser.arena.span(lhs).as_str());
                    assert_eq!("-3", parser.arena.span(rhs).as_str());
                }
                ref other => panic!("not an addition: {:?}", other),
            }
        }
    }
}
