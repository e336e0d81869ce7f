//! The MiniJava syntax tree.
//!
//! Declarations and statements own their children. Expressions live in an
//! `ExprArena` and refer to their operands by `ExprId`, which lets the type
//! checker wrap an operand in an implicit cast without touching the parent.
use asciifile::{Span, Spanned};
use failure::Fail;
use lexer::IntLit;
use std::ops::Index;
use strtab::Symbol;
use strum_macros::{Display, EnumDiscriminants, EnumIter};

/// This is the top-level AST node. It stores all class declarations of the
/// MiniJava program and the arena holding every expression.
#[derive(Debug, Default)]
pub struct Program<'f> {
    pub classes: Vec<Spanned<'f, ClassDeclaration<'f>>>,
    pub arena: ExprArena<'f>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Display)]
pub enum ClassKind {
    #[strum(serialize = "class")]
    Class,
    #[strum(serialize = "interface")]
    Interface,
}

/// A class or interface declaration.
///
/// For classes `interfaces` lists the implemented interfaces, for
/// interfaces it lists the extended ones. Interfaces never have a `parent`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ClassDeclaration<'f> {
    pub kind: ClassKind,
    pub is_abstract: bool,
    pub name: Spanned<'f, Symbol<'f>>,
    pub parent: Option<Spanned<'f, Symbol<'f>>>,
    pub interfaces: Vec<Spanned<'f, Symbol<'f>>>,
    pub members: Vec<Spanned<'f, ClassMember<'f>>>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Display)]
pub enum Visibility {
    #[strum(serialize = "")]
    Package,
    #[strum(serialize = "public")]
    Public,
    #[strum(serialize = "protected")]
    Protected,
    #[strum(serialize = "private")]
    Private,
}

/// Visibility is recorded but not enforced.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Modifiers {
            visibility: Visibility::Package,
            is_static: false,
            is_abstract: false,
        }
    }
}

/// This AST node describes a class member. Every class member has a name.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ClassMember<'f> {
    pub kind: ClassMemberKind<'f>,
    pub name: Symbol<'f>,
    pub modifiers: Modifiers,
}

pub type ParameterList<'f> = Vec<Spanned<'f, Parameter<'f>>>;

/// A class member is either one of
/// * `Field(type)`: a declaration of a field of a class
/// * `Method(type, params, body)`: a method of a class or interface. The
///   body is missing for interface methods and abstract methods.
#[derive(EnumDiscriminants, Debug, PartialEq, Eq, Clone)]
#[strum_discriminants(derive(Display, Hash, PartialOrd, Ord))]
pub enum ClassMemberKind<'f> {
    Field(Spanned<'f, Type<'f>>),
    Method(
        Spanned<'f, Type<'f>>,
        Spanned<'f, ParameterList<'f>>,
        Option<Spanned<'f, Block<'f>>>,
    ),
}

impl<'f> ClassMemberKind<'f> {
    pub fn is_method(&self) -> bool {
        match self {
            ClassMemberKind::Method(..) => true,
            ClassMemberKind::Field(_) => false,
        }
    }
}

/// This AST node represents a method parameter.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Parameter<'f> {
    pub ty: Spanned<'f, Type<'f>>,
    pub name: Symbol<'f>,
}

/// A `BasicType`, optionally as an n-dimensional array.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Type<'f> {
    pub basic: Spanned<'f, BasicType<'f>>,
    /// Number of `[]` behind the basic type
    pub array_depth: u64,
}

impl<'f> Type<'f> {
    /// A scalar type located at `span`.
    pub fn scalar(basic: BasicType<'f>, span: Span<'f>) -> Self {
        Type {
            basic: Spanned::new(span, basic),
            array_depth: 0,
        }
    }
}

#[derive(EnumDiscriminants, Debug, PartialEq, Eq, Clone, Copy)]
#[strum_discriminants(derive(Display))]
pub enum BasicType<'f> {
    Int,
    Long,
    Char,
    Boolean,
    Void,
    Custom(Symbol<'f>),
}

/// A `Block` in the AST is basically just a vector of statements.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Block<'f> {
    pub statements: Vec<Spanned<'f, Stmt<'f>>>,
}

#[derive(EnumDiscriminants, Debug, PartialEq, Eq, Clone)]
#[strum_discriminants(derive(Display))]
pub enum Stmt<'f> {
    Block(Spanned<'f, Block<'f>>),
    Empty,
    If(ExprId, Box<Spanned<'f, Stmt<'f>>>, Option<Box<Spanned<'f, Stmt<'f>>>>),
    While(ExprId, Box<Spanned<'f, Stmt<'f>>>),
    DoWhile(Box<Spanned<'f, Stmt<'f>>>, ExprId),
    Expression(ExprId),
    Return(Option<ExprId>),
    LocalVariableDeclaration(
        Spanned<'f, Type<'f>>,
        Spanned<'f, Symbol<'f>>,
        Option<ExprId>,
    ),
}

/// Handle of an expression node inside an `ExprArena`.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

pub type ArgumentList = Vec<ExprId>;

/// Casts written in the source are `Explicit`, the ones inserted by the
/// type checker to widen an operand are `Implicit`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Display)]
pub enum CastKind {
    #[strum(serialize = "explicit")]
    Explicit,
    #[strum(serialize = "implicit")]
    Implicit,
}

/// Parenthesized expressions do not have their own node.
/// `System.out.println(x)` is a method invocation on a field access on
/// the variable `System`, resolved by the type checker.
#[derive(EnumDiscriminants, Debug, PartialEq, Eq, Clone)]
#[strum_discriminants(derive(Display))]
pub enum Expr<'f> {
    Binary(BinaryOp, ExprId, ExprId),
    Relational(RelOp, ExprId, ExprId),
    Unary(UnaryOp, ExprId),
    Assignment(ExprId, ExprId),
    Cast(Spanned<'f, Type<'f>>, ExprId, CastKind),

    // Postfix ops
    MethodInvocation(ExprId, Spanned<'f, Symbol<'f>>, Spanned<'f, ArgumentList>),
    FieldAccess(ExprId, Spanned<'f, Symbol<'f>>),
    ArrayAccess(ExprId, ExprId),

    // The primary expressions
    Null,
    Boolean(bool),
    Int(Spanned<'f, IntLit<'f>>),
    /// A minus sign directly applied to an integer literal. Kept as one
    /// node so that the smallest int can be written down.
    NegInt(Spanned<'f, IntLit<'f>>),
    Char(char),
    Str(String),
    Var(Spanned<'f, Symbol<'f>>),
    ThisMethodInvocation(Spanned<'f, Symbol<'f>>, Spanned<'f, ArgumentList>),
    This,
    /// Only appears as the receiver of a field access or method invocation.
    Super,
    NewObject(Spanned<'f, Symbol<'f>>),
    NewArray(Spanned<'f, BasicType<'f>>, ExprId, u64),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Display, EnumIter)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,

    #[strum(serialize = "&&")]
    LogicalAnd,
    #[strum(serialize = "||")]
    LogicalOr,

    #[strum(serialize = "&")]
    BitAnd,
    #[strum(serialize = "|")]
    BitOr,
    #[strum(serialize = "^")]
    BitXor,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOpFamily {
    /// `+ - * / %`: numeric operands
    Arithmetic,
    /// `&& ||`: boolean operands, short circuit
    Logical,
    /// `& | ^`: integer operands, or boolean without short circuit
    Bitwise,
}

impl BinaryOp {
    pub fn family(self) -> BinaryOpFamily {
        use self::BinaryOp::*;
        match self {
            Add | Sub | Mul | Div | Mod => BinaryOpFamily::Arithmetic,
            LogicalAnd | LogicalOr => BinaryOpFamily::Logical,
            BitAnd | BitOr | BitXor => BinaryOpFamily::Bitwise,
        }
    }
}

/// One of the unary operations `!` and `-`
#[derive(Debug, PartialEq, Eq, Clone, Copy, Display)]
pub enum UnaryOp {
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "-")]
    Neg,
}

/// The relational operators. Everything that differs between them is in
/// `RELATIONAL_OPERATORS`, the type checker, the interpreter and the code
/// generator treat them uniformly.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display, EnumIter)]
pub enum RelOp {
    #[strum(serialize = "==")]
    Equals,
    #[strum(serialize = "!=")]
    NotEquals,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = "<=")]
    LessEquals,
    #[strum(serialize = ">=")]
    GreaterEquals,
}

/// Integer comparison predicates of the low level IR, all signed.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sgt,
    Sle,
    Sge,
}

/// Comparison operators understood by runtime values.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display, EnumIter)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    /// Whether the operator only makes sense for ordered (numeric) values.
    pub fn is_ordering(self) -> bool {
        match self {
            CompareOp::Eq | CompareOp::Ne => false,
            CompareOp::Lt | CompareOp::Gt | CompareOp::Le | CompareOp::Ge => true,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct RelOpInfo {
    pub op: RelOp,
    pub predicate: IntPredicate,
    pub compare: CompareOp,
}

#[rustfmt::skip]
pub const RELATIONAL_OPERATORS: &[RelOpInfo] = &[
    RelOpInfo { op: RelOp::Equals,        predicate: IntPredicate::Eq,  compare: CompareOp::Eq },
    RelOpInfo { op: RelOp::NotEquals,     predicate: IntPredicate::Ne,  compare: CompareOp::Ne },
    RelOpInfo { op: RelOp::LessThan,      predicate: IntPredicate::Slt, compare: CompareOp::Lt },
    RelOpInfo { op: RelOp::GreaterThan,   predicate: IntPredicate::Sgt, compare: CompareOp::Gt },
    RelOpInfo { op: RelOp::LessEquals,    predicate: IntPredicate::Sle, compare: CompareOp::Le },
    RelOpInfo { op: RelOp::GreaterEquals, predicate: IntPredicate::Sge, compare: CompareOp::Ge },
];

impl RelOp {
    /// The table rows are in declaration order of `RelOp`.
    pub fn info(self) -> &'static RelOpInfo {
        &RELATIONAL_OPERATORS[self as usize]
    }

    pub fn predicate(self) -> IntPredicate {
        self.info().predicate
    }

    pub fn compare_op(self) -> CompareOp {
        self.info().compare
    }

    /// `<`, `>`, `<=` and `>=` require numeric operands
    pub fn is_ordering(self) -> bool {
        self.compare_op().is_ordering()
    }
}

#[derive(Debug, Fail, PartialEq, Eq, Clone)]
pub enum IntLiteralError {
    #[fail(display = "integer literal {} is out of range", _0)]
    OutOfRange(String),
}

/// Compute the value of an integer literal, negated if `negated` is set.
///
/// The digits are evaluated in 64 bit, so `2147483648` is only valid as
/// the operand of a minus sign.
pub fn parse_int_literal(lit: &str, negated: bool) -> Result<i32, IntLiteralError> {
    let out_of_range = || {
        IntLiteralError::OutOfRange(if negated {
            format!("-{}", lit)
        } else {
            lit.to_string()
        })
    };
    let magnitude = lit.parse::<i64>().map_err(|_| out_of_range())?;
    let value = if negated { -magnitude } else { magnitude };
    if value < i64::from(std::i32::MIN) || value > i64::from(std::i32::MAX) {
        return Err(out_of_range());
    }
    Ok(value as i32)
}

/// Owner of every expression node of a program.
#[derive(Debug, Default, Clone)]
pub struct ExprArena<'f> {
    nodes: Vec<Spanned<'f, Expr<'f>>>,
}

impl<'f> ExprArena<'f> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, expr: Spanned<'f, Expr<'f>>) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr);
        id
    }

    pub fn get(&self, id: ExprId) -> &Spanned<'f, Expr<'f>> {
        &self.nodes[id.index()]
    }

    pub fn span(&self, id: ExprId) -> Span<'f> {
        self.get(id).span
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ExprId, &Spanned<'f, Expr<'f>>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (ExprId(index as u32), node))
    }

    /// Replace the node `id` by an implicit cast to `target` that wraps the
    /// old node. Every reference to `id` now refers to the cast. Returns the
    /// new handle of the wrapped node.
    pub fn wrap_in_cast(&mut self, id: ExprId, target: BasicType<'f>) -> ExprId {
        let span = self.span(id);
        let cast_placeholder = Spanned::new(span, Expr::Null);
        let old = std::mem::replace(&mut self.nodes[id.index()], cast_placeholder);
        let moved = self.alloc(old);
        self.nodes[id.index()].data = Expr::Cast(
            Spanned::new(span, Type::scalar(target, span)),
            moved,
            CastKind::Implicit,
        );
        moved
    }
}

impl<'f> Index<ExprId> for ExprArena<'f> {
    type Output = Spanned<'f, Expr<'f>>;

    fn index(&self, id: ExprId) -> &Self::Output {
        self.get(id)
    }
}
