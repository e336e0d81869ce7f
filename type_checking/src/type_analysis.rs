use crate::type_system::*;
use parser::ast::ExprId;
use std::rc::Rc;
use strtab::Symbol;

#[derive(Debug, Clone, PartialEq)]
pub struct ExprInfo<'src> {
    pub ty: CheckedType<'src>,
    pub ref_info: Option<RefInfo<'src>>,
}

impl<'src> ExprInfo<'src> {
    pub fn new(ty: CheckedType<'src>, ref_info: RefInfo<'src>) -> Self {
        ExprInfo {
            ty,
            ref_info: Some(ref_info),
        }
    }
}

impl<'src> From<CheckedType<'src>> for ExprInfo<'src> {
    fn from(item: CheckedType<'src>) -> ExprInfo<'src> {
        ExprInfo {
            ty: item,
            ref_info: None,
        }
    }
}

/// What an expression refers to, if it names something.
#[derive(Debug, Clone)]
pub enum RefInfo<'src> {
    GlobalVar(Symbol<'src>),
    Var(Symbol<'src>),
    Param(Rc<MethodParamDef<'src>>),
    Field(Rc<ClassFieldDef<'src>>),
    Method(Rc<ClassMethodDef<'src>>),
    This(ClassDefId<'src>),
    /// `super` as a receiver, resolved to the parent class
    Super(ClassDefId<'src>),
    ArrayAccess,
}

impl<'src> PartialEq for RefInfo<'src> {
    fn eq(&self, other: &RefInfo<'src>) -> bool {
        use self::RefInfo::*;
        match (self, other) {
            (GlobalVar(a), GlobalVar(b)) | (Var(a), Var(b)) => a == b,
            (Param(a), Param(b)) => Rc::ptr_eq(a, b),
            (Field(a), Field(b)) => Rc::ptr_eq(a, b),
            (Method(a), Method(b)) => Rc::ptr_eq(a, b),
            (This(a), This(b)) | (Super(a), Super(b)) => a == b,
            (ArrayAccess, ArrayAccess) => true,
            _ => false,
        }
    }
}

/// Per-expression results of type checking, indexed by `ExprId`.
#[derive(Debug, Default)]
pub struct TypeAnalysis<'src> {
    expr_info: Vec<Option<ExprInfo<'src>>>,
}

impl<'src> TypeAnalysis<'src> {
    pub fn new() -> TypeAnalysis<'src> {
        TypeAnalysis::default()
    }

    pub fn expr_info(&self, expr: ExprId) -> &ExprInfo<'src> {
        self.get(expr)
            .expect("after typechecking every expression should have a type")
    }

    pub fn get(&self, expr: ExprId) -> Option<&ExprInfo<'src>> {
        self.expr_info.get(expr.index()).and_then(Option::as_ref)
    }

    pub fn ty(&self, expr: ExprId) -> &CheckedType<'src> {
        &self.expr_info(expr).ty
    }

    pub fn set_expr_info(&mut self, expr: ExprId, expr_info: ExprInfo<'src>) {
        if self.expr_info.len() <= expr.index() {
            self.expr_info.resize(expr.index() + 1, None);
        }
        self.expr_info[expr.index()] = Some(expr_info);
    }

    /// Bookkeeping for `ExprArena::wrap_in_cast`: the info of `slot` moves
    /// to `moved` and `slot` becomes a cast of type `target`.
    pub fn record_widening(&mut self, slot: ExprId, moved: ExprId, target: CheckedType<'src>) {
        if let Some(old) = self.get(slot).cloned() {
            self.set_expr_info(moved, old);
        }
        self.set_expr_info(slot, target.into());
    }
}
