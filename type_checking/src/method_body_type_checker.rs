use crate::{
    checker::*,
    semantics::{SemanticError, Unrecoverable},
    type_analysis::*,
    type_system::*,
};
use asciifile::{Span, Spanned};
use parser::ast::{self, ExprArena, ExprId};
use std::rc::Rc;
use strtab::{closest_relative, Symbol};
use symtab::Scoped;

#[derive(Clone)]
pub enum VarDef<'src> {
    Local { ty: CheckedType<'src> },
    Param(Rc<MethodParamDef<'src>>),
}

type TypeResult<'src> = Result<ExprInfo<'src>, Unrecoverable<'src>>;

pub struct MethodBodyTypeChecker<'ctx, 'src, 'ts, 'ana> {
    context: &'ctx SemanticContext<'ctx, 'src>,
    type_system: &'ts TypeSystem<'src>,
    type_analysis: &'ana mut TypeAnalysis<'src>,
    arena: &'ana mut ExprArena<'src>,
    current_class_id: ClassDefId<'src>,
    current_method: Rc<ClassMethodDef<'src>>,
    local_scope: Scoped<Symbol<'src>, VarDef<'src>>,
}

fn unrecoverable(span: Span<'_>, error: SemanticError) -> Unrecoverable<'_> {
    Unrecoverable::new(Spanned::new(span, error))
}

impl<'ctx, 'src, 'ts, 'ana> MethodBodyTypeChecker<'ctx, 'src, 'ts, 'ana> {
    pub fn check_methods(
        class_decl: &ast::ClassDeclaration<'src>,
        current_class_id: ClassDefId<'src>,
        type_system: &'ts TypeSystem<'src>,
        type_analysis: &'ana mut TypeAnalysis<'src>,
        arena: &'ana mut ExprArena<'src>,
        context: &'ctx SemanticContext<'ctx, 'src>,
    ) {
        let current_class = type_system.class(current_class_id);

        for member in &class_decl.members {
            let body = match &member.kind {
                ast::ClassMemberKind::Method(_, _, Some(body)) => body,
                _ => continue,
            };
            let current_method = current_class
                .method(member.name)
                .expect("a class only has a member if it exists");
            log::debug!("checking {}.{}", current_class_id, member.name);

            let mut checker = MethodBodyTypeChecker {
                context,
                type_system,
                type_analysis: &mut *type_analysis,
                arena: &mut *arena,
                current_class_id,
                current_method: Rc::clone(&current_method),
                local_scope: Scoped::new(),
            };

            for param in &current_method.params {
                checker
                    .local_scope
                    .define(param.name, VarDef::Param(Rc::clone(param)))
                    .expect("no double params allowed");
            }

            checker.check_type_block(&body.data);

            let needs_return = match current_method.return_ty {
                CheckedType::Void | CheckedType::Error => false,
                _ => true,
            };
            if needs_return && !checker.block_returns(&body.data) {
                context.report_error(
                    member.span,
                    SemanticError::MightNotReturn {
                        method_name: member.name.to_string(),
                    },
                );
            }
        }
    }

    fn check_type_block(&mut self, block: &ast::Block<'src>) {
        self.local_scope.enter_scope();
        for stmt in &block.statements {
            self.check_type_stmt(stmt);
        }
        self.local_scope
            .leave_scope()
            .expect("scope of a block is not root scope");
    }

    fn check_type_stmt(&mut self, stmt: &Spanned<'src, ast::Stmt<'src>>) {
        use self::ast::Stmt::*;
        match &stmt.data {
            Block(block) => self.check_type_block(&block.data),
            Empty => {}
            If(cond, then_stmt, opt_else) => {
                self.check_condition(*cond);
                self.check_type_stmt(then_stmt);
                if let Some(els) = opt_else {
                    self.check_type_stmt(els);
                }
            }
            While(cond, body) => {
                self.check_condition(*cond);
                self.check_type_stmt(body);
            }
            DoWhile(body, cond) => {
                self.check_type_stmt(body);
                self.check_condition(*cond);
            }
            Expression(expr) => {
                self.type_operand(*expr);
            }
            Return(expr_opt) => {
                let return_ty = self.current_method.return_ty.clone();

                match (expr_opt, &return_ty) {
                    (None, CheckedType::Void) | (None, CheckedType::Error) => {}
                    (None, _) => {
                        self.context.report_error(
                            stmt.span,
                            SemanticError::MethodMustReturnSomething {
                                ty: return_ty.to_string(),
                            },
                        );
                    }
                    (Some(expr), CheckedType::Void) => {
                        self.type_operand(*expr);
                        self.context
                            .report_error(stmt.span, SemanticError::VoidMethodCannotReturnValue);
                    }
                    (Some(expr), _) => self.check_type(*expr, &return_ty),
                }
            }
            LocalVariableDeclaration(ty, name, opt_assign) => {
                let def_ty = checked_type_from_ty(
                    &ty.data,
                    self.context,
                    self.type_system,
                    VoidIs::Forbidden,
                );
                self.local_scope
                    .define(name.data, VarDef::Local { ty: def_ty.clone() })
                    .unwrap_or_else(|_| {
                        self.context.report_error(
                            name.span,
                            SemanticError::RedefinitionError {
                                kind: "local var".to_string(),
                                name: name.data.to_string(),
                            },
                        )
                    });

                if let Some(assign) = opt_assign {
                    self.check_type(*assign, &def_ty);
                }
            }
        }
    }

    fn check_condition(&mut self, cond: ExprId) {
        let ty = self.type_operand(cond);
        if !CheckedType::Boolean.is_super_of(&ty, self.type_system) {
            self.context.report_error(
                self.arena.span(cond),
                SemanticError::ConditionMustBeBoolean { ty: ty.to_string() },
            );
        }
    }

    /// Whether every path through `stmt` ends in a `return`. Loops only
    /// count if their condition is the literal `true`.
    fn stmt_returns(&self, stmt: &ast::Stmt<'src>) -> bool {
        use self::ast::Stmt::*;
        match stmt {
            Return(_) => true,
            Block(block) => self.block_returns(&block.data),
            If(_, then_stmt, Some(els)) => self.stmt_returns(then_stmt) && self.stmt_returns(els),
            While(cond, _) => self.is_true_literal(*cond),
            DoWhile(body, cond) => self.stmt_returns(body) || self.is_true_literal(*cond),
            _ => false,
        }
    }

    fn block_returns(&self, block: &ast::Block<'src>) -> bool {
        block
            .statements
            .iter()
            .any(|stmt| self.stmt_returns(stmt))
    }

    fn is_true_literal(&self, expr: ExprId) -> bool {
        self.arena[expr].data == ast::Expr::Boolean(true)
    }

    /// Type `expr` and record the result. On success the result is stored
    /// for `expr`, errors are left to the caller.
    fn type_expr(&mut self, expr: ExprId) -> TypeResult<'src> {
        let info = self.type_expr_internal(expr)?;
        log::trace!("{} has type {}", self.arena.span(expr).as_str(), info.ty);
        self.type_analysis.set_expr_info(expr, info.clone());
        Ok(info)
    }

    /// Like `type_expr`, but an unrecoverable error is reported here and
    /// `expr` gets the error type.
    fn type_or_report(&mut self, expr: ExprId) -> Option<ExprInfo<'src>> {
        match self.type_expr(expr) {
            Ok(info) => Some(info),
            Err(unrecoverable) => {
                self.context.report(unrecoverable);
                self.type_analysis
                    .set_expr_info(expr, CheckedType::Error.into());
                None
            }
        }
    }

    fn type_operand(&mut self, expr: ExprId) -> CheckedType<'src> {
        self.type_or_report(expr)
            .map_or(CheckedType::Error, |info| info.ty)
    }

    /// `expr` has to be usable where `expected_ty` is expected. Numeric
    /// values are widened with an implicit cast.
    fn check_type(&mut self, expr: ExprId, expected_ty: &CheckedType<'src>) {
        let ty = self.type_operand(expr);
        if !expected_ty.is_super_of(&ty, self.type_system) {
            self.context.report_error(
                self.arena.span(expr),
                SemanticError::InvalidType {
                    ty_expected: expected_ty.to_string(),
                    ty_expr: ty.to_string(),
                },
            );
        } else {
            self.coerce(expr, &ty, expected_ty);
        }
    }

    /// Widen `expr` of numeric type `ty` to `target` unless it already is.
    fn coerce(&mut self, expr: ExprId, ty: &CheckedType<'src>, target: &CheckedType<'src>) {
        if ty != target && ty.is_numeric() && target.is_numeric() {
            self.widen(expr, target.clone());
        }
    }

    fn widen(&mut self, expr: ExprId, target: CheckedType<'src>) {
        let basic_ty = target
            .numeric_basic_type()
            .expect("only numeric values are widened");
        log::debug!(
            "implicit cast of {} to {}",
            self.arena.span(expr).as_str(),
            target
        );
        let moved = self.arena.wrap_in_cast(expr, basic_ty);
        self.type_analysis.record_widening(expr, moved, target);
    }

    fn type_expr_internal(&mut self, expr_id: ExprId) -> TypeResult<'src> {
        use self::ast::Expr::*;
        let expr = self.arena[expr_id].clone();
        let span = expr.span;

        match expr.data {
            Binary(op, lhs, rhs) => match op.family() {
                ast::BinaryOpFamily::Logical => {
                    self.check_type(lhs, &CheckedType::Boolean);
                    self.check_type(rhs, &CheckedType::Boolean);
                    Ok(CheckedType::Boolean.into())
                }
                ast::BinaryOpFamily::Arithmetic | ast::BinaryOpFamily::Bitwise => {
                    Ok(self.check_arithmetic_expr(span, op, lhs, rhs).into())
                }
            },
            Relational(op, lhs, rhs) => {
                self.check_relational_expr(span, op, lhs, rhs);
                Ok(CheckedType::Boolean.into())
            }
            Unary(ast::UnaryOp::Not, operand) => {
                self.check_type(operand, &CheckedType::Boolean);
                Ok(CheckedType::Boolean.into())
            }
            Unary(ast::UnaryOp::Neg, operand) => {
                let ty = self.type_operand(operand);
                if ty.is_error() {
                    return Ok(CheckedType::Error.into());
                }
                if !ty.is_numeric() {
                    self.context.report_error(
                        span,
                        SemanticError::InvalidOperandType {
                            op: ast::UnaryOp::Neg.to_string(),
                            ty: ty.to_string(),
                        },
                    );
                    return Ok(CheckedType::Error.into());
                }
                let promoted = promote(ty.clone());
                self.coerce(operand, &ty, &promoted);
                Ok(promoted.into())
            }
            Assignment(lhs, rhs) => Ok(self.check_assignment(lhs, rhs).into()),
            Cast(ty, operand, _) => {
                let target =
                    checked_type_from_ty(&ty.data, self.context, self.type_system, VoidIs::Forbidden);
                let operand_ty = self.type_operand(operand);
                if !self.is_castable(&operand_ty, &target) {
                    self.context.report_error(
                        span,
                        SemanticError::InvalidCast {
                            from: operand_ty.to_string(),
                            to: target.to_string(),
                        },
                    );
                }
                Ok(target.into())
            }
            FieldAccess(target_expr, name) => {
                let target_type = self.type_expr(target_expr)?.ty;
                let field = match &target_type {
                    CheckedType::Error => return Ok(CheckedType::Error.into()),
                    CheckedType::TypeRef(class_id) => {
                        self.type_system.lookup_field(*class_id, name.data)
                    }
                    _ => None,
                };
                match field {
                    Some(field) => Ok(ExprInfo::new(field.ty.clone(), RefInfo::Field(field))),
                    None => Err(unrecoverable(
                        name.span,
                        SemanticError::FieldDoesNotExistOnType {
                            field_name: name.data.to_string(),
                            ty: target_type.to_string(),
                        },
                    )),
                }
            }
            MethodInvocation(target_expr, name, args) => {
                // e.g. "target_expr.name(arg1, arg2)"
                let target_type = self.type_expr(target_expr)?.ty;
                match target_type {
                    CheckedType::TypeRef(class_id) => {
                        self.check_method_invocation(&name, class_id, &args.data, true)
                    }
                    CheckedType::Error => {
                        self.type_args(&args.data);
                        Ok(CheckedType::Error.into())
                    }
                    _ => {
                        self.type_args(&args.data);
                        Err(unrecoverable(
                            name.span,
                            SemanticError::MethodDoesNotExistOnType {
                                method_name: name.data.to_string(),
                                ty: target_type.to_string(),
                            },
                        ))
                    }
                }
            }
            ThisMethodInvocation(name, args) => {
                // e.g. "name(arg1, arg2);"
                self.check_method_invocation(&name, self.current_class_id, &args.data, false)
            }
            ArrayAccess(target_expr, idx_expr) => {
                self.check_type(idx_expr, &CheckedType::Int);
                let target_type = self.type_expr(target_expr)?.ty;

                match target_type {
                    CheckedType::Array(item_type) => {
                        Ok(ExprInfo::new(*item_type, RefInfo::ArrayAccess))
                    }
                    CheckedType::Error => Ok(CheckedType::Error.into()),
                    _ => Err(unrecoverable(
                        self.arena.span(target_expr),
                        SemanticError::CannotIndexNonArrayType {
                            ty: target_type.to_string(),
                        },
                    )),
                }
            }
            Null => Ok(CheckedType::Null.into()),
            Boolean(_) => Ok(CheckedType::Boolean.into()),
            Int(lit) => {
                self.check_int_literal(&lit, false);
                Ok(CheckedType::Int.into())
            }
            NegInt(lit) => {
                self.check_int_literal(&lit, true);
                Ok(CheckedType::Int.into())
            }
            Char(_) => Ok(CheckedType::Char.into()),
            Str(_) => Ok(CheckedType::String.into()),
            Var(name) => self.check_var(&name),
            This => {
                if self.current_method.is_static {
                    Err(unrecoverable(span, SemanticError::ThisInStaticMethod))
                } else {
                    Ok(ExprInfo::new(
                        CheckedType::TypeRef(self.current_class_id),
                        RefInfo::This(self.current_class_id),
                    ))
                }
            }
            Super => {
                if self.current_method.is_static {
                    return Err(unrecoverable(span, SemanticError::SuperInStaticMethod));
                }
                match self.type_system.class(self.current_class_id).parent {
                    Some(parent) => Ok(ExprInfo::new(
                        CheckedType::TypeRef(parent),
                        RefInfo::Super(parent),
                    )),
                    None => Err(unrecoverable(
                        span,
                        SemanticError::SuperWithoutParent {
                            class_name: self.current_class_id.to_string(),
                        },
                    )),
                }
            }
            NewObject(name) => match self.type_system.lookup_class(name.data) {
                Some((class_def, class_def_id)) => {
                    let kind = if class_def.is_interface() {
                        Some("interface")
                    } else if class_def.is_abstract {
                        Some("abstract class")
                    } else {
                        None
                    };
                    if let Some(kind) = kind {
                        self.context.report_error(
                            name.span,
                            SemanticError::CannotInstantiate {
                                kind: kind.to_string(),
                                name: name.data.to_string(),
                            },
                        );
                    }
                    Ok(CheckedType::TypeRef(class_def_id).into())
                }
                None => Err(unrecoverable(
                    name.span,
                    SemanticError::ClassDoesNotExist {
                        class_name: name.data.to_string(),
                    },
                )),
            },
            NewArray(basic_ty, size_expr, dimension) => {
                // e.g new int[10][][];
                self.check_type(size_expr, &CheckedType::Int);

                let basic_ty = checked_type_from_basic_ty(
                    &basic_ty,
                    self.context,
                    self.type_system,
                    VoidIs::Forbidden,
                );
                Ok(CheckedType::create_array_type(basic_ty, dimension + 1).into())
            }
        }
    }

    /// `+ - * / %` and `& | ^`. Returns the type of the whole expression.
    fn check_arithmetic_expr(
        &mut self,
        span: Span<'src>,
        op: ast::BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    ) -> CheckedType<'src> {
        let lhs_type = self.type_operand(lhs);
        let rhs_type = self.type_operand(rhs);

        if lhs_type.is_error() || rhs_type.is_error() {
            return CheckedType::Error;
        }

        let is_concat = op == ast::BinaryOp::Add
            && (lhs_type == CheckedType::String || rhs_type == CheckedType::String)
            && lhs_type != CheckedType::Void
            && rhs_type != CheckedType::Void;
        if is_concat {
            return CheckedType::String;
        }

        let both_boolean = lhs_type == CheckedType::Boolean && rhs_type == CheckedType::Boolean;
        if op.family() == ast::BinaryOpFamily::Bitwise && both_boolean {
            return CheckedType::Boolean;
        }

        if lhs_type.is_numeric() && rhs_type.is_numeric() {
            let target = promote(
                lhs_type
                    .mixed_class(&rhs_type)
                    .unwrap_or_else(|| lhs_type.clone()),
            );
            self.coerce(lhs, &lhs_type, &target);
            self.coerce(rhs, &rhs_type, &target);
            return target;
        }

        self.context.report_error(
            span,
            SemanticError::InvalidOperandTypes {
                op: op.to_string(),
                lhs: lhs_type.to_string(),
                rhs: rhs_type.to_string(),
            },
        );
        CheckedType::Error
    }

    /// Comparisons always have type boolean, no matter what went wrong with
    /// the operands.
    fn check_relational_expr(&mut self, span: Span<'src>, op: ast::RelOp, lhs: ExprId, rhs: ExprId) {
        let lhs_type = self.type_operand(lhs);
        let rhs_type = self.type_operand(rhs);

        if lhs_type.is_error() || rhs_type.is_error() {
            return;
        }

        if !lhs_type.is_super_of(&rhs_type, self.type_system)
            && !rhs_type.is_super_of(&lhs_type, self.type_system)
        {
            self.context.report_error(
                span,
                SemanticError::OperandsMustHaveSameType {
                    lhs: lhs_type.to_string(),
                    rhs: rhs_type.to_string(),
                },
            );
            return;
        }

        if let Some(target) = lhs_type.mixed_class(&rhs_type) {
            // exactly one side differs from the common type
            if rhs_type == target {
                self.widen(lhs, target);
            } else {
                self.widen(rhs, target);
            }
        }

        if op.is_ordering() && !(lhs_type.is_numeric() && rhs_type.is_numeric()) {
            self.context.report_error(
                span,
                SemanticError::InvalidOperandTypes {
                    op: op.to_string(),
                    lhs: lhs_type.to_string(),
                    rhs: rhs_type.to_string(),
                },
            );
        }
    }

    /// The left side is checked first, the right side is checked even if
    /// the left side is broken.
    fn check_assignment(&mut self, lhs: ExprId, rhs: ExprId) -> CheckedType<'src> {
        let ExprInfo {
            ty: lhs_type,
            ref_info,
        } = match self.type_or_report(lhs) {
            Some(info) => info,
            None => {
                self.type_operand(rhs);
                return CheckedType::Error;
            }
        };

        if !lhs_type.is_error() {
            use crate::type_analysis::RefInfo::*;
            match ref_info {
                Some(GlobalVar(_)) | Some(Method(_)) | Some(This(_)) | Some(Super(_)) | None => {
                    self.context
                        .report_error(self.arena.span(lhs), SemanticError::InvalidAssignment);
                }
                Some(Field(field)) => {
                    if !field.can_write {
                        self.context.report_error(
                            self.arena.span(lhs),
                            SemanticError::CannotWriteToReadOnlyField {
                                field_name: field.name.to_string(),
                            },
                        );
                    }
                }
                Some(Var(_)) | Some(Param(_)) | Some(ArrayAccess) => {}
            }
        }

        self.check_type(rhs, &lhs_type);
        lhs_type
    }

    fn is_castable(&self, from: &CheckedType<'src>, to: &CheckedType<'src>) -> bool {
        from == to
            || from.is_error()
            || to.is_error()
            || (from.is_numeric() && to.is_numeric())
            || (from.is_reference()
                && to.is_reference()
                && (from.is_super_of(to, self.type_system) || to.is_super_of(from, self.type_system)))
    }

    fn check_int_literal(&self, lit: &Spanned<'src, &'src str>, negated: bool) {
        if let Err(err) = ast::parse_int_literal(lit.data, negated) {
            self.context
                .report_error(lit.span, SemanticError::IntLiteral(err));
        }
    }

    fn type_args(&mut self, args: &[ExprId]) {
        for arg in args {
            self.type_operand(*arg);
        }
    }

    fn check_method_invocation(
        &mut self,
        method_name: &Spanned<'src, Symbol<'src>>,
        target_class_id: ClassDefId<'src>,
        args: &[ExprId],
        qualified: bool,
    ) -> TypeResult<'src> {
        let method = match self.type_system.lookup_method(target_class_id, method_name.data) {
            Some(method) => method,
            None => {
                self.type_args(args);
                return Err(unrecoverable(
                    method_name.span,
                    SemanticError::MethodDoesNotExistOnType {
                        method_name: method_name.data.to_string(),
                        ty: target_class_id.to_string(),
                    },
                ));
            }
        };

        if method.builtin.is_some() {
            self.check_print_args(method_name, args);
        } else {
            if qualified && method.is_static {
                self.context.report_error(
                    method_name.span,
                    SemanticError::CannotCallStaticMethod {
                        method_name: method_name.data.to_string(),
                    },
                );
            }
            if !qualified && !method.is_static && self.current_method.is_static {
                self.context.report_error(
                    method_name.span,
                    SemanticError::ThisMethodInvocationInStaticMethod {
                        method_name: method_name.data.to_string(),
                    },
                );
            }
            if method.params.len() != args.len() {
                self.context.report_error(
                    method_name.span,
                    SemanticError::MethodArgCountDoesNotMatch {
                        expected_args: method.params.len(),
                        actual_args: args.len(),
                    },
                );
            }

            for (arg, param) in args.iter().zip(method.params.iter()) {
                self.check_type(*arg, &param.ty);
            }
            self.type_args(args.get(method.params.len()..).unwrap_or(&[]));
        }

        Ok(ExprInfo::new(
            method.return_ty.clone(),
            RefInfo::Method(method),
        ))
    }

    fn check_print_args(&mut self, method_name: &Spanned<'src, Symbol<'src>>, args: &[ExprId]) {
        if args.len() != 1 {
            self.context.report_error(
                method_name.span,
                SemanticError::MethodArgCountDoesNotMatch {
                    expected_args: 1,
                    actual_args: args.len(),
                },
            );
        }
        for arg in args {
            let ty = self.type_operand(*arg);
            if !ty.is_printable() {
                self.context.report_error(
                    self.arena.span(*arg),
                    SemanticError::CannotPrintType { ty: ty.to_string() },
                );
            }
        }
    }

    /// Locals and parameters, then fields of the current class and its
    /// ancestors, then the builtin globals.
    fn check_var(&mut self, var_name: &Spanned<'src, Symbol<'src>>) -> TypeResult<'src> {
        match self.local_scope.visible_definition(var_name.data).cloned() {
            Some(VarDef::Local { ty }) => {
                return Ok(ExprInfo::new(ty, RefInfo::Var(var_name.data)));
            }
            Some(VarDef::Param(param_def)) => {
                if self.current_method.is_main {
                    self.context.report_error(
                        var_name.span,
                        SemanticError::MainMethodParamUsed {
                            name: var_name.data.to_string(),
                        },
                    );
                }
                return Ok(ExprInfo::new(
                    param_def.ty.clone(),
                    RefInfo::Param(param_def),
                ));
            }
            None => {}
        }

        if let Some(field) = self
            .type_system
            .lookup_field(self.current_class_id, var_name.data)
        {
            if self.current_method.is_static {
                self.context.report_error(
                    var_name.span,
                    SemanticError::CannotAccessNonStaticFieldInStaticMethod {
                        field_name: var_name.data.to_string(),
                    },
                );
            }
            return Ok(ExprInfo::new(field.ty.clone(), RefInfo::Field(field)));
        }

        // static class access is not allowed. A user defined "System"
        // class hides the global variable.
        if self.type_system.lookup_class(var_name.data).is_some() || var_name.data == self.context.string {
            return Err(unrecoverable(
                var_name.span,
                SemanticError::InvalidReferenceToClass {
                    class_name: var_name.data.to_string(),
                },
            ));
        }

        if let Some(ty) = self.context.global_vars.get(&var_name.data) {
            return Ok(ExprInfo::new(ty.clone(), RefInfo::GlobalVar(var_name.data)));
        }

        let mut candidates = self.local_scope.visible_symbols().collect::<Vec<_>>();
        candidates.extend(self.type_system.visible_field_names(self.current_class_id));
        candidates.extend(self.context.global_vars.keys().cloned());
        candidates.sort();
        candidates.dedup();
        let suggestion = closest_relative(var_name.data, candidates)
            .map(|candidate| format!(", did you mean '{}'?", candidate))
            .unwrap_or_default();

        Err(unrecoverable(
            var_name.span,
            SemanticError::CannotLookupVarOrField {
                name: var_name.data.to_string(),
                suggestion,
            },
        ))
    }
}

/// Binary numeric promotion: arithmetic on `char` is done in `int`.
fn promote(ty: CheckedType<'_>) -> CheckedType<'_> {
    match ty {
        CheckedType::Char => CheckedType::Int,
        other => other,
    }
}
