use crate::{
    lir::{BinopKind, Dispatch, Instr, InstructionBuilder, IrType, UnopKind, ValueHandle},
    runtime::RuntimeFunction,
};
use asciifile::Spanned;
use parser::ast::{self, BinaryOp, Expr, ExprArena, ExprId, RelOp, Stmt, UnaryOp};
use std::rc::Rc;
use strtab::Symbol;
use symtab::Scoped;
use type_checking::{
    type_system::ClassMethodDef, BuiltinMethod, CheckedType, ClassDefId, RefInfo, TypeAnalysis,
    TypeSystem,
};

/// The LIR type of values of type `ty`.
pub fn ir_type(ty: &CheckedType<'_>) -> IrType {
    match ty {
        CheckedType::Boolean => IrType::Bool,
        CheckedType::Char => IrType::Char,
        CheckedType::Int => IrType::Int,
        CheckedType::Long => IrType::Long,
        CheckedType::Void => IrType::Void,
        CheckedType::String | CheckedType::Null | CheckedType::TypeRef(_) | CheckedType::Array(_) => {
            IrType::Ptr
        }
        CheckedType::Error => unreachable!("only programs without type errors are lowered"),
    }
}

fn ir_type_of_decl(ty: &ast::Type<'_>) -> IrType {
    if ty.array_depth > 0 {
        return IrType::Ptr;
    }
    match ty.basic.data {
        ast::BasicType::Int => IrType::Int,
        ast::BasicType::Long => IrType::Long,
        ast::BasicType::Char => IrType::Char,
        ast::BasicType::Boolean => IrType::Bool,
        ast::BasicType::Custom(_) => IrType::Ptr,
        ast::BasicType::Void => unreachable!("variables are never void"),
    }
}

fn binop_kind(op: BinaryOp) -> BinopKind {
    match op {
        BinaryOp::Add => BinopKind::Add,
        BinaryOp::Sub => BinopKind::Sub,
        BinaryOp::Mul => BinopKind::Mul,
        BinaryOp::Div => BinopKind::Div,
        BinaryOp::Mod => BinopKind::Mod,
        BinaryOp::BitAnd => BinopKind::And,
        BinaryOp::BitOr => BinopKind::Or,
        BinaryOp::BitXor => BinopKind::Xor,
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
            unreachable!("logical operators are lowered to branches")
        }
    }
}

/// A local variable or parameter, stored in a stack slot.
#[derive(Debug, Clone, Copy)]
struct Local {
    slot: ValueHandle,
    ty: IrType,
}

/// Lowers the body of one method into the function `builder` is
/// positioned in.
///
/// Every local and parameter lives in a stack slot allocated in the entry
/// block, `this` is the first parameter of instance methods.
pub struct MethodBodyGenerator<'b, 'p, 'src, B: InstructionBuilder> {
    builder: &'b mut B,
    arena: &'p ExprArena<'src>,
    type_system: &'p TypeSystem<'src>,
    analysis: &'p TypeAnalysis<'src>,
    method: Rc<ClassMethodDef<'src>>,
    locals: Scoped<Symbol<'src>, Local>,
    this: Option<ValueHandle>,
}

impl<'b, 'p, 'src, B: InstructionBuilder> MethodBodyGenerator<'b, 'p, 'src, B> {
    /// `params` are the values of the function's parameters, including
    /// `this` for instance methods.
    pub fn new(
        builder: &'b mut B,
        arena: &'p ExprArena<'src>,
        type_system: &'p TypeSystem<'src>,
        analysis: &'p TypeAnalysis<'src>,
        method: Rc<ClassMethodDef<'src>>,
        params: &[ValueHandle],
    ) -> Self {
        let (this, params) = if method.is_static {
            (None, params)
        } else {
            (Some(params[0]), &params[1..])
        };

        let mut generator = MethodBodyGenerator {
            builder,
            arena,
            type_system,
            analysis,
            method: Rc::clone(&method),
            locals: Scoped::new(),
            this,
        };
        for (param, value) in method.params.iter().zip(params) {
            generator.define_local(param.name, ir_type(&param.ty), *value);
        }
        generator
    }

    pub fn gen_method(mut self, body: &'p Spanned<'src, ast::Block<'src>>) {
        self.gen_block(&body.data);

        if !self.builder.is_terminated() {
            match ir_type(&self.method.return_ty) {
                IrType::Void => self.builder.build_ret(None),
                // no path of a checked method reaches this point
                _ => self.builder.push(Instr::Unreachable),
            }
        }
    }

    fn define_local(&mut self, name: Symbol<'src>, ty: IrType, init: ValueHandle) {
        let slot = self.builder.build_alloca(ty);
        self.builder.build_store(init, slot);
        self.locals
            .define(name, Local { slot, ty })
            .expect("checked programs do not redefine locals");
    }

    fn local(&self, name: Symbol<'src>) -> Local {
        *self
            .locals
            .visible_definition(name)
            .expect("variables are defined before use")
    }

    fn gen_block(&mut self, block: &'p ast::Block<'src>) {
        self.locals.enter_scope();
        for stmt in &block.statements {
            // the rest of the block is unreachable
            if self.builder.is_terminated() {
                break;
            }
            self.gen_stmt(stmt);
        }
        self.locals
            .leave_scope()
            .expect("scopes are entered and left pairwise");
    }

    fn gen_stmt(&mut self, stmt: &'p Spanned<'src, Stmt<'src>>) {
        match &stmt.data {
            Stmt::Block(block) => self.gen_block(&block.data),
            Stmt::Empty => {}
            Stmt::If(cond, then_arm, else_arm) => self.gen_if(*cond, then_arm, else_arm.as_deref()),
            Stmt::While(cond, body) => self.gen_while(*cond, body),
            Stmt::DoWhile(body, cond) => self.gen_do_while(body, *cond),
            Stmt::Expression(expr) => {
                self.gen_expr(*expr);
            }
            Stmt::Return(expr) => {
                let value = expr.map(|expr| self.gen_expr(expr));
                self.builder.build_ret(value);
            }
            Stmt::LocalVariableDeclaration(ty, name, init) => {
                let ty = ir_type_of_decl(&ty.data);
                let init = match init {
                    Some(init) => self.gen_expr(*init),
                    None => ValueHandle::constant(ty, 0),
                };
                self.define_local(name.data, ty, init);
            }
        }
    }

    fn jmp_unless_terminated(&mut self, target: &str) {
        if !self.builder.is_terminated() {
            self.builder.build_jmp(target);
        }
    }

    fn gen_if(
        &mut self,
        cond: ExprId,
        then_arm: &'p Spanned<'src, Stmt<'src>>,
        else_arm: Option<&'p Spanned<'src, Stmt<'src>>>,
    ) {
        let cond = self.gen_expr(cond);
        let then_label = self.builder.append_block("then");
        let else_label = else_arm.map(|_| self.builder.append_block("else"));
        let end_label = self.builder.append_block("endif");
        self.builder.build_branch(
            cond,
            &then_label,
            else_label.as_ref().unwrap_or(&end_label),
        );

        self.builder.position_at_end(&then_label);
        self.gen_stmt(then_arm);
        self.jmp_unless_terminated(&end_label);

        if let (Some(else_arm), Some(else_label)) = (else_arm, else_label) {
            self.builder.position_at_end(&else_label);
            self.gen_stmt(else_arm);
            self.jmp_unless_terminated(&end_label);
        }

        self.builder.position_at_end(&end_label);
    }

    fn gen_while(&mut self, cond: ExprId, body: &'p Spanned<'src, Stmt<'src>>) {
        let header_label = self.builder.append_block("while");
        let body_label = self.builder.append_block("body");
        let end_label = self.builder.append_block("endwhile");
        self.builder.build_jmp(&header_label);

        self.builder.position_at_end(&header_label);
        let cond = self.gen_expr(cond);
        self.builder.build_branch(cond, &body_label, &end_label);

        self.builder.position_at_end(&body_label);
        self.gen_stmt(body);
        self.jmp_unless_terminated(&header_label);

        self.builder.position_at_end(&end_label);
    }

    fn gen_do_while(&mut self, body: &'p Spanned<'src, Stmt<'src>>, cond: ExprId) {
        let body_label = self.builder.append_block("do");
        let end_label = self.builder.append_block("enddo");
        self.builder.build_jmp(&body_label);

        self.builder.position_at_end(&body_label);
        self.gen_stmt(body);
        if !self.builder.is_terminated() {
            let cond = self.gen_expr(cond);
            self.builder.build_branch(cond, &body_label, &end_label);
        }

        self.builder.position_at_end(&end_label);
    }

    fn call_runtime(&mut self, func: RuntimeFunction, args: Vec<ValueHandle>) -> ValueHandle {
        let ret = func.return_ty();
        self.builder
            .build_call(func.ld_name(), Dispatch::Static, args, ret)
    }

    fn ref_info(&self, id: ExprId) -> &'p RefInfo<'src> {
        let analysis: &'p TypeAnalysis<'src> = self.analysis;
        analysis
            .expr_info(id)
            .ref_info
            .as_ref()
            .expect("names are resolved by the type checker")
    }

    fn this(&self) -> ValueHandle {
        self.this
            .expect("'this' is only used in instance methods")
    }

    /// Lower the expression `id` and return its value. Calls of methods
    /// without return value yield `ValueHandle::void()`.
    pub fn gen_expr(&mut self, id: ExprId) -> ValueHandle {
        let arena = self.arena;
        match &arena[id].data {
            Expr::Binary(op @ BinaryOp::LogicalAnd, lhs, rhs)
            | Expr::Binary(op @ BinaryOp::LogicalOr, lhs, rhs) => {
                self.gen_short_circuit(*op, *lhs, *rhs)
            }
            Expr::Binary(BinaryOp::Add, lhs, rhs)
                if *self.analysis.ty(id) == CheckedType::String =>
            {
                let lhs = self.gen_string_operand(*lhs);
                let rhs = self.gen_string_operand(*rhs);
                self.call_runtime(RuntimeFunction::StringConcat, vec![lhs, rhs])
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.gen_expr(*lhs);
                let rhs = self.gen_expr(*rhs);
                if let BinaryOp::Div | BinaryOp::Mod = op {
                    self.call_runtime(RuntimeFunction::DivByZero(rhs.ty()), vec![rhs]);
                }
                self.builder.build_binop(binop_kind(*op), lhs, rhs)
            }
            Expr::Relational(op, lhs, rhs) => self.gen_comparison(*op, *lhs, *rhs),
            Expr::Unary(op, operand) => {
                let operand = self.gen_expr(*operand);
                let kind = match op {
                    UnaryOp::Not => UnopKind::Not,
                    UnaryOp::Neg => UnopKind::Neg,
                };
                self.builder.build_unop(kind, operand)
            }
            Expr::Assignment(lhs, rhs) => {
                let addr = self.gen_address(*lhs);
                let value = self.gen_expr(*rhs);
                self.builder.build_store(value, addr);
                value
            }
            Expr::Cast(_, operand, _) => self.gen_cast(id, *operand),
            Expr::MethodInvocation(target, _, args) => {
                self.gen_method_invocation(id, Some(*target), &args.data)
            }
            Expr::ThisMethodInvocation(_, args) => {
                self.gen_method_invocation(id, None, &args.data)
            }
            Expr::FieldAccess(..) => match self.ref_info(id) {
                RefInfo::Field(field) if self.type_system.class(field.owner).is_builtin => {
                    ValueHandle::void()
                }
                _ => self.gen_load(id),
            },
            Expr::ArrayAccess(..) => self.gen_load(id),
            Expr::Null => ValueHandle::constant(IrType::Ptr, 0),
            Expr::Boolean(b) => ValueHandle::constant(IrType::Bool, i64::from(*b)),
            Expr::Int(lit) => ValueHandle::constant(
                IrType::Int,
                i64::from(ast::parse_int_literal(lit.data, false).expect("literals are checked")),
            ),
            Expr::NegInt(lit) => ValueHandle::constant(
                IrType::Int,
                i64::from(ast::parse_int_literal(lit.data, true).expect("literals are checked")),
            ),
            Expr::Char(c) => ValueHandle::constant(IrType::Char, i64::from(*c as u32 as u16)),
            Expr::Str(s) => self.builder.build_str(s),
            Expr::Var(_) => match self.ref_info(id) {
                RefInfo::GlobalVar(_) => ValueHandle::void(),
                _ => self.gen_load(id),
            },
            Expr::This | Expr::Super => self.this(),
            Expr::NewObject(name) => {
                self.call_runtime(RuntimeFunction::NewObject(name.data.to_string()), vec![])
            }
            Expr::NewArray(_, size, _) => {
                let elem_ty = self
                    .analysis
                    .ty(id)
                    .inner_type()
                    .map(ir_type)
                    .expect("'new' creates arrays of array type");
                let length = self.gen_expr(*size);
                let elem_size = ValueHandle::constant(IrType::Long, i64::from(elem_ty.size()));
                self.call_runtime(RuntimeFunction::NewArray, vec![elem_size, length])
            }
        }
    }

    fn gen_load(&mut self, id: ExprId) -> ValueHandle {
        let ty = ir_type(self.analysis.ty(id));
        let addr = self.gen_address(id);
        self.builder.build_load(ty, addr)
    }

    /// Address of an assignable expression. Objects and arrays are checked
    /// for `null` and indices for bounds.
    fn gen_address(&mut self, id: ExprId) -> ValueHandle {
        let arena = self.arena;
        match &arena[id].data {
            Expr::Var(_) => match self.ref_info(id) {
                RefInfo::Var(name) => self.local(*name).slot,
                RefInfo::Param(param) => self.local(param.name).slot,
                RefInfo::Field(field) => {
                    let this = self.this();
                    let name = format!("{}.{}", field.owner, field.name);
                    self.builder.build_field_addr(this, name)
                }
                other => unreachable!("variable refers to {:?}", other),
            },
            Expr::FieldAccess(target, _) => {
                let name = match self.ref_info(id) {
                    RefInfo::Field(field) => format!("{}.{}", field.owner, field.name),
                    other => unreachable!("field access refers to {:?}", other),
                };
                let object = self.gen_expr(*target);
                self.call_runtime(RuntimeFunction::NullUsage, vec![object]);
                self.builder.build_field_addr(object, name)
            }
            Expr::ArrayAccess(array, index) => {
                let elem_ty = ir_type(self.analysis.ty(id));
                let array = self.gen_expr(*array);
                let index = self.gen_expr(*index);
                self.call_runtime(RuntimeFunction::ArrayOutOfBounds, vec![array, index]);
                self.builder.build_elem_addr(elem_ty, array, index)
            }
            other => unreachable!("{:?} is not assignable", other),
        }
    }

    /// Both operands are stored to a slot, the right one only if it is
    /// needed.
    fn gen_short_circuit(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ValueHandle {
        let slot = self.builder.build_alloca(IrType::Bool);
        let lhs = self.gen_expr(lhs);
        self.builder.build_store(lhs, slot);

        let rhs_label = self.builder.append_block("rhs");
        let end_label = self.builder.append_block("endlogic");
        if op == BinaryOp::LogicalAnd {
            self.builder.build_branch(lhs, &rhs_label, &end_label);
        } else {
            self.builder.build_branch(lhs, &end_label, &rhs_label);
        }

        self.builder.position_at_end(&rhs_label);
        let rhs = self.gen_expr(rhs);
        self.builder.build_store(rhs, slot);
        self.builder.build_jmp(&end_label);

        self.builder.position_at_end(&end_label);
        self.builder.build_load(IrType::Bool, slot)
    }

    /// One `icmp` with the predicate of `op`. Strings are compared by
    /// content through the runtime, chars are zero extended because all
    /// predicates are signed.
    fn gen_comparison(&mut self, op: RelOp, lhs: ExprId, rhs: ExprId) -> ValueHandle {
        let compares_strings = [lhs, rhs]
            .iter()
            .any(|operand| *self.analysis.ty(*operand) == CheckedType::String);
        let lhs = self.gen_expr(lhs);
        let rhs = self.gen_expr(rhs);

        let (lhs, rhs) = if compares_strings {
            let ordering = self.call_runtime(RuntimeFunction::StringCompare, vec![lhs, rhs]);
            (ordering, ValueHandle::constant(IrType::Int, 0))
        } else {
            (self.widen_char(lhs), self.widen_char(rhs))
        };
        self.builder.build_icmp(op.predicate(), lhs, rhs)
    }

    fn widen_char(&mut self, value: ValueHandle) -> ValueHandle {
        match value.ty() {
            IrType::Char => self.builder.build_conv(value, IrType::Int),
            _ => value,
        }
    }

    fn gen_string_operand(&mut self, id: ExprId) -> ValueHandle {
        let value = self.gen_expr(id);
        match self.analysis.ty(id) {
            CheckedType::String | CheckedType::Null => value,
            _ => self.call_runtime(RuntimeFunction::StringOf(value.ty()), vec![value]),
        }
    }

    fn gen_cast(&mut self, id: ExprId, operand: ExprId) -> ValueHandle {
        let value = self.gen_expr(operand);
        match (self.analysis.ty(operand), self.analysis.ty(id)) {
            (CheckedType::TypeRef(from), CheckedType::TypeRef(to))
                if !self.type_system.is_subtype_of(*from, *to) =>
            {
                self.call_runtime(RuntimeFunction::Cast(to.to_string()), vec![value]);
                value
            }
            (_, target) if target.is_numeric() => self.builder.build_conv(value, ir_type(target)),
            _ => value,
        }
    }

    /// Calls on `super` are bound statically to the parent's
    /// implementation, other instance methods are dispatched virtually.
    fn gen_method_invocation(
        &mut self,
        id: ExprId,
        target: Option<ExprId>,
        args: &[ExprId],
    ) -> ValueHandle {
        let method = match self.ref_info(id) {
            RefInfo::Method(method) => Rc::clone(method),
            other => unreachable!("method invocation refers to {:?}", other),
        };

        if let Some(builtin) = method.builtin {
            let args = self.gen_args(args);
            let ty = args.first().map_or(IrType::Void, |arg| arg.ty());
            let func = match builtin {
                BuiltinMethod::Println => RuntimeFunction::SystemOutPrintln(ty),
                BuiltinMethod::Print => RuntimeFunction::SystemOutPrint(ty),
            };
            return self.call_runtime(func, args);
        }

        let ret = ir_type(&method.return_ty);
        if method.is_static {
            let args = self.gen_args(args);
            let name = format!("{}.{}", method.owner, method.name);
            return self.builder.build_call(name, Dispatch::Static, args, ret);
        }

        let arena = self.arena;
        let (receiver, name, dispatch, checked) = match target {
            Some(target) => match &arena[target].data {
                Expr::Super => {
                    let parent = match self.ref_info(target) {
                        RefInfo::Super(parent) => *parent,
                        other => unreachable!("'super' refers to {:?}", other),
                    };
                    let implementor = self.implementor(parent, method.name);
                    let name = format!("{}.{}", implementor, method.name);
                    (self.this(), name, Dispatch::Static, false)
                }
                _ => {
                    let receiver = self.gen_expr(target);
                    let name = format!("{}.{}", method.owner, method.name);
                    (receiver, name, Dispatch::Virtual, true)
                }
            },
            None => {
                let name = format!("{}.{}", method.owner, method.name);
                (self.this(), name, Dispatch::Virtual, false)
            }
        };

        let mut call_args = vec![receiver];
        call_args.extend(self.gen_args(args));
        if checked {
            self.call_runtime(RuntimeFunction::NullUsage, vec![receiver]);
        }
        self.builder.build_call(name, dispatch, call_args, ret)
    }

    fn gen_args(&mut self, args: &[ExprId]) -> Vec<ValueHandle> {
        args.iter().map(|arg| self.gen_expr(*arg)).collect()
    }

    /// The first class along the parent chain of `class` that implements
    /// `name`.
    fn implementor(&self, class: ClassDefId<'src>, name: Symbol<'src>) -> ClassDefId<'src> {
        self.type_system
            .parent_chain(class)
            .into_iter()
            .find(|class| {
                self.type_system
                    .class(*class)
                    .method(name)
                    .map_or(false, |method| !method.is_abstract)
            })
            .expect("calls on 'super' refer to implemented methods")
    }
}
