use crate::{
    runtime_error::RuntimeError,
    state::State,
    value::{ArrayRef, Object, ObjectRef, Value},
};
use asciifile::{Span, Spanned};
use itertools::Itertools;
use parser::ast::{self, BinaryOp, Expr, ExprArena, ExprId, Stmt, UnaryOp};
use std::{cell::RefCell, collections::HashMap, io::Write, rc::Rc};
use strtab::Symbol;
use type_checking::{
    BuiltinMethod, CheckedType, ClassDefId, RefInfo, TypeAnalysis, TypeSystem,
};

/// Nesting of method calls after which the interpreter gives up.
pub const DEFAULT_CALL_DEPTH_LIMIT: usize = 512;

/// Evaluation recurses with the program's calls and nested expressions.
/// The native stack grows by a segment whenever less than the red zone is left.
const STACK_RED_ZONE: usize = 256 * 1024;
const STACK_SEGMENT_SIZE: usize = 4 * 1024 * 1024;

pub type EvalResult<'src, T> = Result<T, Spanned<'src, RuntimeError>>;

fn fail(span: Span<'_>, error: RuntimeError) -> Spanned<'_, RuntimeError> {
    Spanned::new(span, error)
}

enum Flow<'src> {
    Normal,
    Return(Value<'src>),
}

#[derive(Clone, Copy)]
struct MethodBody<'p, 'src> {
    params: &'p [Spanned<'src, ast::Parameter<'src>>],
    body: &'p Spanned<'src, ast::Block<'src>>,
}

/// Tree walking interpreter for type checked programs.
///
/// Relies on the type checker for everything that is decidable before
/// running the program: every variable is defined, every operand has the
/// expected type and every called method exists.
pub struct Interpreter<'p, 'src, 'out> {
    arena: &'p ExprArena<'src>,
    type_system: &'p TypeSystem<'src>,
    analysis: &'p TypeAnalysis<'src>,
    /// Methods with a body, by declaring class and name
    methods: HashMap<(ClassDefId<'src>, Symbol<'src>), MethodBody<'p, 'src>>,
    main: (ClassDefId<'src>, Symbol<'src>),
    state: State<'src>,
    out: &'out mut dyn Write,
    call_depth_limit: usize,
}

impl<'p, 'src, 'out> Interpreter<'p, 'src, 'out> {
    pub fn new(
        program: &'p ast::Program<'src>,
        type_system: &'p TypeSystem<'src>,
        analysis: &'p TypeAnalysis<'src>,
        out: &'out mut dyn Write,
    ) -> Result<Self, RuntimeError> {
        let mut methods = HashMap::new();
        let mut main = None;

        for class_decl in &program.classes {
            let class_id = match type_system.lookup_class(class_decl.name.data) {
                Some((_, class_id)) => class_id,
                None => continue,
            };
            for member in &class_decl.members {
                if let ast::ClassMemberKind::Method(_, params, Some(body)) = &member.kind {
                    methods
                        .entry((class_id, member.name))
                        .or_insert(MethodBody {
                            params: &params.data,
                            body,
                        });
                    let is_main = type_system
                        .class(class_id)
                        .method(member.name)
                        .map_or(false, |method| method.is_main);
                    if is_main && main.is_none() {
                        main = Some((class_id, member.name));
                    }
                }
            }
        }

        Ok(Interpreter {
            arena: &program.arena,
            type_system,
            analysis,
            methods,
            main: main.ok_or(RuntimeError::NoMainMethod)?,
            state: State::new(),
            out,
            call_depth_limit: DEFAULT_CALL_DEPTH_LIMIT,
        })
    }

    pub fn with_call_depth_limit(mut self, limit: usize) -> Self {
        self.call_depth_limit = limit;
        self
    }

    /// Run the main method. Its parameter is `null`.
    pub fn run(&mut self) -> EvalResult<'src, ()> {
        let (class_id, name) = self.main;
        let main = self.resolve(class_id, name);
        log::debug!("running {}.{}", class_id, name);

        let args = main.params.iter().map(|_| Value::Null).collect();
        self.call(main, None, args, main.body.span)?;

        self.out
            .flush()
            .map_err(|err| fail(main.body.span, RuntimeError::Output { msg: err.to_string() }))
    }

    /// The implementation of `name` for instances of `class_id`, looked up
    /// along the parent chain.
    fn resolve(&self, class_id: ClassDefId<'src>, name: Symbol<'src>) -> MethodBody<'p, 'src> {
        self.type_system
            .parent_chain(class_id)
            .into_iter()
            .filter_map(|class| self.methods.get(&(class, name)).cloned())
            .next()
            .expect("checked programs only call implemented methods")
    }

    fn call(
        &mut self,
        method: MethodBody<'p, 'src>,
        this: Option<Value<'src>>,
        args: Vec<Value<'src>>,
        span: Span<'src>,
    ) -> EvalResult<'src, Value<'src>> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || {
            self.call_inner(method, this, args, span)
        })
    }

    fn call_inner(
        &mut self,
        method: MethodBody<'p, 'src>,
        this: Option<Value<'src>>,
        args: Vec<Value<'src>>,
        span: Span<'src>,
    ) -> EvalResult<'src, Value<'src>> {
        if self.state.depth() >= self.call_depth_limit {
            return Err(fail(
                span,
                RuntimeError::StackOverflow {
                    limit: self.call_depth_limit,
                },
            ));
        }

        self.state.push_frame(this);
        for (param, arg) in method.params.iter().zip(args) {
            self.state
                .define(param.name, arg)
                .expect("parameter names are distinct");
        }
        let flow = self.exec_block(&method.body.data);
        self.state.pop_frame();

        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Void),
        }
    }

    fn exec_block(&mut self, block: &'p ast::Block<'src>) -> EvalResult<'src, Flow<'src>> {
        self.state.enter_scope();
        let mut flow = Ok(Flow::Normal);
        for stmt in &block.statements {
            flow = self.exec_stmt(stmt);
            match &flow {
                Ok(Flow::Normal) => continue,
                _ => break,
            }
        }
        self.state.leave_scope();
        flow
    }

    fn exec_stmt(&mut self, stmt: &'p Spanned<'src, Stmt<'src>>) -> EvalResult<'src, Flow<'src>> {
        match &stmt.data {
            Stmt::Block(block) => self.exec_block(&block.data),
            Stmt::Empty => Ok(Flow::Normal),
            Stmt::If(cond, then_stmt, else_stmt) => {
                if self.eval_condition(*cond)? {
                    self.exec_stmt(then_stmt)
                } else if let Some(else_stmt) = else_stmt {
                    self.exec_stmt(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While(cond, body) => {
                while self.eval_condition(*cond)? {
                    if let Flow::Return(value) = self.exec_stmt(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile(body, cond) => loop {
                if let Flow::Return(value) = self.exec_stmt(body)? {
                    return Ok(Flow::Return(value));
                }
                if !self.eval_condition(*cond)? {
                    return Ok(Flow::Normal);
                }
            },
            Stmt::Expression(expr) => {
                self.eval(*expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(*expr)?,
                    None => Value::Void,
                };
                Ok(Flow::Return(value))
            }
            Stmt::LocalVariableDeclaration(ty, name, init) => {
                let value = match init {
                    Some(init) => self.eval(*init)?,
                    None => default_value(&ty.data),
                };
                self.state
                    .define(name.data, value)
                    .expect("checked programs do not redefine locals");
                Ok(Flow::Normal)
            }
        }
    }

    fn eval_condition(&mut self, expr: ExprId) -> EvalResult<'src, bool> {
        Ok(self
            .eval(expr)?
            .as_bool()
            .expect("conditions are checked to be boolean"))
    }

    pub fn eval(&mut self, id: ExprId) -> EvalResult<'src, Value<'src>> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || self.eval_inner(id))
    }

    fn eval_inner(&mut self, id: ExprId) -> EvalResult<'src, Value<'src>> {
        let arena = self.arena;
        let expr = &arena[id];
        let span = expr.span;

        match &expr.data {
            Expr::Binary(BinaryOp::LogicalAnd, lhs, rhs) => Ok(Value::Boolean(
                self.eval_condition(*lhs)? && self.eval_condition(*rhs)?,
            )),
            Expr::Binary(BinaryOp::LogicalOr, lhs, rhs) => Ok(Value::Boolean(
                self.eval_condition(*lhs)? || self.eval_condition(*rhs)?,
            )),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(*lhs)?;
                let rhs = self.eval(*rhs)?;
                lhs.binary(*op, rhs).map_err(|err| fail(span, err))
            }
            Expr::Relational(op, lhs, rhs) => {
                let lhs = self.eval(*lhs)?;
                let rhs = self.eval(*rhs)?;
                Ok(Value::Boolean(lhs.compare(op.compare_op(), &rhs)))
            }
            Expr::Unary(UnaryOp::Not, operand) => {
                Ok(Value::Boolean(!self.eval_condition(*operand)?))
            }
            Expr::Unary(UnaryOp::Neg, operand) => match self.eval(*operand)? {
                Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
                Value::Long(l) => Ok(Value::Long(l.wrapping_neg())),
                other => unreachable!("negation of {:?} does not type check", other),
            },
            Expr::Assignment(lhs, rhs) => self.assign(*lhs, *rhs),
            Expr::Cast(_, operand, _) => {
                let value = self.eval(*operand)?;
                self.cast(value, self.analysis.ty(id), span)
            }
            Expr::MethodInvocation(target, _, args) => {
                self.eval_method_invocation(id, Some(*target), &args.data, span)
            }
            Expr::ThisMethodInvocation(_, args) => {
                self.eval_method_invocation(id, None, &args.data, span)
            }
            Expr::FieldAccess(target, _) => {
                let field = self.field_key(id);
                if self.type_system.class(field.0).is_builtin {
                    return Ok(Value::Void);
                }
                let object = expect_object(self.eval(*target)?, span)?;
                let value = object.borrow().fields.get(&field).cloned();
                Ok(value.unwrap_or(Value::Null))
            }
            Expr::ArrayAccess(array, index) => {
                let array = self.eval(*array)?;
                let index = self.eval(*index)?;
                let items = expect_array(array, span)?;
                let index = array_index(&items, &index, span)?;
                let item = items.borrow()[index].clone();
                Ok(item)
            }
            Expr::Null => Ok(Value::Null),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Int(lit) => Ok(Value::Int(
                ast::parse_int_literal(lit.data, false).expect("literals are checked"),
            )),
            Expr::NegInt(lit) => Ok(Value::Int(
                ast::parse_int_literal(lit.data, true).expect("literals are checked"),
            )),
            Expr::Char(c) => Ok(Value::from_char(*c)),
            Expr::Str(s) => Ok(Value::new_str(s)),
            Expr::Var(_) => match self.ref_info(id) {
                RefInfo::Var(name) => Ok(self.lookup_var(*name)),
                RefInfo::Param(param) => Ok(self.lookup_var(param.name)),
                RefInfo::Field(field) => {
                    let value = self
                        .this_object()
                        .borrow()
                        .fields
                        .get(&(field.owner, field.name))
                        .cloned();
                    Ok(value.unwrap_or(Value::Null))
                }
                RefInfo::GlobalVar(_) => Ok(Value::Void),
                other => unreachable!("variable refers to {:?}", other),
            },
            Expr::This | Expr::Super => Ok(self.this()),
            Expr::NewObject(name) => {
                let (_, class_id) = self
                    .type_system
                    .lookup_class(name.data)
                    .expect("instantiated classes exist");
                Ok(self.instantiate(class_id))
            }
            Expr::NewArray(_, size, _) => {
                let size = self
                    .eval(*size)?
                    .as_i64()
                    .expect("array sizes are checked to be int") as i32;
                if size < 0 {
                    return Err(fail(span, RuntimeError::NegativeArraySize { size }));
                }
                let item = self
                    .analysis
                    .ty(id)
                    .inner_type()
                    .map(Value::zero)
                    .unwrap_or(Value::Null);
                Ok(Value::Array(Rc::new(RefCell::new(vec![
                    item;
                    size as usize
                ]))))
            }
        }
    }

    /// Array and object operands are evaluated before the right hand side,
    /// `null` and bounds are checked after.
    fn assign(&mut self, lhs: ExprId, rhs: ExprId) -> EvalResult<'src, Value<'src>> {
        let arena = self.arena;
        let span = arena.span(lhs);

        match &arena[lhs].data {
            Expr::ArrayAccess(array, index) => {
                let array = self.eval(*array)?;
                let index = self.eval(*index)?;
                let value = self.eval(rhs)?;
                let items = expect_array(array, span)?;
                let index = array_index(&items, &index, span)?;
                items.borrow_mut()[index] = value.clone();
                Ok(value)
            }
            Expr::FieldAccess(target, _) => {
                let field = self.field_key(lhs);
                let target = self.eval(*target)?;
                let value = self.eval(rhs)?;
                let object = expect_object(target, span)?;
                object.borrow_mut().fields.insert(field, value.clone());
                Ok(value)
            }
            Expr::Var(_) => {
                let value = self.eval(rhs)?;
                let name = match self.ref_info(lhs) {
                    RefInfo::Var(name) => *name,
                    RefInfo::Param(param) => param.name,
                    RefInfo::Field(field) => {
                        self.this_object()
                            .borrow_mut()
                            .fields
                            .insert((field.owner, field.name), value.clone());
                        return Ok(value);
                    }
                    other => unreachable!("cannot assign to {:?}", other),
                };
                self.state
                    .update(name, value.clone())
                    .expect("assigned variables are defined");
                Ok(value)
            }
            other => unreachable!("cannot assign to {:?}", other),
        }
    }

    fn cast(
        &self,
        value: Value<'src>,
        target: &CheckedType<'src>,
        span: Span<'src>,
    ) -> EvalResult<'src, Value<'src>> {
        let runtime_class = match &value {
            Value::Object(object) => Some(object.borrow().class),
            _ => None,
        };
        match (runtime_class, target) {
            (Some(class), CheckedType::TypeRef(target_class))
                if !self.type_system.is_subtype_of(class, *target_class) =>
            {
                Err(fail(
                    span,
                    RuntimeError::InvalidCast {
                        class: class.to_string(),
                        target: target.to_string(),
                    },
                ))
            }
            _ => Ok(value.convert(target)),
        }
    }

    /// Instance methods dispatch on the runtime class of the receiver,
    /// calls on `super` on the parent of the current class.
    fn eval_method_invocation(
        &mut self,
        id: ExprId,
        target: Option<ExprId>,
        args: &[ExprId],
        span: Span<'src>,
    ) -> EvalResult<'src, Value<'src>> {
        let method = match self.ref_info(id) {
            RefInfo::Method(method) => Rc::clone(method),
            other => unreachable!("method invocation refers to {:?}", other),
        };

        if let Some(builtin) = method.builtin {
            let args = self.eval_args(args)?;
            return self.print(builtin, &args, span);
        }

        if method.is_static {
            let args = self.eval_args(args)?;
            let body = self.resolve(method.owner, method.name);
            return self.call(body, None, args, span);
        }

        let arena = self.arena;
        let (receiver, static_class) = match target {
            Some(target) => match &arena[target].data {
                Expr::Super => match self.ref_info(target) {
                    RefInfo::Super(parent) => (self.this(), Some(*parent)),
                    other => unreachable!("'super' refers to {:?}", other),
                },
                _ => (self.eval(target)?, None),
            },
            None => (self.this(), None),
        };
        let args = self.eval_args(args)?;
        let object = expect_object(receiver, span)?;
        let class = static_class.unwrap_or_else(|| object.borrow().class);

        log::trace!("calling {}.{}", class, method.name);
        let body = self.resolve(class, method.name);
        self.call(body, Some(Value::Object(object)), args, span)
    }

    fn eval_args(&mut self, args: &[ExprId]) -> EvalResult<'src, Vec<Value<'src>>> {
        args.iter().map(|arg| self.eval(*arg)).collect()
    }

    fn print(
        &mut self,
        builtin: BuiltinMethod,
        args: &[Value<'src>],
        span: Span<'src>,
    ) -> EvalResult<'src, Value<'src>> {
        let text = args.iter().join("");
        let written = match builtin {
            BuiltinMethod::Println => writeln!(self.out, "{}", text),
            BuiltinMethod::Print => write!(self.out, "{}", text),
        };
        written.map_err(|err| fail(span, RuntimeError::Output { msg: err.to_string() }))?;
        Ok(Value::Void)
    }

    fn instantiate(&self, class: ClassDefId<'src>) -> Value<'src> {
        let fields = self
            .type_system
            .instance_fields(class)
            .iter()
            .map(|field| ((field.owner, field.name), Value::zero(&field.ty)))
            .collect();
        Value::Object(Rc::new(RefCell::new(Object { class, fields })))
    }

    fn ref_info(&self, id: ExprId) -> &'p RefInfo<'src> {
        let analysis: &'p TypeAnalysis<'src> = self.analysis;
        analysis
            .expr_info(id)
            .ref_info
            .as_ref()
            .expect("names are resolved by the type checker")
    }

    fn field_key(&self, id: ExprId) -> (ClassDefId<'src>, Symbol<'src>) {
        match self.ref_info(id) {
            RefInfo::Field(field) => (field.owner, field.name),
            other => unreachable!("field access refers to {:?}", other),
        }
    }

    fn lookup_var(&self, name: Symbol<'src>) -> Value<'src> {
        self.state
            .lookup(name)
            .cloned()
            .expect("variables are defined before use")
    }

    fn this(&self) -> Value<'src> {
        self.state
            .this()
            .cloned()
            .expect("'this' is only used in instance methods")
    }

    fn this_object(&self) -> ObjectRef<'src> {
        match self.this() {
            Value::Object(object) => object,
            other => unreachable!("'this' is {:?}", other),
        }
    }
}

fn default_value<'src>(ty: &ast::Type<'src>) -> Value<'src> {
    if ty.array_depth > 0 {
        return Value::Null;
    }
    match ty.basic.data {
        ast::BasicType::Int => Value::Int(0),
        ast::BasicType::Long => Value::Long(0),
        ast::BasicType::Char => Value::Char(0),
        ast::BasicType::Boolean => Value::Boolean(false),
        ast::BasicType::Void | ast::BasicType::Custom(_) => Value::Null,
    }
}

fn expect_object<'src>(value: Value<'src>, span: Span<'src>) -> EvalResult<'src, ObjectRef<'src>> {
    match value {
        Value::Object(object) => Ok(object),
        Value::Null => Err(fail(span, RuntimeError::NullPointerDereference)),
        other => unreachable!("{:?} is not an object", other),
    }
}

fn expect_array<'src>(value: Value<'src>, span: Span<'src>) -> EvalResult<'src, ArrayRef<'src>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Err(fail(span, RuntimeError::NullPointerDereference)),
        other => unreachable!("{:?} is not an array", other),
    }
}

fn array_index<'src>(
    items: &ArrayRef<'src>,
    index: &Value<'src>,
    span: Span<'src>,
) -> EvalResult<'src, usize> {
    let index = index.as_i64().expect("indices are checked to be int") as i32;
    let length = items.borrow().len();
    if index < 0 || index as usize >= length {
        return Err(fail(span, RuntimeError::IndexOutOfBounds { index, length }));
    }
    Ok(index as usize)
}
