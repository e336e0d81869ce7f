//! Low level intermediate representation
//!
//! A LIR program is a list of functions, each a list of labelled basic
//! blocks. Values are typed virtual registers or typed constants, both
//! referred to by a `ValueHandle`. Locals live in stack slots created by
//! `alloca`, so there are no phi nodes.
use derive_more::Display;
use itertools::Itertools;
use parser::ast::IntPredicate;
use std::{fmt, io};

pub type Label = String;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    #[display(fmt = "void")]
    Void,
    #[display(fmt = "i1")]
    Bool,
    /// `char` is an unsigned 16 bit integer
    #[display(fmt = "i16")]
    Char,
    #[display(fmt = "i32")]
    Int,
    #[display(fmt = "i64")]
    Long,
    /// Objects, arrays, strings and stack slots
    #[display(fmt = "ptr")]
    Ptr,
}

impl IrType {
    /// Size in bytes of a value of this type in memory.
    pub fn size(self) -> u32 {
        match self {
            IrType::Void => 0,
            IrType::Bool => 1,
            IrType::Char => 2,
            IrType::Int => 4,
            IrType::Long | IrType::Ptr => 8,
        }
    }

    pub fn is_integer(self) -> bool {
        match self {
            IrType::Bool | IrType::Char | IrType::Int | IrType::Long => true,
            IrType::Void | IrType::Ptr => false,
        }
    }
}

/// A typed value: either the result of an instruction or a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueHandle {
    Reg { num: usize, ty: IrType },
    Const { value: i64, ty: IrType },
}

impl ValueHandle {
    pub fn constant(ty: IrType, value: i64) -> Self {
        ValueHandle::Const { value, ty }
    }

    /// The result of a call without return value.
    pub fn void() -> Self {
        ValueHandle::Const {
            value: 0,
            ty: IrType::Void,
        }
    }

    pub fn ty(self) -> IrType {
        match self {
            ValueHandle::Reg { ty, .. } | ValueHandle::Const { ty, .. } => ty,
        }
    }
}

impl fmt::Display for ValueHandle {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueHandle::Reg { num, .. } => write!(fmt, "%{}", num),
            ValueHandle::Const { ty: IrType::Ptr, .. } => write!(fmt, "null"),
            ValueHandle::Const { value, .. } => write!(fmt, "{}", value),
        }
    }
}

/// A value together with its type, the way operands are printed.
struct Typed(ValueHandle);

impl fmt::Display for Typed {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} {}", self.0.ty(), self.0)
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum BinopKind {
    #[display(fmt = "add")]
    Add,
    #[display(fmt = "sub")]
    Sub,
    #[display(fmt = "mul")]
    Mul,
    #[display(fmt = "sdiv")]
    Div,
    #[display(fmt = "srem")]
    Mod,
    #[display(fmt = "and")]
    And,
    #[display(fmt = "or")]
    Or,
    #[display(fmt = "xor")]
    Xor,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum UnopKind {
    #[display(fmt = "neg")]
    Neg,
    #[display(fmt = "not")]
    Not,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ConvKind {
    /// Sign extension, for `int` to `long`
    #[display(fmt = "sext")]
    Sext,
    /// Zero extension, for `char` to anything wider
    #[display(fmt = "zext")]
    Zext,
    #[display(fmt = "trunc")]
    Trunc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Call exactly the named function
    Static,
    /// Call the implementation of the named method for the runtime class
    /// of the first argument
    Virtual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Alloca {
        ty: IrType,
        dst: ValueHandle,
    },
    Load {
        slot: ValueHandle,
        dst: ValueHandle,
    },
    Store {
        src: ValueHandle,
        slot: ValueHandle,
    },
    Binop {
        kind: BinopKind,
        lhs: ValueHandle,
        rhs: ValueHandle,
        dst: ValueHandle,
    },
    Unop {
        kind: UnopKind,
        src: ValueHandle,
        dst: ValueHandle,
    },
    ICmp {
        pred: IntPredicate,
        lhs: ValueHandle,
        rhs: ValueHandle,
        dst: ValueHandle,
    },
    Conv {
        kind: ConvKind,
        src: ValueHandle,
        dst: ValueHandle,
    },
    /// Address of a field, `field` is `Class.name`
    FieldAddr {
        object: ValueHandle,
        field: String,
        dst: ValueHandle,
    },
    /// Address of an array element
    ElemAddr {
        elem_ty: IrType,
        array: ValueHandle,
        index: ValueHandle,
        dst: ValueHandle,
    },
    /// Pointer to a constant string object
    Str {
        text: String,
        dst: ValueHandle,
    },
    /// `dst` is `None` for functions without return value.
    Call {
        func: String,
        dispatch: Dispatch,
        args: Vec<ValueHandle>,
        dst: Option<ValueHandle>,
    },
    Jmp {
        target: Label,
    },
    Branch {
        cond: ValueHandle,
        then_target: Label,
        else_target: Label,
    },
    Ret {
        value: Option<ValueHandle>,
    },
    Unreachable,
    Comment(String),
}

impl Instr {
    /// Terminators end a basic block.
    pub fn is_terminator(&self) -> bool {
        match self {
            Instr::Jmp { .. } | Instr::Branch { .. } | Instr::Ret { .. } | Instr::Unreachable => {
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::Instr::*;
        match self {
            Alloca { ty, dst } => write!(fmt, "{} = alloca {}", dst, ty),
            Load { slot, dst } => write!(fmt, "{} = load {}, {}", dst, dst.ty(), Typed(*slot)),
            Store { src, slot } => write!(fmt, "store {}, {}", Typed(*src), Typed(*slot)),
            Binop {
                kind,
                lhs,
                rhs,
                dst,
            } => write!(fmt, "{} = {} {}, {}", dst, kind, Typed(*lhs), rhs),
            Unop { kind, src, dst } => write!(fmt, "{} = {} {}", dst, kind, Typed(*src)),
            ICmp {
                pred,
                lhs,
                rhs,
                dst,
            } => write!(fmt, "{} = icmp {} {}, {}", dst, pred, Typed(*lhs), rhs),
            Conv { kind, src, dst } => {
                write!(fmt, "{} = {} {} to {}", dst, kind, Typed(*src), dst.ty())
            }
            FieldAddr { object, field, dst } => {
                write!(fmt, "{} = field {}, {}", dst, Typed(*object), field)
            }
            ElemAddr {
                elem_ty,
                array,
                index,
                dst,
            } => write!(
                fmt,
                "{} = elem {}, {}, {}",
                dst,
                elem_ty,
                Typed(*array),
                Typed(*index)
            ),
            Str { text, dst } => write!(fmt, "{} = string \"{}\"", dst, text.escape_default()),
            Call {
                func,
                dispatch,
                args,
                dst,
            } => {
                if let Some(dst) = dst {
                    write!(fmt, "{} = ", dst)?;
                }
                let ret = dst.map_or(IrType::Void, ValueHandle::ty);
                let kind = match dispatch {
                    Dispatch::Static => "call",
                    Dispatch::Virtual => "call virtual",
                };
                write!(
                    fmt,
                    "{} {} @{}({})",
                    kind,
                    ret,
                    func,
                    args.iter().map(|arg| Typed(*arg)).join(", ")
                )
            }
            Jmp { target } => write!(fmt, "br label %{}", target),
            Branch {
                cond,
                then_target,
                else_target,
            } => write!(
                fmt,
                "br {}, label %{}, label %{}",
                Typed(*cond),
                then_target,
                else_target
            ),
            Ret { value: Some(value) } => write!(fmt, "ret {}", Typed(*value)),
            Ret { value: None } => write!(fmt, "ret void"),
            Unreachable => write!(fmt, "unreachable"),
            Comment(text) => write!(fmt, "; {}", text),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub label: Label,
    pub instrs: Vec<Instr>,
}

impl Block {
    pub fn new(label: Label) -> Block {
        Block {
            label,
            instrs: Vec::new(),
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.instrs.last().map_or(false, Instr::is_terminator)
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    /// `Class.method`
    pub name: String,
    pub params: Vec<ValueHandle>,
    pub ret: IrType,
    /// The first block is the entry block.
    pub blocks: Vec<Block>,
}

#[derive(Debug, Default)]
pub struct Program {
    pub functions: Vec<Function>,
}

impl Program {
    pub fn new() -> Program {
        Program::default()
    }

    pub fn add_function(&mut self, function: Function) {
        assert!(!function.name.chars().any(char::is_whitespace));
        self.functions.push(function);
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|function| function.name == name)
    }

    pub fn emit(&self, out: &mut impl io::Write) -> io::Result<()> {
        for (i, function) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            function.emit(out)?;
        }
        Ok(())
    }
}

impl Function {
    pub fn emit(&self, out: &mut impl io::Write) -> io::Result<()> {
        writeln!(
            out,
            "define {} @{}({}) {{",
            self.ret,
            self.name,
            self.params.iter().map(|param| Typed(*param)).join(", ")
        )?;
        for block in &self.blocks {
            writeln!(out, "{}:", block.label)?;
            for instr in &block.instrs {
                writeln!(out, "  {}", instr)?;
            }
        }
        writeln!(out, "}}")
    }
}

/// Creates instructions and appends them at the current position.
///
/// Implementors only manage value numbering and the block structure, the
/// `build_*` methods are provided on top of that.
pub trait InstructionBuilder {
    /// A fresh virtual register of type `ty`.
    fn new_value(&mut self, ty: IrType) -> ValueHandle;

    /// Append `instr` to the current block.
    fn push(&mut self, instr: Instr);

    /// Append `instr` to the allocations at the start of the entry block.
    fn push_alloca(&mut self, instr: Instr);

    /// Create a new, empty block. `hint` becomes part of its label.
    fn append_block(&mut self, hint: &str) -> Label;

    /// Continue appending instructions to the end of block `label`.
    fn position_at_end(&mut self, label: &str);

    /// Whether the current block already ends in a terminator.
    fn is_terminated(&self) -> bool;

    fn build_icmp(&mut self, pred: IntPredicate, lhs: ValueHandle, rhs: ValueHandle) -> ValueHandle {
        debug_assert_eq!(lhs.ty(), rhs.ty(), "icmp {}", pred);
        let dst = self.new_value(IrType::Bool);
        self.push(Instr::ICmp {
            pred,
            lhs,
            rhs,
            dst,
        });
        dst
    }

    fn build_binop(&mut self, kind: BinopKind, lhs: ValueHandle, rhs: ValueHandle) -> ValueHandle {
        debug_assert_eq!(lhs.ty(), rhs.ty(), "{}", kind);
        let dst = self.new_value(lhs.ty());
        self.push(Instr::Binop {
            kind,
            lhs,
            rhs,
            dst,
        });
        dst
    }

    fn build_unop(&mut self, kind: UnopKind, src: ValueHandle) -> ValueHandle {
        let dst = self.new_value(src.ty());
        self.push(Instr::Unop { kind, src, dst });
        dst
    }

    /// Convert between integer types. `src` is returned as is if it already
    /// has type `to`.
    fn build_conv(&mut self, src: ValueHandle, to: IrType) -> ValueHandle {
        let from = src.ty();
        if from == to {
            return src;
        }
        let kind = if to.size() < from.size() {
            ConvKind::Trunc
        } else if from == IrType::Char {
            ConvKind::Zext
        } else {
            ConvKind::Sext
        };
        let dst = self.new_value(to);
        self.push(Instr::Conv { kind, src, dst });
        dst
    }

    /// A stack slot for a value of type `ty`.
    fn build_alloca(&mut self, ty: IrType) -> ValueHandle {
        let dst = self.new_value(IrType::Ptr);
        self.push_alloca(Instr::Alloca { ty, dst });
        dst
    }

    fn build_load(&mut self, ty: IrType, slot: ValueHandle) -> ValueHandle {
        let dst = self.new_value(ty);
        self.push(Instr::Load { slot, dst });
        dst
    }

    fn build_store(&mut self, src: ValueHandle, slot: ValueHandle) {
        self.push(Instr::Store { src, slot });
    }

    fn build_field_addr(&mut self, object: ValueHandle, field: String) -> ValueHandle {
        let dst = self.new_value(IrType::Ptr);
        self.push(Instr::FieldAddr { object, field, dst });
        dst
    }

    fn build_elem_addr(
        &mut self,
        elem_ty: IrType,
        array: ValueHandle,
        index: ValueHandle,
    ) -> ValueHandle {
        let dst = self.new_value(IrType::Ptr);
        self.push(Instr::ElemAddr {
            elem_ty,
            array,
            index,
            dst,
        });
        dst
    }

    fn build_str(&mut self, text: &str) -> ValueHandle {
        let dst = self.new_value(IrType::Ptr);
        self.push(Instr::Str {
            text: text.to_string(),
            dst,
        });
        dst
    }

    /// Returns `ValueHandle::void()` if `ret` is `IrType::Void`.
    fn build_call(
        &mut self,
        func: String,
        dispatch: Dispatch,
        args: Vec<ValueHandle>,
        ret: IrType,
    ) -> ValueHandle {
        let dst = match ret {
            IrType::Void => None,
            ty => Some(self.new_value(ty)),
        };
        self.push(Instr::Call {
            func,
            dispatch,
            args,
            dst,
        });
        dst.unwrap_or_else(ValueHandle::void)
    }

    fn build_jmp(&mut self, target: &str) {
        self.push(Instr::Jmp {
            target: target.to_string(),
        });
    }

    fn build_branch(&mut self, cond: ValueHandle, then_target: &str, else_target: &str) {
        self.push(Instr::Branch {
            cond,
            then_target: then_target.to_string(),
            else_target: else_target.to_string(),
        });
    }

    fn build_ret(&mut self, value: Option<ValueHandle>) {
        self.push(Instr::Ret { value });
    }
}

/// Builds one `Function`, block by block.
#[derive(Debug)]
pub struct FunctionBuilder {
    function: Function,
    current: usize,
    allocas: usize,
    value_counter: usize,
    label_counter: usize,
}

impl FunctionBuilder {
    /// Parameters are the first values of the function, `%0` to `%n-1`.
    pub fn new(name: String, params: &[IrType], ret: IrType) -> FunctionBuilder {
        let params = params
            .iter()
            .enumerate()
            .map(|(num, ty)| ValueHandle::Reg { num, ty: *ty })
            .collect::<Vec<_>>();
        FunctionBuilder {
            value_counter: params.len(),
            function: Function {
                name,
                params,
                ret,
                blocks: vec![Block::new("entry".to_string())],
            },
            current: 0,
            allocas: 0,
            label_counter: 0,
        }
    }

    pub fn param(&self, idx: usize) -> ValueHandle {
        self.function.params[idx]
    }

    pub fn ret(&self) -> IrType {
        self.function.ret
    }

    pub fn finish(self) -> Function {
        self.function
    }
}

impl InstructionBuilder for FunctionBuilder {
    fn new_value(&mut self, ty: IrType) -> ValueHandle {
        let num = self.value_counter;
        self.value_counter += 1;
        ValueHandle::Reg { num, ty }
    }

    fn push(&mut self, instr: Instr) {
        let block = &mut self.function.blocks[self.current];
        debug_assert!(!block.is_terminated(), "{} is terminated", block.label);
        block.instrs.push(instr);
    }

    fn push_alloca(&mut self, instr: Instr) {
        self.function.blocks[0].instrs.insert(self.allocas, instr);
        self.allocas += 1;
    }

    fn append_block(&mut self, hint: &str) -> Label {
        let label = format!("{}{}", hint, self.label_counter);
        self.label_counter += 1;
        self.function.blocks.push(Block::new(label.clone()));
        label
    }

    fn position_at_end(&mut self, label: &str) {
        self.current = self
            .function
            .blocks
            .iter()
            .position(|block| block.label == label)
            .expect("blocks are created before they are entered");
    }

    fn is_terminated(&self) -> bool {
        self.function.blocks[self.current].is_terminated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitted(function: Function) -> String {
        let mut program = Program::new();
        program.add_function(function);
        let mut out = Vec::new();
        program.emit(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[rustfmt::skip]
    #[test]
    fn fib() {
        let expected = "\
define i32 @Math.fib(ptr %0, i32 %1) {
entry:
  %2 = icmp sle i32 %1, 1
  br i1 %2, label %basecase0, label %recurse1
basecase0:
  ret i32 %1
recurse1:
  %3 = sub i32 %1, 1
  %4 = call virtual i32 @Math.fib(ptr %0, i32 %3)
  %5 = sub i32 %1, 2
  %6 = call virtual i32 @Math.fib(ptr %0, i32 %5)
  %7 = add i32 %4, %6
  ret i32 %7
}
";
        let mut fib = FunctionBuilder::new(
            "Math.fib".to_string(),
            &[IrType::Ptr, IrType::Int],
            IrType::Int,
        );
        let this = fib.param(0);
        let n = fib.param(1);
        let one = ValueHandle::constant(IrType::Int, 1);
        let two = ValueHandle::constant(IrType::Int, 2);

        let is_base = fib.build_icmp(IntPredicate::Sle, n, one);
        let basecase = fib.append_block("basecase");
        let recurse = fib.append_block("recurse");
        fib.build_branch(is_base, &basecase, &recurse);

        fib.position_at_end(&basecase);
        fib.build_ret(Some(n));

        fib.position_at_end(&recurse);
        let mut call = |fib: &mut FunctionBuilder, arg| {
            fib.build_call("Math.fib".to_string(), Dispatch::Virtual, vec![this, arg], IrType::Int)
        };
        let n1 = fib.build_binop(BinopKind::Sub, n, one);
        let r1 = call(&mut fib, n1);
        let n2 = fib.build_binop(BinopKind::Sub, n, two);
        let r2 = call(&mut fib, n2);
        let sum = fib.build_binop(BinopKind::Add, r1, r2);
        fib.build_ret(Some(sum));

        assert!(fib.is_terminated());
        assert_eq!(expected, emitted(fib.finish()));
    }

    #[test]
    fn allocas_go_to_the_entry_block() {
        let mut f = FunctionBuilder::new("A.f".to_string(), &[], IrType::Void);
        let body = f.append_block("body");
        f.build_jmp(&body);
        f.position_at_end(&body);
        let slot = f.build_alloca(IrType::Char);
        f.build_store(ValueHandle::constant(IrType::Char, 97), slot);
        let c = f.build_load(IrType::Char, slot);
        let wide = f.build_conv(c, IrType::Long);
        assert_eq!(wide, f.build_conv(wide, IrType::Long));
        let narrow = f.build_conv(wide, IrType::Int);
        f.build_call("mj.println.i32".to_string(), Dispatch::Static, vec![narrow], IrType::Void);
        f.build_ret(None);

        let expected = "\
define void @A.f() {
entry:
  %0 = alloca i16
  br label %body0
body0:
  store i16 97, ptr %0
  %1 = load i16, ptr %0
  %2 = zext i16 %1 to i64
  %3 = trunc i64 %2 to i32
  call void @mj.println.i32(i32 %3)
  ret void
}
";
        assert_eq!(expected, emitted(f.finish()));
    }

    #[test]
    fn constants_print_with_their_type() {
        let null = ValueHandle::constant(IrType::Ptr, 0);
        assert_eq!("ptr null", Typed(null).to_string());
        assert_eq!("i1 1", Typed(ValueHandle::constant(IrType::Bool, 1)).to_string());
        assert_eq!(IrType::Void, ValueHandle::void().ty());
        let s = Instr::Str {
            text: "a\"b\n".to_string(),
            dst: ValueHandle::Reg {
                num: 3,
                ty: IrType::Ptr,
            },
        };
        assert_eq!(r#"%3 = string "a\"b\n""#, s.to_string());
    }
}
