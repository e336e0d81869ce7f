use crate::runtime_error::RuntimeError;
use itertools::Itertools;
use parser::ast::{BinaryOp, CompareOp};
use std::{cell::RefCell, cmp::Ordering, collections::HashMap, fmt, rc::Rc};
use strtab::Symbol;
use type_checking::{CheckedType, ClassDefId};

pub type ObjectRef<'src> = Rc<RefCell<Object<'src>>>;
pub type ArrayRef<'src> = Rc<RefCell<Vec<Value<'src>>>>;

/// A heap allocated instance of a class.
///
/// Fields are keyed by the class that declares them, so a field of a
/// subclass can hide an inherited one of the same name.
#[derive(Debug)]
pub struct Object<'src> {
    pub class: ClassDefId<'src>,
    pub fields: HashMap<(ClassDefId<'src>, Symbol<'src>), Value<'src>>,
}

/// Arithmetic with Java's overflow behaviour. `MIN / -1` is `MIN`.
macro_rules! int_op {
    ($ty:ty, $op:expr, $lhs:expr, $rhs:expr) => {{
        let (lhs, rhs): ($ty, $ty) = ($lhs, $rhs);
        match $op {
            BinaryOp::Add => Ok(lhs.wrapping_add(rhs)),
            BinaryOp::Sub => Ok(lhs.wrapping_sub(rhs)),
            BinaryOp::Mul => Ok(lhs.wrapping_mul(rhs)),
            BinaryOp::Div if rhs == 0 => Err(RuntimeError::DivisionByZero),
            BinaryOp::Div => Ok(lhs.wrapping_div(rhs)),
            BinaryOp::Mod if rhs == 0 => Err(RuntimeError::DivisionByZero),
            BinaryOp::Mod => Ok(lhs.wrapping_rem(rhs)),
            BinaryOp::BitAnd => Ok(lhs & rhs),
            BinaryOp::BitOr => Ok(lhs | rhs),
            BinaryOp::BitXor => Ok(lhs ^ rhs),
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
                unreachable!("logical operators are evaluated lazily")
            }
        }
    }};
}

#[derive(Debug, Clone)]
pub enum Value<'src> {
    /// Result of calling a method without return value
    Void,
    Null,
    Boolean(bool),
    /// Unsigned 16 bit, as in Java
    Char(u16),
    Int(i32),
    Long(i64),
    Str(Rc<str>),
    Object(ObjectRef<'src>),
    Array(ArrayRef<'src>),
}

impl<'src> Value<'src> {
    /// The value of a field or array element that was never assigned.
    pub fn zero(ty: &CheckedType<'src>) -> Value<'src> {
        match ty {
            CheckedType::Boolean => Value::Boolean(false),
            CheckedType::Char => Value::Char(0),
            CheckedType::Int => Value::Int(0),
            CheckedType::Long => Value::Long(0),
            CheckedType::Void => Value::Void,
            CheckedType::String
            | CheckedType::Null
            | CheckedType::TypeRef(_)
            | CheckedType::Array(_)
            | CheckedType::Error => Value::Null,
        }
    }

    pub fn from_char(c: char) -> Value<'src> {
        Value::Char(c as u32 as u16)
    }

    pub fn new_str(s: &str) -> Value<'src> {
        Value::Str(Rc::from(s))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric values widened to 64 bit. Chars are zero extended.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Char(c) => Some(i64::from(*c)),
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            _ => false,
        }
    }

    /// Compare `self` to `other` with the operator `op`.
    ///
    /// Numbers are compared by value after widening, booleans and strings
    /// by value, objects and arrays by identity. `null` only equals
    /// `null`. Ordering operators are false for anything but numbers.
    pub fn compare(&self, op: CompareOp, other: &Value<'src>) -> bool {
        if let (Some(lhs), Some(rhs)) = (self.as_i64(), other.as_i64()) {
            return holds(op, lhs.cmp(&rhs));
        }
        let equal = match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        match op {
            CompareOp::Eq => equal,
            CompareOp::Ne => !equal,
            CompareOp::Lt | CompareOp::Gt | CompareOp::Le | CompareOp::Ge => false,
        }
    }

    /// Convert a numeric value to the numeric type `target`, truncating or
    /// extending as needed. Everything else is returned unchanged.
    pub fn convert(self, target: &CheckedType<'src>) -> Value<'src> {
        let wide = match self.as_i64() {
            Some(wide) => wide,
            None => return self,
        };
        match target {
            CheckedType::Char => Value::Char(wide as u16),
            CheckedType::Int => Value::Int(wide as i32),
            CheckedType::Long => Value::Long(wide),
            _ => self,
        }
    }

    /// Evaluate `self op other` for the arithmetic and bitwise operators.
    ///
    /// The type checker promotes both operands to the same type, so only
    /// string concatenation mixes kinds of values. Integer arithmetic
    /// wraps on overflow.
    pub fn binary(self, op: BinaryOp, other: Value<'src>) -> Result<Value<'src>, RuntimeError> {
        match (self, other) {
            (lhs @ Value::Str(_), rhs) | (lhs, rhs @ Value::Str(_)) if op == BinaryOp::Add => {
                Ok(Value::Str(Rc::from(format!("{}{}", lhs, rhs))))
            }
            (Value::Boolean(lhs), Value::Boolean(rhs)) => Ok(Value::Boolean(match op {
                BinaryOp::BitAnd | BinaryOp::LogicalAnd => lhs & rhs,
                BinaryOp::BitOr | BinaryOp::LogicalOr => lhs | rhs,
                BinaryOp::BitXor => lhs ^ rhs,
                _ => unreachable!("arithmetic on booleans does not type check"),
            })),
            (Value::Int(lhs), Value::Int(rhs)) => Ok(Value::Int(int_op!(i32, op, lhs, rhs)?)),
            (lhs, rhs) => {
                let (lhs, rhs) = match (lhs.as_i64(), rhs.as_i64()) {
                    (Some(lhs), Some(rhs)) => (lhs, rhs),
                    _ => unreachable!("operands of arithmetic are numbers"),
                };
                Ok(Value::Long(int_op!(i64, op, lhs, rhs)?))
            }
        }
    }
}

fn holds(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}

/// The way `System.out.println` prints a value.
impl<'src> fmt::Display for Value<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Char(c) => write!(
                f,
                "{}",
                std::char::from_u32(u32::from(*c)).unwrap_or(std::char::REPLACEMENT_CHARACTER)
            ),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(l) => write!(f, "{}", l),
            Value::Str(s) => write!(f, "{}", s),
            Value::Object(obj) => write!(f, "{}@{:p}", obj.borrow().class, Rc::as_ptr(obj)),
            Value::Array(items) => write!(f, "[{}]", items.borrow().iter().join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn numbers_compare_after_widening() {
        let a = Value::from_char('a');
        assert!(a.compare(CompareOp::Lt, &Value::Int(98)));
        assert!(a.compare(CompareOp::Eq, &Value::Long(97)));
        assert!(Value::Int(-1).compare(CompareOp::Lt, &Value::Char(0)));
        assert!(Value::Long(1 << 40).compare(CompareOp::Gt, &Value::Int(std::i32::MAX)));
    }

    #[test]
    fn every_operator_agrees_with_integer_comparison() {
        for op in CompareOp::iter() {
            for (lhs, rhs) in &[(1, 2), (2, 2), (3, 2)] {
                let expected = holds(op, lhs.cmp(rhs));
                assert_eq!(
                    expected,
                    Value::Int(*lhs).compare(op, &Value::Int(*rhs)),
                    "{} {} {}",
                    lhs,
                    op,
                    rhs
                );
            }
        }
    }

    #[test]
    fn references_compare_by_identity() {
        let array: ArrayRef<'_> = Rc::new(RefCell::new(vec![Value::Int(1)]));
        let same = Value::Array(Rc::clone(&array));
        let equal_content = Value::Array(Rc::new(RefCell::new(vec![Value::Int(1)])));

        assert!(Value::Array(array).compare(CompareOp::Eq, &same));
        assert!(same.compare(CompareOp::Ne, &equal_content));
        assert!(!same.compare(CompareOp::Eq, &Value::Null));
        assert!(Value::Null.compare(CompareOp::Eq, &Value::Null));
        assert!(Value::new_str("ab").compare(CompareOp::Eq, &Value::new_str("ab")));
        assert!(Value::Boolean(true).compare(CompareOp::Ne, &Value::Boolean(false)));
        assert!(!Value::Boolean(true).compare(CompareOp::Lt, &Value::Boolean(false)));
    }

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(
            "-2147483648",
            Value::Int(std::i32::MAX)
                .binary(BinaryOp::Add, Value::Int(1))
                .unwrap()
                .to_string()
        );
        assert_eq!(
            "-2147483648",
            Value::Int(std::i32::MIN)
                .binary(BinaryOp::Div, Value::Int(-1))
                .unwrap()
                .to_string()
        );
        assert_eq!(
            "-1",
            Value::Int(-7)
                .binary(BinaryOp::Mod, Value::Int(3))
                .unwrap()
                .to_string()
        );
        assert_eq!(
            Err(RuntimeError::DivisionByZero),
            Value::Long(1).binary(BinaryOp::Div, Value::Long(0)).map(|_| ())
        );
    }

    #[test]
    fn concatenation_formats_both_sides() {
        let s = Value::new_str("x")
            .binary(BinaryOp::Add, Value::Int(1))
            .unwrap()
            .binary(BinaryOp::Add, Value::from_char('c'))
            .unwrap()
            .binary(BinaryOp::Add, Value::Null)
            .unwrap();
        assert_eq!("x1cnull", s.to_string());
        let prefixed = Value::Boolean(true)
            .binary(BinaryOp::Add, Value::new_str("!"))
            .unwrap();
        assert_eq!("true!", prefixed.to_string());
    }

    #[test]
    fn conversions() {
        assert_eq!("A", Value::Int(65601).convert(&CheckedType::Char).to_string());
        assert_eq!("-4", Value::Long(8_589_934_588).convert(&CheckedType::Int).to_string());
        assert_eq!("65535", Value::Char(0xffff).convert(&CheckedType::Long).to_string());
        assert_eq!(
            "65535",
            Value::Int(-1)
                .convert(&CheckedType::Char)
                .convert(&CheckedType::Int)
                .to_string()
        );
        assert_eq!("true", Value::Boolean(true).convert(&CheckedType::Int).to_string());
    }
}
