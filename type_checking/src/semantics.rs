use asciifile::Spanned;
use failure::Fail;
use parser::ast::IntLiteralError;

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum SemanticError {
    #[fail(display = "redefinition of {} '{}'", kind, name)]
    RedefinitionError {
        kind: String, // "class", "parameter", ...
        name: String, // name of the parameter class...
    },

    #[fail(display = "class '{}' does not exist", class_name)]
    ClassDoesNotExist { class_name: String },

    #[fail(display = "'{}' is not an interface", name)]
    NotAnInterface { name: String },

    #[fail(display = "cannot extend interface '{}', use 'implements'", name)]
    CannotExtendInterface { name: String },

    #[fail(display = "cyclic inheritance involving '{}'", name)]
    CyclicInheritance { name: String },

    #[fail(display = "void is not allowed in this context")]
    VoidNotAllowed,

    #[fail(display = "static fields are not supported")]
    StaticFieldNotSupported,

    #[fail(display = "interfaces cannot declare fields")]
    FieldInInterface,

    #[fail(display = "interface method '{}' cannot have a body", method_name)]
    InterfaceMethodWithBody { method_name: String },

    #[fail(display = "method '{}' is missing a body", method_name)]
    MissingMethodBody { method_name: String },

    #[fail(display = "abstract method '{}' cannot have a body", method_name)]
    AbstractMethodWithBody { method_name: String },

    #[fail(
        display = "class '{}' must be declared abstract to declare the abstract method '{}'",
        class_name, method_name
    )]
    AbstractMethodInConcreteClass {
        class_name: String,
        method_name: String,
    },

    #[fail(
        display = "method '{}' overrides a method of '{}' with a different signature",
        method_name, overridden_in
    )]
    OverrideSignatureMismatch {
        method_name: String,
        overridden_in: String,
    },

    #[fail(
        display = "class '{}' does not implement method '{}' of '{}'",
        class_name, method_name, declared_in
    )]
    MissingMethodImplementation {
        class_name: String,
        method_name: String,
        declared_in: String,
    },

    #[fail(display = "no 'public static void main' method found")]
    NoMainMethod,

    #[fail(display = "{}. definition of a main method, only one is allowed", amount)]
    MultipleMainMethods { amount: usize },

    #[fail(display = "the main method must be declared as 'public static void main(String[] args)'")]
    InvalidMainSignature,

    #[fail(display = "usage of the parameter '{}' of the main method", name)]
    MainMethodParamUsed { name: String },

    #[fail(display = "condition must be boolean, but has type {}", ty)]
    ConditionMustBeBoolean { ty: String },

    #[fail(display = "invalid type: expected {}, found {}", ty_expected, ty_expr)]
    InvalidType {
        ty_expected: String,
        ty_expr: String,
    },

    #[fail(
        display = "operands should have the same type, but the left operand has type {} and \
                   the right operand has type {}",
        lhs, rhs
    )]
    OperandsMustHaveSameType { lhs: String, rhs: String },

    #[fail(display = "operator '{}' cannot be applied to values of type {}", op, ty)]
    InvalidOperandType { op: String, ty: String },

    #[fail(
        display = "operator '{}' cannot be applied to operands of type {} and {}",
        op, lhs, rhs
    )]
    InvalidOperandTypes { op: String, lhs: String, rhs: String },

    #[fail(display = "cannot cast from {} to {}", from, to)]
    InvalidCast { from: String, to: String },

    #[fail(display = "{}", _0)]
    IntLiteral(IntLiteralError),

    #[fail(display = "cannot find variable '{}'{}", name, suggestion)]
    CannotLookupVarOrField { name: String, suggestion: String },

    #[fail(display = "cannot use class '{}' as a value", class_name)]
    InvalidReferenceToClass { class_name: String },

    #[fail(display = "field '{}' does not exist on type {}", field_name, ty)]
    FieldDoesNotExistOnType { field_name: String, ty: String },

    #[fail(display = "method '{}' does not exist on type {}", method_name, ty)]
    MethodDoesNotExistOnType { method_name: String, ty: String },

    #[fail(
        display = "method argument count does not match: expected {} arguments, but found {}",
        expected_args, actual_args
    )]
    MethodArgCountDoesNotMatch {
        expected_args: usize,
        actual_args: usize,
    },

    #[fail(display = "cannot print a value of type {}", ty)]
    CannotPrintType { ty: String },

    #[fail(display = "cannot index a value of non-array type {}", ty)]
    CannotIndexNonArrayType { ty: String },

    #[fail(display = "cannot instantiate {} '{}'", kind, name)]
    CannotInstantiate { kind: String, name: String },

    #[fail(display = "non-static variable 'this' cannot be referenced from a static context")]
    ThisInStaticMethod,

    #[fail(display = "non-static variable 'super' cannot be referenced from a static context")]
    SuperInStaticMethod,

    #[fail(display = "'super' cannot be used in class '{}' which has no parent", class_name)]
    SuperWithoutParent { class_name: String },

    #[fail(
        display = "non-static method '{}' cannot be referenced from a static context",
        method_name
    )]
    ThisMethodInvocationInStaticMethod { method_name: String },

    #[fail(
        display = "non-static field '{}' cannot be referenced from a static context",
        field_name
    )]
    CannotAccessNonStaticFieldInStaticMethod { field_name: String },

    #[fail(display = "static method '{}' cannot be called on an object", method_name)]
    CannotCallStaticMethod { method_name: String },

    #[fail(display = "left-hand side of an assignment must be a variable, field or array element")]
    InvalidAssignment,

    #[fail(display = "cannot write to read-only field '{}'", field_name)]
    CannotWriteToReadOnlyField { field_name: String },

    #[fail(display = "method must return a value of type {}", ty)]
    MethodMustReturnSomething { ty: String },

    #[fail(display = "void method cannot return a value")]
    VoidMethodCannotReturnValue,

    #[fail(display = "method '{}' might not return", method_name)]
    MightNotReturn { method_name: String },
}

/// An error after which the type of an expression cannot be determined.
/// It is not reported where it is detected, but handed up to the nearest
/// enclosing node that can continue with a fallback type, which reports it.
#[derive(Debug)]
pub struct Unrecoverable<'src> {
    pub error: Spanned<'src, SemanticError>,
}

impl<'src> Unrecoverable<'src> {
    pub fn new(error: Spanned<'src, SemanticError>) -> Self {
        Unrecoverable { error }
    }
}
