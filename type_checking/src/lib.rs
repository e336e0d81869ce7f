#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]

//! Semantic analysis of MiniJava programs.
//!
//! The checker registers all classes in a `TypeSystem`, checks every method
//! body and records the type of each expression in a `TypeAnalysis`. Numeric
//! operands of mixed width are widened by implicit casts that are inserted
//! into the expression arena.

mod builtin_types;
pub mod checker;
mod method_body_type_checker;
pub mod semantics;
pub mod type_analysis;
pub mod type_system;

pub use self::{
    checker::check,
    semantics::SemanticError,
    type_analysis::{ExprInfo, RefInfo, TypeAnalysis},
    type_system::{BuiltinMethod, CheckedType, ClassDefId, TypeSystem},
};
