#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]

//! The compiler pipeline behind the command line: lexing, parsing, type
//! checking, then printing, lowering or interpreting the program.

pub mod driver;
pub mod print;

pub use self::driver::{Action, CompilationFailed, Driver};
