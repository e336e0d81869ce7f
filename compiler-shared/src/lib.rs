#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]

//! State that every compiler phase needs: the source file and the
//! diagnostics sink it reports to.

pub mod context;
