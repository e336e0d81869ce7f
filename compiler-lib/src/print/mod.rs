pub mod lextest;
pub mod pretty;
