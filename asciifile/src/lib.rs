//! Represents an input file that may only contain ASCII characters. The
//! abstractions `Position` and `Span` are index-less handles on a single
//! character, respectively an inclusive range of characters, that know
//! their line and column.
pub mod file;
pub mod iter;
pub mod maybe_spanned;
pub mod position;
pub mod span;
pub mod spanned;

pub use self::{
    file::{AsciiFile, EncodingError},
    iter::PositionIterator,
    maybe_spanned::MaybeSpanned,
    position::Position,
    span::Span,
    spanned::Spanned,
};
