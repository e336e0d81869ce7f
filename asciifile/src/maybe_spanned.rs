use crate::{Span, Spanned};
use std::ops::Deref;

#[derive(Debug)]
pub enum MaybeSpanned<'f, T> {
    WithoutSpan(T),
    WithSpan(Spanned<'f, T>),
}

impl<'f, T> MaybeSpanned<'f, T> {
    pub fn span(&self) -> Option<Span<'f>> {
        match self {
            MaybeSpanned::WithoutSpan(_) => None,
            MaybeSpanned::WithSpan(spanned) => Some(spanned.span),
        }
    }
}

impl<'f, T> Deref for MaybeSpanned<'f, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            MaybeSpanned::WithoutSpan(data) => data,
            MaybeSpanned::WithSpan(spanned) => &spanned.data,
        }
    }
}
