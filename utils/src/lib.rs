pub mod color;

use std::collections::VecDeque;

#[macro_export]
macro_rules! assert_matches {
    ($expression: expr, $( $pattern: pat )|*) => {{
        match $expression {
            $( $pattern )|* => (),
            expression => panic!(
                r#"assertion failed: `(if let pattern = expression), {}:{}:{}`
pattern: `{}`,
expression: `{:?}`"#,
                file!(),
                line!(),
                column!(),
                stringify!($( $pattern )|*),
                expression
            ),
        }
    }};
}

/// An iterator adaptor with unbounded lookahead. The parser needs up to
/// four tokens to tell casts, local variable declarations and expressions
/// apart.
pub struct MultiPeekable<I>
where
    I: Iterator,
{
    iter: I,
    lookahead: VecDeque<I::Item>,
}

impl<I> MultiPeekable<I>
where
    I: Iterator,
{
    pub fn new(iter: I) -> Self {
        MultiPeekable {
            iter,
            lookahead: VecDeque::new(),
        }
    }

    pub fn peek(&mut self) -> Option<&I::Item> {
        self.peek_nth(0)
    }

    /// The item `n` positions ahead, `0` being the next one.
    pub fn peek_nth(&mut self, n: usize) -> Option<&I::Item> {
        self.fill(n + 1);
        self.lookahead.get(n)
    }

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() < n {
            match self.iter.next() {
                Some(item) => self.lookahead.push_back(item),
                None => return,
            }
        }
    }
}

impl<I> Iterator for MultiPeekable<I>
where
    I: Iterator,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.lookahead.pop_front().or_else(|| self.iter.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_peek_keeps_order() {
        let mut iter = MultiPeekable::new(1..=4);
        assert_eq!(Some(&3), iter.peek_nth(2));
        assert_eq!(Some(&1), iter.peek());
        assert_eq!(Some(1), iter.next());
        assert_eq!(Some(&4), iter.peek_nth(2));
        assert_eq!(None, iter.peek_nth(3));
        assert_eq!(vec![2, 3, 4], iter.collect::<Vec<_>>());
    }
}
