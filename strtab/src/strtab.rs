//! String table with zero-copy and amortised O(1) insert.
//!
//! Identifiers are interned once and afterwards compared by pointer.

use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Unrelated,
    Related { distance: usize },
}

impl Relation {
    pub fn is_related(self) -> bool {
        match self {
            Relation::Unrelated => false,
            Relation::Related { .. } => true,
        }
    }
}

impl std::cmp::Ord for Relation {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use self::Relation::*;
        match (self, other) {
            (Unrelated, Unrelated) => std::cmp::Ordering::Equal,
            (Unrelated, _) => std::cmp::Ordering::Greater,
            (_, Unrelated) => std::cmp::Ordering::Less,
            (Related { distance: d1 }, Related { distance: d2 }) => d1.cmp(d2),
        }
    }
}

impl std::cmp::PartialOrd for Relation {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub trait Relational {
    fn relation(&self, other: &Self) -> Relation;
}

/// Maximum edit distance for two names to count as typos of each other.
const MAX_TYPO_DISTANCE: usize = 2;

#[derive(Debug, Clone, Copy, Eq, PartialOrd, Ord)]
pub struct Symbol<'f>(&'f str);

impl<'f> Symbol<'f> {
    fn as_raw(&self) -> *const str {
        self.0 as *const str
    }

    pub fn as_str(&self) -> &'f str {
        self.0
    }
}

impl<'f> Relational for Symbol<'f> {
    fn relation(&self, other: &Symbol<'f>) -> Relation {
        let distance = levenshtein::levenshtein(self.0, other.0);
        if distance <= MAX_TYPO_DISTANCE {
            Relation::Related { distance }
        } else {
            Relation::Unrelated
        }
    }
}

/// The candidate most closely related to `wanted`, if any is related at
/// all. Ties go to the candidate seen first.
pub fn closest_relative<'f, I>(wanted: Symbol<'f>, candidates: I) -> Option<Symbol<'f>>
where
    I: IntoIterator<Item = Symbol<'f>>,
{
    candidates
        .into_iter()
        .filter(|candidate| *candidate != wanted)
        .map(|candidate| (wanted.relation(&candidate), candidate))
        .filter(|(relation, _)| relation.is_related())
        .fold(None, |best: Option<(Relation, Symbol<'f>)>, (relation, candidate)| {
            match best {
                Some((best_relation, _)) if best_relation <= relation => best,
                _ => Some((relation, candidate)),
            }
        })
        .map(|(_, candidate)| candidate)
}

impl Hash for Symbol<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_raw().hash(state)
    }
}

impl PartialEq for Symbol<'_> {
    fn eq(&self, other: &Symbol<'_>) -> bool {
        self.as_raw() as *const u8 == other.as_raw() as *const u8
            && self.0.len() == other.0.len()
    }
}

impl PartialEq<str> for Symbol<'_> {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl fmt::Display for Symbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Default)]
pub struct StringTable<'f> {
    entries: HashSet<&'f str>,
}

const THIS_SYMBOL: &str = "this";

impl<'f> StringTable<'f> {
    pub fn new() -> Self {
        let mut st = StringTable::default();
        st.intern(THIS_SYMBOL);
        st
    }

    pub fn intern(&mut self, value: &'f str) -> Symbol<'f> {
        match self.entries.get(value) {
            Some(interned) => Symbol(interned),
            None => {
                self.entries.insert(value);
                Symbol(value)
            }
        }
    }

    pub fn this_symbol(&mut self) -> Symbol<'f> {
        self.intern(THIS_SYMBOL)
    }

    /// Look up an already interned string without interning it.
    pub fn get(&self, value: &str) -> Option<Symbol<'f>> {
        self.entries.get(value).map(|s| Symbol(*s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_eq_sym {
        ($a:expr, $b:expr) => {
            assert_eq!($a, $b);
            // don't trust that eq impl is based on pointer comparison
            assert_eq!($a.as_raw(), $b.as_raw());
        };
    }

    #[test]
    fn no_duplication() {
        let source = String::from("foo bar foo");
        let mut strtab = StringTable::new();
        let init_len = strtab.len();

        let a = strtab.intern(&source[0..3]);
        let b = strtab.intern(&source[8..11]);
        assert_eq!(init_len + 1, strtab.len());
        assert_eq_sym!(a, b);

        let c = strtab.intern(&source[4..7]);
        assert_eq!(init_len + 2, strtab.len());
        assert_ne!(a, c);
    }

    #[test]
    fn equal_text_from_different_sources_is_interned_once() {
        let mut strtab = StringTable::new();
        let this = strtab.this_symbol();
        let copied = String::from("this");
        assert_eq_sym!(this, strtab.intern(&copied));
        assert_eq!(Some(this), strtab.get("this"));
        assert_eq!(None, strtab.get("that"));
    }

    #[test]
    fn typos_are_related() {
        let mut strtab = StringTable::new();
        let counter = strtab.intern("counter");
        let countr = strtab.intern("countr");
        let unrelated = strtab.intern("x");

        assert_eq!(Relation::Related { distance: 1 }, counter.relation(&countr));
        assert_eq!(Relation::Unrelated, counter.relation(&unrelated));
        assert!(Relation::Related { distance: 2 } < Relation::Unrelated);
    }

    #[test]
    fn closest_relative_prefers_smaller_distance() {
        let mut strtab = StringTable::new();
        let wanted = strtab.intern("valeu");
        let value = strtab.intern("value");
        let valve = strtab.intern("valve");
        let other = strtab.intern("result");

        assert_eq!(
            Some(valve),
            closest_relative(wanted, vec![other, valve, value])
        );
        assert_eq!(None, closest_relative(wanted, vec![other, wanted]));
    }
}
