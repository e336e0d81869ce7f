use crate::value::Value;
use strtab::Symbol;
use symtab::{RedefinitionError, Scoped, UndefinedSymbolError};

/// Locals of one method activation.
#[derive(Debug)]
struct Frame<'src> {
    this: Option<Value<'src>>,
    vars: Scoped<Symbol<'src>, Value<'src>>,
}

/// The call stack of a running program.
///
/// Variables always refer to the innermost frame, callers' locals are not
/// visible. The methods operating on the current frame must only be used
/// while a frame is pushed.
#[derive(Debug, Default)]
pub struct State<'src> {
    frames: Vec<Frame<'src>>,
}

impl<'src> State<'src> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// `this` is `None` in static methods.
    pub fn push_frame(&mut self, this: Option<Value<'src>>) {
        self.frames.push(Frame {
            this,
            vars: Scoped::new(),
        });
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn this(&self) -> Option<&Value<'src>> {
        self.frames.last().and_then(|frame| frame.this.as_ref())
    }

    pub fn enter_scope(&mut self) {
        self.frame_mut().vars.enter_scope();
    }

    pub fn leave_scope(&mut self) {
        self.frame_mut()
            .vars
            .leave_scope()
            .expect("scopes are entered and left pairwise");
    }

    pub fn define(&mut self, name: Symbol<'src>, value: Value<'src>) -> Result<(), RedefinitionError> {
        self.frame_mut().vars.define(name, value)
    }

    pub fn lookup(&self, name: Symbol<'src>) -> Option<&Value<'src>> {
        self.frames
            .last()
            .and_then(|frame| frame.vars.visible_definition(name))
    }

    /// Assign to a visible variable, returns the old value.
    pub fn update(
        &mut self,
        name: Symbol<'src>,
        value: Value<'src>,
    ) -> Result<Value<'src>, UndefinedSymbolError> {
        self.frame_mut().vars.update(name, value)
    }

    fn frame_mut(&mut self) -> &mut Frame<'src> {
        self.frames
            .last_mut()
            .expect("a frame is pushed before any statement runs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::ast::CompareOp;
    use strtab::StringTable;
    use utils::assert_matches;

    #[test]
    fn frames_hide_callers_variables() {
        let mut strtab = StringTable::new();
        let x = strtab.intern("x");
        let mut state = State::new();

        state.push_frame(None);
        state.define(x, Value::Int(1)).unwrap();
        state.push_frame(Some(Value::Null));
        assert!(state.lookup(x).is_none());
        assert_matches!(state.this(), Some(Value::Null));
        state.define(x, Value::Int(2)).unwrap();
        state.pop_frame();

        assert!(state.this().is_none());
        assert!(state.lookup(x).unwrap().compare(CompareOp::Eq, &Value::Int(1)));
        assert_eq!(1, state.depth());
    }

    #[test]
    fn nested_scopes() {
        let mut strtab = StringTable::new();
        let x = strtab.intern("x");
        let y = strtab.intern("y");
        let mut state = State::new();
        state.push_frame(None);

        state.define(x, Value::Int(1)).unwrap();
        state.enter_scope();
        state.define(y, Value::Int(2)).unwrap();
        assert!(state.define(x, Value::Int(3)).is_err());
        state.update(x, Value::Int(4)).unwrap();
        state.leave_scope();

        assert!(state.lookup(y).is_none());
        assert!(state.update(y, Value::Int(5)).is_err());
        assert_matches!(state.lookup(x), Some(Value::Int(4)));
    }
}
