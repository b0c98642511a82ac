//! Variable environment for the interpreter.
//!
//! One frame per function activation. Bindings are slots
//! (`Shared<Value>`) so a reference can capture the identity of the
//! variable it was taken from: two references are `is`-equal exactly
//! when they alias the same slot.

use rustc_hash::FxHashMap;

use lyra_patterns::{Value, ValueSlot};
use lyra_ir::Shared;

/// One activation frame.
#[derive(Default, Debug)]
struct Frame {
    bindings: FxHashMap<String, ValueSlot>,
}

/// A stack of activation frames.
#[derive(Default, Debug)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            frames: vec![Frame::default()],
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Bind `name` to a fresh slot holding `value` in the innermost
    /// frame. Returns the slot.
    pub fn define(&mut self, name: impl Into<String>, value: Value) -> ValueSlot {
        let slot = Shared::new(value);
        self.define_slot(name, slot.clone());
        slot
    }

    /// Bind `name` to an existing slot (aliasing it).
    pub fn define_slot(&mut self, name: impl Into<String>, slot: ValueSlot) {
        if let Some(frame) = self.frames.last_mut() {
            frame.bindings.insert(name.into(), slot);
        }
    }

    /// Find the slot bound to `name`, innermost frame first.
    pub fn lookup(&self, name: &str) -> Option<ValueSlot> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_frames_shadow_outer_ones() {
        let mut env = Environment::new();
        env.define("x", Value::Int(1));
        env.push_frame();
        env.define("x", Value::Int(2));

        assert_eq!(*env.lookup("x").unwrap().borrow(), Value::Int(2));
        env.pop_frame();
        assert_eq!(*env.lookup("x").unwrap().borrow(), Value::Int(1));
    }

    #[test]
    fn aliased_slots_share_writes() {
        let mut env = Environment::new();
        let slot = env.define("a", Value::Int(0));
        env.define_slot("b", slot);

        *env.lookup("a").unwrap().borrow_mut() = Value::Int(7);
        assert_eq!(*env.lookup("b").unwrap().borrow(), Value::Int(7));
    }
}
