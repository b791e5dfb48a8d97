use crate::rt::{RtResult, RuntimeError};
use crate::val::Value;

/// Runtime binding context handed to compiled closures.
///
/// Variables live in slots assigned at compile time by `Comp`; a closure
/// only borrows the environment for the duration of one invocation.
#[derive(Debug, Clone, Default)]
pub struct Env {
    slots: Vec<Option<Value>>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots(n: usize) -> Self {
        Self {
            slots: Vec::with_capacity(n),
        }
    }

    /// Environment used for static evaluation of constant expressions.
    pub fn detached() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn get(&self, slot: usize) -> RtResult<&Value> {
        self.slots
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or(RuntimeError::UnboundSlot(slot))
    }

    /// Store `value` in `slot`, growing the slot vector when the slot was
    /// allocated after this environment was created.
    pub fn set(&mut self, slot: usize, value: Value) {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, None);
        }
        self.slots[slot] = Some(value);
    }
}
