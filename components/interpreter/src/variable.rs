//! Fixed-size variable storage

use core_types::Value;
use parking_lot::RwLock;

/// A fixed-length array of values.
///
/// Used for global and captured variables. The length is set at creation
/// and never changes; the slots are individually replaceable and may be
/// shared between thread contexts.
#[derive(Debug, Default)]
pub struct VariableContext {
    variables: RwLock<Vec<Value>>,
}

impl VariableContext {
    /// Create a context of `len` null values
    pub fn new(len: usize) -> Self {
        Self::from_values(vec![Value::Null; len])
    }

    /// Create a context holding the given values
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            variables: RwLock::new(values),
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.variables.read().len()
    }

    /// Whether the context has no slot
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a slot
    pub fn get(&self, index: usize) -> Option<Value> {
        self.variables.read().get(index).cloned()
    }

    /// Replace a slot. Returns `false` when `index` is out of range.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.variables.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Copy of every slot
    pub fn to_vec(&self) -> Vec<Value> {
        self.variables.read().clone()
    }
}
