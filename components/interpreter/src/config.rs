//! Thread context configuration

/// Limits applied to one [`ThreadContext`](crate::ThreadContext).
///
/// # Examples
///
/// ```
/// use interpreter::ThreadContextConfig;
///
/// let config = ThreadContextConfig::default().with_max_call_depth(16);
/// assert_eq!(config.max_call_depth, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadContextConfig {
    /// Initial capacity of the operand stack
    pub stack_capacity: usize,
    /// Maximum number of nested stack frames before `Invoke` raises
    /// "call stack overflow"
    pub max_call_depth: usize,
}

impl ThreadContextConfig {
    /// Set the initial operand stack capacity
    pub fn with_stack_capacity(mut self, stack_capacity: usize) -> Self {
        self.stack_capacity = stack_capacity;
        self
    }

    /// Set the maximum call depth
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }
}

impl Default for ThreadContextConfig {
    fn default() -> Self {
        Self {
            stack_capacity: 256,
            max_call_depth: 1024,
        }
    }
}
