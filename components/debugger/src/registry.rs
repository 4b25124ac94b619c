//! Thread contexts attached to a debugger

use crate::location::InstructionLocation;
use bytecode_system::Program;
use core_types::HandleId;
use interpreter::{CallStackInfo, ThreadContext};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// A thread context registered with a debugger.
///
/// `location` and `call_stack` are a snapshot taken when the thread blocked
/// or while one of its breakpoint conditions is evaluated; both are empty
/// while it runs.
#[derive(Debug, Clone)]
pub struct ThreadContextInfo {
    /// Identity of the thread context
    pub context: HandleId,
    /// OS thread running it
    pub thread: ThreadId,
    /// Program being executed
    pub program: Arc<Program>,
    /// Where the thread is blocked
    pub location: Option<InstructionLocation>,
    /// Frames active when the snapshot was taken, innermost first
    pub call_stack: Vec<Arc<CallStackInfo>>,
}

impl ThreadContextInfo {
    /// Whether a snapshot is available
    pub fn is_paused(&self) -> bool {
        self.location.is_some()
    }
}

/// Registered contexts in the order they were entered.
#[derive(Debug, Default)]
pub(crate) struct ThreadRegistry {
    contexts: Vec<ThreadContextInfo>,
}

impl ThreadRegistry {
    pub(crate) fn enter(&mut self, context: &ThreadContext) {
        self.contexts.push(ThreadContextInfo {
            context: context.id(),
            thread: thread::current().id(),
            program: context.program().clone(),
            location: None,
            call_stack: Vec::new(),
        });
    }

    pub(crate) fn leave(&mut self, context: &ThreadContext) -> bool {
        match self
            .contexts
            .iter()
            .rposition(|entry| entry.context == context.id())
        {
            Some(index) => {
                self.contexts.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub(crate) fn contexts(&self) -> &[ThreadContextInfo] {
        &self.contexts
    }

    pub(crate) fn get(&self, context: HandleId) -> Option<&ThreadContextInfo> {
        self.contexts.iter().find(|entry| entry.context == context)
    }

    /// Where `context` is about to execute `instruction`.
    pub(crate) fn locate(
        &self,
        context: &ThreadContext,
        instruction: usize,
    ) -> InstructionLocation {
        let thread = thread::current().id();
        let position = self
            .contexts
            .iter()
            .position(|entry| entry.context == context.id());
        let context_index = self.contexts[..position.unwrap_or(self.contexts.len())]
            .iter()
            .filter(|entry| entry.thread == thread)
            .count();
        InstructionLocation {
            thread,
            context_index,
            program: context.program().clone(),
            stack_frame_index: context.frames().len().saturating_sub(1),
            instruction,
        }
    }

    pub(crate) fn capture(&mut self, context: &ThreadContext, location: InstructionLocation) {
        let call_stack = context.call_stack();
        if let Some(entry) = self
            .contexts
            .iter_mut()
            .rfind(|entry| entry.context == context.id())
        {
            entry.location = Some(location);
            entry.call_stack = call_stack;
        }
    }

    /// Drop the snapshot of the innermost context of the calling OS thread
    pub(crate) fn release_current(&mut self) {
        let thread = thread::current().id();
        if let Some(entry) = self
            .contexts
            .iter_mut()
            .rfind(|entry| entry.thread == thread)
        {
            entry.location = None;
            entry.call_stack.clear();
        }
    }

    /// Innermost context of the calling OS thread
    pub(crate) fn current(&self) -> Option<&ThreadContextInfo> {
        let thread = thread::current().id();
        self.contexts.iter().rev().find(|entry| entry.thread == thread)
    }
}
