//! Hooks the interpreter reports to an attached debugger
//!
//! The interpreter consults the debugger of the current OS thread before
//! every instruction and before every member access. A `true` answer means
//! the debugger wants the thread paused; the interpreter then blocks in
//! [`DebuggerCallback::wait_for_continue`].

use crate::context::ThreadContext;
use crate::exception::ExceptionInfo;
use core_types::{EventRef, HandleId, MethodRef, PropertyRef, TypeRef};
use std::cell::RefCell;
use std::sync::Arc;

/// Events a thread context reports to a debugger.
///
/// Every `break_*` method returns whether the thread should pause before the
/// reported action takes effect. `this` is the object identity of the
/// receiver, or `None` when the receiver is not an object.
pub trait DebuggerCallback: Send + Sync {
    /// A thread context starts running on the calling OS thread
    fn enter_thread_context(&self, context: &ThreadContext);

    /// A thread context stops running on the calling OS thread
    fn leave_thread_context(&self, context: &ThreadContext);

    /// An instruction is about to execute
    fn break_instruction(&self, context: &ThreadContext, instruction: usize) -> bool;

    /// A global variable is about to be read
    fn break_read(&self, context: &ThreadContext, variable: usize) -> bool;

    /// A global variable is about to be written
    fn break_write(&self, context: &ThreadContext, variable: usize) -> bool;

    /// A property is about to be read
    fn break_get(
        &self,
        context: &ThreadContext,
        this: Option<HandleId>,
        property: &PropertyRef,
    ) -> bool;

    /// A property is about to be written
    fn break_set(
        &self,
        context: &ThreadContext,
        this: Option<HandleId>,
        property: &PropertyRef,
    ) -> bool;

    /// A handler is about to be attached to an event
    fn break_attach(
        &self,
        context: &ThreadContext,
        this: Option<HandleId>,
        event: &EventRef,
    ) -> bool;

    /// A listener is about to be detached from an event
    fn break_detach(
        &self,
        context: &ThreadContext,
        this: Option<HandleId>,
        event: &EventRef,
    ) -> bool;

    /// A method is about to be invoked
    fn break_invoke(
        &self,
        context: &ThreadContext,
        this: Option<HandleId>,
        method: &MethodRef,
    ) -> bool;

    /// An object of a type is about to be constructed
    fn break_create(&self, context: &ThreadContext, type_descriptor: &TypeRef) -> bool;

    /// An exception was raised
    fn break_exception(&self, context: &ThreadContext, exception: &Arc<ExceptionInfo>) -> bool;

    /// Block until the debugger resumes execution.
    ///
    /// Returns `false` when the debugger stopped the program instead.
    fn wait_for_continue(&self) -> bool;
}

thread_local! {
    static CURRENT_DEBUGGER: RefCell<Option<Arc<dyn DebuggerCallback>>> = RefCell::new(None);
}

/// The debugger attached to the calling OS thread.
pub fn current_debugger() -> Option<Arc<dyn DebuggerCallback>> {
    CURRENT_DEBUGGER.with(|current| current.borrow().clone())
}

/// Attach a debugger to the calling OS thread and return the previous one.
pub fn set_current_debugger(
    debugger: Option<Arc<dyn DebuggerCallback>>,
) -> Option<Arc<dyn DebuggerCallback>> {
    CURRENT_DEBUGGER.with(|current| current.replace(debugger))
}
