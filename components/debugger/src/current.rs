//! Debugger attached to the calling OS thread

use crate::debugger::Debugger;
use interpreter::DebuggerCallback;
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    static CURRENT: RefCell<Option<Arc<Debugger>>> = const { RefCell::new(None) };
}

/// The debugger attached to the calling OS thread
pub fn debugger_for_current_thread() -> Option<Arc<Debugger>> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Attach a debugger to the calling OS thread, or detach with `None`.
///
/// Thread contexts started on this thread afterwards report to it. Returns
/// the previously attached debugger.
pub fn set_debugger_for_current_thread(debugger: Option<Arc<Debugger>>) -> Option<Arc<Debugger>> {
    interpreter::set_current_debugger(
        debugger
            .clone()
            .map(|debugger| debugger as Arc<dyn DebuggerCallback>),
    );
    CURRENT.with(|current| current.replace(debugger))
}
