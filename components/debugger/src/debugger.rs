//! The debugger
//!
//! Interpreting threads consult the debugger through
//! [`DebuggerCallback`]; a controller thread drives it through
//! [`Debugger::run`], [`Debugger::pause`], [`Debugger::stop`] and the step
//! methods. Every state transition is published under `lock` and wakes all
//! threads blocked in [`DebuggerCallback::wait_for_continue`].

use crate::breakpoint::{Breakpoint, BreakpointId, BreakpointKind};
use crate::error::DebuggerError;
use crate::location::InstructionLocation;
use crate::registry::{ThreadContextInfo, ThreadRegistry};
use crate::state::{
    Activation, AtomicActivation, AtomicRunningType, AtomicState, DebuggerState, RunningType,
};
use crate::table::BreakpointTable;
use bytecode_system::Program;
use core_types::{EventRef, HandleId, MethodRef, PropertyRef, TextRange, TypeRef, Value};
use interpreter::{DebuggerCallback, ExceptionInfo, ThreadContext};
use parking_lot::{Condvar, Mutex, RwLock};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

thread_local! {
    static EVALUATING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the calling OS thread as evaluating a breakpoint condition.
struct EvaluatingGuard;

impl EvaluatingGuard {
    fn enter() -> Self {
        EVALUATING.with(|flag| flag.set(true));
        EvaluatingGuard
    }

    fn is_active() -> bool {
        EVALUATING.with(Cell::get)
    }
}

impl Drop for EvaluatingGuard {
    fn drop(&mut self) {
        EVALUATING.with(|flag| flag.set(false));
    }
}

/// Notifications about the lifetime of a debug session.
///
/// Called without any debugger lock held, so implementations may call back
/// into the debugger.
pub trait DebuggerObserver: Send + Sync {
    /// A session started: the debugger left `Stopped`
    fn on_start_execution(&self, _debugger: &Debugger) {}

    /// A thread is about to block. Called again after every wake-up that
    /// leaves the thread paused.
    fn on_block_execution(&self, _debugger: &Debugger) {}

    /// The debugger reached `Stopped`
    fn on_stop_execution(&self, _debugger: &Debugger) {}
}

/// Breakpoint and run control for script threads.
///
/// A new debugger is `Stopped`; threads executing under it abort until
/// [`run`](Self::run), [`pause`](Self::pause) or a step starts a session.
///
/// # Examples
///
/// ```
/// use bytecode_system::{Instruction, ProgramBuilder};
/// use core_types::Value;
/// use debugger::{set_debugger_for_current_thread, Breakpoint, Debugger, DebuggerState};
/// use interpreter::{load_function, GlobalContext};
/// use std::sync::Arc;
///
/// let mut builder = ProgramBuilder::new();
/// builder.begin_function("main", &[], &[]).unwrap();
/// builder.emit(Instruction::LoadValue(Value::I32(1)));
/// builder.emit(Instruction::Return);
/// builder.end_function().unwrap();
/// let program = Arc::new(builder.build().unwrap());
///
/// let debugger = Arc::new(Debugger::new());
/// let id = debugger.add_breakpoint(Breakpoint::instruction(&program, 1)).unwrap();
/// debugger.enable_breakpoint(id, false).unwrap();
/// assert!(debugger.run());
///
/// set_debugger_for_current_thread(Some(debugger.clone()));
/// let global = Arc::new(GlobalContext::new(program));
/// let main = load_function(&global, "main").unwrap();
/// assert_eq!(main.call(vec![]).unwrap(), Value::I32(1));
/// assert_eq!(debugger.state(), DebuggerState::Running);
/// set_debugger_for_current_thread(None);
/// ```
pub struct Debugger {
    state: AtomicState,
    running_type: AtomicRunningType,
    last_activated: AtomicActivation,
    break_exception: AtomicBool,
    step_before_codegen: AtomicBool,
    step_start: Mutex<Option<InstructionLocation>>,
    last_paused: Mutex<Option<(HandleId, InstructionLocation)>>,
    breakpoints: RwLock<BreakpointTable>,
    registry: Mutex<ThreadRegistry>,
    evaluation: Mutex<()>,
    lock: Mutex<()>,
    changed: Condvar,
    observer: Option<Arc<dyn DebuggerObserver>>,
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Debugger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debugger")
            .field("state", &self.state())
            .field("running_type", &self.running_type())
            .field("breakpoints", &self.breakpoint_count())
            .finish()
    }
}

impl Debugger {
    /// Create a stopped debugger with no breakpoint
    pub fn new() -> Self {
        Self {
            state: AtomicState::new(DebuggerState::Stopped),
            running_type: AtomicRunningType::new(RunningType::RunUntilBreakPoint),
            last_activated: AtomicActivation::new(),
            break_exception: AtomicBool::new(false),
            step_before_codegen: AtomicBool::new(true),
            step_start: Mutex::new(None),
            last_paused: Mutex::new(None),
            breakpoints: RwLock::new(BreakpointTable::new()),
            registry: Mutex::new(ThreadRegistry::default()),
            evaluation: Mutex::new(()),
            lock: Mutex::new(()),
            changed: Condvar::new(),
            observer: None,
        }
    }

    /// Create a stopped debugger reporting to `observer`
    pub fn with_observer(observer: Arc<dyn DebuggerObserver>) -> Self {
        Self {
            observer: Some(observer),
            ..Self::new()
        }
    }

    // ===== Breakpoints =====

    /// Add a breakpoint.
    ///
    /// Fails if a breakpoint of the same kind and target exists.
    pub fn add_breakpoint(&self, breakpoint: Breakpoint) -> Result<BreakpointId, DebuggerError> {
        let kind = breakpoint.kind();
        let id = self.breakpoints.write().add(breakpoint)?;
        debug!(%id, ?kind, "breakpoint added");
        Ok(id)
    }

    /// Break on a source row.
    ///
    /// Adds an instruction breakpoint at the first instruction mapped to the
    /// row in every function that has one, so a row shared by a function and
    /// a closure breaks in both. `row` starts from 0.
    pub fn add_code_line_breakpoint(
        &self,
        program: &Program,
        code_index: usize,
        row: usize,
        before_codegen: bool,
    ) -> Result<Vec<BreakpointId>, DebuggerError> {
        let info = program
            .debug_info(before_codegen)
            .ok_or(DebuggerError::MissingDebugInfo)?;
        let mut seen = BTreeSet::new();
        let instructions: Vec<usize> = info
            .instructions_at(code_index, row)
            .iter()
            .copied()
            .filter(|&instruction| seen.insert(program.function_of(instruction)))
            .collect();
        if instructions.is_empty() {
            return Err(DebuggerError::NoInstructionOnRow { code_index, row });
        }

        let mut table = self.breakpoints.write();
        for &instruction in &instructions {
            let kind = BreakpointKind::Instruction {
                program: program.id(),
                instruction,
            };
            if let Some(existing) = table.id_of(&kind) {
                return Err(DebuggerError::DuplicateBreakpoint(existing));
            }
        }
        let mut ids = Vec::with_capacity(instructions.len());
        for instruction in instructions {
            ids.push(table.add(Breakpoint::instruction(program, instruction))?);
        }
        debug!(code_index, row, count = ids.len(), "line breakpoint added");
        Ok(ids)
    }

    /// Number of live breakpoints
    pub fn breakpoint_count(&self) -> usize {
        self.breakpoints.read().len()
    }

    /// A live breakpoint
    pub fn breakpoint(&self, id: BreakpointId) -> Option<Breakpoint> {
        self.breakpoints.read().get(id).cloned()
    }

    /// All live breakpoints
    pub fn breakpoints(&self) -> Vec<(BreakpointId, Breakpoint)> {
        self.breakpoints
            .read()
            .iter()
            .map(|(id, breakpoint)| (id, breakpoint.clone()))
            .collect()
    }

    /// Remove a breakpoint. Its id is never handed out again.
    pub fn remove_breakpoint(&self, id: BreakpointId) -> Result<(), DebuggerError> {
        self.breakpoints.write().remove(id)?;
        debug!(%id, "breakpoint removed");
        Ok(())
    }

    /// Enable or disable a breakpoint
    pub fn enable_breakpoint(&self, id: BreakpointId, enabled: bool) -> Result<(), DebuggerError> {
        self.breakpoints.write().set_enabled(id, enabled)
    }

    /// Whether raised exceptions pause the raising thread
    pub fn break_on_exception(&self) -> bool {
        self.break_exception.load(Ordering::Acquire)
    }

    /// Pause the raising thread whenever an exception is raised
    pub fn set_break_exception(&self, enabled: bool) {
        self.break_exception.store(enabled, Ordering::Release);
    }

    // ===== Run control =====

    /// Start a session, or resume paused threads until the next breakpoint
    pub fn run(&self) -> bool {
        self.resume(RunningType::RunUntilBreakPoint, None)
    }

    /// Pause at the next row of the current function or a caller
    pub fn step_over(&self, before_codegen: bool) -> bool {
        self.resume(RunningType::RunStepOver, Some(before_codegen))
    }

    /// Pause at the next row, entering callees
    pub fn step_into(&self, before_codegen: bool) -> bool {
        self.resume(RunningType::RunStepInto, Some(before_codegen))
    }

    /// Ask running threads to pause at their next instruction.
    ///
    /// From `Stopped` this starts a session that pauses before its first
    /// instruction.
    pub fn pause(&self) -> bool {
        let started = {
            let _guard = self.lock.lock();
            let state = self.state.load();
            if !matches!(state, DebuggerState::Running | DebuggerState::Stopped) {
                return false;
            }
            self.publish(state, DebuggerState::RequiredToPause);
            state == DebuggerState::Stopped
        };
        if started {
            self.notify(|observer, debugger| observer.on_start_execution(debugger));
        }
        true
    }

    /// End the session.
    ///
    /// Blocked threads wake up and abort; running threads abort at their
    /// next instruction.
    pub fn stop(&self) -> bool {
        let stopped = {
            let _guard = self.lock.lock();
            let state = self.state.load();
            match state {
                DebuggerState::Stopped | DebuggerState::RequiredToStop => return false,
                DebuggerState::PauseByOperation | DebuggerState::PauseByBreakPoint => {
                    self.publish(state, DebuggerState::RequiredToStop);
                    false
                }
                _ if self.registry.lock().is_empty() => {
                    self.publish(state, DebuggerState::Stopped);
                    true
                }
                _ => {
                    self.publish(state, DebuggerState::RequiredToStop);
                    false
                }
            }
        };
        if stopped {
            self.notify(|observer, debugger| observer.on_stop_execution(debugger));
        }
        true
    }

    /// Current state
    pub fn state(&self) -> DebuggerState {
        self.state.load()
    }

    /// How the debugger pauses without a breakpoint
    pub fn running_type(&self) -> RunningType {
        self.running_type.load()
    }

    /// What caused the most recent pause
    pub fn last_activated_breakpoint(&self) -> Option<Activation> {
        self.last_activated.load()
    }

    /// Block until a thread pauses or `timeout` elapses.
    ///
    /// Returns whether the debugger is paused.
    pub fn wait_until_paused(&self, timeout: Duration) -> bool {
        self.wait_until(timeout, DebuggerState::is_paused)
    }

    /// Block until the debugger is stopped or `timeout` elapses.
    pub fn wait_until_stopped(&self, timeout: Duration) -> bool {
        self.wait_until(timeout, |state| state == DebuggerState::Stopped)
    }

    // ===== Inspection =====

    /// Every registered thread context in entering order
    pub fn thread_contexts(&self) -> Vec<ThreadContextInfo> {
        self.registry.lock().contexts().to_vec()
    }

    /// The innermost context of the calling thread, or else the most
    /// recently paused context
    pub fn current_thread_context(&self) -> Option<ThreadContextInfo> {
        let last_paused = self.last_paused.lock().as_ref().map(|(context, _)| *context);
        let registry = self.registry.lock();
        registry
            .current()
            .or_else(|| last_paused.and_then(|context| registry.get(context)))
            .cloned()
    }

    /// Source range of a frame of a paused thread.
    ///
    /// `context` defaults to [`current_thread_context`](Self::current_thread_context);
    /// `call_stack_index` 0 is the innermost frame.
    pub fn current_position(
        &self,
        before_codegen: bool,
        context: Option<HandleId>,
        call_stack_index: usize,
    ) -> Result<TextRange, DebuggerError> {
        let info = self.inspected(context)?;
        let frame = info
            .call_stack
            .get(call_stack_index)
            .ok_or(DebuggerError::CallStackIndexOutOfRange(call_stack_index))?;
        let debug_info = frame
            .program()
            .debug_info(before_codegen)
            .ok_or(DebuggerError::MissingDebugInfo)?;
        debug_info
            .range(frame.instruction())
            .copied()
            .ok_or(DebuggerError::NoSourcePosition(frame.instruction()))
    }

    /// Value of a variable visible from a frame of a paused thread.
    ///
    /// Names resolve to locals, then arguments, then captured variables,
    /// then globals.
    pub fn value_by_name(
        &self,
        name: &str,
        context: Option<HandleId>,
        call_stack_index: usize,
    ) -> Result<Value, DebuggerError> {
        let info = self.inspected(context)?;
        let frame = info
            .call_stack
            .get(call_stack_index)
            .ok_or(DebuggerError::CallStackIndexOutOfRange(call_stack_index))?;
        [
            frame.local_variables(),
            frame.arguments(),
            frame.captured_variables(),
            frame.global_variables(),
        ]
        .iter()
        .find_map(|dictionary| dictionary.get(name).cloned())
        .ok_or_else(|| DebuggerError::UnknownVariable(name.to_string()))
    }

    fn inspected(&self, context: Option<HandleId>) -> Result<ThreadContextInfo, DebuggerError> {
        let info = match context {
            Some(id) => self
                .registry
                .lock()
                .get(id)
                .cloned()
                .ok_or(DebuggerError::UnknownThreadContext(id))?,
            None => self
                .paused_context()
                .ok_or(DebuggerError::NotPaused)?,
        };
        if info.is_paused() {
            Ok(info)
        } else {
            Err(DebuggerError::NotPaused)
        }
    }

    fn paused_context(&self) -> Option<ThreadContextInfo> {
        let last_paused = self.last_paused.lock().as_ref().map(|(context, _)| *context);
        let registry = self.registry.lock();
        registry
            .current()
            .filter(|info| info.is_paused())
            .or_else(|| last_paused.and_then(|context| registry.get(context)))
            .cloned()
    }

    // ===== State machine internals =====

    /// Store a new state and wake every waiter. Callers hold `lock`.
    fn publish(&self, from: DebuggerState, to: DebuggerState) {
        self.state.store(to);
        self.changed.notify_all();
        debug!(%from, %to, "debugger state changed");
    }

    fn notify(&self, event: impl FnOnce(&dyn DebuggerObserver, &Debugger)) {
        if let Some(observer) = &self.observer {
            event(observer.as_ref(), self);
        }
    }

    fn resume(&self, running_type: RunningType, before_codegen: Option<bool>) -> bool {
        let started = {
            let _guard = self.lock.lock();
            let state = self.state.load();
            let next = match state {
                DebuggerState::Stopped | DebuggerState::RequiredToPause => DebuggerState::Running,
                DebuggerState::PauseByOperation | DebuggerState::PauseByBreakPoint => {
                    DebuggerState::Continue
                }
                _ => return false,
            };
            if let Some(before_codegen) = before_codegen {
                self.step_before_codegen
                    .store(before_codegen, Ordering::Release);
            }
            *self.step_start.lock() = match (running_type, state) {
                (RunningType::RunUntilBreakPoint, _) | (_, DebuggerState::Stopped) => None,
                _ => self
                    .last_paused
                    .lock()
                    .as_ref()
                    .map(|(_, location)| location.clone()),
            };
            self.running_type.store(running_type);
            self.publish(state, next);
            state == DebuggerState::Stopped
        };
        if started {
            self.notify(|observer, debugger| observer.on_start_execution(debugger));
        }
        true
    }

    fn wait_until(&self, timeout: Duration, done: impl Fn(DebuggerState) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock();
        while !done(self.state.load()) {
            if self.changed.wait_until(&mut guard, deadline).timed_out() {
                return done(self.state.load());
            }
        }
        true
    }

    /// Record where `context` is and attach the call stack to its registry
    /// entry
    fn capture(&self, context: &ThreadContext, instruction: usize) -> InstructionLocation {
        let mut registry = self.registry.lock();
        let location = registry.locate(context, instruction);
        registry.capture(context, location.clone());
        location
    }

    /// Snapshot the thread, then switch to `paused` unless another pause or
    /// a stop got there first. The thread blocks in every case.
    fn enter_pause(
        &self,
        context: &ThreadContext,
        instruction: usize,
        activation: Activation,
        paused: DebuggerState,
    ) -> bool {
        let location = self.capture(context, instruction);
        let _guard = self.lock.lock();
        let state = self.state.load();
        if matches!(
            state,
            DebuggerState::Running | DebuggerState::Continue | DebuggerState::RequiredToPause
        ) {
            *self.last_paused.lock() = Some((context.id(), location));
            self.last_activated.store(activation);
            self.publish(state, paused);
            debug!(context = %context.id(), instruction, ?activation, "thread paused");
        }
        true
    }

    /// Consulted before an instruction while no session is running freely
    fn break_for_request(&self, context: &ThreadContext, instruction: usize) -> bool {
        match self.state.load() {
            DebuggerState::Running | DebuggerState::Continue => false,
            DebuggerState::Stopped | DebuggerState::RequiredToStop => true,
            DebuggerState::RequiredToPause => self.enter_pause(
                context,
                instruction,
                Activation::Pause,
                DebuggerState::PauseByOperation,
            ),
            DebuggerState::PauseByOperation | DebuggerState::PauseByBreakPoint => {
                self.capture(context, instruction);
                true
            }
        }
    }

    fn step_reached(&self, context: &ThreadContext, instruction: usize) -> bool {
        let running_type = self.running_type.load();
        if running_type == RunningType::RunUntilBreakPoint {
            return false;
        }
        let before_codegen = self.step_before_codegen.load(Ordering::Acquire);
        let current = self.registry.lock().locate(context, instruction);
        match self.step_start.lock().as_ref() {
            Some(start) if running_type == RunningType::RunStepOver => {
                start.break_step_over(&current, before_codegen)
            }
            Some(start) => start.break_step_into(&current, before_codegen),
            None => current.source_range(before_codegen).is_some(),
        }
    }

    /// Match a breakpoint, evaluate its condition and pause on success
    fn break_at(&self, context: &ThreadContext, instruction: usize, kind: BreakpointKind) -> bool {
        let (id, action) = {
            let table = self.breakpoints.read();
            match table.find(kind) {
                Some((id, breakpoint)) => (id, breakpoint.action().cloned()),
                None => return false,
            }
        };
        trace!(%id, ?kind, "breakpoint matched");
        let Some(action) = action else {
            return self.enter_pause(
                context,
                instruction,
                Activation::Breakpoint(id),
                DebuggerState::PauseByBreakPoint,
            );
        };

        let _serial = self.evaluation.lock();
        let _evaluating = EvaluatingGuard::enter();
        self.capture(context, instruction);
        if !action.evaluate_condition(self) {
            self.registry.lock().release_current();
            return false;
        }
        self.enter_pause(
            context,
            instruction,
            Activation::Breakpoint(id),
            DebuggerState::PauseByBreakPoint,
        );
        action.post_action(self);
        true
    }

    /// Breakpoint check for accesses inside an instruction
    fn break_member(&self, context: &ThreadContext, kind: BreakpointKind) -> bool {
        if EvaluatingGuard::is_active()
            || !matches!(
                self.state.load(),
                DebuggerState::Running | DebuggerState::Continue
            )
        {
            return false;
        }
        self.break_at(context, executing_instruction(context), kind)
    }
}

fn executing_instruction(context: &ThreadContext) -> usize {
    context
        .current_frame()
        .map(|frame| frame.next_instruction.saturating_sub(1))
        .unwrap_or(0)
}

impl DebuggerCallback for Debugger {
    fn enter_thread_context(&self, context: &ThreadContext) {
        self.registry.lock().enter(context);
        trace!(context = %context.id(), "thread context entered");
    }

    fn leave_thread_context(&self, context: &ThreadContext) {
        let empty = {
            let mut registry = self.registry.lock();
            registry.leave(context);
            if registry.is_empty() {
                self.running_type.store(RunningType::RunUntilBreakPoint);
                *self.step_start.lock() = None;
            }
            registry.is_empty()
        };
        trace!(context = %context.id(), "thread context left");
        if !empty {
            return;
        }

        // a stop request with nobody left to honour it settles here
        let stopped = {
            let _guard = self.lock.lock();
            let state = self.state.load();
            if state == DebuggerState::RequiredToStop && self.registry.lock().is_empty() {
                self.publish(state, DebuggerState::Stopped);
                true
            } else {
                false
            }
        };
        if stopped {
            self.notify(|observer, debugger| observer.on_stop_execution(debugger));
        }
    }

    fn break_instruction(&self, context: &ThreadContext, instruction: usize) -> bool {
        if EvaluatingGuard::is_active() {
            return false;
        }
        if !matches!(
            self.state.load(),
            DebuggerState::Running | DebuggerState::Continue
        ) {
            return self.break_for_request(context, instruction);
        }
        if self.step_reached(context, instruction) {
            return self.enter_pause(
                context,
                instruction,
                Activation::Pause,
                DebuggerState::PauseByOperation,
            );
        }
        self.break_at(
            context,
            instruction,
            BreakpointKind::Instruction {
                program: context.program().id(),
                instruction,
            },
        )
    }

    fn break_read(&self, context: &ThreadContext, variable: usize) -> bool {
        let program = context.program().id();
        self.break_member(context, BreakpointKind::ReadGlobalVar { program, variable })
    }

    fn break_write(&self, context: &ThreadContext, variable: usize) -> bool {
        let program = context.program().id();
        self.break_member(context, BreakpointKind::WriteGlobalVar { program, variable })
    }

    fn break_get(
        &self,
        context: &ThreadContext,
        this: Option<HandleId>,
        property: &PropertyRef,
    ) -> bool {
        let property = property.id();
        self.break_member(context, BreakpointKind::GetProperty { this, property })
    }

    fn break_set(
        &self,
        context: &ThreadContext,
        this: Option<HandleId>,
        property: &PropertyRef,
    ) -> bool {
        let property = property.id();
        self.break_member(context, BreakpointKind::SetProperty { this, property })
    }

    fn break_attach(
        &self,
        context: &ThreadContext,
        this: Option<HandleId>,
        event: &EventRef,
    ) -> bool {
        let event = event.id();
        self.break_member(context, BreakpointKind::AttachEvent { this, event })
    }

    fn break_detach(
        &self,
        context: &ThreadContext,
        this: Option<HandleId>,
        event: &EventRef,
    ) -> bool {
        let event = event.id();
        self.break_member(context, BreakpointKind::DetachEvent { this, event })
    }

    fn break_invoke(
        &self,
        context: &ThreadContext,
        this: Option<HandleId>,
        method: &MethodRef,
    ) -> bool {
        let method = method.id();
        self.break_member(context, BreakpointKind::InvokeMethod { this, method })
    }

    fn break_create(&self, context: &ThreadContext, type_descriptor: &TypeRef) -> bool {
        let type_id = type_descriptor.id();
        self.break_member(context, BreakpointKind::CreateObject { type_id })
    }

    fn break_exception(&self, context: &ThreadContext, exception: &Arc<ExceptionInfo>) -> bool {
        if !self.break_on_exception()
            || EvaluatingGuard::is_active()
            || !matches!(
                self.state.load(),
                DebuggerState::Running | DebuggerState::Continue
            )
        {
            return false;
        }
        debug!(context = %context.id(), message = exception.message(), "breaking on exception");
        self.enter_pause(
            context,
            executing_instruction(context),
            Activation::Exception,
            DebuggerState::PauseByBreakPoint,
        )
    }

    fn wait_for_continue(&self) -> bool {
        let resumed = loop {
            let guard = self.lock.lock();
            let state = self.state.load();
            match state {
                DebuggerState::Running => break true,
                DebuggerState::Continue => {
                    self.publish(state, DebuggerState::Running);
                    break true;
                }
                DebuggerState::Stopped => break false,
                DebuggerState::RequiredToStop => {
                    self.publish(state, DebuggerState::Stopped);
                    drop(guard);
                    self.notify(|observer, debugger| observer.on_stop_execution(debugger));
                    break false;
                }
                DebuggerState::RequiredToPause
                | DebuggerState::PauseByOperation
                | DebuggerState::PauseByBreakPoint => {
                    drop(guard);
                    self.notify(|observer, debugger| observer.on_block_execution(debugger));
                    let mut guard = self.lock.lock();
                    if matches!(
                        self.state.load(),
                        DebuggerState::RequiredToPause
                            | DebuggerState::PauseByOperation
                            | DebuggerState::PauseByBreakPoint
                    ) {
                        self.changed.wait(&mut guard);
                    }
                }
            }
        };
        self.registry.lock().release_current();
        resumed
    }
}
