//! Debugger state machine
//!
//! The state is read by every interpreting thread before every instruction
//! and written by both interpreting threads and the controller, so it lives
//! in an atomic. Request states (`Continue`, `RequiredToPause`,
//! `RequiredToStop`) are published by the controller and resolved by an
//! interpreting thread at the next instruction boundary:
//!
//! ```text
//!                     run     pause   stop    step
//! Running                     RTP     RTS
//! PauseByOperation    C               RTS     C
//! PauseByBreakPoint   C               RTS     C
//! Stopped             R       RTP             R
//! Continue            soon becomes Running
//! RequiredToPause     soon becomes PauseByOperation
//! RequiredToStop      soon becomes Stopped
//! ```

use crate::breakpoint::BreakpointId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};

/// State of a debugger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DebuggerState {
    /// Threads execute freely
    Running,
    /// Paused by [`Debugger::pause`](crate::Debugger::pause) or a finished step
    PauseByOperation,
    /// Paused by a breakpoint or an exception
    PauseByBreakPoint,
    /// No debug session; executing threads abort
    Stopped,
    /// Resume requested while paused
    Continue,
    /// Pause requested while running
    RequiredToPause,
    /// Stop requested
    RequiredToStop,
}

impl DebuggerState {
    /// Whether the state blocks interpreting threads
    pub fn is_paused(self) -> bool {
        matches!(
            self,
            DebuggerState::PauseByOperation | DebuggerState::PauseByBreakPoint
        )
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => DebuggerState::Running,
            1 => DebuggerState::PauseByOperation,
            2 => DebuggerState::PauseByBreakPoint,
            4 => DebuggerState::Continue,
            5 => DebuggerState::RequiredToPause,
            6 => DebuggerState::RequiredToStop,
            _ => DebuggerState::Stopped,
        }
    }
}

impl fmt::Display for DebuggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a running debugger decides to pause without a breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RunningType {
    /// Pause only at breakpoints
    RunUntilBreakPoint,
    /// Pause at the next row in the same function or a caller
    RunStepOver,
    /// Pause at the next row anywhere, callees included
    RunStepInto,
}

impl RunningType {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RunningType::RunStepOver,
            2 => RunningType::RunStepInto,
            _ => RunningType::RunUntilBreakPoint,
        }
    }
}

/// What caused the most recent pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activation {
    /// A breakpoint matched
    Breakpoint(BreakpointId),
    /// A pause request or a finished step
    Pause,
    /// An exception was raised with exception breaking enabled
    Exception,
}

/// Atomic cell holding a [`DebuggerState`].
#[derive(Debug)]
#[repr(transparent)]
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn new(state: DebuggerState) -> Self {
        AtomicState(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> DebuggerState {
        DebuggerState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: DebuggerState) {
        self.0.store(state as u8, Ordering::Release)
    }
}

/// Atomic cell holding a [`RunningType`].
#[derive(Debug)]
#[repr(transparent)]
pub(crate) struct AtomicRunningType(AtomicU8);

impl AtomicRunningType {
    pub(crate) fn new(running_type: RunningType) -> Self {
        AtomicRunningType(AtomicU8::new(running_type as u8))
    }

    pub(crate) fn load(&self) -> RunningType {
        RunningType::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, running_type: RunningType) {
        self.0.store(running_type as u8, Ordering::Release)
    }
}

const NO_ACTIVATION: i64 = -1;
const PAUSE_ACTIVATION: i64 = -2;
const EXCEPTION_ACTIVATION: i64 = -3;

/// Atomic cell holding the last [`Activation`].
#[derive(Debug)]
pub(crate) struct AtomicActivation(AtomicI64);

impl AtomicActivation {
    pub(crate) fn new() -> Self {
        AtomicActivation(AtomicI64::new(NO_ACTIVATION))
    }

    pub(crate) fn load(&self) -> Option<Activation> {
        match self.0.load(Ordering::Acquire) {
            PAUSE_ACTIVATION => Some(Activation::Pause),
            EXCEPTION_ACTIVATION => Some(Activation::Exception),
            id if id >= 0 => Some(Activation::Breakpoint(BreakpointId::from_raw(id as u64))),
            _ => None,
        }
    }

    pub(crate) fn store(&self, activation: Activation) {
        let raw = match activation {
            Activation::Breakpoint(id) => id.as_u64() as i64,
            Activation::Pause => PAUSE_ACTIVATION,
            Activation::Exception => EXCEPTION_ACTIVATION,
        };
        self.0.store(raw, Ordering::Release)
    }
}
