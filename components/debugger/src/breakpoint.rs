//! Breakpoint definitions
//!
//! A breakpoint is identified by its [`BreakpointKind`], which doubles as the
//! lookup key the interpreter's hot path tests against. Targets are
//! [`HandleId`]s, never addresses, so a breakpoint does not keep the program
//! or reflected object it names alive.

use crate::debugger::Debugger;
use bytecode_system::Program;
use core_types::{EventRef, HandleId, MethodRef, PropertyRef, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier returned when a breakpoint is added.
///
/// Ids increase monotonically and are never handed out twice by the same
/// debugger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BreakpointId(u64);

impl BreakpointId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        BreakpointId(raw)
    }

    /// Raw numeric value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BreakpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "breakpoint {}", self.0)
    }
}

/// What a breakpoint matches.
///
/// `this` is the receiving object; `None` matches every receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakpointKind {
    /// An instruction is about to execute
    Instruction {
        /// Program identity
        program: HandleId,
        /// Instruction index
        instruction: usize,
    },
    /// A global variable is about to be read
    ReadGlobalVar {
        /// Program identity
        program: HandleId,
        /// Global variable index
        variable: usize,
    },
    /// A global variable is about to be written
    WriteGlobalVar {
        /// Program identity
        program: HandleId,
        /// Global variable index
        variable: usize,
    },
    /// A property is about to be read
    GetProperty {
        /// Receiver, or every receiver
        this: Option<HandleId>,
        /// Property identity
        property: HandleId,
    },
    /// A property is about to be written
    SetProperty {
        /// Receiver, or every receiver
        this: Option<HandleId>,
        /// Property identity
        property: HandleId,
    },
    /// A handler is about to be attached
    AttachEvent {
        /// Receiver, or every receiver
        this: Option<HandleId>,
        /// Event identity
        event: HandleId,
    },
    /// A listener is about to be detached
    DetachEvent {
        /// Receiver, or every receiver
        this: Option<HandleId>,
        /// Event identity
        event: HandleId,
    },
    /// A method is about to be invoked
    InvokeMethod {
        /// Receiver, or every receiver
        this: Option<HandleId>,
        /// Method identity
        method: HandleId,
    },
    /// An object is about to be constructed
    CreateObject {
        /// Type identity
        type_id: HandleId,
    },
}

impl BreakpointKind {
    /// The same target with the receiver widened to every object.
    pub fn any_receiver(self) -> Option<Self> {
        use BreakpointKind::*;
        match self {
            GetProperty { this: Some(_), property } => Some(GetProperty { this: None, property }),
            SetProperty { this: Some(_), property } => Some(SetProperty { this: None, property }),
            AttachEvent { this: Some(_), event } => Some(AttachEvent { this: None, event }),
            DetachEvent { this: Some(_), event } => Some(DetachEvent { this: None, event }),
            InvokeMethod { this: Some(_), method } => Some(InvokeMethod { this: None, method }),
            _ => None,
        }
    }
}

/// User hooks run when a breakpoint matches.
pub trait BreakpointAction: Send + Sync {
    /// Decide whether the breakpoint activates.
    ///
    /// Conditions are evaluated one at a time. Script code called from here
    /// runs without hitting breakpoints.
    fn evaluate_condition(&self, debugger: &Debugger) -> bool;

    /// Called after the breakpoint activated, before the thread blocks.
    fn post_action(&self, _debugger: &Debugger) {}
}

/// A breakpoint definition.
///
/// # Examples
///
/// ```
/// use bytecode_system::{Instruction, ProgramBuilder};
/// use debugger::{Breakpoint, BreakpointKind};
///
/// let mut builder = ProgramBuilder::new();
/// builder.begin_function("main", &[], &[]).unwrap();
/// builder.emit(Instruction::Return);
/// builder.end_function().unwrap();
/// let program = builder.build().unwrap();
///
/// let breakpoint = Breakpoint::instruction(&program, 0);
/// assert!(breakpoint.is_enabled());
/// assert_eq!(
///     breakpoint.kind(),
///     BreakpointKind::Instruction { program: program.id(), instruction: 0 }
/// );
/// ```
#[derive(Clone)]
pub struct Breakpoint {
    kind: BreakpointKind,
    enabled: bool,
    action: Option<Arc<dyn BreakpointAction>>,
}

impl Breakpoint {
    /// Breakpoint with an explicit kind
    pub fn new(kind: BreakpointKind) -> Self {
        Self {
            kind,
            enabled: true,
            action: None,
        }
    }

    /// Break before an instruction executes
    pub fn instruction(program: &Program, instruction: usize) -> Self {
        Self::new(BreakpointKind::Instruction {
            program: program.id(),
            instruction,
        })
    }

    /// Break before a global variable is read
    pub fn read(program: &Program, variable: usize) -> Self {
        Self::new(BreakpointKind::ReadGlobalVar {
            program: program.id(),
            variable,
        })
    }

    /// Break before a global variable is written
    pub fn write(program: &Program, variable: usize) -> Self {
        Self::new(BreakpointKind::WriteGlobalVar {
            program: program.id(),
            variable,
        })
    }

    /// Break before a property is read
    pub fn get(this: Option<HandleId>, property: &PropertyRef) -> Self {
        Self::new(BreakpointKind::GetProperty {
            this,
            property: property.id(),
        })
    }

    /// Break before a property is written
    pub fn set(this: Option<HandleId>, property: &PropertyRef) -> Self {
        Self::new(BreakpointKind::SetProperty {
            this,
            property: property.id(),
        })
    }

    /// Break before a handler is attached to an event
    pub fn attach(this: Option<HandleId>, event: &EventRef) -> Self {
        Self::new(BreakpointKind::AttachEvent {
            this,
            event: event.id(),
        })
    }

    /// Break before a listener is detached from an event
    pub fn detach(this: Option<HandleId>, event: &EventRef) -> Self {
        Self::new(BreakpointKind::DetachEvent {
            this,
            event: event.id(),
        })
    }

    /// Break before a method is invoked
    pub fn invoke(this: Option<HandleId>, method: &MethodRef) -> Self {
        Self::new(BreakpointKind::InvokeMethod {
            this,
            method: method.id(),
        })
    }

    /// Break before an object of a type is constructed
    pub fn create(type_descriptor: &TypeRef) -> Self {
        Self::new(BreakpointKind::CreateObject {
            type_id: type_descriptor.id(),
        })
    }

    /// Attach a condition and post-action
    pub fn with_action(mut self, action: Arc<dyn BreakpointAction>) -> Self {
        self.action = Some(action);
        self
    }

    /// Set the initial enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// What the breakpoint matches
    pub fn kind(&self) -> BreakpointKind {
        self.kind
    }

    /// Whether the breakpoint can activate
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The condition and post-action, if any
    pub fn action(&self) -> Option<&Arc<dyn BreakpointAction>> {
        self.action.as_ref()
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Debug for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Breakpoint")
            .field("kind", &self.kind)
            .field("enabled", &self.enabled)
            .field("action", &self.action.is_some())
            .finish()
    }
}
