//! The reflection boundary.
//!
//! The interpreter never implements types, properties, methods or events
//! itself. It receives them as trait objects inside instructions and values,
//! and decides only when they are called. Every entity exposes a
//! [`HandleId`] which the debugger uses as a breakpoint key.

use crate::error::{ValueError, ValueResult};
use crate::handle::HandleId;
use crate::value::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared reference to a type descriptor.
pub type TypeRef = Arc<dyn TypeDescriptor>;
/// Shared reference to a reflected object.
pub type ObjectRef = Arc<dyn ReflectedObject>;
/// Shared reference to a callable function.
pub type FunctionRef = Arc<dyn Callable>;
/// Shared reference to a property.
pub type PropertyRef = Arc<dyn PropertyInfo>;
/// Shared reference to a method.
pub type MethodRef = Arc<dyn MethodInfo>;
/// Shared reference to an event.
pub type EventRef = Arc<dyn EventInfo>;

/// Describes a type known to the reflection layer.
///
/// The default `test` and `convert` cover reflected objects: an object
/// passes when its type is assignable to this type, and `null` converts to
/// any object type.
pub trait TypeDescriptor: fmt::Debug + Send + Sync {
    /// Stable identity of the type.
    fn id(&self) -> HandleId;

    /// Full name of the type.
    fn type_name(&self) -> &str;

    /// Direct base types.
    fn base_types(&self) -> Vec<TypeRef> {
        Vec::new()
    }

    /// Whether a value of type `other` may be used where this type is expected.
    fn is_assignable_from(&self, other: &dyn TypeDescriptor) -> bool {
        if self.id() == other.id() {
            return true;
        }
        other
            .base_types()
            .iter()
            .any(|base| self.is_assignable_from(base.as_ref()))
    }

    /// Whether `value` is an instance of this type.
    fn test(&self, value: &Value) -> bool {
        match value {
            Value::Object(object) => self.is_assignable_from(object.type_descriptor().as_ref()),
            _ => false,
        }
    }

    /// Convert `value` to this type.
    fn convert(&self, value: &Value) -> ValueResult<Value> {
        if value.is_null() || self.test(value) {
            Ok(value.clone())
        } else {
            Err(ValueError::Conversion {
                from: value.value_type(),
                to: self.type_name().to_string(),
            })
        }
    }
}

/// An object instance owned by the reflection layer.
pub trait ReflectedObject: fmt::Debug + Send + Sync {
    /// Stable identity of the object.
    fn object_id(&self) -> HandleId;

    /// Runtime type of the object.
    fn type_descriptor(&self) -> TypeRef;

    /// Borrow as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Convert into a shared `Any` for owned downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Release native resources held by the object.
    fn dispose(&self) -> ValueResult<()> {
        Ok(())
    }
}

/// Which accessor of a property a method implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    /// The property getter
    Getter,
    /// The property setter
    Setter,
}

/// A property of a reflected type.
pub trait PropertyInfo: fmt::Debug + Send + Sync {
    /// Stable identity of the property.
    fn id(&self) -> HandleId;

    /// Property name.
    fn name(&self) -> &str;

    /// Read the property from `this`.
    fn get(&self, this: &Value) -> ValueResult<Value>;

    /// Write the property on `this`.
    fn set(&self, this: &Value, value: Value) -> ValueResult<()>;
}

/// A method or constructor of a reflected type.
pub trait MethodInfo: fmt::Debug + Send + Sync {
    /// Stable identity of the method.
    fn id(&self) -> HandleId;

    /// Method name.
    fn name(&self) -> &str;

    /// Whether the method is invoked without a `this` value.
    fn is_static(&self) -> bool {
        false
    }

    /// Whether the method constructs a new instance.
    fn is_constructor(&self) -> bool {
        false
    }

    /// The type a constructor produces, or the declaring type.
    fn owner_type(&self) -> Option<TypeRef> {
        None
    }

    /// The property this method is an accessor of.
    fn owner_property(&self) -> Option<(PropertyRef, Accessor)> {
        None
    }

    /// Call the method. `this` is `None` for static methods and constructors.
    fn invoke(&self, this: Option<&Value>, args: Vec<Value>) -> ValueResult<Value>;
}

/// An event of a reflected type.
pub trait EventInfo: fmt::Debug + Send + Sync {
    /// Stable identity of the event.
    fn id(&self) -> HandleId;

    /// Event name.
    fn name(&self) -> &str;

    /// Attach `handler` to the event on `this`, returning a listener token.
    fn attach(&self, this: &Value, handler: Value) -> ValueResult<Value>;

    /// Detach a listener previously returned by [`EventInfo::attach`].
    fn detach(&self, this: &Value, listener: &Value) -> ValueResult<bool>;
}

/// A function value that the host or the interpreter can call.
pub trait Callable: fmt::Debug + Send + Sync {
    /// Stable identity of this function value.
    fn function_id(&self) -> HandleId;

    /// Function name, for diagnostics.
    fn name(&self) -> &str;

    /// Call the function.
    fn invoke(&self, args: Vec<Value>) -> ValueResult<Value>;

    /// Borrow as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

type NativeBody = dyn Fn(Vec<Value>) -> ValueResult<Value> + Send + Sync;

/// A [`Callable`] backed by a Rust closure.
///
/// # Examples
///
/// ```
/// use core_types::{Callable, NativeFunction, Value};
///
/// let double = NativeFunction::new("double", |args| match args.first() {
///     Some(Value::I32(n)) => Ok(Value::I32(n * 2)),
///     _ => Ok(Value::Null),
/// });
/// assert_eq!(double.invoke(vec![Value::I32(21)]).unwrap(), Value::I32(42));
/// ```
pub struct NativeFunction {
    id: HandleId,
    name: String,
    body: Box<NativeBody>,
}

impl NativeFunction {
    /// Wrap a closure.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> ValueResult<Value> + Send + Sync + 'static,
    {
        Self {
            id: HandleId::next(),
            name: name.into(),
            body: Box::new(body),
        }
    }

    /// Wrap a closure into a function value.
    pub fn value<F>(name: impl Into<String>, body: F) -> Value
    where
        F: Fn(Vec<Value>) -> ValueResult<Value> + Send + Sync + 'static,
    {
        Value::Function(Arc::new(Self::new(name, body)))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl Callable for NativeFunction {
    fn function_id(&self) -> HandleId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, args: Vec<Value>) -> ValueResult<Value> {
        (self.body)(args)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
