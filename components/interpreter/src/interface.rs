//! Script implementations of interfaces

use core_types::{
    FunctionRef, HandleId, ReflectedObject, TypeDescriptor, TypeRef, Value, ValueError,
    ValueResult,
};
use std::any::Any;
use std::sync::{Arc, OnceLock};

#[derive(Debug)]
struct InterfaceProxyType {
    id: HandleId,
}

impl TypeDescriptor for InterfaceProxyType {
    fn id(&self) -> HandleId {
        self.id
    }

    fn type_name(&self) -> &str {
        "system::InterfaceProxy"
    }
}

fn interface_proxy_type() -> TypeRef {
    static TYPE: OnceLock<TypeRef> = OnceLock::new();
    TYPE.get_or_init(|| Arc::new(InterfaceProxyType { id: HandleId::next() }))
        .clone()
}

/// Object created by `CreateInterface`, dispatching method names to
/// function values.
///
/// # Examples
///
/// ```
/// use core_types::{NativeFunction, Value};
/// use interpreter::InterfaceProxy;
///
/// let Value::Function(hello) = NativeFunction::value("hello", |_| Ok(Value::string("hi"))) else {
///     unreachable!()
/// };
/// let proxy = InterfaceProxy::new(vec![("Hello".to_string(), hello)]);
/// assert_eq!(proxy.invoke("Hello", vec![]).unwrap(), Value::string("hi"));
/// assert!(proxy.invoke("Bye", vec![]).is_err());
/// ```
#[derive(Debug)]
pub struct InterfaceProxy {
    id: HandleId,
    methods: Vec<(String, FunctionRef)>,
}

impl InterfaceProxy {
    /// Create a proxy from `(method name, implementation)` pairs
    pub fn new(methods: Vec<(String, FunctionRef)>) -> Self {
        Self {
            id: HandleId::next(),
            methods,
        }
    }

    /// Names of the implemented methods, in creation order
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|(name, _)| name.as_str())
    }

    /// Implementation of a method
    pub fn method(&self, name: &str) -> Option<&FunctionRef> {
        self.methods
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, function)| function)
    }

    /// Call a method by name
    pub fn invoke(&self, name: &str, args: Vec<Value>) -> ValueResult<Value> {
        let function = self.method(name).ok_or_else(|| {
            ValueError::InvalidOperation(format!("interface proxy has no method {}", name))
        })?;
        function.invoke(args)
    }
}

impl ReflectedObject for InterfaceProxy {
    fn object_id(&self) -> HandleId {
        self.id
    }

    fn type_descriptor(&self) -> TypeRef {
        interface_proxy_type()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
