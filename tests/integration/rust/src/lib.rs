//! Integration test suite for the bytecode runtime
//!
//! This crate provides the shared fixtures used by the integration tests
//! that verify components work together across component boundaries.

/// Re-export components for test convenience
pub mod components {
    pub use bytecode_system;
    pub use core_types;
    pub use debugger;
    pub use interpreter;
}

pub mod fixtures {
    //! Programs and reflected objects shared by the integration tests

    use bytecode_system::{BuildError, InsType, Instruction, Program, ProgramBuilder};
    use core_types::{
        HandleId, PropertyInfo, PropertyRef, ReflectedObject, TextRange, TypeDescriptor, TypeRef,
        Value, ValueError, ValueResult,
    };
    use debugger::{set_debugger_for_current_thread, Debugger};
    use interpreter::{load_function, GlobalContext, LoadFunctionError, RuntimeException};
    use parking_lot::Mutex;
    use std::any::Any;
    use std::sync::{Arc, OnceLock};
    use std::thread::{self, JoinHandle};

    #[derive(Debug)]
    struct GaugeType {
        id: HandleId,
    }

    impl TypeDescriptor for GaugeType {
        fn id(&self) -> HandleId {
            self.id
        }

        fn type_name(&self) -> &str {
            "test::Gauge"
        }
    }

    /// Descriptor shared by every [`Gauge`]
    pub fn gauge_type() -> TypeRef {
        static TYPE: OnceLock<TypeRef> = OnceLock::new();
        TYPE.get_or_init(|| Arc::new(GaugeType { id: HandleId::next() }))
            .clone()
    }

    /// A reflected object holding one integer level
    #[derive(Debug)]
    pub struct Gauge {
        id: HandleId,
        level: Mutex<i32>,
    }

    impl Gauge {
        /// A new gauge wrapped as a script value, with its identity
        pub fn value(level: i32) -> (HandleId, Value) {
            let gauge = Arc::new(Gauge {
                id: HandleId::next(),
                level: Mutex::new(level),
            });
            (gauge.id, Value::Object(gauge))
        }
    }

    impl ReflectedObject for Gauge {
        fn object_id(&self) -> HandleId {
            self.id
        }

        fn type_descriptor(&self) -> TypeRef {
            gauge_type()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    /// The `Level` property of [`Gauge`]
    #[derive(Debug)]
    pub struct LevelProperty {
        id: HandleId,
    }

    impl LevelProperty {
        /// A new property with its own identity
        pub fn new() -> PropertyRef {
            Arc::new(LevelProperty { id: HandleId::next() })
        }
    }

    fn gauge(this: &Value) -> ValueResult<&Gauge> {
        this.as_object()
            .and_then(|object| object.as_any().downcast_ref::<Gauge>())
            .ok_or_else(|| ValueError::Native("not a gauge".to_string()))
    }

    impl PropertyInfo for LevelProperty {
        fn id(&self) -> HandleId {
            self.id
        }

        fn name(&self) -> &str {
            "Level"
        }

        fn get(&self, this: &Value) -> ValueResult<Value> {
            Ok(Value::I32(*gauge(this)?.level.lock()))
        }

        fn set(&self, this: &Value, value: Value) -> ValueResult<()> {
            *gauge(this)?.level.lock() = value.as_i128().unwrap_or_default() as i32;
            Ok(())
        }
    }

    /// Source of [`closure_program`]
    pub const CLOSURE_SOURCE: &str = "let double = func(x) {
  return x * 2;
};
return double(5) + 1;";

    /// `main` calls a closure through a proxy and returns `double(5) + 1`.
    ///
    /// Rows: 0 -> closure creation, 1 -> closure body, 3 -> call and return.
    /// The closure runs in its own thread context.
    pub fn closure_program() -> Result<Program, BuildError> {
        let mut builder = ProgramBuilder::new();
        let code = builder.add_module_code(CLOSURE_SOURCE);
        let row = |r| TextRange::line(code, r);

        builder.begin_function("main", &[], &[])?;
        builder.add_local("double")?;
        builder.emit_at(Instruction::LoadClosure { function: 1, count: 0 }, row(0));
        builder.emit_at(Instruction::StoreLocalVar(0), row(0));
        builder.emit_at(Instruction::LoadValue(Value::I32(5)), row(3));
        builder.emit_at(Instruction::LoadLocalVar(0), row(3));
        builder.emit_at(Instruction::InvokeProxy(1), row(3));
        builder.emit_at(Instruction::LoadValue(Value::I32(1)), row(3));
        builder.emit_at(Instruction::OpAdd(InsType::I4), row(3));
        builder.emit_at(Instruction::Return, row(3));
        builder.end_function()?;

        builder.begin_function("double", &["x"], &[])?;
        builder.emit_at(Instruction::LoadLocalVar(0), row(1));
        builder.emit_at(Instruction::LoadValue(Value::I32(2)), row(1));
        builder.emit_at(Instruction::OpMul(InsType::I4), row(1));
        builder.emit_at(Instruction::Return, row(1));
        builder.end_function()?;

        builder.build()
    }

    /// `main` raises "oops" inside a protected region and returns 7 from
    /// the handler.
    pub fn guarded_raise_program() -> Result<Program, BuildError> {
        let mut builder = ProgramBuilder::new();
        builder.begin_function("main", &[], &[])?;
        builder.emit(Instruction::InstallTry(4));
        builder.emit(Instruction::LoadValue(Value::string("oops")));
        builder.emit(Instruction::RaiseException);
        builder.emit(Instruction::UninstallTry(0));
        builder.emit(Instruction::LoadValue(Value::I32(7)));
        builder.emit(Instruction::Return);
        builder.end_function()?;
        builder.build()
    }

    /// `main(first, second)` reads `Level` of `second`, then of `first`,
    /// and returns the latter.
    pub fn gauge_program(level: &PropertyRef) -> Result<Program, BuildError> {
        let mut builder = ProgramBuilder::new();
        builder.begin_function("main", &["first", "second"], &[])?;
        builder.emit(Instruction::LoadLocalVar(1));
        builder.emit(Instruction::GetProperty(level.clone()));
        builder.emit(Instruction::Pop);
        builder.emit(Instruction::LoadLocalVar(0));
        builder.emit(Instruction::GetProperty(level.clone()));
        builder.emit(Instruction::Return);
        builder.end_function()?;
        builder.build()
    }

    /// Call `main` of `program` on a new OS thread with `debugger` attached
    pub fn spawn_main(
        debugger: &Arc<Debugger>,
        program: &Arc<Program>,
        args: Vec<Value>,
    ) -> Result<JoinHandle<Result<Value, RuntimeException>>, LoadFunctionError> {
        let global = Arc::new(GlobalContext::new(program.clone()));
        let main = load_function(&global, "main")?;
        let debugger = debugger.clone();
        Ok(thread::spawn(move || {
            set_debugger_for_current_thread(Some(debugger));
            let result = main.call(args);
            set_debugger_for_current_thread(None);
            result
        }))
    }
}
