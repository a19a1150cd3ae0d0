//! In-memory host for dry runs and tests.
//!
//! Classes are declared per loader with [`MemoryHost::class`]. Installed
//! hooks are kept per method and honoured by [`MemoryHost::call`], which
//! simulates the host invoking a method: before-advice, then the replacement
//! (or the original body), then after-advice unless the body failed.

use imp_core::{
    CallFrame, ClassHandle, FieldHandle, HookAction, HookEngine, HostAccess, HostError, Introspect,
    LoaderId, MethodHandle, ObjectRef, TypeName, Value,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Original method body.
pub type Body = Arc<dyn Fn(&CallFrame) -> Result<Value, HostError> + Send + Sync>;

/// A static call made through [`HostAccess::invoke_static`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCall {
    pub class: String,
    pub method: String,
    pub args: Vec<Value>,
}

struct MethodDef {
    handle: MethodHandle,
    body: Option<Body>,
}

struct ClassDef {
    handle: ClassHandle,
    methods: Vec<MethodDef>,
    fields: Vec<FieldHandle>,
}

#[derive(Default)]
struct ObjectDef {
    fields: HashMap<String, Value>,
    methods: HashMap<String, Body>,
}

type ClassKey = (LoaderId, String);
type StaticKey = (LoaderId, String, String);

#[derive(Default)]
struct State {
    classes: HashMap<ClassKey, ClassDef>,
    statics: HashMap<StaticKey, Value>,
    hooks: HashMap<MethodHandle, Vec<HookAction>>,
    objects: HashMap<u64, ObjectDef>,
    rejected: HashSet<String>,
    static_calls: Vec<StaticCall>,
    next_object: u64,
}

impl State {
    fn class_mut(&mut self, class: &ClassHandle) -> &mut ClassDef {
        self.classes
            .entry((class.loader.clone(), class.name.clone()))
            .or_insert_with(|| ClassDef {
                handle: class.clone(),
                methods: Vec::new(),
                fields: Vec::new(),
            })
    }

    fn class(&self, class: &ClassHandle) -> Option<&ClassDef> {
        self.classes.get(&(class.loader.clone(), class.name.clone()))
    }

    fn object(&self, object: &Value, member: &str) -> Result<&ObjectDef, HostError> {
        match object {
            Value::Object(ObjectRef { id, .. }) => {
                self.objects
                    .get(id)
                    .ok_or_else(|| HostError::Invocation {
                        symbol: member.to_string(),
                        message: format!("stale object #{id}"),
                    })
            }
            Value::Null => Err(HostError::Invocation {
                symbol: member.to_string(),
                message: "null receiver".to_string(),
            }),
            other => Err(HostError::TypeMismatch {
                symbol: member.to_string(),
                expected: "object".to_string(),
                found: other.kind().to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct MemoryHost {
    state: Mutex<State>,
    lookups: AtomicUsize,
    installs: AtomicUsize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Declare (or reopen) `name` in `loader`.
    pub fn class(&self, loader: &LoaderId, name: &str) -> ClassBuilder<'_> {
        let handle = ClassHandle::new(name, loader.clone());
        self.state().class_mut(&handle);
        ClassBuilder { host: self, handle }
    }

    /// Allocate a host object with the given instance fields.
    pub fn new_object(&self, class: &str, fields: Vec<(&str, Value)>) -> Value {
        let mut state = self.state();
        state.next_object += 1;
        let id = state.next_object;
        let fields = fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        state.objects.insert(
            id,
            ObjectDef {
                fields,
                methods: HashMap::new(),
            },
        );
        Value::Object(ObjectRef {
            class: class.to_string(),
            id,
        })
    }

    /// Give `object` an instance method. No-op for non-object values.
    pub fn object_method<F>(&self, object: &Value, name: &str, body: F)
    where
        F: Fn(&CallFrame) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        if let Value::Object(ObjectRef { id, .. }) = object
            && let Some(def) = self.state().objects.get_mut(id)
        {
            def.methods.insert(name.to_string(), Arc::new(body));
        }
    }

    pub fn set_static(&self, class: &ClassHandle, field: &str, value: Value) {
        self.state().statics.insert(
            (class.loader.clone(), class.name.clone(), field.to_string()),
            value,
        );
    }

    pub fn static_value(&self, class: &ClassHandle, field: &str) -> Option<Value> {
        self.state()
            .statics
            .get(&(class.loader.clone(), class.name.clone(), field.to_string()))
            .cloned()
    }

    /// First declared method called `name`.
    pub fn method(&self, loader: &LoaderId, class: &str, name: &str) -> Option<MethodHandle> {
        let handle = ClassHandle::new(class, loader.clone());
        self.state()
            .class(&handle)?
            .methods
            .iter()
            .find(|m| m.handle.name == name)
            .map(|m| m.handle.clone())
    }

    /// Make every install or field write on a member called `name` fail.
    pub fn reject_installs_on(&self, name: &str) {
        self.state().rejected.insert(name.to_string());
    }

    pub fn hooks_on(&self, method: &MethodHandle) -> usize {
        self.state().hooks.get(method).map_or(0, Vec::len)
    }

    pub fn static_calls(&self) -> Vec<StaticCall> {
        self.state().static_calls.clone()
    }

    /// Number of class lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of install and static-field requests received so far.
    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    /// Invoke `method` the way the host would, running installed hooks.
    pub fn call(
        &self,
        method: &MethodHandle,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Value, HostError> {
        // Hooks may call back into the host; never hold the lock across them.
        let (hooks, body) = {
            let state = self.state();
            let hooks = state.hooks.get(method).cloned().unwrap_or_default();
            let body = state
                .class(&method.class)
                .and_then(|c| c.methods.iter().find(|m| m.handle == *method))
                .and_then(|m| m.body.clone());
            (hooks, body)
        };

        let mut frame = CallFrame::new(this, args);
        for hook in &hooks {
            if let HookAction::Before(advice) = hook {
                advice(&frame);
            }
        }

        let replacement = hooks
            .iter()
            .rev()
            .find(|h| matches!(h, HookAction::Replace(_) | HookAction::Constant(_)));
        let result = match (replacement, body) {
            (Some(HookAction::Replace(replace)), _) => replace(&frame)?,
            (Some(HookAction::Constant(value)), _) => value.clone(),
            (_, Some(body)) => body(&frame)?,
            (_, None) => Value::Null,
        };

        frame.result = Some(result.clone());
        for hook in &hooks {
            if let HookAction::After(advice) = hook {
                advice(&frame);
            }
        }
        Ok(result)
    }
}

/// Chained declarations on one class.
pub struct ClassBuilder<'a> {
    host: &'a MemoryHost,
    handle: ClassHandle,
}

impl ClassBuilder<'_> {
    pub fn handle(&self) -> ClassHandle {
        self.handle.clone()
    }

    fn declare(self, name: &str, params: &[&str], ret: &str, is_static: bool, body: Option<Body>) -> Self {
        let handle = MethodHandle {
            class: self.handle.clone(),
            name: name.to_string(),
            params: params.iter().map(|p| TypeName::new(*p)).collect(),
            return_type: TypeName::new(ret),
            is_static,
        };
        self.host
            .state()
            .class_mut(&self.handle)
            .methods
            .push(MethodDef { handle, body });
        self
    }

    pub fn method(self, name: &str, params: &[&str], ret: &str) -> Self {
        self.declare(name, params, ret, false, None)
    }

    pub fn static_method(self, name: &str, params: &[&str], ret: &str) -> Self {
        self.declare(name, params, ret, true, None)
    }

    pub fn method_with_body<F>(self, name: &str, params: &[&str], ret: &str, body: F) -> Self
    where
        F: Fn(&CallFrame) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        self.declare(name, params, ret, false, Some(Arc::new(body)))
    }

    pub fn static_field(self, name: &str, ty: &str, initial: Value) -> Self {
        self.field_def(name, ty, true);
        self.host.set_static(&self.handle, name, initial);
        self
    }

    pub fn field(self, name: &str, ty: &str) -> Self {
        self.field_def(name, ty, false);
        self
    }

    fn field_def(&self, name: &str, ty: &str, is_static: bool) {
        let field = FieldHandle {
            class: self.handle.clone(),
            name: name.to_string(),
            ty: TypeName::new(ty),
            is_static,
        };
        self.host
            .state()
            .class_mut(&self.handle)
            .fields
            .push(field);
    }
}

impl Introspect for MemoryHost {
    fn load_class(&self, name: &str, loader: &LoaderId) -> Result<Option<ClassHandle>, HostError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(HostError::Malformed(name.to_string()));
        }
        Ok(self
            .state()
            .classes
            .get(&(loader.clone(), name.to_string()))
            .map(|c| c.handle.clone()))
    }

    fn declared_methods(&self, class: &ClassHandle) -> Vec<MethodHandle> {
        self.state()
            .class(class)
            .map(|c| c.methods.iter().map(|m| m.handle.clone()).collect())
            .unwrap_or_default()
    }

    fn declared_fields(&self, class: &ClassHandle) -> Vec<FieldHandle> {
        self.state()
            .class(class)
            .map(|c| c.fields.clone())
            .unwrap_or_default()
    }
}

impl HookEngine for MemoryHost {
    fn install(&self, method: &MethodHandle, action: HookAction) -> Result<(), HostError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        if state.rejected.contains(&method.name) {
            return Err(HostError::Rejected {
                symbol: method.descriptor(),
                reason: "rejected by host".to_string(),
            });
        }
        state.hooks.entry(method.clone()).or_default().push(action);
        Ok(())
    }

    fn set_static_field(&self, field: &FieldHandle, value: Value) -> Result<(), HostError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        if state.rejected.contains(&field.name) {
            return Err(HostError::Rejected {
                symbol: field.to_string(),
                reason: "rejected by host".to_string(),
            });
        }
        state.statics.insert(
            (
                field.class.loader.clone(),
                field.class.name.clone(),
                field.name.clone(),
            ),
            value,
        );
        Ok(())
    }
}

impl HostAccess for MemoryHost {
    fn read_static(&self, class: &ClassHandle, field: &str) -> Result<Value, HostError> {
        self.static_value(class, field)
            .ok_or_else(|| HostError::NoSuchMember {
                target: class.name.clone(),
                member: field.to_string(),
            })
    }

    fn read_field(&self, object: &Value, field: &str) -> Result<Value, HostError> {
        let state = self.state();
        state
            .object(object, field)?
            .fields
            .get(field)
            .cloned()
            .ok_or_else(|| HostError::NoSuchMember {
                target: object.kind().to_string(),
                member: field.to_string(),
            })
    }

    fn invoke_static(
        &self,
        class: &ClassHandle,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, HostError> {
        let handle = {
            let mut state = self.state();
            state.static_calls.push(StaticCall {
                class: class.name.clone(),
                method: method.to_string(),
                args: args.clone(),
            });
            state
                .class(class)
                .and_then(|c| c.methods.iter().find(|m| m.handle.name == method))
                .map(|m| m.handle.clone())
        };
        match handle {
            Some(handle) => self.call(&handle, None, args),
            None => Err(HostError::NoSuchMember {
                target: class.name.clone(),
                member: method.to_string(),
            }),
        }
    }

    fn invoke(&self, object: &Value, method: &str, args: Vec<Value>) -> Result<Value, HostError> {
        let body = {
            let state = self.state();
            state
                .object(object, method)?
                .methods
                .get(method)
                .cloned()
                .ok_or_else(|| HostError::NoSuchMember {
                    target: object.kind().to_string(),
                    member: method.to_string(),
                })?
        };
        body(&CallFrame::new(Some(object.clone()), args))
    }
}
