//! Capability traits implemented by whatever actually owns the target process.
//!
//! The split mirrors the collaborators the patcher consumes:
//! - [`Introspect`]: class and member discovery within a loader
//! - [`HookEngine`]: installing interceptions and static-field writes
//! - [`HostAccess`]: reading state and calling into the host from payloads
//! - [`PropertyStore`]: the system property lookup used by the gate check

use crate::error::HostError;
use crate::types::{CallFrame, ClassHandle, FieldHandle, LoaderId, MethodHandle, Value};
use std::fmt;
use std::sync::Arc;

/// Body replacement. The original never runs; the returned value is handed
/// back to the caller.
pub type ReplaceFn = Arc<dyn Fn(&CallFrame) -> Result<Value, HostError> + Send + Sync>;

/// Observation-only advice. It cannot change the original's control flow.
pub type AdviceFn = Arc<dyn Fn(&CallFrame) + Send + Sync>;

/// What to do at a hooked call site.
#[derive(Clone)]
pub enum HookAction {
    Replace(ReplaceFn),
    Before(AdviceFn),
    /// Runs after the original returns normally; skipped when it throws.
    After(AdviceFn),
    Constant(Value),
}

impl HookAction {
    pub fn replace<F>(f: F) -> Self
    where
        F: Fn(&CallFrame) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        Self::Replace(Arc::new(f))
    }

    pub fn before<F>(f: F) -> Self
    where
        F: Fn(&CallFrame) + Send + Sync + 'static,
    {
        Self::Before(Arc::new(f))
    }

    pub fn after<F>(f: F) -> Self
    where
        F: Fn(&CallFrame) + Send + Sync + 'static,
    {
        Self::After(Arc::new(f))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Replace(_) => "replace",
            Self::Before(_) => "before",
            Self::After(_) => "after",
            Self::Constant(_) => "constant",
        }
    }
}

impl fmt::Debug for HookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

pub trait Introspect: Send + Sync {
    /// `Ok(None)` when the class does not exist in `loader`.
    /// `Err` only for names the host cannot parse.
    fn load_class(&self, name: &str, loader: &LoaderId) -> Result<Option<ClassHandle>, HostError>;

    /// Declared methods in declaration order.
    fn declared_methods(&self, class: &ClassHandle) -> Vec<MethodHandle>;

    fn declared_fields(&self, class: &ClassHandle) -> Vec<FieldHandle>;
}

pub trait HookEngine: Send + Sync {
    fn install(&self, method: &MethodHandle, action: HookAction) -> Result<(), HostError>;

    fn set_static_field(&self, field: &FieldHandle, value: Value) -> Result<(), HostError>;
}

pub trait HostAccess: Send + Sync {
    fn read_static(&self, class: &ClassHandle, field: &str) -> Result<Value, HostError>;

    fn read_field(&self, object: &Value, field: &str) -> Result<Value, HostError>;

    fn invoke_static(
        &self,
        class: &ClassHandle,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, HostError>;

    fn invoke(&self, object: &Value, method: &str, args: Vec<Value>) -> Result<Value, HostError>;
}

pub trait PropertyStore {
    fn get(&self, key: &str, default: &str) -> String;
}

/// Everything the orchestrator needs from a host, in one bound.
pub trait Host: Introspect + HookEngine + HostAccess {}

impl<T: Introspect + HookEngine + HostAccess + ?Sized> Host for T {}

impl<S: std::hash::BuildHasher> PropertyStore for std::collections::HashMap<String, String, S> {
    fn get(&self, key: &str, default: &str) -> String {
        std::collections::HashMap::get(self, key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_map_property_store_falls_back_to_default() {
        let mut props = HashMap::new();
        props.insert("ro.flag".to_string(), "1".to_string());
        assert_eq!(PropertyStore::get(&props, "ro.flag", "0"), "1");
        assert_eq!(PropertyStore::get(&props, "ro.other", "0"), "0");
    }

    #[test]
    fn test_action_kind_labels() {
        assert_eq!(HookAction::Constant(Value::Null).kind(), "constant");
        assert_eq!(HookAction::after(|_| {}).kind(), "after");
        assert_eq!(HookAction::before(|_| {}).kind(), "before");
        assert_eq!(HookAction::replace(|_| Ok(Value::Null)).kind(), "replace");
    }

    #[test]
    fn test_action_debug_shows_constant_literal() {
        let action = HookAction::Constant(Value::Bool(false));
        assert_eq!(format!("{action:?}"), "Constant(Bool(false))");
        assert_eq!(format!("{:?}", HookAction::after(|_| {})), "after");
    }
}
