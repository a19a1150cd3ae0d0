//! Core data model for the imp runtime patcher.
//!
//! Independent crate with no internal imp dependencies. Everything that
//! touches the patched process goes through the capability traits in
//! [`host`]; the rest of the workspace never talks to a runtime directly.

pub mod error;
pub mod host;
pub mod symbol;
pub mod types;

pub use error::{HostError, PatchError};
pub use host::{
    AdviceFn, Host, HookAction, HookEngine, HostAccess, Introspect, PropertyStore, ReplaceFn,
};
pub use symbol::{ResolvedSymbol, Signature, SymbolCandidates, SymbolDescriptor};
pub use types::{
    CallFrame, ClassHandle, FieldHandle, LoaderId, MethodHandle, ObjectRef, ProcessIdentity, TypeName,
    Value,
};
