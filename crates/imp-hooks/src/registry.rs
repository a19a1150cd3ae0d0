//! Hook installation with per-attempt outcome capture.
//!
//! Every attempt is converted into an [`InstallationOutcome`]; nothing an
//! individual install does can abort its siblings.

use crate::report::PatchId;
use crate::resolver::Resolver;
use imp_core::{
    FieldHandle, HookAction, HookEngine, HostError, Introspect, LoaderId, MethodHandle,
    ResolvedSymbol, SymbolCandidates, Value,
};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookKind {
    Replace,
    Before,
    After,
    ConstantReturn,
    FieldPatch,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Before => "before",
            Self::After => "after",
            Self::ConstantReturn => "constant-return",
            Self::FieldPatch => "field-patch",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What gets installed once the target resolves.
#[derive(Debug, Clone)]
pub enum Payload {
    Hook(HookAction),
    /// Written once at install time, not on each access.
    StaticField(Value),
}

/// One patch: where it goes and what it does. Immutable once built.
#[derive(Debug, Clone)]
pub struct HookSpec {
    pub id: PatchId,
    pub target: SymbolCandidates,
    pub payload: Payload,
}

impl HookSpec {
    pub fn hook(id: PatchId, target: SymbolCandidates, action: HookAction) -> Self {
        Self {
            id,
            target,
            payload: Payload::Hook(action),
        }
    }

    pub fn static_field(id: PatchId, target: SymbolCandidates, value: Value) -> Self {
        Self {
            id,
            target,
            payload: Payload::StaticField(value),
        }
    }

    pub fn kind(&self) -> HookKind {
        match &self.payload {
            Payload::StaticField(_) => HookKind::FieldPatch,
            Payload::Hook(HookAction::Replace(_)) => HookKind::Replace,
            Payload::Hook(HookAction::Before(_)) => HookKind::Before,
            Payload::Hook(HookAction::After(_)) => HookKind::After,
            Payload::Hook(HookAction::Constant(_)) => HookKind::ConstantReturn,
        }
    }
}

/// Result of one installation attempt. Observability only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "cause", rename_all = "kebab-case")]
pub enum InstallationOutcome {
    Installed,
    SymbolNotFound,
    Failed(#[serde(serialize_with = "serialize_cause")] HostError),
}

fn serialize_cause<S: Serializer>(cause: &HostError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(cause)
}

impl InstallationOutcome {
    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed)
    }
}

/// At-most-once ledger of (symbol, hook kind) pairs.
///
/// Claims are never released: a failed installation is not retried.
#[derive(Debug, Default)]
pub struct InstallGuard {
    claimed: Mutex<HashSet<(ResolvedSymbol, HookKind)>>,
}

impl InstallGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` the first time a pair is seen, `false` afterwards.
    pub fn claim(&self, symbol: &ResolvedSymbol, kind: HookKind) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((symbol.clone(), kind))
    }

    pub fn len(&self) -> usize {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Installs hooks through the host's [`HookEngine`].
pub struct HookRegistry<'h, H: ?Sized> {
    host: &'h H,
}

impl<'h, H: Introspect + HookEngine + ?Sized> HookRegistry<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Resolve `spec.target` in `loader` and install on success.
    ///
    /// An unresolved target is reported as [`InstallationOutcome::SymbolNotFound`]
    /// and nothing is attempted. Returns `None` when `guard` has already seen
    /// this symbol and hook kind; the duplicate is skipped, not recorded.
    pub fn apply(
        &self,
        spec: &HookSpec,
        loader: &LoaderId,
        guard: &InstallGuard,
    ) -> Option<InstallationOutcome> {
        let Some(symbol) = Resolver::new(self.host).resolve(&spec.target, loader) else {
            tracing::info!(patch = %spec.id, target = %spec.target, %loader, "Symbol not found");
            return Some(InstallationOutcome::SymbolNotFound);
        };
        if !guard.claim(&symbol, spec.kind()) {
            tracing::debug!(patch = %spec.id, %symbol, "Already installed, skipping");
            return None;
        }
        Some(self.install_resolved(spec, &symbol))
    }

    /// Install `spec` on an already resolved symbol.
    pub fn install_resolved(&self, spec: &HookSpec, symbol: &ResolvedSymbol) -> InstallationOutcome {
        let result = match (symbol, &spec.payload) {
            (ResolvedSymbol::Method(method), Payload::Hook(action)) => {
                self.install(method, action.clone())
            }
            (ResolvedSymbol::Field(field), Payload::StaticField(value)) => {
                self.set_static_field(field, value.clone())
            }
            (other, payload) => Err(HostError::TypeMismatch {
                symbol: other.to_string(),
                expected: match payload {
                    Payload::Hook(_) => "method".to_string(),
                    Payload::StaticField(_) => "field".to_string(),
                },
                found: symbol_kind(other).to_string(),
            }),
        };

        match result {
            Ok(()) => {
                tracing::info!(patch = %spec.id, kind = %spec.kind(), %symbol, "Hook installed");
                InstallationOutcome::Installed
            }
            Err(cause) => {
                tracing::debug!(patch = %spec.id, kind = %spec.kind(), %symbol, %cause, "Hook installation failed");
                InstallationOutcome::Failed(cause)
            }
        }
    }

    /// Install an interception on `method`.
    ///
    /// Constant literals are checked against the declared return type before
    /// the engine sees them. Replacement results are checked on every call.
    pub fn install(&self, method: &MethodHandle, action: HookAction) -> Result<(), HostError> {
        let action = match action {
            HookAction::Constant(value) if !method.return_type.accepts(&value) => {
                return Err(return_mismatch(method, &value));
            }
            HookAction::Replace(inner) => {
                let method = method.clone();
                HookAction::replace(move |frame| {
                    let value = inner(frame)?;
                    if method.return_type.accepts(&value) {
                        Ok(value)
                    } else {
                        Err(return_mismatch(&method, &value))
                    }
                })
            }
            other => other,
        };
        self.host.install(method, action)
    }

    /// Write `value` into a static field once.
    pub fn set_static_field(&self, field: &FieldHandle, value: Value) -> Result<(), HostError> {
        if !field.is_static {
            return Err(HostError::NotStatic(field.to_string()));
        }
        if !field.ty.accepts(&value) {
            return Err(HostError::TypeMismatch {
                symbol: field.to_string(),
                expected: field.ty.to_string(),
                found: value.kind().to_string(),
            });
        }
        self.host.set_static_field(field, value)
    }
}

fn return_mismatch(method: &MethodHandle, value: &Value) -> HostError {
    HostError::TypeMismatch {
        symbol: method.descriptor(),
        expected: method.return_type.to_string(),
        found: value.kind().to_string(),
    }
}

fn symbol_kind(symbol: &ResolvedSymbol) -> &'static str {
    match symbol {
        ResolvedSymbol::Class(_) => "class",
        ResolvedSymbol::Method(_) => "method",
        ResolvedSymbol::Field(_) => "field",
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
