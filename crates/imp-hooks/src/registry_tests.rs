//! Tests for hook installation and outcome capture.

use super::*;
use crate::memory_host::MemoryHost;
use imp_core::{ClassHandle, Signature, SymbolDescriptor};

fn boot() -> LoaderId {
    LoaderId::new("boot")
}

fn api_class(host: &MemoryHost) -> ClassHandle {
    host.class(&boot(), "a.Api")
        .method("isEnabled", &[], "boolean")
        .method("reset", &[], "void")
        .method("count", &[], "int")
        .static_field("sFlag", "int", Value::Int(0))
        .field("mInstance", "int")
        .handle()
}

fn method_target(name: &str) -> SymbolCandidates {
    SymbolCandidates::single(SymbolDescriptor::method("a.Api", name, Signature::Any))
}

fn field_target(name: &str) -> SymbolCandidates {
    SymbolCandidates::single(SymbolDescriptor::field("a.Api", name))
}

// ---------------------------------------------------------------------------
// apply: resolution + installation
// ---------------------------------------------------------------------------

#[test]
fn test_unresolved_target_attempts_nothing() {
    let host = MemoryHost::new();
    let registry = HookRegistry::new(&host);
    let guard = InstallGuard::new();
    let spec = HookSpec::hook(
        PatchId::DisableVoiceInput,
        SymbolCandidates::new(vec![
            SymbolDescriptor::method("x.Missing", "isEnabled", Signature::Any),
            SymbolDescriptor::method("y.Missing", "isEnabled", Signature::Any),
        ]),
        HookAction::Constant(Value::Bool(false)),
    );

    let outcome = registry.apply(&spec, &boot(), &guard);
    assert_eq!(outcome, Some(InstallationOutcome::SymbolNotFound));
    assert_eq!(host.installs(), 0);
    assert!(guard.is_empty());
}

#[test]
fn test_single_resolvable_candidate_installed_once_at_any_position() {
    for position in 0..3 {
        let host = MemoryHost::new();
        api_class(&host);
        let mut candidates = vec![
            SymbolDescriptor::method("x.Missing", "isEnabled", Signature::Any),
            SymbolDescriptor::method("y.Missing", "isEnabled", Signature::Any),
        ];
        candidates.insert(
            position,
            SymbolDescriptor::method("a.Api", "isEnabled", Signature::Any),
        );
        let spec = HookSpec::hook(
            PatchId::DisableVoiceInput,
            SymbolCandidates::new(candidates),
            HookAction::Constant(Value::Bool(false)),
        );

        let outcome = HookRegistry::new(&host).apply(&spec, &boot(), &InstallGuard::new());
        assert_eq!(outcome, Some(InstallationOutcome::Installed), "position {position}");
        assert_eq!(host.installs(), 1, "position {position}");
        let method = host.method(&boot(), "a.Api", "isEnabled").unwrap();
        assert_eq!(host.hooks_on(&method), 1);
    }
}

#[test]
fn test_guard_skips_duplicate_installation() {
    let host = MemoryHost::new();
    api_class(&host);
    let registry = HookRegistry::new(&host);
    let guard = InstallGuard::new();
    let spec = HookSpec::hook(
        PatchId::DisableVoiceInput,
        method_target("isEnabled"),
        HookAction::Constant(Value::Bool(false)),
    );

    assert_eq!(
        registry.apply(&spec, &boot(), &guard),
        Some(InstallationOutcome::Installed)
    );
    assert_eq!(registry.apply(&spec, &boot(), &guard), None);
    assert_eq!(host.installs(), 1);
    assert_eq!(guard.len(), 1);
}

#[test]
fn test_guard_distinguishes_hook_kinds() {
    let host = MemoryHost::new();
    api_class(&host);
    let registry = HookRegistry::new(&host);
    let guard = InstallGuard::new();

    let constant = HookSpec::hook(
        PatchId::DisableVoiceInput,
        method_target("isEnabled"),
        HookAction::Constant(Value::Bool(false)),
    );
    let after = HookSpec::hook(
        PatchId::BottomViewConsumer,
        method_target("isEnabled"),
        HookAction::after(|_| {}),
    );
    assert!(registry.apply(&constant, &boot(), &guard).is_some());
    assert!(registry.apply(&after, &boot(), &guard).is_some());
    assert_eq!(host.installs(), 2);
}

// ---------------------------------------------------------------------------
// failure isolation
// ---------------------------------------------------------------------------

#[test]
fn test_one_rejected_install_does_not_stop_siblings() {
    let host = MemoryHost::new();
    api_class(&host);
    host.reject_installs_on("reset");
    let registry = HookRegistry::new(&host);
    let guard = InstallGuard::new();

    let batch = [
        HookSpec::hook(
            PatchId::DisableVoiceInput,
            method_target("isEnabled"),
            HookAction::Constant(Value::Bool(false)),
        ),
        HookSpec::hook(
            PatchId::SuppressDeleteNotSupportIme,
            method_target("reset"),
            HookAction::Constant(Value::Null),
        ),
        HookSpec::static_field(PatchId::ForceImeSupport, field_target("sFlag"), Value::Int(1)),
    ];
    let outcomes: Vec<_> = batch
        .iter()
        .map(|spec| registry.apply(spec, &boot(), &guard).unwrap())
        .collect();

    assert!(outcomes[0].is_installed());
    assert!(matches!(
        outcomes[1],
        InstallationOutcome::Failed(HostError::Rejected { .. })
    ));
    assert!(outcomes[2].is_installed());
    let class = ClassHandle::new("a.Api", boot());
    assert_eq!(host.static_value(&class, "sFlag"), Some(Value::Int(1)));
}

#[test]
fn test_constant_type_mismatch_is_caught_before_engine() {
    let host = MemoryHost::new();
    api_class(&host);
    let registry = HookRegistry::new(&host);
    let spec = HookSpec::hook(
        PatchId::DisableVoiceInput,
        method_target("count"),
        HookAction::Constant(Value::Bool(false)),
    );

    let outcome = registry.apply(&spec, &boot(), &InstallGuard::new()).unwrap();
    match outcome {
        InstallationOutcome::Failed(HostError::TypeMismatch {
            expected, found, ..
        }) => {
            assert_eq!(expected, "int");
            assert_eq!(found, "boolean");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(host.installs(), 0);
}

#[test]
fn test_null_constant_accepted_for_void() {
    let host = MemoryHost::new();
    api_class(&host);
    let method = host.method(&boot(), "a.Api", "reset").unwrap();
    let registry = HookRegistry::new(&host);
    assert!(
        registry
            .install(&method, HookAction::Constant(Value::Null))
            .is_ok()
    );
    assert_eq!(host.call(&method, None, vec![]).unwrap(), Value::Null);
}

#[test]
fn test_replacement_result_checked_against_return_type() {
    let host = MemoryHost::new();
    api_class(&host);
    let count = host.method(&boot(), "a.Api", "count").unwrap();
    let registry = HookRegistry::new(&host);
    registry
        .install(&count, HookAction::replace(|_| Ok(Value::Bool(true))))
        .unwrap();

    match host.call(&count, None, vec![]) {
        Err(HostError::TypeMismatch {
            expected, found, ..
        }) => {
            assert_eq!(expected, "int");
            assert_eq!(found, "boolean");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_replacement_result_of_declared_type_passes_through() {
    let host = MemoryHost::new();
    api_class(&host);
    let count = host.method(&boot(), "a.Api", "count").unwrap();
    HookRegistry::new(&host)
        .install(&count, HookAction::replace(|_| Ok(Value::Int(42))))
        .unwrap();
    assert_eq!(host.call(&count, None, vec![]).unwrap(), Value::Int(42));
}

#[test]
fn test_field_patch_accepts_boxed_wrapper() {
    let host = MemoryHost::new();
    let class = host
        .class(&boot(), "a.Boxed")
        .static_field("sFlag", "java.lang.Integer", Value::Null)
        .handle();
    let spec = HookSpec::static_field(
        PatchId::ForceImeSupport,
        SymbolCandidates::single(SymbolDescriptor::field("a.Boxed", "sFlag")),
        Value::Int(1),
    );
    let outcome = HookRegistry::new(&host)
        .apply(&spec, &boot(), &InstallGuard::new())
        .unwrap();
    assert!(outcome.is_installed());
    assert_eq!(host.static_value(&class, "sFlag"), Some(Value::Int(1)));
}

#[test]
fn test_field_patch_on_instance_field_fails() {
    let host = MemoryHost::new();
    api_class(&host);
    let spec = HookSpec::static_field(
        PatchId::ForceImeSupport,
        field_target("mInstance"),
        Value::Int(1),
    );
    let outcome = HookRegistry::new(&host)
        .apply(&spec, &boot(), &InstallGuard::new())
        .unwrap();
    assert!(matches!(
        outcome,
        InstallationOutcome::Failed(HostError::NotStatic(_))
    ));
}

#[test]
fn test_field_patch_type_mismatch() {
    let host = MemoryHost::new();
    api_class(&host);
    let spec = HookSpec::static_field(
        PatchId::ForceImeSupport,
        field_target("sFlag"),
        Value::Str("1".into()),
    );
    let outcome = HookRegistry::new(&host)
        .apply(&spec, &boot(), &InstallGuard::new())
        .unwrap();
    assert!(matches!(
        outcome,
        InstallationOutcome::Failed(HostError::TypeMismatch { .. })
    ));
}

#[test]
fn test_payload_symbol_shape_mismatch() {
    let host = MemoryHost::new();
    api_class(&host);
    let spec = HookSpec::hook(
        PatchId::DisableVoiceInput,
        field_target("sFlag"),
        HookAction::Constant(Value::Int(1)),
    );
    let outcome = HookRegistry::new(&host)
        .apply(&spec, &boot(), &InstallGuard::new())
        .unwrap();
    match outcome {
        InstallationOutcome::Failed(HostError::TypeMismatch {
            expected, found, ..
        }) => {
            assert_eq!(expected, "method");
            assert_eq!(found, "field");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// field-patch idempotence
// ---------------------------------------------------------------------------

#[test]
fn test_set_static_field_twice_matches_once() {
    let once = MemoryHost::new();
    let twice = MemoryHost::new();
    let class = api_class(&once);
    api_class(&twice);

    let field = Resolver::new(&once).find_field(&class, "sFlag").unwrap();
    HookRegistry::new(&once)
        .set_static_field(&field, Value::Int(1))
        .unwrap();

    let field = Resolver::new(&twice).find_field(&class, "sFlag").unwrap();
    let registry = HookRegistry::new(&twice);
    registry.set_static_field(&field, Value::Int(1)).unwrap();
    registry.set_static_field(&field, Value::Int(1)).unwrap();

    assert_eq!(
        once.static_value(&class, "sFlag"),
        twice.static_value(&class, "sFlag")
    );
    assert_eq!(twice.static_value(&class, "sFlag"), Some(Value::Int(1)));
}

#[test]
fn test_hook_kind_from_payload() {
    let target = method_target("isEnabled");
    let kinds = [
        HookSpec::hook(PatchId::ClassLoadEntry, target.clone(), HookAction::after(|_| {})).kind(),
        HookSpec::hook(PatchId::ClassLoadEntry, target.clone(), HookAction::before(|_| {})).kind(),
        HookSpec::hook(
            PatchId::LiveSupportImeList,
            target.clone(),
            HookAction::replace(|_| Ok(Value::Null)),
        )
        .kind(),
        HookSpec::hook(PatchId::DisableVoiceInput, target, HookAction::Constant(Value::Null)).kind(),
    ];
    assert_eq!(
        kinds,
        [
            HookKind::After,
            HookKind::Before,
            HookKind::Replace,
            HookKind::ConstantReturn
        ]
    );
}
