//! Builders for every patch the orchestrator installs.
//!
//! Each function returns a [`HookSpec`]; nothing here touches the host until
//! the [`HookSpec`] is applied. Payloads that call back into the host capture it by
//! `Arc` because they outlive the orchestration pass.

use crate::event::{ClassLoadBus, ClassLoadEvent};
use crate::palette::BottomViewPalette;
use crate::registry::HookSpec;
use crate::relay::ColorRelay;
use crate::report::PatchId;
use crate::targets;
use imp_core::{
    ClassHandle, HookAction, HostAccess, HostError, Signature, SymbolCandidates,
    SymbolDescriptor, TypeName, Value,
};
use std::sync::Arc;

fn member(class: &ClassHandle, name: &str, signature: Signature) -> SymbolCandidates {
    SymbolCandidates::single(SymbolDescriptor::method(&class.name, name, signature))
}

/// Skip the package check: `sIsImeSupport = 1`.
pub fn force_ime_support(class: &ClassHandle) -> HookSpec {
    HookSpec::static_field(
        PatchId::ForceImeSupport,
        SymbolCandidates::single(SymbolDescriptor::field(
            &class.name,
            targets::IME_SUPPORT_FIELD,
        )),
        Value::Int(1),
    )
}

/// Voice-input button is broken outside the vendor IMEs; report it as unavailable.
pub fn disable_voice_input(class: &ClassHandle) -> HookSpec {
    HookSpec::hook(
        PatchId::DisableVoiceInput,
        member(
            class,
            targets::VOICE_INPUT_CHECK,
            Signature::exact(Vec::<TypeName>::new()),
        ),
        HookAction::Constant(Value::Bool(false)),
    )
}

/// Push the relayed colour into the bottom view, if one has been captured.
///
/// An empty relay is a silent no-op. Callback failures are logged and
/// swallowed; they must not surface in the host's call.
pub fn apply_bottom_view_color<H: HostAccess + ?Sized>(
    host: &H,
    class: &ClassHandle,
    relay: &ColorRelay,
) {
    let Some(raw) = relay.read() else {
        tracing::trace!("No navigation bar colour captured yet");
        return;
    };
    let palette = BottomViewPalette::derive(raw);
    if let Err(e) = host.invoke_static(
        class,
        targets::CUSTOMIZE_BOTTOM_VIEW_COLOR,
        palette.callback_args(),
    ) {
        tracing::debug!(class = %class, "Failed to customize bottom view colour: {e}");
    }
}

/// After the window's navigation bar colour is set, remember it and recolour
/// the bottom view right away.
pub fn nav_color_producer<H>(
    host: Arc<H>,
    class: ClassHandle,
    relay: Arc<ColorRelay>,
) -> HookSpec
where
    H: HostAccess + ?Sized + 'static,
{
    let target = SymbolCandidates::single(SymbolDescriptor::method(
        targets::PHONE_WINDOW_CLASS,
        targets::SET_NAV_BAR_COLOR,
        Signature::exact([TypeName::int()]),
    ));
    HookSpec::hook(
        PatchId::NavColorProducer,
        target,
        HookAction::after(move |frame| {
            let Some(color) = frame.arg(0).and_then(Value::as_int) else {
                return;
            };
            if relay.write(color) {
                apply_bottom_view_color(&*host, &class, &relay);
            }
        }),
    )
}

/// Once the bottom view is created, give it the relayed colour.
pub fn bottom_view_consumer<H>(
    host: Arc<H>,
    class: ClassHandle,
    relay: Arc<ColorRelay>,
) -> HookSpec
where
    H: HostAccess + ?Sized + 'static,
{
    let target = member(&class, targets::ADD_BOTTOM_VIEW, Signature::Any);
    HookSpec::hook(
        PatchId::BottomViewConsumer,
        target,
        HookAction::after(move |_| apply_bottom_view_color(&*host, &class, &relay)),
    )
}

/// `deleteNotSupportIme` becomes a no-op on the named listener class.
pub fn suppress_delete_not_support_ime(listener_class: &str) -> HookSpec {
    HookSpec::hook(
        PatchId::SuppressDeleteNotSupportIme,
        SymbolCandidates::single(SymbolDescriptor::method(
            listener_class,
            targets::DELETE_NOT_SUPPORT_IME,
            Signature::Any,
        )),
        HookAction::Constant(Value::Null),
    )
}

/// Publish a [`ClassLoadEvent`] after every completed `loadDex(ClassLoader, String)`.
pub fn class_load_entry(bus: Arc<ClassLoadBus>) -> HookSpec {
    HookSpec::hook(
        PatchId::ClassLoadEntry,
        SymbolCandidates::single(SymbolDescriptor::method(
            targets::MODULE_MANAGER_CLASS,
            targets::LOAD_DEX,
            Signature::exact(targets::LOAD_DEX_PARAMS.iter().copied()),
        )),
        HookAction::after(move |frame| match ClassLoadEvent::from_load_call(frame) {
            Some(event) => {
                bus.publish(&event);
            }
            None => tracing::debug!("loadDex completed without a class loader argument"),
        }),
    )
}

/// `getSupportIme()` answered from `sBottomViewHelper.mImm.getEnabledInputMethodList()`,
/// evaluated on every call.
pub fn live_support_ime_list<H>(host: Arc<H>, class: ClassHandle) -> HookSpec
where
    H: HostAccess + ?Sized + 'static,
{
    let target = member(&class, targets::GET_SUPPORT_IME, Signature::Any);
    HookSpec::hook(
        PatchId::LiveSupportImeList,
        target,
        HookAction::replace(move |_| enabled_input_methods(&*host, &class)),
    )
}

/// A null link anywhere in the chain yields `null`, like a safe-call chain.
pub fn enabled_input_methods<H: HostAccess + ?Sized>(
    host: &H,
    class: &ClassHandle,
) -> Result<Value, HostError> {
    let helper = host.read_static(class, targets::BOTTOM_VIEW_HELPER_FIELD)?;
    if helper.is_null() {
        return Ok(Value::Null);
    }
    let imm = host.read_field(&helper, targets::IMM_FIELD)?;
    if imm.is_null() {
        return Ok(Value::Null);
    }
    host.invoke(&imm, targets::ENABLED_IME_LIST, Vec::new())
}
