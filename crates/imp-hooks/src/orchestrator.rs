//! Top-level patching policy.
//!
//! Phases, each failing on its own:
//! 1. Gate: one property read; a closed gate makes the whole module a no-op.
//! 2. Identity: processes with native support skip the direct group.
//! 3. Direct group: patches anchored on the IME service support class.
//! 4. Cascading group: always installed; re-runs a reduced pass in every
//!    loader announced by a [`ClassLoadEvent`].

use crate::event::{ClassLoadBus, ClassLoadEvent};
use crate::patches;
use crate::registry::{HookRegistry, HookSpec, InstallGuard};
use crate::relay::ColorRelay;
use crate::report::{AttachReport, GateDecision, PatchReport};
use crate::resolver::Resolver;
use crate::targets;
use chrono::Utc;
use imp_config::PatcherConfig;
use imp_core::{
    ClassHandle, Host, LoaderId, PatchError, ProcessIdentity, PropertyStore, SymbolCandidates,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

/// Owns the shared state of one patching session: relay, bus, install
/// ledger and the history of cascaded passes.
pub struct Orchestrator<H: Host + ?Sized + 'static> {
    inner: Arc<Inner<H>>,
}

struct Inner<H: Host + ?Sized + 'static> {
    host: Arc<H>,
    config: PatcherConfig,
    relay: Arc<ColorRelay>,
    bus: Arc<ClassLoadBus>,
    guard: InstallGuard,
    attached: AtomicBool,
    /// Set once the gate has opened; read by every cascaded pass.
    excluded: OnceLock<bool>,
    subscribed: AtomicBool,
    cascades: Mutex<Vec<PatchReport>>,
}

impl<H: Host + ?Sized + 'static> Orchestrator<H> {
    pub fn new(host: Arc<H>, config: PatcherConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                config,
                relay: Arc::new(ColorRelay::default()),
                bus: Arc::new(ClassLoadBus::new()),
                guard: InstallGuard::new(),
                attached: AtomicBool::new(false),
                excluded: OnceLock::new(),
                subscribed: AtomicBool::new(false),
                cascades: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &PatcherConfig {
        &self.inner.config
    }

    pub fn relay(&self) -> &ColorRelay {
        &self.inner.relay
    }

    pub fn bus(&self) -> &Arc<ClassLoadBus> {
        &self.inner.bus
    }

    /// One report per announced loader, in first-delivery order. Passes
    /// re-delivered for a known loader are folded into its report.
    pub fn cascade_reports(&self) -> Vec<PatchReport> {
        self.inner
            .cascades
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run the attach-time phases against the process's initial loader.
    ///
    /// Evaluated once per orchestrator; later calls return an
    /// [`GateDecision::AlreadyAttached`] report without touching the host.
    pub fn attach(
        &self,
        process: &ProcessIdentity,
        loader: &LoaderId,
        props: &dyn PropertyStore,
    ) -> AttachReport {
        if self.inner.attached.swap(true, Ordering::SeqCst) {
            tracing::debug!(%process, "Attach already ran, ignoring");
            return AttachReport::skipped(process.clone(), GateDecision::AlreadyAttached);
        }

        let gate = &self.inner.config.gate;
        let value = props.get(&gate.property, &gate.default_value);
        if !gate.is_open(&value) {
            let reason = PatchError::FeatureDisabled {
                property: gate.property.clone(),
                value: value.clone(),
            };
            tracing::info!(%process, "{reason}");
            return AttachReport::skipped(process.clone(), GateDecision::Closed { value });
        }
        tracing::info!(%process, "Bottom IME area supported, patching");

        let excluded = self.inner.config.identity.is_excluded(process);
        let _ = self.inner.excluded.set(excluded);

        let direct = if excluded {
            tracing::info!(%process, "Process has native support, skipping direct patches");
            None
        } else {
            Some(self.inner.install_direct(loader))
        };
        let cascade = Inner::install_cascade_entry(&self.inner, loader);

        let report = AttachReport {
            process: process.clone(),
            attached_at: Utc::now(),
            gate: GateDecision::Open,
            excluded,
            direct,
            cascade: Some(cascade),
        };
        if let Some(direct) = &report.direct {
            tracing::info!(%process, "Direct patches: {}", direct.summary());
        }
        if let Some(cascade) = &report.cascade {
            tracing::info!(%process, "Cascade entry: {}", cascade.summary());
        }
        match report.to_json() {
            Ok(json) => tracing::debug!(%process, report = %json, "Attach report"),
            Err(e) => tracing::debug!(%process, "Failed to serialize attach report: {e}"),
        }
        report
    }
}

impl<H: Host + ?Sized + 'static> Inner<H> {
    fn apply(&self, spec: HookSpec, loader: &LoaderId, report: &mut PatchReport) {
        let registry = HookRegistry::new(&*self.host);
        if let Some(outcome) = registry.apply(&spec, loader, &self.guard) {
            report.push(spec.id, spec.kind(), outcome);
        }
    }

    fn resolve_class(&self, candidates: &SymbolCandidates, loader: &LoaderId) -> Option<ClassHandle> {
        Resolver::new(&*self.host).resolve_class(candidates, loader)
    }

    fn missing_class(report: &mut PatchReport, candidates: &SymbolCandidates) {
        let err = PatchError::HostClassMissing(candidates.to_string());
        tracing::error!(loader = %report.loader, "{err}");
        report.missing_classes.push(candidates.to_string());
    }

    fn install_direct(&self, loader: &LoaderId) -> PatchReport {
        let mut report = PatchReport::new(loader.clone());
        let candidates =
            SymbolCandidates::classes(targets::PRIMARY_CLASS_CANDIDATES.iter().copied());
        let Some(class) = self.resolve_class(&candidates, loader) else {
            Self::missing_class(&mut report, &candidates);
            return report;
        };

        self.apply(patches::force_ime_support(&class), loader, &mut report);
        self.apply(patches::disable_voice_input(&class), loader, &mut report);
        self.apply(
            patches::nav_color_producer(
                Arc::clone(&self.host),
                class.clone(),
                Arc::clone(&self.relay),
            ),
            loader,
            &mut report,
        );
        self.apply(
            patches::bottom_view_consumer(Arc::clone(&self.host), class, Arc::clone(&self.relay)),
            loader,
            &mut report,
        );
        report
    }

    fn install_cascade_entry(this: &Arc<Self>, loader: &LoaderId) -> PatchReport {
        let mut report = PatchReport::new(loader.clone());
        this.apply(
            patches::suppress_delete_not_support_ime(targets::INJECTOR_SWITCH_LISTENER),
            loader,
            &mut report,
        );

        let manager = SymbolCandidates::classes([targets::MODULE_MANAGER_CLASS]);
        if this.resolve_class(&manager, loader).is_none() {
            Self::missing_class(&mut report, &manager);
            return report;
        }

        if !this.subscribed.swap(true, Ordering::SeqCst) {
            let weak: Weak<Self> = Arc::downgrade(this);
            this.bus.subscribe(move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_class_load(event);
                }
            });
        }
        this.apply(
            patches::class_load_entry(Arc::clone(&this.bus)),
            loader,
            &mut report,
        );
        report
    }

    /// Reduced pass against a freshly loaded context.
    fn on_class_load(&self, event: &ClassLoadEvent) {
        let loader = &event.loader;
        let excluded = self.excluded.get().copied().unwrap_or(false);
        let mut report = PatchReport::new(loader.clone());

        self.apply(
            patches::suppress_delete_not_support_ime(targets::BOTTOM_MANAGER_SWITCH_LISTENER),
            loader,
            &mut report,
        );

        let candidates = SymbolCandidates::classes([targets::BOTTOM_MANAGER_CLASS]);
        match self.resolve_class(&candidates, loader) {
            Some(class) => {
                if !excluded {
                    self.apply(patches::force_ime_support(&class), loader, &mut report);
                    self.apply(patches::disable_voice_input(&class), loader, &mut report);
                }
                self.apply(
                    patches::live_support_ime_list(Arc::clone(&self.host), class),
                    loader,
                    &mut report,
                );
            }
            None => Self::missing_class(&mut report, &candidates),
        }

        tracing::info!(
            dex = event.dex_path.as_deref().unwrap_or("-"),
            "Cascaded patches: {}",
            report.summary()
        );
        let mut cascades = self.cascades.lock().unwrap_or_else(PoisonError::into_inner);
        match cascades.iter_mut().find(|r| r.loader == report.loader) {
            Some(known) => known.absorb(report),
            None => cascades.push(report),
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
