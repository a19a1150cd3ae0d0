//! Runtime patching of the bottom IME area for third-party input methods.
//!
//! The module is injected into every process and patches host classes it
//! only knows by name:
//! - Direct group: force IME support, disable the voice-input button and
//!   relay the navigation bar colour into the bottom view
//! - Cascading group: keep unsupported IMEs from being removed, and re-patch
//!   the bottom manager in every loader the host announces through `loadDex`
//!
//! Everything is gated on one system property; see [`imp_config::GateConfig`].
//!
//! ## Host integration
//!
//! A host adapter implements the [`imp_core::Host`] capabilities and calls
//! [`start`] once per process. [`start`] performs no I/O beyond the gate
//! property read and leaves the logging sink to the host:
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use imp_config::PatcherConfig;
//! use imp_core::{LoaderId, ProcessIdentity};
//! use imp_hooks::MemoryHost;
//!
//! let host = Arc::new(MemoryHost::new());
//! let props: HashMap<String, String> = HashMap::new();
//! let (_orchestrator, report) = imp_hooks::start(
//!     host,
//!     &ProcessIdentity::new("org.example.keyboard"),
//!     &LoaderId::new("boot"),
//!     &props,
//!     PatcherConfig::default(),
//! );
//! println!("{}", report.to_json().unwrap());
//! ```
//!
//! Standalone adapters (dry runs, tooling outside the host) can use
//! [`start_standalone`], which also reads `patcher.toml` and installs a
//! stderr subscriber.

pub mod event;
pub mod logging;
pub mod memory_host;
pub mod orchestrator;
pub mod palette;
pub mod patches;
pub mod registry;
pub mod relay;
pub mod report;
pub mod resolver;
pub mod targets;

pub use event::{ClassLoadBus, ClassLoadEvent};
pub use logging::init_tracing;
pub use memory_host::MemoryHost;
pub use orchestrator::Orchestrator;
pub use palette::BottomViewPalette;
pub use registry::{HookKind, HookRegistry, HookSpec, InstallGuard, InstallationOutcome, Payload};
pub use relay::{ColorRelay, RelaySlot};
pub use report::{AttachReport, GateDecision, PatchId, PatchRecord, PatchReport};
pub use resolver::Resolver;

use imp_config::{PartialConfig, PatcherConfig, load_config};
use imp_core::{Host, LoaderId, ProcessIdentity, PropertyStore};
use std::path::Path;
use std::sync::Arc;

/// Run the attach-time phases with an already loaded configuration.
///
/// Reads the gate property and nothing else; no files are touched and no
/// tracing subscriber is installed. The returned orchestrator must be kept
/// alive for cascaded passes to keep running.
pub fn start<H: Host + ?Sized + 'static>(
    host: Arc<H>,
    process: &ProcessIdentity,
    loader: &LoaderId,
    props: &dyn PropertyStore,
    config: PatcherConfig,
) -> (Orchestrator<H>, AttachReport) {
    let orchestrator = Orchestrator::new(host, config);
    let report = orchestrator.attach(process, loader, props);
    (orchestrator, report)
}

/// [`start`] for adapters running outside the injected host.
///
/// Loads `patcher.toml` from the global and `project_config` tiers plus
/// `overrides`, then installs a stderr subscriber. Both do blocking work and
/// take over the process-wide logging sink, so an injected host should load
/// its config up front and call [`start`] instead.
pub fn start_standalone<H: Host + ?Sized + 'static>(
    host: Arc<H>,
    process: &ProcessIdentity,
    loader: &LoaderId,
    props: &dyn PropertyStore,
    project_config: Option<&Path>,
    overrides: Option<&PartialConfig>,
) -> (Orchestrator<H>, AttachReport) {
    let global = imp_config::global_config_path();
    let config = load_config(project_config, global.as_deref(), overrides);
    init_tracing(&config.logging);
    start(host, process, loader, props, config)
}
