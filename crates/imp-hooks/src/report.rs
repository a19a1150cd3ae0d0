//! Installation reports. Consumed by logging only, never by control flow.

use crate::registry::{HookKind, InstallationOutcome};
use chrono::{DateTime, Utc};
use imp_core::{LoaderId, ProcessIdentity};
use serde::Serialize;
use std::fmt;

/// Stable name of each patch the orchestrator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatchId {
    /// Static support flag forced to 1.
    ForceImeSupport,
    /// Voice-input capability check forced to `false`.
    DisableVoiceInput,
    /// Captures the navigation bar colour into the relay.
    NavColorProducer,
    /// Re-applies the relayed colour once the bottom view exists.
    BottomViewConsumer,
    /// Compatibility filter turned into a no-op.
    SuppressDeleteNotSupportIme,
    /// Watches auxiliary code loading to cascade further patches.
    ClassLoadEntry,
    /// Supported-IME list answered live from the system service.
    LiveSupportImeList,
}

impl PatchId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForceImeSupport => "force-ime-support",
            Self::DisableVoiceInput => "disable-voice-input",
            Self::NavColorProducer => "nav-color-producer",
            Self::BottomViewConsumer => "bottom-view-consumer",
            Self::SuppressDeleteNotSupportIme => "suppress-delete-not-support-ime",
            Self::ClassLoadEntry => "class-load-entry",
            Self::LiveSupportImeList => "live-support-ime-list",
        }
    }
}

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchRecord {
    pub patch: PatchId,
    pub kind: HookKind,
    pub outcome: InstallationOutcome,
}

/// Outcomes of one resolution+installation pass in one loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub loader: LoaderId,
    pub records: Vec<PatchRecord>,
    /// Anchor classes that were absent, which skipped every patch hanging off them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_classes: Vec<String>,
}

impl PatchReport {
    pub fn new(loader: LoaderId) -> Self {
        Self {
            loader,
            records: Vec::new(),
            missing_classes: Vec::new(),
        }
    }

    pub fn push(&mut self, patch: PatchId, kind: HookKind, outcome: InstallationOutcome) {
        self.records.push(PatchRecord {
            patch,
            kind,
            outcome,
        });
    }

    /// Fold a later pass over the same loader into this report.
    ///
    /// A later outcome for the same patch replaces the earlier one; missing
    /// classes reflect the latest pass.
    pub fn absorb(&mut self, later: PatchReport) {
        for record in later.records {
            match self
                .records
                .iter_mut()
                .find(|r| r.patch == record.patch && r.kind == record.kind)
            {
                Some(existing) => *existing = record,
                None => self.records.push(record),
            }
        }
        self.missing_classes = later.missing_classes;
    }

    pub fn outcome_of(&self, patch: PatchId) -> Option<&InstallationOutcome> {
        self.records
            .iter()
            .find(|r| r.patch == patch)
            .map(|r| &r.outcome)
    }

    pub fn installed(&self) -> usize {
        self.count(|o| matches!(o, InstallationOutcome::Installed))
    }

    pub fn not_found(&self) -> usize {
        self.count(|o| matches!(o, InstallationOutcome::SymbolNotFound))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, InstallationOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&InstallationOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "loader {}: {} installed, {} not found, {} failed",
            self.loader,
            self.installed(),
            self.not_found(),
            self.failed()
        )
    }
}

/// Result of the gate check at attach time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum GateDecision {
    Open,
    Closed { value: String },
    /// Attach already ran for this orchestrator; nothing was evaluated again.
    AlreadyAttached,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachReport {
    pub process: ProcessIdentity,
    pub attached_at: DateTime<Utc>,
    pub gate: GateDecision,
    pub excluded: bool,
    /// `None` when the gate was closed or the process is excluded.
    pub direct: Option<PatchReport>,
    /// `None` when the gate was closed.
    pub cascade: Option<PatchReport>,
}

impl AttachReport {
    pub fn skipped(process: ProcessIdentity, gate: GateDecision) -> Self {
        Self {
            process,
            attached_at: Utc::now(),
            gate,
            excluded: false,
            direct: None,
            cascade: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
