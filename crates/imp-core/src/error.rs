/// Failure reported by a host capability.
///
/// Absence of a symbol is never an error at this level; providers return
/// `Ok(None)` for that.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Malformed symbol name '{0}'")]
    Malformed(String),

    #[error("Hook engine rejected {symbol}: {reason}")]
    Rejected { symbol: String, reason: String },

    #[error("Type mismatch on {symbol}: expected {expected}, found {found}")]
    TypeMismatch {
        symbol: String,
        expected: String,
        found: String,
    },

    #[error("Field {0} is not static")]
    NotStatic(String),

    #[error("No member '{member}' on {target}")]
    NoSuchMember { target: String, member: String },

    #[error("Invocation of {symbol} failed: {message}")]
    Invocation { symbol: String, message: String },
}

/// Outcome taxonomy of a patching step.
///
/// Every variant is caught at the narrowest scope and logged; none of them
/// reaches the caller of the orchestrator.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("Feature disabled: property '{property}' is '{value}'")]
    FeatureDisabled { property: String, value: String },

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Installation of {patch} failed: {cause}")]
    InstallationFailed { patch: String, cause: HostError },

    #[error("Host class missing: {0}")]
    HostClassMissing(String),
}
