use thiserror::Error;

/// Pipeline stage at which an incoming message was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectPhase {
    /// Pre-unsecure gate: cheap clear-signal comparison.
    PreValidation,
    /// Post-unsecure gate: stateful checks such as the replay lookup.
    FinalValidation,
    /// Client-side correlation check on a received response.
    ResponseValidation,
}

impl std::fmt::Display for RejectPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RejectPhase::PreValidation => "pre-unsecure",
            RejectPhase::FinalValidation => "final",
            RejectPhase::ResponseValidation => "response",
        };
        f.write_str(label)
    }
}

/// Per-message failures. Every variant is local to the message that raised
/// it; concurrently handled messages are unaffected.
#[derive(Debug, Error)]
pub enum ShroudError {
    #[error("ciphertext could not be decrypted with the supplied vectors")]
    Decryption,

    #[error("message rejected at the {0} validation gate")]
    Rejected(RejectPhase),

    #[error("wire field {field:?} has no counterpart in the paired transform")]
    TransformAsymmetry { field: String },

    #[error("package is missing required field {field:?}")]
    MissingField { field: &'static str },

    #[error("required vector {name:?} is absent")]
    MissingVector { name: &'static str },

    #[error("credential transform failed")]
    Credential,

    #[error("AEAD operation failed")]
    Aead,

    #[error("wire version mismatch for {context}: expected {expected}, found {found}")]
    VersionMismatch {
        context: &'static str,
        expected: u16,
        found: u16,
    },

    #[error("codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

impl ShroudError {
    /// True when the failure came out of one of the validation gates rather
    /// than a malformed or undecryptable package.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ShroudError::Rejected(_))
    }
}
