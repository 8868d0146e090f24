use faro_ids::PartId;
use thiserror::Error;

/// Recoverable failures surfaced by the engine API.
///
/// Everything here leaves the engine state untouched; the caller gets the
/// error back and a warning is logged. Content/engine mismatches (wrong-kind
/// slot accessors, malformed animation streams) are not represented — those
/// panic, because continuing would desynchronize the composed scene from its
/// described content.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown part id {0}")]
    UnknownPart(PartId),

    #[error("interaction state index {0} out of range (expected 0..3)")]
    InvalidState(usize),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("re-parenting part {part} under {new_parent} would create a cycle")]
    ParentCycle { part: PartId, new_parent: PartId },
}
