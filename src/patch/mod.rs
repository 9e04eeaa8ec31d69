//! Patch application: temporary-id rewriting, guarded op application and
//! the cleanup pipeline.

mod apply;
mod ids;
mod touch;

pub use apply::{apply_patch, PatchApplier, PatchOutcome};
pub use ids::{rewrite_ids, IdRewrite};
pub use touch::TouchLog;
