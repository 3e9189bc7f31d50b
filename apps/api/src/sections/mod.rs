// CV section reconciliation: pure merge rule, section editors, the
// write-through reconciler and its HTTP surface.

pub mod callers;
pub mod editors;
pub mod handlers;
pub mod merge;
pub mod notices;
pub mod reconciler;
