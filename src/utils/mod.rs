//! Internal utility helpers for batch-list persistence.

pub(crate) mod batch_file;
