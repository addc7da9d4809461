//! Output rendering: markdown for terminals, JSON for scripts.

pub(crate) mod json;
pub(crate) mod markdown;
