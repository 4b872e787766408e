//! CLI command implementations.

pub(crate) mod align;
pub(crate) mod run;
