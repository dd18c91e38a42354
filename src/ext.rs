//! Stock native extension bundles
//!
//! Each bundle registers a set of native functions (and, for arrays, a
//! private extension-state slot) into the scope as a unit. Natives
//! validate their own inputs and report failures as sentinel return
//! strings; they never abort the engine.

pub mod arrays;
pub mod strings;
