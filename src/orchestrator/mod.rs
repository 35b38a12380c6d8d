//! Batch orchestration.
//!
//! Resolves each requested mode, hands it to the runner and collects per-mode outcomes.
//! CLI layers call into this module and only deal with presentation.

mod controller;

pub(crate) use controller::run_batch;
