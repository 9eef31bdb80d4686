//! Structured observability hooks for convention application.
//!
//! Events are emitted with an `event` field so log pipelines can filter on
//! them. Verbosity follows `RUST_LOG` (see [`crate::telemetry`]).

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::build_type::BuildType;

/// Emit event: plugin application started for a module.
pub fn emit_application_started(run_id: &Uuid, module: &str, plugin: &str, build_type: BuildType) {
    info!(
        event = "apply.started",
        run_id = %run_id,
        module = %module,
        plugin = %plugin,
        build_type = %build_type,
    );
}

/// Emit event: shared setup and variant hook both completed.
pub fn emit_application_finished(run_id: &Uuid, module: &str, plugin: &str) {
    info!(event = "apply.finished", run_id = %run_id, module = %module, plugin = %plugin);
}

pub fn emit_convention_applied(module: &str, convention: &str) {
    debug!(event = "convention.applied", module = %module, convention = %convention);
}

pub fn emit_convention_skipped(module: &str, convention: &str) {
    debug!(event = "convention.skipped", module = %module, convention = %convention);
}

/// Emit event: module application ended in failure (warning level).
pub fn emit_application_failed(module: &str, attempts: u32, error: &dyn std::fmt::Display) {
    warn!(event = "apply.failed", module = %module, attempts = attempts, error = %error);
}
