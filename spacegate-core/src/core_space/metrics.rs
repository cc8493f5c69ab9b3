//! Metric descriptions for the space lifecycle
//!
//! Counters are incremented from the lifecycle manager and can be exported
//! via Prometheus or any other `metrics` backend installed by the host.

use metrics::{counter, describe_counter};

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    describe_counter!(
        "spacegate_spaces_created_total",
        "Total number of spaces created, including default spaces"
    );

    describe_counter!(
        "spacegate_spaces_deleted_total",
        "Total number of spaces deleted, labeled by mode (soft, hard)"
    );

    describe_counter!(
        "spacegate_bootstrap_runs_total",
        "Total number of default-space bootstrap runs"
    );

    describe_counter!(
        "spacegate_permission_updates_total",
        "Total number of update_permissions calls that completed successfully"
    );

    describe_counter!(
        "spacegate_propagation_jobs_launched_total",
        "Total number of workspace-wide permission propagation jobs requested"
    );
}

/// Record a space creation
pub fn space_created() {
    counter!("spacegate_spaces_created_total").increment(1);
}

/// Record a space deletion
pub fn space_deleted(mode: &'static str) {
    counter!("spacegate_spaces_deleted_total", "mode" => mode).increment(1);
}

/// Record a default-space bootstrap run
pub fn bootstrap_run() {
    counter!("spacegate_bootstrap_runs_total").increment(1);
}

/// Record a completed permission update
pub fn permission_update() {
    counter!("spacegate_permission_updates_total").increment(1);
}

/// Record a propagation job request
pub fn propagation_job_launched() {
    counter!("spacegate_propagation_jobs_launched_total").increment(1);
}
