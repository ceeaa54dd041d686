//! Structured logging events emitted at component boundaries, following the
//! teacher's `event = "..."` field convention so log lines are greppable and
//! machine-parseable under the JSON formatter.

pub fn emit_watermark_check(source: &str, changed: bool) {
    tracing::info!(event = "watermark_check", source, changed, "checked source watermark");
}

pub fn emit_change_detected(source: &str, page: &str, classification: &str) {
    tracing::info!(
        event = "change_detected",
        source,
        page,
        classification,
        "detected page change"
    );
}

pub fn emit_clone_failed(source: &str, error: &str) {
    tracing::warn!(event = "clone_failed", source, error, "git shallow clone failed");
}

pub fn emit_validation_result(skill: &str, is_valid: bool, error_count: usize) {
    tracing::info!(
        event = "validation_result",
        skill,
        is_valid,
        error_count,
        "ran skill validator"
    );
}

pub fn emit_update_applied(skill: &str, mode: &str) {
    tracing::info!(event = "update_applied", skill, mode, "applied update");
}

pub fn emit_update_rolled_back(skill: &str, mode: &str, reason: &str) {
    tracing::warn!(
        event = "update_rolled_back",
        skill,
        mode,
        reason,
        "rolled back update"
    );
}

pub fn emit_skill_busy(skill: &str) {
    tracing::warn!(event = "skill_busy", skill, "concurrent orchestration rejected");
}
