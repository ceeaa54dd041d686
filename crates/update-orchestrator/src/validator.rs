//! External validator subprocess contract (§6.4): `validate_skill(path) ->
//! (exit_code, errors[], warnings[])`, invoked with a 30s wall-clock budget.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use cdc_core::process::run_with_timeout;

use crate::error::Result;

const VALIDATOR_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ValidatorOutcome {
    pub exit_code: i32,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub raw_stderr: String,
}

impl ValidatorOutcome {
    pub fn is_valid(&self) -> bool {
        self.exit_code == 0 && self.errors.is_empty()
    }
}

#[derive(Debug, Deserialize, Default)]
struct ValidatorReport {
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

/// Run `validator_command <skill_path>`. Malformed stdout degrades to an
/// empty error/warning list rather than failing the call; validity then
/// falls back to the exit code alone.
pub fn validate_skill(validator_command: &str, skill_path: &Path) -> Result<ValidatorOutcome> {
    let path_arg = skill_path.display().to_string();
    let output = run_with_timeout(validator_command, &[&path_arg], None, VALIDATOR_TIMEOUT)?;
    let report: ValidatorReport = serde_json::from_str(&output.stdout).unwrap_or_default();
    Ok(ValidatorOutcome {
        exit_code: output.exit_code,
        errors: report.errors,
        warnings: report.warnings,
        raw_stderr: output.stderr,
    })
}
