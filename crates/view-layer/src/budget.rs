//! Budget query (§4.4): direct pass-through to the store's aggregated
//! per-filetype token accounting.

use std::collections::HashMap;

use cdc_store::{SkillBudget, Store};

use crate::Result;

pub fn skill_budget(store: &Store, skill_name: &str, thresholds: &HashMap<String, u64>) -> Result<SkillBudget> {
    store.skill_budget(skill_name, thresholds)
}
