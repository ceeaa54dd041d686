//! Generates the context markdown document (§4.5 step 2): the contract
//! between this component and the external change-applier (§6.5).

use cdc_core::classify::Classification;
use cdc_store::{ChangeRow, Store};

const PREVIEW_CHARS: usize = 240;

/// Groups `changes` BREAKING first, then ADDITIVE, then COSMETIC, with
/// old/new hash pairs and content previews recovered from the CAS cache.
pub fn generate(store: &Store, skill_name: &str, skill_body: &str, changes: &[ChangeRow]) -> String {
    let mut breaking = Vec::new();
    let mut additive = Vec::new();
    let mut cosmetic = Vec::new();
    for c in changes {
        match c.classification {
            Classification::Breaking => breaking.push(c),
            Classification::Additive => additive.push(c),
            Classification::Cosmetic => cosmetic.push(c),
        }
    }

    let mut doc = String::new();
    doc.push_str(&format!("# Update context for `{skill_name}`\n\n"));
    doc.push_str("## Current skill body\n\n```\n");
    doc.push_str(skill_body);
    doc.push_str("\n```\n\n## Pending changes\n\n");

    for (label, group) in [
        ("BREAKING", breaking),
        ("ADDITIVE", additive),
        ("COSMETIC", cosmetic),
    ] {
        if group.is_empty() {
            continue;
        }
        doc.push_str(&format!("### {label}\n\n"));
        for c in group {
            doc.push_str(&format!(
                "- `{} -> {}` — {}\n",
                short(&c.old_hash),
                short(&c.new_hash),
                c.summary
            ));
            doc.push_str(&format!("  - old: {}\n", preview(store, &c.old_hash)));
            doc.push_str(&format!("  - new: {}\n", preview(store, &c.new_hash)));
        }
        doc.push('\n');
    }

    doc
}

fn preview(store: &Store, hash: &str) -> String {
    match store.cas_get(hash) {
        Ok(Some(content)) => truncate(&content),
        _ => "(content unavailable)".to_string(),
    }
}

fn truncate(s: &str) -> String {
    let collapsed = s.replace('\n', " ");
    if collapsed.chars().count() <= PREVIEW_CHARS {
        collapsed
    } else {
        let head: String = collapsed.chars().take(PREVIEW_CHARS).collect();
        format!("{head}…")
    }
}

fn short(hash: &str) -> &str {
    if hash.len() >= 8 {
        &hash[..8]
    } else {
        hash
    }
}
