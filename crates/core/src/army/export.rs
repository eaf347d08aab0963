use std::{fs, path::Path};

use anyhow::{Context, Result};
use tracing::info;

use super::entry::{compute_grand_total, compute_total, ArmyEntry};
use crate::storage::file::write_atomic;

/// File name used when the army list is downloaded.
pub const DEFAULT_EXPORT_FILE: &str = "army-list.txt";

/// Display line for one entry, e.g. `Space Marine Captain - Points: 210`.
pub fn entry_line(entry: &ArmyEntry) -> String {
    format!("{} - Points: {}", entry.name, compute_total(entry))
}

/// Render the army list as plain text: one line per entry followed by the
/// grand total.
pub fn export_army_list(entries: &[ArmyEntry]) -> String {
    let mut output = String::new();
    for entry in entries {
        output.push_str(&entry_line(entry));
        output.push_str(&format!(" (Models: {}", entry.model_count));
        let selected: Vec<&str> = entry
            .selected()
            .map(|enhancement| enhancement.name.as_str())
            .collect();
        if !selected.is_empty() {
            output.push_str(&format!(", Enhancements: {}", selected.join(", ")));
        }
        output.push_str(")\n");
    }
    output.push_str(&format!(
        "Total Points: {}\n",
        compute_grand_total(entries)
    ));
    output
}

/// Write the exported list to `path`, creating parent directories.
pub fn write_export(path: impl AsRef<Path>, entries: &[ArmyEntry]) -> Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    write_atomic(parent, path, export_army_list(entries).as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), entries = entries.len(), "Army list exported");
    Ok(())
}
