//! Army list aggregation: snapshot entries, point totals, persistence and
//! export.

mod builder;
mod entry;
/// Plain-text rendering of the army list.
pub mod export;

pub use builder::{ArmyBuilder, DEFAULT_ARMY_KEY};
pub use entry::{compute_grand_total, compute_total, ArmyEntry};
pub use export::{export_army_list, write_export, DEFAULT_EXPORT_FILE};
