// Schedule sheet synchronisation.
//
// **Architecture Overview:**
// - `core/` = Business logic (cell addressing, sparse tables, the diff, job records)
// - `infra/` = Implementations of core traits (Sheets REST client, JSON job files, in-memory sheet)
//
// The binary in `main.rs` wires these together.

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
pub mod core;
#[path = "infra/infra_layer.rs"]
pub mod infra;
