// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "google_sheets/mod.rs"]
pub mod google_sheets;

#[path = "schedule/in_memory.rs"]
pub mod schedule;

#[path = "jobs/json_source.rs"]
pub mod jobs;
