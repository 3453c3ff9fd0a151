// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "schedule/mod.rs"]
pub mod schedule;

#[path = "jobs/mod.rs"]
pub mod jobs;
