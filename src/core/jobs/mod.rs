pub mod job_models;
pub mod job_number;
pub mod table_builder;

pub use job_models::{JobField, JobRecord, JobSource, JobSourceError, ScheduleColumnMap};
pub use job_number::{Hand, JobNumber, Side};
pub use table_builder::build_candidate_table;
