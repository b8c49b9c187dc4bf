pub mod attachments;
pub mod retention;
pub mod sections;
pub mod stats;
pub mod tasks;
