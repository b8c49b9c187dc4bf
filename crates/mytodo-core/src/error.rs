use thiserror::Error;

/// Input rejected before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("section name must not be empty")]
    EmptySectionName,

    #[error("no fields to update")]
    EmptyUpdate,

    #[error("task {0} is in the trash; restore it before changing its completion")]
    CompletionInTrash(i64),

    #[error("{kind} reminders need a reminder_day between {min} and {max}")]
    ReminderDay {
        kind: &'static str,
        min: i64,
        max: i64,
    },

    #[error("file size exceeds 10MB limit")]
    FileTooLarge { size: usize },

    #[error("only image and PDF files are allowed (got {0})")]
    UnsupportedFileType(String),

    #[error("unknown view: {0}")]
    UnknownView(String),

    #[error("the section view needs a section_id")]
    MissingSectionId,
}
