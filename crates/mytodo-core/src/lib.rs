pub mod attachment;
pub mod clock;
pub mod error;
pub mod retention;
pub mod section;
pub mod stats;
pub mod task;
pub mod view;

pub use attachment::{Attachment, AttachmentKind};
pub use clock::Clock;
pub use error::ValidationError;
pub use section::Section;
pub use stats::TaskStats;
pub use task::{ReminderType, Task, TaskState};
pub use view::View;
