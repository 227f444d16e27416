pub mod logo_task;

pub use logo_task::{LogoParams, LogoTask, TaskResult, TaskStatus};
