pub mod alert_log;
pub mod notifier;

pub use alert_log::AlertLog;
pub use notifier::{ConsoleNotifier, MemoryNotifier, Notice, NoticeLevel, Notifier};
