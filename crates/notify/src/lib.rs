pub mod message;
pub mod outbox;
pub mod sink;

pub use message::Notification;
pub use outbox::OutboxSink;
pub use sink::{LogSink, MemorySink, NotificationSink, Notifier};
