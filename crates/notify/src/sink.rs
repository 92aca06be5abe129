use crate::message::{self, Notification};
use anyhow::Result;
use civic_core::schema::{Idea, VoteDirection};
use std::sync::Mutex;
use tracing::{info, warn};

/// Destination for rendered notifications. Implementations decide how a
/// message leaves the process.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &Notification) -> Result<()>;
}

impl<S: NotificationSink + ?Sized> NotificationSink for &S {
    fn deliver(&self, notification: &Notification) -> Result<()> {
        (**self).deliver(notification)
    }
}

impl<S: NotificationSink + ?Sized> NotificationSink for Box<S> {
    fn deliver(&self, notification: &Notification) -> Result<()> {
        (**self).deliver(notification)
    }
}

/// Writes each notification to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, notification: &Notification) -> Result<()> {
        info!(
            chat_id = %notification.chat_id,
            parse_mode = %notification.parse_mode,
            buttons = notification.reply_markup.is_some(),
            text = %notification.text,
            "notification"
        );
        Ok(())
    }
}

/// Keeps delivered notifications in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    sent: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn sent(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationSink for MemorySink {
    fn deliver(&self, notification: &Notification) -> Result<()> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink lock poisoned"))?;
        sent.push(notification.clone());
        Ok(())
    }
}

/// Renders domain events and hands them to a sink.
#[derive(Debug)]
pub struct Notifier<S> {
    sink: S,
    site_url: String,
    city: String,
}

impl<S: NotificationSink> Notifier<S> {
    pub fn new(sink: S, site_url: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            sink,
            site_url: site_url.into(),
            city: city.into(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn idea_submitted(&self, chat_id: &str, idea: &Idea) -> Result<()> {
        self.send(message::new_idea(chat_id, idea, &self.site_url, &self.city))
    }

    pub fn status_changed(&self, chat_id: &str, idea: &Idea) -> Result<()> {
        self.send(message::status_update(chat_id, idea))
    }

    pub fn vote_recorded(&self, chat_id: &str, direction: VoteDirection) -> Result<()> {
        self.send(message::vote_acknowledgement(chat_id, direction))
    }

    fn send(&self, notification: Notification) -> Result<()> {
        if let Err(err) = self.sink.deliver(&notification) {
            warn!(chat_id = %notification.chat_id, error = %err, "notification delivery failed");
            return Err(err.context(format!(
                "delivering notification to {}",
                notification.chat_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::geo::Coordinate;
    use civic_core::schema::{IdeaCategory, IdeaStatus};

    struct FailingSink;

    impl NotificationSink for FailingSink {
        fn deliver(&self, _notification: &Notification) -> Result<()> {
            anyhow::bail!("channel unavailable")
        }
    }

    fn idea(status: IdeaStatus) -> Idea {
        Idea {
            id: "idea-7".to_string(),
            title: "Lights on the river path".to_string(),
            description: "The path along the river is dark at night".to_string(),
            category: IdeaCategory::Infrastructure,
            status,
            location: Coordinate::new(54.0, 86.6),
            address: Some("River embankment".to_string()),
            author_id: "author".to_string(),
            votes_count: 4,
            comments_count: 1,
            duplicate_count: 0,
            importance_score: None,
            infrastructure_deficit: None,
            social_weight: None,
            priority: None,
            photo_urls: Vec::new(),
            created_at: "2025-06-01T12:00:00.000Z".to_string(),
            updated_at: None,
        }
    }

    #[test]
    fn notifier_renders_into_injected_sink() {
        let notifier = Notifier::new(MemorySink::default(), "https://city.example", "Kiselyovsk");
        notifier.idea_submitted("@moderators", &idea(IdeaStatus::New)).unwrap();
        notifier.status_changed("42", &idea(IdeaStatus::Completed)).unwrap();
        notifier.vote_recorded("42", VoteDirection::Up).unwrap();

        let sent = notifier.sink().sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].chat_id, "@moderators");
        assert!(sent[0].text.contains("Infrastructure team"));
        assert!(sent[0].text.contains("River embankment"));
        assert!(sent[1].text.contains("implemented"));
        assert!(sent[2].text.starts_with("✅"));
    }

    #[test]
    fn delivery_failures_propagate() {
        let notifier = Notifier::new(FailingSink, "https://city.example", "Kiselyovsk");
        let err = notifier.vote_recorded("42", VoteDirection::Down).unwrap_err();
        assert!(format!("{err:#}").contains("channel unavailable"));
    }

    #[test]
    fn boxed_sinks_are_sinks() {
        let sink: Box<dyn NotificationSink> = Box::new(LogSink);
        let notifier = Notifier::new(sink, "https://city.example", "Barnaul");
        notifier.vote_recorded("42", VoteDirection::Up).unwrap();
    }
}
