use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A transient message for the organizer. Nothing here blocks editing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Notifier {
    queue: VecDeque<Notice>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) -> u64 {
        let message = message.into();
        match level {
            NoticeLevel::Info => tracing::info!(%message, "notice"),
            NoticeLevel::Warning => tracing::warn!(%message, "notice"),
            NoticeLevel::Error => tracing::error!(%message, "notice"),
        }
        self.next_id += 1;
        let id = self.next_id;
        self.queue.push_back(Notice { id, level, message });
        id
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Info, message)
    }

    pub fn warn(&mut self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Warning, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Error, message)
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.queue.len();
        self.queue.retain(|notice| notice.id != id);
        self.queue.len() != before
    }

    pub fn pending(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_queue_in_order_and_can_be_dismissed() {
        let mut notifier = Notifier::new();
        let first = notifier.warn("2 new booth(s) need details before saving");
        let second = notifier.error("save failed");
        assert!(notifier.dismiss(first));
        assert!(!notifier.dismiss(first));
        let remaining = notifier.drain();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second);
        assert_eq!(remaining[0].level, NoticeLevel::Error);
        assert!(notifier.is_empty());
    }
}
