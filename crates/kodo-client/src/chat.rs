//! Bounded chat history.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use kodo_protocol::messages::ChatType;
use kodo_protocol::Guid;

/// Default history cap.
pub const DEFAULT_HISTORY_CAP: usize = 100;

/// One displayable chat line with its wire-level context.
#[derive(Clone, Debug)]
pub struct ChatEntry {
    pub chat_type: ChatType,
    pub sender_guid: Guid,
    /// Resolved display name: sender name, entity lookup, or a fallback tag.
    pub sender: String,
    pub channel: Option<String>,
    pub text: String,
    pub language: u32,
    pub chat_tag: u8,
    pub received_at: DateTime<Utc>,
}

/// Ring of recent messages. Oldest entries are evicted past the cap.
#[derive(Debug)]
pub struct ChatLog {
    entries: VecDeque<ChatEntry>,
    cap: usize,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::with_cap(DEFAULT_HISTORY_CAP)
    }
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cap,
        }
    }

    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last `max` entries, oldest first. Zero means everything.
    pub fn recent(&self, max: usize) -> Vec<&ChatEntry> {
        let take = if max == 0 || max >= self.entries.len() {
            self.entries.len()
        } else {
            max
        };
        let skip = self.entries.len() - take;
        self.entries.iter().skip(skip).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> ChatEntry {
        ChatEntry {
            chat_type: ChatType::Say,
            sender_guid: Guid(1),
            sender: "Alice".into(),
            channel: None,
            text: format!("message {n}"),
            language: 7,
            chat_tag: 0,
            received_at: Utc::now(),
        }
    }

    #[test]
    fn test_evicts_oldest_past_the_cap() {
        let mut log = ChatLog::new();
        for n in 0..105 {
            log.push(entry(n));
        }

        assert_eq!(log.len(), 100);
        let all = log.recent(0);
        assert_eq!(all[0].text, "message 5");
        assert_eq!(all[99].text, "message 104");
    }

    #[test]
    fn test_recent_returns_tail_oldest_first() {
        let mut log = ChatLog::new();
        for n in 0..10 {
            log.push(entry(n));
        }

        let tail = log.recent(3);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].text, "message 7");
        assert_eq!(tail[2].text, "message 9");

        assert_eq!(log.recent(50).len(), 10);
    }

    #[test]
    fn test_cap_is_configurable() {
        let mut log = ChatLog::with_cap(2);
        log.push(entry(0));
        log.push(entry(1));
        log.push(entry(2));

        let all = log.recent(0);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].text, "message 1");
    }
}
