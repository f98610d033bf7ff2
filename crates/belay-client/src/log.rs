//! Room message log.

use belay_proto::ChatMessage;

use crate::SessionError;

/// Delivery state of a locally sent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketState {
    /// Handed to the transport, echo not yet seen
    Pending,
    /// Server echo matched
    Confirmed,
    /// Could not be handed to the transport
    Failed,
}

/// One row of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    message: ChatMessage,
    ticket: Option<TicketState>,
}

impl LogEntry {
    /// The message as displayed.
    pub fn message(&self) -> &ChatMessage {
        &self.message
    }

    /// Ticket state for messages sent from this session; `None` for history
    /// and messages from other participants.
    pub fn ticket_state(&self) -> Option<TicketState> {
        self.ticket
    }
}

/// Ordered conversation for one room.
///
/// Entries stay in receipt order and are never re-sorted by timestamp. Only
/// the owning session mutates the log; once frozen every mutation is
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
    frozen: bool,
}

impl MessageLog {
    /// Log seeded with history, in the given order.
    pub(crate) fn with_history(history: Vec<ChatMessage>) -> Self {
        let entries = history.into_iter().map(|message| LogEntry { message, ticket: None }).collect();
        Self { entries, frozen: false }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the log has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `position`.
    pub fn get(&self, position: usize) -> Option<&LogEntry> {
        self.entries.get(position)
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Iterate entries, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    /// Last entry, if any.
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    /// True once the owning session has closed.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn append(
        &mut self,
        message: ChatMessage,
        ticket: Option<TicketState>,
    ) -> Result<usize, SessionError> {
        if self.frozen {
            return Err(SessionError::Closed);
        }
        self.entries.push(LogEntry { message, ticket });
        Ok(self.entries.len() - 1)
    }

    /// Move the ticket at `position`. Entries without a ticket are left
    /// alone.
    pub(crate) fn set_ticket(
        &mut self,
        position: usize,
        state: TicketState,
    ) -> Result<(), SessionError> {
        if self.frozen {
            return Err(SessionError::Closed);
        }
        if let Some(entry) = self.entries.get_mut(position)
            && entry.ticket.is_some()
        {
            entry.ticket = Some(state);
        }
        Ok(())
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use belay_proto::MessageType;
    use chrono::DateTime;

    use super::*;

    fn message(text: &str) -> ChatMessage {
        ChatMessage {
            message_type: MessageType::Server,
            room: 1,
            sender_id: 2,
            message: text.to_string(),
            sent_at: DateTime::from_timestamp(0, 0).unwrap(),
            client_nonce: None,
        }
    }

    #[test]
    fn history_keeps_given_order() {
        let log = MessageLog::with_history(vec![message("b"), message("a")]);

        let texts: Vec<_> = log.iter().map(|e| e.message().message.as_str()).collect();
        assert_eq!(texts, vec!["b", "a"]);
        assert!(log.iter().all(|e| e.ticket_state().is_none()));
    }

    #[test]
    fn ticket_moves_in_place() {
        let mut log = MessageLog::default();
        let position = log.append(message("hi"), Some(TicketState::Pending)).unwrap();

        log.set_ticket(position, TicketState::Confirmed).unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.get(position).unwrap().ticket_state(), Some(TicketState::Confirmed));
    }

    #[test]
    fn untracked_entries_never_gain_a_ticket() {
        let mut log = MessageLog::with_history(vec![message("old")]);
        log.set_ticket(0, TicketState::Failed).unwrap();
        assert_eq!(log.get(0).unwrap().ticket_state(), None);
    }

    #[test]
    fn frozen_log_rejects_mutation() {
        let mut log = MessageLog::default();
        log.append(message("kept"), Some(TicketState::Pending)).unwrap();
        log.freeze();

        assert_eq!(log.append(message("late"), None), Err(SessionError::Closed));
        assert_eq!(log.set_ticket(0, TicketState::Confirmed), Err(SessionError::Closed));
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(0).unwrap().ticket_state(), Some(TicketState::Pending));
    }
}
