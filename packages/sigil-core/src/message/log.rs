//! Client-side conversation log: outgoing delivery tracking and
//! incoming deduplication.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MessagePayload, ProcessedMessage};

/// Delivery state of an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    /// Sent to the relay, acknowledgement not yet received
    Pending,
    /// Relay accepted the message
    Confirmed,
}

/// An outgoing message awaiting (or past) relay acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingRecord {
    /// Client-assigned id used to match the relay acknowledgement
    pub client_id: Uuid,
    /// The payload as sent to the relay
    pub payload: MessagePayload,
    /// Kept locally so the sender can render their own message
    pub plaintext: String,
    /// Current delivery state
    pub state: DeliveryState,
}

/// One conversation's message history on the client.
#[derive(Debug, Default)]
pub struct MessageLog {
    outgoing: Vec<OutgoingRecord>,
    incoming: Vec<ProcessedMessage>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outgoing message as pending, returning its client id.
    pub fn push_pending(&mut self, payload: MessagePayload, plaintext: String) -> Uuid {
        let client_id = Uuid::new_v4();
        self.outgoing.push(OutgoingRecord {
            client_id,
            payload,
            plaintext,
            state: DeliveryState::Pending,
        });
        client_id
    }

    /// Mark an outgoing message confirmed. Returns false if no pending
    /// record matches.
    pub fn confirm(&mut self, client_id: Uuid) -> bool {
        for record in &mut self.outgoing {
            if record.client_id == client_id && record.state == DeliveryState::Pending {
                record.state = DeliveryState::Confirmed;
                return true;
            }
        }
        false
    }

    /// Ingest a processed incoming message.
    ///
    /// Duplicates are dropped: two messages with the same sender,
    /// timestamp, and transmitted hash are the same message redelivered.
    pub fn ingest(&mut self, message: ProcessedMessage) -> bool {
        let duplicate = self.incoming.iter().any(|m| {
            m.sender == message.sender
                && m.timestamp == message.timestamp
                && m.transmitted_hash == message.transmitted_hash
        });
        if duplicate {
            tracing::debug!(sender = %message.sender, ts = %message.timestamp, "dropped duplicate");
            return false;
        }
        self.incoming.push(message);
        true
    }

    /// All outgoing records in send order.
    pub fn outgoing(&self) -> &[OutgoingRecord] {
        &self.outgoing
    }

    /// All accepted incoming messages in arrival order.
    pub fn incoming(&self) -> &[ProcessedMessage] {
        &self.incoming
    }
}
