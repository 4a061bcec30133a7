//! Outbound message records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery state of a message. `Pending -> Sent` is the only transition.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageStatus::Pending => write!(f, "pending"),
            MessageStatus::Sent => write!(f, "sent"),
        }
    }
}

/// A message waiting for (or done with) delivery.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Unique ID (UUID v4)
    pub id: String,

    /// Destination, e.g. a phone number
    pub to: String,

    /// Message text
    pub body: String,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    pub status: MessageStatus,

    /// Set when the client confirms delivery
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub sent_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a pending message stamped with the current time.
    pub(crate) fn new(to: String, body: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            to,
            body,
            created_at: Utc::now(),
            status: MessageStatus::Pending,
            sent_at: None,
        }
    }

    /// Transition to `Sent`. Only called by the queue while moving the record.
    pub(crate) fn mark_sent(&mut self) {
        self.status = MessageStatus::Sent;
        self.sent_at = Some(Utc::now());
    }

    pub fn is_sent(&self) -> bool {
        self.status == MessageStatus::Sent
    }
}

/// Timestamps go over the wire as naive ISO-8601 with microseconds, UTC implied
/// (`2024-05-01T12:30:45.123456`). RFC 3339 with an offset is accepted on input.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.naive_utc().format(FORMAT).to_string()
    }

    pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            Ok(naive) => Ok(naive.and_utc()),
            Err(_) => DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)),
        }
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => super::serialize(ts, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|s| super::parse(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_message_is_pending() {
        let msg = Message::new("+15551234567".into(), "hi".into());

        assert_eq!(msg.status, MessageStatus::Pending);
        assert!(msg.sent_at.is_none());
        assert!(uuid::Uuid::parse_str(&msg.id).is_ok());
    }

    #[test]
    fn test_pending_json_shape() {
        let mut msg = Message::new("+1555".into(), "hello".into());
        msg.created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap();

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["created_at"], "2024-05-01T12:30:45.000000");
        assert!(value.get("sent_at").is_none());
    }

    #[test]
    fn test_sent_json_shape() {
        let mut msg = Message::new("+1555".into(), "hello".into());
        msg.mark_sent();

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["status"], "sent");
        assert!(value["sent_at"].is_string());

        let back: Message = serde_json::from_value(value).unwrap();
        assert!(back.is_sent());
    }

    #[test]
    fn test_parse_accepts_rfc3339() {
        let ts = timestamp::parse("2024-05-01T12:30:45+02:00").unwrap();
        assert_eq!(timestamp::format(&ts), "2024-05-01T10:30:45.000000");

        let ts = timestamp::parse("2024-05-01T12:30:45.5").unwrap();
        assert_eq!(timestamp::format(&ts), "2024-05-01T12:30:45.500000");
    }
}
