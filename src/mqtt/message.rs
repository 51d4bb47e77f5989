use chrono::NaiveDateTime;
use std::borrow::Cow;

/// One inbound bus message, alive for a single dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub timestamp: NaiveDateTime,
}

impl BusMessage {
    /// Stamps the message with the local arrival time
    pub fn received(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self::at(topic, payload, chrono::Local::now().naive_local())
    }

    pub fn at(
        topic: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        timestamp: NaiveDateTime,
    ) -> Self {
        BusMessage {
            topic: topic.into(),
            payload: payload.into(),
            timestamp,
        }
    }

    /// Payload as text, invalid UTF-8 replaced
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn keeps_the_given_arrival_time() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(21, 4, 0)
            .unwrap();
        let msg = BusMessage::at("zigbee2mqtt/shiny_4_button", r#"{"action":"on"}"#, ts);
        assert_eq!(msg.timestamp, ts);
        assert_eq!(msg.payload_text(), r#"{"action":"on"}"#);
    }

    #[test]
    fn invalid_utf8_is_still_renderable() {
        let msg = BusMessage::received("zigbee2mqtt/x", vec![0x7b, 0xff, 0x7d]);
        assert_eq!(msg.payload_text(), "{\u{fffd}}");
    }
}
