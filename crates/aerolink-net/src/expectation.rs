use aerolink_frame::Message;

/// Immutable filter selecting incoming messages for a blocking receive.
///
/// Matches on message id, optionally narrowed to one sender system and
/// one sender component. Unset filters (`None`) are wildcards. Pure value
/// type: constructing one registers nothing and matching has no side
/// effects, so one expectation can be evaluated concurrently against many
/// in-flight messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectation {
    message_id: u32,
    system_id: Option<u8>,
    component_id: Option<u8>,
}

impl Expectation {
    /// Expect a message id from any sender.
    pub fn new(message_id: u32) -> Self {
        Self {
            message_id,
            system_id: None,
            component_id: None,
        }
    }

    /// Narrow to one sender system id.
    pub fn from_system(mut self, system_id: u8) -> Self {
        self.system_id = Some(system_id);
        self
    }

    /// Narrow to one sender component id.
    pub fn from_component(mut self, component_id: u8) -> Self {
        self.component_id = Some(component_id);
        self
    }

    /// Expected message id.
    pub fn message_id(&self) -> u32 {
        self.message_id
    }

    /// Sender system filter, `None` for any.
    pub fn system_id(&self) -> Option<u8> {
        self.system_id
    }

    /// Sender component filter, `None` for any.
    pub fn component_id(&self) -> Option<u8> {
        self.component_id
    }

    /// Whether a decoded message satisfies this expectation.
    pub fn matches(&self, message: &Message) -> bool {
        if message.id() != self.message_id {
            return false;
        }
        let header = message.header();
        self.system_id.is_none_or(|id| id == header.system_id())
            && self
                .component_id
                .is_none_or(|id| id == header.component_id())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aerolink_frame::{Identifier, Message};
    use aerolink_schema::{MessageDefinitionBuilder, WireType};

    use super::*;

    fn message_from(system_id: u8, component_id: u8) -> Message {
        let definition = MessageDefinitionBuilder::new(0, "HEARTBEAT")
            .crc_extra(50)
            .field("type", WireType::U8)
            .build()
            .unwrap();
        let mut msg = Message::new(Arc::new(definition));
        msg.header_mut()
            .set_sender(Identifier::new(system_id, component_id));
        msg
    }

    #[test]
    fn wildcard_matches_every_sender() {
        let expectation = Expectation::new(0);
        assert!(expectation.matches(&message_from(1, 1)));
        assert!(expectation.matches(&message_from(42, 200)));
        assert!(expectation.matches(&message_from(255, 0)));
    }

    #[test]
    fn concrete_system_filter_matches_only_that_system() {
        let expectation = Expectation::new(0).from_system(42);
        assert!(expectation.matches(&message_from(42, 7)));
        assert!(!expectation.matches(&message_from(43, 7)));
    }

    #[test]
    fn component_filter_composes_with_system_filter() {
        let expectation = Expectation::new(0).from_system(1).from_component(190);
        assert!(expectation.matches(&message_from(1, 190)));
        assert!(!expectation.matches(&message_from(1, 191)));
        assert!(!expectation.matches(&message_from(2, 190)));
    }

    #[test]
    fn different_message_id_never_matches() {
        let expectation = Expectation::new(33);
        assert!(!expectation.matches(&message_from(1, 1)));
    }
}
