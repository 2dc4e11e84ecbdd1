use std::fmt;

/// First code past the end of the ITMP type space.
pub const MAX_TYPE: u8 = 19;

/// ITMP message type tags with their fixed wire codes.
///
/// Codes 2, 3, 15 and 17 are unassigned and must stay that way for wire
/// compatibility with existing firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Connect = 0,
    Connected = 1,
    Disconnect = 4,
    Error = 5,
    Describe = 6,
    Description = 7,
    Call = 8,
    Result = 9,
    Arguments = 10,
    Progress = 11,
    Cancel = 12,
    Event = 13,
    Publish = 14,
    Subscribe = 16,
    Unsubscribe = 18,
}

impl MessageType {
    /// Every assigned type, in wire-code order.
    pub const ALL: [MessageType; 15] = [
        MessageType::Connect,
        MessageType::Connected,
        MessageType::Disconnect,
        MessageType::Error,
        MessageType::Describe,
        MessageType::Description,
        MessageType::Call,
        MessageType::Result,
        MessageType::Arguments,
        MessageType::Progress,
        MessageType::Cancel,
        MessageType::Event,
        MessageType::Publish,
        MessageType::Subscribe,
        MessageType::Unsubscribe,
    ];

    /// Wire code of this type.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Resolve a wire code. Returns `None` for gaps and out-of-range values.
    pub fn from_code(code: i64) -> Option<Self> {
        let ty = match code {
            0 => MessageType::Connect,
            1 => MessageType::Connected,
            4 => MessageType::Disconnect,
            5 => MessageType::Error,
            6 => MessageType::Describe,
            7 => MessageType::Description,
            8 => MessageType::Call,
            9 => MessageType::Result,
            10 => MessageType::Arguments,
            11 => MessageType::Progress,
            12 => MessageType::Cancel,
            13 => MessageType::Event,
            14 => MessageType::Publish,
            16 => MessageType::Subscribe,
            18 => MessageType::Unsubscribe,
            _ => return None,
        };
        Some(ty)
    }

    /// Upper-case protocol name.
    pub fn name(self) -> &'static str {
        match self {
            MessageType::Connect => "CONNECT",
            MessageType::Connected => "CONNECTED",
            MessageType::Disconnect => "DISCONNECT",
            MessageType::Error => "ERROR",
            MessageType::Describe => "DESCRIBE",
            MessageType::Description => "DESCRIPTION",
            MessageType::Call => "CALL",
            MessageType::Result => "RESULT",
            MessageType::Arguments => "ARGUMENTS",
            MessageType::Progress => "PROGRESS",
            MessageType::Cancel => "CANCEL",
            MessageType::Event => "EVENT",
            MessageType::Publish => "PUBLISH",
            MessageType::Subscribe => "SUBSCRIBE",
            MessageType::Unsubscribe => "UNSUBSCRIBE",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_roundtrip() {
        for ty in MessageType::ALL {
            assert_eq!(MessageType::from_code(ty.code() as i64), Some(ty));
        }
    }

    #[test]
    fn reserved_gaps_are_rejected() {
        for code in [2, 3, 15, 17] {
            assert_eq!(MessageType::from_code(code), None, "code {code}");
        }
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert_eq!(MessageType::from_code(MAX_TYPE as i64), None);
        assert_eq!(MessageType::from_code(255), None);
        assert_eq!(MessageType::from_code(-1), None);
    }

    #[test]
    fn fixed_wire_codes() {
        assert_eq!(MessageType::Describe.code(), 6);
        assert_eq!(MessageType::Call.code(), 8);
        assert_eq!(MessageType::Result.code(), 9);
        assert_eq!(MessageType::Unsubscribe.code(), 18);
    }
}
