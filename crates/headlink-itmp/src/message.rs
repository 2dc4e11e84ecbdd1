use crate::error::{MessageError, Result};
use crate::kind::MessageType;
use crate::value::Value;

/// A decoded or to-be-encoded ITMP message.
///
/// Each variant serializes to a field list `[type_code, id, ...]` with a
/// fixed per-type layout:
///
/// | Variant       | Fields after the code                         |
/// |---------------|-----------------------------------------------|
/// | `Call`        | id, procedure (string), arguments (list)      |
/// | `Result`      | id, result (list)                             |
/// | `Describe`    | id, topic (string)                            |
/// | `Description` | id, description (list)                        |
/// | `Error`       | id, code (int), reason (string)               |
/// | `Event`       | id, topic (string), arguments (list)          |
/// | `Publish`     | id, topic (string), arguments (list)          |
/// | `Subscribe`   | id, topic (string)                            |
/// | `Unsubscribe` | id, topic (string)                            |
/// | `Control`     | id, then the remaining fields verbatim        |
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Call {
        id: u64,
        procedure: String,
        arguments: Vec<Value>,
    },
    Result {
        id: u64,
        result: Vec<Value>,
    },
    Describe {
        id: u64,
        topic: String,
    },
    Description {
        id: u64,
        description: Vec<Value>,
    },
    Error {
        id: u64,
        code: i64,
        reason: String,
    },
    Event {
        id: u64,
        topic: String,
        arguments: Vec<Value>,
    },
    Publish {
        id: u64,
        topic: String,
        arguments: Vec<Value>,
    },
    Subscribe {
        id: u64,
        topic: String,
    },
    Unsubscribe {
        id: u64,
        topic: String,
    },
    /// Connection-management and extended-RPC messages (CONNECT, CONNECTED,
    /// DISCONNECT, ARGUMENTS, PROGRESS, CANCEL). `kind` must be one of those.
    Control {
        kind: MessageType,
        id: u64,
        payload: Vec<Value>,
    },
}

impl Message {
    /// Build a CALL request.
    pub fn call(id: u64, procedure: impl Into<String>, arguments: Vec<Value>) -> Self {
        Message::Call {
            id,
            procedure: procedure.into(),
            arguments,
        }
    }

    /// Build a DESCRIBE request. An empty topic asks for the full listing.
    pub fn describe(id: u64, topic: impl Into<String>) -> Self {
        Message::Describe {
            id,
            topic: topic.into(),
        }
    }

    /// Build a RESULT reply.
    pub fn result(id: u64, result: Vec<Value>) -> Self {
        Message::Result { id, result }
    }

    /// Build a DESCRIPTION reply.
    pub fn description(id: u64, description: Vec<Value>) -> Self {
        Message::Description { id, description }
    }

    /// Build an ERROR reply.
    pub fn error(id: u64, code: i64, reason: impl Into<String>) -> Self {
        Message::Error {
            id,
            code,
            reason: reason.into(),
        }
    }

    /// Build a control message. Returns `None` for kinds that have a dedicated variant.
    pub fn control(kind: MessageType, id: u64, payload: Vec<Value>) -> Option<Self> {
        is_control_kind(kind).then_some(Message::Control { kind, id, payload })
    }

    /// The message type tag.
    pub fn kind(&self) -> MessageType {
        match self {
            Message::Call { .. } => MessageType::Call,
            Message::Result { .. } => MessageType::Result,
            Message::Describe { .. } => MessageType::Describe,
            Message::Description { .. } => MessageType::Description,
            Message::Error { .. } => MessageType::Error,
            Message::Event { .. } => MessageType::Event,
            Message::Publish { .. } => MessageType::Publish,
            Message::Subscribe { .. } => MessageType::Subscribe,
            Message::Unsubscribe { .. } => MessageType::Unsubscribe,
            Message::Control { kind, .. } => *kind,
        }
    }

    /// The request/response correlation id.
    pub fn id(&self) -> u64 {
        match self {
            Message::Call { id, .. }
            | Message::Result { id, .. }
            | Message::Describe { id, .. }
            | Message::Description { id, .. }
            | Message::Error { id, .. }
            | Message::Event { id, .. }
            | Message::Publish { id, .. }
            | Message::Subscribe { id, .. }
            | Message::Unsubscribe { id, .. }
            | Message::Control { id, .. } => *id,
        }
    }

    /// Flatten into the wire field list `[type_code, id, ...]`.
    ///
    /// Fails when the id does not fit a CBOR signed integer on our side, or
    /// when a `Control` message carries a kind that has its own variant.
    pub fn to_fields(&self) -> Result<Vec<Value>> {
        let kind = self.kind();
        if let Message::Control { .. } = self {
            if !is_control_kind(kind) {
                return Err(MessageError::malformed(kind, "not a control message type"));
            }
        }
        let id = i64::try_from(self.id()).map_err(|_| {
            MessageError::malformed(kind, format!("id {} exceeds {}", self.id(), i64::MAX))
        })?;
        let mut fields = vec![Value::Integer(kind.code().into()), Value::Integer(id)];
        match self {
            Message::Call {
                procedure,
                arguments,
                ..
            } => {
                fields.push(Value::Text(procedure.clone()));
                fields.push(Value::List(arguments.clone()));
            }
            Message::Result { result, .. } => fields.push(Value::List(result.clone())),
            Message::Describe { topic, .. }
            | Message::Subscribe { topic, .. }
            | Message::Unsubscribe { topic, .. } => fields.push(Value::Text(topic.clone())),
            Message::Description { description, .. } => {
                fields.push(Value::List(description.clone()))
            }
            Message::Error { code, reason, .. } => {
                fields.push(Value::Integer(*code));
                fields.push(Value::Text(reason.clone()));
            }
            Message::Event {
                topic, arguments, ..
            }
            | Message::Publish {
                topic, arguments, ..
            } => {
                fields.push(Value::Text(topic.clone()));
                fields.push(Value::List(arguments.clone()));
            }
            Message::Control { payload, .. } => fields.extend(payload.iter().cloned()),
        }
        Ok(fields)
    }

    /// Rebuild a message from its wire field list.
    ///
    /// The type code is resolved first; unknown codes are rejected before any
    /// variant decoder runs. Each decoder then checks the field count and the
    /// kind of every field exactly.
    pub fn from_fields(fields: Vec<Value>) -> Result<Self> {
        let code = match fields.first() {
            Some(Value::Integer(code)) => *code,
            Some(other) => {
                return Err(MessageError::MalformedList(format!(
                    "type tag must be an int, got {}",
                    other.type_name()
                )))
            }
            None => return Err(MessageError::MalformedList("empty field list".into())),
        };
        let kind = MessageType::from_code(code).ok_or(MessageError::UnknownMessageType(code))?;

        let mut fields = Fields::new(kind, fields);
        let message = match kind {
            MessageType::Call => {
                fields.expect_len(4)?;
                Message::Call {
                    id: fields.id()?,
                    procedure: fields.text("procedure")?,
                    arguments: fields.list("arguments")?,
                }
            }
            MessageType::Result => {
                fields.expect_len(3)?;
                Message::Result {
                    id: fields.id()?,
                    result: fields.list("result")?,
                }
            }
            MessageType::Describe => {
                fields.expect_len(3)?;
                Message::Describe {
                    id: fields.id()?,
                    topic: fields.text("topic")?,
                }
            }
            MessageType::Description => {
                fields.expect_len(3)?;
                Message::Description {
                    id: fields.id()?,
                    description: fields.list("description")?,
                }
            }
            MessageType::Error => {
                fields.expect_len(4)?;
                Message::Error {
                    id: fields.id()?,
                    code: fields.int("code")?,
                    reason: fields.text("reason")?,
                }
            }
            MessageType::Event => {
                fields.expect_len(4)?;
                Message::Event {
                    id: fields.id()?,
                    topic: fields.text("topic")?,
                    arguments: fields.list("arguments")?,
                }
            }
            MessageType::Publish => {
                fields.expect_len(4)?;
                Message::Publish {
                    id: fields.id()?,
                    topic: fields.text("topic")?,
                    arguments: fields.list("arguments")?,
                }
            }
            MessageType::Subscribe => {
                fields.expect_len(3)?;
                Message::Subscribe {
                    id: fields.id()?,
                    topic: fields.text("topic")?,
                }
            }
            MessageType::Unsubscribe => {
                fields.expect_len(3)?;
                Message::Unsubscribe {
                    id: fields.id()?,
                    topic: fields.text("topic")?,
                }
            }
            MessageType::Connect
            | MessageType::Connected
            | MessageType::Disconnect
            | MessageType::Arguments
            | MessageType::Progress
            | MessageType::Cancel => {
                fields.expect_min_len(2)?;
                Message::Control {
                    kind,
                    id: fields.id()?,
                    payload: fields.rest(),
                }
            }
        };
        Ok(message)
    }
}

fn is_control_kind(kind: MessageType) -> bool {
    matches!(
        kind,
        MessageType::Connect
            | MessageType::Connected
            | MessageType::Disconnect
            | MessageType::Arguments
            | MessageType::Progress
            | MessageType::Cancel
    )
}

/// Positional reader over a field list, positioned after the type tag.
struct Fields {
    kind: MessageType,
    len: usize,
    iter: std::vec::IntoIter<Value>,
}

impl Fields {
    fn new(kind: MessageType, fields: Vec<Value>) -> Self {
        let len = fields.len();
        let mut iter = fields.into_iter();
        iter.next();
        Self { kind, len, iter }
    }

    fn expect_len(&self, expected: usize) -> Result<()> {
        if self.len != expected {
            return Err(MessageError::malformed(
                self.kind,
                format!("expected {expected} fields, got {}", self.len),
            ));
        }
        Ok(())
    }

    fn expect_min_len(&self, min: usize) -> Result<()> {
        if self.len < min {
            return Err(MessageError::malformed(
                self.kind,
                format!("expected at least {min} fields, got {}", self.len),
            ));
        }
        Ok(())
    }

    fn next(&mut self, name: &str) -> Result<Value> {
        self.iter
            .next()
            .ok_or_else(|| MessageError::malformed(self.kind, format!("missing field '{name}'")))
    }

    fn id(&mut self) -> Result<u64> {
        match self.next("id")? {
            Value::Integer(n) if n >= 0 => Ok(n as u64),
            Value::Integer(n) => Err(MessageError::malformed(
                self.kind,
                format!("id must be non-negative, got {n}"),
            )),
            other => Err(self.wrong_kind("id", "int", &other)),
        }
    }

    fn int(&mut self, name: &str) -> Result<i64> {
        match self.next(name)? {
            Value::Integer(n) => Ok(n),
            other => Err(self.wrong_kind(name, "int", &other)),
        }
    }

    fn text(&mut self, name: &str) -> Result<String> {
        match self.next(name)? {
            Value::Text(s) => Ok(s),
            other => Err(self.wrong_kind(name, "string", &other)),
        }
    }

    fn list(&mut self, name: &str) -> Result<Vec<Value>> {
        match self.next(name)? {
            Value::List(items) => Ok(items),
            other => Err(self.wrong_kind(name, "list", &other)),
        }
    }

    fn rest(self) -> Vec<Value> {
        self.iter.collect()
    }

    fn wrong_kind(&self, name: &str, expected: &str, got: &Value) -> MessageError {
        MessageError::malformed(
            self.kind,
            format!(
                "field '{name}' must be {expected}, got {}",
                got.type_name()
            ),
        )
    }
}
