use bytes::{Bytes, BytesMut};
use headlink_frame::{decode_packet, encode_packet};

use crate::error::{MessageError, Result};
use crate::message::Message;
use crate::value::Value;

/// Encode a field list as a definite-length CBOR array.
pub fn encode_fields(fields: Vec<Value>) -> Result<Vec<u8>> {
    let array = Value::List(fields).into_cbor();
    let mut out = Vec::new();
    ciborium::ser::into_writer(&array, &mut out).map_err(|e| MessageError::Cbor(e.to_string()))?;
    Ok(out)
}

/// Decode a CBOR body that must hold exactly one top-level array.
pub fn decode_fields(body: &[u8]) -> Result<Vec<Value>> {
    let mut rest = body;
    let item: ciborium::Value =
        ciborium::de::from_reader(&mut rest).map_err(|e| MessageError::Cbor(e.to_string()))?;
    if !rest.is_empty() {
        return Err(MessageError::MalformedList(format!(
            "{} trailing bytes after field list",
            rest.len()
        )));
    }
    match Value::from_cbor(item)? {
        Value::List(fields) => Ok(fields),
        other => Err(MessageError::MalformedList(format!(
            "body must be a list, got {}",
            other.type_name()
        ))),
    }
}

/// Build the complete wire frame for `message` addressed to `address`.
pub fn to_frame(message: &Message, address: u8) -> Result<Bytes> {
    let body = encode_fields(message.to_fields()?)?;
    let mut dst = BytesMut::with_capacity(body.len() + 8);
    encode_packet(address, &body, &mut dst);
    Ok(dst.freeze())
}

/// Parse a received wire frame into its address and message.
///
/// The CRC is verified before the body is looked at; a corrupt frame never
/// reaches the CBOR decoder.
pub fn from_frame(frame: &[u8]) -> Result<(u8, Message)> {
    let packet = decode_packet(frame)?;
    let fields = decode_fields(&packet.body)?;
    let message = Message::from_fields(fields)?;
    Ok((packet.address, message))
}
