//! ITMP message model.
//!
//! ITMP is a small RPC message family (CALL/RESULT, DESCRIBE/DESCRIPTION,
//! EVENT/PUBLISH, ...). On the wire every message is a CBOR array
//! `[type_code, id, ...fields]`, sealed into an HDLC-style frame by
//! `headlink-frame`.
//!
//! Dispatch from type code to variant decoder is a plain `match` over
//! [`MessageType`]; there is no registry to forget to update.

pub mod capability;
pub mod error;
pub mod kind;
pub mod message;
pub mod value;
pub mod wire;

pub use capability::{parse_capabilities, Capability};
pub use error::{MessageError, Result};
pub use kind::{MessageType, MAX_TYPE};
pub use message::Message;
pub use value::Value;
pub use wire::{decode_fields, encode_fields, from_frame, to_frame};
