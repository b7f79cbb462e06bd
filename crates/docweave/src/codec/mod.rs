//! Snapshot codec: the byte boundary between a document root and the
//! server.
//!
//! Snapshots are CBOR encodings of the full CRDT state — every queue node
//! including tombstones and superseded concurrent writers — so a decoded
//! object answers identity lookups exactly like the original.

use thiserror::Error;

use crate::crdt::Object;

/// Snapshot bytes could not be parsed into a root object.
#[derive(Debug, Error)]
#[error("snapshot decode failed: {0}")]
pub struct DecodeError(#[from] ciborium::de::Error<std::io::Error>);

/// A root object could not be serialized.
#[derive(Debug, Error)]
#[error("snapshot encode failed: {0}")]
pub struct EncodeError(#[from] ciborium::ser::Error<std::io::Error>);

/// Serialize a root object into snapshot bytes.
pub fn object_to_bytes(object: &Object) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(object, &mut bytes)?;
    Ok(bytes)
}

/// Parse snapshot bytes back into a root object.
pub fn bytes_to_object(bytes: &[u8]) -> Result<Object, DecodeError> {
    Ok(ciborium::from_reader(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ActorID, Ticket, INITIAL_TICKET};
    use crate::crdt::{Array, Element, Object, Primitive, PrimitiveValue};

    fn t(lamport: u64, delimiter: u32) -> Ticket {
        Ticket::new(lamport, delimiter, ActorID::nil())
    }

    fn string_elem(s: &str, at: Ticket) -> Element {
        Element::Primitive(Primitive::new(PrimitiveValue::String(s.to_owned()), at))
    }

    #[test]
    fn round_trip_preserves_marshal() {
        let mut object = Object::new(INITIAL_TICKET);
        object.set("title", string_elem("notes", t(1, 1)));

        let mut list = Array::new(t(1, 2));
        list.insert_after(t(1, 2), string_elem("first", t(1, 3)));
        object.set("items", Element::Array(list));

        let bytes = object_to_bytes(&object).unwrap();
        let decoded = bytes_to_object(&bytes).unwrap();
        assert_eq!(decoded.marshal(), object.marshal());
    }

    #[test]
    fn round_trip_preserves_history_and_tombstones() {
        let mut object = Object::new(INITIAL_TICKET);
        object.set("k", string_elem("loser", t(1, 1)));
        object.set("k", string_elem("winner", t(2, 1)));
        object.delete_by_created_at(t(1, 1), t(3, 1));

        let bytes = object_to_bytes(&object).unwrap();
        let decoded = bytes_to_object(&bytes).unwrap();

        // The superseded node survives the trip, tombstone included.
        assert_eq!(decoded.members().all_nodes().count(), 2);
        let loser = decoded
            .members()
            .all_nodes()
            .find(|node| node.element().created_at() == t(1, 1))
            .unwrap();
        assert!(loser.is_removed());
        assert_eq!(decoded.marshal(), r#"{"k":"winner"}"#);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(bytes_to_object(&[0xff, 0x00, 0x13, 0x37]).is_err());
    }
}
