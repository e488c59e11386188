//! Decode errors.
//!
//! Every failure a decode can hit maps to one variant here. Errors abort the
//! current decode call immediately; no partial value is ever returned and
//! nothing is retried at this layer.

use crate::protocol::types::Oid;

/// Errors that can occur while decoding binary result data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The cell's wire type identifier disagrees with the expected host type.
    #[error("type mismatch decoding {target}: expected oid {expected}, got {actual}")]
    TypeMismatch {
        /// OID the destination type decodes from.
        expected: Oid,
        /// OID the cell actually carries.
        actual: Oid,
        /// Destination type label.
        target: &'static str,
    },

    /// A fixed-width field arrived with the wrong byte length.
    #[error("length mismatch decoding {target}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Wire width of the destination type.
        expected: usize,
        /// Bytes the cell actually carries.
        actual: usize,
        /// Destination type label.
        target: &'static str,
    },

    /// A NULL cell was decoded into a destination with no absent state.
    #[error("unexpected NULL decoding {0}")]
    UnexpectedNull(&'static str),

    /// Array wire image with a dimension count other than 0 or 1.
    #[error("unsupported array rank {0}: only one-dimensional arrays are supported")]
    RankUnsupported(i32),

    /// Fixed-capacity destination and the decoded element count disagree.
    #[error("capacity mismatch: destination holds {expected} elements, got {actual}")]
    CapacityMismatch {
        /// Capacity of the destination.
        expected: usize,
        /// Elements the wire image declares (or rows the result carries).
        actual: usize,
    },

    /// Row field count differs from the destination's field count.
    #[error("row size mismatch: destination has {expected} fields, row has {actual}")]
    RowSizeMismatch {
        /// Fields the destination expects.
        expected: usize,
        /// Fields the row carries.
        actual: usize,
    },

    /// A named destination field has no matching column in the row.
    #[error("column {0:?} not found in row")]
    ColumnNotFound(&'static str),

    /// A field index is past the end of the row.
    #[error("column index {index} out of range: row has {fields} fields")]
    ColumnIndexOutOfRange {
        /// Index that was requested.
        index: usize,
        /// Fields the row carries.
        fields: usize,
    },

    /// Single-object destination and the result's row count is not one.
    #[error("row count mismatch: expected exactly 1 row, result has {0}")]
    RowCountMismatch(usize),

    /// Negotiated OID count differs from the number of registered types.
    #[error("oid request failed: registry has {expected} types, negotiation returned {actual}")]
    OidRequestFailed {
        /// Registered custom types.
        expected: usize,
        /// OIDs the negotiation returned.
        actual: usize,
    },

    /// A negotiated OID came back unset.
    #[error("negotiated oid for type {0:?} is null")]
    NullOid(&'static str),

    /// Lookup of a custom type that was never registered.
    #[error("type {0:?} is not registered")]
    UnknownType(&'static str),

    /// Element type with no array wire family.
    #[error("type {0} has no array form")]
    NoArrayType(&'static str),

    /// Text bytes that are not valid UTF-8.
    #[error("invalid utf-8 decoding {0}")]
    InvalidUtf8(&'static str),

    /// The value's bytes end before the decode is complete.
    #[error("truncated value: needed {needed} more bytes, {available} available")]
    Truncated {
        /// Bytes the next read requires.
        needed: usize,
        /// Bytes left in the value.
        available: usize,
    },

    /// Array header or element framing that violates the wire format.
    #[error("malformed array: {0}")]
    MalformedArray(&'static str),

    /// A decoded value does not fit the host type's range.
    #[error("value out of range for {0}")]
    OutOfRange(&'static str),
}

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_both_sides_of_a_mismatch() {
        let err = DecodeError::TypeMismatch {
            expected: 23,
            actual: 25,
            target: "int4",
        };
        let msg = err.to_string();
        assert!(msg.contains("23"));
        assert!(msg.contains("25"));
        assert!(msg.contains("int4"));
    }

    #[test]
    fn test_display_null() {
        let err = DecodeError::UnexpectedNull("text");
        assert!(err.to_string().contains("NULL"));
    }
}
