//! PostgreSQL type OIDs and the per-connection type registry.
//!
//! Reference: https://github.com/postgres/postgres/blob/master/src/include/catalog/pg_type.dat

use tracing::debug;

use crate::error::{DecodeError, DecodeResult};

/// Protocol-level type identifier.
pub type Oid = u32;

/// OID value PostgreSQL uses for "no type".
pub const NULL_OID: Oid = 0;

/// PostgreSQL type OIDs for the built-in wire types this crate decodes.
pub mod oid {
    use super::Oid;

    // Boolean
    pub const BOOL: Oid = 16;

    // Bytes
    pub const BYTEA: Oid = 17;

    // Characters
    pub const NAME: Oid = 19;
    pub const TEXT: Oid = 25;

    // Integers
    pub const INT8: Oid = 20; // bigint
    pub const INT2: Oid = 21; // smallint
    pub const INT4: Oid = 23; // integer

    // Float
    pub const FLOAT4: Oid = 700;
    pub const FLOAT8: Oid = 701;

    // Date/Time
    pub const TIMESTAMP: Oid = 1114;
    pub const TIMESTAMPTZ: Oid = 1184;
    pub const INTERVAL: Oid = 1186;

    // UUID
    pub const UUID: Oid = 2950;

    // Arrays (defined separately in the catalog, not derived from the element)
    pub const BOOL_ARRAY: Oid = 1000;
    pub const BYTEA_ARRAY: Oid = 1001;
    pub const NAME_ARRAY: Oid = 1003;
    pub const INT2_ARRAY: Oid = 1005;
    pub const INT4_ARRAY: Oid = 1007;
    pub const TEXT_ARRAY: Oid = 1009;
    pub const INT8_ARRAY: Oid = 1016;
    pub const FLOAT4_ARRAY: Oid = 1021;
    pub const FLOAT8_ARRAY: Oid = 1022;
    pub const TIMESTAMP_ARRAY: Oid = 1115;
    pub const TIMESTAMPTZ_ARRAY: Oid = 1185;
    pub const INTERVAL_ARRAY: Oid = 1187;
    pub const UUID_ARRAY: Oid = 2951;
}

/// Built-in wire types, fixed at compile time.
///
/// Custom types negotiated at connection setup live in [`TypeRegistry`]
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PgType {
    /// Boolean type.
    Bool,
    /// Variable-length binary string.
    Bytea,
    /// Internal identifier string (63-byte limit on the server).
    Name,
    /// 2-byte integer.
    Int2,
    /// 4-byte integer.
    Int4,
    /// 8-byte integer.
    Int8,
    /// Single-precision floating-point.
    Float4,
    /// Double-precision floating-point.
    Float8,
    /// Variable-length string.
    Text,
    /// Date and time without time zone.
    Timestamp,
    /// Date and time with time zone.
    Timestamptz,
    /// Time span as microseconds/days/months components.
    Interval,
    /// 128-bit universally unique identifier.
    Uuid,
}

impl PgType {
    /// Returns the wire-protocol OID of this type.
    pub const fn oid(self) -> Oid {
        match self {
            PgType::Bool => oid::BOOL,
            PgType::Bytea => oid::BYTEA,
            PgType::Name => oid::NAME,
            PgType::Int2 => oid::INT2,
            PgType::Int4 => oid::INT4,
            PgType::Int8 => oid::INT8,
            PgType::Float4 => oid::FLOAT4,
            PgType::Float8 => oid::FLOAT8,
            PgType::Text => oid::TEXT,
            PgType::Timestamp => oid::TIMESTAMP,
            PgType::Timestamptz => oid::TIMESTAMPTZ,
            PgType::Interval => oid::INTERVAL,
            PgType::Uuid => oid::UUID,
        }
    }

    /// Returns the OID of the array-of-this-type wire family.
    pub const fn array_oid(self) -> Oid {
        match self {
            PgType::Bool => oid::BOOL_ARRAY,
            PgType::Bytea => oid::BYTEA_ARRAY,
            PgType::Name => oid::NAME_ARRAY,
            PgType::Int2 => oid::INT2_ARRAY,
            PgType::Int4 => oid::INT4_ARRAY,
            PgType::Int8 => oid::INT8_ARRAY,
            PgType::Float4 => oid::FLOAT4_ARRAY,
            PgType::Float8 => oid::FLOAT8_ARRAY,
            PgType::Text => oid::TEXT_ARRAY,
            PgType::Timestamp => oid::TIMESTAMP_ARRAY,
            PgType::Timestamptz => oid::TIMESTAMPTZ_ARRAY,
            PgType::Interval => oid::INTERVAL_ARRAY,
            PgType::Uuid => oid::UUID_ARRAY,
        }
    }

    /// Maps a wire OID back to the built-in type it names.
    ///
    /// Returns `None` for array OIDs and anything not in the built-in set.
    pub const fn from_oid(oid: Oid) -> Option<PgType> {
        match oid {
            oid::BOOL => Some(PgType::Bool),
            oid::BYTEA => Some(PgType::Bytea),
            oid::NAME => Some(PgType::Name),
            oid::INT2 => Some(PgType::Int2),
            oid::INT4 => Some(PgType::Int4),
            oid::INT8 => Some(PgType::Int8),
            oid::FLOAT4 => Some(PgType::Float4),
            oid::FLOAT8 => Some(PgType::Float8),
            oid::TEXT => Some(PgType::Text),
            oid::TIMESTAMP => Some(PgType::Timestamp),
            oid::TIMESTAMPTZ => Some(PgType::Timestamptz),
            oid::INTERVAL => Some(PgType::Interval),
            oid::UUID => Some(PgType::Uuid),
            _ => None,
        }
    }

    /// Returns the catalog name of this type.
    pub const fn name(self) -> &'static str {
        match self {
            PgType::Bool => "bool",
            PgType::Bytea => "bytea",
            PgType::Name => "name",
            PgType::Int2 => "int2",
            PgType::Int4 => "int4",
            PgType::Int8 => "int8",
            PgType::Float4 => "float4",
            PgType::Float8 => "float8",
            PgType::Text => "text",
            PgType::Timestamp => "timestamp",
            PgType::Timestamptz => "timestamptz",
            PgType::Interval => "interval",
            PgType::Uuid => "uuid",
        }
    }

    /// Returns the wire width for fixed-width types, `None` for
    /// variable-length ones.
    pub const fn fixed_len(self) -> Option<usize> {
        match self {
            PgType::Bool => Some(1),
            PgType::Int2 => Some(2),
            PgType::Int4 => Some(4),
            PgType::Int8 => Some(8),
            PgType::Float4 => Some(4),
            PgType::Float8 => Some(8),
            PgType::Timestamp | PgType::Timestamptz => Some(8),
            PgType::Interval => Some(16),
            PgType::Uuid => Some(16),
            PgType::Bytea | PgType::Name | PgType::Text => None,
        }
    }
}

/// Check if an OID names one of the built-in array types.
pub const fn is_array_oid(oid: Oid) -> bool {
    matches!(
        oid,
        oid::BOOL_ARRAY
            | oid::BYTEA_ARRAY
            | oid::NAME_ARRAY
            | oid::INT2_ARRAY
            | oid::INT4_ARRAY
            | oid::TEXT_ARRAY
            | oid::INT8_ARRAY
            | oid::FLOAT4_ARRAY
            | oid::FLOAT8_ARRAY
            | oid::TIMESTAMP_ARRAY
            | oid::TIMESTAMPTZ_ARRAY
            | oid::INTERVAL_ARRAY
            | oid::UUID_ARRAY
    )
}

/// Per-connection table of user-defined types and their negotiated OIDs.
///
/// Custom types are registered by catalog name before the connection is
/// usable. Connection setup then asks the server for the OIDs of every
/// registered name (one round-trip, outside this crate) and applies the
/// answer with [`apply_oids`](TypeRegistry::apply_oids). After that the
/// registry is read-only and can be shared by reference across any number
/// of decode calls.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: Vec<(&'static str, Oid)>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom type by catalog name.
    ///
    /// Registration order is preserved: [`apply_oids`](TypeRegistry::apply_oids)
    /// matches OIDs to names positionally.
    pub fn register(&mut self, name: &'static str) {
        self.entries.push((name, NULL_OID));
    }

    /// Registered type names, in registration order.
    ///
    /// This is the list connection setup sends to the server to resolve
    /// OIDs.
    pub fn type_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    /// Apply the OIDs the server answered with, positionally.
    ///
    /// Fails with [`DecodeError::OidRequestFailed`] when the answer's length
    /// differs from the number of registered types, and with
    /// [`DecodeError::NullOid`] when any answered OID is unset.
    pub fn apply_oids(&mut self, oids: &[Oid]) -> DecodeResult<()> {
        if oids.len() != self.entries.len() {
            return Err(DecodeError::OidRequestFailed {
                expected: self.entries.len(),
                actual: oids.len(),
            });
        }
        for ((name, slot), &oid) in self.entries.iter_mut().zip(oids) {
            if oid == NULL_OID {
                return Err(DecodeError::NullOid(name));
            }
            *slot = oid;
        }
        debug!(types = self.entries.len(), "applied negotiated type oids");
        Ok(())
    }

    /// Negotiated OID of a registered type.
    ///
    /// Looking up a name that was never registered is a caller error.
    pub fn oid_of(&self, name: &'static str) -> DecodeResult<Oid> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, oid)| *oid)
            .ok_or(DecodeError::UnknownType(name))
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid_round_trip() {
        assert_eq!(PgType::from_oid(oid::INT4), Some(PgType::Int4));
        assert_eq!(PgType::from_oid(PgType::Uuid.oid()), Some(PgType::Uuid));
        assert_eq!(PgType::from_oid(12345), None);
        assert_eq!(PgType::from_oid(oid::TEXT_ARRAY), None);
    }

    #[test]
    fn test_fixed_len() {
        assert_eq!(PgType::Bool.fixed_len(), Some(1));
        assert_eq!(PgType::Int8.fixed_len(), Some(8));
        assert_eq!(PgType::Timestamp.fixed_len(), Some(8));
        assert_eq!(PgType::Interval.fixed_len(), Some(16));
        assert_eq!(PgType::Text.fixed_len(), None);
    }

    #[test]
    fn test_is_array_oid() {
        assert!(is_array_oid(oid::INT4_ARRAY));
        assert!(is_array_oid(oid::UUID_ARRAY));
        assert!(!is_array_oid(oid::INT4));
        assert!(!is_array_oid(oid::UUID));
    }

    #[test]
    fn test_registry_apply_in_order() {
        let mut registry = TypeRegistry::new();
        registry.register("mood");
        registry.register("coords");
        registry.apply_oids(&[70001, 70002]).unwrap();
        assert_eq!(registry.oid_of("mood").unwrap(), 70001);
        assert_eq!(registry.oid_of("coords").unwrap(), 70002);
    }

    #[test]
    fn test_registry_length_mismatch() {
        let mut registry = TypeRegistry::new();
        registry.register("mood");
        registry.register("coords");
        let err = registry.apply_oids(&[70001]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::OidRequestFailed {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_registry_null_oid() {
        let mut registry = TypeRegistry::new();
        registry.register("mood");
        let err = registry.apply_oids(&[NULL_OID]).unwrap_err();
        assert_eq!(err, DecodeError::NullOid("mood"));
    }

    #[test]
    fn test_registry_unknown_type() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.oid_of("mood").unwrap_err(),
            DecodeError::UnknownType("mood")
        );
    }
}
