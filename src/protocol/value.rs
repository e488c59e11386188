//! Binary value decoding.
//!
//! [`WireValue`] is one field as the protocol hands it over: a wire type
//! identifier plus the raw bytes (or NULL). [`FromWire`] is implemented by
//! every host type that can be decoded from such a cell. This is pure,
//! synchronous computation - no I/O, no async.
//!
//! Decode order inside every implementation is fixed: the NULL flag is
//! inspected first (so a NULL cell fails the same way whatever OID it
//! carries), then the wire type identifier, then the byte length.

use bytes::Buf;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::error::{DecodeError, DecodeResult};
use crate::protocol::interval::PgInterval;
use crate::protocol::types::{Oid, PgType, TypeRegistry};

/// Microseconds from the Unix epoch to the PostgreSQL epoch (2000-01-01).
///
/// Binary timestamps count microseconds from the PostgreSQL epoch; host
/// types count from the Unix epoch. Decoding adds this offset.
pub const PG_EPOCH_MICROS: i64 = 946_684_800_000_000;

/// One field's raw bytes, wire type identifier and NULL flag.
///
/// `bytes` is `None` for SQL NULL; the byte length is the slice length.
/// The cell borrows the result's underlying buffer and is consumed by a
/// single decode call - nothing retains it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireValue<'a> {
    oid: Oid,
    bytes: Option<&'a [u8]>,
}

impl<'a> WireValue<'a> {
    /// Create a cell from its wire type and optional bytes.
    pub const fn new(oid: Oid, bytes: Option<&'a [u8]>) -> Self {
        Self { oid, bytes }
    }

    /// Create a NULL cell of the given wire type.
    pub const fn null(oid: Oid) -> Self {
        Self { oid, bytes: None }
    }

    /// Wire type identifier of this cell.
    pub const fn oid(&self) -> Oid {
        self.oid
    }

    /// Raw bytes, `None` for SQL NULL.
    pub const fn bytes(&self) -> Option<&'a [u8]> {
        self.bytes
    }

    /// Byte length of the value; 0 for NULL.
    pub fn len(&self) -> usize {
        self.bytes.map_or(0, |b| b.len())
    }

    /// Whether this cell is SQL NULL.
    pub const fn is_null(&self) -> bool {
        self.bytes.is_none()
    }

    /// Decode this cell into `T`.
    pub fn decode<T: FromWire<'a>>(self, registry: &TypeRegistry) -> DecodeResult<T> {
        T::from_wire(self, registry)
    }

    /// Non-NULL bytes of a fixed-width value, checked in order: NULL flag,
    /// wire type, exact byte length.
    pub fn expect_fixed<const N: usize>(
        &self,
        expected: Oid,
        target: &'static str,
    ) -> DecodeResult<[u8; N]> {
        let bytes = self.expect_var(expected, target)?;
        if bytes.len() != N {
            return Err(DecodeError::LengthMismatch {
                expected: N,
                actual: bytes.len(),
                target,
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Non-NULL bytes of a variable-length value, checked in order: NULL
    /// flag, wire type.
    pub fn expect_var(&self, expected: Oid, target: &'static str) -> DecodeResult<&'a [u8]> {
        let bytes = self.bytes.ok_or(DecodeError::UnexpectedNull(target))?;
        if self.oid != expected {
            return Err(DecodeError::TypeMismatch {
                expected,
                actual: self.oid,
                target,
            });
        }
        Ok(bytes)
    }
}

/// A host type that can be decoded from one value cell.
///
/// Built-in types know their OID at compile time and ignore the registry;
/// user-defined types resolve their negotiated OID through it:
///
/// ```
/// use grebe_pg::{DecodeResult, FromWire, Oid, TypeRegistry, WireValue};
///
/// struct Mood(String);
///
/// impl<'a> FromWire<'a> for Mood {
///     fn expected_oid(registry: &TypeRegistry) -> DecodeResult<Oid> {
///         registry.oid_of("mood")
///     }
///
///     fn from_wire(value: WireValue<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
///         let bytes = value.expect_var(Self::expected_oid(registry)?, "mood")?;
///         String::from_utf8(bytes.to_vec())
///             .map(Mood)
///             .map_err(|_| grebe_pg::DecodeError::InvalidUtf8("mood"))
///     }
/// }
/// ```
pub trait FromWire<'a>: Sized {
    /// Wire type identifier this host type decodes from.
    fn expected_oid(registry: &TypeRegistry) -> DecodeResult<Oid>;

    /// Wire type identifier of the array-of-this-type family.
    ///
    /// The default refuses; only types with an array form can be array
    /// elements.
    fn expected_array_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Err(DecodeError::NoArrayType(std::any::type_name::<Self>()))
    }

    /// Decode one value cell.
    fn from_wire(value: WireValue<'a>, registry: &TypeRegistry) -> DecodeResult<Self>;
}

/// The nullable adapter: a NULL cell becomes `None` without consulting the
/// inner decoder (or the cell's OID); anything else delegates and wraps.
impl<'a, T: FromWire<'a>> FromWire<'a> for Option<T> {
    fn expected_oid(registry: &TypeRegistry) -> DecodeResult<Oid> {
        T::expected_oid(registry)
    }

    fn expected_array_oid(registry: &TypeRegistry) -> DecodeResult<Oid> {
        T::expected_array_oid(registry)
    }

    fn from_wire(value: WireValue<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_wire(value, registry).map(Some)
        }
    }
}

/// Fixed-width big-endian numbers: int2/int4/int8 two's complement,
/// float4/float8 IEEE-754.
macro_rules! impl_from_wire_be {
    ($($host:ty => $pg:ident, $width:literal;)+) => {$(
        impl<'a> FromWire<'a> for $host {
            fn expected_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
                Ok(PgType::$pg.oid())
            }

            fn expected_array_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
                Ok(PgType::$pg.array_oid())
            }

            fn from_wire(value: WireValue<'a>, _registry: &TypeRegistry) -> DecodeResult<Self> {
                let bytes = value.expect_fixed::<$width>(PgType::$pg.oid(), PgType::$pg.name())?;
                Ok(<$host>::from_be_bytes(bytes))
            }
        }
    )+};
}

impl_from_wire_be! {
    i16 => Int2, 2;
    i32 => Int4, 4;
    i64 => Int8, 8;
    f32 => Float4, 4;
    f64 => Float8, 8;
}

impl<'a> FromWire<'a> for bool {
    fn expected_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Bool.oid())
    }

    fn expected_array_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Bool.array_oid())
    }

    fn from_wire(value: WireValue<'a>, _registry: &TypeRegistry) -> DecodeResult<Self> {
        // Single byte, nonzero = true.
        let [byte] = value.expect_fixed::<1>(PgType::Bool.oid(), PgType::Bool.name())?;
        Ok(byte != 0)
    }
}

impl<'a> FromWire<'a> for String {
    fn expected_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Text.oid())
    }

    fn expected_array_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Text.array_oid())
    }

    fn from_wire(value: WireValue<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
        <&str>::from_wire(value, registry).map(str::to_owned)
    }
}

/// Zero-copy text borrow; lives as long as the source buffer.
impl<'a> FromWire<'a> for &'a str {
    fn expected_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Text.oid())
    }

    fn expected_array_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Text.array_oid())
    }

    fn from_wire(value: WireValue<'a>, _registry: &TypeRegistry) -> DecodeResult<Self> {
        let bytes = value.expect_var(PgType::Text.oid(), PgType::Text.name())?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8(PgType::Text.name()))
    }
}

/// Zero-copy bytea borrow.
impl<'a> FromWire<'a> for &'a [u8] {
    fn expected_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Bytea.oid())
    }

    fn expected_array_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Bytea.array_oid())
    }

    fn from_wire(value: WireValue<'a>, _registry: &TypeRegistry) -> DecodeResult<Self> {
        value.expect_var(PgType::Bytea.oid(), PgType::Bytea.name())
    }
}

/// Owned bytea value.
///
/// A newtype rather than a bare `Vec<u8>` so the byte-string wire type and
/// the generic sequence destinations stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bytea(pub Vec<u8>);

impl Bytea {
    /// Consume the wrapper.
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl std::ops::Deref for Bytea {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytea {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl<'a> FromWire<'a> for Bytea {
    fn expected_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Bytea.oid())
    }

    fn expected_array_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Bytea.array_oid())
    }

    fn from_wire(value: WireValue<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
        <&[u8]>::from_wire(value, registry).map(|bytes| Bytea(bytes.to_vec()))
    }
}

/// Server identifier string (the `name` wire type, distinct from `text`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PgName(pub String);

impl PgName {
    /// Consume the wrapper.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::ops::Deref for PgName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<String> for PgName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl<'a> FromWire<'a> for PgName {
    fn expected_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Name.oid())
    }

    fn expected_array_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Name.array_oid())
    }

    fn from_wire(value: WireValue<'a>, _registry: &TypeRegistry) -> DecodeResult<Self> {
        let bytes = value.expect_var(PgType::Name.oid(), PgType::Name.name())?;
        String::from_utf8(bytes.to_vec())
            .map(PgName)
            .map_err(|_| DecodeError::InvalidUtf8(PgType::Name.name()))
    }
}

impl<'a> FromWire<'a> for Uuid {
    fn expected_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Uuid.oid())
    }

    fn expected_array_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Uuid.array_oid())
    }

    fn from_wire(value: WireValue<'a>, _registry: &TypeRegistry) -> DecodeResult<Self> {
        // 16 raw bytes, no byte-order transform.
        let bytes = value.expect_fixed::<16>(PgType::Uuid.oid(), PgType::Uuid.name())?;
        Ok(Uuid::from_bytes(bytes))
    }
}

/// Decode an 8-byte PostgreSQL-epoch microsecond offset and re-base it onto
/// the Unix epoch.
fn timestamp_from_wire(value: &WireValue<'_>, pg: PgType) -> DecodeResult<DateTime<Utc>> {
    let bytes = value.expect_fixed::<8>(pg.oid(), pg.name())?;
    let pg_micros = i64::from_be_bytes(bytes);
    let unix_micros = pg_micros
        .checked_add(PG_EPOCH_MICROS)
        .ok_or(DecodeError::OutOfRange(pg.name()))?;
    DateTime::from_timestamp_micros(unix_micros).ok_or(DecodeError::OutOfRange(pg.name()))
}

impl<'a> FromWire<'a> for NaiveDateTime {
    fn expected_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Timestamp.oid())
    }

    fn expected_array_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Timestamp.array_oid())
    }

    fn from_wire(value: WireValue<'a>, _registry: &TypeRegistry) -> DecodeResult<Self> {
        timestamp_from_wire(&value, PgType::Timestamp).map(|dt| dt.naive_utc())
    }
}

impl<'a> FromWire<'a> for DateTime<Utc> {
    fn expected_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Timestamptz.oid())
    }

    fn expected_array_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Timestamptz.array_oid())
    }

    fn from_wire(value: WireValue<'a>, _registry: &TypeRegistry) -> DecodeResult<Self> {
        timestamp_from_wire(&value, PgType::Timestamptz)
    }
}

impl<'a> FromWire<'a> for PgInterval {
    fn expected_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Interval.oid())
    }

    fn expected_array_oid(_registry: &TypeRegistry) -> DecodeResult<Oid> {
        Ok(PgType::Interval.array_oid())
    }

    fn from_wire(value: WireValue<'a>, _registry: &TypeRegistry) -> DecodeResult<Self> {
        let bytes = value.expect_fixed::<16>(PgType::Interval.oid(), PgType::Interval.name())?;
        let mut buf = &bytes[..];
        let microseconds = buf.get_i64();
        let days = buf.get_i32();
        let months = buf.get_i32();
        Ok(PgInterval::new(microseconds, days, months))
    }
}

/// An interval flattened to a linear duration on decode.
impl<'a> FromWire<'a> for TimeDelta {
    fn expected_oid(registry: &TypeRegistry) -> DecodeResult<Oid> {
        PgInterval::expected_oid(registry)
    }

    fn expected_array_oid(registry: &TypeRegistry) -> DecodeResult<Oid> {
        PgInterval::expected_array_oid(registry)
    }

    fn from_wire(value: WireValue<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
        PgInterval::from_wire(value, registry).map(|interval| interval.to_timedelta())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::oid;

    #[test]
    fn test_decode_int4() {
        let registry = TypeRegistry::new();
        let value = WireValue::new(oid::INT4, Some(&[0x00, 0x00, 0x00, 0x07]));
        assert_eq!(value.decode::<i32>(&registry).unwrap(), 7);
    }

    #[test]
    fn test_oid_mismatch_beats_length_mismatch() {
        let registry = TypeRegistry::new();
        // Wrong OID and wrong length: the type check fires first.
        let value = WireValue::new(oid::TEXT, Some(b"text\0"));
        assert_eq!(
            value.decode::<i32>(&registry).unwrap_err(),
            DecodeError::TypeMismatch {
                expected: oid::INT4,
                actual: oid::TEXT,
                target: "int4",
            }
        );
    }

    #[test]
    fn test_length_mismatch() {
        let registry = TypeRegistry::new();
        let value = WireValue::new(oid::BOOL, Some(&[0x01, 0x00]));
        assert_eq!(
            value.decode::<bool>(&registry).unwrap_err(),
            DecodeError::LengthMismatch {
                expected: 1,
                actual: 2,
                target: "bool",
            }
        );
    }

    #[test]
    fn test_null_beats_everything() {
        let registry = TypeRegistry::new();
        // The OID matches, the cell is NULL: null-not-allowed, not a type error.
        let value = WireValue::null(oid::TEXT);
        assert_eq!(
            value.decode::<String>(&registry).unwrap_err(),
            DecodeError::UnexpectedNull("text")
        );
    }

    #[test]
    fn test_nullable_adapter() {
        let registry = TypeRegistry::new();
        assert_eq!(
            WireValue::null(oid::INT4).decode::<Option<i32>>(&registry).unwrap(),
            None
        );
        let value = WireValue::new(oid::INT4, Some(&[0x00, 0x00, 0x00, 0x07]));
        assert_eq!(value.decode::<Option<i32>>(&registry).unwrap(), Some(7));
    }

    #[test]
    fn test_bool_nonzero_is_true() {
        let registry = TypeRegistry::new();
        for (byte, expected) in [(0u8, false), (1, true), (2, true), (0xFF, true)] {
            let bytes = [byte];
            let value = WireValue::new(oid::BOOL, Some(&bytes));
            assert_eq!(value.decode::<bool>(&registry).unwrap(), expected);
        }
    }

    #[test]
    fn test_text_requires_utf8() {
        let registry = TypeRegistry::new();
        let value = WireValue::new(oid::TEXT, Some(&[0xFF, 0xFE]));
        assert_eq!(
            value.decode::<String>(&registry).unwrap_err(),
            DecodeError::InvalidUtf8("text")
        );
    }

    #[test]
    fn test_timestamp_rebase_to_unix_epoch() {
        let registry = TypeRegistry::new();
        // -946_684_800_000_000 us before the PostgreSQL epoch is 1970-01-01.
        let bytes = (-PG_EPOCH_MICROS).to_be_bytes();
        let value = WireValue::new(oid::TIMESTAMP, Some(&bytes));
        let got = value.decode::<NaiveDateTime>(&registry).unwrap();
        assert_eq!(got, DateTime::UNIX_EPOCH.naive_utc());
    }

    #[test]
    fn test_timestamp_rebase_overflow_is_out_of_range() {
        let registry = TypeRegistry::new();
        let bytes = i64::MAX.to_be_bytes();
        let value = WireValue::new(oid::TIMESTAMP, Some(&bytes));
        assert_eq!(
            value.decode::<NaiveDateTime>(&registry).unwrap_err(),
            DecodeError::OutOfRange("timestamp")
        );
    }

    #[test]
    fn test_interval_components() {
        let registry = TypeRegistry::new();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&36_672_013_014i64.to_be_bytes());
        bytes.extend_from_slice(&9i32.to_be_bytes());
        bytes.extend_from_slice(&92i32.to_be_bytes());
        let value = WireValue::new(oid::INTERVAL, Some(&bytes));
        assert_eq!(
            value.decode::<PgInterval>(&registry).unwrap(),
            PgInterval::new(36_672_013_014, 9, 92)
        );
    }

    #[test]
    fn test_borrowed_text_and_bytea() {
        let registry = TypeRegistry::new();
        let text = WireValue::new(oid::TEXT, Some(b"test"));
        assert_eq!(text.decode::<&str>(&registry).unwrap(), "test");
        let blob = WireValue::new(oid::BYTEA, Some(b"test"));
        assert_eq!(blob.decode::<&[u8]>(&registry).unwrap(), b"test");
    }
}
