//! Typed decoding of PostgreSQL binary result data.
//!
//! Pure, synchronous bytes → values computation: no sockets, no async, no
//! query building. Transport code hands over already-received result data
//! (column metadata plus per-cell bytes); this crate maps wire type
//! identifiers (OIDs) to host types and decodes cells, arrays, rows and
//! whole results into them.
//!
//! # Example
//! ```
//! use grebe_pg::{decode_all, from_row_named, oid, Column, ResultSet, TypeRegistry};
//!
//! #[derive(Debug, PartialEq)]
//! struct Measurement {
//!     digit: i32,
//!     text: String,
//! }
//!
//! from_row_named!(Measurement { digit: i32, text: String });
//!
//! let mut result = ResultSet::new(vec![
//!     Column::new("digit", oid::INT4),
//!     Column::new("text", oid::TEXT),
//! ]);
//! result
//!     .push_row(vec![Some(7i32.to_be_bytes().to_vec()), Some(b"test".to_vec())])
//!     .unwrap();
//!
//! let registry = TypeRegistry::new();
//! let rows: Vec<Measurement> = decode_all(&result, &registry).unwrap();
//! assert_eq!(rows[0], Measurement { digit: 7, text: "test".into() });
//! ```

pub mod error;
pub mod protocol;

pub use error::{DecodeError, DecodeResult};
pub use protocol::{
    decode_all, decode_extend, decode_into, decode_one, is_array_oid, oid, Bytea, Column,
    FromRow, FromWire, Oid, PgInterval, PgName, PgType, ResultSet, ResultSource, Row,
    TypeRegistry, WireValue, PG_EPOCH_MICROS,
};
