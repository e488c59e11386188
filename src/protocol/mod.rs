//! PostgreSQL binary result format (pure, sync)
//!
//! This module contains the pure, synchronous result decoder.
//! No async, no I/O, no tokio - just bytes → typed values computation.

pub mod array;
pub mod interval;
pub mod result;
pub mod row;
pub mod types;
pub mod value;

pub use interval::PgInterval;
pub use result::{decode_all, decode_extend, decode_into, decode_one, Column, ResultSet};
pub use row::{FromRow, ResultSource, Row};
pub use types::{is_array_oid, oid, Oid, PgType, TypeRegistry};
pub use value::{Bytea, FromWire, PgName, WireValue, PG_EPOCH_MICROS};
