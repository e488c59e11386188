//! Row access and row-to-aggregate decoding.
//!
//! [`ResultSource`] is the seam to the transport layer: anything that can
//! answer row count, field metadata and per-cell bytes. [`Row`] is a borrowed
//! view of one row of such a source. [`FromRow`] maps a whole row onto a host
//! aggregate - a tuple matched by position, a struct matched by column name
//! (opt in through [`from_row_named!`](crate::from_row_named)), or a single
//! scalar when the row has exactly one field.
//!
//! Arity is checked before any field decodes: a destination with N fields
//! refuses a row with any other field count.

use crate::error::{DecodeError, DecodeResult};
use crate::protocol::interval::PgInterval;
use crate::protocol::types::{Oid, TypeRegistry};
use crate::protocol::value::{Bytea, FromWire, PgName, WireValue};

/// Field metadata and cell access for one materialized result.
///
/// Implemented by [`ResultSet`](crate::ResultSet); transport code with its
/// own buffer layout can implement it directly instead. Borrows handed out
/// by [`cell`](ResultSource::cell) live as long as the source itself; the
/// decoders never retain them past a single call.
pub trait ResultSource {
    /// Number of rows in the result.
    fn row_count(&self) -> usize;

    /// Number of fields per row.
    fn field_count(&self) -> usize;

    /// Wire type identifier of the field at `index`.
    fn field_oid(&self, index: usize) -> Option<Oid>;

    /// Index of the field named `name`, if any.
    fn field_index(&self, name: &str) -> Option<usize>;

    /// The cell at (`row`, `index`); `None` when either is out of range.
    fn cell(&self, row: usize, index: usize) -> Option<WireValue<'_>>;
}

/// Borrowed view of one row of a [`ResultSource`].
#[derive(Clone, Copy)]
pub struct Row<'a> {
    source: &'a dyn ResultSource,
    row: usize,
}

impl<'a> Row<'a> {
    /// View of row `row` of `source`.
    ///
    /// The index is not range-checked here; cell access on a row past the
    /// end fails with an index error.
    pub fn new(source: &'a dyn ResultSource, row: usize) -> Self {
        Self { source, row }
    }

    /// Number of fields in this row.
    pub fn field_count(&self) -> usize {
        self.source.field_count()
    }

    /// The cell at `index`.
    pub fn cell(&self, index: usize) -> DecodeResult<WireValue<'a>> {
        self.source
            .cell(self.row, index)
            .ok_or(DecodeError::ColumnIndexOutOfRange {
                index,
                fields: self.source.field_count(),
            })
    }

    /// Index of the field named `name`.
    pub fn field_index(&self, name: &'static str) -> DecodeResult<usize> {
        self.source
            .field_index(name)
            .ok_or(DecodeError::ColumnNotFound(name))
    }

    /// Decode the field at `index` into `T`.
    pub fn get<T: FromWire<'a>>(&self, index: usize, registry: &TypeRegistry) -> DecodeResult<T> {
        self.cell(index)?.decode(registry)
    }

    /// Decode the field named `name` into `T`.
    pub fn get_by_name<T: FromWire<'a>>(
        &self,
        name: &'static str,
        registry: &TypeRegistry,
    ) -> DecodeResult<T> {
        let index = self.field_index(name)?;
        self.get(index, registry)
    }

    /// Decode the whole row into an aggregate.
    pub fn decode<T: FromRow<'a>>(&self, registry: &TypeRegistry) -> DecodeResult<T> {
        T::from_row(self, registry)
    }
}

impl std::fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row")
            .field("row", &self.row)
            .field("fields", &self.source.field_count())
            .finish()
    }
}

/// A host aggregate decodable from one row.
///
/// Implemented for tuples up to arity 12 (positional), for every built-in
/// scalar and its `Option` (one-field rows), and - through
/// [`from_row_named!`](crate::from_row_named) - for structs matched by
/// column name.
pub trait FromRow<'a>: Sized {
    /// Decode one row. The row's field count must match the destination
    /// exactly.
    fn from_row(row: &Row<'a>, registry: &TypeRegistry) -> DecodeResult<Self>;
}

/// Arity guard shared by every aggregate shape.
pub(crate) fn check_field_count(row: &Row<'_>, expected: usize) -> DecodeResult<()> {
    let actual = row.field_count();
    if actual != expected {
        return Err(DecodeError::RowSizeMismatch { expected, actual });
    }
    Ok(())
}

/// Positional aggregates: fields consumed in row order, matched 1:1.
macro_rules! impl_from_row_tuple {
    ($count:literal; $($ty:ident : $idx:tt),+) => {
        impl<'a, $($ty: FromWire<'a>),+> FromRow<'a> for ($($ty,)+) {
            fn from_row(row: &Row<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
                check_field_count(row, $count)?;
                Ok(($(row.get::<$ty>($idx, registry)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(1; T1: 0);
impl_from_row_tuple!(2; T1: 0, T2: 1);
impl_from_row_tuple!(3; T1: 0, T2: 1, T3: 2);
impl_from_row_tuple!(4; T1: 0, T2: 1, T3: 2, T4: 3);
impl_from_row_tuple!(5; T1: 0, T2: 1, T3: 2, T4: 3, T5: 4);
impl_from_row_tuple!(6; T1: 0, T2: 1, T3: 2, T4: 3, T5: 4, T6: 5);
impl_from_row_tuple!(7; T1: 0, T2: 1, T3: 2, T4: 3, T5: 4, T6: 5, T7: 6);
impl_from_row_tuple!(8; T1: 0, T2: 1, T3: 2, T4: 3, T5: 4, T6: 5, T7: 6, T8: 7);
impl_from_row_tuple!(9; T1: 0, T2: 1, T3: 2, T4: 3, T5: 4, T6: 5, T7: 6, T8: 7, T9: 8);
impl_from_row_tuple!(10; T1: 0, T2: 1, T3: 2, T4: 3, T5: 4, T6: 5, T7: 6, T8: 7, T9: 8, T10: 9);
impl_from_row_tuple!(11; T1: 0, T2: 1, T3: 2, T4: 3, T5: 4, T6: 5, T7: 6, T8: 7, T9: 8, T10: 9, T11: 10);
impl_from_row_tuple!(12; T1: 0, T2: 1, T3: 2, T4: 3, T5: 4, T6: 5, T7: 6, T8: 7, T9: 8, T10: 9, T11: 10, T12: 11);

/// Scalar-as-row: a one-field row decodes straight into the scalar.
///
/// Enumerated over the built-in scalar set (and `Option` of each) rather
/// than a blanket impl, which would collide with the tuple impls.
macro_rules! impl_from_row_scalar {
    ($($ty:ty),+ $(,)?) => {$(
        impl<'a> FromRow<'a> for $ty {
            fn from_row(row: &Row<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
                check_field_count(row, 1)?;
                row.get(0, registry)
            }
        }

        impl<'a> FromRow<'a> for Option<$ty> {
            fn from_row(row: &Row<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
                check_field_count(row, 1)?;
                row.get(0, registry)
            }
        }
    )+};
}

impl_from_row_scalar!(
    bool,
    i16,
    i32,
    i64,
    f32,
    f64,
    String,
    Bytea,
    PgName,
    uuid::Uuid,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    chrono::TimeDelta,
    PgInterval,
);

// Zero-copy forms, written out because the scalar macro cannot name the
// row lifetime.
impl<'a> FromRow<'a> for &'a str {
    fn from_row(row: &Row<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
        check_field_count(row, 1)?;
        row.get(0, registry)
    }
}

impl<'a> FromRow<'a> for Option<&'a str> {
    fn from_row(row: &Row<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
        check_field_count(row, 1)?;
        row.get(0, registry)
    }
}

impl<'a> FromRow<'a> for &'a [u8] {
    fn from_row(row: &Row<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
        check_field_count(row, 1)?;
        row.get(0, registry)
    }
}

impl<'a> FromRow<'a> for Option<&'a [u8]> {
    fn from_row(row: &Row<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
        check_field_count(row, 1)?;
        row.get(0, registry)
    }
}

/// Implement [`FromRow`] for a struct by matching column names.
///
/// Declares the struct's static field table - name, position and decode
/// routine per field - once; each decode resolves every field name through
/// the row's name→index lookup and requires the row's field count to equal
/// the struct's exactly:
///
/// ```
/// use grebe_pg::from_row_named;
///
/// #[derive(Debug, PartialEq)]
/// struct Measurement {
///     digit: i32,
///     text: String,
/// }
///
/// from_row_named!(Measurement { digit: i32, text: String });
/// ```
#[macro_export]
macro_rules! from_row_named {
    ($ty:ident { $($field:ident : $fty:ty),+ $(,)? }) => {
        impl<'a> $crate::FromRow<'a> for $ty {
            fn from_row(
                row: &$crate::Row<'a>,
                registry: &$crate::TypeRegistry,
            ) -> $crate::DecodeResult<Self> {
                const FIELDS: &[&str] = &[$(stringify!($field)),+];
                let actual = row.field_count();
                if actual != FIELDS.len() {
                    return Err($crate::DecodeError::RowSizeMismatch {
                        expected: FIELDS.len(),
                        actual,
                    });
                }
                Ok(Self {
                    $($field: row.get_by_name::<$fty>(stringify!($field), registry)?,)+
                })
            }
        }
    };
}
