//! Materialized results and the result-level decode drivers.
//!
//! [`ResultSet`] owns one result's column metadata and row-major cell bytes,
//! as handed over by transport code that already received them. The drivers
//! walk a [`ResultSource`] row by row: [`decode_one`] for a single-object
//! destination (exactly one row), [`decode_all`] / [`decode_extend`] for
//! growable destinations, [`decode_into`] for a caller-sized slice.

use tracing::trace;

use crate::error::{DecodeError, DecodeResult};
use crate::protocol::row::{FromRow, ResultSource, Row};
use crate::protocol::types::{Oid, TypeRegistry};
use crate::protocol::value::WireValue;

/// One result column: name and wire type identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    oid: Oid,
}

impl Column {
    /// Column metadata from name and type OID.
    pub fn new(name: impl Into<String>, oid: Oid) -> Self {
        Self {
            name: name.into(),
            oid,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire type identifier of the column.
    pub const fn oid(&self) -> Oid {
        self.oid
    }
}

/// An owning, materialized result: column metadata plus row-major cells.
///
/// Row count and field count are fixed once built; `None` cells are SQL
/// NULL. This is the concrete [`ResultSource`] the drivers are normally fed
/// with, but nothing in them depends on it.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Vec<Column>,
    rows: Vec<Vec<Option<Vec<u8>>>>,
}

impl ResultSet {
    /// Empty result with the given column metadata.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append one row of cells, `None` for NULL.
    ///
    /// The cell count must match the column count.
    pub fn push_row(&mut self, cells: Vec<Option<Vec<u8>>>) -> DecodeResult<()> {
        if cells.len() != self.columns.len() {
            return Err(DecodeError::RowSizeMismatch {
                expected: self.columns.len(),
                actual: cells.len(),
            });
        }
        self.rows.push(cells);
        Ok(())
    }

    /// Column metadata, in field order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Borrowed view of row `row`.
    pub fn row(&self, row: usize) -> Option<Row<'_>> {
        (row < self.rows.len()).then(|| Row::new(self, row))
    }

    /// Iterate the rows as borrowed views.
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows.len()).map(move |row| Row::new(self, row))
    }
}

impl ResultSource for ResultSet {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_oid(&self, index: usize) -> Option<Oid> {
        self.columns.get(index).map(Column::oid)
    }

    fn field_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    fn cell(&self, row: usize, index: usize) -> Option<WireValue<'_>> {
        let cells = self.rows.get(row)?;
        let oid = self.field_oid(index)?;
        let bytes = cells.get(index)?.as_deref();
        Some(WireValue::new(oid, bytes))
    }
}

/// Decode a result that must contain exactly one row.
pub fn decode_one<'a, T, S>(source: &'a S, registry: &TypeRegistry) -> DecodeResult<T>
where
    T: FromRow<'a>,
    S: ResultSource,
{
    let rows = source.row_count();
    trace!(rows, fields = source.field_count(), "decoding single-row result");
    if rows != 1 {
        return Err(DecodeError::RowCountMismatch(rows));
    }
    Row::new(source, 0).decode(registry)
}

/// Decode every row, in row order, into a fresh `Vec`.
pub fn decode_all<'a, T, S>(source: &'a S, registry: &TypeRegistry) -> DecodeResult<Vec<T>>
where
    T: FromRow<'a>,
    S: ResultSource,
{
    let mut out = Vec::with_capacity(source.row_count());
    decode_extend(source, registry, &mut out)?;
    Ok(out)
}

/// Decode every row, in row order, into any growable sink.
pub fn decode_extend<'a, T, S, E>(
    source: &'a S,
    registry: &TypeRegistry,
    sink: &mut E,
) -> DecodeResult<()>
where
    T: FromRow<'a>,
    S: ResultSource,
    E: Extend<T>,
{
    let rows = source.row_count();
    trace!(rows, fields = source.field_count(), "decoding result");
    for row in 0..rows {
        sink.extend(std::iter::once(Row::new(source, row).decode::<T>(registry)?));
    }
    Ok(())
}

/// Decode every row into a pre-sized slice, from the front.
///
/// The sink must hold at least `row_count` elements; a longer sink keeps
/// its tail untouched. Returns the number of rows written. On error, rows
/// already written are unspecified and must be discarded by the caller.
pub fn decode_into<'a, T, S>(
    source: &'a S,
    registry: &TypeRegistry,
    sink: &mut [T],
) -> DecodeResult<usize>
where
    T: FromRow<'a>,
    S: ResultSource,
{
    let rows = source.row_count();
    if sink.len() < rows {
        return Err(DecodeError::CapacityMismatch {
            expected: rows,
            actual: sink.len(),
        });
    }
    trace!(rows, fields = source.field_count(), "decoding result into slice");
    for (row, slot) in sink.iter_mut().enumerate().take(rows) {
        *slot = Row::new(source, row).decode(registry)?;
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::oid;

    fn digits(values: &[i32]) -> ResultSet {
        let mut result = ResultSet::new(vec![Column::new("digit", oid::INT4)]);
        for value in values {
            result
                .push_row(vec![Some(value.to_be_bytes().to_vec())])
                .unwrap();
        }
        result
    }

    #[test]
    fn test_push_row_checks_cell_count() {
        let mut result = ResultSet::new(vec![Column::new("digit", oid::INT4)]);
        assert_eq!(
            result.push_row(vec![None, None]).unwrap_err(),
            DecodeError::RowSizeMismatch {
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn test_decode_one_requires_exactly_one_row() {
        let registry = TypeRegistry::new();
        assert_eq!(decode_one::<i32, _>(&digits(&[7]), &registry).unwrap(), 7);
        assert_eq!(
            decode_one::<i32, _>(&digits(&[]), &registry).unwrap_err(),
            DecodeError::RowCountMismatch(0)
        );
        assert_eq!(
            decode_one::<i32, _>(&digits(&[7, 8]), &registry).unwrap_err(),
            DecodeError::RowCountMismatch(2)
        );
    }

    #[test]
    fn test_decode_all_preserves_row_order() {
        let registry = TypeRegistry::new();
        let result = digits(&[3, 1, 2]);
        assert_eq!(decode_all::<i32, _>(&result, &registry).unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_decode_extend_appends() {
        let registry = TypeRegistry::new();
        let mut sink = vec![0i32];
        decode_extend::<i32, _, _>(&digits(&[7, 8]), &registry, &mut sink).unwrap();
        assert_eq!(sink, vec![0, 7, 8]);
    }

    #[test]
    fn test_decode_into_exact_and_longer_sink() {
        let registry = TypeRegistry::new();
        let result = digits(&[7, 8]);

        let mut exact = [0i32; 2];
        assert_eq!(decode_into(&result, &registry, &mut exact).unwrap(), 2);
        assert_eq!(exact, [7, 8]);

        let mut longer = [0i32; 4];
        assert_eq!(decode_into(&result, &registry, &mut longer).unwrap(), 2);
        assert_eq!(longer, [7, 8, 0, 0]);
    }

    #[test]
    fn test_decode_into_short_sink_is_an_error() {
        let registry = TypeRegistry::new();
        let mut sink = [0i32; 1];
        assert_eq!(
            decode_into(&digits(&[7, 8]), &registry, &mut sink).unwrap_err(),
            DecodeError::CapacityMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_row_iteration() {
        let registry = TypeRegistry::new();
        let result = digits(&[7, 8]);
        let decoded: Vec<i32> = result
            .iter()
            .map(|row| row.decode(&registry))
            .collect::<DecodeResult<_>>()
            .unwrap();
        assert_eq!(decoded, vec![7, 8]);
        assert!(result.row(2).is_none());
    }
}
