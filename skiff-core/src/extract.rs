use crate::{DriverValue, Error, Record, RecordDescriptor, Result, RowLabeled, unmarshal};
use std::{collections::BTreeMap, mem, sync::Arc};

/// Turns driver rows into values of `T`.
pub trait RowMapper<T> {
    fn map(&mut self, row: RowLabeled) -> Result<T>;
}

/// Raw row target: every column by name.
pub type RawMap = BTreeMap<String, DriverValue>;
/// Raw row target: every column by position.
pub type RawArray = Vec<DriverValue>;

/// Builds records of type `R` from rows, matching columns by name.
pub struct RowExtractor<R> {
    descriptor: Arc<RecordDescriptor<R>>,
    tolerant: bool,
    /// Attribute index and column position, resolved from the first row.
    positions: Option<Vec<(usize, usize)>>,
}

impl<R: Record> RowExtractor<R> {
    /// A tolerant extractor leaves attributes missing from the result unset.
    pub fn new(descriptor: Arc<RecordDescriptor<R>>, tolerant: bool) -> Self {
        Self {
            descriptor,
            tolerant,
            positions: None,
        }
    }

    pub fn descriptor(&self) -> &RecordDescriptor<R> {
        &self.descriptor
    }

    fn resolve(&self, row: &RowLabeled) -> Result<Vec<(usize, usize)>> {
        let mut positions = Vec::with_capacity(self.descriptor.attributes().len());
        for (i, attribute) in self.descriptor.attributes().iter().enumerate() {
            match row.position(&attribute.column_name) {
                Some(position) => positions.push((i, position)),
                None if self.tolerant => {}
                None => {
                    return Err(Error::MissingColumn {
                        column: attribute.column_name.clone(),
                    });
                }
            }
        }
        Ok(positions)
    }

    /// Materializes one record. Null columns leave the attribute at its default.
    pub fn extract(&mut self, row: RowLabeled) -> Result<R> {
        if self.positions.is_none() {
            self.positions = Some(self.resolve(&row)?);
        }
        let mut values = row.values;
        let mut record = R::default();
        for (attribute, position) in self.positions.iter().flatten() {
            let attribute = &self.descriptor.attributes()[*attribute];
            let Some(value) = values.get_mut(*position).map(mem::take) else {
                return Err(Error::MissingColumn {
                    column: attribute.column_name.clone(),
                });
            };
            let value = unmarshal(attribute.kind, attribute.store_as_timestamp, value)?;
            if !value.is_null() {
                attribute.set(&mut record, value)?;
            }
        }
        Ok(record)
    }
}

impl<R: Record> RowMapper<R> for RowExtractor<R> {
    fn map(&mut self, row: RowLabeled) -> Result<R> {
        self.extract(row)
    }
}

/// Extracts rows into [`RawMap`].
#[derive(Default, Debug, Clone, Copy)]
pub struct MapExtractor;

impl RowMapper<RawMap> for MapExtractor {
    fn map(&mut self, row: RowLabeled) -> Result<RawMap> {
        Ok(row
            .labels
            .iter()
            .cloned()
            .zip(row.values.into_vec())
            .collect())
    }
}

/// Extracts rows into [`RawArray`].
#[derive(Default, Debug, Clone, Copy)]
pub struct ArrayExtractor;

impl RowMapper<RawArray> for ArrayExtractor {
    fn map(&mut self, row: RowLabeled) -> Result<RawArray> {
        Ok(row.values.into_vec())
    }
}

/// Single column results: the first column of each row.
#[derive(Default, Debug, Clone, Copy)]
pub struct ScalarExtractor;

impl RowMapper<DriverValue> for ScalarExtractor {
    fn map(&mut self, row: RowLabeled) -> Result<DriverValue> {
        row.values
            .into_vec()
            .into_iter()
            .next()
            .ok_or_else(|| Error::MissingColumn {
                column: "#1".into(),
            })
    }
}
