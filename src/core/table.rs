use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The fixed table vocabulary of an estate snapshot.
///
/// Serialized names match the sheet names of the source workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TableName {
    #[serde(rename = "Cash")]
    Cash,
    #[serde(rename = "Assets")]
    Assets,
    #[serde(rename = "Liabilities")]
    Liabilities,
    #[serde(rename = "FTX International Crypto")]
    IntlCrypto,
    #[serde(rename = "FTX US Crypto")]
    UsCrypto,
    #[serde(rename = "FTX International Related Party")]
    IntlRelatedParty,
    #[serde(rename = "FTX US Related Party")]
    UsRelatedParty,
    #[serde(rename = "Alameda Crypto")]
    AlamedaCrypto,
    #[serde(rename = "Investments")]
    Investments,
}

impl TableName {
    pub const ALL: [TableName; 9] = [
        TableName::Cash,
        TableName::Assets,
        TableName::Liabilities,
        TableName::IntlCrypto,
        TableName::UsCrypto,
        TableName::IntlRelatedParty,
        TableName::UsRelatedParty,
        TableName::AlamedaCrypto,
        TableName::Investments,
    ];

    /// Ledgers with `Quantity` / `Located Assets` / `Customer Payables` columns.
    pub const CRYPTO_LEDGERS: [TableName; 3] =
        [TableName::IntlCrypto, TableName::UsCrypto, TableName::AlamedaCrypto];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Cash => "Cash",
            TableName::Assets => "Assets",
            TableName::Liabilities => "Liabilities",
            TableName::IntlCrypto => "FTX International Crypto",
            TableName::UsCrypto => "FTX US Crypto",
            TableName::IntlRelatedParty => "FTX International Related Party",
            TableName::UsRelatedParty => "FTX US Related Party",
            TableName::AlamedaCrypto => "Alameda Crypto",
            TableName::Investments => "Investments",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown table name: {s}"))
    }
}

/// Errors arising from table lookups and edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("table '{table}' has no row '{label}'")]
    MissingRow { table: TableName, label: String },
    #[error("table '{table}' has no column '{column}'")]
    MissingColumn { table: TableName, column: String },
    #[error("table '{table}' already has a row '{label}'")]
    DuplicateRow { table: TableName, label: String },
    #[error("table '{table}' declares column '{column}' twice")]
    DuplicateColumn { table: TableName, column: String },
    #[error("row '{label}' of table '{table}' has {found} values, expected {expected}")]
    ShapeMismatch {
        table: TableName,
        label: String,
        expected: usize,
        found: usize,
    },
}

/// An ordered-row, ordered-column matrix of amounts (in millions).
///
/// Row labels are unique. Lookups go through label→index maps owned by
/// the table; appending a row extends the map, existing positions never
/// shift.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: TableName,
    columns: Vec<String>,
    rows: Vec<String>,
    values: Vec<Vec<Decimal>>,
    column_index: HashMap<String, usize>,
    row_index: HashMap<String, usize>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new(name: TableName, columns: Vec<String>) -> Result<Self, TableError> {
        let mut column_index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if column_index.insert(column.clone(), i).is_some() {
                return Err(TableError::DuplicateColumn {
                    table: name,
                    column: column.clone(),
                });
            }
        }
        Ok(Self {
            name,
            columns,
            rows: Vec::new(),
            values: Vec::new(),
            column_index,
            row_index: HashMap::new(),
        })
    }

    /// Build a table from labelled rows, validating shape and uniqueness.
    pub fn from_rows<I>(name: TableName, columns: Vec<String>, rows: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (String, Vec<Decimal>)>,
    {
        let mut table = Self::new(name, columns)?;
        for (label, values) in rows {
            table.append_row(label, values)?;
        }
        Ok(table)
    }

    pub fn name(&self) -> TableName {
        self.name
    }

    pub fn column_labels(&self) -> &[String] {
        &self.columns
    }

    pub fn row_labels(&self) -> &[String] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_row(&self, label: &str) -> bool {
        self.row_index.contains_key(label)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index.contains_key(column)
    }

    /// Iterate rows in order as (label, values).
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Decimal])> {
        self.rows
            .iter()
            .zip(self.values.iter())
            .map(|(label, values)| (label.as_str(), values.as_slice()))
    }

    fn row_position(&self, label: &str) -> Result<usize, TableError> {
        self.row_index
            .get(label)
            .copied()
            .ok_or_else(|| TableError::MissingRow {
                table: self.name,
                label: label.to_string(),
            })
    }

    fn column_position(&self, column: &str) -> Result<usize, TableError> {
        self.column_index
            .get(column)
            .copied()
            .ok_or_else(|| TableError::MissingColumn {
                table: self.name,
                column: column.to_string(),
            })
    }

    pub fn get(&self, row: &str, column: &str) -> Result<Decimal, TableError> {
        let r = self.row_position(row)?;
        let c = self.column_position(column)?;
        Ok(self.values[r][c])
    }

    pub fn set(&mut self, row: &str, column: &str, amount: Decimal) -> Result<(), TableError> {
        let r = self.row_position(row)?;
        let c = self.column_position(column)?;
        self.values[r][c] = amount;
        Ok(())
    }

    pub fn add(&mut self, row: &str, column: &str, delta: Decimal) -> Result<(), TableError> {
        let r = self.row_position(row)?;
        let c = self.column_position(column)?;
        self.values[r][c] += delta;
        Ok(())
    }

    /// Set every amount of a row to zero.
    pub fn zero_row(&mut self, row: &str) -> Result<(), TableError> {
        let r = self.row_position(row)?;
        self.values[r].iter_mut().for_each(|v| *v = Decimal::ZERO);
        Ok(())
    }

    /// Zero every row whose label satisfies `matches`; returns how many rows matched.
    pub fn zero_rows_where<F>(&mut self, matches: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut zeroed = 0;
        for (label, values) in self.rows.iter().zip(self.values.iter_mut()) {
            if matches(label) {
                values.iter_mut().for_each(|v| *v = Decimal::ZERO);
                zeroed += 1;
            }
        }
        zeroed
    }

    /// Append a new row at the end. Labels are never duplicated.
    pub fn append_row(
        &mut self,
        label: impl Into<String>,
        values: Vec<Decimal>,
    ) -> Result<(), TableError> {
        let label = label.into();
        if self.row_index.contains_key(&label) {
            return Err(TableError::DuplicateRow {
                table: self.name,
                label,
            });
        }
        if values.len() != self.columns.len() {
            return Err(TableError::ShapeMismatch {
                table: self.name,
                label,
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        self.row_index.insert(label.clone(), self.rows.len());
        self.rows.push(label);
        self.values.push(values);
        Ok(())
    }

    /// Add `amount` to an existing row, or append the row holding only `amount`.
    pub fn upsert_add(&mut self, row: &str, column: &str, amount: Decimal) -> Result<(), TableError> {
        let c = self.column_position(column)?;
        if !self.has_row(row) {
            let mut values = vec![Decimal::ZERO; self.columns.len()];
            values[c] = amount;
            return self.append_row(row, values);
        }
        self.add(row, column, amount)
    }

    /// Sum of a column across all rows.
    pub fn column_sum(&self, column: &str) -> Result<Decimal, TableError> {
        self.sum_where(column, |_| true)
    }

    /// Sum of a column across rows whose label satisfies `keep`.
    pub fn sum_where<F>(&self, column: &str, keep: F) -> Result<Decimal, TableError>
    where
        F: Fn(&str) -> bool,
    {
        let c = self.column_position(column)?;
        Ok(self
            .rows()
            .filter(|(label, _)| keep(label))
            .map(|(_, values)| values[c])
            .sum())
    }
}
