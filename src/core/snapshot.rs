use crate::core::table::{Table, TableError, TableName};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors arising while loading a snapshot. All of them are fatal
/// configuration errors for the process.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("snapshot is missing table '{0}'")]
    MissingTable(TableName),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// One complete, internally consistent set of ledger tables.
///
/// A snapshot always carries every table of the fixed vocabulary, so
/// table access is infallible. Cloning is a deep copy: scenario
/// evaluation clones the baseline and never touches the original.
///
/// # Examples
///
/// ```no_run
/// use estate_recovery::core::snapshot::Snapshot;
/// use estate_recovery::core::table::TableName;
///
/// let baseline = Snapshot::load("data/estate_snapshot.json").unwrap();
/// let cash = baseline.table(TableName::Cash);
/// println!("{} cash locations", cash.len());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotFile", into = "SnapshotFile")]
pub struct Snapshot {
    /// Ordered as `TableName::ALL`.
    tables: Vec<Table>,
}

impl Snapshot {
    /// Assemble a snapshot, requiring every table of the vocabulary exactly once.
    pub fn from_tables<I>(tables: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = Table>,
    {
        let mut by_name: BTreeMap<TableName, Table> =
            tables.into_iter().map(|t| (t.name(), t)).collect();
        let mut ordered = Vec::with_capacity(TableName::ALL.len());
        for name in TableName::ALL {
            let table = by_name
                .remove(&name)
                .ok_or(SnapshotError::MissingTable(name))?;
            ordered.push(table);
        }
        Ok(Self { tables: ordered })
    }

    /// Load the baseline from a workbook JSON export.
    ///
    /// Deterministic: the same file always yields an identical snapshot.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let snapshot = Self::from_json(&content)?;
        log::info!(
            "loaded snapshot from {} ({} tables)",
            path.display(),
            snapshot.tables.len()
        );
        Ok(snapshot)
    }

    pub fn from_json(content: &str) -> Result<Self, SnapshotError> {
        let file: SnapshotFile = serde_json::from_str(content)?;
        Self::try_from(file)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn position(name: TableName) -> usize {
        TableName::ALL
            .iter()
            .position(|n| *n == name)
            .unwrap_or_default()
    }

    pub fn table(&self, name: TableName) -> &Table {
        &self.tables[Self::position(name)]
    }

    pub fn table_mut(&mut self, name: TableName) -> &mut Table {
        &mut self.tables[Self::position(name)]
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.iter_mut()
    }
}

/// On-disk layout of a snapshot: one object per workbook sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotFile {
    tables: BTreeMap<TableName, TableFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableFile {
    columns: Vec<String>,
    rows: Vec<RowFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RowFile {
    label: String,
    values: Vec<Decimal>,
}

impl TryFrom<SnapshotFile> for Snapshot {
    type Error = SnapshotError;

    fn try_from(file: SnapshotFile) -> Result<Self, Self::Error> {
        let mut tables = Vec::with_capacity(file.tables.len());
        for (name, table) in file.tables {
            let rows = table.rows.into_iter().map(|r| (r.label, r.values));
            tables.push(Table::from_rows(name, table.columns, rows)?);
        }
        Snapshot::from_tables(tables)
    }
}

impl From<Snapshot> for SnapshotFile {
    fn from(snapshot: Snapshot) -> Self {
        let tables = snapshot
            .tables
            .into_iter()
            .map(|table| {
                let file = TableFile {
                    columns: table.column_labels().to_vec(),
                    rows: table
                        .rows()
                        .map(|(label, values)| RowFile {
                            label: label.to_string(),
                            values: values.to_vec(),
                        })
                        .collect(),
                };
                (table.name(), file)
            })
            .collect();
        SnapshotFile { tables }
    }
}
