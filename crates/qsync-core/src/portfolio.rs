//! Portfolio table loading.
//!
//! The curated portfolio is a CSV with at least `symbol` and `units` columns.
//! Header names are trimmed before lookup. `weightage_pct` is carried for
//! display only.

use std::fmt;
use std::io::Read;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CoreError, Result};
use crate::quantity::{parse_units, QuantityMap, UnitsValue};

pub const SYMBOL_COLUMN: &str = "symbol";
pub const UNITS_COLUMN: &str = "units";
pub const WEIGHTAGE_COLUMN: &str = "weightage_pct";

/// Number of rows shown when previewing a table.
pub const PREVIEW_ROWS: usize = 5;

/// Parsed portfolio table (header row + string cells).
#[derive(Debug, Clone, Default)]
pub struct PortfolioTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// First rows of a table, serialisable for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A `units` cell that could not be read as a number and was stored as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitsWarning {
    /// 1-based data row (header excluded).
    pub row: usize,
    pub symbol: String,
    pub raw: String,
}

impl fmt::Display for UnitsWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: units '{}' for {} is not numeric, using 0",
            self.row, self.raw, self.symbol
        )
    }
}

/// Quantity map plus the coercion warnings raised while building it.
#[derive(Debug, Clone, Default)]
pub struct QuantityMapBuild {
    pub map: QuantityMap,
    pub warnings: Vec<UnitsWarning>,
}

impl PortfolioTable {
    /// Build a table directly from headers and rows. Headers are trimmed.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
            rows,
        }
    }

    /// Parse CSV with a header row. Short rows are allowed; missing cells read as empty.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(columns = headers.len(), rows = rows.len(), "Portfolio table parsed");
        Ok(Self::new(headers, rows))
    }

    pub fn from_csv_str(input: &str) -> Result<Self> {
        Self::from_reader(input.as_bytes())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of a column by (trimmed) name; first match wins.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn cell(row: &[String], column: usize) -> &str {
        row.get(column).map(String::as_str).unwrap_or("")
    }

    /// Required columns that are not present.
    pub fn missing_required_columns(&self) -> Vec<String> {
        [SYMBOL_COLUMN, UNITS_COLUMN]
            .iter()
            .filter(|c| self.column_index(c).is_none())
            .map(|c| c.to_string())
            .collect()
    }

    /// First `n` rows with every column.
    pub fn preview(&self, n: usize) -> TablePreview {
        TablePreview {
            columns: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .take(n)
                .map(|row| (0..self.headers.len()).map(|i| Self::cell(row, i).to_string()).collect())
                .collect(),
        }
    }

    /// First `n` rows restricted to `symbol`, `units` and `weightage_pct` (those present).
    pub fn map_preview(&self, n: usize) -> TablePreview {
        let selected: Vec<(String, usize)> = [SYMBOL_COLUMN, UNITS_COLUMN, WEIGHTAGE_COLUMN]
            .iter()
            .filter_map(|name| self.column_index(name).map(|i| (name.to_string(), i)))
            .collect();

        TablePreview {
            columns: selected.iter().map(|(name, _)| name.clone()).collect(),
            rows: self
                .rows
                .iter()
                .take(n)
                .map(|row| selected.iter().map(|(_, i)| Self::cell(row, *i).to_string()).collect())
                .collect(),
        }
    }

    /// Build the symbol → units map.
    ///
    /// Fails with [`CoreError::MissingColumns`] when `symbol` or `units` is absent.
    /// Rows with an empty symbol are skipped. Later rows overwrite earlier rows
    /// with the same symbol.
    pub fn quantity_map(&self) -> Result<QuantityMapBuild> {
        let (Some(symbol_idx), Some(units_idx)) = (
            self.column_index(SYMBOL_COLUMN),
            self.column_index(UNITS_COLUMN),
        ) else {
            return Err(CoreError::MissingColumns {
                missing: self.missing_required_columns(),
                preview: self.preview(PREVIEW_ROWS),
            });
        };

        let mut build = QuantityMapBuild::default();
        for (i, row) in self.rows.iter().enumerate() {
            let symbol = Self::cell(row, symbol_idx);
            if symbol.is_empty() {
                continue;
            }

            let raw = Self::cell(row, units_idx);
            let units = parse_units(raw);
            if units == UnitsValue::Invalid {
                let warning = UnitsWarning {
                    row: i + 1,
                    symbol: symbol.to_string(),
                    raw: raw.to_string(),
                };
                warn!(%warning, "Units coerced to zero");
                build.warnings.push(warning);
            }

            if let Some(previous) = build.map.insert(symbol, units.quantity()) {
                debug!(symbol, previous, "Duplicate symbol, later row wins");
            }
        }

        Ok(build)
    }
}
