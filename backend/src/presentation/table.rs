//! Typed cells and column-driven table building.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
pub const EMPTY_PLACEHOLDER: &str = "—";

/// One formatted value in a table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn optional_timestamp(value: Option<DateTime<Utc>>) -> Self {
        value.map(Cell::Timestamp).unwrap_or(Cell::Empty)
    }

    /// Display form. Not escaped.
    pub fn render(&self) -> String {
        match self {
            Cell::Int(v) => v.to_string(),
            Cell::Text(v) if v.is_empty() => EMPTY_PLACEHOLDER.to_string(),
            Cell::Text(v) => v.clone(),
            Cell::Timestamp(t) => t.format(TIMESTAMP_FORMAT).to_string(),
            Cell::Empty => EMPTY_PLACEHOLDER.to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Int(_) => 1,
            Cell::Timestamp(_) => 2,
            Cell::Text(_) => 3,
        }
    }

    /// Ordering used for column sorting; empty cells sort first.
    pub fn sort_cmp(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Int(a), Cell::Int(b)) => a.cmp(b),
            (Cell::Timestamp(a), Cell::Timestamp(b)) => a.cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// How to project one attribute of `T` into a column.
pub struct Column<T> {
    pub key: &'static str,
    pub header: &'static str,
    pub value: fn(&T) -> Cell,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            header: self.header,
            value: self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    pub key: &'static str,
    pub header: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// One row per item, in the order given.
    pub fn build<T>(columns: &[Column<T>], items: &[T]) -> Self {
        let headers = columns
            .iter()
            .map(|c| ColumnHeader {
                key: c.key,
                header: c.header,
            })
            .collect();
        let rows = items
            .iter()
            .map(|item| columns.iter().map(|c| (c.value)(item)).collect())
            .collect();
        Self { headers, rows }
    }

    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.key == key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stable sort on one column. Returns false when the key is unknown.
    pub fn sort_by_column(&mut self, key: &str, descending: bool) -> bool {
        let Some(index) = self.column_index(key) else {
            return false;
        };
        self.rows.sort_by(|a, b| {
            let ord = a[index].sort_cmp(&b[index]);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
        true
    }
}
