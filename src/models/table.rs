use std::fmt;

use crate::error::{PipelineError, Result};

/// A single typed cell of a [`Table`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Infer a typed value from a raw text cell.
    ///
    /// Empty cells and `NaN` markers become [`Value::Missing`].
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
            return Value::Missing;
        }

        if let Ok(int) = trimmed.parse::<i64>() {
            return Value::Int(int);
        }

        match trimmed.parse::<f64>() {
            Ok(float) if float.is_finite() => Value::Float(float),
            _ => Value::Text(trimmed.to_string()),
        }
    }

    /// Keep a raw cell as text, only mapping empty cells to missing.
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Value::Missing
        } else {
            Value::Text(trimmed.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            Value::Missing => None,
        }
    }

    /// Integer view of the value; floats are accepted only when they carry no fraction.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Value::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Hashable identity of the value, used for de-duplication and joins.
    pub fn key(&self) -> ValueKey<'_> {
        match self {
            Value::Missing => ValueKey::Missing,
            Value::Int(i) => ValueKey::Int(*i),
            Value::Float(f) => ValueKey::Float(f.to_bits()),
            Value::Text(s) => ValueKey::Text(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Missing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKey<'a> {
    Missing,
    Int(i64),
    Float(u64),
    Text(&'a str),
}

/// An ordered collection of uniformly keyed rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Position of a column, or [`PipelineError::MissingColumn`].
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::missing_column(name, &self.columns))
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::InvalidFormat(format!(
                "Row has {} values but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Value]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Return a copy with `name` set to `values`, replacing the column if it already exists.
    pub fn with_column(&self, name: &str, values: Vec<Value>) -> Result<Table> {
        if values.len() != self.rows.len() {
            return Err(PipelineError::InvalidFormat(format!(
                "Column '{}' has {} values but table has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        let mut table = self.clone();
        match table.columns.iter().position(|c| c == name) {
            Some(index) => {
                for (row, value) in table.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                table.columns.push(name.to_string());
                for (row, value) in table.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }

        Ok(table)
    }

    /// Return a copy keeping only the rows for which `keep` is true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Value]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row.as_slice()))
                .cloned()
                .collect(),
        }
    }
}
