//! In-memory tables
//!
//! `Table` is the raw loaded data where any cell may be missing.
//! `Frame` is the dense numeric matrix produced by cleaning; every
//! later stage works on frames.

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Raw numeric table with possibly missing cells
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl Table {
    /// Create a table, checking that every row matches the column set
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Result<Self> {
        check_unique(&columns)?;

        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(PipelineError::invalid_config(format!(
                "row {} has {} cells, expected {}",
                idx,
                row.len(),
                columns.len()
            )));
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    /// Get number of rows
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Get number of columns
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Dense numeric table (rows x columns) with named columns
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl Frame {
    /// Create a frame from column names and a value matrix
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        check_unique(&columns)?;

        if values.ncols() != columns.len() {
            return Err(PipelineError::invalid_config(format!(
                "matrix has {} columns but {} names were given",
                values.ncols(),
                columns.len()
            )));
        }

        Ok(Self { columns, values })
    }

    /// Build a frame from row vectors
    pub fn from_rows(columns: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let n_cols = columns.len();
        if let Some(row) = rows.iter().find(|r| r.len() != n_cols) {
            return Err(PipelineError::invalid_config(format!(
                "row has {} values, expected {}",
                row.len(),
                n_cols
            )));
        }

        let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        let values = Array2::from_shape_vec((rows.len(), n_cols), flat)
            .map_err(|e| PipelineError::invalid_config(e.to_string()))?;

        Self::new(columns, values)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Get number of rows
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    /// Get number of columns
    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    /// View of a single column by name
    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self.column_index(name)?;
        Ok(self.values.column(idx))
    }

    /// Owned copy of a column by name
    pub fn column_vec(&self, name: &str) -> Result<Array1<f64>> {
        Ok(self.column(name)?.to_owned())
    }

    /// Matrix of the named columns, in the given order
    pub fn select(&self, names: &[String]) -> Result<Array2<f64>> {
        let indices = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.values.select(Axis(1), &indices))
    }

    /// Frame with only the named columns, in the given order
    pub fn project(&self, names: &[String]) -> Result<Frame> {
        Frame::new(names.to_vec(), self.select(names)?)
    }

    /// New frame with only the given rows, in the given order
    pub fn take_rows(&self, indices: &[usize]) -> Frame {
        Frame {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), indices),
        }
    }
}

fn check_unique(columns: &[String]) -> Result<()> {
    for (i, name) in columns.iter().enumerate() {
        if columns[..i].contains(name) {
            return Err(PipelineError::invalid_config(format!(
                "duplicate column name '{}'",
                name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_table_rejects_ragged_rows() {
        let result = Table::new(
            names(&["a", "b"]),
            vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0)]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_table_rejects_duplicate_names() {
        let result = Table::new(names(&["a", "a"]), vec![]);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_frame_select_and_take_rows() {
        let frame = Frame::from_rows(
            names(&["x1", "x2", "y"]),
            &[
                vec![1.0, 2.0, 3.0],
                vec![4.0, 5.0, 6.0],
                vec![7.0, 8.0, 9.0],
            ],
        )
        .unwrap();

        let x = frame.select(&names(&["x2", "x1"])).unwrap();
        assert_eq!(x.row(0).to_vec(), vec![2.0, 1.0]);

        let projected = frame.project(&names(&["y", "x1"])).unwrap();
        assert_eq!(projected.columns(), names(&["y", "x1"]).as_slice());
        assert_eq!(projected.column("x1").unwrap().to_vec(), vec![1.0, 4.0, 7.0]);
        assert!(frame.project(&names(&["volume"])).is_err());

        let subset = frame.take_rows(&[2, 0]);
        assert_eq!(subset.n_rows(), 2);
        assert_eq!(subset.column("y").unwrap().to_vec(), vec![9.0, 3.0]);
    }

    #[test]
    fn test_frame_missing_column() {
        let frame = Frame::from_rows(names(&["x"]), &[vec![1.0]]).unwrap();
        assert!(matches!(
            frame.column("close"),
            Err(PipelineError::MissingColumn(_))
        ));
    }
}
