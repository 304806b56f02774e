//! A simplified matrix type, containing just the operations we need to turn
//! a stoichiometric matrix into reduced row-echelon form.

use crate::{Atom, Fraction, SolveError};
use num_traits::Zero;
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::{Index, IndexMut},
};

/// A general-purpose MxN matrix laid out sequentially in memory, where each
/// row is labelled with the [`Atom`] it counts.
#[derive(Clone, PartialEq)]
pub struct Matrix<T> {
    cells: Box<[T]>,
    columns: usize,
    rows: usize,
    labels: Vec<Atom>,
}

impl<T> Matrix<T> {
    /// Create a new [`Matrix`] with one row per label by invoking some
    /// `fn(column, row) -> T` function for each cell.
    pub fn init<F>(labels: Vec<Atom>, columns: usize, mut get_cell: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let rows = labels.len();
        let mut cells = Vec::with_capacity(columns * rows);

        for row in 0..rows {
            for column in 0..columns {
                cells.push(get_cell(column, row));
            }
        }

        Matrix {
            cells: cells.into_boxed_slice(),
            columns,
            rows,
            labels,
        }
    }

    pub fn num_columns(&self) -> usize { self.columns }

    pub fn num_rows(&self) -> usize { self.rows }

    /// The atom each row corresponds to.
    pub fn labels(&self) -> &[Atom] { &self.labels }

    pub fn row(&self, row: usize) -> &[T] {
        assert!(row < self.rows, "Row index out of bounds");
        let start = row * self.columns;
        &self.cells[start..start + self.columns]
    }

    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |row| self.row(row))
    }

    fn index(&self, column: usize, row: usize) -> usize {
        row * self.columns + column
    }

    pub fn get(&self, column: usize, row: usize) -> Option<&T> {
        if column < self.columns && row < self.rows {
            self.cells.get(self.index(column, row))
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, column: usize, row: usize) -> Option<&mut T> {
        if column < self.columns && row < self.rows {
            let ix = self.index(column, row);
            self.cells.get_mut(ix)
        } else {
            None
        }
    }

    /// Swap two rows, keeping their labels attached.
    pub fn swap_rows(&mut self, first: usize, second: usize) {
        assert!(first < self.rows && second < self.rows);

        if first == second {
            return;
        }

        for column in 0..self.columns {
            let a = self.index(column, first);
            let b = self.index(column, second);
            self.cells.swap(a, b);
        }
        self.labels.swap(first, second);
    }
}

impl Matrix<Fraction> {
    /// An augmented matrix full of zeroes.
    pub fn zeroed(labels: Vec<Atom>, columns: usize) -> Self {
        Matrix::init(labels, columns, |_, _| Fraction::zero())
    }

    /// Use Gauss-Jordan elimination to put the matrix into reduced row-echelon
    /// form.
    ///
    /// The forward pass works column by column, swapping the first usable
    /// pivot into place and clearing everything beneath it. The backward pass
    /// then walks the rows from the bottom up, scaling each pivot to `1` and
    /// clearing everything above it.
    ///
    /// Fails with [`SolveError::Overflow`] if an intermediate value can't be
    /// represented, in which case the matrix is left partially reduced.
    pub fn reduce(&mut self) -> Result<(), SolveError> {
        let mut pivot_row = 0;

        for column in 0..self.columns {
            if pivot_row >= self.rows {
                break;
            }

            let found = (pivot_row..self.rows)
                .find(|&row| !self[(column, row)].is_zero());
            let row = match found {
                Some(row) => row,
                None => continue,
            };

            self.swap_rows(row, pivot_row);
            let pivot = self[(column, pivot_row)];

            for below in pivot_row + 1..self.rows {
                let value = self[(column, below)];
                if !value.is_zero() {
                    let factor = value
                        .checked_div(pivot)
                        .and_then(Fraction::checked_neg)
                        .ok_or(SolveError::Overflow)?;
                    self.add_scaled_row(pivot_row, below, factor)?;
                }
            }

            pivot_row += 1;
        }

        for row in (0..self.rows).rev() {
            let column = match self.leading_column(row) {
                Some(column) => column,
                None => continue,
            };

            let pivot = self[(column, row)];
            let factor = pivot.checked_recip().ok_or(SolveError::Overflow)?;
            self.scale_row(row, factor)?;

            for above in 0..row {
                let value = self[(column, above)];
                if !value.is_zero() {
                    let factor =
                        value.checked_neg().ok_or(SolveError::Overflow)?;
                    self.add_scaled_row(row, above, factor)?;
                }
            }
        }

        Ok(())
    }

    /// The column containing the first non-zero entry in a row.
    pub(crate) fn leading_column(&self, row: usize) -> Option<usize> {
        self.row(row).iter().position(|value| !value.is_zero())
    }

    fn scale_row(
        &mut self,
        row: usize,
        factor: Fraction,
    ) -> Result<(), SolveError> {
        for column in 0..self.columns {
            let cell = &mut self[(column, row)];
            *cell = cell.checked_mul(factor).ok_or(SolveError::Overflow)?;
        }

        Ok(())
    }

    /// `target += factor * source`
    fn add_scaled_row(
        &mut self,
        source: usize,
        target: usize,
        factor: Fraction,
    ) -> Result<(), SolveError> {
        for column in 0..self.columns {
            let value = self[(column, source)]
                .checked_mul(factor)
                .and_then(|scaled| scaled.checked_add(self[(column, target)]))
                .ok_or(SolveError::Overflow)?;
            self[(column, target)] = value;
        }

        Ok(())
    }
}

impl<T: Debug> Debug for Matrix<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

impl<T: Display> Display for Matrix<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (label, row) in self.labels.iter().zip(self.rows()) {
            write!(f, "{}\t", label)?;

            for (i, value) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", value)?;
            }

            writeln!(f)?;
        }

        Ok(())
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (column, row): (usize, usize)) -> &Self::Output {
        assert!(column < self.columns, "Column index out of bounds");
        assert!(row < self.rows, "Row index out of bounds");

        self.get(column, row)
            .expect("We've already done bounds checks")
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(
        &mut self,
        (column, row): (usize, usize),
    ) -> &mut Self::Output {
        assert!(column < self.columns, "Column index out of bounds");
        assert!(row < self.rows, "Row index out of bounds");

        self.get_mut(column, row)
            .expect("We've already done bounds checks")
    }
}
