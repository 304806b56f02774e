use crate::{Fraction, Matrix};
use num_traits::{One, Zero};
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// The outcome of trying to balance an equation.
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    /// One coefficient for each molecule marked as unknown, reactants first.
    Solved(Vec<Fraction>),
    /// There is no (non-trivial) way to balance the equation.
    Unsolved,
    /// Every coefficient was already known, and they balance.
    Balanced,
    /// Every coefficient was already known, but they don't balance.
    Unbalanced,
}

impl Solution {
    pub fn status(&self) -> Status {
        match self {
            Solution::Solved(_) => Status::Solved,
            Solution::Unsolved => Status::Unsolved,
            Solution::Balanced => Status::Balanced,
            Solution::Unbalanced => Status::Unbalanced,
        }
    }

    pub fn coefficients(&self) -> Option<&[Fraction]> {
        match self {
            Solution::Solved(coefficients) => Some(coefficients),
            _ => None,
        }
    }
}

/// A [`Solution`] without its coefficients.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Solved,
    Unsolved,
    Balanced,
    Unbalanced,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Status::Solved => write!(f, "solved"),
            Status::Unsolved => write!(f, "unsolved"),
            Status::Balanced => write!(f, "balanced"),
            Status::Unbalanced => write!(f, "unbalanced"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// The solver produced coefficients which don't actually balance the
    /// equation.
    #[error("The calculated coefficients don't balance every atom")]
    InvalidSolution,
    /// A value needed while balancing is too large to represent.
    #[error("The numbers involved are too large to balance the equation")]
    Overflow,
}

/// Why back-substitution stopped early.
enum Halt {
    /// A row demanded a non-zero value from a combination of unknowns which
    /// is always zero.
    Inconsistent,
    Failed(SolveError),
}

impl From<SolveError> for Halt {
    fn from(e: SolveError) -> Halt { Halt::Failed(e) }
}

fn checked(value: Option<Fraction>) -> Result<Fraction, SolveError> {
    value.ok_or(SolveError::Overflow)
}

impl Matrix<Fraction> {
    /// Read the coefficients out of a matrix which has already been put into
    /// reduced row-echelon form by [`Matrix::reduce()`].
    ///
    /// Each row represents `a·x + constant = 0`, where the constant is the
    /// last column. Rows are solved from the bottom up, substituting the
    /// values found so far. Free variables are seeded with whatever integer
    /// keeps their row integral, and as long as no constant has pinned down
    /// the scale of the solution, every fractional value we discover scales
    /// all the coefficients so they stay integers.
    pub fn solve(&self) -> Result<Solution, SolveError> {
        let unknowns = self.num_columns().saturating_sub(1);

        if unknowns == 0 {
            return Ok(
                if self.rows().all(|row| row.iter().all(Zero::is_zero)) {
                    Solution::Balanced
                } else {
                    Solution::Unbalanced
                },
            );
        }

        let mut state = BackSubstitution::new(unknowns);

        for row in self.rows().rev() {
            match state.substitute(row) {
                Ok(()) => {},
                Err(Halt::Inconsistent) => return Ok(Solution::Unsolved),
                Err(Halt::Failed(e)) => return Err(e),
            }
        }

        Ok(state.finish())
    }
}

struct BackSubstitution {
    values: Vec<Option<Fraction>>,
    /// Has a non-zero constant pinned the scale of the solution?
    fixed: bool,
}

impl BackSubstitution {
    fn new(unknowns: usize) -> Self {
        BackSubstitution {
            values: vec![None; unknowns],
            fixed: false,
        }
    }

    fn substitute(&mut self, row: &[Fraction]) -> Result<(), Halt> {
        let (&constant, coefficients) = match row.split_last() {
            Some(parts) => parts,
            None => return Ok(()),
        };

        let mut total = constant;
        if !total.is_zero() {
            self.fixed = true;
        }

        for column in (0..coefficients.len()).rev() {
            let entry = coefficients[column];

            if let Some(value) = self.values[column] {
                total = checked(
                    value.checked_mul(entry).and_then(|v| v.checked_add(total)),
                )?;
                continue;
            }

            let is_pivot = coefficients[..column].iter().all(Zero::is_zero);

            if !is_pivot {
                self.seed_free_variable(column, entry, &mut total)?;
            } else if total.is_zero() {
                if !entry.is_zero() {
                    self.values[column] = Some(Fraction::zero());
                }
                return Ok(());
            } else if entry.is_zero() {
                return Err(Halt::Inconsistent);
            } else {
                let value = checked(
                    total.checked_div(entry).and_then(Fraction::checked_neg),
                )?;
                self.values[column] = Some(value);
                if !self.fixed {
                    self.rescale(value.denominator())?;
                }
                return Ok(());
            }
        }

        Ok(())
    }

    /// Pick a value for a column which this row doesn't determine.
    fn seed_free_variable(
        &mut self,
        column: usize,
        entry: Fraction,
        total: &mut Fraction,
    ) -> Result<(), SolveError> {
        if total.is_zero() || entry.is_zero() {
            // entry * denominator is always an integer
            self.values[column] = Some(Fraction::from(entry.denominator()));
            *total = checked(
                total.checked_add(Fraction::from(entry.numerator())),
            )?;
            return Ok(());
        }

        let ratio = checked(total.checked_div(entry))?;
        if !self.fixed {
            let factor = ratio.denominator();
            self.rescale(factor)?;
            *total = checked(total.checked_mul_int(factor))?;
        }

        let value = Fraction::from(ratio.numerator());
        self.values[column] = Some(value);
        *total = checked(
            value.checked_mul(entry).and_then(|v| v.checked_add(*total)),
        )?;

        Ok(())
    }

    fn rescale(&mut self, factor: i64) -> Result<(), SolveError> {
        if factor == 1 {
            return Ok(());
        }

        for value in self.values.iter_mut().flatten() {
            *value = checked(value.checked_mul_int(factor))?;
        }

        Ok(())
    }

    fn finish(self) -> Solution {
        let values: Vec<Fraction> = self
            .values
            .into_iter()
            .map(|value| value.unwrap_or_else(Fraction::one))
            .collect();

        if !self.fixed && values.iter().all(Zero::is_zero) {
            // the trivial solution doesn't balance anything
            Solution::Unsolved
        } else {
            Solution::Solved(values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Atom;

    fn reduced(values: &[&[i64]]) -> Matrix<Fraction> {
        let labels = ["H", "O", "C", "N", "S", "K"]
            .iter()
            .take(values.len())
            .map(|s| Atom::new(s).unwrap())
            .collect();
        let mut matrix = Matrix::init(labels, values[0].len(), |column, row| {
            Fraction::from(values[row][column])
        });
        matrix.reduce().unwrap();
        matrix
    }

    fn integers(values: &[i64]) -> Solution {
        Solution::Solved(values.iter().copied().map(Fraction::from).collect())
    }

    #[test]
    fn nothing_to_solve_and_already_balanced() {
        let matrix = reduced(&[&[0], &[0]]);

        assert_eq!(matrix.solve().unwrap(), Solution::Balanced);
    }

    #[test]
    fn nothing_to_solve_but_unbalanced() {
        let matrix = reduced(&[&[-4], &[-1]]);

        assert_eq!(matrix.solve().unwrap(), Solution::Unbalanced);
    }

    #[test]
    fn one_free_variable() {
        // _H2 + _O2 = _H2O
        let matrix = reduced(&[&[2, 0, -2, 0], &[0, 2, -1, 0]]);

        assert_eq!(matrix.solve().unwrap(), integers(&[2, 1, 2]));
    }

    #[test]
    fn fractional_pivots_rescale_everything() {
        // _Fe + _O2 = _Fe2O3, with iron as the first row
        let matrix = reduced(&[&[1, 0, -2, 0], &[0, 2, -3, 0]]);

        assert_eq!(matrix.solve().unwrap(), integers(&[4, 3, 2]));
    }

    #[test]
    fn fixed_molecules_pin_the_scale() {
        // _H2 + _O2 = H2O
        let matrix = reduced(&[&[2, 0, -2], &[0, 2, -1]]);

        let got = matrix.solve().unwrap();

        assert_eq!(
            got,
            Solution::Solved(vec![Fraction::from(1), Fraction::new(1, 2)])
        );
    }

    #[test]
    fn a_constant_without_unknowns_is_inconsistent() {
        // _H2 = He
        let matrix = reduced(&[&[2, 0], &[0, -1]]);

        assert_eq!(matrix.solve().unwrap(), Solution::Unsolved);
    }

    #[test]
    fn only_the_trivial_solution() {
        // _H2 = _O2
        let matrix = reduced(&[&[2, 0, 0], &[0, -2, 0]]);

        assert_eq!(matrix.solve().unwrap(), Solution::Unsolved);
    }

    #[test]
    fn several_free_variables_still_satisfy_every_row() {
        // _H2 + _O2 = _H2O + _H2O2 has a two dimensional solution space
        let original: &[&[i64]] = &[&[2, 0, -2, -2, 0], &[0, 2, -1, -2, 0]];
        let matrix = reduced(original);

        let got = matrix.solve().unwrap();
        let coefficients = got.coefficients().unwrap();

        assert!(coefficients.iter().all(|c| c.is_integer()));
        assert!(coefficients.iter().any(|c| !c.is_zero()));
        for row in original {
            let total = row
                .iter()
                .zip(coefficients)
                .fold(Fraction::zero(), |acc, (&a, &x)| acc + x * a);
            assert!(total.is_zero(), "{:?} doesn't satisfy {:?}", got, row);
        }
    }

    #[test]
    fn coefficients_too_large_to_represent() {
        // _H9223372036854775807 + _O2 = _H2O needs 2 * i64::MAX water
        let matrix = reduced(&[&[i64::MAX, 0, -2, 0], &[0, 2, -1, 0]]);

        assert_eq!(matrix.solve(), Err(SolveError::Overflow));
    }

    #[test]
    fn status_of_each_solution() {
        assert_eq!(integers(&[1]).status(), Status::Solved);
        assert_eq!(Solution::Unsolved.status(), Status::Unsolved);
        assert_eq!(Solution::Balanced.status(), Status::Balanced);
        assert_eq!(Solution::Unbalanced.status(), Status::Unbalanced);
        assert_eq!(Solution::Balanced.coefficients(), None);
    }
}
