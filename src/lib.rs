//! Balance chemical equations using exact rational arithmetic.
//!
//! Molecules prefixed with [`UNKNOWN_MARKER`] have their coefficients solved
//! for, everything else is taken as written.
//!
//! ```rust
//! let balanced = balancer::balance("_Fe + _O2 = _Fe2O3").unwrap();
//!
//! assert_eq!(balanced.to_string(), "4Fe + 3O2 = 2Fe2O3");
//! ```

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod equation;
mod fraction;
mod matrix;
mod molecule;
mod parse;
mod solve;

pub use equation::{Balanced, Equation};
pub use fraction::Fraction;
pub use matrix::Matrix;
pub use molecule::{Atom, Molecule, UNKNOWN_MARKER};
pub use parse::{ParseError, Side};
pub use solve::{Solution, SolveError, Status};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// Parse an equation and solve for its unknown coefficients.
pub fn balance(src: &str) -> Result<Balanced, Error> {
    let equation: Equation = src.parse()?;
    let balanced = equation.balance()?;

    Ok(balanced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_from_text() {
        let got = balance("_CH4 + _O2 = _CO2 + _H2O").unwrap();

        assert_eq!(got.to_string(), "1CH4 + 2O2 = 1CO2 + 2H2O");
        assert_eq!(got.solution().status(), Status::Solved);
    }

    #[test]
    fn parse_errors_are_propagated() {
        let got = balance("H2 + O2").unwrap_err();

        assert_eq!(got, Error::Parse(ParseError::MissingEquals));
        assert_eq!(
            got.to_string(),
            "An equation needs a \"=\" between the reactants and products"
        );
    }

    #[test]
    fn overflow_is_an_error() {
        let got = balance("_H9223372036854775807 + _O2 = _H2O").unwrap_err();

        assert_eq!(got, Error::Solve(SolveError::Overflow));
    }
}
