use crate::{
    parse::{self, ParseError, Side},
    solve::{Solution, SolveError},
    Atom, Fraction, Matrix, Molecule,
};
use log::{debug, trace};
use nalgebra::{DMatrix, DVector};
use num_integer::Integer;
use num_traits::Zero;
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// A chemical reaction, made up of reactants and products.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    reactants: Vec<Molecule>,
    products: Vec<Molecule>,
    /// Every atom in the equation, in the order it was first seen.
    atoms: Vec<Atom>,
    free_reactants: usize,
    free_products: usize,
}

impl Equation {
    fn new() -> Self {
        Equation {
            reactants: Vec::new(),
            products: Vec::new(),
            atoms: Vec::new(),
            free_reactants: 0,
            free_products: 0,
        }
    }

    pub fn reactants(&self) -> &[Molecule] { &self.reactants }

    pub fn products(&self) -> &[Molecule] { &self.products }

    pub fn atoms(&self) -> &[Atom] { &self.atoms }

    /// The number of reactants whose coefficient needs to be solved for.
    pub fn free_reactants(&self) -> usize { self.free_reactants }

    /// The number of products whose coefficient needs to be solved for.
    pub fn free_products(&self) -> usize { self.free_products }

    pub fn num_unknowns(&self) -> usize {
        self.free_reactants + self.free_products
    }

    fn push(&mut self, molecule: Molecule, side: Side) {
        let (molecules, free) = match side {
            Side::Reactant => (&mut self.reactants, &mut self.free_reactants),
            Side::Product => (&mut self.products, &mut self.free_products),
        };

        if !molecule.is_fixed() {
            *free += 1;
        }
        molecules.push(molecule);
    }

    /// Every molecule along with the sign its atoms contribute to a row of
    /// the stoichiometric matrix.
    fn signed_molecules(&self) -> impl Iterator<Item = (&Molecule, i64)> + '_ {
        self.reactants
            .iter()
            .map(|m| (m, 1))
            .chain(self.products.iter().map(|m| (m, -1)))
    }

    /// Build the augmented matrix for this equation.
    ///
    /// There is one row per atom and one column per unknown coefficient
    /// (free reactants first, then free products), followed by a constant
    /// column holding the contributions of every molecule with a fixed
    /// coefficient. Reactants count positively and products negatively, so a
    /// balanced equation is one where `A·x + constant = 0`.
    pub fn to_matrix(&self) -> Result<Matrix<Fraction>, SolveError> {
        let constant = self.num_unknowns();
        let mut matrix = Matrix::zeroed(self.atoms.clone(), constant + 1);
        let mut next_free_column = 0;

        for (molecule, sign) in self.signed_molecules() {
            let column = if molecule.is_fixed() {
                constant
            } else {
                next_free_column += 1;
                next_free_column - 1
            };

            for (row, atom) in self.atoms.iter().enumerate() {
                let count = Fraction::from(sign * molecule.count_of(atom));
                let cell = &mut matrix[(column, row)];
                *cell = cell.checked_add(count).ok_or(SolveError::Overflow)?;
            }
        }

        Ok(matrix)
    }

    /// The number of each atom (rows) contributed by each molecule (columns),
    /// with products counted negatively.
    pub fn composition(&self) -> DMatrix<i64> {
        let molecules: Vec<_> = self.signed_molecules().collect();

        DMatrix::from_fn(self.atoms.len(), molecules.len(), |row, column| {
            let (molecule, sign) = molecules[column];
            sign * molecule.count_of(&self.atoms[row])
        })
    }

    /// Double-check that a [`Solution`] actually balances every atom.
    ///
    /// The coefficients are scaled up to integers and multiplied through the
    /// [`Equation::composition()`] matrix, which must give zero for every
    /// atom. The solution must also be small enough to be written out.
    pub fn verify(&self, solution: &Solution) -> Result<(), SolveError> {
        let coefficients = match solution {
            Solution::Solved(coefficients) => coefficients,
            _ => return Ok(()),
        };

        if coefficients.len() != self.num_unknowns() {
            return Err(SolveError::InvalidSolution);
        }
        layout(self, coefficients)?;

        let scale = coefficients
            .iter()
            .try_fold(1_i64, |acc, c| {
                let denominator = c.denominator();
                (acc / acc.gcd(&denominator)).checked_mul(denominator)
            })
            .ok_or(SolveError::Overflow)?;
        let mut free = coefficients.iter();

        let weights = self
            .signed_molecules()
            .map(|(molecule, _)| {
                if molecule.is_fixed() {
                    Some(scale)
                } else {
                    free.next()
                        .and_then(|value| value.checked_mul_int(scale))
                        .map(Fraction::numerator)
                }
            })
            .collect::<Option<Vec<i64>>>()
            .ok_or(SolveError::Overflow)?;
        let weights = DVector::from_vec(weights);

        // products of two i64s always fit in an i128
        for (atom, row) in self.atoms.iter().zip(self.composition().row_iter())
        {
            let residual = row
                .iter()
                .zip(weights.iter())
                .try_fold(0_i128, |acc, (&count, &weight)| {
                    acc.checked_add(i128::from(count) * i128::from(weight))
                })
                .ok_or(SolveError::Overflow)?;

            if residual != 0 {
                debug!("There are {} too many {} atoms", residual, atom);
                return Err(SolveError::InvalidSolution);
            }
        }

        Ok(())
    }

    /// Solve for every unknown coefficient.
    pub fn balance(self) -> Result<Balanced, SolveError> {
        let mut matrix = self.to_matrix()?;
        trace!("Augmented matrix:\n{}", matrix);

        matrix.reduce()?;
        trace!("Reduced matrix:\n{}", matrix);

        let solution = matrix.solve()?;
        debug!(
            "The equation is {} ({} unknowns, {} atoms)",
            solution.status(),
            self.num_unknowns(),
            self.atoms.len()
        );

        self.verify(&solution)?;

        Ok(Balanced {
            equation: self,
            solution,
        })
    }
}

impl FromStr for Equation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut equation = Equation::new();

        for term in parse::split_terms(s)? {
            let molecule = Molecule::parse_at(term.text, term.span.start)?;
            equation.push(molecule, term.side);
        }

        generate_atoms(&mut equation.atoms, &equation.reactants);
        generate_atoms(&mut equation.atoms, &equation.products);

        debug!(
            "Parsed {} reactants and {} products containing {:?}",
            equation.reactants.len(),
            equation.products.len(),
            equation.atoms
        );

        Ok(equation)
    }
}

/// Add any atoms we haven't seen before.
fn generate_atoms(atoms: &mut Vec<Atom>, molecules: &[Molecule]) {
    for atom in molecules.iter().flat_map(|m| m.atoms()) {
        if !atoms.contains(&atom) {
            atoms.push(atom);
        }
    }
}

/// An [`Equation`] and the result of trying to balance it.
///
/// The [`Display`] impl writes the balanced equation, or a message explaining
/// why there isn't one.
#[derive(Debug, Clone, PartialEq)]
pub struct Balanced {
    equation: Equation,
    solution: Solution,
}

impl Balanced {
    pub fn equation(&self) -> &Equation { &self.equation }

    pub fn solution(&self) -> &Solution { &self.solution }

    pub fn into_solution(self) -> Solution { self.solution }
}

impl Display for Balanced {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.solution {
            Solution::Solved(coefficients) => {
                let terms = layout(&self.equation, coefficients)
                    .map_err(|_| fmt::Error)?;
                write_side(f, &terms, Side::Reactant)?;
                write!(f, " = ")?;
                write_side(f, &terms, Side::Product)
            },
            Solution::Unsolved => write!(f, "The equation has no solution"),
            Solution::Balanced => {
                write!(f, "The equation is already balanced")
            },
            Solution::Unbalanced => write!(f, "The equation is unbalanced"),
        }
    }
}

/// A molecule as it appears in a solved equation.
struct Term<'a> {
    side: Side,
    molecule: &'a Molecule,
    /// What to write in front of the formula, or `None` to write the
    /// molecule exactly as it was entered.
    coefficient: Option<Fraction>,
}

/// Work out where each molecule goes in the solved equation.
///
/// A molecule with a negative coefficient is moved to the other side and
/// one with a zero coefficient is left out, so the output can be parsed and
/// balanced again.
fn layout<'a>(
    equation: &'a Equation,
    coefficients: &[Fraction],
) -> Result<Vec<Term<'a>>, SolveError> {
    let mut values = coefficients.iter();
    let mut terms = Vec::new();
    let molecules = equation
        .reactants
        .iter()
        .map(|m| (m, Side::Reactant))
        .chain(equation.products.iter().map(|m| (m, Side::Product)));

    for (molecule, side) in molecules {
        if molecule.is_fixed() {
            terms.push(Term {
                side,
                molecule,
                coefficient: None,
            });
            continue;
        }

        let value = values.next().ok_or(SolveError::InvalidSolution)?;
        let total = value
            .checked_mul_int(molecule.coefficient())
            .ok_or(SolveError::Overflow)?;

        if total.is_zero() {
            continue;
        }

        let (side, total) = if total.numerator() < 0 {
            let flipped = total.checked_neg().ok_or(SolveError::Overflow)?;
            (side.opposite(), flipped)
        } else {
            (side, total)
        };

        terms.push(Term {
            side,
            molecule,
            coefficient: Some(total),
        });
    }

    Ok(terms)
}

fn write_side(
    f: &mut Formatter<'_>,
    terms: &[Term<'_>],
    side: Side,
) -> fmt::Result {
    for (i, term) in terms.iter().filter(|t| t.side == side).enumerate() {
        if i > 0 {
            write!(f, " + ")?;
        }

        match term.coefficient {
            Some(coefficient) => {
                write!(f, "{}{}", coefficient, term.molecule.formula())?
            },
            None => write!(f, "{}", term.molecule.source())?,
        }
    }

    Ok(())
}
