//! Parsing a single chemical formula into its constituent atoms.

use crate::parse::{Cursor, ParseError};
use arrayvec::ArrayString;
use smol_str::SmolStr;
use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

/// The prefix which marks a molecule whose coefficient should be solved for.
pub const UNKNOWN_MARKER: char = '_';

/// An element symbol, an uppercase letter optionally followed by a lowercase
/// one.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(ArrayString<2>);

impl Atom {
    /// Create an [`Atom`] from its symbol, returning `None` if it isn't
    /// shaped like an element symbol (e.g. `"H"` or `"Fe"`).
    pub fn new(symbol: &str) -> Option<Atom> {
        let mut chars = symbol.chars();
        let first = chars.next().filter(char::is_ascii_uppercase)?;
        let second = chars.next();

        if chars.next().is_some() {
            return None;
        }

        match second {
            Some(c) if !c.is_ascii_lowercase() => None,
            _ => Some(Atom::from_parts(first, second)),
        }
    }

    fn from_parts(first: char, second: Option<char>) -> Atom {
        let mut symbol = ArrayString::new();
        symbol.push(first);
        if let Some(second) = second {
            symbol.push(second);
        }

        Atom(symbol)
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl Debug for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self.as_str(), f)
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for Atom {
    fn eq(&self, other: &str) -> bool { self.as_str() == other }
}

impl PartialEq<&str> for Atom {
    fn eq(&self, other: &&str) -> bool { self.as_str() == *other }
}

/// A molecule parsed from something like `2H2O` or `_Fe2(SO4)3`.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    /// The term exactly as it was written.
    source: SmolStr,
    /// The formula without the unknown marker or leading coefficient.
    formula: SmolStr,
    /// How many of each atom the molecule contains (already multiplied by
    /// the coefficient), in the order they were first seen.
    atoms: Vec<(Atom, i64)>,
    coefficient: i64,
    fixed: bool,
}

impl Molecule {
    /// Parse a molecule which starts at `offset` within some larger piece of
    /// text.
    pub(crate) fn parse_at(
        src: &str,
        offset: usize,
    ) -> Result<Molecule, ParseError> {
        FormulaParser::new(src, offset).parse()
    }

    pub fn source(&self) -> &str { &self.source }

    pub fn formula(&self) -> &str { &self.formula }

    pub fn coefficient(&self) -> i64 { self.coefficient }

    /// Does this molecule have a known coefficient?
    pub fn is_fixed(&self) -> bool { self.fixed }

    /// The distinct atoms in this molecule, in the order they first appear.
    pub fn atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.atoms.iter().map(|(atom, _)| *atom)
    }

    pub fn num_atoms(&self) -> usize { self.atoms.len() }

    /// How many of a particular atom are in this molecule (including the
    /// coefficient), or `0` if it doesn't contain that atom.
    pub fn count_of(&self, atom: &Atom) -> i64 {
        self.atoms
            .iter()
            .find(|(candidate, _)| candidate == atom)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

impl FromStr for Molecule {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Molecule::parse_at(s, 0) }
}

impl Display for Molecule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A single-pass parser for chemical formulas.
///
/// The grammar:
///
/// ```text
/// molecule  := "_"? NUMBER? item+
/// item      := ATOM NUMBER?
///            | "(" item+ ")" NUMBER?
/// ```
///
/// Instead of recursing into a group, the multiplier written after its
/// closing paren is looked up when the group is opened and pushed onto a
/// stack, so atoms can be accumulated as soon as they are seen.
struct FormulaParser<'a> {
    src: &'a str,
    offset: usize,
    cursor: Cursor<'a>,
    multipliers: Vec<i64>,
    atoms: Vec<(Atom, i64)>,
}

impl<'a> FormulaParser<'a> {
    fn new(src: &'a str, offset: usize) -> Self {
        FormulaParser {
            src,
            offset,
            cursor: Cursor::new(src, offset),
            multipliers: Vec::new(),
            atoms: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<Molecule, ParseError> {
        let fixed = if self.cursor.peek() == Some(UNKNOWN_MARKER) {
            self.cursor.advance();
            false
        } else {
            true
        };
        let coefficient = self.cursor.chomp_integer()?.unwrap_or(1);
        let formula = self.cursor.rest();
        self.multipliers.push(coefficient);

        while let Some(c) = self.cursor.peek() {
            match c {
                'A'..='Z' => self.atom()?,
                '(' => self.open_group()?,
                ')' => self.close_group()?,
                other => {
                    return Err(ParseError::InvalidCharacter {
                        character: other,
                        index: self.cursor.index(),
                    })
                },
            }
        }

        if self.atoms.is_empty() {
            return Err(ParseError::MissingFormula {
                span: self.offset..self.offset + self.src.len(),
            });
        }

        Ok(Molecule {
            source: self.src.into(),
            formula: formula.into(),
            atoms: self.atoms,
            coefficient,
            fixed,
        })
    }

    fn multiplier(&self) -> i64 {
        *self
            .multipliers
            .last()
            .expect("The coefficient is never popped")
    }

    fn atom(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.index();
        let first = self
            .cursor
            .advance()
            .expect("Only called when an uppercase letter is next");

        let second = match self.cursor.peek() {
            Some(c) if c.is_ascii_lowercase() => self.cursor.advance(),
            _ => None,
        };
        let atom = Atom::from_parts(first, second);

        let count = self.cursor.chomp_integer()?.unwrap_or(1);
        let span = start..self.cursor.index();
        let total = count
            .checked_mul(self.multiplier())
            .ok_or_else(|| ParseError::NumberTooLarge { span: span.clone() })?;

        match self.atoms.iter_mut().find(|(existing, _)| *existing == atom) {
            Some((_, existing)) => {
                *existing = existing
                    .checked_add(total)
                    .ok_or(ParseError::NumberTooLarge { span })?;
            },
            None => self.atoms.push((atom, total)),
        }

        Ok(())
    }

    fn open_group(&mut self) -> Result<(), ParseError> {
        let index = self.cursor.index();
        self.cursor.advance();

        let after_group = matching_paren(self.cursor.rest())
            .ok_or(ParseError::UnclosedParen { index })?;

        // read the multiplier without moving our own cursor
        let rest = self.cursor.rest();
        let mut lookahead = Cursor::new(
            &rest[after_group..],
            self.cursor.index() + after_group,
        );
        let span_start = lookahead.index();
        let multiplier = lookahead.chomp_integer()?.unwrap_or(1);

        let multiplier =
            self.multiplier().checked_mul(multiplier).ok_or_else(|| {
                ParseError::NumberTooLarge {
                    span: span_start..lookahead.index(),
                }
            })?;
        self.multipliers.push(multiplier);

        Ok(())
    }

    fn close_group(&mut self) -> Result<(), ParseError> {
        let index = self.cursor.index();
        self.cursor.advance();

        if self.multipliers.len() <= 1 {
            return Err(ParseError::UnexpectedCloseParen { index });
        }
        self.multipliers.pop();

        // the group's multiplier was already applied when it was opened
        let _ = self.cursor.chomp_integer()?;

        Ok(())
    }
}

/// Given the text immediately after a `(`, find the index just past its
/// matching `)`.
fn matching_paren(src: &str) -> Option<usize> {
    let mut depth = 1_usize;

    for (i, c) in src.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            },
            _ => {},
        }
    }

    None
}
