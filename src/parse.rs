use std::ops::Range;
use thiserror::Error;

/// Possible errors that may occur while parsing.
///
/// All indices are byte offsets into the full equation text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unexpected character {character:?} at index {index}")]
    InvalidCharacter { character: char, index: usize },
    #[error("The \"(\" at index {index} is never closed")]
    UnclosedParen { index: usize },
    #[error("Unexpected \")\" at index {index}")]
    UnexpectedCloseParen { index: usize },
    #[error("The term at {}..{} doesn't contain any atoms", .span.start, .span.end)]
    MissingFormula { span: Range<usize> },
    #[error("The number at {}..{} is too large", .span.start, .span.end)]
    NumberTooLarge { span: Range<usize> },
    #[error("Expected a term before index {index}")]
    EmptyTerm { index: usize },
    #[error("An equation needs a \"=\" between the reactants and products")]
    MissingEquals,
    #[error("Found a second \"=\" at index {index}")]
    MultipleEquals { index: usize },
}

/// Which side of the equation a molecule ends up on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Side {
    Reactant,
    Product,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Reactant => Side::Product,
            Side::Product => Side::Reactant,
        }
    }
}

/// A single term from an equation, with surrounding whitespace removed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Term<'a> {
    pub(crate) text: &'a str,
    pub(crate) span: Range<usize>,
    pub(crate) side: Side,
}

/// Split an equation into its terms.
///
/// Terms before the `=` are reactants and terms after it are products. A
/// term preceded by `-` is moved to the other side, so `A - B = C` is read as
/// `A = B + C`.
pub(crate) fn split_terms(src: &str) -> Result<Vec<Term<'_>>, ParseError> {
    let mut terms = Vec::new();
    let mut start = 0;
    let mut side = Side::Reactant;
    let mut negated = false;
    let mut seen_equals = false;

    for (index, c) in src.char_indices() {
        if !matches!(c, '+' | '-' | '=') {
            continue;
        }

        terms.push(term(src, start..index, side, negated)?);
        negated = c == '-';

        if c == '=' {
            if seen_equals {
                return Err(ParseError::MultipleEquals { index });
            }
            seen_equals = true;
            side = Side::Product;
        }

        start = index + c.len_utf8();
    }

    if !seen_equals {
        return Err(ParseError::MissingEquals);
    }

    terms.push(term(src, start..src.len(), side, negated)?);

    Ok(terms)
}

fn term(
    src: &str,
    range: Range<usize>,
    side: Side,
    negated: bool,
) -> Result<Term<'_>, ParseError> {
    let raw = &src[range.clone()];
    let text = raw.trim();

    if text.is_empty() {
        return Err(ParseError::EmptyTerm { index: range.end });
    }

    let start = range.start + (raw.len() - raw.trim_start().len());
    let side = if negated { side.opposite() } else { side };

    Ok(Term {
        text,
        span: start..start + text.len(),
        side,
    })
}

/// A cursor over part of the input which remembers where that part started,
/// so errors can point at the right place in the whole equation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Cursor<'a> {
    src: &'a str,
    offset: usize,
    cursor: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(src: &'a str, offset: usize) -> Self {
        Cursor {
            src,
            offset,
            cursor: 0,
        }
    }

    pub(crate) fn rest(&self) -> &'a str { &self.src[self.cursor..] }

    pub(crate) fn peek(&self) -> Option<char> { self.rest().chars().next() }

    /// The absolute index of the next character.
    pub(crate) fn index(&self) -> usize { self.offset + self.cursor }

    pub(crate) fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    pub(crate) fn take_while<P>(
        &mut self,
        mut predicate: P,
    ) -> Option<(&'a str, Range<usize>)>
    where
        P: FnMut(char) -> bool,
    {
        let start = self.cursor;

        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }

            self.advance();
        }

        let end = self.cursor;

        if start != end {
            let text = &self.src[start..end];
            Some((text, self.offset + start..self.offset + end))
        } else {
            None
        }
    }

    /// Consume a run of digits, if there is one.
    ///
    /// A literal `0` is treated the same as a missing number.
    pub(crate) fn chomp_integer(&mut self) -> Result<Option<i64>, ParseError> {
        match self.take_while(|c| c.is_ascii_digit()) {
            Some((text, span)) => {
                let value: i64 = text
                    .parse()
                    .map_err(|_| ParseError::NumberTooLarge { span })?;
                Ok(Some(value).filter(|value| *value != 0))
            },
            None => Ok(None),
        }
    }
}


#[cfg(test)]
mod splitter_tests {
    use super::*;

    macro_rules! split_test {
        ($name:ident, $src:expr, [$( ($text:expr, $side:ident) ),* $(,)?]) => {
            #[test]
            fn $name() {
                let got: Vec<_> = split_terms($src)
                    .unwrap()
                    .into_iter()
                    .map(|term| {
                        assert_eq!(&$src[term.span.clone()], term.text);
                        (term.text, term.side)
                    })
                    .collect();

                let should_be: Vec<(&str, Side)> =
                    vec![$( ($text, Side::$side) ),*];
                assert_eq!(got, should_be);
            }
        };
    }

    macro_rules! split_error_test {
        ($name:ident, $src:expr, $should_be:expr) => {
            #[test]
            fn $name() {
                let got = split_terms($src).unwrap_err();

                assert_eq!(got, $should_be);
            }
        };
    }

    split_test!(
        simple_equation,
        "H2 + O2 = H2O",
        [("H2", Reactant), ("O2", Reactant), ("H2O", Product)]
    );
    split_test!(
        no_whitespace,
        "_H2+_O2=_H2O",
        [("_H2", Reactant), ("_O2", Reactant), ("_H2O", Product)]
    );
    split_test!(
        subtraction_on_the_left_moves_to_the_right,
        "A - B = C",
        [("A", Reactant), ("B", Product), ("C", Product)]
    );
    split_test!(
        subtraction_on_the_right_moves_to_the_left,
        "A = B - C",
        [("A", Reactant), ("B", Product), ("C", Reactant)]
    );
    split_test!(
        addition_after_subtraction_resets_the_side,
        "A - B + C = D - E - F + G",
        [
            ("A", Reactant),
            ("B", Product),
            ("C", Reactant),
            ("D", Product),
            ("E", Reactant),
            ("F", Reactant),
            ("G", Product),
        ]
    );

    split_error_test!(missing_equals, "H2 + O2", ParseError::MissingEquals);
    split_error_test!(
        second_equals,
        "H2 = O2 = H2O",
        ParseError::MultipleEquals { index: 8 }
    );
    split_error_test!(
        nothing_on_the_left,
        " = H2O",
        ParseError::EmptyTerm { index: 1 }
    );
    split_error_test!(
        nothing_on_the_right,
        "H2 = ",
        ParseError::EmptyTerm { index: 5 }
    );
    split_error_test!(
        doubled_operator,
        "H2 + + O2 = H2O",
        ParseError::EmptyTerm { index: 5 }
    );
}
