use std::{borrow::Cow, fmt::Display};

mod lexer;
mod parser;

pub use lexer::{tokenize, Token};
pub use parser::{parse_tokens, MAX_DEPTH};

use crate::error::StructureError;

/// A generic S-expression tree with no knowledge of any schema.
///
/// Atoms borrow from the input unless escapes had to be resolved.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SExpr<'a> {
    Atom(Cow<'a, str>),
    List(Box<[SExpr<'a>]>),
}

impl<'a> Display for SExpr<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SExpr::List(children) => {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            SExpr::Atom(s) if needs_quotes(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        write!(f, "\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "\"")
            }
            SExpr::Atom(s) => write!(f, "{}", s),
        }
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"'))
}

impl<'a> SExpr<'a> {
    pub fn parse(input: &'a str) -> Result<Self, StructureError> {
        SExpr::try_from(input)
    }

    pub fn atom(s: impl Into<Cow<'a, str>>) -> Self {
        SExpr::Atom(s.into())
    }

    pub fn list(children: impl IntoIterator<Item = SExpr<'a>>) -> Self {
        SExpr::List(children.into_iter().collect())
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExpr::Atom(s) => Some(&**s),
            SExpr::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExpr<'a>]> {
        match self {
            SExpr::Atom(_) => None,
            SExpr::List(children) => Some(children),
        }
    }

    /// The leading atom of a non-empty list, e.g. `net` for `(net 1 "GND")`.
    pub fn tag(&self) -> Option<&str> {
        self.as_list()?.first()?.as_atom()
    }

    pub fn is_tagged(&self, label: &str) -> bool {
        self.tag() == Some(label)
    }

    /// Everything after the first element of a list. Empty for atoms.
    pub fn args(&self) -> &[SExpr<'a>] {
        match self.as_list() {
            Some([_, rest @ ..]) => rest,
            _ => &[],
        }
    }

    /// The `n`th argument after the tag, if it is an atom.
    pub fn atom_arg(&self, n: usize) -> Option<&str> {
        self.args().get(n)?.as_atom()
    }

    /// A list of exactly two atoms, such as `(ref "U1")`.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match self.as_list()? {
            [SExpr::Atom(key), SExpr::Atom(value)] => Some((&**key, &**value)),
            _ => None,
        }
    }

    /// Arguments that are lists tagged with `label`.
    pub fn children<'b, 'c>(&'b self, label: &'c str) -> LabeledChildIterator<'a, 'b, 'c> {
        LabeledChildIterator {
            iter: self.args().iter(),
            label,
        }
    }

    pub fn into_owned(self) -> SExpr<'static> {
        match self {
            SExpr::Atom(s) => SExpr::Atom(Cow::Owned(s.into_owned())),
            SExpr::List(children) => SExpr::List(
                children
                    .into_vec()
                    .into_iter()
                    .map(SExpr::into_owned)
                    .collect(),
            ),
        }
    }
}

#[derive(Debug)]
pub struct LabeledChildIterator<'a, 'b, 'c> {
    iter: std::slice::Iter<'b, SExpr<'a>>,
    label: &'c str,
}

impl<'a, 'b, 'c> Iterator for LabeledChildIterator<'a, 'b, 'c> {
    type Item = &'b SExpr<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let label = self.label;
        self.iter.find(|child| child.is_tagged(label))
    }
}

impl<'a> TryFrom<&'a String> for SExpr<'a> {
    type Error = StructureError;

    fn try_from(input: &'a String) -> Result<Self, Self::Error> {
        SExpr::try_from(input.as_str())
    }
}
