use std::iter::Enumerate;

use crate::error::StructureError;

use super::{
    lexer::{Token, TokenIter},
    SExpr,
};

/// Deepest list nesting accepted. KiCad files stay far below this.
pub const MAX_DEPTH: usize = 512;

pub(super) struct Parser<I: Iterator> {
    iter: Enumerate<I>,
    consumed: usize,
}

impl<'a, I: Iterator<Item = Token<'a>>> Parser<I> {
    pub(super) fn new(tokens: I) -> Self {
        Self {
            iter: tokens.enumerate(),
            consumed: 0,
        }
    }

    fn get(&mut self) -> Option<(usize, Token<'a>)> {
        let item = self.iter.next()?;
        self.consumed = item.0 + 1;
        Some(item)
    }

    /// Reads one complete form. Open lists live on an explicit stack of
    /// `(index of the open paren, children so far)`.
    fn parse_node(&mut self) -> Result<SExpr<'a>, StructureError> {
        let mut open_lists: Vec<(usize, Vec<SExpr<'a>>)> = Vec::new();
        loop {
            let node = match self.get() {
                None => {
                    return Err(match open_lists.last() {
                        Some(&(open, _)) => StructureError::UnterminatedList { open },
                        None => StructureError::UnexpectedEnd { at: self.consumed },
                    });
                }
                Some((at, Token::LParen)) => {
                    if open_lists.len() == MAX_DEPTH {
                        return Err(StructureError::TooDeep {
                            at,
                            limit: MAX_DEPTH,
                        });
                    }
                    open_lists.push((at, Vec::new()));
                    continue;
                }
                Some((at, Token::RParen)) => match open_lists.pop() {
                    Some((_, children)) => SExpr::List(children.into_boxed_slice()),
                    None => return Err(StructureError::UnexpectedCloseParen { at }),
                },
                Some((_, Token::Atom(s))) => SExpr::Atom(s),
            };
            match open_lists.last_mut() {
                Some((_, children)) => children.push(node),
                None => return Ok(node),
            }
        }
    }

    /// Parses exactly one root form and rejects anything after it.
    pub(super) fn parse(mut self) -> Result<SExpr<'a>, StructureError> {
        let root = self.parse_node()?;
        match self.get() {
            None => Ok(root),
            Some((at, Token::RParen)) => Err(StructureError::UnexpectedCloseParen { at }),
            Some((at, _)) => {
                let total = at + 1 + self.iter.count();
                Err(StructureError::TrailingTokens { at, total })
            }
        }
    }
}

/// Builds a tree from an already tokenized document.
pub fn parse_tokens(tokens: Vec<Token<'_>>) -> Result<SExpr<'_>, StructureError> {
    Parser::new(tokens.into_iter()).parse()
}

impl<'a> TryFrom<&'a str> for SExpr<'a> {
    type Error = StructureError;

    fn try_from(input: &'a str) -> Result<Self, Self::Error> {
        Parser::new(TokenIter::new(input)).parse()
    }
}
