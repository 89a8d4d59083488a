use std::borrow::Cow;

use logos::{Lexer, Logos};

/// A lexical unit of an S-expression document.
///
/// Quoted strings and bare symbols both become [`Token::Atom`]; a quoted `"("`
/// is an atom, never a paren.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    LParen,
    RParen,
    Atom(Cow<'a, str>),
}

pub(super) struct TokenIter<'a> {
    lexer: Lexer<'a, LogosTokenKind<'a>>,
}

impl<'a> TokenIter<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            lexer: LogosTokenKind::lexer(input),
        }
    }
}

impl<'a> Iterator for TokenIter<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = match self.lexer.next()? {
            Ok(LogosTokenKind::LParen) => Token::LParen,
            Ok(LogosTokenKind::RParen) => Token::RParen,
            Ok(LogosTokenKind::QuotedString(s)) => Token::Atom(s),
            Ok(LogosTokenKind::Symbol(s)) => Token::Atom(Cow::Borrowed(s)),
            // Every character is covered by some rule, but keep whatever was
            // matched rather than failing.
            Err(()) => Token::Atom(Cow::Borrowed(self.lexer.slice())),
        };
        Some(token)
    }
}

/// Splits `input` into tokens. Never fails; structure is checked by the parser.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    TokenIter::new(input).collect()
}

#[derive(Logos, Clone, Debug, PartialEq, Eq)]
#[logos(skip r"\s+")]
enum LogosTokenKind<'a> {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("\"", quoted_string)]
    QuotedString(Cow<'a, str>),
    #[regex(r#"[^"()\s][^()\s]*"#, |lex| lex.slice())]
    Symbol(&'a str),
}

/// Consumes the body of a quoted string after its opening quote.
///
/// A backslash copies the next character literally; there are no named
/// escapes. A string still open at end of input ends there.
fn quoted_string<'a>(lex: &mut Lexer<'a, LogosTokenKind<'a>>) -> Cow<'a, str> {
    let rest = lex.remainder();
    let mut unescaped: Option<String> = None;
    let mut start = 0;
    let mut chars = rest.char_indices();

    let (end, consumed) = loop {
        match chars.next() {
            Some((i, '"')) => break (i, i + 1),
            Some((i, '\\')) => {
                if let Some((j, c)) = chars.next() {
                    let buf = unescaped.get_or_insert_with(String::new);
                    buf.push_str(&rest[start..i]);
                    buf.push(c);
                    start = j + c.len_utf8();
                }
            }
            Some(_) => {}
            None => {
                tracing::warn!(
                    offset = lex.span().start,
                    "quoted string is not terminated before end of input"
                );
                break (rest.len(), rest.len());
            }
        }
    };
    lex.bump(consumed);

    match unescaped {
        None => Cow::Borrowed(&rest[..end]),
        Some(mut buf) => {
            buf.push_str(&rest[start..end]);
            Cow::Owned(buf)
        }
    }
}
