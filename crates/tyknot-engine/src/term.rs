//! Type terms
//!
//! A type term is either a type variable or a constructor applied to zero or
//! more argument terms. Terms are written `Map<String, List<a>>`: names
//! starting with an uppercase letter are constructors, names starting with a
//! lowercase letter (or a leading `'`) are variables.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An unbound (universally quantified) type variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVar {
    pub name: String,
}

impl TypeVar {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A possibly polymorphic type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTerm {
    /// Type variable
    Var(TypeVar),
    /// Constructor application; nullary constructors have no arguments
    App { head: String, args: Vec<TypeTerm> },
}

impl TypeTerm {
    /// A nullary constructor such as `Int`
    pub fn con(head: impl Into<String>) -> Self {
        TypeTerm::App {
            head: head.into(),
            args: Vec::new(),
        }
    }

    /// A constructor applied to arguments
    pub fn app(head: impl Into<String>, args: Vec<TypeTerm>) -> Self {
        TypeTerm::App {
            head: head.into(),
            args,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        TypeTerm::Var(TypeVar::new(name))
    }

    /// Parse a term from its textual form
    pub fn parse(source: &str) -> Result<Self, ParseTermError> {
        let mut parser = TermParser::new(source);
        let term = parser.term()?;
        parser.skip_ws();
        match parser.peek() {
            None => Ok(term),
            Some(c) => Err(parser.error(format!("unexpected '{}'", c))),
        }
    }

    /// Head constructor name, if this is an application
    pub fn head(&self) -> Option<&str> {
        match self {
            TypeTerm::App { head, .. } => Some(head),
            TypeTerm::Var(_) => None,
        }
    }

    pub fn args(&self) -> &[TypeTerm] {
        match self {
            TypeTerm::App { args, .. } => args,
            TypeTerm::Var(_) => &[],
        }
    }

    /// True when no variable occurs anywhere in the term
    pub fn is_concrete(&self) -> bool {
        match self {
            TypeTerm::Var(_) => false,
            TypeTerm::App { args, .. } => args.iter().all(TypeTerm::is_concrete),
        }
    }

    /// Whether `var` occurs in this term (no substitution applied)
    pub fn mentions(&self, var: &TypeVar) -> bool {
        match self {
            TypeTerm::Var(v) => v == var,
            TypeTerm::App { args, .. } => args.iter().any(|a| a.mentions(var)),
        }
    }

    /// Free variables in order of first occurrence, without duplicates
    pub fn free_vars(&self) -> Vec<TypeVar> {
        let mut vars = Vec::new();
        self.collect_vars(&mut vars);
        vars
    }

    pub(crate) fn collect_vars(&self, out: &mut Vec<TypeVar>) {
        match self {
            TypeTerm::Var(v) => {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
            TypeTerm::App { args, .. } => {
                for arg in args {
                    arg.collect_vars(out);
                }
            }
        }
    }

    /// Number of constructor nodes
    pub fn size(&self) -> usize {
        match self {
            TypeTerm::Var(_) => 0,
            TypeTerm::App { args, .. } => 1 + args.iter().map(TypeTerm::size).sum::<usize>(),
        }
    }

    /// Rebuild the term with every variable mapped through `f`
    pub fn map_vars(&self, f: &mut impl FnMut(&TypeVar) -> TypeTerm) -> TypeTerm {
        match self {
            TypeTerm::Var(v) => f(v),
            TypeTerm::App { head, args } => TypeTerm::App {
                head: head.clone(),
                args: args.iter().map(|a| a.map_vars(f)).collect(),
            },
        }
    }

    /// Wrap this term as the single argument of `head`
    pub fn wrapped_in(&self, head: &str) -> TypeTerm {
        TypeTerm::app(head, vec![self.clone()])
    }
}

impl fmt::Display for TypeTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTerm::Var(v) => write!(f, "{}", v),
            TypeTerm::App { head, args } if args.is_empty() => f.write_str(head),
            TypeTerm::App { head, args } => {
                write!(f, "{}<", head)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
        }
    }
}

impl FromStr for TypeTerm {
    type Err = ParseTermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTerm::parse(s)
    }
}

/// Error produced by [`TypeTerm::parse`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type term at offset {offset}: {message}")]
pub struct ParseTermError {
    pub offset: usize,
    pub message: String,
}

struct TermParser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> TermParser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn error(&self, message: String) -> ParseTermError {
        ParseTermError {
            offset: self.pos,
            message,
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseTermError> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn ident(&mut self) -> Result<&'a str, ParseTermError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.bump(),
            Some(c) => return Err(self.error(format!("expected a name, found '{}'", c))),
            None => return Err(self.error("expected a name, found end of input".to_string())),
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        Ok(&self.source[start..self.pos])
    }

    fn term(&mut self) -> Result<TypeTerm, ParseTermError> {
        self.skip_ws();

        if self.peek() == Some('\'') {
            self.bump();
            let name = self.ident()?;
            return Ok(TypeTerm::var(name));
        }

        let name = self.ident()?;
        let is_var = name.starts_with(|c: char| c.is_ascii_lowercase());

        self.skip_ws();
        if self.peek() != Some('<') {
            return Ok(if is_var {
                TypeTerm::var(name)
            } else {
                TypeTerm::con(name)
            });
        }

        if is_var {
            return Err(self.error(format!("type variable '{}' cannot take arguments", name)));
        }

        self.bump();
        let mut args = vec![self.term()?];
        loop {
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                    args.push(self.term()?);
                }
                _ => break,
            }
        }
        self.expect('>')?;
        Ok(TypeTerm::app(name, args))
    }
}

/// Parse a term literal, panicking on malformed input
///
/// Intended for rule tables written in source code.
#[macro_export]
macro_rules! ty {
    ($source:expr) => {
        match $crate::term::TypeTerm::parse($source) {
            Ok(term) => term,
            Err(e) => panic!("bad type term {:?}: {}", $source, e),
        }
    };
}
