//! groLang - evaluation core of a small typed expression language
//!
//! This crate provides the tree-walking evaluator of a tiny expression-oriented
//! scripting language: an AST of immutable [`ast::Expression`] nodes, a typed
//! binding [`environment::Environment`] and the rules that turn one into runtime
//! [`value::Value`]s.
//!
//! ```text
//! val x: Int          ; declares x, no value yet
//! x = 3               ; first assignment of an immutable binding
//! var y = 2.5         ; declaration with an inferred type
//! print(str(x))       ; native call, arguments checked against (Any)
//! ```
//!
//! ## Strict bindings
//!
//! Every name goes through a two-step protocol:
//! - A name must be declared (with a class and a mutability flag) before it is assigned
//! - A name is declared at most once per environment
//! - An immutable binding accepts exactly one assignment
//! - An assigned value must be of the declared class (`Any` accepts everything)
//!
//! Failures are values of [`Error`]: a closed [`ErrorKind`] plus the offending
//! names as positional arguments. English text is only produced when an error
//! is displayed, through the [`messages`] catalog.
//!
//! ## Modules
//!
//! - `value`: runtime values and the built-in class descriptors
//! - `ast`: expression nodes and their debug form
//! - `environment`: symbol table, value store and console collaborator
//! - `evaluator`: evaluation of expression nodes against an environment
//! - `builtinops`: built-in classes and functions seeded in every environment
//! - `parser`: statement grammar producing expression nodes (feature `parser`)

use std::fmt;

/// Maximum nesting depth accepted by the statement parser
pub const MAX_PARSE_DEPTH: usize = 32;

/// Maximum evaluation depth for nested blocks, calls and assignments
/// Set higher than parse depth so that every parsed statement can be evaluated
pub const MAX_EVAL_DEPTH: usize = 64;

/// Closed set of failure kinds raised by the parser and the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input text does not match the statement grammar
    SyntaxError,
    /// Input contains a character that cannot start any token
    UnknownToken,
    /// Declared type and initializer type disagree
    TypeError,
    /// Declaration has neither a type annotation nor a typed initializer
    TypeNotInferred,
    /// Name is already declared in this environment
    AlreadyDefined,
    /// Name was never declared
    NotDefined,
    /// Name is declared but holds no value yet
    NotSet,
    /// Immutable binding already holds a value
    NotMutable,
    /// Value class differs from the class required at this position
    NotExpectedType,
    /// Type name is not declared
    UnknownType,
    /// Type name is declared but is not bound to a class
    UnknownClass,
    /// Call arguments do not match the function signature
    WrongArguments,
    /// Integer division or remainder by zero
    DivisionByZero,
    /// Integer arithmetic overflow
    Overflow,
    /// Evaluation nested deeper than [`MAX_EVAL_DEPTH`]
    DepthExceeded,
    /// The console has no more input lines
    ReadFailed,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 16] = [
        ErrorKind::SyntaxError,
        ErrorKind::UnknownToken,
        ErrorKind::TypeError,
        ErrorKind::TypeNotInferred,
        ErrorKind::AlreadyDefined,
        ErrorKind::NotDefined,
        ErrorKind::NotSet,
        ErrorKind::NotMutable,
        ErrorKind::NotExpectedType,
        ErrorKind::UnknownType,
        ErrorKind::UnknownClass,
        ErrorKind::WrongArguments,
        ErrorKind::DivisionByZero,
        ErrorKind::Overflow,
        ErrorKind::DepthExceeded,
        ErrorKind::ReadFailed,
    ];

    /// Stable identifier of the kind, also used as message catalog key
    pub fn id(self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "SYNTAX_ERROR",
            ErrorKind::UnknownToken => "UNKNOWN_TOKEN",
            ErrorKind::TypeError => "TYPE_ERROR",
            ErrorKind::TypeNotInferred => "TYPE_NOT_INFERRED",
            ErrorKind::AlreadyDefined => "ALREADY_DEFINED",
            ErrorKind::NotDefined => "NOT_DEFINED",
            ErrorKind::NotSet => "NOT_SET",
            ErrorKind::NotMutable => "NOT_MUTABLE",
            ErrorKind::NotExpectedType => "NOT_EXPECTED_TYPE",
            ErrorKind::UnknownType => "UNKNOWN_TYPE",
            ErrorKind::UnknownClass => "UNKNOWN_CLASS",
            ErrorKind::WrongArguments => "WRONG_ARGUMENTS",
            ErrorKind::DivisionByZero => "DIVISION_BY_ZERO",
            ErrorKind::Overflow => "OVERFLOW",
            ErrorKind::DepthExceeded => "DEPTH_EXCEEDED",
            ErrorKind::ReadFailed => "READ_FAILED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A typed failure: one kind plus the offending identifiers or type names.
///
/// The arguments are positional and feed the `{0}`, `{1}`, ... placeholders of
/// the message template registered for the kind in [`messages`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", messages::render(.kind, .args))]
pub struct Error {
    pub kind: ErrorKind,
    pub args: Vec<String>,
}

impl Error {
    /// Create an error from a kind and its positional arguments
    pub fn new<I, S>(kind: ErrorKind, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error {
            kind,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, [message])
    }

    pub fn unknown_token(token: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownToken, [token])
    }

    /// Declared type and initializer type of a declaration disagree
    pub fn type_error(declared: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::TypeError,
            [declared.to_string(), actual.to_string()],
        )
    }

    pub fn type_not_inferred(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeNotInferred, [name])
    }

    pub fn already_defined(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyDefined, [name])
    }

    pub fn not_defined(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotDefined, [name])
    }

    pub fn not_set(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotSet, [name])
    }

    pub fn not_mutable(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotMutable, [name])
    }

    /// Value of class `actual` found where `expected` was required for `name`
    pub fn not_expected_type(
        name: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self::new(
            ErrorKind::NotExpectedType,
            [name.into(), expected.to_string(), actual.to_string()],
        )
    }

    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownType, [name])
    }

    pub fn unknown_class(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownClass, [name])
    }

    /// Call of `function` with signature `expected` received argument classes `actual`
    pub fn wrong_arguments(
        function: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::WrongArguments,
            [function.into(), expected.into(), actual.into()],
        )
    }

    pub fn division_by_zero(function: impl Into<String>) -> Self {
        Self::new(ErrorKind::DivisionByZero, [function])
    }

    pub fn overflow(function: impl Into<String>) -> Self {
        Self::new(ErrorKind::Overflow, [function])
    }

    pub fn depth_exceeded() -> Self {
        Self::new(ErrorKind::DepthExceeded, [MAX_EVAL_DEPTH.to_string()])
    }

    pub fn read_failed() -> Self {
        Self::new(ErrorKind::ReadFailed, Vec::<String>::new())
    }
}

pub mod ast;
pub mod builtinops;
pub mod environment;
pub mod evaluator;
pub mod intooperation;
pub mod messages;
pub mod value;

#[cfg(feature = "parser")]
pub mod parser;

/// Parse one statement and evaluate it against `env`.
#[cfg(feature = "parser")]
pub fn run(input: &str, env: &mut environment::Environment) -> Result<value::Value, Error> {
    let statement = parser::parse_statement(input)?;
    evaluator::eval(&statement, env)
}
