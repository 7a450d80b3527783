//! Runtime values and class descriptors.
//!
//! [`Value`] is the closed set of data the evaluator produces: null, the four
//! scalar kinds, symbol literals, classes, native functions and error values.
//! Every value knows its [`Class`], and classes are values themselves (of class
//! `Class`, which is its own class).
//!
//! Conversions from common Rust types are provided so that values can be built
//! with `.into()` in code and tests, e.g. `Value::from(3)` or `val("text")`.

use std::fmt;
use std::sync::Arc;

use crate::environment::Console;
use crate::{Error, ErrorKind};

/// Built-in class descriptor.
///
/// The set is closed and registered in every environment in the order of
/// [`Class::BUILTIN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Class {
    Any,
    Class,
    Function,
    Symbol,
    Int,
    Float,
    Bool,
    Str,
    Error,
}

impl Class {
    /// All built-in classes, in registration order
    pub const BUILTIN: [Class; 9] = [
        Class::Any,
        Class::Class,
        Class::Function,
        Class::Symbol,
        Class::Int,
        Class::Float,
        Class::Bool,
        Class::Str,
        Class::Error,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Class::Any => "Any",
            Class::Class => "Class",
            Class::Function => "Function",
            Class::Symbol => "Symbol",
            Class::Int => "Int",
            Class::Float => "Float",
            Class::Bool => "Bool",
            Class::Str => "Str",
            Class::Error => "Error",
        }
    }

    /// Look up a built-in class by its name
    pub fn from_name(name: &str) -> Option<Class> {
        Class::BUILTIN.into_iter().find(|class| class.name() == name)
    }

    /// The class of a class value. `Class` is the fixed point: its own class.
    pub fn class(self) -> Class {
        Class::Class
    }

    /// Whether a value of class `other` may be stored or passed where `self` is declared.
    /// `Any` accepts every class, any other class accepts only itself.
    pub fn accepts(self, other: Class) -> bool {
        self == Class::Any || self == other
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical erased native function type.
///
/// Natives receive the console collaborator of the calling environment and
/// ownership of their already type-checked arguments.
pub type NativeFn = dyn Fn(&mut dyn Console, Vec<Value>) -> Result<Value, Error> + Send + Sync;

/// A named native function with its declared signature.
#[derive(Clone)]
pub struct Function {
    name: String,
    inputs: Vec<Class>,
    output: Class,
    native: Arc<NativeFn>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<Class>,
        output: Class,
        native: Arc<NativeFn>,
    ) -> Self {
        Function {
            name: name.into(),
            inputs,
            output,
            native,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[Class] {
        &self.inputs
    }

    pub fn output(&self) -> Class {
        self.output
    }

    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    /// Signature in the form `(Int, Int) -> Int`
    pub fn signature(&self) -> String {
        format!("{} -> {}", class_list(&self.inputs), self.output)
    }

    /// Check argument count and per-position classes against the declared inputs
    pub fn check_arguments(&self, args: &[Value]) -> Result<(), Error> {
        let matches = args.len() == self.inputs.len()
            && self
                .inputs
                .iter()
                .zip(args)
                .all(|(expected, arg)| expected.accepts(arg.class()));

        if matches {
            Ok(())
        } else {
            let actual: Vec<Class> = args.iter().map(Value::class).collect();
            Err(Error::wrong_arguments(
                self.name.as_str(),
                class_list(&self.inputs),
                class_list(&actual),
            ))
        }
    }

    /// Check the arguments, then run the native implementation
    pub fn invoke(&self, console: &mut dyn Console, args: Vec<Value>) -> Result<Value, Error> {
        self.check_arguments(&args)?;
        log::debug!("calling {}{}", self.name, self.signature());
        (self.native)(console, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({}: {})", self.name, self.signature())
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        // Natives are compared by identity of their declaration, not by pointer
        self.name == other.name && self.inputs == other.inputs && self.output == other.output
    }
}

fn class_list(classes: &[Class]) -> String {
    let names: Vec<&str> = classes.iter().map(|class| class.name()).collect();
    format!("({})", names.join(", "))
}

/// Runtime value
#[derive(Clone)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// Quoted name used as data, e.g. `'x`. Distinct from an identifier reference.
    Symbol(String),
    Class(Class),
    Function(Function),
    /// Failure folded into a value: rendered message and kind
    Error(String, ErrorKind),
}

impl Value {
    /// Class descriptor of this value. `Null` belongs to `Any`.
    pub fn class(&self) -> Class {
        match self {
            Value::Null => Class::Any,
            Value::Int(_) => Class::Int,
            Value::Float(_) => Class::Float,
            Value::Bool(_) => Class::Bool,
            Value::Str(_) => Class::Str,
            Value::Symbol(_) => Class::Symbol,
            Value::Class(class) => class.class(),
            Value::Function(_) => Class::Function,
            Value::Error(..) => Class::Error,
        }
    }

    /// The class this value denotes when used as a type, for class values only
    pub fn as_class(&self) -> Option<Class> {
        match self {
            Value::Class(class) => Some(*class),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x:?})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::Class(class) => write!(f, "Class({class})"),
            Value::Function(function) => write!(f, "{function:?}"),
            Value::Error(message, kind) => write!(f, "Error({kind}, {message:?})"),
        }
    }
}

/// Printable form
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(n) => write!(f, "{n}"),
            // No literal exists for non-finite floats, print the division producing them
            Value::Float(x) if x.is_nan() => write!(f, "fdiv(0.0, 0.0)"),
            Value::Float(x) if x.is_infinite() && *x > 0.0 => write!(f, "fdiv(1.0, 0.0)"),
            Value::Float(x) if x.is_infinite() => write!(f, "fdiv(-1.0, 0.0)"),
            // Debug keeps the fractional part ("3.0") and uses exponent form for large magnitudes
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => {
                write!(f, "\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Value::Symbol(s) => write!(f, "'{s}"),
            Value::Class(class) => write!(f, "Class({class})"),
            Value::Function(function) => {
                write!(f, "Function({}: {})", function.name(), function.signature())
            }
            Value::Error(message, kind) => write!(f, "Error({kind}: {message})"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Error(m1, k1), Value::Error(m2, k2)) => k1 == k2 && m1 == m2,
            _ => false, // Different variants are never equal
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Class> for Value {
    fn from(class: Class) -> Self {
        Value::Class(class)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl From<Error> for Value {
    fn from(err: Error) -> Self {
        Value::Error(err.to_string(), err.kind)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Int(n as i64)
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(i64);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

/// Helper for building values from Rust literals
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper for building symbol literals (`'name`)
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_classes_data_driven() {
        let test_cases = vec![
            (Value::Null, Class::Any),
            (val(42), Class::Int),
            (val(-1.5), Class::Float),
            (val(true), Class::Bool),
            (val("hello"), Class::Str),
            (sym("x"), Class::Symbol),
            (val(Class::Int), Class::Class),
            (val(Class::Class), Class::Class),
            (val(Error::not_defined("x")), Class::Error),
        ];

        for (value, expected) in test_cases {
            assert_eq!(value.class(), expected, "Failed for value: {value:?}");
        }
    }

    #[test]
    fn test_class_is_its_own_class() {
        assert_eq!(Class::Class.class(), Class::Class);
        assert_eq!(val(Class::Class).class(), Class::Class);
        for class in Class::BUILTIN {
            assert_eq!(class.class(), Class::Class);
            assert_eq!(Class::from_name(class.name()), Some(class));
        }
        assert_eq!(Class::from_name("Foo"), None);
    }

    #[test]
    fn test_accepts() {
        assert!(Class::Any.accepts(Class::Int));
        assert!(Class::Any.accepts(Class::Any));
        assert!(Class::Int.accepts(Class::Int));
        assert!(!Class::Int.accepts(Class::Float));
        assert!(!Class::Int.accepts(Class::Any));
    }

    #[test]
    fn test_printable_form_data_driven() {
        let test_cases = vec![
            (Value::Null, "null"),
            (val(3), "3"),
            (val(-12000), "-12000"),
            (val(1.2), "1.2"),
            (val(3.0), "3.0"),
            (val(-1.0), "-1.0"),
            (val(0.01), "0.01"),
            (val(1.0e300), "1e300"),
            (val(f64::INFINITY), "fdiv(1.0, 0.0)"),
            (val(f64::NEG_INFINITY), "fdiv(-1.0, 0.0)"),
            (val(f64::NAN), "fdiv(0.0, 0.0)"),
            (val(true), "true"),
            (val(false), "false"),
            (val("some string"), "\"some string\""),
            (val("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\""),
            (sym("Hello"), "'Hello"),
            (val(Class::Int), "Class(Int)"),
            (
                val(Error::not_defined("x")),
                "Error(NOT_DEFINED: Symbol 'x' is not defined)",
            ),
        ];

        for (value, expected) in test_cases {
            assert_eq!(value.to_string(), expected, "Failed for value: {value:?}");
        }
    }

    #[test]
    fn test_equality_across_variants() {
        assert_eq!(val(1), val(1));
        assert_ne!(val(1), val(1.0));
        assert_ne!(val("x"), sym("x"));
        assert_ne!(Value::Null, val(false));
        assert_eq!(val(Class::Str), Value::Class(Class::Str));
    }

    #[test]
    fn test_function_argument_check() {
        let native: Arc<NativeFn> = Arc::new(|_console, args| Ok(args[0].clone()));
        let identity = Function::new("id", vec![Class::Int], Class::Int, native);

        assert_eq!(identity.signature(), "(Int) -> Int");
        identity.check_arguments(&[val(1)]).unwrap();

        let err = identity.check_arguments(&[val(true)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::WrongArguments);
        assert_eq!(err.args, vec!["id", "(Int)", "(Bool)"]);

        let err = identity.check_arguments(&[val(1), val(2)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::WrongArguments);
    }
}
