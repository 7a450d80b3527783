//! Expression nodes of the language.
//!
//! An [`Expression`] is an immutable instruction built by the parser (or by
//! hand with the helpers [`lit`], [`ident`], [`declare`], [`assign`], [`block`]
//! and [`call`]). Nodes carry only the data needed to evaluate them and hold no
//! reference to an environment, so one tree can be evaluated many times.
//!
//! Every node renders to a debug form mirroring a prefix-call syntax:
//!
//! ```text
//! val x: Int         =>  declare('x,'Int,false)
//! x = 3              =>  assign('x, 3)
//! print(a, 1, true)  =>  print('a,1,true)
//! { x; y }           =>  {'x; 'y}
//! ```

use std::fmt;

use crate::Error;
use crate::environment::Environment;
use crate::value::{Class, Value};

/// Check if a string is a valid identifier.
/// Valid: non-empty, first char alphabetic or `_`, then alphanumerics and `_`
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant value, evaluates to itself
    Literal(Value),
    /// Reference to a declared name
    Identifier(String),
    /// Introduces `name` with the class bound to `type_name`
    Declaration {
        name: String,
        type_name: String,
        mutable: bool,
    },
    /// Evaluates `value` and binds it to `name`
    Assignment { name: String, value: Box<Expression> },
    /// Sequence evaluated in one shared environment
    Block(Vec<Expression>),
    /// Native function call
    Call {
        function: String,
        arguments: Vec<Expression>,
    },
}

impl Expression {
    /// Evaluate this node against `env`
    pub fn eval(&self, env: &mut Environment) -> Result<Value, Error> {
        crate::evaluator::eval(self, env)
    }

    /// Class this node is known to produce without evaluating it.
    ///
    /// Literals know their class (except `null`), assignments and blocks
    /// propagate the class of their value and last child. References and calls
    /// depend on the environment and have no static class.
    pub fn static_class(&self) -> Option<Class> {
        match self {
            Expression::Literal(Value::Null) => None,
            Expression::Literal(value) => Some(value.class()),
            Expression::Assignment { value, .. } => value.static_class(),
            Expression::Block(children) => children.last().and_then(Expression::static_class),
            Expression::Identifier(_)
            | Expression::Declaration { .. }
            | Expression::Call { .. } => None,
        }
    }

    /// Prefix-call debug form of the node
    pub fn debug_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{value}"),
            Expression::Identifier(name) => write!(f, "'{name}"),
            Expression::Declaration {
                name,
                type_name,
                mutable,
            } => write!(f, "declare('{name},'{type_name},{mutable})"),
            Expression::Assignment { name, value } => write!(f, "assign('{name}, {value})"),
            Expression::Block(children) => {
                write!(f, "{{")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, "}}")
            }
            Expression::Call {
                function,
                arguments,
            } => {
                write!(f, "{function}(")?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Literal(value)
    }
}

/// Helper for building literal nodes from Rust values
pub fn lit<T: Into<Value>>(value: T) -> Expression {
    Expression::Literal(value.into())
}

/// Helper for building identifier references
pub fn ident<S: AsRef<str>>(name: S) -> Expression {
    Expression::Identifier(name.as_ref().to_owned())
}

/// Helper for building declarations
pub fn declare<S: AsRef<str>, T: AsRef<str>>(name: S, type_name: T, mutable: bool) -> Expression {
    Expression::Declaration {
        name: name.as_ref().to_owned(),
        type_name: type_name.as_ref().to_owned(),
        mutable,
    }
}

/// Helper for building assignments
pub fn assign<S: AsRef<str>>(name: S, value: Expression) -> Expression {
    Expression::Assignment {
        name: name.as_ref().to_owned(),
        value: Box::new(value),
    }
}

/// Helper for building blocks
pub fn block(children: Vec<Expression>) -> Expression {
    Expression::Block(children)
}

/// Helper for building calls
pub fn call<S: AsRef<str>>(function: S, arguments: Vec<Expression>) -> Expression {
    Expression::Call {
        function: function.as_ref().to_owned(),
        arguments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::sym;

    #[test]
    fn test_debug_form_data_driven() {
        let test_cases = vec![
            (lit(3), "3"),
            (lit(1.5), "1.5"),
            (lit("hi"), "\"hi\""),
            (lit(sym("Hello")), "'Hello"),
            (lit(Value::Null), "null"),
            (ident("x"), "'x"),
            (declare("x", "Int", false), "declare('x,'Int,false)"),
            (declare("y", "Any", true), "declare('y,'Any,true)"),
            (assign("x", lit(3)), "assign('x, 3)"),
            (
                call("print", vec![ident("a"), lit(1), lit(true)]),
                "print('a,1,true)",
            ),
            (call("read", vec![]), "read()"),
            (
                block(vec![declare("x", "Int", false), assign("x", lit(3))]),
                "{declare('x,'Int,false); assign('x, 3)}",
            ),
            (block(vec![]), "{}"),
        ];

        for (expr, expected) in test_cases {
            assert_eq!(expr.debug_string(), expected, "Failed for node: {expr:?}");
        }
    }

    #[test]
    fn test_static_class_data_driven() {
        let test_cases = vec![
            (lit(3), Some(Class::Int)),
            (lit(true), Some(Class::Bool)),
            (lit(sym("s")), Some(Class::Symbol)),
            (lit(Class::Int), Some(Class::Class)),
            (lit(Value::Null), None),
            (ident("x"), None),
            (call("add", vec![lit(1), lit(2)]), None),
            (declare("x", "Int", false), None),
            (assign("x", lit("s")), Some(Class::Str)),
            (assign("x", ident("y")), None),
            (block(vec![lit(1), lit(2.5)]), Some(Class::Float)),
            (block(vec![lit(1), ident("y")]), None),
            (block(vec![]), None),
        ];

        for (expr, expected) in test_cases {
            assert_eq!(expr.static_class(), expected, "Failed for node: {expr}");
        }
    }

    #[test]
    fn test_is_valid_identifier() {
        for name in ["x", "_x", "snake_case", "camelCase", "x1", "Int"] {
            assert!(is_valid_identifier(name), "{name} should be valid");
        }
        for name in ["", "1x", "a-b", "a b", "'x", "x!"] {
            assert!(!is_valid_identifier(name), "{name} should be invalid");
        }
    }
}
