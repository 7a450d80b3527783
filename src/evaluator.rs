//! Tree-walking evaluation of [`Expression`] nodes.
//!
//! Evaluation is synchronous and runs each statement to completion. A failure
//! raised anywhere below the root aborts the whole statement and propagates
//! unchanged; since every environment mutation validates before committing, the
//! bindings made by earlier statements (and by earlier children of the same
//! block) stay in place.

use crate::ast::Expression;
use crate::environment::Environment;
use crate::value::Value;
use crate::{Error, MAX_EVAL_DEPTH};

/// Evaluate an expression against an environment
pub fn eval(expr: &Expression, env: &mut Environment) -> Result<Value, Error> {
    eval_with_depth_tracking(expr, env, 0)
}

/// Evaluate an expression, folding a failure into a [`Value::Error`]
pub fn eval_or_error(expr: &Expression, env: &mut Environment) -> Value {
    eval(expr, env).unwrap_or_else(Value::from)
}

/// Evaluate an expression with depth tracking to prevent stack overflow
fn eval_with_depth_tracking(
    expr: &Expression,
    env: &mut Environment,
    depth: usize,
) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::depth_exceeded());
    }
    log::trace!("eval[{depth}] {expr}");

    match expr {
        Expression::Literal(value) => Ok(value.clone()),

        Expression::Identifier(name) => env.get(name),

        Expression::Declaration {
            name,
            type_name,
            mutable,
        } => {
            let symbol = env.declare(name, type_name, *mutable)?;
            Ok(Value::Symbol(symbol.name))
        }

        Expression::Assignment { name, value } => {
            let value = eval_with_depth_tracking(value, env, depth + 1)?;
            env.assign(name, value)
        }

        // Children share the environment: earlier side effects are visible to later ones
        Expression::Block(children) => {
            let mut result = Value::Null;
            for child in children {
                result = eval_with_depth_tracking(child, env, depth + 1)?;
            }
            Ok(result)
        }

        Expression::Call {
            function,
            arguments,
        } => {
            let args = arguments
                .iter()
                .map(|arg| eval_with_depth_tracking(arg, env, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            let function = env.function(function)?;
            function.invoke(env.console(), args)
        }
    }
}
