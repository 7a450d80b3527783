//! Adapters turning typed Rust functions into native [`Function`] bodies.
//!
//! A function such as `fn add(a: i64, b: i64) -> Result<i64, Error>` is
//! registered by naming its parameter tuple, e.g.
//! `env.register_function::<_, (i64, i64)>("add", add)`. The declared
//! signature of the resulting native is derived from the Rust types through
//! the `CLASS` constants of [`FromParam`] and [`IntoValueResult`], so the
//! evaluator's argument check and the Rust conversion always agree.
//!
//! [`Function`]: crate::value::Function

use std::sync::Arc;

use crate::Error;
use crate::environment::Console;
use crate::value::{Class, NativeFn, Value};

/// Conversion of one checked argument into a typed Rust parameter.
///
/// The associated `Param<'a>` is the parameter type as seen by the function
/// for a given lifetime of the argument slot, which lets `&str` borrow from the
/// argument instead of cloning it.
pub trait FromParam {
    /// Class declared for this parameter position
    const CLASS: Class;

    type Param<'a>;

    fn from_arg<'a>(value: &'a mut Value) -> Result<Self::Param<'a>, Error>;
}

fn mismatch(expected: Class, value: &Value) -> Error {
    Error::not_expected_type("argument", expected, value.class())
}

impl FromParam for Value {
    const CLASS: Class = Class::Any;
    type Param<'a> = Value;

    fn from_arg<'a>(value: &'a mut Value) -> Result<Self::Param<'a>, Error> {
        Ok(std::mem::replace(value, Value::Null))
    }
}

impl FromParam for &str {
    const CLASS: Class = Class::Str;
    type Param<'a> = &'a str;

    fn from_arg<'a>(value: &'a mut Value) -> Result<Self::Param<'a>, Error> {
        match value {
            Value::Str(s) => Ok(s.as_str()),
            other => Err(mismatch(Class::Str, other)),
        }
    }
}

macro_rules! impl_from_param_by_value {
    ($ty:ty, $class:expr, $variant:ident) => {
        impl FromParam for $ty {
            const CLASS: Class = $class;
            type Param<'a> = $ty;

            fn from_arg<'a>(value: &'a mut Value) -> Result<Self::Param<'a>, Error> {
                match std::mem::replace(value, Value::Null) {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(mismatch($class, &other)),
                }
            }
        }
    };
}

impl_from_param_by_value!(i64, Class::Int, Int);
impl_from_param_by_value!(f64, Class::Float, Float);
impl_from_param_by_value!(bool, Class::Bool, Bool);
impl_from_param_by_value!(String, Class::Str, Str);
impl_from_param_by_value!(Class, Class::Class, Class);

/// Normalize plain return values and `Result`s into `Result<Value, Error>`.
pub trait IntoValueResult {
    /// Class declared as output of the native
    const CLASS: Class;

    fn into_value_result(self) -> Result<Value, Error>;
}

macro_rules! impl_into_value_result {
    ($ty:ty, $class:expr) => {
        impl IntoValueResult for $ty {
            const CLASS: Class = $class;

            fn into_value_result(self) -> Result<Value, Error> {
                Ok(self.into())
            }
        }
    };
}

impl_into_value_result!(i64, Class::Int);
impl_into_value_result!(f64, Class::Float);
impl_into_value_result!(bool, Class::Bool);
impl_into_value_result!(String, Class::Str);
impl_into_value_result!(Class, Class::Class);
impl_into_value_result!(Value, Class::Any);
impl_into_value_result!((), Class::Any);

impl<T: IntoValueResult> IntoValueResult for Result<T, Error> {
    const CLASS: Class = T::CLASS;

    fn into_value_result(self) -> Result<Value, Error> {
        self.and_then(IntoValueResult::into_value_result)
    }
}

/// Convert a strongly-typed Rust function or closure into a [`NativeFn`],
/// parameterized by its argument tuple type.
pub trait IntoOperation<Args> {
    /// Declared input classes, one per parameter
    fn inputs() -> Vec<Class>;

    /// Declared output class
    fn output() -> Class;

    fn into_operation(self) -> Arc<NativeFn>;
}

fn arity_mismatch(expected: usize, actual: usize) -> Error {
    Error::wrong_arguments(
        "native",
        format!("{expected} arguments"),
        format!("{actual} arguments"),
    )
}

// 0-arg functions / closures
impl<F, R> IntoOperation<()> for F
where
    F: Fn() -> R + Send + Sync + 'static,
    R: IntoValueResult,
{
    fn inputs() -> Vec<Class> {
        Vec::new()
    }

    fn output() -> Class {
        R::CLASS
    }

    fn into_operation(self) -> Arc<NativeFn> {
        Arc::new(move |_console: &mut dyn Console, args: Vec<Value>| {
            if !args.is_empty() {
                return Err(arity_mismatch(0, args.len()));
            }
            (self)().into_value_result()
        })
    }
}

/// Implements `IntoOperation` for one fixed arity.
///
/// The owned argument vector is destructured into local slots so that
/// `FromParam` can either borrow from or consume each argument.
macro_rules! impl_into_operation_for_arity {
    ($arity:expr, $( $v:ident, $p:ident : $A:ident ),+ ) => {
        impl<F, R, $( $A ),+> IntoOperation<( $( $A, )+ )> for F
        where
            F: for<'a> Fn( $( <$A as FromParam>::Param<'a> ),+ ) -> R
                + Send
                + Sync
                + 'static,
            $( $A: FromParam, )+
            R: IntoValueResult,
        {
            fn inputs() -> Vec<Class> {
                vec![ $( <$A as FromParam>::CLASS ),+ ]
            }

            fn output() -> Class {
                R::CLASS
            }

            fn into_operation(self) -> Arc<NativeFn> {
                Arc::new(move |_console: &mut dyn Console, mut args: Vec<Value>| {
                    let len = args.len();
                    match args.as_mut_slice() {
                        [ $( $v ),+ ] => {
                            $(
                                let $p: <$A as FromParam>::Param<'_> =
                                    <$A as FromParam>::from_arg($v)?;
                            )+
                            (self)( $( $p ),+ ).into_value_result()
                        }
                        _ => Err(arity_mismatch($arity, len)),
                    }
                })
            }
        }
    };
}

impl_into_operation_for_arity!(1, v0, p0: A1);
impl_into_operation_for_arity!(2, v0, p0: A1, v1, p1: A2);
impl_into_operation_for_arity!(3, v0, p0: A1, v1, p1: A2, v2, p2: A3);
impl_into_operation_for_arity!(4, v0, p0: A1, v1, p1: A2, v2, p2: A3, v3, p3: A4);
