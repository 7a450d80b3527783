//! Built-in classes and functions seeded into every environment.
//!
//! The registry is built once, in a fixed order: first every built-in
//! [`Class`] (bound under its own name, declared of class `Class`), then the
//! native functions, whose signatures only reference classes registered
//! before them.
//!
//! ```text
//! print(str(typeOf(1)))    ; writes "Class(Int)"
//! add(1, 2)                ; 3
//! div(1, 0)                ; DIVISION_BY_ZERO
//! eq('a, "a")              ; false, symbols and strings never compare equal
//! lt(1, 2)                 ; true, ordering is defined on Int only
//! ```
//!
//! ## Strictness
//!
//! - **No coercion**: `add` takes two `Int`s, `fadd` two `Float`s, nothing is widened
//! - **Overflow detection**: integer arithmetic reports `OVERFLOW` instead of wrapping
//! - **Arity checking**: every native has a fixed signature checked before the call
//!
//! ## Adding New Operations
//!
//! 1. Implement the function with typed parameters (`i64`, `f64`, `bool`, `&str`,
//!    `String`, `Value`, `Class`) and a plain or `Result<_, Error>` return type
//! 2. Add it to `BUILTIN_OPS` through `native::<(Args,), _>(name, f)`
//! 3. Add test cases to `test_builtin_function_implementations`

use std::sync::{Arc, LazyLock};

use crate::Error;
use crate::environment::Console;
use crate::intooperation::IntoOperation;
use crate::value::{Class, Function, NativeFn, Value};

/// Implementation of a built-in binding
#[derive(Debug, Clone, PartialEq)]
pub enum OpKind {
    /// A class descriptor, bound to itself
    Class(Class),
    /// A native function
    Function(Function),
}

/// Definition of a built-in binding
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinOp {
    /// The name the binding is declared under
    pub id: &'static str,
    pub op_kind: OpKind,
}

impl BuiltinOp {
    /// Class the binding is declared with
    pub fn declared_class(&self) -> Class {
        match self.op_kind {
            OpKind::Class(_) => Class::Class,
            OpKind::Function(_) => Class::Function,
        }
    }

    /// Value the binding holds
    pub fn value(&self) -> Value {
        match &self.op_kind {
            OpKind::Class(class) => Value::Class(*class),
            OpKind::Function(function) => Value::Function(function.clone()),
        }
    }
}

macro_rules! int_arithmetic {
    ($name:ident, $checked:ident, $id:expr) => {
        fn $name(a: i64, b: i64) -> Result<i64, Error> {
            a.$checked(b).ok_or_else(|| Error::overflow($id))
        }
    };
}

int_arithmetic!(builtin_add, checked_add, "add");
int_arithmetic!(builtin_sub, checked_sub, "sub");
int_arithmetic!(builtin_mul, checked_mul, "mul");

fn builtin_div(a: i64, b: i64) -> Result<i64, Error> {
    if b == 0 {
        return Err(Error::division_by_zero("div"));
    }
    // i64::MIN / -1 is the only remaining overflow
    a.checked_div(b).ok_or_else(|| Error::overflow("div"))
}

fn builtin_mod(a: i64, b: i64) -> Result<i64, Error> {
    if b == 0 {
        return Err(Error::division_by_zero("mod"));
    }
    a.checked_rem(b).ok_or_else(|| Error::overflow("mod"))
}

fn builtin_fadd(a: f64, b: f64) -> f64 {
    a + b
}

fn builtin_fsub(a: f64, b: f64) -> f64 {
    a - b
}

fn builtin_fmul(a: f64, b: f64) -> f64 {
    a * b
}

fn builtin_fdiv(a: f64, b: f64) -> f64 {
    a / b
}

fn builtin_and(a: bool, b: bool) -> bool {
    a && b
}

fn builtin_or(a: bool, b: bool) -> bool {
    a || b
}

fn builtin_not(b: bool) -> bool {
    !b
}

fn builtin_eq(first: Value, second: Value) -> bool {
    first == second
}

fn builtin_neq(first: Value, second: Value) -> bool {
    first != second
}

macro_rules! int_comparison {
    ($name:ident, $op:tt) => {
        fn $name(a: i64, b: i64) -> bool {
            a $op b
        }
    };
}

int_comparison!(builtin_lt, <);
int_comparison!(builtin_le, <=);
int_comparison!(builtin_gt, >);
int_comparison!(builtin_ge, >=);

fn builtin_concat(a: &str, b: &str) -> String {
    format!("{a}{b}")
}

fn builtin_type_of(value: Value) -> Class {
    value.class()
}

fn builtin_str(value: Value) -> String {
    value.to_string()
}

fn builtin_print(console: &mut dyn Console, args: Vec<Value>) -> Result<Value, Error> {
    for arg in &args {
        console.write_line(&arg.to_string());
    }
    Ok(Value::Null)
}

fn builtin_read(console: &mut dyn Console, _args: Vec<Value>) -> Result<Value, Error> {
    console
        .read_line()
        .map(Value::Str)
        .ok_or_else(Error::read_failed)
}

/// Build a native from a typed Rust function, deriving its signature
fn native<Args, F>(id: &'static str, f: F) -> BuiltinOp
where
    F: IntoOperation<Args>,
{
    let function = Function::new(id, F::inputs(), F::output(), f.into_operation());
    BuiltinOp {
        id,
        op_kind: OpKind::Function(function),
    }
}

/// Build a native that talks to the console, with an explicit signature
fn console_native(
    id: &'static str,
    inputs: Vec<Class>,
    output: Class,
    f: fn(&mut dyn Console, Vec<Value>) -> Result<Value, Error>,
) -> BuiltinOp {
    let native: Arc<NativeFn> = Arc::new(f);
    BuiltinOp {
        id,
        op_kind: OpKind::Function(Function::new(id, inputs, output, native)),
    }
}

/// Ordered registry of all built-in bindings: classes first, then functions.
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    let classes = Class::BUILTIN.into_iter().map(|class| BuiltinOp {
        id: class.name(),
        op_kind: OpKind::Class(class),
    });

    let functions = vec![
        // Console
        console_native("print", vec![Class::Any], Class::Any, builtin_print),
        console_native("read", vec![], Class::Str, builtin_read),
        // Reflection
        native::<(Value,), _>("typeOf", builtin_type_of),
        native::<(Value,), _>("str", builtin_str),
        // Integer arithmetic
        native::<(i64, i64), _>("add", builtin_add),
        native::<(i64, i64), _>("sub", builtin_sub),
        native::<(i64, i64), _>("mul", builtin_mul),
        native::<(i64, i64), _>("div", builtin_div),
        native::<(i64, i64), _>("mod", builtin_mod),
        // Float arithmetic
        native::<(f64, f64), _>("fadd", builtin_fadd),
        native::<(f64, f64), _>("fsub", builtin_fsub),
        native::<(f64, f64), _>("fmul", builtin_fmul),
        native::<(f64, f64), _>("fdiv", builtin_fdiv),
        // Logic
        native::<(bool, bool), _>("and", builtin_and),
        native::<(bool, bool), _>("or", builtin_or),
        native::<(bool,), _>("not", builtin_not),
        // Comparison
        native::<(Value, Value), _>("eq", builtin_eq),
        native::<(Value, Value), _>("neq", builtin_neq),
        native::<(i64, i64), _>("lt", builtin_lt),
        native::<(i64, i64), _>("le", builtin_le),
        native::<(i64, i64), _>("gt", builtin_gt),
        native::<(i64, i64), _>("ge", builtin_ge),
        // Strings
        native::<(&str, &str), _>("concat", builtin_concat),
    ];

    classes.chain(functions).collect()
});

/// All built-in bindings in registration order
pub fn get_builtin_ops() -> &'static [BuiltinOp] {
    &BUILTIN_OPS
}

/// Find a built-in binding by name
pub fn find_builtin_op(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_OPS.iter().find(|op| op.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::environment::tests::ScriptedConsole;
    use crate::value::{sym, val};

    fn call_builtin_with(
        console: &mut dyn Console,
        name: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match &find_builtin_op(name).unwrap().op_kind {
            OpKind::Function(function) => function.invoke(console, args.to_vec()),
            OpKind::Class(_) => panic!("expected function builtin in tests, got class: {name}"),
        }
    }

    fn call_builtin(name: &str, args: &[Value]) -> Result<Value, Error> {
        call_builtin_with(&mut ScriptedConsole::default(), name, args)
    }

    #[test]
    fn test_registry_order_and_lookup() {
        let ops = get_builtin_ops();

        // Every class precedes every function
        let first_function = ops
            .iter()
            .position(|op| matches!(op.op_kind, OpKind::Function(_)))
            .unwrap();
        assert_eq!(first_function, Class::BUILTIN.len());
        assert!(
            ops[first_function..]
                .iter()
                .all(|op| matches!(op.op_kind, OpKind::Function(_)))
        );

        let int_op = find_builtin_op("Int").unwrap();
        assert_eq!(int_op.op_kind, OpKind::Class(Class::Int));
        assert_eq!(int_op.declared_class(), Class::Class);
        assert_eq!(int_op.value(), val(Class::Int));

        let add_op = find_builtin_op("add").unwrap();
        assert_eq!(add_op.declared_class(), Class::Function);
        assert!(find_builtin_op("unknown").is_none());

        // Names are unique
        let mut ids: Vec<_> = ops.iter().map(|op| op.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ops.len());
    }

    #[test]
    fn test_builtin_signatures() {
        let test_cases = vec![
            ("print", "(Any) -> Any"),
            ("read", "() -> Str"),
            ("typeOf", "(Any) -> Class"),
            ("str", "(Any) -> Str"),
            ("add", "(Int, Int) -> Int"),
            ("mod", "(Int, Int) -> Int"),
            ("fdiv", "(Float, Float) -> Float"),
            ("and", "(Bool, Bool) -> Bool"),
            ("not", "(Bool) -> Bool"),
            ("eq", "(Any, Any) -> Bool"),
            ("neq", "(Any, Any) -> Bool"),
            ("lt", "(Int, Int) -> Bool"),
            ("ge", "(Int, Int) -> Bool"),
            ("concat", "(Str, Str) -> Str"),
        ];

        for (name, expected) in test_cases {
            match &find_builtin_op(name).unwrap().op_kind {
                OpKind::Function(function) => {
                    assert_eq!(function.signature(), expected, "Failed for builtin: {name}");
                }
                OpKind::Class(_) => panic!("{name} should be a function"),
            }
        }
    }

    /// Macro to create test cases, invoking builtins via the registry.
    macro_rules! test {
        ($name:expr, $args:expr, $expected:expr) => {
            ($name, call_builtin($name, $args), $expected)
        };
    }

    #[test]
    fn test_builtin_function_implementations() {
        use ErrorKind::*;

        type TestCase = (&'static str, Result<Value, Error>, Result<Value, ErrorKind>);

        let test_cases: Vec<TestCase> = vec![
            // Integer arithmetic
            test!("add", &[val(2), val(3)], Ok(val(5))),
            test!("add", &[val(i64::MAX), val(1)], Err(Overflow)),
            test!("sub", &[val(2), val(3)], Ok(val(-1))),
            test!("sub", &[val(i64::MIN), val(1)], Err(Overflow)),
            test!("mul", &[val(-4), val(3)], Ok(val(-12))),
            test!("mul", &[val(i64::MAX), val(2)], Err(Overflow)),
            test!("div", &[val(7), val(2)], Ok(val(3))),
            test!("div", &[val(-7), val(2)], Ok(val(-3))),
            test!("div", &[val(1), val(0)], Err(DivisionByZero)),
            test!("div", &[val(i64::MIN), val(-1)], Err(Overflow)),
            test!("mod", &[val(7), val(3)], Ok(val(1))),
            test!("mod", &[val(-7), val(3)], Ok(val(-1))),
            test!("mod", &[val(7), val(0)], Err(DivisionByZero)),
            // No implicit widening
            test!("add", &[val(1), val(1.0)], Err(WrongArguments)),
            test!("add", &[val(1)], Err(WrongArguments)),
            // Float arithmetic
            test!("fadd", &[val(1.5), val(2.25)], Ok(val(3.75))),
            test!("fsub", &[val(1.5), val(2.0)], Ok(val(-0.5))),
            test!("fmul", &[val(1.5), val(2.0)], Ok(val(3.0))),
            test!("fdiv", &[val(1.0), val(4.0)], Ok(val(0.25))),
            test!("fdiv", &[val(1.0), val(0.0)], Ok(val(f64::INFINITY))),
            test!("fadd", &[val(1), val(2)], Err(WrongArguments)),
            // Logic
            test!("and", &[val(true), val(false)], Ok(val(false))),
            test!("and", &[val(true), val(true)], Ok(val(true))),
            test!("or", &[val(false), val(true)], Ok(val(true))),
            test!("or", &[val(false), val(false)], Ok(val(false))),
            test!("not", &[val(true)], Ok(val(false))),
            test!("not", &[val(0)], Err(WrongArguments)),
            // Equality
            test!("eq", &[val(1), val(1)], Ok(val(true))),
            test!("eq", &[val(1), val(1.0)], Ok(val(false))),
            test!("eq", &[sym("a"), val("a")], Ok(val(false))),
            test!("eq", &[Value::Null, Value::Null], Ok(val(true))),
            test!("eq", &[val(Class::Int), val(Class::Int)], Ok(val(true))),
            test!("neq", &[val(1), val(2)], Ok(val(true))),
            test!("neq", &[val("a"), val("a")], Ok(val(false))),
            test!("neq", &[val(1), val(1.0)], Ok(val(true))),
            // Integer ordering
            test!("lt", &[val(1), val(2)], Ok(val(true))),
            test!("lt", &[val(2), val(2)], Ok(val(false))),
            test!("le", &[val(2), val(2)], Ok(val(true))),
            test!("le", &[val(3), val(2)], Ok(val(false))),
            test!("gt", &[val(3), val(2)], Ok(val(true))),
            test!("gt", &[val(-3), val(2)], Ok(val(false))),
            test!("ge", &[val(2), val(2)], Ok(val(true))),
            test!("ge", &[val(i64::MIN), val(0)], Ok(val(false))),
            test!("lt", &[val(1.0), val(2.0)], Err(WrongArguments)),
            test!("gt", &[val(1)], Err(WrongArguments)),
            // Strings
            test!("concat", &[val("foo"), val("bar")], Ok(val("foobar"))),
            test!("concat", &[val("foo"), sym("bar")], Err(WrongArguments)),
            test!("str", &[val(42)], Ok(val("42"))),
            test!("str", &[val("s")], Ok(val("\"s\""))),
            test!("str", &[sym("s")], Ok(val("'s"))),
            test!("str", &[Value::Null], Ok(val("null"))),
            // Reflection
            test!("typeOf", &[val(1)], Ok(val(Class::Int))),
            test!("typeOf", &[val(Class::Int)], Ok(val(Class::Class))),
            test!("typeOf", &[Value::Null], Ok(val(Class::Any))),
            test!("typeOf", &[], Err(WrongArguments)),
        ];

        for (name, result, expected) in test_cases {
            match (result, expected) {
                (Ok(actual), Ok(expected)) => {
                    assert_eq!(actual, expected, "Failed for builtin: {name}");
                }
                (Err(err), Err(kind)) => {
                    assert_eq!(err.kind, kind, "Failed for builtin: {name}");
                }
                (result, expected) => {
                    panic!("Builtin {name}: expected {expected:?}, got {result:?}")
                }
            }
        }
    }

    #[test]
    fn test_console_builtins() {
        let mut console = ScriptedConsole::with_input(&["first line"]);

        assert_eq!(
            call_builtin_with(&mut console, "print", &[val("hi")]).unwrap(),
            Value::Null
        );
        call_builtin_with(&mut console, "print", &[val(3)]).unwrap();
        assert_eq!(*console.output.borrow(), vec!["\"hi\"", "3"]);

        assert_eq!(
            call_builtin_with(&mut console, "read", &[]).unwrap(),
            val("first line")
        );
        let err = call_builtin_with(&mut console, "read", &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReadFailed);

        let err = call_builtin_with(&mut console, "print", &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::WrongArguments);
    }
}
