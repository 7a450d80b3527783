//! Typed binding environment.
//!
//! An [`Environment`] owns two tables: declarations (name to [`Symbol`]) and
//! bindings (symbol to current [`Value`]). All mutation goes through
//! [`Environment::declare`] and [`Environment::assign`], which validate
//! completely before touching either table, so a failed operation leaves the
//! environment exactly as it was.
//!
//! A block does not open a nested scope: every statement of a session runs
//! against the same environment.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufRead, Write};

use crate::Error;
use crate::builtinops::get_builtin_ops;
use crate::intooperation::IntoOperation;
use crate::value::{Class, Function, Value};

/// Line-oriented I/O collaborator used by the `print` and `read` natives.
pub trait Console {
    /// Write one line of output
    fn write_line(&mut self, line: &str);

    /// Read one line of input, without its line terminator. `None` at end of input.
    fn read_line(&mut self) -> Option<String>;
}

/// Console backed by the process standard streams
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write_line(&mut self, line: &str) {
        let mut stdout = io::stdout().lock();
        if let Err(err) = writeln!(stdout, "{line}") {
            log::warn!("cannot write to stdout: {err}");
        }
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_owned()),
            Err(err) => {
                log::warn!("cannot read from stdin: {err}");
                None
            }
        }
    }
}

/// Declaration record of a name: its declared class and mutability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub declared: Class,
    pub mutable: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, declared: Class, mutable: bool) -> Self {
        Symbol {
            name: name.into(),
            declared,
            mutable,
        }
    }
}

/// Index of a symbol in its environment's symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SymbolId(usize);

/// Symbol table and value store of one evaluation session.
///
/// Environments are not shared: an embedding serving several sessions gives
/// each one its own instance.
pub struct Environment {
    declarations: HashMap<String, SymbolId>,
    symbols: Vec<Symbol>,
    bindings: HashMap<SymbolId, Value>,
    console: Box<dyn Console>,
}

impl Environment {
    /// Create an environment seeded with the built-in classes and functions,
    /// using the standard streams as console.
    pub fn new() -> Self {
        Self::with_console(Box::new(StdConsole))
    }

    /// Create a seeded environment with a custom console collaborator
    pub fn with_console(console: Box<dyn Console>) -> Self {
        let mut env = Environment {
            declarations: HashMap::new(),
            symbols: Vec::new(),
            bindings: HashMap::new(),
            console,
        };
        for op in get_builtin_ops() {
            let id = env.insert_symbol(Symbol::new(op.id, op.declared_class(), false));
            env.bindings.insert(id, op.value());
        }
        env
    }

    /// Declare `name` with the class bound to `type_name`.
    ///
    /// Fails with `ALREADY_DEFINED` if the name exists, `UNKNOWN_TYPE` if the type
    /// name is not declared or holds no value, `UNKNOWN_CLASS` if it holds a
    /// value that is not a class.
    pub fn declare(&mut self, name: &str, type_name: &str, mutable: bool) -> Result<Symbol, Error> {
        if self.is_defined(name) {
            return Err(Error::already_defined(name));
        }
        let symbol = Symbol::new(name, self.resolve_class(type_name)?, mutable);
        self.insert_symbol(symbol.clone());
        Ok(symbol)
    }

    /// Declare `name` directly with a class descriptor
    pub fn declare_class(
        &mut self,
        name: &str,
        declared: Class,
        mutable: bool,
    ) -> Result<Symbol, Error> {
        if self.is_defined(name) {
            return Err(Error::already_defined(name));
        }
        let symbol = Symbol::new(name, declared, mutable);
        self.insert_symbol(symbol.clone());
        Ok(symbol)
    }

    /// Bind `value` to the declared `name` and return it.
    ///
    /// Fails with `NOT_DEFINED` for an undeclared name, `NOT_MUTABLE` when an
    /// immutable symbol already holds a value, `NOT_EXPECTED_TYPE` when the value
    /// class is not accepted by the declared class.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<Value, Error> {
        let id = self.symbol_id(name)?;
        let symbol = &self.symbols[id.0];

        if !symbol.mutable && self.bindings.contains_key(&id) {
            return Err(Error::not_mutable(name));
        }
        if !symbol.declared.accepts(value.class()) {
            return Err(Error::not_expected_type(name, symbol.declared, value.class()));
        }

        log::debug!("assign {name} = {value}");
        self.bindings.insert(id, value.clone());
        Ok(value)
    }

    /// Declare `name` with the class of `value`, then bind the value.
    pub fn declare_and_assign(
        &mut self,
        name: &str,
        value: Value,
        mutable: bool,
    ) -> Result<Value, Error> {
        self.declare_class(name, value.class(), mutable)?;
        self.assign(name, value)
    }

    /// Current value of `name`: `NOT_DEFINED` if undeclared, `NOT_SET` if unassigned
    pub fn get(&self, name: &str) -> Result<Value, Error> {
        let id = self.symbol_id(name)?;
        self.bindings
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_set(name))
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// Declaration record of `name`, if declared
    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.declarations.get(name).map(|id| &self.symbols[id.0])
    }

    /// Look up `name` and require it to hold a function
    pub fn function(&self, name: &str) -> Result<Function, Error> {
        match self.get(name)? {
            Value::Function(function) => Ok(function),
            other => Err(Error::not_expected_type(name, Class::Function, other.class())),
        }
    }

    /// Register a typed Rust function as an immutable native binding.
    ///
    /// The declared signature is derived from the Rust parameter and return types:
    ///
    /// ```
    /// use grolang::environment::Environment;
    ///
    /// fn twice(n: i64) -> i64 { n * 2 }
    ///
    /// let mut env = Environment::new();
    /// env.register_function::<_, (i64,)>("twice", twice).unwrap();
    /// let f = env.function("twice").unwrap();
    /// assert_eq!(f.signature(), "(Int) -> Int");
    /// ```
    pub fn register_function<F, Args>(&mut self, name: &str, func: F) -> Result<Value, Error>
    where
        F: IntoOperation<Args>,
    {
        let function = Function::new(name, F::inputs(), F::output(), func.into_operation());
        self.register_native(function)
    }

    /// Bind an already built native function under its own name, immutably
    pub fn register_native(&mut self, function: Function) -> Result<Value, Error> {
        let name = function.name().to_owned();
        self.declare_and_assign(&name, Value::Function(function), false)
    }

    /// Console collaborator of this environment
    pub fn console(&mut self) -> &mut dyn Console {
        self.console.as_mut()
    }

    /// All declarations with their current value, sorted by name
    pub fn bindings(&self) -> Vec<(Symbol, Option<Value>)> {
        let mut result: Vec<_> = self
            .symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| (symbol.clone(), self.bindings.get(&SymbolId(i)).cloned()))
            .collect();
        result.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        result
    }

    fn symbol_id(&self, name: &str) -> Result<SymbolId, Error> {
        self.declarations
            .get(name)
            .copied()
            .ok_or_else(|| Error::not_defined(name))
    }

    fn resolve_class(&self, type_name: &str) -> Result<Class, Error> {
        let id = self
            .declarations
            .get(type_name)
            .ok_or_else(|| Error::unknown_type(type_name))?;
        let value = self
            .bindings
            .get(id)
            .ok_or_else(|| Error::unknown_type(type_name))?;
        value.as_class().ok_or_else(|| Error::unknown_class(type_name))
    }

    fn insert_symbol(&mut self, symbol: Symbol) -> SymbolId {
        log::debug!(
            "declare {} {}: {}",
            if symbol.mutable { "var" } else { "val" },
            symbol.name,
            symbol.declared
        );
        let id = SymbolId(self.symbols.len());
        self.declarations.insert(symbol.name.clone(), id);
        self.symbols.push(symbol);
        id
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("symbols", &self.symbols)
            .field("bindings", &self.bindings.len())
            .finish_non_exhaustive()
    }
}
