//! English message catalog for [`ErrorKind`]s.
//!
//! The evaluator only ever produces `{kind, args}` pairs. This module is the
//! presentation-side lookup table: one template per kind, with `{0}`, `{1}`, ...
//! standing for the positional arguments of the error. A surface that wants
//! another language can keep its own table keyed by [`ErrorKind::id`] and call
//! [`format_template`] with it.

use crate::ErrorKind;

/// Message template of a kind in the built-in English catalog
pub fn template(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::SyntaxError => "Syntax error: {0}",
        ErrorKind::UnknownToken => "Unknown token '{0}'",
        ErrorKind::TypeError => "Declared type is :{0} whereas value is :{1}",
        ErrorKind::TypeNotInferred => "Cannot infer the type of '{0}'",
        ErrorKind::AlreadyDefined => "Symbol '{0}' is already defined",
        ErrorKind::NotDefined => "Symbol '{0}' is not defined",
        ErrorKind::NotSet => "Symbol '{0}' has no value",
        ErrorKind::NotMutable => "Symbol '{0}' is not mutable",
        ErrorKind::NotExpectedType => "'{0}' expects type :{1} but got :{2}",
        ErrorKind::UnknownType => "Unknown type :{0}",
        ErrorKind::UnknownClass => "Unknown class :{0}",
        ErrorKind::WrongArguments => "Wrong arguments for {0}: expected {1}, got {2}",
        ErrorKind::DivisionByZero => "Division by zero in {0}",
        ErrorKind::Overflow => "Integer overflow in {0}",
        ErrorKind::DepthExceeded => "Evaluation depth limit exceeded (max: {0})",
        ErrorKind::ReadFailed => "No more input to read",
    }
}

/// Substitute `{n}` placeholders of `template` with `args[n]`.
///
/// Placeholders without a matching argument are kept verbatim, extra arguments
/// are ignored.
pub fn format_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let placeholder = &after[..close];
                match placeholder.parse::<usize>().ok().and_then(|i| args.get(i)) {
                    Some(arg) => out.push_str(arg),
                    None => {
                        out.push('{');
                        out.push_str(placeholder);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Render an error with the English catalog
pub fn render(kind: &ErrorKind, args: &[String]) -> String {
    format_template(template(*kind), args)
}
