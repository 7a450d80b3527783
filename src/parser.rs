//! Statement grammar producing [`Expression`] trees.
//!
//! ```text
//! statement   := expression
//! expression  := block | declaration | assignment | call | literal | identifier
//! block       := "{" [expression (";" expression)* [";"]] "}"
//! declaration := ("val" | "var") name [":" Type] ["=" expression]
//! assignment  := name "=" expression
//! call        := name "(" [expression ("," expression)*] ")"
//! literal     := int | decimal | "string" | true | false | null | 'symbol
//! ```
//!
//! A declaration with an initializer desugars to a block of the declaration
//! followed by the assignment. Its class is the annotation when present,
//! otherwise the static class of the initializer; an annotation naming a
//! built-in class that rejects the initializer's static class is a
//! `TYPE_ERROR`, and a declaration with neither is `TYPE_NOT_INFERRED`.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, multispace1, one_of},
    combinator::{opt, recognize, verify},
    error::{ErrorKind as NomErrorKind, ParseError},
    multi::separated_list0,
    sequence::{pair, preceded},
};

use crate::ast::{Expression, is_valid_identifier};
use crate::value::{Class, Value};
use crate::{Error, MAX_PARSE_DEPTH};

/// Words that cannot be used as names
const KEYWORDS: [&str; 5] = ["val", "var", "true", "false", "null"];

/// Runtime parse options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseConfig {
    /// Treat `//` up to the end of the line as whitespace
    pub handle_comments: bool,
}

/// Parser error: nom's position and kind, or a failure already decided by the grammar
#[derive(Debug)]
struct ParseFailure<'a> {
    input: &'a str,
    code: NomErrorKind,
    error: Option<Error>,
}

impl<'a> ParseError<&'a str> for ParseFailure<'a> {
    fn from_error_kind(input: &'a str, code: NomErrorKind) -> Self {
        ParseFailure {
            input,
            code,
            error: None,
        }
    }

    fn append(_input: &'a str, _code: NomErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, T> = IResult<&'a str, T, ParseFailure<'a>>;

/// Abort parsing with a decided error, without backtracking
fn fail<'a, T>(input: &'a str, error: Error) -> PResult<'a, T> {
    Err(nom::Err::Failure(ParseFailure {
        input,
        code: NomErrorKind::Verify,
        error: Some(error),
    }))
}

/// Whether `c` can start some token of the grammar
fn is_token_start(c: char) -> bool {
    c.is_alphanumeric() || "_'\"{}();,:=-./".contains(c)
}

/// Error for input that the grammar cannot continue with
fn unexpected(rest: &str) -> Error {
    match rest.chars().next() {
        Some(c) if !is_token_start(c) => Error::unknown_token(c.to_string()),
        Some(_) => {
            let near: String = rest.chars().take(10).collect();
            Error::syntax(format!("Invalid syntax near '{near}'"))
        }
        None => Error::syntax("Unexpected end of input"),
    }
}

/// Convert a nom failure into an [`Error`]
fn into_error(failure: ParseFailure<'_>) -> Error {
    match failure {
        ParseFailure {
            error: Some(error), ..
        } => error,
        ParseFailure {
            code: NomErrorKind::TooLarge,
            ..
        } => Error::syntax(format!(
            "Expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"
        )),
        ParseFailure { input, .. } => unexpected(input),
    }
}

/// Parse an identifier (not checked against keywords)
fn identifier(input: &str) -> PResult<'_, &str> {
    verify(
        take_while1(|c: char| c.is_alphanumeric() || c == '_'),
        |word: &str| is_valid_identifier(word),
    )
    .parse(input)
}

/// Parse a name usable for a binding
fn name(input: &str) -> PResult<'_, &str> {
    verify(identifier, |word: &str| !KEYWORDS.contains(&word)).parse(input)
}

/// Digits with `_` separators, starting with a digit
fn int_part(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        digit1,
        take_while(|c: char| c.is_ascii_digit() || c == '_'),
    ))
    .parse(input)
}

fn exponent(input: &str) -> PResult<'_, &str> {
    recognize((one_of("eE"), opt(one_of("+-")), digit1)).parse(input)
}

/// Parse an integer or decimal number literal
fn parse_number(input: &str) -> PResult<'_, Expression> {
    let decimal = alt((
        recognize((int_part, char('.'), opt(digit1), opt(exponent))),
        recognize((char('.'), digit1, opt(exponent))),
        recognize((int_part, exponent)),
    ));
    let (rest, text) = recognize(pair(
        opt(char('-')),
        alt((decimal, int_part)),
    ))
    .parse(input)?;

    let cleaned = text.replace('_', "");
    let value = if cleaned.contains(['.', 'e', 'E']) {
        match cleaned.parse::<f64>() {
            Ok(x) => Value::Float(x),
            Err(_) => return fail(input, Error::syntax(format!("Invalid decimal '{text}'"))),
        }
    } else {
        match cleaned.parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => {
                return fail(input, Error::syntax(format!("Integer out of range '{text}'")));
            }
        }
    };
    Ok((rest, Expression::Literal(value)))
}

/// Parse a string literal
fn parse_string(input: &str) -> PResult<'_, Expression> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut chars = String::new();

    loop {
        let mut char_iter = remaining.chars();
        match char_iter.next() {
            Some('"') => {
                return Ok((char_iter.as_str(), Expression::Literal(Value::Str(chars))));
            }
            Some('\\') => {
                match char_iter.next() {
                    Some('n') => chars.push('\n'),
                    Some('t') => chars.push('\t'),
                    Some('r') => chars.push('\r'),
                    Some('\\') => chars.push('\\'),
                    Some('"') => chars.push('"'),
                    Some(other) => {
                        return fail(
                            remaining,
                            Error::syntax(format!("Unknown escape sequence '\\{other}'")),
                        );
                    }
                    None => return fail(remaining, Error::syntax("Unterminated string")),
                }
                remaining = char_iter.as_str();
            }
            Some(ch) => {
                chars.push(ch);
                remaining = char_iter.as_str();
            }
            None => return fail(remaining, Error::syntax("Unterminated string")),
        }
    }
}

/// Parse a symbol literal (`'name`)
fn parse_symbol(input: &str) -> PResult<'_, Expression> {
    let (rest, word) = preceded(char('\''), identifier).parse(input)?;
    Ok((rest, Expression::Literal(Value::Symbol(word.to_owned()))))
}

/// Class of a declaration with initializer, from its annotation and initializer
fn declared_type(
    name: &str,
    annotation: Option<&str>,
    init: &Expression,
) -> Result<String, Error> {
    match (annotation, init.static_class()) {
        (Some(annotation), Some(actual)) => match Class::from_name(annotation) {
            Some(declared) if !declared.accepts(actual) => {
                Err(Error::type_error(declared, actual))
            }
            // Aliases are only known to the environment and are checked on assignment
            _ => Ok(annotation.to_owned()),
        },
        (Some(annotation), None) => Ok(annotation.to_owned()),
        (None, Some(actual)) => Ok(actual.name().to_owned()),
        (None, None) => Err(Error::type_not_inferred(name)),
    }
}

/// Grammar with its runtime options
struct Grammar {
    config: ParseConfig,
}

impl Grammar {
    /// Skip whitespace and, when enabled, `//` line comments
    fn ws<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let mut rest = input.trim_start();
        while self.config.handle_comments
            && let Some(comment) = rest.strip_prefix("//")
        {
            rest = comment
                .find('\n')
                .map_or("", |end| &comment[end..])
                .trim_start();
        }
        Ok((rest, ()))
    }

    fn statement<'a>(&self, input: &'a str) -> PResult<'a, Expression> {
        let (input, expr) = self.expression(input, 0)?;
        let (input, _) = self.ws(input)?;
        Ok((input, expr))
    }

    fn expression<'a>(&self, input: &'a str, depth: usize) -> PResult<'a, Expression> {
        if depth >= MAX_PARSE_DEPTH {
            return Err(nom::Err::Failure(ParseFailure::from_error_kind(
                input,
                NomErrorKind::TooLarge,
            )));
        }
        let (input, _) = self.ws(input)?;

        let result = alt((
            |i: &'a str| self.block(i, depth),
            |i: &'a str| self.word(i, depth),
            parse_number,
            parse_string,
            parse_symbol,
        ))
        .parse(input);

        match result {
            Err(nom::Err::Error(err)) => match input.chars().next() {
                Some(c) if !is_token_start(c) => fail(input, Error::unknown_token(c.to_string())),
                _ => Err(nom::Err::Error(err)),
            },
            other => other,
        }
    }

    fn block<'a>(&self, input: &'a str, depth: usize) -> PResult<'a, Expression> {
        let (input, _) = char('{').parse(input)?;
        let (input, children) = separated_list0(
            preceded(|i: &'a str| self.ws(i), char(';')),
            |i: &'a str| self.expression(i, depth + 1),
        )
        .parse(input)?;
        let (input, _) = opt(preceded(|i: &'a str| self.ws(i), char(';'))).parse(input)?;
        let (input, _) = self.ws(input)?;
        let (input, _) = char('}').parse(input)?;
        Ok((input, Expression::Block(children)))
    }

    /// Keyword literal, declaration, call, assignment or identifier
    fn word<'a>(&self, input: &'a str, depth: usize) -> PResult<'a, Expression> {
        let (rest, word) = identifier(input)?;
        match word {
            "true" => Ok((rest, Expression::Literal(Value::Bool(true)))),
            "false" => Ok((rest, Expression::Literal(Value::Bool(false)))),
            "null" => Ok((rest, Expression::Literal(Value::Null))),
            "val" | "var" => self.declaration(rest, word == "var", depth),
            _ => {
                let (after, _) = self.ws(rest)?;
                if after.starts_with('(') {
                    self.call(word, after, depth)
                } else if let Some(value) = after.strip_prefix('=') {
                    let (rest, value) = self.expression(value, depth + 1)?;
                    Ok((
                        rest,
                        Expression::Assignment {
                            name: word.to_owned(),
                            value: Box::new(value),
                        },
                    ))
                } else {
                    Ok((rest, Expression::Identifier(word.to_owned())))
                }
            }
        }
    }

    fn call<'a>(&self, function: &str, input: &'a str, depth: usize) -> PResult<'a, Expression> {
        let (input, _) = char('(').parse(input)?;
        let (input, arguments) = separated_list0(
            preceded(|i: &'a str| self.ws(i), char(',')),
            |i: &'a str| self.expression(i, depth + 1),
        )
        .parse(input)?;
        let (input, _) = self.ws(input)?;
        let (input, _) = char(')').parse(input)?;
        Ok((
            input,
            Expression::Call {
                function: function.to_owned(),
                arguments,
            },
        ))
    }

    fn declaration<'a>(
        &self,
        input: &'a str,
        mutable: bool,
        depth: usize,
    ) -> PResult<'a, Expression> {
        let (input, _) = multispace1(input)?;
        let (input, id) = name(input)?;
        let (input, annotation) = opt(preceded(
            (|i: &'a str| self.ws(i), char(':'), |i: &'a str| self.ws(i)),
            identifier,
        ))
        .parse(input)?;
        let (rest, init) = opt(preceded(
            (|i: &'a str| self.ws(i), char('=')),
            |i: &'a str| self.expression(i, depth + 1),
        ))
        .parse(input)?;

        let Some(init) = init else {
            return match annotation {
                Some(type_name) => Ok((
                    rest,
                    Expression::Declaration {
                        name: id.to_owned(),
                        type_name: type_name.to_owned(),
                        mutable,
                    },
                )),
                None => fail(input, Error::type_not_inferred(id)),
            };
        };

        let type_name = match declared_type(id, annotation, &init) {
            Ok(type_name) => type_name,
            Err(err) => return fail(input, err),
        };
        Ok((
            rest,
            Expression::Block(vec![
                Expression::Declaration {
                    name: id.to_owned(),
                    type_name,
                    mutable,
                },
                Expression::Assignment {
                    name: id.to_owned(),
                    value: Box::new(init),
                },
            ]),
        ))
    }
}

/// Parse one complete statement
pub fn parse_statement(input: &str) -> Result<Expression, Error> {
    parse_statement_with_config(input, ParseConfig::default())
}

/// Parse one complete statement with explicit options
pub fn parse_statement_with_config(input: &str, config: ParseConfig) -> Result<Expression, Error> {
    let grammar = Grammar { config };
    match grammar.statement(input) {
        Ok(("", expr)) => Ok(expr),
        Ok((remaining, _)) => Err(unexpected(remaining)),
        Err(nom::Err::Error(failure) | nom::Err::Failure(failure)) => Err(into_error(failure)),
        Err(nom::Err::Incomplete(_)) => Err(Error::syntax("Incomplete input")),
    }
}
