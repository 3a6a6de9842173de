//! `typeof`, `print`, `string`, `int`.

use crate::error::RuntimeError;
use crate::runtime::value::{NULL, Value};
use super::{BuiltinRegistry, RuntimeState, check_argc, not_supported};

pub(super) fn register(r: &mut BuiltinRegistry) {
    r.register("typeof", type_of);
    r.register("print", print);
    r.register("string", string);
    r.register("int", int);
}

fn type_of(args: &[Value], _: &RuntimeState) -> Result<Value, RuntimeError> {
    check_argc("typeof", args, 1)?;
    Ok(Value::Str(args[0].type_name().to_string()))
}

/// Display forms joined by single spaces, one line per call.
fn print(args: &[Value], state: &RuntimeState) -> Result<Value, RuntimeError> {
    let line = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
    state.output.write_line(line).map_err(|e| RuntimeError::OutputFailed(e.to_string()))?;
    Ok(NULL)
}

fn string(args: &[Value], _: &RuntimeState) -> Result<Value, RuntimeError> {
    Ok(Value::Str(args.iter().map(ToString::to_string).collect()))
}

fn int(args: &[Value], _: &RuntimeState) -> Result<Value, RuntimeError> {
    check_argc("int", args, 1)?;
    match &args[0] {
        Value::Str(s) => Ok(parse_leading_int(s).map_or(NULL, Value::Integer)),
        other => Err(not_supported("int", other)),
    }
}

/// Leading whitespace, optional sign, then as many digits as there are.
/// `None` when there are no digits or the number does not fit.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => ("-", &s[1..]),
        Some(b'+') => ("", &s[1..]),
        _ => ("", s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    format!("{sign}{}", &rest[..digits]).parse().ok()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
