//! `len`, `append`, `remove`. Collections are shared handles, so `append` and
//! `remove` mutate the caller's array or hash in place.

use crate::error::RuntimeError;
use crate::runtime::value::{FALSE, TRUE, Value};
use super::{BuiltinRegistry, RuntimeState, check_argc, not_supported};

pub(super) fn register(r: &mut BuiltinRegistry) {
    r.register("len", len);
    r.register("append", append);
    r.register("remove", remove);
}

fn len(args: &[Value], _: &RuntimeState) -> Result<Value, RuntimeError> {
    check_argc("len", args, 1)?;
    let n = match &args[0] {
        Value::Str(s)   => s.chars().count(),
        Value::Array(a) => a.borrow().len(),
        Value::Hash(h)  => h.borrow().len(),
        other => return Err(not_supported("len", other)),
    };
    Ok(Value::Integer(n as i64))
}

/// `append(array, v)` or `append(hash, k, v)`; returns the same collection.
fn append(args: &[Value], _: &RuntimeState) -> Result<Value, RuntimeError> {
    let arity = |expected: &str| RuntimeError::WrongArgumentCount {
        name: "append".to_string(),
        expected: expected.to_string(),
        got: args.len(),
    };

    match args {
        [Value::Array(items), value] => {
            items.borrow_mut().push(value.clone());
            Ok(args[0].clone())
        }
        [Value::Hash(pairs), key, value] => {
            pairs.borrow_mut().insert(key.clone(), value.clone())?;
            Ok(args[0].clone())
        }
        [Value::Array(_), ..] => Err(arity("2")),
        [Value::Hash(_), ..]  => Err(arity("3")),
        [other, ..]           => Err(not_supported("append", other)),
        []                    => Err(arity("2 or 3")),
    }
}

/// `remove(array, index)` or `remove(hash, key)`; `true` if something went.
fn remove(args: &[Value], _: &RuntimeState) -> Result<Value, RuntimeError> {
    check_argc("remove", args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Array(items), Value::Integer(i)) => {
            let mut items = items.borrow_mut();
            match usize::try_from(*i) {
                Ok(i) if i < items.len() => {
                    items.remove(i);
                    Ok(TRUE)
                }
                _ => Ok(FALSE),
            }
        }
        (Value::Array(_), other) => Err(not_supported("remove", other)),
        (Value::Hash(pairs), key) => {
            let hk = key.hash_key()?;
            let removed = pairs.borrow_mut().remove(&hk).is_some();
            Ok(Value::from_bool(removed))
        }
        (other, _) => Err(not_supported("remove", other)),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
