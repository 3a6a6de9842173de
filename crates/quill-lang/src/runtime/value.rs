use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::builtins::Builtin;
use crate::error::RuntimeError;
use crate::runtime::environment::Environment;
use crate::syntax::ast::{BlockStatement, Identifier, braced};

pub const TRUE: Value = Value::Bool(true);
pub const FALSE: Value = Value::Bool(false);
pub const NULL: Value = Value::Null;

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Str(String),
    Bool(bool),
    Null,
    /// Unwinds to the nearest call boundary.
    Return(Box<Value>),
    /// Unwinds to whoever reports it.
    Error(RuntimeError),
    Function(Rc<Function>),
    Builtin(Builtin),
    Array(Rc<RefCell<Vec<Value>>>),
    Hash(Rc<RefCell<HashPairs>>),
    For(Rc<ForLoop>),
}

impl Value {
    pub fn from_bool(b: bool) -> Value {
        if b { TRUE } else { FALSE }
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn hash(pairs: HashPairs) -> Value {
        Value::Hash(Rc::new(RefCell::new(pairs)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_)  => "INTEGER",
            Value::Str(_)      => "STRING",
            Value::Bool(_)     => "BOOL",
            Value::Null        => "NULL",
            Value::Return(_)   => "RETURN_VALUE",
            Value::Error(_)    => "ERROR",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_)  => "BUILTIN",
            Value::Array(_)    => "ARRAY",
            Value::Hash(_)     => "HASH",
            Value::For(_)      => "FOR",
        }
    }

    /// Only `false` and `null` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn hash_key(&self) -> Result<HashKey, RuntimeError> {
        match self {
            Value::Integer(n) => Ok(HashKey::Integer(*n)),
            Value::Str(s)     => Ok(HashKey::Str(s.clone())),
            Value::Bool(b)    => Ok(HashKey::Bool(*b)),
            other => Err(RuntimeError::UnusableHashKey(other.type_name())),
        }
    }
}

/// Scalars compare by value; functions, collections and loops by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b))   => a == b,
            (Value::Str(a), Value::Str(b))           => a == b,
            (Value::Bool(a), Value::Bool(b))         => a == b,
            (Value::Null, Value::Null)               => true,
            (Value::Return(a), Value::Return(b))     => a == b,
            (Value::Error(a), Value::Error(b))       => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b))   => a.name == b.name,
            (Value::Array(a), Value::Array(b))       => Rc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b))         => Rc::ptr_eq(a, b),
            (Value::For(a), Value::For(b))           => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ─── Hash keys ───────────────────────────────────────────────────────────────

/// Type-tagged, so `1`, `"1"` and `true` never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Str(String),
    Bool(bool),
}

/// A stored entry keeps the original key value alongside the payload.
#[derive(Debug, Clone)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

/// Hash contents in insertion order.
#[derive(Debug, Clone, Default)]
pub struct HashPairs {
    entries: IndexMap<HashKey, HashPair>,
}

impl HashPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An existing key keeps its position.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), RuntimeError> {
        let hk = key.hash_key()?;
        self.entries.insert(hk, HashPair { key, value });
        Ok(())
    }

    /// `None` means the key is absent, which is distinct from a stored `null`.
    pub fn get(&self, key: &HashKey) -> Option<&HashPair> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &HashKey) -> Option<HashPair> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HashPair> {
        self.entries.values()
    }
}

// ─── Callables ───────────────────────────────────────────────────────────────

/// A closure: parameters, shared body, and the environment it was defined in.
pub struct Function {
    pub parameters: Vec<Identifier>,
    pub body: Rc<BlockStatement>,
    pub env: Environment,
}

impl fmt::Debug for Function {
    // the captured env can reach this function again
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<_> = self.parameters.iter().map(|p| p.value.as_str()).collect();
        f.debug_struct("Function").field("parameters", &params).finish_non_exhaustive()
    }
}

/// What a for-expression evaluates to once it has run.
pub struct ForLoop {
    pub index: Identifier,
    pub value: Identifier,
    pub target: Identifier,
    pub body: Rc<BlockStatement>,
    pub env: Environment,
}

impl fmt::Debug for ForLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForLoop")
            .field("index", &self.index.value)
            .field("value", &self.value.value)
            .field("target", &self.target.value)
            .finish_non_exhaustive()
    }
}

// ─── Display ─────────────────────────────────────────────────────────────────

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_display(f, &mut Vec::new())
    }
}

impl Value {
    /// `seen` holds the collections currently being printed; meeting one again
    /// prints a placeholder instead of recursing.
    fn write_display(&self, f: &mut fmt::Formatter<'_>, seen: &mut Vec<*const ()>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Str(s)     => f.write_str(s),
            Value::Bool(b)    => write!(f, "{b}"),
            Value::Null       => f.write_str("null"),
            Value::Return(v)  => v.write_display(f, seen),
            Value::Error(e)   => write!(f, "ERROR: {e}"),
            Value::Builtin(b) => write!(f, "builtin function {}", b.name),
            Value::Function(func) => {
                let params: Vec<_> = func.parameters.iter().map(|p| p.value.as_str()).collect();
                write!(f, "fn({}) {}", params.join(", "), braced(&func.body))
            }
            Value::Array(items) => {
                let ptr = Rc::as_ptr(items) as *const ();
                if seen.contains(&ptr) {
                    return f.write_str("[...]");
                }
                seen.push(ptr);
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    item.write_display(f, seen)?;
                }
                seen.pop();
                f.write_str("]")
            }
            Value::Hash(pairs) => {
                let ptr = Rc::as_ptr(pairs) as *const ();
                if seen.contains(&ptr) {
                    return f.write_str("{...}");
                }
                seen.push(ptr);
                f.write_str("{")?;
                for (i, pair) in pairs.borrow().iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    pair.key.write_display(f, seen)?;
                    f.write_str(": ")?;
                    pair.value.write_display(f, seen)?;
                }
                seen.pop();
                f.write_str("}")
            }
            Value::For(l) => write!(f, "for {}, {} in {}", l.index, l.value, l.target),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn text(s: &str) -> Value {
        Value::Str(s.to_string())
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!FALSE.is_truthy());
        assert!(TRUE.is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(text("").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn from_bool_returns_canonical_values() {
        assert_eq!(Value::from_bool(true), TRUE);
        assert_eq!(Value::from_bool(false), FALSE);
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Integer(1).type_name(), "INTEGER");
        assert_eq!(text("a").type_name(), "STRING");
        assert_eq!(NULL.type_name(), "NULL");
        assert_eq!(Value::Return(Box::new(NULL)).type_name(), "RETURN_VALUE");
        assert_eq!(Value::Error(RuntimeError::DivisionByZero).type_name(), "ERROR");
        assert_eq!(Value::hash(HashPairs::new()).type_name(), "HASH");
    }

    #[test]
    fn equal_scalars_share_hash_keys() {
        assert_eq!(text("Hello World").hash_key(), text("Hello World").hash_key());
        assert_eq!(Value::Integer(7).hash_key(), Value::Integer(7).hash_key());
        assert_ne!(text("Hello").hash_key(), text("World").hash_key());
    }

    #[test]
    fn hash_keys_are_type_tagged() {
        assert_ne!(Value::Integer(1).hash_key(), text("1").hash_key());
        assert_ne!(TRUE.hash_key(), text("true").hash_key());
        assert_ne!(Value::Integer(1).hash_key(), TRUE.hash_key());
    }

    #[test]
    fn collections_are_not_hashable() {
        assert_eq!(Value::array(vec![]).hash_key(), Err(RuntimeError::UnusableHashKey("ARRAY")));
        assert_eq!(NULL.hash_key(), Err(RuntimeError::UnusableHashKey("NULL")));
    }

    #[test]
    fn hash_pairs_keep_insertion_order() {
        let mut pairs = HashPairs::new();
        pairs.insert(text("b"), Value::Integer(1)).unwrap();
        pairs.insert(Value::Integer(2), Value::Integer(2)).unwrap();
        pairs.insert(text("a"), Value::Integer(3)).unwrap();
        pairs.insert(text("b"), Value::Integer(4)).unwrap();
        let keys: Vec<_> = pairs.iter().map(|p| p.key.to_string()).collect();
        assert_eq!(keys, vec!["b", "2", "a"]);
        assert_eq!(pairs.get(&HashKey::Str("b".into())).map(|p| p.value.clone()), Some(Value::Integer(4)));
    }

    #[test]
    fn absent_key_differs_from_stored_null() {
        let mut pairs = HashPairs::new();
        pairs.insert(text("x"), NULL).unwrap();
        assert!(pairs.get(&HashKey::Str("x".into())).is_some());
        assert!(pairs.get(&HashKey::Str("y".into())).is_none());
    }

    #[test]
    fn collections_compare_by_identity() {
        let a = Value::array(vec![Value::Integer(1)]);
        let b = Value::array(vec![Value::Integer(1)]);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn display_forms() {
        let mut pairs = HashPairs::new();
        pairs.insert(text("k"), Value::array(vec![Value::Integer(1), TRUE, NULL])).unwrap();
        assert_eq!(Value::hash(pairs).to_string(), "{k: [1, true, null]}");
        assert_eq!(Value::Integer(-3).to_string(), "-3");
        assert_eq!(Value::Error(RuntimeError::DivisionByZero).to_string(), "ERROR: division by zero");
        assert_eq!(Value::Return(Box::new(text("x"))).to_string(), "x");
    }

    #[test]
    fn self_containing_collections_display() {
        let arr = Value::array(vec![Value::Integer(1)]);
        if let Value::Array(items) = &arr {
            items.borrow_mut().push(arr.clone());
        }
        assert_eq!(arr.to_string(), "[1, [...]]");

        let hash = Value::hash(HashPairs::new());
        if let Value::Hash(pairs) = &hash {
            pairs.borrow_mut().insert(text("me"), hash.clone()).unwrap();
        }
        assert_eq!(hash.to_string(), "{me: {...}}");
    }

    #[test]
    fn shared_element_is_not_a_cycle() {
        let inner = Value::array(vec![Value::Integer(0)]);
        let outer = Value::array(vec![inner.clone(), inner]);
        assert_eq!(outer.to_string(), "[[0], [0]]");
    }

    fn hashable() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::Integer),
            "[a-z0-9]{0,4}".prop_map(Value::Str),
            any::<bool>().prop_map(Value::Bool),
            // small ranges so collisions get exercised
            (-3i64..3).prop_map(Value::Integer),
            prop_oneof![Just("1".to_string()), Just("true".to_string())].prop_map(Value::Str),
        ]
    }

    proptest! {
        #[test]
        fn hash_keys_collide_iff_same_type_and_value(a in hashable(), b in hashable()) {
            let same = a.type_name() == b.type_name() && a == b;
            prop_assert_eq!(a.hash_key().unwrap() == b.hash_key().unwrap(), same);
        }
    }
}
