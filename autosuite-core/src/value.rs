//! Runtime values carried by recorded invocations
//!
//! A [`Value`] is anything that can be passed to or returned from a function
//! under test. The built-in kinds mirror the literal forms of the generated
//! test module; everything else is an [`Value::Object`] backed by a
//! user-supplied [`PyObject`].

use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use unicode_general_category::{get_general_category, GeneralCategory};

use crate::render::Literal;

/// Module name of the synthetic built-in namespace
pub const BUILTINS_MODULE: &str = "builtins";

/// Module name of the top-level interactive namespace
pub const MAIN_MODULE: &str = "__main__";

/// A user-defined object that can appear as an argument or result.
///
/// Implementors that do not override [`PyObject::repr`] get the default
/// `<module.Class object at 0x...>` placeholder, which the renderer treats
/// as not reconstructable.
pub trait PyObject: Send + Sync + fmt::Debug {
    /// Owning module of the object's type
    fn module(&self) -> &str;

    /// Qualified name of the object's type
    fn qualname(&self) -> &str;

    /// Source-like representation of the object
    fn repr(&self) -> String {
        default_object_repr(self.module(), self.qualname(), self as *const Self as *const ())
    }
}

/// The placeholder representation used for objects without a custom repr.
pub fn default_object_repr(module: &str, qualname: &str, address: *const ()) -> String {
    format!("<{}.{} object at {:#x}>", module, qualname, address as usize)
}

/// A plain user-defined instance, optionally carrying a custom repr
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    module: String,
    qualname: String,
    repr: Option<String>,
}

impl Instance {
    /// An instance with the default (unrenderable) representation
    pub fn new(module: impl Into<String>, qualname: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            qualname: qualname.into(),
            repr: None,
        }
    }

    /// Attach a custom representation
    pub fn with_repr(mut self, repr: impl Into<String>) -> Self {
        self.repr = Some(repr.into());
        self
    }
}

impl PyObject for Instance {
    fn module(&self) -> &str {
        &self.module
    }

    fn qualname(&self) -> &str {
        &self.qualname
    }

    fn repr(&self) -> String {
        match &self.repr {
            Some(repr) => repr.clone(),
            None => default_object_repr(&self.module, &self.qualname, self as *const Self as *const ()),
        }
    }
}

/// A dynamically typed value
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Key/value pairs in insertion order
    Dict(Vec<(Value, Value)>),
    /// Elements in insertion order, without duplicates
    Set(Vec<Value>),
    Object(Arc<dyn PyObject>),
}

impl Value {
    /// Wrap a user-defined object
    pub fn object(object: impl PyObject + 'static) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Build a set, dropping later duplicates
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }

    /// Build a dict from key/value pairs
    pub fn dict(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Dict(pairs.into_iter().collect())
    }

    /// Owning module of the value's type
    pub fn module(&self) -> &str {
        match self {
            Value::Object(object) => object.module(),
            _ => BUILTINS_MODULE,
        }
    }

    /// Qualified name of the value's type
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Set(_) => "set",
            Value::Object(object) => object.qualname(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len() && a.iter().all(|pair| b.contains(pair))
            }
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (Value::Object(a), Value::Object(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.module() == b.module()
                        && a.qualname() == b.qualname()
                        && a.repr() == b.repr())
            }
            _ => false,
        }
    }
}

impl Literal for Value {
    fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => float_repr(*f),
            Value::Str(s) => str_repr(s),
            Value::Bytes(b) => bytes_repr(b),
            Value::List(items) => format!("[{}]", join_reprs(items)),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", join_reprs(items)),
            Value::Dict(pairs) => {
                let body = pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{}}}", body)
            }
            Value::Set(items) if items.is_empty() => "set()".to_string(),
            Value::Set(items) => format!("{{{}}}", join_reprs(items)),
            Value::Object(object) => object.repr(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

fn join_reprs(items: &[Value]) -> String {
    items.iter().map(Literal::repr).collect::<Vec<_>>().join(", ")
}

fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    // Debug switches to exponent form at the same thresholds as the target
    // language, but spells the exponent without sign or padding.
    let debug = format!("{:?}", f);
    match debug.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => debug,
    }
}

fn pick_quote(has_single: bool, has_double: bool) -> char {
    if has_single && !has_double { '"' } else { '\'' }
}

/// Printable in the target language's sense: everything except the
/// "Other" and "Separator" categories, with ASCII space allowed
fn is_printable(c: char) -> bool {
    c == ' '
        || !matches!(
            get_general_category(c),
            GeneralCategory::Control
                | GeneralCategory::Format
                | GeneralCategory::Surrogate
                | GeneralCategory::PrivateUse
                | GeneralCategory::Unassigned
                | GeneralCategory::SpaceSeparator
                | GeneralCategory::LineSeparator
                | GeneralCategory::ParagraphSeparator
        )
}

fn str_repr(s: &str) -> String {
    let quote = pick_quote(s.contains('\''), s.contains('"'));
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !is_printable(c) => {
                let code = c as u32;
                let _ = if code < 0x100 {
                    write!(out, "\\x{:02x}", code)
                } else if code < 0x10000 {
                    write!(out, "\\u{:04x}", code)
                } else {
                    write!(out, "\\U{:08x}", code)
                };
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn bytes_repr(bytes: &[u8]) -> String {
    let quote = pick_quote(bytes.contains(&b'\''), bytes.contains(&b'"'));
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push('b');
    out.push(quote);
    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if b as char == quote => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\x{:02x}", byte);
            }
        }
    }
    out.push(quote);
    out
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(option: Option<T>) -> Self {
        option.map(Into::into).unwrap_or(Value::None)
    }
}
