//! Callables under test
//!
//! A [`Callable`] pairs a target closure with a [`CallableRef`]: the
//! identity of one definition plus the names used to spell it in generated
//! code. Redefining a function produces a new identity under the same names.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::{Value, BUILTINS_MODULE, MAIN_MODULE};

/// Result of invoking a target: a returned value or a raised exception
pub type CallResult = Result<Value, RaisedException>;

/// Signature of a function under test
pub type TargetFn = dyn Fn(&Arguments) -> CallResult + Send + Sync;

/// Identity of one definition of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefinitionId(Uuid);

impl DefinitionId {
    /// Allocate a fresh identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DefinitionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a function under test
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallableRef {
    /// Identity of the definition
    pub id: DefinitionId,

    /// Owning module name
    pub module: String,

    /// Qualified name within the module (e.g. `Class.method`)
    pub qualname: String,
}

impl CallableRef {
    /// Create a reference with a fresh identity
    pub fn new(module: impl Into<String>, qualname: impl Into<String>) -> Self {
        Self {
            id: DefinitionId::new(),
            module: module.into(),
            qualname: qualname.into(),
        }
    }

    /// Whether both references name the same definition
    pub fn same_definition(&self, other: &CallableRef) -> bool {
        self.id == other.id
    }

    /// The name as it is spelled from outside the owning module
    pub fn qualified_name(&self) -> String {
        format!("{}{}", module_prefix(&self.module), self.qualname)
    }
}

impl fmt::Display for CallableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.qualname)
    }
}

/// Prefix used to reach a module's members from a generated test module.
///
/// The top-level and built-in namespaces need no prefix.
pub fn module_prefix(module: &str) -> String {
    if is_implicit_module(module) {
        String::new()
    } else {
        format!("{}.", module)
    }
}

/// Whether a module never needs an import
pub fn is_implicit_module(module: &str) -> bool {
    module == MAIN_MODULE || module == BUILTINS_MODULE
}

/// Positional and named arguments of one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    /// Positional arguments in call order
    pub positional: Vec<Value>,

    /// Named arguments in the order the caller supplied them
    pub named: Vec<(String, Value)>,
}

impl Arguments {
    /// An empty argument list
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from positional arguments only
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            positional: values.into_iter().collect(),
            named: Vec::new(),
        }
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Append a named argument
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    /// Positional argument by index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Named argument by name
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.named.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Positional argument by index, falling back to a named argument
    pub fn lookup(&self, index: usize, name: &str) -> Option<&Value> {
        self.get(index).or_else(|| self.get_named(name))
    }

    /// Whether no arguments were supplied
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// One frame of a traceback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// File or module the frame belongs to
    pub file: String,

    /// Line number within the file
    pub line: u32,

    /// Function executing in the frame
    pub function: String,
}

impl Frame {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }
}

/// An exception raised by a function under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaisedException {
    /// Module defining the exception type
    pub module: String,

    /// Qualified name of the exception type
    pub qualname: String,

    /// Exception message
    pub message: String,

    /// Traceback frames, outermost first
    #[serde(default)]
    pub frames: Vec<Frame>,
}

impl RaisedException {
    /// Create an exception of a user-defined type
    pub fn new(module: impl Into<String>, qualname: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            qualname: qualname.into(),
            message: String::new(),
            frames: Vec::new(),
        }
    }

    /// Create an exception of a built-in type such as `ValueError`
    pub fn builtin(qualname: impl Into<String>) -> Self {
        Self::new(BUILTINS_MODULE, qualname)
    }

    /// Set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Append a traceback frame
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    /// Exception type name as spelled in generated code
    pub fn type_name(&self) -> String {
        format!("{}{}", module_prefix(&self.module), self.qualname)
    }

    /// Format a traceback, keeping at most `limit` frames
    pub fn format_traceback(&self, limit: usize) -> String {
        let mut out = String::from("Traceback (most recent call last):\n");
        for frame in self.frames.iter().take(limit) {
            out.push_str(&format!(
                "  File \"{}\", line {}, in {}\n",
                frame.file, frame.line, frame.function
            ));
        }
        out.push_str(&self.type_name());
        if !self.message.is_empty() {
            out.push_str(": ");
            out.push_str(&self.message);
        }
        out.push('\n');
        out
    }
}

impl fmt::Display for RaisedException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.type_name())
        } else {
            write!(f, "{}: {}", self.type_name(), self.message)
        }
    }
}

impl std::error::Error for RaisedException {}

/// A function under test together with its reference
#[derive(Clone)]
pub struct Callable {
    reference: CallableRef,
    target: Arc<TargetFn>,
}

impl Callable {
    /// Define a new callable with a fresh identity
    pub fn new<F>(module: impl Into<String>, qualname: impl Into<String>, target: F) -> Self
    where
        F: Fn(&Arguments) -> CallResult + Send + Sync + 'static,
    {
        Self {
            reference: CallableRef::new(module, qualname),
            target: Arc::new(target),
        }
    }

    /// Build from an existing reference and target
    pub fn from_parts(reference: CallableRef, target: Arc<TargetFn>) -> Self {
        Self { reference, target }
    }

    /// The callable's reference
    pub fn reference(&self) -> &CallableRef {
        &self.reference
    }

    /// Invoke the target directly
    pub fn invoke(&self, args: &Arguments) -> CallResult {
        (self.target)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("reference", &self.reference)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_prefix() {
        assert_eq!(module_prefix("mylib"), "mylib.");
        assert_eq!(module_prefix("builtins"), "");
        assert_eq!(module_prefix("__main__"), "");
    }

    #[test]
    fn test_exception_type_name() {
        assert_eq!(RaisedException::builtin("ValueError").type_name(), "ValueError");
        assert_eq!(
            RaisedException::new("mylib", "FibonacciError").type_name(),
            "mylib.FibonacciError"
        );
    }

    #[test]
    fn test_traceback_is_capped() {
        let mut exc = RaisedException::builtin("RecursionError").with_message("too deep");
        for i in 0..20 {
            exc = exc.with_frame(Frame::new("mylib.py", i, "fib"));
        }
        let text = exc.format_traceback(15);
        assert_eq!(text.matches("  File ").count(), 15);
        assert!(text.ends_with("RecursionError: too deep\n"));
    }

    #[test]
    fn test_redefinition_changes_identity() {
        let a = CallableRef::new("mylib", "fib");
        let b = CallableRef::new("mylib", "fib");
        assert!(!a.same_definition(&b));
        assert!(a.same_definition(&a.clone()));
        assert_eq!(a.qualified_name(), "mylib.fib");
    }

    #[test]
    fn test_arguments_lookup() {
        let args = Arguments::new().arg(1).kwarg("verbose", true);
        assert_eq!(args.get(0), Some(&Value::Int(1)));
        assert_eq!(args.lookup(1, "verbose"), Some(&Value::Bool(true)));
        assert!(args.lookup(2, "missing").is_none());
    }
}
