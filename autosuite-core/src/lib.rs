//! # autosuite - Regression Tests from Interactive Sessions
//!
//! autosuite records function calls made at the top level of an interactive
//! session, asks whether each result is the expected one, and turns the
//! confirmed calls into a standalone `unittest` module:
//! - Wrapped functions behave exactly like the originals
//! - Only top-level calls prompt; nested and recursive calls pass through
//! - Verdicts become `assertEqual`, `assertNotEqual` or `assertRaises`
//! - Arguments and results are embedded as literals; values without a
//!   literal form drop their record from the output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use autosuite_core::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let registry = ModuleRegistry::new();
//!     registry.register_module("mylib", |m| {
//!         m.function("double", |args| match args.get(0) {
//!             Some(Value::Int(n)) => Ok(Value::Int(n * 2)),
//!             _ => Err(RaisedException::builtin("TypeError")),
//!         });
//!     })?;
//!
//!     let session = Session::new(AutosuiteConfig::load()?);
//!     let double = session.wrap(registry.lookup("mylib", "double")?);
//!
//!     // Echoes `4` and asks for a verdict on stdin
//!     let _ = double.call(&Arguments::new().arg(2));
//!
//!     session.write_suite(None)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`value`] and [`render`]: values and their literal forms
//! - [`callable`] and [`registry`]: functions under test and the module
//!   namespace they live in, including reload
//! - [`record`]: immutable records of judged calls
//! - [`session`] and [`recorder`]: the record collection and the wrapper
//!   that fills it
//! - [`suite`]: the test-module generator

pub mod callable;
pub mod config;
pub mod console;
pub mod error;
pub mod record;
pub mod recorder;
pub mod registry;
pub mod render;
pub mod session;
pub mod suite;
pub mod value;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::callable::{
        Arguments, CallResult, Callable, CallableRef, DefinitionId, Frame, RaisedException,
    };
    pub use crate::config::{AutosuiteConfig, ConfigBuilder, RecorderConfig, SuiteConfig};
    pub use crate::console::{Console, SharedBuffer, SharedInput};
    pub use crate::error::{AutosuiteError, Result};
    pub use crate::record::{InvocationRecord, Outcome, Response, Verdict};
    pub use crate::recorder::{in_wrapped_call, Recorded};
    pub use crate::registry::{ModuleBuilder, ModuleRegistry};
    pub use crate::render::{render_literal, Literal, Unrenderable};
    pub use crate::session::Session;
    pub use crate::suite::{
        format_call, generate_imports, record_to_assertion, SkipReason, SuiteGenerator, SuiteSink,
    };
    pub use crate::value::{Instance, PyObject, Value};
}
