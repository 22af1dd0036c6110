//! Test-module generation
//!
//! Turns a snapshot of records into the source of a `unittest` module:
//!
//! ```text
//! import unittest
//!
//! import mylib
//!
//! class Tester(unittest.TestCase):
//!     def test_all(self):
//!         self.assertEqual(mylib.fib(10), 55)
//! ```
//!
//! A record that cannot be rendered is left out; the rest of the suite is
//! still generated. When nothing survives the result is the empty string.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use crate::callable::{is_implicit_module, Arguments, CallableRef};
use crate::config::SuiteConfig;
use crate::error::Result;
use crate::record::{InvocationRecord, Outcome, Verdict};
use crate::render::{render_literal, Unrenderable};
use crate::value::Value;

/// Why a record was left out of the generated module
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    /// An argument or expected value has no literal form
    #[error(transparent)]
    Unrenderable(#[from] Unrenderable),

    /// The record never received a verdict
    #[error("Record has no verdict")]
    Pending,

    /// The verdict does not fit the outcome
    #[error("Verdict {0:?} does not match the call outcome")]
    Mismatched(Verdict),
}

/// Where generated source goes
pub enum SuiteSink<'a> {
    /// Print to standard output
    Stdout,
    /// Write the file, replacing any existing content
    Path(PathBuf),
    /// Print to a caller-supplied writer
    Writer(&'a mut dyn Write),
}

/// Render the call expression of a record, e.g. `mylib.fib(10, memo=True)`
pub fn format_call(callable: &CallableRef, arguments: &Arguments) -> std::result::Result<String, Unrenderable> {
    let mut rendered = Vec::with_capacity(arguments.positional.len() + arguments.named.len());
    for value in &arguments.positional {
        rendered.push(render_literal(value)?);
    }
    for (name, value) in &arguments.named {
        rendered.push(format!("{}={}", name, render_literal(value)?));
    }
    Ok(format!("{}({})", callable.qualified_name(), rendered.join(", ")))
}

/// Render one record as an assertion statement.
///
/// Exception records span two lines: the `with` guard and the indented call.
pub fn record_to_assertion(record: &InvocationRecord) -> std::result::Result<String, SkipReason> {
    let call = format_call(record.callable(), record.arguments())?;
    match (record.verdict(), record.outcome()) {
        (Verdict::Unset, _) => Err(SkipReason::Pending),
        (Verdict::RaisesException, Outcome::Raised(exception)) => Ok(format!(
            "with self.assertRaises({}):\n    {}",
            exception.type_name(),
            call
        )),
        (Verdict::Equal, Outcome::Returned(value)) => Ok(format!(
            "self.assertEqual({}, {})",
            call,
            render_literal(value)?
        )),
        (Verdict::NotEqual, Outcome::Returned(value)) => Ok(format!(
            "self.assertNotEqual({}, {})",
            call,
            render_literal(value)?
        )),
        (Verdict::RaisesException, Outcome::Returned(_))
        | (Verdict::Equal, Outcome::Raised(_))
        | (Verdict::NotEqual, Outcome::Raised(_)) => Err(SkipReason::Mismatched(record.verdict())),
    }
}

/// Modules the generated module has to import for these records, sorted.
///
/// Covers each function's module, the module of an expected exception type,
/// and the modules of user-defined objects passed or returned directly.
pub fn generate_imports<'r>(records: impl IntoIterator<Item = &'r InvocationRecord>) -> Vec<String> {
    let mut modules = BTreeSet::new();
    for record in records {
        modules.insert(record.callable().module.as_str());
        match record.outcome() {
            Outcome::Raised(exception) => {
                modules.insert(exception.module.as_str());
            }
            Outcome::Returned(value) => {
                modules.insert(value.module());
            }
        }
        let arguments = record.arguments();
        let values = arguments
            .positional
            .iter()
            .chain(arguments.named.iter().map(|(_, v)| v));
        modules.extend(values.map(Value::module));
    }
    modules
        .into_iter()
        .filter(|m| !is_implicit_module(m))
        .map(str::to_string)
        .collect()
}

/// Builds test-module source from records
#[derive(Debug, Clone, Default)]
pub struct SuiteGenerator {
    config: SuiteConfig,
}

impl SuiteGenerator {
    /// Generator with the default layout (`Tester.test_all`, 8-space indent)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SuiteConfig) -> Self {
        Self { config }
    }

    /// Generate module source, or an empty string when no record renders
    pub fn generate(&self, records: &[InvocationRecord]) -> String {
        let indent = " ".repeat(self.config.indent);
        let mut survivors = Vec::with_capacity(records.len());
        let mut body = String::new();

        for record in records {
            let assertion = match record_to_assertion(record) {
                Ok(assertion) => assertion,
                Err(reason) => {
                    tracing::debug!(
                        function = %record.callable(),
                        sequence = record.sequence(),
                        %reason,
                        "Record skipped"
                    );
                    continue;
                }
            };
            for line in assertion.lines() {
                body.push_str(&indent);
                body.push_str(line);
                body.push('\n');
            }
            survivors.push(record);
        }

        if survivors.is_empty() {
            return String::new();
        }

        let mut source = String::from("import unittest\n\n");
        let imports = generate_imports(survivors.iter().copied());
        if !imports.is_empty() {
            for module in &imports {
                source.push_str(&format!("import {}\n", module));
            }
            source.push('\n');
        }
        source.push_str(&format!(
            "class {}(unittest.TestCase):\n    def {}(self):\n",
            self.config.class_name, self.config.method_name
        ));
        source.push_str(&body);
        source
    }

    /// Generate and write to a sink.
    ///
    /// Files are overwritten with exactly the generated text; stdout and
    /// writers get the text followed by a newline, as if printed. Nothing
    /// is written when no record renders, and `false` is returned.
    pub fn write(&self, records: &[InvocationRecord], sink: SuiteSink<'_>) -> Result<bool> {
        let source = self.generate(records);
        if source.is_empty() {
            return Ok(false);
        }

        match sink {
            SuiteSink::Stdout => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                writeln!(handle, "{}", source)?;
                handle.flush()?;
            }
            SuiteSink::Path(path) => {
                std::fs::write(&path, &source)?;
                tracing::debug!(path = %path.display(), records = records.len(), "Suite written");
            }
            SuiteSink::Writer(writer) => {
                writeln!(writer, "{}", source)?;
                writer.flush()?;
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests;
