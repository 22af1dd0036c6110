//! Recording session
//!
//! A [`Session`] owns the ordered record collection, the console the
//! recorder talks through and the configuration. It is a cheap handle:
//! clones share the same state, so wrappers created from one session all
//! record into it while separate sessions stay independent.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::callable::{Arguments, CallResult, Callable, CallableRef};
use crate::config::AutosuiteConfig;
use crate::console::Console;
use crate::error::{AutosuiteError, Result};
use crate::record::{InvocationRecord, Outcome, Response};
use crate::recorder::Recorded;
use crate::registry::ModuleRegistry;
use crate::render::Literal;
use crate::suite::{SuiteGenerator, SuiteSink};

/// Recording session holding the record collection
#[derive(Clone)]
pub struct Session {
    records: Arc<Mutex<Vec<InvocationRecord>>>,
    console: Arc<Mutex<Console>>,
    config: Arc<AutosuiteConfig>,
    recording: Arc<AtomicBool>,
    next_sequence: Arc<AtomicU64>,
}

impl Session {
    /// Create a session talking through the process's standard streams
    pub fn new(config: AutosuiteConfig) -> Self {
        Self::with_console(config, Console::stdio())
    }

    /// Create a session talking through the given console
    pub fn with_console(config: AutosuiteConfig, console: Console) -> Self {
        let recording = config.recorder.enabled;
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            console: Arc::new(Mutex::new(console)),
            config: Arc::new(config),
            recording: Arc::new(AtomicBool::new(recording)),
            next_sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A session with no input and discarded output.
    ///
    /// Every prompt is answered with a cancel; useful for assembling records
    /// by hand and generating a suite from them.
    pub fn detached() -> Self {
        Self::with_console(
            AutosuiteConfig::default(),
            Console::new(io::empty(), io::sink(), io::sink()),
        )
    }

    /// Session configuration
    pub fn config(&self) -> &AutosuiteConfig {
        &self.config
    }

    /// Wrap a callable so its top-level calls are recorded here
    pub fn wrap(&self, callable: Callable) -> Recorded {
        Recorded::new(callable, self.clone())
    }

    /// Whether wrapped calls are currently recorded
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// Turn recording on or off; wrapped calls pass through while off
    pub fn set_recording(&self, enabled: bool) {
        self.recording.store(enabled, Ordering::SeqCst);
        tracing::debug!(enabled, "Recording switched");
    }

    /// Flip recording and return the new state
    pub fn toggle_recording(&self) -> bool {
        let enabled = !self.recording.fetch_xor(true, Ordering::SeqCst);
        tracing::debug!(enabled, "Recording toggled");
        enabled
    }

    /// Append a finalized record
    ///
    /// # Errors
    ///
    /// Returns an error if the record has no verdict yet or the verdict does
    /// not fit the outcome.
    pub fn append(&self, record: InvocationRecord) -> Result<()> {
        if !record.is_finalized() {
            return Err(AutosuiteError::Other(format!(
                "Record for {} has no verdict matching its outcome",
                record.callable()
            )));
        }
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let record = record.with_sequence(sequence);
        tracing::debug!(
            function = %record.callable(),
            verdict = ?record.verdict(),
            sequence,
            "Record appended"
        );
        self.records().push(record);
        Ok(())
    }

    /// Remove and return the most recent record, if any
    pub fn pop(&self) -> Option<InvocationRecord> {
        let popped = self.records().pop();
        if let Some(record) = &popped {
            tracing::debug!(function = %record.callable(), sequence = record.sequence(), "Record popped");
        }
        popped
    }

    /// Remove every record
    pub fn clear(&self) {
        let mut records = self.records();
        tracing::debug!(count = records.len(), "Records cleared");
        records.clear();
    }

    /// Copy of the records in recording order
    pub fn snapshot(&self) -> Vec<InvocationRecord> {
        self.records().clone()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Point records at a reloaded definition and wrap it.
    ///
    /// The owning module is reloaded, the same qualified name is looked up
    /// again, and every record that referenced the old definition is
    /// replaced by one referencing the new definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the module is unknown or no longer defines the
    /// function.
    pub fn rebind(&self, registry: &ModuleRegistry, old: &CallableRef) -> Result<Recorded> {
        registry.reload(&old.module)?;
        let fresh = registry.lookup(&old.module, &old.qualname)?;

        let mut records = self.records();
        let mut updated = 0usize;
        for slot in records.iter_mut() {
            if slot.callable().same_definition(old) {
                let record = slot.clone().with_callable(fresh.reference().clone());
                *slot = record;
                updated += 1;
            }
        }
        drop(records);

        tracing::debug!(function = %old, updated, "Records rebound to reloaded definition");
        Ok(self.wrap(fresh))
    }

    /// Render the collection as test-module source
    pub fn generate(&self) -> String {
        SuiteGenerator::with_config(self.config.suite.clone()).generate(&self.snapshot())
    }

    /// Write the suite to a sink, or to the configured default.
    ///
    /// Returns `false` when there was nothing to write.
    pub fn write_suite(&self, sink: Option<SuiteSink<'_>>) -> Result<bool> {
        let sink = match sink {
            Some(sink) => sink,
            None => match &self.config.suite.output {
                Some(path) => SuiteSink::Path(path.clone()),
                None => SuiteSink::Stdout,
            },
        };
        SuiteGenerator::with_config(self.config.suite.clone()).write(&self.snapshot(), sink)
    }

    /// Run the interactive part of a top-level call: echo, ask, append
    pub(crate) fn capture(&self, reference: &CallableRef, args: &Arguments, result: &CallResult) {
        let candidate = InvocationRecord::pending(
            reference.clone(),
            args.clone(),
            Outcome::from(result.clone()),
        );

        let response = {
            let mut console = self.console();
            let echoed = match result {
                Ok(value) => console.echo(&value.repr()),
                Err(exception) => console
                    .echo_error(&exception.format_traceback(self.config.recorder.traceback_limit)),
            };
            echoed.and_then(|_| console.ask(&self.config.recorder.prompt))
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(function = %reference, error = %e, "Console failed, discarding call");
                Response::Cancel
            }
        };

        match candidate.resolve(response) {
            Some(record) => {
                if let Err(e) = self.append(record) {
                    tracing::warn!(function = %reference, error = %e, "Record not appended");
                }
            }
            None => tracing::debug!(function = %reference, ?response, "Call discarded"),
        }
    }

    fn records(&self) -> MutexGuard<'_, Vec<InvocationRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn console(&self) -> MutexGuard<'_, Console> {
        self.console.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Direct access to the console, for shells built on the session
    pub fn with_console_io<T>(&self, f: impl FnOnce(&mut Console) -> T) -> T {
        f(&mut self.console())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("records", &self.len())
            .field("recording", &self.is_recording())
            .finish_non_exhaustive()
    }
}
