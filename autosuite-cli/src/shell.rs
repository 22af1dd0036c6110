//! Interactive shell
//!
//! Reads one line at a time from the session console. Calls are resolved
//! against the module registry, wrapped in the session and invoked, so
//! every top-level call goes through the verdict prompt while recording is
//! on. Lines starting with `:` are shell commands.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use autosuite_core::prelude::*;

use crate::parse::parse_call;

const PROMPT: &str = ">>> ";

const HELP: &str = "\
Calls:      name(arg, ..., key=value) e.g. fib(10) or mylib.reverse('abc')
Commands:
  :suite [PATH]  write the test module (to PATH, the configured output or here)
  :list          show recorded calls
  :pop           drop the most recent record
  :clear         drop every record
  :reload NAME   reload the module defining NAME and rebind its records
  :on / :off     start or stop recording
  :toggle        flip recording
  :help          show this text
  :quit          leave the shell";

/// Whether the shell keeps reading after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A shell over a session and a module namespace
pub struct Shell {
    session: Session,
    registry: ModuleRegistry,
    wrapped: HashMap<String, Recorded>,
}

impl Shell {
    pub fn new(session: Session, registry: ModuleRegistry) -> Self {
        Self {
            session,
            registry,
            wrapped: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Read and execute lines until `:quit` or end of input
    pub fn run(&mut self) -> Result<()> {
        tracing::info!(recording = self.session.is_recording(), "Shell started");
        loop {
            self.session.with_console_io(|c| c.write(PROMPT))?;
            let Some(line) = self.session.with_console_io(|c| c.read_line())? else {
                self.say("")?;
                break;
            };
            if self.execute(line.trim())? == Flow::Quit {
                break;
            }
        }
        tracing::info!(records = self.session.len(), "Shell finished");
        Ok(())
    }

    /// Execute a single line
    pub fn execute(&mut self, line: &str) -> Result<Flow> {
        if line.is_empty() || line.starts_with('#') {
            return Ok(Flow::Continue);
        }
        match line.strip_prefix(':') {
            Some(command) => self.command(command),
            None => {
                self.call(line)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn call(&mut self, line: &str) -> Result<()> {
        let expr = match parse_call(line) {
            Ok(expr) => expr,
            Err(e) => return self.complain(&format!("SyntaxError: {}", e)),
        };
        let recorded = match self.wrapped_for(&expr.name) {
            Ok(recorded) => recorded,
            Err(e) => return self.complain(&format!("NameError: {}", e)),
        };

        let recording = self.session.is_recording();
        let result = recorded.call(&expr.args);

        // A recorded call has already echoed its result
        if !recording {
            match result {
                Ok(value) => self.say(&value.repr())?,
                Err(exception) => {
                    let limit = self.session.config().recorder.traceback_limit;
                    let traceback = exception.format_traceback(limit);
                    self.session.with_console_io(|c| c.echo_error(&traceback))?;
                }
            }
        }
        Ok(())
    }

    /// Wrapper for the current definition behind a name, created once
    fn wrapped_for(&mut self, name: &str) -> autosuite_core::error::Result<Recorded> {
        let callable = self.registry.resolve(name)?;
        let key = callable.reference().qualified_name();
        let recorded = self
            .wrapped
            .entry(key)
            .or_insert_with(|| self.session.wrap(callable.clone()));
        if !recorded.reference().same_definition(callable.reference()) {
            *recorded = self.session.wrap(callable);
        }
        Ok(recorded.clone())
    }

    fn command(&mut self, command: &str) -> Result<Flow> {
        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };

        match name {
            "quit" | "q" | "exit" => return Ok(Flow::Quit),
            "help" | "h" => self.say(HELP)?,
            "on" => {
                self.session.set_recording(true);
                self.say("Recording on")?;
            }
            "off" => {
                self.session.set_recording(false);
                self.say("Recording off")?;
            }
            "toggle" => {
                let enabled = self.session.toggle_recording();
                self.say(if enabled { "Recording on" } else { "Recording off" })?;
            }
            "pop" => match self.session.pop() {
                Some(record) => self.say(&format!("Dropped {}", describe(&record)))?,
                None => self.say("No records")?,
            },
            "clear" => {
                let count = self.session.len();
                self.session.clear();
                self.say(&format!("Dropped {} record(s)", count))?;
            }
            "list" => self.list()?,
            "suite" => self.suite(rest)?,
            "reload" if !rest.is_empty() => self.reload(rest)?,
            "reload" => self.complain("usage: :reload NAME")?,
            other => self.complain(&format!("Unknown command :{} (try :help)", other))?,
        }
        Ok(Flow::Continue)
    }

    fn list(&self) -> Result<()> {
        let records = self.session.snapshot();
        if records.is_empty() {
            return self.say("No records");
        }
        for record in &records {
            self.say(&format!("[{}] {}", record.sequence(), describe(record)))?;
        }
        Ok(())
    }

    fn suite(&self, path: &str) -> Result<()> {
        let written = if !path.is_empty() {
            self.session.write_suite(Some(SuiteSink::Path(PathBuf::from(path))))?
        } else if let Some(output) = &self.session.config().suite.output {
            self.session.write_suite(Some(SuiteSink::Path(output.clone())))?
        } else {
            let source = self.session.generate();
            if !source.is_empty() {
                self.say(&source)?;
            }
            !source.is_empty()
        };

        if !written {
            self.say("Nothing to write")?;
        } else if !path.is_empty() || self.session.config().suite.output.is_some() {
            self.say("Suite written")?;
        }
        Ok(())
    }

    fn reload(&mut self, name: &str) -> Result<()> {
        let old = match self.registry.resolve(name) {
            Ok(callable) => callable.reference().clone(),
            Err(e) => return self.complain(&format!("NameError: {}", e)),
        };
        let rebound = match self.session.rebind(&self.registry, &old) {
            Ok(rebound) => rebound,
            Err(e) => return self.complain(&format!("ImportError: {}", e)),
        };

        // Wrappers for other functions of the module now point at stale
        // definitions and are re-created on next use.
        self.wrapped.retain(|_, recorded| recorded.reference().module != old.module);
        self.wrapped.insert(old.qualified_name(), rebound);
        self.say(&format!("Reloaded {}", old.module))
    }

    fn say(&self, text: &str) -> Result<()> {
        self.session.with_console_io(|c| c.echo(text))?;
        Ok(())
    }

    fn complain(&self, text: &str) -> Result<()> {
        self.session.with_console_io(|c| c.echo_error(&format!("{}\n", text)))?;
        Ok(())
    }
}

fn describe(record: &InvocationRecord) -> String {
    let call = format_call(record.callable(), record.arguments()).unwrap_or_else(|e| e.to_string());
    match record.outcome() {
        Outcome::Returned(value) => format!("{:?} {} -> {}", record.verdict(), call, value.repr()),
        Outcome::Raised(exception) => format!("{:?} {} raises {}", record.verdict(), call, exception.type_name()),
    }
}
