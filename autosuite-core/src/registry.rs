//! Module registry
//!
//! Stands in for the host's module namespace: functions are defined under a
//! module name and qualified name, and a module registered with a loader can
//! be reloaded, which re-runs the loader and gives every function a fresh
//! [`DefinitionId`](crate::callable::DefinitionId).

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::callable::{Arguments, CallResult, Callable, CallableRef, TargetFn};
use crate::error::{AutosuiteError, Result};
use crate::value::MAIN_MODULE;

static DOTTED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .unwrap_or_else(|e| panic!("dotted name regex: {e}"))
});

/// Check that a module or qualified name is a dotted identifier
pub fn validate_name(name: &str) -> Result<()> {
    if DOTTED_NAME.is_match(name) {
        Ok(())
    } else {
        Err(AutosuiteError::InvalidName(name.to_string()))
    }
}

/// Code that populates a module; re-run on every reload
pub type ModuleLoader = dyn Fn(&mut ModuleBuilder) + Send + Sync;

/// Collects the definitions made by a module loader
pub struct ModuleBuilder {
    module: String,
    functions: Vec<(String, Arc<TargetFn>)>,
}

impl ModuleBuilder {
    fn new(module: &str) -> Self {
        Self {
            module: module.to_string(),
            functions: Vec::new(),
        }
    }

    /// Name of the module being built
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Define a function in the module
    pub fn function<F>(&mut self, qualname: impl Into<String>, target: F) -> &mut Self
    where
        F: Fn(&Arguments) -> CallResult + Send + Sync + 'static,
    {
        self.functions.push((qualname.into(), Arc::new(target)));
        self
    }
}

struct ModuleEntry {
    loader: Option<Arc<ModuleLoader>>,
    functions: BTreeMap<String, Callable>,
    reloads: u64,
}

impl ModuleEntry {
    fn empty() -> Self {
        Self {
            loader: None,
            functions: BTreeMap::new(),
            reloads: 0,
        }
    }

    fn load(&mut self, module: &str) -> Result<()> {
        let Some(loader) = self.loader.clone() else {
            return Ok(());
        };
        let mut builder = ModuleBuilder::new(module);
        loader(&mut builder);

        let mut functions = BTreeMap::new();
        for (qualname, target) in builder.functions {
            validate_name(&qualname)?;
            let reference = CallableRef::new(module, qualname.clone());
            functions.insert(qualname, Callable::from_parts(reference, target));
        }
        self.functions = functions;
        Ok(())
    }
}

/// Namespace of modules and the functions they define
#[derive(Default)]
pub struct ModuleRegistry {
    modules: RwLock<BTreeMap<String, ModuleEntry>>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module backed by a loader and load it.
    ///
    /// Registering an existing name replaces the module.
    pub fn register_module<L>(&self, module: impl Into<String>, loader: L) -> Result<()>
    where
        L: Fn(&mut ModuleBuilder) + Send + Sync + 'static,
    {
        let module = module.into();
        validate_name(&module)?;

        let mut entry = ModuleEntry {
            loader: Some(Arc::new(loader)),
            ..ModuleEntry::empty()
        };
        entry.load(&module)?;

        tracing::debug!(module = %module, functions = entry.functions.len(), "Module registered");
        self.write().insert(module, entry);
        Ok(())
    }

    /// Define (or redefine) a single function.
    ///
    /// Functions defined this way survive reloads of loader-less modules
    /// such as `__main__` but are replaced when a loader-backed module is
    /// reloaded.
    pub fn define<F>(&self, module: &str, qualname: &str, target: F) -> Result<Callable>
    where
        F: Fn(&Arguments) -> CallResult + Send + Sync + 'static,
    {
        validate_name(module)?;
        validate_name(qualname)?;

        let callable = Callable::new(module, qualname, target);
        self.write()
            .entry(module.to_string())
            .or_insert_with(ModuleEntry::empty)
            .functions
            .insert(qualname.to_string(), callable.clone());
        tracing::debug!(function = %callable.reference(), "Function defined");
        Ok(callable)
    }

    /// Define a function in the top-level namespace
    pub fn define_main<F>(&self, qualname: &str, target: F) -> Result<Callable>
    where
        F: Fn(&Arguments) -> CallResult + Send + Sync + 'static,
    {
        self.define(MAIN_MODULE, qualname, target)
    }

    /// Look up the current definition of a function
    pub fn lookup(&self, module: &str, qualname: &str) -> Result<Callable> {
        self.read()
            .get(module)
            .ok_or_else(|| AutosuiteError::NotFound(format!("module {}", module)))?
            .functions
            .get(qualname)
            .cloned()
            .ok_or_else(|| AutosuiteError::NotFound(format!("{}.{}", module, qualname)))
    }

    /// Resolve a name as typed at the top level.
    ///
    /// `module.qualname` is tried against every registered module prefix,
    /// longest first. A bare name is looked up in `__main__` and then in any
    /// module that defines it, as long as exactly one does.
    pub fn resolve(&self, name: &str) -> Result<Callable> {
        let modules = self.read();

        let mut prefixes: Vec<&String> = modules
            .keys()
            .filter(|m| name.len() > m.len() && name.starts_with(m.as_str()) && name[m.len()..].starts_with('.'))
            .collect();
        prefixes.sort_by_key(|m| std::cmp::Reverse(m.len()));
        for module in prefixes {
            if let Some(callable) = modules[module].functions.get(&name[module.len() + 1..]) {
                return Ok(callable.clone());
            }
        }

        if let Some(callable) = modules.get(MAIN_MODULE).and_then(|m| m.functions.get(name)) {
            return Ok(callable.clone());
        }

        let mut found = modules.values().filter_map(|m| m.functions.get(name));
        match (found.next(), found.next()) {
            (Some(callable), None) => Ok(callable.clone()),
            (Some(_), Some(_)) => Err(AutosuiteError::NotFound(format!("{} is ambiguous", name))),
            (None, _) => Err(AutosuiteError::NotFound(name.to_string())),
        }
    }

    /// Reload a module by re-running its loader.
    ///
    /// Modules without a loader keep their current definitions.
    pub fn reload(&self, module: &str) -> Result<()> {
        let mut modules = self.write();
        let entry = modules
            .get_mut(module)
            .ok_or_else(|| AutosuiteError::NotFound(format!("module {}", module)))?;
        entry.load(module)?;
        entry.reloads += 1;
        tracing::debug!(module = %module, reloads = entry.reloads, "Module reloaded");
        Ok(())
    }

    /// How many times a module has been reloaded
    pub fn reload_count(&self, module: &str) -> Option<u64> {
        self.read().get(module).map(|entry| entry.reloads)
    }

    /// Names of all registered modules, sorted
    pub fn modules(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// References of all functions in a module, sorted by name
    pub fn functions(&self, module: &str) -> Vec<CallableRef> {
        self.read()
            .get(module)
            .map(|entry| entry.functions.values().map(|c| c.reference().clone()).collect())
            .unwrap_or_default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, ModuleEntry>> {
        self.modules.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, ModuleEntry>> {
        self.modules.write().unwrap_or_else(PoisonError::into_inner)
    }
}
