//! Bundle execution
//!
//! [`Harness::execute`] picks the graph's first `js` bundle, prepares the
//! context its entry asset declares, evaluates the bundle, extracts the
//! exported value and drains every microtask and scheduled task before
//! handing back an [`Execution`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use boa_engine::builtins::promise::PromiseState;
use boa_engine::object::builtins::JsPromise;
use boa_engine::{Context, JsString, JsValue, Source};
use tracing::{debug, info};

use crate::config::HarnessConfig;
use crate::context::{self, ExecutionContext, Globals, Target};
use crate::error::{HarnessError, Result, fs, runtime};
use crate::graph::{BundleGraph, BundleView};
use crate::js;
use crate::runtime::{ConsoleMessage, Run, drain};
use crate::vfs::{FileView, normalize_path};

/// Switches for a single execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Extract the export through the bundler conventions; when off the
    /// result is the context's global object
    pub export_convention: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            export_convention: true,
        }
    }
}

impl ExecuteOptions {
    /// Return the raw global object instead of an extracted export
    pub fn raw() -> Self {
        Self {
            export_convention: false,
        }
    }
}

/// Executes bundler output against a virtual file view
#[derive(Clone)]
pub struct Harness {
    files: Arc<dyn FileView>,
    config: Arc<HarnessConfig>,
    host_modules: Arc<BTreeMap<String, String>>,
}

impl Harness {
    pub fn new(files: Arc<dyn FileView>) -> Self {
        Self {
            files,
            config: Arc::new(HarnessConfig::default()),
            host_modules: Arc::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: HarnessConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Provide a CommonJS module for a specifier the file view cannot
    /// satisfy (a core module or an external package)
    #[must_use]
    pub fn with_host_module(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.host_modules).insert(name.into(), source.into());
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn files(&self) -> &Arc<dyn FileView> {
        &self.files
    }

    /// Execute the first `js` bundle of `graph`
    pub async fn execute(
        &self,
        graph: &dyn BundleGraph,
        globals: Globals,
        options: ExecuteOptions,
    ) -> Result<Execution> {
        let bundles = graph.bundles();
        let bundle = bundles
            .iter()
            .copied()
            .find(|bundle| bundle.bundle_type() == "js")
            .ok_or(HarnessError::NoEntryBundle)?;
        self.run_bundle(bundle, globals, options).await
    }

    /// Execute one specific bundle
    pub async fn run_bundle(
        &self,
        bundle: &dyn BundleView,
        globals: Globals,
        options: ExecuteOptions,
    ) -> Result<Execution> {
        let entry = bundle
            .main_entry()
            .ok_or_else(|| HarnessError::MissingMainEntry {
                bundle: bundle.name(),
            })?;
        let target = Target::parse(entry.env_context())?;
        let entry_id = entry.id().to_string();

        let file = normalize_path(bundle.file_path());
        let source = self
            .files
            .read_to_string(&file)
            .await
            .map_err(|e| fs::from_io(&file, &e))?;

        info!(env = %target, bundle = %file.display(), "executing bundle");
        Execution::start(self, target, file, &source, &entry_id, globals, options)
    }
}

/// A finished execution; the engine stays alive for further inspection
pub struct Execution {
    run: Rc<Run>,
    root: ExecutionContext,
    value: JsValue,
    context: Context,
}

impl std::fmt::Debug for Execution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Execution")
            .field("target", &self.root.target())
            .field("file", &self.root.file())
            .finish_non_exhaustive()
    }
}

impl Execution {
    fn start(
        harness: &Harness,
        target: Target,
        file: PathBuf,
        source: &str,
        entry_id: &str,
        globals: Globals,
        options: ExecuteOptions,
    ) -> Result<Self> {
        let run = Rc::new(Run::new(
            harness.files.clone(),
            harness.config.clone(),
            harness.host_modules.clone(),
            globals,
        ));
        let mut context = Context::default();

        let root = match context::prepare(target, &mut context, &run, &file) {
            Ok(root) => root,
            Err(err) => {
                let error = js::thrown_error(&err, &mut context);
                run.release();
                return Err(error);
            }
        };

        // From here on `Drop` releases the run state even on early return
        let mut execution = Self {
            run,
            root,
            value: JsValue::undefined(),
            context,
        };

        if let Err(err) = execution
            .context
            .eval(Source::from_bytes(source.as_bytes()))
        {
            return Err(js::thrown_error(&err, &mut execution.context));
        }

        execution.value = if options.export_convention {
            execution.extract_export(entry_id)?
        } else {
            execution.root.global().clone().into()
        };

        execution.settle()?;
        Ok(execution)
    }

    /// Registry entry point, then the output binding, then `module.exports`,
    /// then the global object
    fn extract_export(&mut self, entry_id: &str) -> Result<JsValue> {
        let context = &mut self.context;
        let global = self.root.global().clone();
        let config = &self.run.config;

        let registry = global
            .get(JsString::from(config.registry_global.as_str()), context)
            .map_err(|err| js::thrown_error(&err, context))?;
        if let Some(require) = registry.as_callable() {
            debug!(registry = %config.registry_global, entry_id, "exporting through module registry");
            return require
                .call(
                    &JsValue::undefined(),
                    &[JsString::from(entry_id).into()],
                    context,
                )
                .map_err(|err| js::thrown_error(&err, context));
        }

        let output = global
            .get(JsString::from(config.output_global.as_str()), context)
            .map_err(|err| js::thrown_error(&err, context))?;
        if !output.is_undefined() {
            debug!(binding = %config.output_global, "exporting output binding");
            return Ok(output);
        }

        let exports = self
            .root
            .module_exports(context)
            .map_err(|err| js::thrown_error(&err, context))?;
        if !exports.is_undefined() {
            return Ok(exports);
        }

        Ok(global.into())
    }

    /// Drain all pending work, then unwrap the value if it is a promise
    fn settle(&mut self) -> Result<()> {
        drain(&mut self.context, &self.run)?;
        self.value = unwrap_promise(self.value.clone(), &mut self.context)?;
        Ok(())
    }

    pub fn target(&self) -> Target {
        self.root.target()
    }

    /// The exported value, resolved if it was a promise
    pub fn value(&self) -> &JsValue {
        &self.value
    }

    /// The exported value as JSON
    pub fn to_json(&mut self) -> Result<serde_json::Value> {
        js::to_json(&self.value, &mut self.context)
    }

    /// One property of the exported value as JSON
    pub fn property(&mut self, name: &str) -> Result<serde_json::Value> {
        let context = &mut self.context;
        let object = self
            .value
            .to_object(context)
            .map_err(|err| js::thrown_error(&err, context))?;
        let value = object
            .get(JsString::from(name), context)
            .map_err(|err| js::thrown_error(&err, context))?;
        js::to_json(&value, context)
    }

    /// Call the exported function with JSON arguments, settle, and return
    /// the result as JSON
    pub fn call(&mut self, args: &[serde_json::Value]) -> Result<serde_json::Value> {
        let callee = self.value.clone();
        self.invoke(&callee, JsValue::undefined(), "export", args)
    }

    /// Call the exported value's `name` method with JSON arguments
    pub fn call_method(&mut self, name: &str, args: &[serde_json::Value]) -> Result<serde_json::Value> {
        let this = self.value.clone();
        let context = &mut self.context;
        let callee = this
            .to_object(context)
            .and_then(|object| object.get(JsString::from(name), context))
            .map_err(|err| js::thrown_error(&err, context))?;
        self.invoke(&callee, this, name, args)
    }

    fn invoke(
        &mut self,
        callee: &JsValue,
        this: JsValue,
        label: &str,
        args: &[serde_json::Value],
    ) -> Result<serde_json::Value> {
        let Some(function) = callee.as_callable().map(|f| f.clone()) else {
            return Err(runtime::execution(
                "TypeError",
                format!("{} is not a function", label),
            ));
        };

        let context = &mut self.context;
        let mut js_args = Vec::with_capacity(args.len());
        for arg in args {
            let value =
                JsValue::from_json(arg, context).map_err(|err| js::thrown_error(&err, context))?;
            js_args.push(value);
        }

        let result = function
            .call(&this, &js_args, context)
            .map_err(|err| js::thrown_error(&err, context))?;

        drain(context, &self.run)?;
        let result = unwrap_promise(result, context)?;
        js::to_json(&result, context)
    }

    /// Evaluate `code` in the entry context, settle, and return the result as
    /// JSON
    pub fn eval(&mut self, code: &str) -> Result<serde_json::Value> {
        let result = self
            .context
            .eval(Source::from_bytes(code.as_bytes()))
            .map_err(|err| js::thrown_error(&err, &mut self.context))?;
        drain(&mut self.context, &self.run)?;
        let result = unwrap_promise(result, &mut self.context)?;
        js::to_json(&result, &mut self.context)
    }

    /// Everything written through `console`, in order
    pub fn console(&self) -> Vec<ConsoleMessage> {
        self.run.console()
    }

    /// Files evaluated through `require`, sorted
    pub fn cached_modules(&self) -> Vec<PathBuf> {
        self.run.cache.borrow().paths()
    }

    /// Own enumerable keys of the exported value
    pub fn keys(&mut self) -> Result<Vec<String>> {
        if self.value.as_object().is_none() {
            return Ok(Vec::new());
        }
        let context = &mut self.context;
        let object_keys = context
            .eval(Source::from_bytes("Object.keys".as_bytes()))
            .map_err(|err| js::thrown_error(&err, context))?;
        let Some(object_keys) = object_keys.as_callable().map(|f| f.clone()) else {
            return Err(runtime::engine("Object.keys is not callable"));
        };
        let keys = object_keys
            .call(&JsValue::undefined(), &[self.value.clone()], context)
            .map_err(|err| js::thrown_error(&err, context))?;
        let keys = js::to_json(&keys, context)?;
        serde_json::from_value(keys).map_err(runtime::engine)
    }

    /// Current virtual time in milliseconds
    pub fn virtual_time(&self) -> u64 {
        self.run.scheduler.borrow().now()
    }

    /// Engine access for inspection beyond the JSON helpers
    pub fn context(&mut self) -> &mut Context {
        &mut self.context
    }
}

impl Drop for Execution {
    fn drop(&mut self) {
        self.run.release();
    }
}

fn unwrap_promise(value: JsValue, context: &mut Context) -> Result<JsValue> {
    let Some(object) = value.as_object().map(|o| o.clone()) else {
        return Ok(value);
    };
    let Ok(promise) = JsPromise::from_object(object) else {
        return Ok(value);
    };

    match promise.state() {
        PromiseState::Fulfilled(value) => Ok(value),
        PromiseState::Rejected(reason) => Err(js::thrown_value_error(&reason, context)),
        PromiseState::Pending => Err(HarnessError::UnsettledPromise),
    }
}
