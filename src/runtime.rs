//! Per-execution state shared by every context of one run

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use boa_engine::realm::Realm;
use boa_engine::{Context, JsNativeError, JsObject, JsResult, JsValue, Source};
use tracing::debug;

use crate::config::HarnessConfig;
use crate::context::Globals;
use crate::error::{HarnessError, Result, fs};
use crate::js;
use crate::loader::ModuleCache;
use crate::scheduler::Scheduler;
use crate::vfs::{FileView, FileViewExt};

/// Severity of a console call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

impl ConsoleLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
            ConsoleLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line written through `console`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub text: String,
}

/// Deferred work queued by host bindings
#[derive(Clone)]
pub(crate) enum HostTask {
    /// Call `callback` with `args` (timers, `fs.readFile`)
    Callback {
        callback: JsObject,
        args: Vec<JsValue>,
    },
    /// Evaluate an appended `<script>` in `realm`, then fire its `onload`
    Script {
        element: JsObject,
        path: PathBuf,
        realm: Realm,
    },
}

/// State of one execution, reachable from every native binding it installs
pub(crate) struct Run {
    pub(crate) files: Arc<dyn FileView>,
    pub(crate) config: Arc<HarnessConfig>,
    pub(crate) host_modules: Arc<BTreeMap<String, String>>,
    pub(crate) globals: Globals,
    pub(crate) cache: RefCell<ModuleCache>,
    pub(crate) scheduler: RefCell<Scheduler<HostTask>>,
    console: RefCell<Vec<ConsoleMessage>>,
    require_depth: Cell<usize>,
}

/// Decrements the require depth when a nested evaluation finishes
pub(crate) struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

impl Run {
    pub(crate) fn new(
        files: Arc<dyn FileView>,
        config: Arc<HarnessConfig>,
        host_modules: Arc<BTreeMap<String, String>>,
        globals: Globals,
    ) -> Self {
        Self {
            files,
            config,
            host_modules,
            globals,
            cache: RefCell::new(ModuleCache::default()),
            scheduler: RefCell::new(Scheduler::new()),
            console: RefCell::new(Vec::new()),
            require_depth: Cell::new(0),
        }
    }

    /// Enter one level of nested `require`, failing past the configured limit
    pub(crate) fn enter_require(&self) -> JsResult<DepthGuard<'_>> {
        let depth = self.require_depth.get() + 1;
        if depth > self.config.max_require_depth {
            return Err(JsNativeError::range()
                .with_message(format!(
                    "Maximum require depth of {} exceeded",
                    self.config.max_require_depth
                ))
                .into());
        }
        self.require_depth.set(depth);
        Ok(DepthGuard {
            depth: &self.require_depth,
        })
    }

    pub(crate) fn record_console(&self, level: ConsoleLevel, text: String) {
        self.console.borrow_mut().push(ConsoleMessage { level, text });
    }

    pub(crate) fn console(&self) -> Vec<ConsoleMessage> {
        self.console.borrow().clone()
    }

    /// Drop every engine handle held on the Rust side
    pub(crate) fn release(&self) {
        self.cache.borrow_mut().clear();
        self.scheduler.borrow_mut().clear();
    }
}

/// Run queued microtasks and scheduled tasks until both queues are empty
pub(crate) fn drain(context: &mut Context, run: &Rc<Run>) -> Result<()> {
    loop {
        context.run_jobs();

        let next = run.scheduler.borrow_mut().pop();
        let Some(task) = next else {
            return Ok(());
        };

        if run.scheduler.borrow().executed() > run.config.max_tasks {
            return Err(HarnessError::TaskBudgetExceeded {
                limit: run.config.max_tasks,
            });
        }

        task.run(context, run)?;
    }
}

impl HostTask {
    fn run(self, context: &mut Context, run: &Rc<Run>) -> Result<()> {
        match self {
            HostTask::Callback { callback, args } => {
                callback
                    .call(&JsValue::undefined(), &args, context)
                    .map_err(|err| js::thrown_error(&err, context))?;
            }
            HostTask::Script {
                element,
                path,
                realm,
            } => {
                let source = match run.files.read_string_sync(&path) {
                    Ok(source) => source,
                    Err(err) => {
                        let handler = js::get_callable(&element, "onerror", context)
                            .map_err(|err| js::thrown_error(&err, context))?;
                        let Some(handler) = handler else {
                            return Err(fs::from_io(&path, &err));
                        };
                        let reason = js::io_error(&err, "open", &path, context).to_opaque(context);
                        handler
                            .call(&element.clone().into(), &[reason], context)
                            .map_err(|err| js::thrown_error(&err, context))?;
                        return Ok(());
                    }
                };

                debug!(script = %path.display(), "evaluating appended script");
                let previous = context.enter_realm(realm);
                let outcome = context.eval(Source::from_bytes(source.as_bytes()));
                context.enter_realm(previous);
                outcome.map_err(|err| js::thrown_error(&err, context))?;

                let onload = js::get_callable(&element, "onload", context)
                    .map_err(|err| js::thrown_error(&err, context))?;
                if let Some(onload) = onload {
                    onload
                        .call(&element.clone().into(), &[], context)
                        .map_err(|err| js::thrown_error(&err, context))?;
                }
            }
        }
        Ok(())
    }
}
