//! Execution contexts for bundle code
//!
//! A context is the global environment a bundle (or a required module) is
//! evaluated against. Every context lives in its own engine realm so modules
//! get isolated globals, while objects still flow freely between them.
//!
//! - [`browser`]: DOM facade with simulated `<script>` loading, `fetch`,
//!   `location` and an inert `WebSocket`
//! - [`node`]: CommonJS `module`/`require`, `process`, `__filename`
//! - electron: browser bindings first, then node bindings on top

mod browser;
mod globals;
mod node;
mod shared;

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use boa_engine::{Context, JsObject, JsResult, JsString, JsValue};

use crate::error::{HarnessError, config};
use crate::runtime::Run;

pub use globals::{GlobalValue, Globals};

/// Environment a bundle declares it runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Browser,
    Node,
    Electron,
}

impl Target {
    /// Parse an asset's declared environment context
    pub fn parse(context: &str) -> Result<Self, HarnessError> {
        match context.trim().to_ascii_lowercase().as_str() {
            "browser" | "web-worker" | "service-worker" => Ok(Target::Browser),
            "node" => Ok(Target::Node),
            "electron" | "electron-main" | "electron-renderer" => Ok(Target::Electron),
            _ => Err(config::unknown_target(context)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Browser => "browser",
            Target::Node => "node",
            Target::Electron => "electron",
        }
    }

    fn has_browser(self) -> bool {
        matches!(self, Target::Browser | Target::Electron)
    }

    fn has_node(self) -> bool {
        matches!(self, Target::Node | Target::Electron)
    }
}

impl FromStr for Target {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prepared global environment bound to one file
#[derive(Clone)]
pub struct ExecutionContext {
    target: Target,
    file: PathBuf,
    global: JsObject,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("target", &self.target)
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    pub fn target(&self) -> Target {
        self.target
    }

    /// File the context was prepared for
    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn global(&self) -> &JsObject {
        &self.global
    }

    /// Current `module.exports`, or `undefined` when there is no `module`
    pub(crate) fn module_exports(&self, context: &mut Context) -> JsResult<JsValue> {
        let module = self.global.get(JsString::from("module"), context)?;
        match module.as_object() {
            Some(module) => module.get(JsString::from("exports"), context),
            None => Ok(JsValue::undefined()),
        }
    }

    /// Flag `module.loaded` once evaluation finished
    pub(crate) fn mark_loaded(&self, context: &mut Context) -> JsResult<()> {
        let module = self.global.get(JsString::from("module"), context)?;
        if let Some(module) = module.as_object() {
            module.set(JsString::from("loaded"), true, false, context)?;
        }
        Ok(())
    }
}

/// Install the bindings for `target` into the context's current realm.
///
/// Caller globals are applied last so they override anything installed here.
pub(crate) fn prepare(
    target: Target,
    context: &mut Context,
    run: &Rc<Run>,
    file: &Path,
) -> JsResult<ExecutionContext> {
    let global = context.global_object();

    shared::install(&global, context, run)?;
    if target.has_browser() {
        browser::install(&global, context, run, file)?;
    }
    if target.has_node() {
        node::install(&global, context, run, file)?;
    }
    run.globals.install(&global, context)?;

    Ok(ExecutionContext {
        target,
        file: file.to_path_buf(),
        global,
    })
}
