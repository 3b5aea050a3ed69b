//! CommonJS `require` for node contexts
//!
//! Resolution runs against the virtual file view. Each resolved file is
//! evaluated once per run, in a fresh node context of its own, and shared
//! through [`ModuleCache`]. `fs` is served by an in-harness shim; other core
//! modules and unresolved bare names are looked up among the host modules.

mod cache;
mod fs_shim;
mod resolve;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use boa_engine::object::builtins::JsFunction;
use boa_engine::{Context, JsArgs, JsNativeError, JsResult, JsString, JsValue, NativeFunction, Source};
use boa_gc::{Finalize, Trace, empty_trace};
use tracing::debug;

use crate::context::{self, Target};
use crate::js;
use crate::runtime::Run;
use crate::vfs::{self, FileViewExt, has_json_extension};

pub(crate) use cache::ModuleCache;
pub(crate) use resolve::{Resolution, Resolver};

/// Sources of host modules available without registration
const BUILTIN_HOST_MODULES: &[(&str, &str)] = &[("path", include_str!("path.js"))];

/// Directory host modules pretend to live in
const HOST_MODULE_DIR: &str = "/__host__";

#[derive(Finalize)]
struct RequireCapture {
    run: Rc<Run>,
    file: PathBuf,
}

unsafe impl Trace for RequireCapture {
    empty_trace!();
}

/// Build the `require` function bound to `file`, with `require.resolve`
pub(crate) fn require_function(
    context: &mut Context,
    run: &Rc<Run>,
    file: &Path,
) -> JsResult<JsFunction> {
    let capture = || RequireCapture {
        run: run.clone(),
        file: file.to_path_buf(),
    };

    let require = js::function(
        context,
        "require",
        1,
        NativeFunction::from_copy_closure_with_captures(require_native, capture()),
    );
    let resolve = js::function(
        context,
        "resolve",
        1,
        NativeFunction::from_copy_closure_with_captures(resolve_native, capture()),
    );
    require.set(JsString::from("resolve"), resolve, false, context)?;
    Ok(require)
}

fn require_native(
    _this: &JsValue,
    args: &[JsValue],
    captures: &RequireCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let specifier = specifier_arg(args, context)?;
    require(context, &captures.run, &captures.file, &specifier)
}

fn resolve_native(
    _this: &JsValue,
    args: &[JsValue],
    captures: &RequireCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let specifier = specifier_arg(args, context)?;
    let from = vfs::dirname(&captures.file);
    match Resolver::new(captures.run.files.as_ref(), &captures.run.config).resolve(&specifier, &from) {
        Some(Resolution::File(path)) => Ok(JsString::from(path.display().to_string()).into()),
        Some(Resolution::Host(name)) => Ok(JsString::from(name).into()),
        None => Err(js::module_not_found(&specifier, &from, context)),
    }
}

fn specifier_arg(args: &[JsValue], context: &mut Context) -> JsResult<String> {
    let value = args.get_or_undefined(0);
    if !value.is_string() {
        return Err(JsNativeError::typ()
            .with_message("The \"id\" argument must be of type string")
            .into());
    }
    js::arg_string(value, context)
}

/// Load `specifier` as required from `file` and return its exports
pub(crate) fn require(
    context: &mut Context,
    run: &Rc<Run>,
    file: &Path,
    specifier: &str,
) -> JsResult<JsValue> {
    let from = vfs::dirname(file);
    match Resolver::new(run.files.as_ref(), &run.config).resolve(specifier, &from) {
        Some(Resolution::File(path)) => load_file(context, run, &path),
        Some(Resolution::Host(name)) => load_host(context, run, &name, specifier, &from),
        None => Err(js::module_not_found(specifier, &from, context)),
    }
}

fn load_file(context: &mut Context, run: &Rc<Run>, path: &Path) -> JsResult<JsValue> {
    let cached = run.cache.borrow().get(path).cloned();
    if let Some(module) = cached {
        debug!(module = %path.display(), "module cache hit");
        return module.module_exports(context);
    }

    let _depth = run.enter_require()?;
    let source = run
        .files
        .read_string_sync(path)
        .map_err(|err| js::io_error(&err, "open", path, context))?;

    debug!(module = %path.display(), "evaluating module");
    evaluate_isolated(context, |context| {
        let module = context::prepare(Target::Node, context, run, path)?;
        run.cache.borrow_mut().insert(path.to_path_buf(), module.clone());

        let outcome = if has_json_extension(path) {
            set_json_exports(&module, &source, path, context)
        } else {
            context
                .eval(Source::from_bytes(source.as_bytes()))
                .map(|_| ())
        };
        if let Err(err) = outcome {
            run.cache.borrow_mut().remove(path);
            return Err(err);
        }

        module.mark_loaded(context)?;
        module.module_exports(context)
    })
}

fn set_json_exports(
    module: &context::ExecutionContext,
    source: &str,
    path: &Path,
    context: &mut Context,
) -> JsResult<()> {
    let json: serde_json::Value = serde_json::from_str(source).map_err(|e| {
        JsNativeError::syntax().with_message(format!("{}: {}", path.display(), e))
    })?;
    let value = JsValue::from_json(&json, context)?;
    let module_object = module.global().get(JsString::from("module"), context)?;
    if let Some(module_object) = module_object.as_object() {
        module_object.set(JsString::from("exports"), value, true, context)?;
    }
    Ok(())
}

fn load_host(
    context: &mut Context,
    run: &Rc<Run>,
    name: &str,
    specifier: &str,
    from: &Path,
) -> JsResult<JsValue> {
    if let Some(exports) = run.cache.borrow().host(name) {
        return Ok(exports);
    }

    let exports = if name == "fs" {
        fs_shim::build(context, run).into()
    } else {
        let source = run
            .host_modules
            .get(name)
            .map(String::as_str)
            .or_else(|| {
                BUILTIN_HOST_MODULES
                    .iter()
                    .find(|(builtin, _)| *builtin == name)
                    .map(|(_, source)| *source)
            });
        let Some(source) = source else {
            return Err(js::module_not_found(specifier, from, context));
        };

        let _depth = run.enter_require()?;
        let path = Path::new(HOST_MODULE_DIR).join(format!("{}.js", name));
        debug!(module = name, "evaluating host module");
        evaluate_isolated(context, |context| {
            let module = context::prepare(Target::Node, context, run, &path)?;
            context.eval(Source::from_bytes(source.as_bytes()))?;
            module.mark_loaded(context)?;
            module.module_exports(context)
        })?
    };

    run.cache.borrow_mut().insert_host(name, exports.clone());
    Ok(exports)
}

/// Run `evaluate` inside a fresh realm, restoring the caller's realm after
fn evaluate_isolated<T>(
    context: &mut Context,
    evaluate: impl FnOnce(&mut Context) -> JsResult<T>,
) -> JsResult<T> {
    let realm = context.create_realm()?;
    let previous = context.enter_realm(realm);
    let outcome = evaluate(context);
    context.enter_realm(previous);
    outcome
}
