//! Node bindings: CommonJS module scope and a minimal `process`

use std::path::Path;
use std::rc::Rc;

use boa_engine::object::ObjectInitializer;
use boa_engine::object::builtins::JsArray;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsNativeError, JsObject, JsResult, JsString, JsValue, NativeFunction, Source};

use crate::js;
use crate::loader;
use crate::runtime::Run;
use crate::vfs;

/// Reported as `process.version`
const NODE_VERSION: &str = "v20.0.0";

/// Working directory seen by bundle code
const CWD: &str = "/";

const NEXT_TICK: &str = r#"
(function nextTick(callback) {
  if (typeof callback !== 'function') {
    throw new TypeError('The "callback" argument must be of type function');
  }
  var args = Array.prototype.slice.call(arguments, 1);
  Promise.resolve().then(function () {
    callback.apply(undefined, args);
  });
})
"#;

pub(super) fn install(
    global: &JsObject,
    context: &mut Context,
    run: &Rc<Run>,
    file: &Path,
) -> JsResult<()> {
    let filename = file.display().to_string();
    let dirname = vfs::dirname(file).display().to_string();

    let require = loader::require_function(context, run, file)?;
    let exports = ObjectInitializer::new(context).build();
    let module = ObjectInitializer::new(context)
        .property(JsString::from("exports"), exports.clone(), Attribute::all())
        .property(JsString::from("require"), require.clone(), Attribute::all())
        .property(JsString::from("id"), JsString::from(filename.as_str()), Attribute::all())
        .property(
            JsString::from("filename"),
            JsString::from(filename.as_str()),
            Attribute::all(),
        )
        .property(JsString::from("loaded"), false, Attribute::all())
        .build();

    js::define(global, "module", module, context)?;
    js::define(global, "exports", exports, context)?;
    js::define(global, "require", require, context)?;
    js::define(global, "__filename", JsString::from(filename.as_str()), context)?;
    js::define(global, "__dirname", JsString::from(dirname), context)?;

    let process = process(context, run, &filename)?;
    js::define(global, "process", process, context)?;
    js::define(global, "global", global.clone(), context)?;
    js::define(global, "globalThis", global.clone(), context)?;
    Ok(())
}

fn process(context: &mut Context, run: &Rc<Run>, filename: &str) -> JsResult<JsObject> {
    let env = serde_json::to_value(&run.config.process_env)
        .map_err(|e| JsNativeError::error().with_message(e.to_string()))?;
    let env = JsValue::from_json(&env, context)?;

    let argv = JsArray::from_iter(
        [
            JsValue::from(JsString::from("node")),
            JsValue::from(JsString::from(filename)),
        ],
        context,
    );
    let next_tick = context.eval(Source::from_bytes(NEXT_TICK.as_bytes()))?;

    Ok(ObjectInitializer::new(context)
        .property(JsString::from("env"), env, Attribute::all())
        .property(JsString::from("argv"), argv, Attribute::all())
        .property(
            JsString::from("platform"),
            JsString::from(std::env::consts::OS),
            Attribute::all(),
        )
        .property(JsString::from("version"), JsString::from(NODE_VERSION), Attribute::all())
        .property(JsString::from("browser"), false, Attribute::all())
        .property(JsString::from("nextTick"), next_tick, Attribute::all())
        .function(NativeFunction::from_fn_ptr(cwd), JsString::from("cwd"), 0)
        .build())
}

fn cwd(_this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsString::from(CWD).into())
}
