//! Helpers over the embedded JavaScript engine

use std::path::Path;

use boa_engine::object::FunctionObjectBuilder;
use boa_engine::object::builtins::{JsFunction, JsPromise};
use boa_engine::{Context, JsError, JsNativeError, JsObject, JsResult, JsString, JsValue, NativeFunction};

use crate::error::{HarnessError, runtime};

/// `code` carried by errors for unresolvable specifiers
pub const MODULE_NOT_FOUND: &str = "MODULE_NOT_FOUND";

/// Set `name` on `target`, throwing on failure
pub fn define(
    target: &JsObject,
    name: &str,
    value: impl Into<JsValue>,
    context: &mut Context,
) -> JsResult<()> {
    target.set(JsString::from(name), value, true, context)?;
    Ok(())
}

/// Build a non-constructor function object in the current realm
pub fn function(
    context: &mut Context,
    name: &str,
    length: usize,
    native: NativeFunction,
) -> JsFunction {
    FunctionObjectBuilder::new(context.realm(), native)
        .name(JsString::from(name))
        .length(length)
        .constructor(false)
        .build()
}

/// Read a property as a string; `None` when null or undefined
pub fn get_string(object: &JsObject, key: &str, context: &mut Context) -> JsResult<Option<String>> {
    let value = object.get(JsString::from(key), context)?;
    if value.is_null_or_undefined() {
        return Ok(None);
    }
    Ok(Some(value.to_string(context)?.to_std_string_escaped()))
}

/// Read a property, keeping it only if it is callable
pub fn get_callable(object: &JsObject, key: &str, context: &mut Context) -> JsResult<Option<JsObject>> {
    let value = object.get(JsString::from(key), context)?;
    Ok(value.as_callable().map(|callable| callable.clone()))
}

/// Stringify an argument the way `String(value)` does
pub fn arg_string(value: &JsValue, context: &mut Context) -> JsResult<String> {
    Ok(value.to_string(context)?.to_std_string_escaped())
}

/// A promise already settled with `outcome`
pub fn settled_promise(context: &mut Context, outcome: JsResult<JsValue>) -> JsResult<JsValue> {
    let (promise, resolvers) = JsPromise::new_pending(context);
    match outcome {
        Ok(value) => {
            resolvers
                .resolve
                .call(&JsValue::undefined(), &[value], context)?;
        }
        Err(err) => {
            let reason = err.to_opaque(context);
            resolvers
                .reject
                .call(&JsValue::undefined(), &[reason], context)?;
        }
    }
    Ok(promise.into())
}

/// Error object for an unresolvable specifier, tagged so the top level can
/// tell it apart from ordinary exceptions
pub fn module_not_found(specifier: &str, from: &Path, context: &mut Context) -> JsError {
    let native = JsNativeError::error().with_message(format!(
        "Cannot find module '{}' from '{}'",
        specifier,
        from.display()
    ));
    let value = JsError::from(native).to_opaque(context);
    if let Some(object) = value.as_object() {
        let from = from.display().to_string();
        for (key, field) in [
            ("code", MODULE_NOT_FOUND),
            ("moduleSpecifier", specifier),
            ("requestPath", from.as_str()),
        ] {
            let _ = object.set(JsString::from(key), JsString::from(field), false, context);
        }
    }
    JsError::from_opaque(value)
}

/// Node-style I/O error (`ENOENT`, `EISDIR`, ...) for a failed file operation
pub fn io_error(err: &std::io::Error, syscall: &str, path: &Path, context: &mut Context) -> JsError {
    let code = match err.kind() {
        std::io::ErrorKind::NotFound => "ENOENT",
        std::io::ErrorKind::PermissionDenied => "EACCES",
        _ => "EIO",
    };
    let native = JsNativeError::error().with_message(format!(
        "{}: {}, {} '{}'",
        code,
        err,
        syscall,
        path.display()
    ));
    let value = JsError::from(native).to_opaque(context);
    if let Some(object) = value.as_object() {
        let _ = object.set(JsString::from("code"), JsString::from(code), false, context);
        let _ = object.set(JsString::from("syscall"), JsString::from(syscall), false, context);
        let _ = object.set(
            JsString::from("path"),
            JsString::from(path.display().to_string()),
            false,
            context,
        );
    }
    JsError::from_opaque(value)
}

/// Classify an error raised by executed code
pub fn thrown_error(err: &JsError, context: &mut Context) -> HarnessError {
    if let Some(native) = err.as_native() {
        return runtime::execution(native.kind.to_string(), native.message());
    }
    let value = err.to_opaque(context);
    thrown_value_error(&value, context)
}

/// Classify a thrown (or rejected) JavaScript value
pub fn thrown_value_error(value: &JsValue, context: &mut Context) -> HarnessError {
    let json = snapshot(value, context);
    let (mut name, mut message, mut code, mut stack) = (None, None, None, None);

    if let Some(object) = value.as_object() {
        let mut field = |key: &str| get_string(object, key, context).ok().flatten();

        code = field("code");
        if code.as_deref() == Some(MODULE_NOT_FOUND) {
            return runtime::module_not_found(
                field("moduleSpecifier").unwrap_or_default(),
                field("requestPath").unwrap_or_default(),
            );
        }
        stack = field("stack");
        name = field("name");
        message = field("message");
    }

    if name.is_some() || message.is_some() {
        return runtime::thrown(
            name.unwrap_or_else(|| "Error".to_string()),
            message.unwrap_or_default(),
            code,
            stack,
            json,
        );
    }

    let text = value
        .to_string(context)
        .map(|s| s.to_std_string_escaped())
        .unwrap_or_else(|_| value.display().to_string());
    runtime::thrown("Uncaught", text, code, stack, json)
}

/// JSON copy of a thrown value; `null` when it cannot be represented
fn snapshot(value: &JsValue, context: &mut Context) -> serde_json::Value {
    if value.is_undefined() {
        return serde_json::Value::Null;
    }
    value.to_json(context).unwrap_or(serde_json::Value::Null)
}

/// Convert a result value to JSON; `undefined` maps to `null`
pub fn to_json(value: &JsValue, context: &mut Context) -> crate::error::Result<serde_json::Value> {
    if value.is_undefined() {
        return Ok(serde_json::Value::Null);
    }
    value
        .to_json(context)
        .map_err(|err| thrown_error(&err, context))
}
