//! Browser bindings: a DOM facade just large enough for bundler runtimes

use std::path::{Path, PathBuf};
use std::rc::Rc;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use boa_engine::object::ObjectInitializer;
use boa_engine::object::builtins::{JsArray, JsArrayBuffer};
use boa_engine::property::Attribute;
use boa_engine::realm::Realm;
use boa_engine::{
    Context, JsArgs, JsNativeError, JsObject, JsResult, JsString, JsValue, NativeFunction, Source,
};
use boa_gc::{Finalize, Trace, custom_trace, empty_trace};
use tracing::debug;

use crate::graph::base_name;
use crate::js;
use crate::runtime::{HostTask, Run};
use crate::vfs::{self, FileViewExt};

/// `atob` accepts input with or without trailing padding
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const WEBSOCKET: &str = r#"
(function () {
  function WebSocket(url, protocols) {
    if (!(this instanceof WebSocket)) {
      throw new TypeError("Failed to construct 'WebSocket': Please use the 'new' operator");
    }
    this.url = String(url);
    this.protocol = typeof protocols === 'string' ? protocols : '';
    this.readyState = WebSocket.CONNECTING;
    this.sent = [];
    this.listeners = {};
  }
  WebSocket.CONNECTING = 0;
  WebSocket.OPEN = 1;
  WebSocket.CLOSING = 2;
  WebSocket.CLOSED = 3;
  WebSocket.prototype.send = function (data) {
    this.sent.push(data);
  };
  WebSocket.prototype.close = function () {
    this.readyState = WebSocket.CLOSED;
  };
  WebSocket.prototype.addEventListener = function (type, listener) {
    (this.listeners[type] = this.listeners[type] || []).push(listener);
  };
  WebSocket.prototype.removeEventListener = function (type, listener) {
    var list = this.listeners[type] || [];
    var index = list.indexOf(listener);
    if (index !== -1) list.splice(index, 1);
  };
  return WebSocket;
})()
"#;

#[derive(Finalize)]
struct HeadCapture {
    run: Rc<Run>,
    dir: PathBuf,
    realm: Realm,
}

unsafe impl Trace for HeadCapture {
    custom_trace!(this, mark, {
        mark(&this.realm);
    });
}

#[derive(Finalize)]
struct ObjectCapture {
    object: JsObject,
}

unsafe impl Trace for ObjectCapture {
    custom_trace!(this, mark, {
        mark(&this.object);
    });
}

#[derive(Finalize)]
struct FileCapture {
    run: Rc<Run>,
    path: PathBuf,
}

unsafe impl Trace for FileCapture {
    empty_trace!();
}

pub(super) fn install(
    global: &JsObject,
    context: &mut Context,
    run: &Rc<Run>,
    file: &Path,
) -> JsResult<()> {
    let dir = vfs::dirname(file);

    let exports = ObjectInitializer::new(context).build();
    let module = ObjectInitializer::new(context)
        .property(JsString::from("exports"), exports.clone(), Attribute::all())
        .build();
    js::define(global, "exports", exports, context)?;
    js::define(global, "module", module, context)?;

    let document = document(context, run, &dir)?;
    js::define(global, "document", document, context)?;

    let location = location(context, &run.config.origin, file);
    js::define(global, "location", location, context)?;

    let fetch = js::function(
        context,
        "fetch",
        1,
        NativeFunction::from_copy_closure_with_captures(
            fetch,
            FileCapture {
                run: run.clone(),
                path: dir,
            },
        ),
    );
    js::define(global, "fetch", fetch, context)?;

    let websocket = context.eval(Source::from_bytes(WEBSOCKET.as_bytes()))?;
    js::define(global, "WebSocket", websocket, context)?;

    let atob = js::function(context, "atob", 1, NativeFunction::from_fn_ptr(atob));
    js::define(global, "atob", atob, context)?;
    let btoa = js::function(context, "btoa", 1, NativeFunction::from_fn_ptr(btoa));
    js::define(global, "btoa", btoa, context)?;

    js::define(global, "window", global.clone(), context)?;
    js::define(global, "self", global.clone(), context)?;
    Ok(())
}

fn document(context: &mut Context, run: &Rc<Run>, dir: &Path) -> JsResult<JsObject> {
    let children = JsArray::new(context);
    let append_child = NativeFunction::from_copy_closure_with_captures(
        head_append_child,
        HeadCapture {
            run: run.clone(),
            dir: dir.to_path_buf(),
            realm: context.realm().clone(),
        },
    );
    let head = ObjectInitializer::new(context)
        .property(JsString::from("tagName"), JsString::from("HEAD"), Attribute::all())
        .property(JsString::from("children"), children, Attribute::all())
        .function(append_child, JsString::from("appendChild"), 1)
        .build();

    let placeholder = ObjectInitializer::new(context)
        .function(NativeFunction::from_fn_ptr(noop), JsString::from("remove"), 0)
        .build();

    let body = ObjectInitializer::new(context)
        .property(JsString::from("tagName"), JsString::from("BODY"), Attribute::all())
        .function(NativeFunction::from_fn_ptr(null), JsString::from("appendChild"), 1)
        .build();

    let get_elements_by_tag_name = NativeFunction::from_copy_closure_with_captures(
        |_this: &JsValue, _args: &[JsValue], captures: &ObjectCapture, context: &mut Context| {
            let head = JsValue::from(captures.object.clone());
            Ok(JsArray::from_iter([head], context).into())
        },
        ObjectCapture {
            object: head.clone(),
        },
    );
    let get_element_by_id = NativeFunction::from_copy_closure_with_captures(
        |_this: &JsValue, _args: &[JsValue], captures: &ObjectCapture, _context: &mut Context| {
            Ok(captures.object.clone().into())
        },
        ObjectCapture {
            object: placeholder,
        },
    );

    Ok(ObjectInitializer::new(context)
        .property(JsString::from("head"), head, Attribute::all())
        .property(JsString::from("body"), body, Attribute::all())
        .function(
            NativeFunction::from_fn_ptr(create_element),
            JsString::from("createElement"),
            1,
        )
        .function(
            get_elements_by_tag_name,
            JsString::from("getElementsByTagName"),
            1,
        )
        .function(get_element_by_id, JsString::from("getElementById"), 1)
        .build())
}

fn location(context: &mut Context, origin: &str, file: &Path) -> JsObject {
    let origin = origin.trim_end_matches('/');
    let (protocol, host) = origin.split_once("://").unwrap_or(("http", origin));
    let hostname = host.split(':').next().unwrap_or(host);
    let href = format!("{}/{}", origin, base_name(file));

    ObjectInitializer::new(context)
        .property(JsString::from("origin"), JsString::from(origin), Attribute::all())
        .property(
            JsString::from("protocol"),
            JsString::from(format!("{}:", protocol)),
            Attribute::all(),
        )
        .property(JsString::from("host"), JsString::from(host), Attribute::all())
        .property(JsString::from("hostname"), JsString::from(hostname), Attribute::all())
        .property(JsString::from("href"), JsString::from(href), Attribute::all())
        .build()
}

fn noop(_this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::undefined())
}

fn null(_this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::null())
}

fn create_element(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let tag = js::arg_string(args.get_or_undefined(0), context)?;
    let element = ObjectInitializer::new(context)
        .property(JsString::from("tag"), JsString::from(tag.as_str()), Attribute::all())
        .property(
            JsString::from("tagName"),
            JsString::from(tag.to_ascii_uppercase()),
            Attribute::all(),
        )
        .build();
    Ok(element.into())
}

/// Record the child; scripts load on a later task, everything else fires
/// `onload` right away
fn head_append_child(
    this: &JsValue,
    args: &[JsValue],
    captures: &HeadCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let child = args.get_or_undefined(0).clone();
    let Some(element) = child.as_object().map(|object| object.clone()) else {
        return Err(JsNativeError::typ()
            .with_message("Failed to execute 'appendChild': parameter 1 is not of type 'Node'")
            .into());
    };

    if let Some(head) = this.as_object() {
        let children = head.get(JsString::from("children"), context)?;
        if let Some(children) = children.as_object() {
            JsArray::from_object(children.clone())?.push(child.clone(), context)?;
        }
    }

    let tag = js::get_string(&element, "tag", context)?.unwrap_or_default();
    if tag.eq_ignore_ascii_case("script") {
        let src = js::get_string(&element, "src", context)?.unwrap_or_default();
        let path = vfs::join_virtual(&captures.dir, url_path(&src));
        debug!(script = %path.display(), "scheduling script load");
        captures.run.scheduler.borrow_mut().schedule(
            0,
            HostTask::Script {
                element,
                path,
                realm: captures.realm.clone(),
            },
        );
    } else if let Some(onload) = js::get_callable(&element, "onload", context)? {
        onload.call(&child, &[], context)?;
    }

    Ok(child)
}

/// Path portion of a script or fetch URL, without query or fragment
fn url_path(url: &str) -> &str {
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |index| &rest[index..]),
        None => url,
    };
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

fn fetch(
    _this: &JsValue,
    args: &[JsValue],
    captures: &FileCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let url = js::arg_string(args.get_or_undefined(0), context)?;
    let path = vfs::join_virtual(&captures.path, url_path(&url));
    debug!(url = %url, path = %path.display(), "fetch");

    let capture = || FileCapture {
        run: captures.run.clone(),
        path: path.clone(),
    };
    let response = ObjectInitializer::new(context)
        .property(JsString::from("url"), JsString::from(url.as_str()), Attribute::all())
        .function(
            NativeFunction::from_copy_closure_with_captures(response_text, capture()),
            JsString::from("text"),
            0,
        )
        .function(
            NativeFunction::from_copy_closure_with_captures(response_array_buffer, capture()),
            JsString::from("arrayBuffer"),
            0,
        )
        .build();

    js::settled_promise(context, Ok(response.into()))
}

fn response_text(
    _this: &JsValue,
    _args: &[JsValue],
    captures: &FileCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let outcome = match captures.run.files.read_string_sync(&captures.path) {
        Ok(text) => Ok(JsString::from(text).into()),
        Err(err) => Err(js::io_error(&err, "open", &captures.path, context)),
    };
    js::settled_promise(context, outcome)
}

fn response_array_buffer(
    _this: &JsValue,
    _args: &[JsValue],
    captures: &FileCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let outcome = match captures.run.files.read_sync(&captures.path) {
        Ok(bytes) => JsArrayBuffer::from_byte_block(bytes, context).map(JsValue::from),
        Err(err) => Err(js::io_error(&err, "open", &captures.path, context)),
    };
    js::settled_promise(context, outcome)
}

fn btoa(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let text = js::arg_string(args.get_or_undefined(0), context)?;
    let mut bytes = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let code = u32::from(ch);
        if code > 0xFF {
            return Err(JsNativeError::error()
                .with_message("Invalid character: the string contains characters outside of the Latin1 range")
                .into());
        }
        bytes.push(code as u8);
    }
    Ok(JsString::from(STANDARD.encode(bytes)).into())
}

fn atob(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let encoded: String = js::arg_string(args.get_or_undefined(0), context)?
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    let bytes = LENIENT.decode(encoded.as_bytes()).map_err(|_| {
        JsNativeError::error().with_message("Invalid character: the string is not correctly encoded")
    })?;
    let text: String = bytes.into_iter().map(char::from).collect();
    Ok(JsString::from(text).into())
}
