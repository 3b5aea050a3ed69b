//! The `fs` module seen by bundle code: reads served from the file view

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use boa_engine::object::ObjectInitializer;
use boa_engine::object::builtins::{JsArrayBuffer, JsUint8Array};
use boa_engine::{Context, JsArgs, JsError, JsNativeError, JsObject, JsResult, JsString, JsValue, NativeFunction};
use boa_gc::{Finalize, Trace, empty_trace};

use crate::js;
use crate::runtime::{HostTask, Run};
use crate::vfs::{FileViewExt, join_virtual};

#[derive(Finalize)]
struct FsCapture {
    run: Rc<Run>,
}

unsafe impl Trace for FsCapture {
    empty_trace!();
}

pub(super) fn build(context: &mut Context, run: &Rc<Run>) -> JsObject {
    let capture = || FsCapture { run: run.clone() };
    ObjectInitializer::new(context)
        .function(
            NativeFunction::from_copy_closure_with_captures(read_file_sync, capture()),
            JsString::from("readFileSync"),
            2,
        )
        .function(
            NativeFunction::from_copy_closure_with_captures(read_file, capture()),
            JsString::from("readFile"),
            3,
        )
        .function(
            NativeFunction::from_copy_closure_with_captures(exists_sync, capture()),
            JsString::from("existsSync"),
            1,
        )
        .build()
}

/// Paths from bundle code are taken relative to the virtual root
fn target_path(value: &JsValue, context: &mut Context) -> JsResult<PathBuf> {
    if !value.is_string() {
        return Err(JsNativeError::typ()
            .with_message("The \"path\" argument must be of type string")
            .into());
    }
    let raw = js::arg_string(value, context)?;
    Ok(join_virtual(Path::new("/"), &raw))
}

/// Text encodings `readFile`/`readFileSync` can decode to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Utf16Le,
    Latin1,
    Ascii,
    Base64,
    Hex,
}

impl Encoding {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Some(Encoding::Utf8),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Some(Encoding::Utf16Le),
            "latin1" | "binary" => Some(Encoding::Latin1),
            "ascii" => Some(Encoding::Ascii),
            "base64" => Some(Encoding::Base64),
            "hex" => Some(Encoding::Hex),
            _ => None,
        }
    }

    fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Encoding::Ascii => bytes.iter().map(|&b| char::from(b & 0x7f)).collect(),
            Encoding::Base64 => STANDARD.encode(bytes),
            Encoding::Hex => {
                let mut out = String::with_capacity(bytes.len() * 2);
                for byte in bytes {
                    let _ = write!(out, "{:02x}", byte);
                }
                out
            }
        }
    }
}

/// Encoding from a string or `{ encoding }` options argument
fn encoding(value: &JsValue, context: &mut Context) -> JsResult<Option<Encoding>> {
    let name = if value.is_string() {
        Some(js::arg_string(value, context)?)
    } else {
        match value.as_object() {
            Some(options) => js::get_string(options, "encoding", context)?,
            None => None,
        }
    };
    let Some(name) = name else {
        return Ok(None);
    };
    match Encoding::parse(&name) {
        Some(encoding) => Ok(Some(encoding)),
        None => Err(invalid_encoding(&name, context)),
    }
}

/// `ERR_INVALID_ARG_VALUE`, as Node throws for an unknown encoding
fn invalid_encoding(name: &str, context: &mut Context) -> JsError {
    let native = JsNativeError::typ().with_message(format!(
        "The argument 'encoding' is invalid encoding. Received '{}'",
        name
    ));
    let value = JsError::from(native).to_opaque(context);
    if let Some(object) = value.as_object() {
        let _ = object.set(
            JsString::from("code"),
            JsString::from("ERR_INVALID_ARG_VALUE"),
            false,
            context,
        );
    }
    JsError::from_opaque(value)
}

fn read(
    run: &Run,
    path: &Path,
    encoding: Option<Encoding>,
    context: &mut Context,
) -> JsResult<JsValue> {
    let bytes = run
        .files
        .read_sync(path)
        .map_err(|err| js::io_error(&err, "open", path, context))?;

    match encoding {
        Some(encoding) => Ok(JsString::from(encoding.decode(&bytes).as_str()).into()),
        None => {
            let buffer = JsArrayBuffer::from_byte_block(bytes, context)?;
            Ok(JsUint8Array::from_array_buffer(buffer, context)?.into())
        }
    }
}

fn read_file_sync(
    _this: &JsValue,
    args: &[JsValue],
    captures: &FsCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let path = target_path(args.get_or_undefined(0), context)?;
    let encoding = encoding(args.get_or_undefined(1), context)?;
    read(&captures.run, &path, encoding, context)
}

/// Callback form; the callback runs on a later task, never synchronously
fn read_file(
    _this: &JsValue,
    args: &[JsValue],
    captures: &FsCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let Some(callback) = args
        .last()
        .and_then(|arg| arg.as_callable())
        .map(|f| f.clone())
    else {
        return Err(JsNativeError::typ()
            .with_message("The \"callback\" argument must be of type function")
            .into());
    };

    let path = target_path(args.get_or_undefined(0), context)?;
    let encoding = if args.len() > 2 {
        encoding(args.get_or_undefined(1), context)?
    } else {
        None
    };

    let args = match read(&captures.run, &path, encoding, context) {
        Ok(data) => vec![JsValue::null(), data],
        Err(err) => vec![err.to_opaque(context)],
    };
    captures
        .run
        .scheduler
        .borrow_mut()
        .schedule(0, HostTask::Callback { callback, args });
    Ok(JsValue::undefined())
}

fn exists_sync(
    _this: &JsValue,
    args: &[JsValue],
    captures: &FsCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let value = args.get_or_undefined(0);
    if !value.is_string() {
        return Ok(false.into());
    }
    let path = target_path(value, context)?;
    let files = &captures.run.files;
    Ok((files.is_file_sync(&path) || files.is_dir_sync(&path)).into())
}
