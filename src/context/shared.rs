//! Bindings every context gets: `console` and the timer functions

use std::rc::Rc;

use boa_engine::object::ObjectInitializer;
use boa_engine::{Context, JsArgs, JsNativeError, JsObject, JsResult, JsString, JsValue, NativeFunction};
use boa_gc::{Finalize, Trace, empty_trace};
use tracing::{debug, error, info, warn};

use crate::js;
use crate::runtime::{ConsoleLevel, HostTask, Run};

#[derive(Finalize)]
struct ConsoleCapture {
    run: Rc<Run>,
    level: ConsoleLevel,
}

unsafe impl Trace for ConsoleCapture {
    empty_trace!();
}

#[derive(Clone, Copy)]
enum TimerKind {
    Timeout,
    Interval,
    Immediate,
}

#[derive(Finalize)]
struct TimerCapture {
    run: Rc<Run>,
    kind: TimerKind,
}

unsafe impl Trace for TimerCapture {
    empty_trace!();
}

#[derive(Finalize)]
struct RunCapture {
    run: Rc<Run>,
}

unsafe impl Trace for RunCapture {
    empty_trace!();
}

pub(super) fn install(global: &JsObject, context: &mut Context, run: &Rc<Run>) -> JsResult<()> {
    let console = console(context, run);
    js::define(global, "console", console, context)?;

    for (name, kind) in [
        ("setTimeout", TimerKind::Timeout),
        ("setInterval", TimerKind::Interval),
        ("setImmediate", TimerKind::Immediate),
    ] {
        let native = NativeFunction::from_copy_closure_with_captures(
            set_timer,
            TimerCapture {
                run: run.clone(),
                kind,
            },
        );
        let function = js::function(context, name, 2, native);
        js::define(global, name, function, context)?;
    }

    for name in ["clearTimeout", "clearInterval", "clearImmediate"] {
        let native = NativeFunction::from_copy_closure_with_captures(
            clear_timer,
            RunCapture { run: run.clone() },
        );
        let function = js::function(context, name, 1, native);
        js::define(global, name, function, context)?;
    }

    Ok(())
}

fn console(context: &mut Context, run: &Rc<Run>) -> JsObject {
    let method = |level: ConsoleLevel| {
        NativeFunction::from_copy_closure_with_captures(
            write_console,
            ConsoleCapture {
                run: run.clone(),
                level,
            },
        )
    };

    ObjectInitializer::new(context)
        .function(method(ConsoleLevel::Log), JsString::from("log"), 0)
        .function(method(ConsoleLevel::Info), JsString::from("info"), 0)
        .function(method(ConsoleLevel::Warn), JsString::from("warn"), 0)
        .function(method(ConsoleLevel::Error), JsString::from("error"), 0)
        .function(method(ConsoleLevel::Debug), JsString::from("debug"), 0)
        .function(method(ConsoleLevel::Debug), JsString::from("trace"), 0)
        .build()
}

fn write_console(
    _this: &JsValue,
    args: &[JsValue],
    captures: &ConsoleCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        if arg.is_string() {
            parts.push(js::arg_string(arg, context)?);
        } else {
            parts.push(arg.display().to_string());
        }
    }
    let text = parts.join(" ");

    match captures.level {
        ConsoleLevel::Error => error!(target: "bundle_harness::console", "{}", text),
        ConsoleLevel::Warn => warn!(target: "bundle_harness::console", "{}", text),
        ConsoleLevel::Log | ConsoleLevel::Info => {
            info!(target: "bundle_harness::console", "{}", text)
        }
        ConsoleLevel::Debug => debug!(target: "bundle_harness::console", "{}", text),
    }

    captures.run.record_console(captures.level, text);
    Ok(JsValue::undefined())
}

/// Milliseconds from a timer delay argument; junk and negatives mean zero
fn delay_ms(value: &JsValue, context: &mut Context) -> JsResult<u64> {
    if value.is_undefined() {
        return Ok(0);
    }
    let delay = value.to_number(context)?;
    if delay.is_finite() && delay > 0.0 {
        Ok(delay as u64)
    } else {
        Ok(0)
    }
}

fn set_timer(
    _this: &JsValue,
    args: &[JsValue],
    captures: &TimerCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let Some(callback) = args.get_or_undefined(0).as_callable().map(|f| f.clone()) else {
        return Err(JsNativeError::typ()
            .with_message("The \"callback\" argument must be of type function")
            .into());
    };

    let (delay, rest) = match captures.kind {
        TimerKind::Immediate => (0, args.get(1..).unwrap_or_default()),
        TimerKind::Timeout | TimerKind::Interval => (
            delay_ms(args.get_or_undefined(1), context)?,
            args.get(2..).unwrap_or_default(),
        ),
    };

    let task = HostTask::Callback {
        callback,
        args: rest.to_vec(),
    };
    let mut scheduler = captures.run.scheduler.borrow_mut();
    let id = match captures.kind {
        TimerKind::Interval => scheduler.schedule_repeating(delay.max(1), task),
        TimerKind::Timeout | TimerKind::Immediate => scheduler.schedule(delay, task),
    };
    Ok(JsValue::from(id))
}

fn clear_timer(
    _this: &JsValue,
    args: &[JsValue],
    captures: &RunCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let id = args.get_or_undefined(0);
    if id.is_null_or_undefined() {
        return Ok(JsValue::undefined());
    }
    let id = id.to_number(context)?;
    if id.is_finite() && id >= 1.0 && id <= f64::from(u32::MAX) {
        captures.run.scheduler.borrow_mut().cancel(id as u32);
    }
    Ok(JsValue::undefined())
}
