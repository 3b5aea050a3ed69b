//! CommonJS loading in node contexts: resolution, caching, host modules and
//! the `fs` shim

mod common;

use bundle_harness::HarnessError;
use common::Fixture;
use serde_json::json;

#[test]
fn test_require_is_cached() {
    let fixture = Fixture::node(
        r#"module.exports = require("./lib") === require("./lib.js");"#,
    )
    .file("/dist/lib.js", "module.exports = {};");

    let mut execution = fixture.execute().unwrap();
    assert_eq!(execution.to_json().unwrap(), json!(true));
    assert_eq!(
        execution.cached_modules(),
        vec![std::path::PathBuf::from("/dist/lib.js")]
    );
}

#[test]
fn test_modules_get_isolated_globals() {
    let fixture = Fixture::node(
        r#"
        var inner = require("./lib");
        module.exports = [inner, typeof secret];
        "#,
    )
    .file("/dist/lib.js", r#"var secret = "lib"; module.exports = typeof secret;"#);
    assert_eq!(fixture.json(), json!(["string", "undefined"]));
}

#[test]
fn test_exports_are_shared_by_reference() {
    let fixture = Fixture::node(
        r#"
        require("./store").items.push("from entry");
        require("./writer");
        module.exports = require("./store").items;
        "#,
    )
    .file("/dist/store.js", "module.exports = { items: [] };")
    .file("/dist/writer.js", r#"require("./store").items.push("from writer");"#);
    assert_eq!(fixture.json(), json!(["from entry", "from writer"]));
}

#[test]
fn test_circular_requires_see_partial_exports() {
    let fixture = Fixture::node(r#"module.exports = require("./a");"#)
        .file(
            "/dist/a.js",
            r#"
            exports.name = "a";
            var b = require("./b");
            exports.fromB = b.name;
            exports.bSawA = b.sawA;
            "#,
        )
        .file(
            "/dist/b.js",
            r#"
            var a = require("./a");
            exports.name = "b";
            exports.sawA = a.name;
            "#,
        );
    assert_eq!(
        fixture.json(),
        json!({"name": "a", "fromB": "b", "bSawA": "a"})
    );
}

#[test]
fn test_failed_module_is_evicted() {
    let fixture = Fixture::node(
        r#"
        var attempts = [];
        for (var i = 0; i < 2; i++) {
          try { require("./flaky"); } catch (e) { attempts.push(e.message); }
        }
        module.exports = attempts;
        "#,
    )
    .file("/dist/flaky.js", r#"throw new Error("flaky failed");"#);
    assert_eq!(fixture.json(), json!(["flaky failed", "flaky failed"]));
}

#[test]
fn test_module_loaded_flag() {
    let fixture = Fixture::node(
        r#"
        var during = require("./lib");
        module.exports = [during, require.cache === undefined];
        "#,
    )
    .file("/dist/lib.js", "module.exports = module.loaded;");
    assert_eq!(fixture.json(), json!([false, true]));
}

#[test]
fn test_node_modules_package_main() {
    let fixture = Fixture::node(r#"module.exports = [require("pkg"), require("shared")];"#)
        .file(
            "/dist/node_modules/pkg/package.json",
            r#"{"name": "pkg", "main": "lib/main.js"}"#,
        )
        .file("/dist/node_modules/pkg/lib/main.js", r#"module.exports = "pkg";"#)
        .file("/node_modules/shared/index.js", r#"module.exports = "shared";"#);
    assert_eq!(fixture.json(), json!(["pkg", "shared"]));
}

#[test]
fn test_json_module() {
    let fixture = Fixture::node(r#"module.exports = require("./data.json").tags;"#)
        .file("/dist/data.json", r#"{"tags": ["a", "b"]}"#);
    assert_eq!(fixture.json(), json!(["a", "b"]));
}

#[test]
fn test_require_resolve() {
    let fixture = Fixture::node(
        r#"module.exports = [require.resolve("./lib"), require.resolve("fs")];"#,
    )
    .file("/dist/lib.js", "");
    assert_eq!(fixture.json(), json!(["/dist/lib.js", "fs"]));
}

#[test]
fn test_missing_relative_module() {
    let err = Fixture::node(r#"require("./missing");"#).execute().unwrap_err();
    match err {
        HarnessError::ModuleNotFound { specifier, from } => {
            assert_eq!(specifier, "./missing");
            assert_eq!(from, "/dist");
        }
        other => panic!("Expected ModuleNotFound, got {other:?}"),
    }
}

#[test]
fn test_missing_module_inside_nested_require() {
    let err = Fixture::node(r#"require("./lib");"#)
        .file("/dist/lib.js", r#"require("./gone");"#)
        .execute()
        .unwrap_err();
    assert!(matches!(err, HarnessError::ModuleNotFound { .. }));
}

#[test]
fn test_module_not_found_code_is_catchable() {
    let fixture = Fixture::node(
        r#"
        try { require("./missing"); } catch (e) { module.exports = e.code; }
        "#,
    );
    assert_eq!(fixture.json(), json!("MODULE_NOT_FOUND"));
}

#[test]
fn test_unregistered_host_module() {
    let err = Fixture::node(r#"require("express");"#)
        .execute()
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::ModuleNotFound { ref specifier, .. } if specifier == "express"
    ));
}

#[test]
fn test_registered_host_module() {
    let fixture = Fixture::node(r#"module.exports = require("left-pad")("x");"#)
        .host_module("left-pad", "module.exports = function (s) { return '>' + s; };");
    assert_eq!(fixture.json(), json!(">x"));
}

#[test]
fn test_builtin_path_module() {
    let fixture = Fixture::node(
        r#"
        var path = require("path");
        module.exports = [
          path.join("/a", "b", "../c"),
          path.dirname("/x/y.js"),
          path.extname("notes.txt"),
          require("node:path") === path
        ];
        "#,
    );
    assert_eq!(fixture.json(), json!(["/a/c", "/x", ".txt", true]));
}

#[test]
fn test_symlinked_module_keeps_link_path() {
    let fixture = Fixture::node(r#"module.exports = require("./linked/lib");"#)
        .file("/real/lib.js", "module.exports = [__filename, __dirname];");
    fixture.files.symlink("/real", "/dist/linked");
    assert_eq!(
        fixture.json(),
        json!(["/dist/linked/lib.js", "/dist/linked"])
    );
}

#[test]
fn test_process_bindings() {
    let fixture = Fixture::node(
        r#"module.exports = [process.env.NODE_ENV, process.argv[1], process.cwd(), process.browser];"#,
    );
    assert_eq!(
        fixture.json(),
        json!(["test", "/dist/index.js", "/", false])
    );
}

#[test]
fn test_next_tick_runs_before_timers() {
    let fixture = Fixture::node(
        r#"
        var order = [];
        setTimeout(function () { order.push("timeout"); }, 0);
        process.nextTick(function (label) { order.push(label); }, "tick");
        order.push("sync");
        module.exports = order;
        "#,
    );
    assert_eq!(fixture.json(), json!(["sync", "tick", "timeout"]));
}

#[test]
fn test_fs_read_file_sync() {
    let fixture = Fixture::node(
        r#"
        var fs = require("fs");
        module.exports = [
          fs.readFileSync(__dirname + "/data.txt", "utf8"),
          fs.readFileSync("/dist/data.txt", { encoding: "utf8" }),
          fs.readFileSync("/dist/data.txt") instanceof Uint8Array,
          fs.existsSync("/dist/data.txt"),
          fs.existsSync("/dist/nope.txt")
        ];
        "#,
    )
    .file("/dist/data.txt", "first");
    fixture.files.write_file("/dist/data.txt", "second");

    assert_eq!(
        fixture.json(),
        json!(["second", "second", true, true, false])
    );
}

#[test]
fn test_fs_read_file_callback() {
    let fixture = Fixture::node(
        r#"
        var fs = require("fs");
        var order = [];
        module.exports = new Promise(function (resolve) {
          fs.readFile("/dist/data.txt", "utf8", function (err, data) {
            order.push(data);
            fs.readFile("/dist/missing.txt", function (err) {
              order.push(err.code);
              resolve(order);
            });
          });
          order.push("sync");
        });
        "#,
    )
    .file("/dist/data.txt", "contents");
    assert_eq!(fixture.json(), json!(["sync", "contents", "ENOENT"]));
}

#[test]
fn test_fs_missing_file_throws_enoent() {
    let fixture = Fixture::node(
        r#"
        try { require("fs").readFileSync("/dist/none.txt", "utf8"); }
        catch (e) { module.exports = [e.code, e.syscall]; }
        "#,
    );
    assert_eq!(fixture.json(), json!(["ENOENT", "open"]));
}

#[test]
fn test_fs_read_file_sync_encodings() {
    let fixture = Fixture::node(
        r#"
        var fs = require("fs");
        var unknown;
        try { fs.readFileSync("/dist/data.txt", "klingon"); }
        catch (e) { unknown = [e.name, e.code]; }
        module.exports = [
          fs.readFileSync("/dist/data.txt", "base64"),
          fs.readFileSync("/dist/data.txt", "hex"),
          fs.readFileSync("/dist/data.txt", { encoding: "latin1" }),
          unknown
        ];
        "#,
    )
    .file("/dist/data.txt", "hi");
    assert_eq!(
        fixture.json(),
        json!(["aGk=", "6869", "hi", ["TypeError", "ERR_INVALID_ARG_VALUE"]])
    );
}

#[test]
fn test_require_depth_limit() {
    let mut fixture = Fixture::node(r#"require("./a");"#)
        .file("/dist/a.js", r#"require("./b");"#)
        .file("/dist/b.js", r#"require("./c");"#)
        .file("/dist/c.js", "");
    fixture.config.max_require_depth = 2;
    let err = fixture.execute().unwrap_err();
    assert!(err.to_string().contains("Maximum require depth"));
}
