#![allow(dead_code)]

use indoc::indoc;
use std::fs;
use std::path::{Path, PathBuf};

/// `Foo` stores `self` into `_bar.delegate` in `init` and has no `dealloc`.
/// `-[Foo run]` repeats a boolean operand and keeps a local `dispatch_once_t`.
pub const FOO_JSON: &str = indoc! {r#"
    {
      "path": "Foo.m",
      "lang": { "auto_release_fields": true },
      "interfaces": [
        {
          "name": "Bar",
          "superclass": "NSObject",
          "properties": [
            { "name": "delegate", "ty": { "kind": "id" }, "ownership": "assign" },
            { "name": "title", "ty": { "kind": "object", "name": "NSString" }, "ownership": "copy" }
          ]
        },
        {
          "name": "Foo",
          "superclass": "NSObject",
          "fields": [
            { "name": "_bar", "ty": { "kind": "object", "name": "Bar" } }
          ]
        }
      ],
      "implementations": [
        {
          "name": "Foo",
          "range": { "begin": { "line": 11, "column": 1 }, "end": { "line": 30, "column": 4 } },
          "methods": [
            {
              "selector": "init",
              "body": {
                "kind": "block",
                "stmts": [
                  {
                    "kind": "expr",
                    "expr": {
                      "kind": "message",
                      "receiver": { "kind": "instance", "expr": { "kind": "field_ref", "field": "_bar" } },
                      "selector": "setDelegate:",
                      "args": [{ "kind": "self_ref" }]
                    }
                  }
                ]
              }
            },
            {
              "selector": "run",
              "body": {
                "kind": "block",
                "stmts": [
                  {
                    "kind": "decl",
                    "decl": {
                      "name": "onceToken",
                      "ty": { "kind": "scalar", "name": "dispatch_once_t" },
                      "range": { "begin": { "line": 20, "column": 3 }, "end": { "line": 20, "column": 28 } }
                    }
                  },
                  {
                    "kind": "expr",
                    "expr": {
                      "kind": "binary",
                      "op": "or",
                      "lhs": { "kind": "var", "name": "flag" },
                      "rhs": { "kind": "var", "name": "flag" },
                      "range": { "begin": { "line": 21, "column": 3 }, "end": { "line": 21, "column": 15 } }
                    }
                  }
                ]
              }
            }
          ]
        }
      ]
    }
"#};

/// `Foo` clears what it stored before its `dealloc` ends.
pub const CLEAN_JSON: &str = indoc! {r#"
    {
      "path": "Clean.m",
      "interfaces": [
        {
          "name": "Bar",
          "properties": [{ "name": "delegate", "ty": { "kind": "id" }, "ownership": "assign" }]
        },
        {
          "name": "Foo",
          "fields": [{ "name": "_bar", "ty": { "kind": "object", "name": "Bar" } }]
        }
      ],
      "implementations": [
        {
          "name": "Foo",
          "methods": [
            {
              "selector": "dealloc",
              "body": {
                "kind": "block",
                "stmts": [
                  {
                    "kind": "expr",
                    "expr": {
                      "kind": "message",
                      "receiver": { "kind": "instance", "expr": { "kind": "field_ref", "field": "_bar" } },
                      "selector": "setDelegate:",
                      "args": [{ "kind": "self_ref" }]
                    }
                  },
                  {
                    "kind": "expr",
                    "expr": {
                      "kind": "message",
                      "receiver": { "kind": "instance", "expr": { "kind": "field_ref", "field": "_bar" } },
                      "selector": "setDelegate:",
                      "args": [{ "kind": "nil" }]
                    }
                  }
                ]
              }
            }
          ]
        }
      ]
    }
"#};

pub fn write_unit(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}
