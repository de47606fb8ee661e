use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "server": {
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "port": { "type": "integer", "minimum": 1, "maximum": 65535 }
                }
            },
            "storage": {
                "type": "object",
                "properties": {
                    "backend": { "type": "string", "enum": ["memory", "sqlite"] },
                    "path": { "type": "string" },
                    "seed_file": { "type": "string" }
                }
            },
            "resource": {
                "type": "object",
                "properties": {
                    "timeout_ms": { "type": "integer", "minimum": 1 }
                }
            },
            "check": {
                "type": "object",
                "properties": {
                    "step_delay_ms": { "type": "integer", "minimum": 0 }
                }
            },
            "statistics": {
                "type": "object",
                "properties": {
                    "corroboration": { "type": "integer", "minimum": 0, "maximum": 100 }
                }
            }
        }
    })
});
