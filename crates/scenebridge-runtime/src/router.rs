//! Command router and persistence store.
//!
//! Dispatches a parsed request envelope to the matching handler, against a
//! `Host` and the process-lifetime [`PersistStore`]. Does not itself read or
//! write the socket — see [`crate::dispatcher`] and [`crate::bridge`] for that.

use crate::host::{Host, ObjectKind};
use crate::interpreter::{self, CaptureBuffers};
use crate::persist::PersistStore;
use serde_json::{json, Value};

/// A parsed request envelope, before command-specific validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    New { command: String, params: Value },
    Legacy { code: Option<String>, message: Option<String> },
}

#[derive(Debug)]
pub struct ParseError(pub String);

/// Parse a raw JSON request body: prefer `type`, fall back to the legacy
/// `code`/`message` shape when `type` is absent.
pub fn parse_request(value: &Value) -> Result<Request, ParseError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError("request must be a JSON object".to_string()))?;

    if let Some(command) = obj.get("type") {
        let command = command
            .as_str()
            .ok_or_else(|| ParseError("'type' must be a string".to_string()))?
            .to_string();
        let params = obj.get("params").cloned().unwrap_or_else(|| json!({}));
        return Ok(Request::New { command, params });
    }

    if obj.contains_key("code") || obj.contains_key("message") {
        return Ok(Request::Legacy {
            code: obj.get("code").and_then(Value::as_str).map(str::to_string),
            message: obj.get("message").and_then(Value::as_str).map(str::to_string),
        });
    }

    Err(ParseError(
        "request must have a 'type' field or a legacy 'code'/'message' field".to_string(),
    ))
}

/// Result of a single dispatch: the full envelope to write back, and whether a
/// `server_shutdown` was requested.
pub struct DispatchOutcome {
    pub envelope: Value,
    pub shutdown_requested: bool,
}

impl DispatchOutcome {
    fn ok(envelope: Value) -> Self {
        Self {
            envelope,
            shutdown_requested: false,
        }
    }
}

/// Handles one parsed request against `host` and `persist`. `source` is the
/// peer address string used to populate the legacy shape's `source` field.
pub fn dispatch(request: Request, host: &mut dyn Host, persist: &PersistStore, source: &str) -> DispatchOutcome {
    match request {
        Request::Legacy { code, message } => dispatch_legacy(code, message, host, source),
        Request::New { command, params } => dispatch_new(&command, params, host, persist),
    }
}

fn error_envelope(message: impl Into<String>) -> Value {
    json!({"status": "error", "message": message.into()})
}

fn success_envelope(result: Value) -> Value {
    json!({"status": "success", "result": result})
}

fn dispatch_legacy(code: Option<String>, _message: Option<String>, host: &mut dyn Host, source: &str) -> DispatchOutcome {
    let mut buffers = CaptureBuffers::default();
    let source_code = code.unwrap_or_default();
    let envelope = match interpreter::execute(&source_code, host, &mut buffers) {
        Ok(()) => json!({"response": "OK", "message": buffers.stdout, "source": source}),
        Err(e) => json!({"response": "OK", "message": e.to_string(), "source": source}),
    };
    DispatchOutcome::ok(envelope)
}

fn dispatch_new(command: &str, params: Value, host: &mut dyn Host, persist: &PersistStore) -> DispatchOutcome {
    match command {
        "get_scene_info" => DispatchOutcome::ok(success_envelope(get_scene_info(host))),
        "get_object_info" => match get_object_info(&params, host) {
            Ok(result) => DispatchOutcome::ok(success_envelope(result)),
            Err(message) => DispatchOutcome::ok(error_envelope(message)),
        },
        "get_viewport_screenshot" => match get_viewport_screenshot(&params, host) {
            Ok(result) => DispatchOutcome::ok(success_envelope(result)),
            Err(message) => DispatchOutcome::ok(error_envelope(message)),
        },
        "execute_code" => match execute_code(&params, host) {
            Ok(result) => DispatchOutcome::ok(success_envelope(result)),
            Err(message) => DispatchOutcome::ok(error_envelope(message)),
        },
        "server_shutdown" => DispatchOutcome {
            envelope: success_envelope(json!({})),
            shutdown_requested: true,
        },
        "put_persist_data" => match put_persist_data(&params, persist) {
            Ok(result) => DispatchOutcome::ok(success_envelope(result)),
            Err(message) => DispatchOutcome::ok(error_envelope(message)),
        },
        "get_persist_data" => match get_persist_data(&params, persist) {
            Ok(result) => DispatchOutcome::ok(success_envelope(result)),
            Err(message) => DispatchOutcome::ok(error_envelope(message)),
        },
        "remove_persist_data" => match remove_persist_data(&params, persist) {
            Ok(result) => DispatchOutcome::ok(success_envelope(result)),
            Err(message) => DispatchOutcome::ok(error_envelope(message)),
        },
        "get_polyhaven_status" => DispatchOutcome::ok(success_envelope(
            json!({"enabled": false, "message": "asset integrations not supported"}),
        )),
        other => DispatchOutcome::ok(error_envelope(format!("Unknown command type: {other}"))),
    }
}

fn get_scene_info(host: &dyn Host) -> Value {
    let document = host.document();
    let objects: Vec<Value> = document
        .objects
        .iter()
        .take(10)
        .map(|o| json!({"name": o.name, "type": o.kind.to_string(), "location": o.location}))
        .collect();
    json!({
        "name": document.name,
        "object_count": document.objects.len(),
        "objects": objects,
        "materials_count": document.materials.len(),
    })
}

fn get_object_info(params: &Value, host: &dyn Host) -> Result<Value, String> {
    let name = params
        .get("object_name")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing required param: object_name".to_string())?;

    let object = host
        .document()
        .objects
        .iter()
        .find(|o| o.name == name)
        .ok_or_else(|| format!("Object '{name}' not found"))?;

    let mut result = json!({
        "name": object.name,
        "type": object.kind.to_string(),
        "location": object.location,
        "rotation": object.rotation,
        "scale": object.scale,
        "visible": object.visible,
        "materials": object.materials,
    });
    if let (Some(mesh), Some(map)) = (&object.mesh, result.as_object_mut()) {
        map.insert("vertices".to_string(), json!(mesh.vertices));
        map.insert("edges".to_string(), json!(mesh.edges));
        map.insert("faces".to_string(), json!(mesh.faces));
        map.insert("polygons".to_string(), json!(mesh.polygons));
    }
    Ok(result)
}

fn get_viewport_screenshot(params: &Value, host: &dyn Host) -> Result<Value, String> {
    if !host.is_interactive() {
        return Err("viewport operations require interactive mode".to_string());
    }

    let format = params
        .get("format")
        .and_then(Value::as_str)
        .unwrap_or("png");
    if format != "png" && format != "jpg" {
        return Err(format!("unsupported screenshot format: {format}"));
    }
    let bytes = host.render_viewport_png();
    let image_base64 = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &bytes);
    Ok(json!({"width": 1, "height": 1, "format": format, "image_base64": image_base64}))
}

fn execute_code(params: &Value, host: &mut dyn Host) -> Result<Value, String> {
    let raw_code = params
        .get("code")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing required param: code".to_string())?;

    let code_is_base64 = params
        .get("code_is_base64")
        .and_then(Value::as_bool)
        .unwrap_or(false)
        || params
            .get("send_as_base64")
            .and_then(Value::as_bool)
            .unwrap_or(false);
    let return_as_base64 = params
        .get("return_as_base64")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let code = if code_is_base64 {
        let decoded = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, raw_code)
            .map_err(|e| format!("invalid base64 code: {e}"))?;
        String::from_utf8(decoded).map_err(|e| format!("code is not valid UTF-8: {e}"))?
    } else {
        raw_code.to_string()
    };

    let mut buffers = CaptureBuffers::default();
    interpreter::execute(&code, host, &mut buffers).map_err(|e| e.to_string())?;

    let result_value = if return_as_base64 {
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &buffers.stdout)
    } else {
        buffers.stdout.clone()
    };

    let mut response = json!({
        "executed": true,
        "result": result_value,
        "output": {"stdout": buffers.stdout, "stderr": buffers.stderr},
    });
    if return_as_base64 {
        response["result_is_base64"] = json!(true);
    }
    Ok(response)
}

fn put_persist_data(params: &Value, persist: &PersistStore) -> Result<Value, String> {
    let key = params
        .get("key")
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| "'key' must be a non-empty string".to_string())?;
    let data = params.get("data").cloned().unwrap_or(Value::Null);
    persist.set(key.to_string(), data);
    Ok(json!({"stored": true, "key": key}))
}

fn get_persist_data(params: &Value, persist: &PersistStore) -> Result<Value, String> {
    let key = params
        .get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing required param: key".to_string())?;
    let default = params.get("default").cloned().unwrap_or(Value::Null);
    match persist.get(key) {
        Some(data) => Ok(json!({"found": true, "data": data, "key": key})),
        None => Ok(json!({"found": false, "data": default, "key": key})),
    }
}

fn remove_persist_data(params: &Value, persist: &PersistStore) -> Result<Value, String> {
    let key = params
        .get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing required param: key".to_string())?;
    let removed = persist.remove(key).is_some();
    Ok(json!({"removed": removed, "key": key}))
}
