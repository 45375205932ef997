//! Template functions (global functions available in templates)

use minijinja::value::Rest;
use minijinja::{Error, ErrorKind, Value};

/// Usage: {{ fail("https.mode must be set") }}
pub fn fail(message: String) -> Result<Value, Error> {
    Err(Error::new(ErrorKind::InvalidOperation, message))
}

/// Build a map from key-value pairs
///
/// Usage: {{ dict("app", Chart.Name, "heritage", "deckhouse") }}
pub fn dict(args: Rest<Value>) -> Result<Value, Error> {
    if args.len() % 2 != 0 {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "dict requires an even number of arguments (key-value pairs)",
        ));
    }

    let mut map = serde_json::Map::new();
    for pair in args.chunks(2) {
        let key = pair[0]
            .as_str()
            .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "dict keys must be strings"))?;
        let value = serde_json::to_value(&pair[1])
            .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;
        map.insert(key.to_string(), value);
    }

    Ok(Value::from_serialize(serde_json::Value::Object(map)))
}

/// Usage: {{ list("a", "b") }}
pub fn list(args: Rest<Value>) -> Value {
    Value::from(args.0)
}

/// First value that is defined, not none and not an empty string
///
/// Usage: {{ coalesce(Values.certManager.storageClass, "default") }}
pub fn coalesce(args: Rest<Value>) -> Value {
    args.0
        .into_iter()
        .find(|arg| {
            !arg.is_undefined() && !arg.is_none() && !arg.as_str().is_some_and(str::is_empty)
        })
        .unwrap_or(Value::UNDEFINED)
}

/// Usage: {{ ternary("yes", "no", Values.certManager.enabled) }}
pub fn ternary(true_val: Value, false_val: Value, condition: Value) -> Value {
    if condition.is_true() {
        true_val
    } else {
        false_val
    }
}
