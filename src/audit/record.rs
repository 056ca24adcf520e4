use serde::Serialize;
use serde_json::Value;

/// One intercepted call, serialized once and transmitted once
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    /// Fully qualified type of the handler that was invoked
    pub target: String,
    pub method: String,
    /// Positional arguments
    pub args: Vec<Value>,
    /// Return value, or the error (or panic) the call ended with
    pub result: Value,
}

impl AuditRecord {
    /// Assemble a record from already captured values.
    ///
    /// A serialized argument tuple is an array and is spread into positional
    /// arguments; unit (`null`) means no arguments; any other value is a
    /// single argument.
    pub fn capture(
        target: &str,
        method: &str,
        args: Result<Value, serde_json::Error>,
        result: Result<Value, serde_json::Error>,
    ) -> Result<Self, serde_json::Error> {
        let args = match args? {
            Value::Array(values) => values,
            Value::Null => Vec::new(),
            other => vec![other],
        };

        Ok(Self {
            target: target.to_string(),
            method: method.to_string(),
            args,
            result: result?,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Result field for a call that returned an error
pub fn error_value<E: std::error::Error + ?Sized>(err: &E) -> Value {
    serde_json::json!({
        "error": std::any::type_name_of_val(err),
        "message": err.to_string(),
    })
}

/// Result field for a call that panicked
pub fn panic_value(payload: &(dyn std::any::Any + Send)) -> Value {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    serde_json::json!({ "panic": message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn spreads_tuple_arguments() {
        let record = AuditRecord::capture(
            "svc::PeopleService",
            "add_person_task",
            serde_json::to_value((7, json!({ "name": "x" }))),
            Ok(json!({ "id": 1 })),
        )
        .unwrap();

        assert_eq!(record.args, vec![json!(7), json!({ "name": "x" })]);
        assert_eq!(record.result, json!({ "id": 1 }));
    }

    #[test]
    fn unit_arguments_are_empty() {
        let record =
            AuditRecord::capture("t", "get_people", serde_json::to_value(()), Ok(json!([]))).unwrap();
        assert!(record.args.is_empty());

        let json: Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(json, json!({ "target": "t", "method": "get_people", "args": [], "result": [] }));
    }

    #[test]
    fn unit_result_is_null() {
        let record = AuditRecord::capture(
            "t",
            "remove_person",
            serde_json::to_value((1,)),
            serde_json::to_value(()),
        )
        .unwrap();
        assert_eq!(record.args, vec![json!(1)]);
        assert_eq!(record.result, Value::Null);
    }

    #[test]
    fn unserializable_values_fail_capture() {
        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys are not JSON object keys");

        let result = AuditRecord::capture("t", "m", serde_json::to_value(()), serde_json::to_value(&bad));
        assert!(result.is_err());
    }

    #[test]
    fn describes_errors_and_panics() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let value = error_value(&err);
        assert_eq!(value["message"], "disk on fire");
        assert!(value["error"].as_str().unwrap().contains("io::error::Error"));

        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_value(payload.as_ref()), json!({ "panic": "boom" }));
    }
}
