//! Crate-level integration and BDD tests.

use std::fmt;

use serde_json::Value;

use crate::value::{DynamicValue, TypeShape, TypedValue};


/// Handler failure raised on purpose by walk tests, carrying the position
/// of the attribute that triggered it.
#[derive(Debug)]
pub(super) struct StopWalk(pub usize);

impl fmt::Display for StopWalk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler stopped at attribute {}", self.0)
    }
}

impl std::error::Error for StopWalk {}

/// Reads plain JSON as the equivalent dynamic value.
pub(super) fn dynamic_from_json(value: Value) -> DynamicValue {
    match value {
        Value::Null => DynamicValue::Null,
        Value::Bool(flag) => DynamicValue::Bool(flag),
        Value::Number(number) => DynamicValue::Number(number),
        Value::String(text) => DynamicValue::String(text),
        Value::Array(items) => DynamicValue::List(items.into_iter().map(dynamic_from_json).collect()),
        Value::Object(entries) => DynamicValue::Map(
            entries
                .into_iter()
                .map(|(key, item)| (key, dynamic_from_json(item)))
                .collect(),
        ),
    }
}

/// Renders a decoded value as plain JSON for comparison.
pub(super) fn typed_to_json(value: &TypedValue) -> Value {
    let encoded = match value {
        TypedValue::String(text) => serde_json::to_value(text),
        TypedValue::Integer(integer) => serde_json::to_value(integer),
        TypedValue::StringList(items) => serde_json::to_value(items),
        TypedValue::IntegerList(items) => serde_json::to_value(items),
        TypedValue::StringMap(entries) => serde_json::to_value(entries),
        TypedValue::IntegerMap(entries) => serde_json::to_value(entries),
    };
    encoded.expect("decoded values encode as JSON")
}

/// Parses a shape written as in its `Display` form, e.g. `map of number`.
pub(super) fn shape_named(name: &str) -> TypeShape {
    match name.split_once(" of ") {
        Some(("list", element)) => TypeShape::list(shape_named(element)),
        Some(("map", element)) => TypeShape::map(shape_named(element)),
        Some((other, _)) => panic!("unsupported collection '{other}'"),
        None => match name {
            "string" => TypeShape::String,
            "number" => TypeShape::Number,
            "bool" => TypeShape::Bool,
            other => panic!("unsupported shape '{other}'"),
        },
    }
}

#[cfg(unix)]
mod socket {
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixStream;
    use std::thread;

    use serde_json::{Value, json};

    use crate::client::{Client, Runner, RunnerExt};
    use crate::protocol::Expression;
    use crate::test_support::range_on_line;
    use crate::transport::{HostStream, StreamTransport};

    /// Answers each request line with the next scripted result, echoing the
    /// request id, and returns the methods it served.
    fn serve(stream: UnixStream, results: Vec<Value>) -> Vec<String> {
        let mut writer = stream.try_clone().expect("clone host socket");
        let mut reader = BufReader::new(stream);
        let mut served = Vec::new();
        for result in results {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read request");
            let request: Value = serde_json::from_str(&line).expect("request JSON");
            served.push(request["method"].as_str().unwrap_or_default().to_owned());
            let response = json!({"jsonrpc": "2.0", "id": request["id"], "result": result});
            writeln!(writer, "{response}").expect("write response");
        }
        served
    }

    #[test]
    fn client_round_trips_over_a_unix_socket() {
        let (plugin_side, host_side) = UnixStream::pair().expect("socket pair");
        let host = thread::spawn(move || {
            serve(
                host_side,
                vec![
                    json!([]),
                    json!({"type": "number", "value": 8080}),
                ],
            )
        });

        let reader = HostStream::Unix(plugin_side.try_clone().expect("clone plugin socket"));
        let client = Client::new(StreamTransport::new(reader, HostStream::Unix(plugin_side)));

        client
            .walk_resource_attributes("aws_security_group", "ingress", &mut |_| Ok(()))
            .expect("walk");
        let port: i64 = client
            .evaluate_expr(&Expression::new("var.port", range_on_line(7)))
            .expect("port");

        assert_eq!(port, 8080);
        let served = host.join().expect("host thread");
        assert_eq!(served, vec!["Plugin.Attributes", "Plugin.EvalExpr"]);
    }
}
