//! Unit tests for the host client.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use mockall::mock;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::rule::RuleSeverity;
use crate::test_support::{CallLog, ScriptedConnection, attribute, range_on_line};
use crate::value::DynamicValue;

mock! {
    Host {}
    impl Connection for Host {
        fn round_trip(&mut self, method: &str, params: Value) -> Result<Value, TransportError>;
    }
}

struct InstanceTypeRule;

impl Rule for InstanceTypeRule {
    fn name(&self) -> &str {
        "aws_instance_invalid_type"
    }

    fn enabled(&self) -> bool {
        true
    }

    fn severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }

    fn link(&self) -> Option<&str> {
        Some("https://example.com/rules/aws_instance_invalid_type")
    }

    fn check(&self, _runner: &dyn Runner) -> Result<(), ClientError> {
        Ok(())
    }
}

#[derive(Debug)]
struct StopWalk(&'static str);

impl fmt::Display for StopWalk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stopped at {}", self.0)
    }
}

impl std::error::Error for StopWalk {}

#[fixture]
fn expr() -> Expression {
    Expression::new("var.instance_type", range_on_line(3))
}

fn client_answering(value: &DynamicValue) -> (Client<ScriptedConnection>, CallLog) {
    let connection = ScriptedConnection::new().respond_with(value);
    let log = connection.call_log();
    (Client::new(connection), log)
}

fn three_attributes() -> Value {
    serde_json::to_value(vec![
        attribute("instance_type", "\"t2.micro\"", 1),
        attribute("instance_type", "\"t1.2xlarge\"", 5),
        attribute("instance_type", "var.size", 9),
    ])
    .expect("encode attributes")
}

#[rstest]
fn walk_delivers_attributes_in_host_order() {
    let connection = ScriptedConnection::new().respond(three_attributes());
    let log = connection.call_log();
    let client = Client::new(connection);
    let mut seen = Vec::new();

    client
        .walk_resource_attributes("aws_instance", "instance_type", &mut |attribute| {
            seen.push(attribute.expr().source().to_owned());
            Ok(())
        })
        .expect("walk succeeds");

    assert_eq!(seen, vec!["\"t2.micro\"", "\"t1.2xlarge\"", "var.size"]);
    let calls = log.calls();
    let call = calls.first().expect("one call");
    assert_eq!(call.method, "Plugin.Attributes");
    assert_eq!(
        call.params,
        json!({"resource": "aws_instance", "attribute_name": "instance_type"})
    );
}

#[rstest]
fn walk_stops_at_first_handler_failure() {
    let client = Client::new(ScriptedConnection::new().respond(three_attributes()));
    let mut delivered = 0;

    let error = client
        .walk_resource_attributes("aws_instance", "instance_type", &mut |_| {
            delivered += 1;
            if delivered == 2 {
                return Err(ClientError::handler(StopWalk("second")));
            }
            Ok(())
        })
        .expect_err("handler fails");

    assert_eq!(delivered, 2);
    let ClientError::Handler(source) = error else {
        panic!("expected handler failure, got {error:?}");
    };
    let stop = source.downcast_ref::<StopWalk>().expect("handler's own error");
    assert_eq!(stop.0, "second");
}

#[rstest]
fn walk_over_empty_result_never_calls_handler() {
    let client = Client::new(ScriptedConnection::new().respond(json!([])));
    let mut delivered = 0;

    client
        .walk_resource_attributes("aws_instance", "ami", &mut |_| {
            delivered += 1;
            Ok(())
        })
        .expect("empty walk succeeds");

    assert_eq!(delivered, 0);
}

#[rstest]
fn walk_propagates_transport_fault_after_one_attempt() {
    let mut host = MockHost::new();
    host.expect_round_trip()
        .times(1)
        .returning(|method, _| {
            Err(TransportError::ConnectionClosed {
                method: method.to_owned(),
            })
        });
    let client = Client::new(host);

    let error = client
        .walk_resource_attributes("aws_instance", "ami", &mut |_| Ok(()))
        .expect_err("transport fault");

    assert!(matches!(
        error,
        ClientError::Transport(TransportError::ConnectionClosed { .. })
    ));
}

#[rstest]
fn evaluates_string(expr: Expression) {
    let (client, log) = client_answering(&DynamicValue::from("t2.micro"));

    let value: String = client.evaluate_expr(&expr).expect("string");

    assert_eq!(value, "t2.micro");
    let calls = log.calls();
    let call = calls.first().expect("one call");
    assert_eq!(call.method, "Plugin.EvalExpr");
    assert_eq!(call.params["expr"]["source"], "var.instance_type");
}

#[rstest]
fn evaluates_numeric_string_as_integer(expr: Expression) {
    let (client, _log) = client_answering(&DynamicValue::from("42"));

    let value: i64 = client.evaluate_expr(&expr).expect("integer");

    assert_eq!(value, 42);
}

#[rstest]
fn evaluates_list_of_integers(expr: Expression) {
    let (client, _log) = client_answering(&DynamicValue::from(vec![1_i64, 2, 3]));

    let value: Vec<i64> = client.evaluate_expr(&expr).expect("list");

    assert_eq!(value, vec![1, 2, 3]);
}

fn string_map() -> DynamicValue {
    DynamicValue::Map(
        [("a", "1"), ("b", "2")]
            .into_iter()
            .map(|(key, value)| (key.to_owned(), DynamicValue::from(value)))
            .collect(),
    )
}

#[rstest]
fn string_map_into_integer_map(expr: Expression) {
    let (client, _log) = client_answering(&string_map());

    let value: BTreeMap<String, i64> = client.evaluate_expr(&expr).expect("integer map");

    let expected: BTreeMap<String, i64> =
        [(String::from("a"), 1), (String::from("b"), 2)].into_iter().collect();
    assert_eq!(value, expected);
}

#[rstest]
fn string_map_into_string_map_is_unchanged(expr: Expression) {
    let (client, _log) = client_answering(&string_map());

    let value: HashMap<String, String> = client.evaluate_expr(&expr).expect("string map");

    assert_eq!(value.len(), 2);
    assert_eq!(value.get("a").map(String::as_str), Some("1"));
    assert_eq!(value.get("b").map(String::as_str), Some("2"));
}

#[rstest]
#[case::null(DynamicValue::Null, "value must not be null")]
#[case::unknown(DynamicValue::Unknown, "value must be known")]
fn absent_values_do_not_decode_as_empty_string(
    expr: Expression,
    #[case] value: DynamicValue,
    #[case] cause: &str,
) {
    let (client, _log) = client_answering(&value);

    let error = client
        .evaluate_expr::<String>(&expr)
        .expect_err("absent value");

    let classified = error.as_classified().expect("classified");
    assert_eq!(classified.code(), ErrorCode::TypeMismatch);
    assert_eq!(classified.severity(), &Severity::Error);
    assert_eq!(classified.message(), "Invalid type expression in main.tf:3");
    assert_eq!(
        classified.cause().map(ToString::to_string).as_deref(),
        Some(cause)
    );
}

#[rstest]
fn incompatible_value_is_a_conversion_error(expr: Expression) {
    let (client, _log) = client_answering(&DynamicValue::from(vec!["a", "b"]));

    let error = client
        .evaluate_expr::<String>(&expr)
        .expect_err("list is not a string");

    let classified = error.as_classified().expect("classified");
    assert_eq!(classified.code(), ErrorCode::TypeConversion);
    assert_eq!(
        error.to_string(),
        "Invalid type expression in main.tf:3; string required, found list"
    );
}

#[rstest]
fn unsupported_shape_fails_before_calling_the_host(expr: Expression) {
    let (client, log) = client_answering(&DynamicValue::from(true));

    let error = client
        .evaluate_expr_as(&expr, &TypeShape::Bool)
        .expect_err("bool is unsupported");

    let classified = error.as_classified().expect("classified");
    assert_eq!(classified.code(), ErrorCode::TypeConversion);
    assert!(log.calls().is_empty());
}

#[rstest]
fn narrowing_overflow_is_a_mismatch(expr: Expression) {
    let (client, _log) = client_answering(&DynamicValue::from(i64::from(i32::MAX) + 1));

    let error = client.evaluate_expr::<i32>(&expr).expect_err("overflow");

    assert_eq!(
        error.as_classified().map(ClassifiedError::code),
        Some(ErrorCode::TypeMismatch)
    );
}

#[rstest]
fn emit_issue_sends_rule_descriptor() {
    let connection = ScriptedConnection::new().respond(Value::Null);
    let log = connection.call_log();
    let client = Client::new(connection);
    let mut meta = Metadata::new();
    meta.insert(String::from("instance_type"), json!("t1.2xlarge"));

    client
        .emit_issue(
            &InstanceTypeRule,
            "\"t1.2xlarge\" is an invalid value as instance_type",
            &range_on_line(5),
            meta,
        )
        .expect("issue accepted");

    let calls = log.calls();
    let call = calls.first().expect("one call");
    assert_eq!(call.method, "Plugin.EmitIssue");
    assert_eq!(
        call.params["rule"],
        json!({
            "name": "aws_instance_invalid_type",
            "enabled": true,
            "severity": "error",
            "link": "https://example.com/rules/aws_instance_invalid_type",
        })
    );
    assert_eq!(call.params["location"]["start"]["line"], 5);
    assert_eq!(call.params["meta"], json!({"instance_type": "t1.2xlarge"}));
}

#[rstest]
fn emit_issue_on_expr_records_expression_source(expr: Expression) {
    let connection = ScriptedConnection::new().respond(Value::Null);
    let log = connection.call_log();
    let client = Client::new(connection);

    client
        .emit_issue_on_expr(&InstanceTypeRule, "invalid", &expr)
        .expect("issue accepted");

    let calls = log.calls();
    let call = calls.first().expect("one call");
    assert_eq!(call.params["meta"], json!({"expr": "var.instance_type"}));
    assert_eq!(call.params["location"]["start"]["line"], 3);
}

#[rstest]
fn runner_extension_works_through_trait_objects(expr: Expression) {
    let (client, _log) = client_answering(&DynamicValue::Unknown);
    let runner: &dyn Runner = &client;
    let mut emitted = false;

    let result = runner.evaluate_expr::<String>(&expr);
    runner
        .ensure_no_error(result, |_| {
            emitted = true;
            Ok(())
        })
        .expect_err("type mismatch has error severity");

    assert!(!emitted);
}
