// tests/transform_tests.rs

use chrono::{TimeZone, Utc};
use recipe_filter::{Engine, Error, EvalError, Value, bucket_sample, stable_sample};
use serde_json::json;

async fn eval(expression: &str) -> Result<Value, Error> {
    Engine::new().evaluate(expression, &Value::Null).await
}

async fn eval_in(expression: &str, context: serde_json::Value) -> Result<Value, Error> {
    Engine::new().evaluate(expression, &Value::from(context)).await
}

fn is_invalid_arguments(result: Result<Value, Error>, transform: &str) -> bool {
    matches!(result, Err(Error::Eval(EvalError::InvalidArguments { name, .. })) if name == transform)
}

// ============================================================================
// date
// ============================================================================

#[tokio::test]
async fn test_date_formats() {
    let expected = Value::Date(Utc.with_ymd_and_hms(2017, 3, 4, 5, 6, 7).unwrap());
    let test_cases = vec![
        "'2017-03-04T05:06:07Z'|date",
        "'2017-03-04T05:06:07.000Z'|date",
        "'2017-03-04T07:06:07+02:00'|date",
        "'2017-03-04T05:06:07'|date",
    ];

    for expression in test_cases {
        assert_eq!(eval(expression).await, Ok(expected.clone()), "Failed for: {}", expression);
    }
}

#[tokio::test]
async fn test_date_only() {
    assert_eq!(
        eval("'2017-03-04'|date").await,
        Ok(Value::Date(Utc.with_ymd_and_hms(2017, 3, 4, 0, 0, 0).unwrap()))
    );
}

#[tokio::test]
async fn test_date_from_epoch_millis() {
    assert_eq!(
        eval("1000|date").await,
        Ok(Value::Date(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 1).unwrap()))
    );
}

#[tokio::test]
async fn test_date_comparison() {
    let context = json!({"profile": {"created": "2016-05-01T00:00:00Z"}});
    assert_eq!(
        eval_in("profile.created|date < '2017-01-01'|date", context.clone()).await,
        Ok(Value::Boolean(true))
    );
    assert_eq!(
        eval_in("profile.created|date == '2016-05-01'|date", context).await,
        Ok(Value::Boolean(true))
    );
}

#[tokio::test]
async fn test_date_is_idempotent() {
    assert_eq!(
        eval("'2017-01-01'|date|date == '2017-01-01'|date").await,
        Ok(Value::Boolean(true))
    );
}

#[tokio::test]
async fn test_date_renders_as_iso_string() {
    let result = eval("'2017-03-04T05:06:07Z'|date").await.unwrap();
    assert_eq!(result.to_json(), json!("2017-03-04T05:06:07.000Z"));
}

#[tokio::test]
async fn test_invalid_date() {
    assert!(matches!(
        eval("'yesterday'|date").await,
        Err(Error::Eval(EvalError::InvalidDate(_)))
    ));
    assert!(matches!(
        eval("[1]|date").await,
        Err(Error::Eval(EvalError::InvalidDate(_)))
    ));
}

// ============================================================================
// stableSample and bucketSample
// ============================================================================

#[tokio::test]
async fn test_stable_sample_transform() {
    assert_eq!(eval("['test-1']|stableSample(0.5)").await, Ok(Value::Boolean(true)));
    assert_eq!(eval("['test-4']|stableSample(0.5)").await, Ok(Value::Boolean(false)));
    assert_eq!(eval("['test']|stableSample(1)").await, Ok(Value::Boolean(true)));
    assert_eq!(eval("['test']|stableSample(0)").await, Ok(Value::Boolean(false)));
}

#[tokio::test]
async fn test_stable_sample_transform_matches_function() {
    let context = json!({"normandy": {"userId": "a1b2c3", "recipe": {"id": 42}}});
    let input = Value::from(json!(["a1b2c3", 42]));

    for rate in [0.1, 0.5, 0.9] {
        let expression = format!(
            "[normandy.userId, normandy.recipe.id]|stableSample({})",
            rate
        );
        assert_eq!(
            eval_in(&expression, context.clone()).await,
            Ok(Value::Boolean(stable_sample(&input, rate).unwrap()))
        );
    }
}

#[tokio::test]
async fn test_bucket_sample_transform_matches_function() {
    let context = json!({"normandy": {"userId": "a1b2c3"}});
    let input = Value::from(json!(["a1b2c3", "salt"]));

    for start in [0, 3, 8] {
        let expression = format!(
            "[normandy.userId, 'salt']|bucketSample({}, 5, 10)",
            start
        );
        assert_eq!(
            eval_in(&expression, context.clone()).await,
            Ok(Value::Boolean(bucket_sample(&input, start, 5, 10).unwrap()))
        );
    }
}

#[tokio::test]
async fn test_sampling_in_filter_expression() {
    let context = json!({"normandy": {"userId": "u", "channel": "release"}});
    assert_eq!(
        eval_in(
            "normandy.channel == 'release' && [normandy.userId]|bucketSample(0, 10, 10)",
            context
        )
        .await,
        Ok(Value::Boolean(true))
    );
}

#[tokio::test]
async fn test_sampling_argument_errors() {
    assert!(is_invalid_arguments(eval("'x'|stableSample").await, "stableSample"));
    assert!(is_invalid_arguments(eval("'x'|stableSample('half')").await, "stableSample"));
    assert!(is_invalid_arguments(eval("'x'|bucketSample(1, 2)").await, "bucketSample"));
    assert!(is_invalid_arguments(eval("'x'|bucketSample(0.5, 2, 10)").await, "bucketSample"));
}

// ============================================================================
// Collection helpers
// ============================================================================

#[tokio::test]
async fn test_keys() {
    assert_eq!(
        eval_in("prefs|keys", json!({"prefs": {"b": 1, "a": 2}})).await.unwrap().to_json(),
        json!(["a", "b"])
    );
    assert_eq!(eval("'str'|keys").await, Ok(Value::Null));
}

#[tokio::test]
async fn test_length() {
    let test_cases = vec![
        ("'héllo'|length", Value::Integer(5)),
        ("[1, 2, 3]|length", Value::Integer(3)),
        ("{a: 1}|length", Value::Integer(1)),
        ("null|length", Value::Null),
    ];

    for (expression, expected) in test_cases {
        assert_eq!(eval(expression).await, Ok(expected), "Failed for: {}", expression);
    }
}

#[tokio::test]
async fn test_map_to_property() {
    let context = json!({"addons": [{"id": "a"}, {"name": "no id"}, 3]});
    assert_eq!(
        eval_in("addons|mapToProperty('id')", context).await.unwrap().to_json(),
        json!(["a", null, null])
    );
    assert!(matches!(
        eval("'x'|mapToProperty('id')").await,
        Err(Error::Eval(EvalError::TypeError(_)))
    ));
    assert!(is_invalid_arguments(eval("[]|mapToProperty").await, "mapToProperty"));
}

#[tokio::test]
async fn test_map_to_property_membership() {
    let context = json!({"addons": [{"id": "uBlock"}, {"id": "other"}]});
    assert_eq!(
        eval_in("'uBlock' in addons|mapToProperty('id')", context).await,
        Ok(Value::Boolean(true))
    );
}

// ============================================================================
// regExpMatch
// ============================================================================

#[tokio::test]
async fn test_regexp_match_groups() {
    let result = eval(r#"'Firefox 57.0'|regExpMatch('(\\d+)\\.(\\d+)')"#).await.unwrap();
    assert_eq!(result.to_json(), json!(["57.0", "57", "0"]));
}

#[tokio::test]
async fn test_regexp_match_flags() {
    assert_eq!(
        eval("'FIREFOX'|regExpMatch('firefox', 'i')").await.unwrap().to_json(),
        json!(["FIREFOX"])
    );
    assert_eq!(
        eval(r#"'a1 b2 c3'|regExpMatch('[a-z]\\d', 'g')"#).await.unwrap().to_json(),
        json!(["a1", "b2", "c3"])
    );
}

#[tokio::test]
async fn test_regexp_match_without_match() {
    assert_eq!(eval("'abc'|regExpMatch('\\\\d')").await, Ok(Value::Null));
    assert_eq!(eval("5|regExpMatch('5')").await, Ok(Value::Null));
}

#[tokio::test]
async fn test_regexp_match_truthiness() {
    assert_eq!(
        eval("'nightly'|regExpMatch('^night') ? 'pre' : 'rel'").await,
        Ok(Value::from("pre"))
    );
}

#[tokio::test]
async fn test_invalid_regexp() {
    assert!(matches!(
        eval("'abc'|regExpMatch('(')").await,
        Err(Error::Eval(EvalError::InvalidRegex(_)))
    ));
    assert!(is_invalid_arguments(eval("'abc'|regExpMatch(1)").await, "regExpMatch"));
}
