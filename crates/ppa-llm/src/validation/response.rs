use serde_json::Value;

use super::{as_non_negative_integer, non_empty_str, present};

const USAGE_FIELDS: [&str; 3] = ["promptTokens", "completionTokens", "totalTokens"];

pub(super) fn check(response: &Value) -> Vec<String> {
    if response.is_null() {
        return vec!["Response must not be null".to_string()];
    }
    let Some(object) = response.as_object() else {
        return vec!["Response must be an object".to_string()];
    };

    let mut errors = Vec::new();

    if non_empty_str(object.get("content")).is_none() {
        errors.push("Response content must be a non-empty string".to_string());
    }

    if let Some(usage) = present(object, "usage") {
        check_usage(usage, &mut errors);
    }

    errors
}

fn check_usage(usage: &Value, errors: &mut Vec<String>) {
    let Some(usage) = usage.as_object() else {
        errors.push("Usage must be an object".to_string());
        return;
    };

    let mut counts = Vec::with_capacity(USAGE_FIELDS.len());
    for field in USAGE_FIELDS {
        match usage.get(field).and_then(as_non_negative_integer) {
            Some(count) => counts.push(count),
            None => errors.push(format!("Usage field {} must be a non-negative integer", field)),
        }
    }

    if let [prompt, completion, total] = counts[..] {
        if prompt.checked_add(completion) != Some(total) {
            errors.push("Total tokens must equal prompt tokens plus completion tokens".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_consistent_usage() {
        let response = json!({
            "content": "fn main() {}",
            "usage": { "promptTokens": 10, "completionTokens": 5, "totalTokens": 15 }
        });
        assert!(check(&response).is_empty());
    }

    #[test]
    fn test_inconsistent_total() {
        let response = json!({
            "content": "ok",
            "usage": { "promptTokens": 10, "completionTokens": 5, "totalTokens": 16 }
        });
        assert_eq!(
            check(&response),
            vec!["Total tokens must equal prompt tokens plus completion tokens".to_string()]
        );
    }

    #[test]
    fn test_token_sum_is_exact_for_large_counts() {
        let beyond_f64 = 1u64 << 53;
        let response = json!({
            "content": "ok",
            "usage": {
                "promptTokens": beyond_f64,
                "completionTokens": 1,
                "totalTokens": beyond_f64
            }
        });
        assert_eq!(
            check(&response),
            vec!["Total tokens must equal prompt tokens plus completion tokens".to_string()]
        );

        let overflowing = json!({
            "content": "ok",
            "usage": { "promptTokens": u64::MAX, "completionTokens": 1, "totalTokens": 0 }
        });
        assert_eq!(
            check(&overflowing),
            vec!["Total tokens must equal prompt tokens plus completion tokens".to_string()]
        );

        let at_limit = json!({
            "content": "ok",
            "usage": { "promptTokens": u64::MAX - 1, "completionTokens": 1, "totalTokens": u64::MAX }
        });
        assert!(check(&at_limit).is_empty());
    }

    #[test]
    fn test_integral_floats_count_as_integers() {
        let response = json!({
            "content": "ok",
            "usage": { "promptTokens": 2.0, "completionTokens": 3, "totalTokens": 5.0 }
        });
        assert!(check(&response).is_empty());
    }

    #[test]
    fn test_invalid_usage_field_skips_sum() {
        let response = json!({
            "content": "ok",
            "usage": { "promptTokens": -3, "completionTokens": 5, "totalTokens": 2 }
        });
        assert_eq!(
            check(&response),
            vec!["Usage field promptTokens must be a non-negative integer".to_string()]
        );
    }

    #[test]
    fn test_usage_is_optional_but_content_is_not() {
        assert!(check(&json!({ "content": "hi" })).is_empty());
        assert_eq!(
            check(&json!({ "content": "", "usage": 7 })),
            vec![
                "Response content must be a non-empty string".to_string(),
                "Usage must be an object".to_string(),
            ]
        );
    }

    #[test]
    fn test_null_and_non_object() {
        assert_eq!(check(&Value::Null), vec!["Response must not be null".to_string()]);
        assert_eq!(check(&json!("text")), vec!["Response must be an object".to_string()]);
    }
}
