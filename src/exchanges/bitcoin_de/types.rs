pub use crate::core::types::ApiErrorEntry;
use serde_json::Value;

/// The `errors` list of a decoded response, if present and non-empty
pub fn reported_errors(payload: &Value) -> Option<Vec<ApiErrorEntry>> {
    let errors = payload.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    Some(errors.iter().map(ApiErrorEntry::from_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reported_errors() {
        let payload = json!({
            "errors": [
                {"message": "invalid nonce", "code": 4},
                {"message": "Missing parameter", "code": 9, "field": "amount"}
            ],
            "credits": 19
        });
        let errors = reported_errors(&payload).unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message.as_deref(), Some("invalid nonce"));
        assert_eq!(errors[0].code, Some(4));
        assert_eq!(errors[1].field.as_deref(), Some("amount"));
    }

    #[test]
    fn test_no_reported_errors() {
        assert!(reported_errors(&json!({"errors": [], "credits": 20})).is_none());
        assert!(reported_errors(&json!({"data": {"balances": {}}})).is_none());
        assert!(reported_errors(&json!({"errors": "not a list"})).is_none());
        assert!(reported_errors(&json!([1, 2, 3])).is_none());
    }
}
