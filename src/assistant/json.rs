/// Recovers the outermost JSON object span from model output that may be
/// wrapped in prose or code fences. Returns `None` when no `{...}` span
/// exists at all.
pub fn extract_json_object(value: &str) -> Option<&str> {
    let start = value.find('{')?;
    let end = value.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&value[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_bare_object() {
        assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_extracts_wrapped_object() {
        let wrapped = "Sure! Here you go:\n```json\n{\"a\":1}\n```";
        assert_eq!(extract_json_object(wrapped), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_rejects_proseless_text() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
        assert_eq!(extract_json_object(""), None);
    }
}
