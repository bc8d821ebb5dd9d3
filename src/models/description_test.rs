#[cfg(test)]
mod tests {
    use super::super::description::{InterfaceDescription, VersionToken};
    use serde_json::json;

    #[test]
    fn test_version_token_prefers_version_field() {
        let doc = json!({"version": "1.2.0", "commit": "abc123", "date": "2025-10-01"});
        assert_eq!(VersionToken::from_document(&doc), Some("1.2.0".into()));
    }

    #[test]
    fn test_version_token_falls_back_to_commit_then_date() {
        let doc = json!({"commit": "abc123", "date": "2025-10-01"});
        assert_eq!(VersionToken::from_document(&doc), Some("abc123".into()));

        let doc = json!({"version": null, "date": "2025-10-01"});
        assert_eq!(VersionToken::from_document(&doc), Some("2025-10-01".into()));
    }

    #[test]
    fn test_version_token_stringifies_numbers() {
        let doc = json!({"version": 3});
        assert_eq!(VersionToken::from_document(&doc), Some("3".into()));
    }

    #[test]
    fn test_version_token_missing() {
        assert_eq!(VersionToken::from_document(&json!({"status": "ok"})), None);
        assert_eq!(VersionToken::from_document(&json!({"version": ""})), None);
    }

    #[test]
    fn test_endpoint_count() {
        let desc = InterfaceDescription::new(json!({
            "openapi": "3.1.0",
            "paths": {"/a": {}, "/b": {}}
        }));
        assert_eq!(desc.endpoint_count(), 2);
        assert!(desc.format_version().is_some());

        let empty = InterfaceDescription::new(json!({"openapi": "3.1.0"}));
        assert_eq!(empty.endpoint_count(), 0);
    }
}
