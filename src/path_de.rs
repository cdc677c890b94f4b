use serde::de::DeserializeOwned;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(describe)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(describe)
}

/// Same, for documents already parsed (after jq or JSON pointer selection).
pub fn from_value_with_path<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, String> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(describe)
}

fn describe(err: serde_path_to_error::Error<serde_json::Error>) -> String {
    let path = err.path().to_string();
    format!("at JSON path {path} → {}", err.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceFile;

    #[test]
    fn error_names_the_failing_path() {
        let src = r#"{ "package": "p", "decls": [ { "decl": "gen", "specs": [ { "spec": "type", "name": "A" } ] } ] }"#;
        let err = from_str_with_path::<SourceFile>(src).unwrap_err();
        assert!(err.contains("decls[0]"), "{err}");
    }

    #[test]
    fn value_and_slice_entry_points_agree() {
        let value = serde_json::json!({ "package": "p" });
        let from_value: SourceFile = from_value_with_path(value.clone()).unwrap();
        let from_slice: SourceFile = from_slice_with_path(value.to_string().as_bytes()).unwrap();
        assert_eq!(from_value, from_slice);
    }
}
