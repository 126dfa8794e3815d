//! Payload loader

use crate::error::{Error, Result};
use crate::payload::Payload;
use std::path::Path;

/// Loads parser payloads from disk
pub struct PayloadLoader;

impl PayloadLoader {
    /// Load a payload from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Payload> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Payload(format!("Failed to read payload file {}: {}", path.display(), e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext {
            "json" | "" => {
                let payload = Self::from_json(&content)?;
                tracing::debug!("Loaded payload with {} file(s) from {}", payload.config.len(), path.display());
                Ok(payload)
            }
            _ => Err(Error::Payload(format!("Unknown payload format: {}", ext))),
        }
    }

    /// Parse a JSON payload
    pub fn from_json(content: &str) -> Result<Payload> {
        serde_json::from_str(content)
            .map_err(|e| Error::Payload(format!("Invalid JSON: {}", e)))
    }

    /// Serialize a payload to pretty JSON
    pub fn to_json(payload: &Payload) -> Result<String> {
        Ok(serde_json::to_string_pretty(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_json_loading() {
        let json = r#"{"config": []}"#;
        let payload = PayloadLoader::from_json(json).unwrap();
        assert!(payload.config.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"config": [{{"file": "nginx.conf", "parsed": []}}]}}"#).unwrap();

        let payload = PayloadLoader::load(file.path()).unwrap();
        assert_eq!(payload.config[0].file, "nginx.conf");
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(PayloadLoader::load(file.path()), Err(Error::Payload(_))));
    }
}
