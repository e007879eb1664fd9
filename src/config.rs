use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub index_path: String,
    pub backend_url: String,
    pub model_name: String,
    pub embedding_model_name: String,
    pub ocr_binary: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub session_ttl_hours: i64,
    pub backend_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            index_path: env::var("INDEX_PATH").unwrap_or_else(|_| "./quiz_index.db".to_string()),
            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model_name: env::var("MODEL_NAME").unwrap_or_else(|_| "llama3:8b".to_string()),
            embedding_model_name: env::var("EMBEDDING_MODEL_NAME")
                .unwrap_or_else(|_| "nomic-embed-text".to_string()),
            ocr_binary: env::var("OCR_BINARY").unwrap_or_else(|_| "tesseract".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(24),
            backend_timeout_secs: env::var("BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            index_path: "./quiz_index_test.db".to_string(),
            backend_url: "http://localhost:11434".to_string(),
            model_name: "llama3:8b".to_string(),
            embedding_model_name: "nomic-embed-text".to_string(),
            ocr_binary: "tesseract".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            session_ttl_hours: 1,
            backend_timeout_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = Config::from_env();

        // Should use env vars if set, or fall back to defaults
        assert!(!config.index_path.is_empty());
        assert!(!config.backend_url.is_empty());
        assert!(!config.model_name.is_empty());
        assert!(config.session_ttl_hours > 0);
    }

    #[test]
    fn test_test_config() {
        let config = Config::test_config();

        assert_eq!(config.backend_url, "http://localhost:11434");
        assert_eq!(config.model_name, "llama3:8b");
        assert_eq!(config.session_ttl_hours, 1);
    }
}
