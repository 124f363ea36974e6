use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// Directory for the embedded project registry
    pub data_dir: String,
    pub storage: StorageConfig,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the local storage backend
    pub local_storage_path: String,
    /// Bucket name (required when backend is s3)
    pub s3_bucket: Option<String>,
    /// Endpoint URL, e.g. http://127.0.0.1:9000 for MinIO-style stores
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_storage_path: "./sites".to_string(),
            s3_bucket: None,
            s3_endpoint: "https://s3.amazonaws.com".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_access_key_id: None,
            s3_secret_access_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            _ => StorageBackend::Local,
        };

        let local_storage_path =
            std::env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./sites".to_string());

        let s3_endpoint =
            std::env::var("S3_ENDPOINT").unwrap_or_else(|_| "https://s3.amazonaws.com".to_string());
        let s3_region = std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let config = Config {
            bind_address,
            data_dir,
            storage: StorageConfig {
                backend,
                local_storage_path,
                s3_bucket: std::env::var("S3_BUCKET").ok(),
                s3_endpoint,
                s3_region,
                s3_access_key_id: std::env::var("S3_ACCESS_KEY_ID").ok(),
                s3_secret_access_key: std::env::var("S3_SECRET_ACCESS_KEY").ok(),
            },
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.storage.backend, StorageBackend::S3) {
            if self.storage.s3_bucket.is_none() {
                return Err(ConfigError::ValidationError(
                    "S3_BUCKET is required when STORAGE_BACKEND=s3".to_string(),
                ));
            }
            if self.storage.s3_access_key_id.is_none()
                || self.storage.s3_secret_access_key.is_none()
            {
                return Err(ConfigError::ValidationError(
                    "S3_ACCESS_KEY_ID and S3_SECRET_ACCESS_KEY are required when STORAGE_BACKEND=s3"
                        .to_string(),
                ));
            }
        }

        Ok(())
    }
}
