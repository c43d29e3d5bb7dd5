#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub tourapi_service_key: String,
    pub tourapi_base_url: String,
    pub tourapi_mobile_app: String,
    pub tourapi_request_timeout_secs: u64,
    pub tourapi_max_retries: u32,
    pub tourapi_retry_backoff_base_ms: u64,
    /// Rows requested per listing page; also the "has more" threshold.
    pub page_size: u32,
    pub enrichment_cache_capacity: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("tourapi_service_key", &"[redacted]")
            .field("tourapi_base_url", &self.tourapi_base_url)
            .field("tourapi_mobile_app", &self.tourapi_mobile_app)
            .field(
                "tourapi_request_timeout_secs",
                &self.tourapi_request_timeout_secs,
            )
            .field("tourapi_max_retries", &self.tourapi_max_retries)
            .field(
                "tourapi_retry_backoff_base_ms",
                &self.tourapi_retry_backoff_base_ms,
            )
            .field("page_size", &self.page_size)
            .field("enrichment_cache_capacity", &self.enrichment_cache_capacity)
            .finish()
    }
}
