use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub ocr: OcrConfig,
    pub llm: LlmConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root directory for uploaded documents (`temp/` and `processed/` live below it)
    pub upload_dir: PathBuf,
    /// How long a terminal job stays in the in-memory registry
    pub job_retention: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Configuration for the OCR provider (LLMWhisperer-compatible API)
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub base_url: String,
    pub api_key: String,
    pub submit_timeout: Duration,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

/// Configuration for the OpenAI-compatible language model service
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    /// Extracted text is truncated to this many characters before extraction
    pub max_input_chars: usize,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub interval: Duration,
    pub batch_size: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            ocr: OcrConfig::from_env()?,
            llm: LlmConfig::from_env()?,
            worker: WorkerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_UPLOAD_DIR: &'static str = "uploads";
    const DEFAULT_JOB_RETENTION_SECS: u64 = 3600; // 1 hour

    pub fn from_env() -> Result<Self, String> {
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(Self::DEFAULT_UPLOAD_DIR));

        let job_retention_secs = env::var("JOB_RETENTION_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_JOB_RETENTION_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JOB_RETENTION_SECS must be a valid number".to_string())?;

        Ok(Self {
            upload_dir,
            job_retention: Duration::from_secs(job_retention_secs),
        })
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl OcrConfig {
    const DEFAULT_BASE_URL: &'static str = "https://llmwhisperer-api.us-central.unstract.com";
    const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 180; // 3 minutes
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
    pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 20;

    pub fn from_env() -> Result<Self, String> {
        let base_url =
            env::var("OCR_BASE_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string());

        let api_key = env::var("UNSTRACT_API_KEY")
            .map_err(|_| "UNSTRACT_API_KEY environment variable is required".to_string())?;

        let submit_timeout_secs = env::var("OCR_SUBMIT_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_SUBMIT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "OCR_SUBMIT_TIMEOUT_SECS must be a valid number".to_string())?;

        let poll_interval_secs = env::var("OCR_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_POLL_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "OCR_POLL_INTERVAL_SECS must be a valid number".to_string())?;

        let max_poll_attempts = env::var("OCR_MAX_POLL_ATTEMPTS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_POLL_ATTEMPTS.to_string())
            .parse::<u32>()
            .map_err(|_| "OCR_MAX_POLL_ATTEMPTS must be a valid number".to_string())?;

        if max_poll_attempts == 0 {
            return Err("OCR_MAX_POLL_ATTEMPTS must be at least 1".to_string());
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            submit_timeout: Duration::from_secs(submit_timeout_secs),
            poll_interval: Duration::from_secs(poll_interval_secs),
            max_poll_attempts,
        })
    }
}

impl LlmConfig {
    const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    const DEFAULT_MODEL: &'static str = "gpt-4o";
    const DEFAULT_TEMPERATURE: f32 = 0.2;
    pub const DEFAULT_MAX_INPUT_CHARS: usize = 10_000;

    pub fn from_env() -> Result<Self, String> {
        let base_url =
            env::var("LLM_BASE_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string());

        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| "OPENAI_API_KEY environment variable is required".to_string())?;

        let model = env::var("LLM_MODEL").unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string());

        let temperature = env::var("LLM_TEMPERATURE")
            .unwrap_or_else(|_| Self::DEFAULT_TEMPERATURE.to_string())
            .parse::<f32>()
            .map_err(|_| "LLM_TEMPERATURE must be a valid number".to_string())?;

        let max_input_chars = env::var("EXTRACTION_MAX_CHARS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_INPUT_CHARS.to_string())
            .parse::<usize>()
            .map_err(|_| "EXTRACTION_MAX_CHARS must be a valid number".to_string())?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            temperature,
            max_input_chars,
        })
    }
}

impl WorkerConfig {
    const DEFAULT_INTERVAL_SECS: u64 = 30;
    const DEFAULT_BATCH_SIZE: i64 = 10;

    pub fn from_env() -> Result<Self, String> {
        let interval_secs = env::var("WORKER_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "WORKER_INTERVAL_SECS must be a valid number".to_string())?;

        let batch_size = env::var("WORKER_BATCH_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_BATCH_SIZE.to_string())
            .parse::<i64>()
            .map_err(|_| "WORKER_BATCH_SIZE must be a valid number".to_string())?;

        Ok(Self {
            interval: Duration::from_secs(interval_secs.max(1)),
            batch_size,
        })
    }
}
