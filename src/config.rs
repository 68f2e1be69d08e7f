use crate::application::use_cases::DEFAULT_COPY_BUFFER_SIZE;

const MIN_COPY_BUFFER_SIZE: usize = 4096;
const MAX_COPY_BUFFER_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
    pub log_format: LogFormat,
    pub copy_buffer_size: usize,
    /// fsync the artifact before reporting success
    pub durable_writes: bool,
    /// Default compile command when the manifest names none
    pub compiler_command: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_filter: lookup("STUB_PACKER_LOG").unwrap_or_else(|| "info".to_string()),
            log_format: match lookup("STUB_PACKER_LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            copy_buffer_size: lookup("STUB_PACKER_COPY_BUFFER_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_COPY_BUFFER_SIZE),
            durable_writes: lookup("STUB_PACKER_DURABLE")
                .map(|s| matches!(s.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            compiler_command: lookup("STUB_PACKER_COMPILER").filter(|s| !s.trim().is_empty()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.log_filter.is_empty() {
            return Err("STUB_PACKER_LOG cannot be empty".to_string());
        }

        if !(MIN_COPY_BUFFER_SIZE..=MAX_COPY_BUFFER_SIZE).contains(&self.copy_buffer_size) {
            return Err(format!(
                "STUB_PACKER_COPY_BUFFER_SIZE must be between {} and {} bytes",
                MIN_COPY_BUFFER_SIZE, MAX_COPY_BUFFER_SIZE
            ));
        }

        Ok(())
    }
}
