// Configuration module
//
// The worker reads one YAML file at startup. `${VAR}` references are replaced
// with environment variables before parsing, so deployment-specific values
// (queue URL, bucket) can be injected without editing the file. The result is
// immutable and handed to the pipeline at construction.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::DEFAULT_LOG_LEVEL;

pub mod queue;
pub mod watermark;

pub use queue::{AckMode, QueueConfig};
pub use watermark::WatermarkConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Destination for watermarked images.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OutputConfig {
    /// Bucket the results are written to (required)
    #[serde(default)]
    pub bucket: String,

    /// Key prefix for results; output key is `<path_prefix>/<file name>` (required)
    #[serde(default)]
    pub path_prefix: String,
}

/// Optional overrides for the AWS SDK's default provider chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AwsConfig {
    /// Region; falls back to AWS_REGION / profile when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Custom endpoint for S3/SQS-compatible services (LocalStack, MinIO)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,

    /// Path-style S3 addressing; forced on when `endpoint_url` is set
    #[serde(default)]
    pub force_path_style: bool,
}

impl AwsConfig {
    pub fn use_path_style(&self) -> bool {
        self.force_path_style || self.endpoint_url.is_some()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// text or json (default: text)
    #[serde(default)]
    pub format: LogFormat,

    /// Filter directive, e.g. `info` or `watermark_worker=debug`; RUST_LOG wins
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values, outside comments
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        let mut missing = None;
        let mut substituted = String::with_capacity(yaml.len());
        for line in yaml.split_inclusive('\n') {
            let (content, comment) = split_comment(line);
            let replaced = re.replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                match std::env::var(var_name) {
                    Ok(value) => value,
                    Err(_) => {
                        missing.get_or_insert_with(|| var_name.to_string());
                        String::new()
                    }
                }
            });
            substituted.push_str(&replaced);
            substituted.push_str(comment);
        }

        if let Some(var_name) = missing {
            return Err(format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            ));
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Check the required settings. A worker must not start without them.
    pub fn validate(&self) -> Result<(), String> {
        self.queue.validate()?;

        if self.output.bucket.trim().is_empty() {
            return Err("output.bucket is required".to_string());
        }
        if self.output.path_prefix.trim().is_empty() {
            return Err("output.path_prefix is required".to_string());
        }

        self.watermark.validate()?;

        if let Some(endpoint) = &self.aws.endpoint_url {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!(
                    "aws.endpoint_url '{}' must start with http:// or https://",
                    endpoint
                ));
            }
        }

        Ok(())
    }
}

/// Split a YAML line into its content and trailing comment.
///
/// A `#` starts a comment when it is outside quotes and begins the line or
/// follows whitespace, so `color: "#000"` and `a#b` are left intact.
fn split_comment(line: &str) -> (&str, &str) {
    let mut quote: Option<char> = None;
    let mut prev = ' ';
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some('"') if c == '\\' => {
                chars.next();
            }
            Some('\'') if c == '\'' && matches!(chars.peek(), Some((_, '\''))) => {
                chars.next();
            }
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if (c == '"' || c == '\'') && opens_scalar(prev) => quote = Some(c),
            None if c == '#' && prev.is_whitespace() => return line.split_at(i),
            None => {}
        }
        prev = c;
    }

    (line, "")
}

fn opens_scalar(prev: char) -> bool {
    prev.is_whitespace() || matches!(prev, ':' | '[' | '{' | ',')
}
