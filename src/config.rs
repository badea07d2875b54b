use clap::{Args, Parser, ValueEnum};

/// Hard ceiling Telegram imposes on a single `sendMessage` text, in UTF-16 code units.
pub const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub telegram: TelegramConfig,

    #[command(flatten)]
    pub delivery: DeliveryConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "RELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "RELAY_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the management server (health probes)
    #[arg(long, env = "RELAY_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// How long to wait for in-flight requests during shutdown
    #[arg(long, env = "RELAY_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct TelegramConfig {
    /// Bot token issued by @BotFather
    #[arg(long = "telegram-bot-token", env = "TELEGRAM_BOT_TOKEN", default_value = "YOUR_BOT_TOKEN_HERE")]
    pub bot_token: String,

    /// Destination chat identifier
    #[arg(long = "telegram-chat-id", env = "TELEGRAM_CHAT_ID", default_value = "YOUR_CHAT_ID_HERE")]
    pub chat_id: String,

    /// Base URL of the Bot API (override for self-hosted API servers)
    #[arg(long = "telegram-api-url", env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub api_url: String,

    /// Formatting mode applied to outgoing text
    #[arg(long = "telegram-parse-mode", env = "TELEGRAM_PARSE_MODE", value_enum, default_value_t = ParseMode::Html)]
    pub parse_mode: ParseMode,

    /// Timeout for a single Bot API request
    #[arg(long = "telegram-request-timeout-secs", env = "TELEGRAM_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ParseMode {
    Html,
    MarkdownV2,
    Plain,
}

impl ParseMode {
    /// Value for the Bot API `parse_mode` field, `None` for plain text.
    #[must_use]
    pub const fn as_api_value(self) -> Option<&'static str> {
        match self {
            Self::Html => Some("HTML"),
            Self::MarkdownV2 => Some("MarkdownV2"),
            Self::Plain => None,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct DeliveryConfig {
    /// Maximum length of an outgoing message part, in UTF-16 code units
    #[arg(long, env = "RELAY_MAX_PART_LENGTH", default_value_t = 4000)]
    pub max_part_length: usize,

    /// A newline only becomes the cut point if it keeps more than this share of the part budget
    #[arg(
        long,
        env = "RELAY_NEWLINE_THRESHOLD_PERCENT",
        default_value_t = 80,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub newline_threshold_percent: u8,

    /// Pause between consecutive parts, to stay under the Bot API rate limits
    #[arg(long, env = "RELAY_PART_PAUSE_MS", default_value_t = 500)]
    pub part_pause_ms: u64,

    /// Append a "(Part i/n)" label to multi-part messages
    #[arg(long, env = "RELAY_PART_LABELS", default_value_t = true, action = clap::ArgAction::Set)]
    pub part_labels: bool,

    /// Report pipeline failures as 502 instead of the tolerant 200 soft failure
    #[arg(long, env = "RELAY_STRICT_FAILURE_STATUS", default_value_t = false)]
    pub strict_failure_status: bool,
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the Telegram readiness check
    #[arg(long, env = "RELAY_HEALTH_TIMEOUT_MS", default_value_t = 2000)]
    pub timeout_ms: u64,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "RELAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; traces and metrics are only exported when set
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    pub fn load() -> Self {
        Self::parse()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_from(["transcript-relay"])
    }
}
