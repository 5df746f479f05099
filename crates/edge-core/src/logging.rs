//! 로깅 초기화.
//!
//! 워커는 작업마다 `job_id`, `ticker`, `kind` 필드가 붙은 span 안에서 실행되므로
//! 운영 환경에서는 json, 로컬에서는 pretty 형식을 권장합니다.

use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

use crate::config::LoggingConfig;
use crate::error::{CoreError, CoreResult};

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    /// 한 줄 JSON (로그 수집기용)
    Json,
    Compact,
}

impl FromStr for LogFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(CoreError::Logging(format!("unknown log format '{}'", other))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        };
        f.write_str(s)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` 지시문 (예: "info,edge_worker=debug")
    pub level: String,
    pub format: LogFormat,
    /// span 진입/종료 이벤트 출력
    pub span_events: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            span_events: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// 설정 파일의 `[logging]` 섹션에서 생성합니다. 형식을 알 수 없으면 pretty.
    pub fn from_settings(settings: &LoggingConfig) -> Self {
        Self {
            level: settings.level.clone(),
            format: settings.format.parse().unwrap_or_default(),
            span_events: false,
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = tracing_subscriber::fmt::layer().with_span_events(span_events);

        match self.format {
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Json => layer.json().with_current_span(true).boxed(),
            LogFormat::Compact => layer.compact().with_target(false).boxed(),
        }
    }
}

/// 전역 subscriber를 설치합니다. 프로세스당 한 번만 호출할 수 있습니다.
///
/// `RUST_LOG`가 있으면 `config.level`보다 우선합니다.
///
/// ```no_run
/// use edge_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> CoreResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| CoreError::Logging(format!("invalid filter '{}': {}", config.level, e)))?,
    };

    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(filter)
        .try_init()
        .map_err(|e| CoreError::Logging(e.to_string()))?;

    tracing::info!(format = %config.format, filter = %config.level, "Logging initialized");
    Ok(())
}

/// 작업 컨텍스트(`ticker`, `job_id`, `kind`)를 담은 info span.
#[macro_export]
macro_rules! job_span {
    ($name:expr, $ticker:expr) => {
        tracing::info_span!($name, ticker = %$ticker)
    };
    ($name:expr, $ticker:expr, $job_id:expr) => {
        tracing::info_span!($name, ticker = %$ticker, job_id = %$job_id)
    };
    ($name:expr, $ticker:expr, $job_id:expr, $kind:expr) => {
        tracing::info_span!($name, ticker = %$ticker, job_id = %$job_id, kind = %$kind)
    };
}
