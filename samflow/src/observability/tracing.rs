//! Tracing subscriber setup and structured span attributes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "SAMFLOW_LOG_FORMAT";

const DEFAULT_FILTER: &str = "samflow=info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything other than `json` means text.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }

    /// Reads the format from `SAMFLOW_LOG_FORMAT`.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV).map_or(Self::Text, |v| Self::parse(&v))
    }
}

/// Installs a global subscriber filtered by `RUST_LOG` (default `samflow=info`).
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };
    result.is_ok()
}

/// Attributes describing a pipeline being synthesized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSpanAttributes {
    /// Pipeline name.
    pub pipeline_name: Option<String>,
    /// Synthesis id.
    pub synthesis_id: Option<String>,
    /// Number of stages.
    pub stage_count: Option<usize>,
    /// Whether an approval stage is present.
    pub has_approval: Option<bool>,
    /// Declaration fingerprint.
    pub fingerprint: Option<String>,
}

impl PipelineSpanAttributes {
    /// Creates new pipeline span attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = Some(name.into());
        self
    }

    /// Sets the synthesis id.
    #[must_use]
    pub fn with_synthesis_id(mut self, id: impl Into<String>) -> Self {
        self.synthesis_id = Some(id.into());
        self
    }

    /// Sets the stage count and approval flag.
    #[must_use]
    pub fn with_shape(mut self, stage_count: usize, has_approval: bool) -> Self {
        self.stage_count = Some(stage_count);
        self.has_approval = Some(has_approval);
        self
    }

    /// Sets the fingerprint.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Flattens into dotted attribute keys.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        if let Some(ref v) = self.pipeline_name {
            attrs.insert("pipeline.name".to_string(), v.clone());
        }
        if let Some(ref v) = self.synthesis_id {
            attrs.insert("pipeline.synthesis_id".to_string(), v.clone());
        }
        if let Some(v) = self.stage_count {
            attrs.insert("pipeline.stage_count".to_string(), v.to_string());
        }
        if let Some(v) = self.has_approval {
            attrs.insert("pipeline.has_approval".to_string(), v.to_string());
        }
        if let Some(ref v) = self.fingerprint {
            attrs.insert("pipeline.fingerprint".to_string(), v.clone());
        }

        attrs
    }
}

/// Attributes describing one assembled stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageSpanAttributes {
    /// Stage name.
    pub stage_name: String,
    /// Stage kind.
    pub stage_kind: Option<String>,
    /// Identity logical id.
    pub identity: Option<String>,
    /// Attached statement count.
    pub statement_count: usize,
}

impl StageSpanAttributes {
    /// Creates new stage span attributes.
    #[must_use]
    pub fn new(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            ..Default::default()
        }
    }

    /// Sets the stage kind.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.stage_kind = Some(kind.into());
        self
    }

    /// Sets the identity and its statement count.
    #[must_use]
    pub fn with_identity(mut self, logical_id: impl Into<String>, statement_count: usize) -> Self {
        self.identity = Some(logical_id.into());
        self.statement_count = statement_count;
        self
    }

    /// Flattens into dotted attribute keys.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        attrs.insert("stage.name".to_string(), self.stage_name.clone());
        if let Some(ref v) = self.stage_kind {
            attrs.insert("stage.kind".to_string(), v.clone());
        }
        if let Some(ref v) = self.identity {
            attrs.insert("stage.identity".to_string(), v.clone());
        }
        attrs.insert("stage.statement_count".to_string(), self.statement_count.to_string());

        attrs
    }
}
