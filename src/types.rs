//! Core types: job records, identifiers, statuses and API envelopes

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

/// Status strings the upstream uses for a finished job (compared lowercase)
pub const COMPLETED_STATUSES: [&str; 5] = ["completed", "success", "done", "finished", "succeeded"];

/// Status strings the upstream uses for a failed job (compared lowercase)
pub const FAILED_STATUSES: [&str; 3] = ["failed", "error", "failure"];

/// Message reported for a failed job whose record carries no error text
pub const DEFAULT_FAILURE_MESSAGE: &str = "video generation failed";

/// Pick the first candidate that is present and non-empty.
///
/// Every alias lookup on [`JobRecord`] and on upstream acknowledgements goes
/// through here, so precedence is decided only by the order of `candidates`.
pub fn first_present<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates.into_iter().flatten().find(|v| !v.is_empty())
}

/// One entry of the upstream job listing
///
/// The upstream is loosely typed: several field names carry the same meaning
/// and scalar fields may arrive as strings or numbers. Unknown fields are kept
/// in `extra` so the record can be passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Native id (string or number)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Native task id, camelCase spelling
    #[serde(
        rename = "taskId",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_id_camel: Option<String>,

    /// Native task id, snake_case spelling
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_id: Option<String>,

    /// Free-text status
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,

    /// Canonical artifact URL
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,

    /// Artifact URL, camelCase spelling
    #[serde(
        rename = "videoUrl",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub video_url_camel: Option<String>,

    /// Artifact URL, snake_case spelling
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub video_url: Option<String>,

    /// Error text
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<String>,

    /// Generic message text
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,

    /// Every other field, preserved for pass-through
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl JobRecord {
    /// Native id in string form; `None` when absent or null
    pub fn native_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Native task id: `taskId` before `task_id`
    pub fn native_task_id(&self) -> Option<&str> {
        first_present([self.task_id_camel.as_deref(), self.task_id.as_deref()])
    }

    /// Artifact URL: `url`, then `videoUrl`, then `video_url`
    pub fn artifact_url(&self) -> Option<&str> {
        first_present([
            self.url.as_deref(),
            self.video_url_camel.as_deref(),
            self.video_url.as_deref(),
        ])
    }

    /// Failure text: `error` before `message`
    pub fn error_message(&self) -> Option<&str> {
        first_present([self.error.as_deref(), self.message.as_deref()])
    }

    /// Status classified into pending / completed / failed
    pub fn job_status(&self) -> JobStatus {
        JobStatus::classify(self.status.as_deref().unwrap_or_default())
    }
}

/// Classification of an upstream status string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Not finished yet (or an unrecognized status)
    Pending,
    /// Finished successfully
    Completed,
    /// Finished with a failure
    Failed,
}

impl JobStatus {
    /// Classify a raw upstream status, case-insensitively
    pub fn classify(raw: &str) -> Self {
        let status = raw.trim().to_lowercase();
        if COMPLETED_STATUSES.contains(&status.as_str()) {
            JobStatus::Completed
        } else if FAILED_STATUSES.contains(&status.as_str()) {
            JobStatus::Failed
        } else {
            JobStatus::Pending
        }
    }
}

/// Identifier a caller wants resolved against the listing
///
/// May carry a `::`-delimited suffix such as a model tag
/// (`"abc123::seedance-1-5-pro"`); the part before the first `::` is the
/// core identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestedIdentifier(String);

impl RequestedIdentifier {
    /// Wrap a raw identifier
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The identifier as given
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier with any `::suffix` removed
    pub fn core(&self) -> &str {
        self.0.split("::").next().unwrap_or_default()
    }
}

impl std::fmt::Display for RequestedIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestedIdentifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RequestedIdentifier {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Request body for POST /api/video/create
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoCreateRequest {
    /// Model name; the configured default model when omitted
    #[serde(default)]
    pub model: Option<String>,

    /// Text prompt describing the video
    pub prompt: String,

    /// Duration in seconds, 1..=10 (default: 5)
    #[serde(default = "default_duration")]
    pub duration: u32,

    /// Aspect ratio such as "16:9", "9:16", "1:1" (default: "16:9")
    #[serde(rename = "radio", alias = "ratio", default = "default_ratio")]
    pub ratio: String,

    /// Source image URL for image-to-video
    #[serde(default)]
    pub image: Option<String>,
}

impl VideoCreateRequest {
    /// Reject requests the upstream would refuse anyway
    pub fn validate(&self) -> crate::Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(crate::Error::Validation("prompt must not be empty".into()));
        }
        if !(1..=10).contains(&self.duration) {
            return Err(crate::Error::Validation(format!(
                "duration must be between 1 and 10 seconds, got {}",
                self.duration
            )));
        }
        Ok(())
    }

    /// Human-readable generation mode
    pub fn mode(&self) -> &'static str {
        if self.image.is_some() {
            "image-to-video"
        } else {
            "text-to-video"
        }
    }
}

fn default_duration() -> u32 {
    5
}

fn default_ratio() -> String {
    "16:9".to_string()
}

/// Job submission body sent to the upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitPayload {
    /// Model name
    pub model: String,
    /// Text prompt
    pub prompt: String,
    /// Duration in seconds
    pub duration: u32,
    /// Aspect ratio (the upstream spells the field "radio")
    #[serde(rename = "radio")]
    pub ratio: String,
    /// Source image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Acknowledgement returned by the upstream submission endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmitAck(pub Value);

impl SubmitAck {
    /// Task id: `task.task_id`, then `taskId`, then `task_id`, then `id`
    pub fn task_id(&self) -> Option<String> {
        let nested = self.0.get("task").and_then(|t| t.get("task_id"));
        [
            nested,
            self.0.get("taskId"),
            self.0.get("task_id"),
            self.0.get("id"),
        ]
        .into_iter()
        .flatten()
        .find_map(scalar_string)
    }
}

/// Acknowledgement returned by the upstream upload endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadAck(pub Value);

impl UploadAck {
    /// Whether the upstream flagged the upload as accepted (`ok` or `success`)
    pub fn accepted(&self) -> bool {
        ["ok", "success"]
            .iter()
            .any(|key| self.0.get(key).is_some_and(is_truthy))
    }

    /// Uploaded image URL
    pub fn url(&self) -> Option<&str> {
        first_present([self.0.get("url").and_then(Value::as_str)])
    }

    /// Upstream message, if any
    pub fn message(&self) -> Option<&str> {
        first_present([self.0.get("message").and_then(Value::as_str)])
    }
}

/// Non-empty string or number rendered as a string
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Response for job creation endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoCreateResponse {
    /// Whether the upstream accepted the job
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// Upstream acknowledgement or error context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
}

/// Response for POST /api/upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Whether the upload produced an image URL
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// Uploaded image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Upstream acknowledgement or error context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
}

/// Response for GET /api/videos
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoListResponse {
    /// Whether the listing was fetched
    pub success: bool,
    /// Job records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub data: Option<Vec<JobRecord>>,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for GET /api/video/{id}/status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoStatusResponse {
    /// Whether a matching record was found
    pub success: bool,
    /// Raw upstream status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Artifact URL, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// The matched record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<JobRecord>,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for GET /api/stats/video-count
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    /// Whether the statistics were fetched
    pub success: bool,
    /// Upstream statistics, passed through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Terminal status of a wait, as reported on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WaitStatus {
    /// The job finished successfully
    Completed,
    /// The job failed upstream
    Failed,
    /// The wait budget ran out
    Timeout,
}

/// Response for the wait endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WaitResponse {
    /// True only for a completed job
    pub success: bool,
    /// Terminal status; absent when the wait could not run to a terminal state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WaitStatus>,
    /// Identifier that was polled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Artifact URL of a completed job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Human-readable outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Accumulated wait time in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<u64>,
    /// Number of listing fetches performed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks: Option<u32>,
    /// The matched record, or upstream acknowledgement when no task id was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
}

/// Query parameters controlling a wait
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WaitQuery {
    /// Maximum time to wait in seconds (default: configured max wait)
    pub max_wait_seconds: Option<u64>,
    /// Seconds between listing fetches (default: configured poll interval)
    pub poll_interval: Option<u64>,
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accept a string, number or bool as a string; null as absent; anything
    /// else as its JSON text.
    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        })
    }
}
