use chrono::{DateTime, Utc};
use folio_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using FolioError
pub type Result<T> = std::result::Result<T, FolioError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that outer layers (HTTP, CLI) can
/// match on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Document or target version does not exist
    NotFound,
    /// Entity with the same identity already exists
    AlreadyExists,
    /// Edit lease is held by another actor and has not expired
    Conflict,
    /// Caller is not allowed to perform the operation
    Forbidden,
    /// Malformed edit reason or field bag
    Validation,
    /// A unique key was violated mid-write (lost race on version assignment)
    Concurrency,
    /// Underlying store failure
    Persistence,
    Serialization,
    Io,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::Forbidden => "ERR_FORBIDDEN",
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind plus optional context. A `Conflict` error
/// always carries `holder` and `since` so a blocked editor can be told who
/// holds the document and from when.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    document_id: Option<String>,
    version: Option<u64>,
    actor: Option<String>,
    holder: Option<String>,
    since: Option<DateTime<Utc>>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            document_id: None,
            version: None,
            actor: None,
            holder: None,
            since: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn with_document_id(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Record the current lease holder (Conflict errors)
    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = Some(holder.into());
        self
    }

    /// Record when the current lease was granted (Conflict errors)
    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    pub fn holder(&self) -> Option<&str> {
        self.holder.as_deref()
    }

    pub fn since(&self) -> Option<DateTime<Utc>> {
        self.since
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(document_id) = &self.document_id {
            write!(f, " (document_id: {})", document_id)?;
        }
        if let Some(version) = self.version {
            write!(f, " (version: {})", version)?;
        }
        if let Some(holder) = &self.holder {
            write!(f, " (held by {}", holder)?;
            if let Some(since) = self.since {
                write!(f, " since {}", since.to_rfc3339())?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain errors raised by the pure core (diff, lease rules, validation)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FolioError {
    #[error("Document not found: {document_id}")]
    DocumentNotFound { document_id: String },

    #[error("Document already exists: {document_id}")]
    DocumentAlreadyExists { document_id: String },

    #[error("Version {version} not found for document {document_id}")]
    VersionNotFound { document_id: String, version: u64 },

    /// Another actor holds a live lease on the document
    #[error("Document {document_id} is being edited by {holder} since {since}")]
    LeaseConflict {
        document_id: String,
        holder: String,
        since: DateTime<Utc>,
    },

    /// Release attempted by someone who is neither the holder nor an admin
    #[error("Actor {actor} may not release the lease on {document_id} held by {holder}")]
    ReleaseForbidden {
        document_id: String,
        actor: String,
        holder: String,
    },

    /// Write attempted on a document nobody has leased
    #[error("Actor {actor} does not hold the edit lease on {document_id}")]
    LeaseNotHeld { document_id: String, actor: String },

    #[error("Edit reason is {len} characters; the limit is {max}")]
    ReasonTooLong { len: usize, max: usize },

    #[error("Invalid field bag: {reason}")]
    InvalidFieldBag { reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<FolioError> for ExError {
    fn from(err: FolioError) -> Self {
        match err {
            FolioError::DocumentNotFound { document_id } => ExError::new(ExErrorKind::NotFound)
                .with_document_id(document_id)
                .with_message("Document not found"),
            FolioError::DocumentAlreadyExists { document_id } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_document_id(document_id)
                    .with_message("Document already exists")
            }
            FolioError::VersionNotFound {
                document_id,
                version,
            } => ExError::new(ExErrorKind::NotFound)
                .with_document_id(document_id)
                .with_version(version)
                .with_message("Version not found"),
            FolioError::LeaseConflict {
                document_id,
                holder,
                since,
            } => ExError::new(ExErrorKind::Conflict)
                .with_document_id(document_id)
                .with_holder(holder)
                .with_since(since)
                .with_message("Document is being edited by another actor"),
            FolioError::ReleaseForbidden {
                document_id,
                actor,
                holder,
            } => ExError::new(ExErrorKind::Forbidden)
                .with_document_id(document_id)
                .with_actor(actor)
                .with_holder(holder)
                .with_message("Only the lease holder or an admin may release the lease"),
            FolioError::LeaseNotHeld { document_id, actor } => {
                ExError::new(ExErrorKind::Forbidden)
                    .with_document_id(document_id)
                    .with_actor(actor)
                    .with_message("An active edit lease is required to save")
            }
            FolioError::ReasonTooLong { len, max } => ExError::new(ExErrorKind::Validation)
                .with_message(format!("Edit reason too long: {} > {} characters", len, max)),
            FolioError::InvalidFieldBag { reason } => ExError::new(ExErrorKind::Validation)
                .with_message(format!("Invalid field bag: {}", reason)),
            FolioError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
            FolioError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        FolioError::Serialization {
            message: err.to_string(),
        }
    }
}
