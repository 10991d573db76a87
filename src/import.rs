//! Import orchestration: single files and batches.
//!
//! [`Importer`] composes the pipeline stages — quota pre-check, config
//! lookup, format validation, platform parsing, sanitization, quota commit,
//! persistence — into one single-file operation and one batch operation.
//!
//! A single import walks the one-directional state machine
//! `Received → Validated → Parsed → Sanitized → QuotaCommitted → Delivered`;
//! any stage can divert to a terminal failure, and nothing is retried
//! automatically (callers resubmit if they want a retry).
//!
//! A batch runs each file's state machine independently: parsing is
//! parallel (it shares no mutable state), while quota commits and storage
//! happen sequentially in the batch's declared order, so exhausting an
//! allowance partway through a batch is deterministic. One file's failure
//! never aborts its siblings, and the outcome list always matches the input
//! order and length.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::caller::{Caller, CallerId};
use crate::chat::{CanonicalChat, ChatDraft, Timestamp};
use crate::config::{PlatformConfigStore, StaticConfigSource};
use crate::error::ImportError;
use crate::message::CanonicalMessage;
use crate::parsers::parser_for;
use crate::platform::Platform;
use crate::quota::QuotaEnforcer;
use crate::sanitize::Sanitizer;
use crate::store::{ChatSink, RecordId};
use crate::validate::validate;

/// One inbound file to import. Immutable once received; discarded after
/// producing exactly one [`ImportOutcome`].
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Raw export bytes.
    pub payload: Vec<u8>,
    /// Declared content type (as received, unparsed).
    pub content_type: String,
    /// Declared platform identifier string.
    pub platform: String,
    /// Verified caller identity and tier.
    pub caller: Caller,
    /// Optional caller-supplied title; passed through untouched.
    pub title: Option<String>,
    /// Optional caller-supplied tags; passed through untouched.
    pub tags: Vec<String>,
}

impl ImportRequest {
    /// Creates a request from the four mandatory fields.
    pub fn new(
        payload: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
        platform: impl Into<String>,
        caller: Caller,
    ) -> Self {
        Self {
            payload: payload.into(),
            content_type: content_type.into(),
            platform: platform.into(),
            caller,
            title: None,
            tags: Vec::new(),
        }
    }

    /// Builder method to attach a caller-supplied title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder method to attach caller-supplied tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags.extend(tags);
        self
    }
}

/// A successfully stored chat: the sink's record id plus the canonical
/// record the sink received.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChat {
    /// Identifier assigned by the persistence collaborator.
    pub record_id: RecordId,
    /// The record as stored.
    pub chat: CanonicalChat,
}

/// The result of importing one file.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// The file became a stored canonical chat.
    Success(StoredChat),
    /// The file failed at some stage with exactly one error kind.
    Failure {
        /// Why the import failed.
        error: ImportError,
        /// The resolved platform, when resolution got that far.
        platform: Option<Platform>,
        /// The caller the file belonged to.
        caller: CallerId,
    },
}

impl ImportOutcome {
    /// Returns `true` for a stored chat.
    pub fn is_success(&self) -> bool {
        matches!(self, ImportOutcome::Success(_))
    }

    /// Returns the error of a failed import, if any.
    pub fn error(&self) -> Option<&ImportError> {
        match self {
            ImportOutcome::Success(_) => None,
            ImportOutcome::Failure { error, .. } => Some(error),
        }
    }
}

/// Pipeline stages of a single-file import, in order. Terminal failures can
/// occur from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Request accepted, nothing checked yet.
    Received,
    /// Content type and size passed policy.
    Validated,
    /// Platform parser produced a draft.
    Parsed,
    /// Bodies cleaned, timestamps normalized.
    Sanitized,
    /// Restricted caller charged (no-op stage for unrestricted callers).
    QuotaCommitted,
    /// Stored by the persistence collaborator.
    Delivered,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Parsed => "parsed",
            Stage::Sanitized => "sanitized",
            Stage::QuotaCommitted => "quota_committed",
            Stage::Delivered => "delivered",
        };
        f.write_str(name)
    }
}

type StepError = (ImportError, Option<Platform>);

/// Composes validation, parsing, sanitization, quota and persistence into
/// import operations.
pub struct Importer {
    config_store: Arc<PlatformConfigStore>,
    quota: Arc<QuotaEnforcer>,
    sanitizer: Sanitizer,
    sink: Arc<dyn ChatSink>,
}

impl Importer {
    /// Creates an importer over explicit collaborators.
    pub fn new(
        config_store: Arc<PlatformConfigStore>,
        quota: Arc<QuotaEnforcer>,
        sink: Arc<dyn ChatSink>,
    ) -> Self {
        Self {
            config_store,
            quota,
            sanitizer: Sanitizer::new(),
            sink,
        }
    }

    /// Creates an importer with built-in platform configs and the default
    /// guest allowance.
    pub fn with_defaults(sink: Arc<dyn ChatSink>) -> Self {
        Self::new(
            Arc::new(PlatformConfigStore::new(Arc::new(
                StaticConfigSource::default(),
            ))),
            Arc::new(QuotaEnforcer::default()),
            sink,
        )
    }

    /// Shared quota enforcer, for allowance administration.
    pub fn quota(&self) -> &Arc<QuotaEnforcer> {
        &self.quota
    }

    /// Imports a single file to completion.
    ///
    /// Never panics and never returns early state: every call yields
    /// exactly one outcome.
    pub fn import(&self, request: ImportRequest) -> ImportOutcome {
        let caller = request.caller.id.clone();
        let result = self
            .prepare(&request, None)
            .and_then(|(platform, draft)| self.commit_and_store(&request, platform, draft));

        match result {
            Ok(stored) => {
                info!(
                    caller = %caller,
                    platform = %stored.chat.platform,
                    messages = stored.chat.messages.len(),
                    record_id = %stored.record_id,
                    stage = %Stage::Delivered,
                    "chat imported"
                );
                ImportOutcome::Success(stored)
            }
            Err((error, platform)) => {
                warn!(caller = %caller, error = %error, "import failed");
                ImportOutcome::Failure {
                    error,
                    platform,
                    caller,
                }
            }
        }
    }

    /// Imports a batch of files, returning one outcome per input in input
    /// order.
    ///
    /// Parsing and sanitization run in parallel across files; quota commits
    /// and storage are applied sequentially in the declared order. With a
    /// `deadline`, files whose processing has not started when it passes
    /// fail with [`ImportError::Cancelled`] while completed outcomes stand.
    pub fn import_batch(
        &self,
        requests: Vec<ImportRequest>,
        deadline: Option<Instant>,
    ) -> Vec<ImportOutcome> {
        let prepared: Vec<Result<(Platform, ChatDraft), StepError>> = requests
            .par_iter()
            .map(|request| self.prepare(request, deadline))
            .collect();

        requests
            .into_iter()
            .zip(prepared)
            .map(|(request, prep)| {
                let caller = request.caller.id.clone();
                let result = prep
                    .and_then(|(platform, draft)| self.commit_and_store(&request, platform, draft));
                match result {
                    Ok(stored) => ImportOutcome::Success(stored),
                    Err((error, platform)) => {
                        warn!(caller = %caller, error = %error, "batch file failed");
                        ImportOutcome::Failure {
                            error,
                            platform,
                            caller,
                        }
                    }
                }
            })
            .collect()
    }

    /// The side-effect-free front half of the state machine: quota
    /// pre-check, config lookup, validation, parsing, sanitization.
    fn prepare(
        &self,
        request: &ImportRequest,
        deadline: Option<Instant>,
    ) -> Result<(Platform, ChatDraft), StepError> {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Err((ImportError::Cancelled, None));
            }
        }
        debug!(caller = %request.caller.id, stage = %Stage::Received, "import started");

        let platform: Platform = request
            .platform
            .parse()
            .map_err(|_| (ImportError::UnsupportedPlatform(request.platform.clone()), None))?;

        // Exhausted callers fail before any parsing work is spent on them.
        self.quota
            .check_and_reserve(&request.caller)
            .map_err(|e| (e, Some(platform)))?;

        let config = self
            .config_store
            .get(platform)
            .map_err(|e| (e, Some(platform)))?;

        validate(&request.content_type, request.payload.len() as u64, &config)
            .map_err(|e| (e, Some(platform)))?;
        debug!(caller = %request.caller.id, platform = %platform, stage = %Stage::Validated, "format accepted");

        let draft = parser_for(platform)
            .parse(&request.payload, &config)
            .map_err(|e| (e, Some(platform)))?;
        debug!(
            caller = %request.caller.id,
            platform = %platform,
            messages = draft.messages.len(),
            stage = %Stage::Parsed,
            "export parsed"
        );

        let mut draft = self.sanitizer.sanitize(draft);
        debug!(caller = %request.caller.id, platform = %platform, stage = %Stage::Sanitized, "content sanitized");

        // Caller-supplied title and tags pass through untouched.
        if request.title.is_some() {
            draft.title = request.title.clone();
        }
        draft.metadata.tags.extend(request.tags.iter().cloned());

        Ok((platform, draft))
    }

    /// The stateful back half: charge the caller, seal the record, hand it
    /// to the sink. Runs in batch order for batches.
    fn commit_and_store(
        &self,
        request: &ImportRequest,
        platform: Platform,
        draft: ChatDraft,
    ) -> Result<StoredChat, StepError> {
        self.quota
            .commit(&request.caller)
            .map_err(|e| (e, Some(platform)))?;
        debug!(caller = %request.caller.id, platform = %platform, stage = %Stage::QuotaCommitted, "allowance charged");

        let chat = seal(draft, platform, &request.caller);

        match self.sink.store(&chat) {
            Ok(record_id) => Ok(StoredChat { record_id, chat }),
            Err(err) => {
                // The import did not succeed; give the committed unit back.
                self.quota.release(&request.caller);
                Err((
                    ImportError::PersistenceError(err.to_string()),
                    Some(platform),
                ))
            }
        }
    }
}

/// Turns a sanitized draft into the canonical record owned by the caller.
fn seal(draft: ChatDraft, platform: Platform, caller: &Caller) -> CanonicalChat {
    let messages = draft
        .messages
        .into_iter()
        .map(|msg| CanonicalMessage {
            role: msg.role,
            body: msg.body,
            timestamp: match msg.timestamp {
                Some(Timestamp::Utc(dt)) => Some(dt),
                // Sanitization left only normalized or absent timestamps.
                _ => None,
            },
            metadata: msg.metadata,
        })
        .collect();

    let mut metadata = draft.metadata;
    metadata
        .extra
        .insert("platform".to_string(), platform.as_str().into());

    CanonicalChat {
        messages,
        platform,
        title: draft.title,
        metadata,
        owner: caller.id.clone(),
        imported_at: Utc::now(),
    }
}
