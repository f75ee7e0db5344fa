//! The chat service façade
//!
//! All session mutation happens in short critical sections under the
//! store lock; the lock is never held across an await, so a pending
//! upload or analysis on one session never blocks progress on another.
//! Completions are reconciled by session id and epoch: a result for a
//! session that was deleted, cancelled, or re-triggered in the meantime
//! is discarded.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use lunarchat_core::auth::{AuthSnapshot, AuthUser, UserRole};
use lunarchat_core::config::SessionConfig;
use lunarchat_core::message::{ImageAttachment, MessageContent, Role};
use lunarchat_core::report::AnalysisMode;
use lunarchat_core::session::{SessionStore, StagedImage};
use lunarchat_core::{Error, Result};
use lunarchat_providers::{Authenticator, ImageUploader, SampleAnalyzer};

use crate::action::{LocalImage, UserAction};

const MSG_PREPARING: &str = "Preparing image for upload...";
const MSG_UPLOADED: &str = "Image uploaded. Click Send to analyze.";
const MSG_CANCELLED: &str = "Upload cancelled.";

/// Coordinates sessions, uploads, and analysis requests.
///
/// The UI renders from store snapshots and drives everything else
/// through this façade.
pub struct ChatService {
    store: Arc<RwLock<SessionStore>>,
    uploader: Arc<dyn ImageUploader>,
    analyzer: Arc<dyn SampleAnalyzer>,
    authenticator: Arc<dyn Authenticator>,
    auth: RwLock<AuthSnapshot>,
    limits: SessionConfig,
}

impl ChatService {
    pub fn new(
        uploader: Arc<dyn ImageUploader>,
        analyzer: Arc<dyn SampleAnalyzer>,
        authenticator: Arc<dyn Authenticator>,
        limits: SessionConfig,
    ) -> Self {
        Self {
            store: Arc::new(RwLock::new(SessionStore::new())),
            uploader,
            analyzer,
            authenticator,
            auth: RwLock::new(AuthSnapshot::unauthenticated()),
            limits,
        }
    }

    /// Shared handle to the session store, for rendering snapshots
    pub fn store(&self) -> Arc<RwLock<SessionStore>> {
        Arc::clone(&self.store)
    }

    /// Current authentication snapshot
    pub async fn auth_snapshot(&self) -> AuthSnapshot {
        self.auth.read().await.clone()
    }

    /// Attempt a login; on success every later action sees the new
    /// authenticated snapshot.
    pub async fn login(&self, username: &str, password: &str, role: UserRole) -> bool {
        if self.authenticator.login(username, password, role).await {
            let user = AuthUser {
                username: username.to_string(),
                role,
            };
            *self.auth.write().await = AuthSnapshot::authenticated(user);
            info!(username, "logged in");
            true
        } else {
            warn!(username, "login failed");
            false
        }
    }

    /// Drop the authenticated identity
    pub async fn logout(&self) {
        *self.auth.write().await = AuthSnapshot::unauthenticated();
    }

    async fn require_auth(&self, action: &str) -> Result<()> {
        self.auth.read().await.require(action).map(|_| ())
    }

    /// Create a new session and make it active
    pub async fn create_session(&self) -> Result<Uuid> {
        self.require_auth("new session").await?;
        Ok(self.store.write().await.create_session())
    }

    /// Delete a session; active selection falls back to the most
    /// recently created remaining session
    pub async fn delete_session(&self, id: Uuid) -> Result<()> {
        self.require_auth("delete session").await?;
        self.store.write().await.delete_session(id)
    }

    /// Switch the active session. Never cancels in-flight work: a
    /// pending operation keeps belonging to its originating session.
    pub async fn select_session(&self, id: Uuid) -> Result<()> {
        self.require_auth("select session").await?;
        self.store.write().await.select_session(id)
    }

    /// Append a user text message; the first one names the session
    pub async fn send_text(&self, id: Uuid, text: &str) -> Result<()> {
        self.require_auth("send message").await?;
        let mut store = self.store.write().await;
        let session = store.require_mut(id)?;
        session.log.append(Role::User, MessageContent::text(text));
        session.derive_title(text);
        Ok(())
    }

    /// Route a lifecycle action to the owning session.
    ///
    /// Local validation failures (invalid image, invalid transition,
    /// unknown session) are rejected synchronously with no message
    /// appended and no state change; remote failures are converted into
    /// state transitions plus log entries and never escape this façade.
    pub async fn dispatch(&self, id: Uuid, action: UserAction) -> Result<()> {
        self.require_auth(action.name()).await?;
        match action {
            UserAction::Stage(image) => self.stage(id, image).await,
            UserAction::Upload => self.begin_upload(id).await,
            UserAction::Cancel => self.cancel_upload(id).await,
            UserAction::Analyze(mode) => self.request_analysis(id, mode).await,
        }
    }

    /// Stage a local image: Idle/Failed -> Staged
    async fn stage(&self, id: Uuid, image: LocalImage) -> Result<()> {
        if image.bytes.is_empty() {
            return Err(Error::InvalidImage(format!(
                "'{}' is empty",
                image.filename
            )));
        }
        if image.bytes.len() > self.limits.max_image_bytes {
            return Err(Error::InvalidImage(format!(
                "'{}' exceeds the {} byte limit",
                image.filename, self.limits.max_image_bytes
            )));
        }

        let mut store = self.store.write().await;
        let session = store.require_mut(id)?;

        let staged = StagedImage::new(image.filename, image.bytes);
        debug!(session = %id, preview = %staged.preview_url, "staging image");
        session.upload.stage(staged)?;
        session
            .log
            .append(Role::System, MessageContent::text(MSG_PREPARING));
        Ok(())
    }

    /// Issue the upload exactly once: Staged -> Uploading -> Uploaded/Failed
    async fn begin_upload(&self, id: Uuid) -> Result<()> {
        let (image, epoch) = {
            let mut store = self.store.write().await;
            let session = store.require_mut(id)?;
            match session.upload.begin()? {
                Some(image) => {
                    session.upload_epoch += 1;
                    (image, session.upload_epoch)
                }
                None => {
                    // already in flight; rapid repeated triggers issue nothing
                    debug!(session = %id, "duplicate upload trigger ignored");
                    return Ok(());
                }
            }
        };

        info!(session = %id, filename = %image.filename, "upload started");
        let outcome = self.uploader.upload(&image.filename, image.bytes).await;

        let mut store = self.store.write().await;
        let Some(session) = store.get_mut(id) else {
            debug!(session = %id, "upload finished for a deleted session, dropping");
            return Ok(());
        };
        if session.upload_epoch != epoch || !session.upload.is_uploading() {
            debug!(session = %id, "stale upload completion ignored");
            return Ok(());
        }

        match outcome {
            Ok(uploaded) => {
                info!(session = %id, handle = %uploaded.handle, "upload succeeded");
                session.log.append(
                    Role::User,
                    MessageContent::Image(ImageAttachment {
                        url: uploaded.serving_url,
                        handle: Some(uploaded.handle.to_string()),
                    }),
                );
                session
                    .log
                    .append(Role::System, MessageContent::text(MSG_UPLOADED));
                session.upload.complete(uploaded.handle);
            }
            Err(e) => {
                warn!(session = %id, error = %e, "upload failed");
                session.upload.fail(e.to_string());
                session.log.append(
                    Role::Bot,
                    MessageContent::text(format!("Image upload failed: {}", e)),
                );
            }
        }
        Ok(())
    }

    /// Abandon a staged or in-flight upload: Staged/Uploading -> Idle.
    /// An in-flight call is left to finish; the epoch bump makes its
    /// completion a no-op.
    async fn cancel_upload(&self, id: Uuid) -> Result<()> {
        let mut store = self.store.write().await;
        let session = store.require_mut(id)?;
        session.upload.cancel()?;
        session.upload_epoch += 1;
        session
            .log
            .append(Role::System, MessageContent::text(MSG_CANCELLED));
        Ok(())
    }

    /// Request analysis: requires Uploaded and a settled prior request.
    /// No message is appended on start; the loading indicator is derived
    /// from the Requesting state.
    async fn request_analysis(&self, id: Uuid, mode: AnalysisMode) -> Result<()> {
        let (handle, epoch) = {
            let mut store = self.store.write().await;
            let session = store.require_mut(id)?;
            let handle = session.upload.handle().cloned().ok_or_else(|| {
                Error::InvalidTransition(format!(
                    "analysis requires an uploaded image, upload is {}",
                    session.upload.label()
                ))
            })?;
            session.analysis.begin(mode, handle.clone())?;
            session.analysis_epoch += 1;
            (handle, session.analysis_epoch)
        };

        info!(session = %id, %mode, %handle, "analysis started");
        let outcome = self.analyzer.analyze(&handle, mode).await;

        // reconcile into the originating session, active or not
        let mut store = self.store.write().await;
        let Some(session) = store.get_mut(id) else {
            debug!(session = %id, "analysis finished for a deleted session, dropping");
            return Ok(());
        };
        if session.analysis_epoch != epoch || !session.analysis.is_requesting() {
            debug!(session = %id, "stale analysis completion ignored");
            return Ok(());
        }

        match outcome {
            Ok(report) => {
                info!(session = %id, sample = %report.sample_type, "analysis succeeded");
                session.analysis.succeed(report.clone());
                session.log.append(Role::Bot, MessageContent::Report(report));
                // the uploaded image is consumed; a new one must be
                // staged before the next analysis
                session.upload.consume();
            }
            Err(e) => {
                warn!(session = %id, error = %e, "analysis failed");
                session.analysis.fail(e.to_string());
                session.log.append(
                    Role::Bot,
                    MessageContent::text(format!("An error occurred: {}", e)),
                );
                // handle retained; analysis can be retried without
                // re-uploading
            }
        }
        Ok(())
    }
}
