//! 커밋/전환 프로토콜
//!
//! 열린 문서 하나당 `DocumentSession` 하나가 주석 추적기, 현재 버전, 세션 상태를 소유합니다.
//!
//! ```text
//! Viewing(v) ──commit──▶ Committing ──성공──▶ Viewing(new)
//!                              └────실패──▶ Viewing(v)
//! Viewing(v) ──switch(t), 보류 변경 있음──▶ SwitchConfirming{v, t}
//!            ──cancel──▶ Viewing(v)
//!            ──discard──▶ Viewing(t)
//! ```
//!
//! 세션은 [`super::registry`]의 작업 큐 하나에서만 호출되므로 `&mut self`로 충분합니다.

use crate::db::{self, VersionStore};
use crate::error::AppError;
use crate::models::*;

use super::renderer::{capture, CaptureLimits, Renderer};
use super::tracker::AnnotationTracker;

pub struct DocumentSession {
    document_id: String,
    current_version_id: String,
    tracker: AnnotationTracker,
    state: SessionState,
    store: VersionStore,
    capture_limits: CaptureLimits,
}

impl DocumentSession {
    /// 문서의 현재 버전에서 세션을 시작하고, 그 버전의 주석으로 추적기를 채웁니다.
    pub async fn open(
        store: VersionStore,
        document_id: &str,
        capture_limits: CaptureLimits,
    ) -> Result<Self, AppError> {
        let document = db::get_document(store.pool(), document_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let current_version_id = document.current_version_id.ok_or_else(|| {
            AppError::Internal(format!("document {document_id} has no current version"))
        })?;

        let current = store.get_by_id(&current_version_id).await?;
        let mut session = Self::new(store, document_id, &current_version_id, capture_limits);
        session.load_annotations(&current)?;

        tracing::info!("Opened session for document {} at version {}", document_id, current_version_id);
        Ok(session)
    }

    pub fn new(
        store: VersionStore,
        document_id: &str,
        current_version_id: &str,
        capture_limits: CaptureLimits,
    ) -> Self {
        Self {
            document_id: document_id.to_string(),
            current_version_id: current_version_id.to_string(),
            tracker: AnnotationTracker::new(),
            state: SessionState::Viewing {
                version_id: current_version_id.to_string(),
            },
            store,
            capture_limits,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    #[cfg(test)]
    pub fn current_version_id(&self) -> &str {
        &self.current_version_id
    }

    #[cfg(test)]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn tracker(&self) -> &AnnotationTracker {
        &self.tracker
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            document_id: self.document_id.clone(),
            current_version_id: self.current_version_id.clone(),
            pending_count: self.tracker.pending_count(),
            state: self.state.clone(),
        }
    }

    /// 렌더러 이벤트를 추적기에 반영합니다. 어느 상태에서든 받습니다.
    pub fn handle_event(&mut self, event: &RendererEvent) {
        match event {
            RendererEvent::Created(raw) => {
                self.tracker.on_created(raw);
            }
            RendererEvent::Updated(raw) => {
                self.tracker.on_updated(raw);
            }
            RendererEvent::Deleted(raw) => {
                self.tracker.on_deleted(raw);
            }
        }
    }

    pub fn resync(&mut self, annotations: &[RawAnnotation]) {
        self.tracker.resync(annotations);
    }

    /// 렌더러의 현재 상태를 새 버전으로 저장하고 문서를 그 버전으로 옮깁니다.
    ///
    /// 실패하면 상태는 커밋 전 `Viewing`으로 돌아가고 보류 변경은 그대로 남습니다.
    pub async fn commit(&mut self, message: &str, renderer: &dyn Renderer) -> Result<Version, AppError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("commit message must not be empty".to_string()));
        }

        let previous = match &self.state {
            SessionState::Viewing { version_id } => version_id.clone(),
            SessionState::Committing => {
                return Err(AppError::Conflict("a commit is already in progress".to_string()))
            }
            SessionState::SwitchConfirming { .. } => {
                return Err(AppError::Conflict(
                    "a version switch is awaiting confirmation".to_string(),
                ))
            }
        };

        self.state = SessionState::Committing;
        match self.persist_commit(message, renderer).await {
            Ok(version) => {
                let committed = self.tracker.pending_count();
                self.tracker.clear();
                self.current_version_id = version.id.clone();
                self.state = SessionState::Viewing {
                    version_id: version.id.clone(),
                };
                tracing::info!(
                    "Committed version {} of document {} ({} change(s))",
                    version.version_number,
                    self.document_id,
                    committed
                );
                Ok(version)
            }
            Err(e) => {
                self.state = SessionState::Viewing { version_id: previous };
                tracing::warn!("Commit failed for document {}: {}", self.document_id, e);
                Err(e)
            }
        }
    }

    async fn persist_commit(&self, message: &str, renderer: &dyn Renderer) -> Result<Version, AppError> {
        let captured = capture(renderer, self.capture_limits).await?;
        let version_number = self.store.max_version_number(&self.document_id).await? + 1;

        let new = NewVersion {
            document_id: self.document_id.clone(),
            version_number,
            message: message.to_string(),
            binary_content: captured.binary_content,
            annotation_snapshot: captured.annotations,
            page_text_snapshot: captured.pages,
        };
        self.store.create_and_checkout(&new).await
    }

    /// 다른 버전으로 전환을 요청합니다.
    ///
    /// 보류 변경이 없으면 바로 전환하고, 있으면 `SwitchConfirming`으로 가서 확인을 기다립니다.
    pub async fn request_switch(&mut self, target_version_id: &str) -> Result<SwitchOutcome, AppError> {
        match &self.state {
            SessionState::Viewing { .. } => {}
            SessionState::Committing => {
                return Err(AppError::Conflict("a commit is in progress".to_string()))
            }
            SessionState::SwitchConfirming { .. } => {
                return Err(AppError::Conflict(
                    "a version switch is already awaiting confirmation".to_string(),
                ))
            }
        }

        if target_version_id == self.current_version_id {
            return Ok(SwitchOutcome::Unchanged {
                version_id: self.current_version_id.clone(),
            });
        }

        let target = self.store.get_by_id(target_version_id).await?;
        if target.document_id != self.document_id {
            return Err(AppError::VersionNotFound(target_version_id.to_string()));
        }

        let pending_count = self.tracker.pending_count();
        if pending_count == 0 {
            return self.checkout(&target).await;
        }

        tracing::debug!(
            "Switch to {} needs confirmation: {} pending change(s)",
            target_version_id,
            pending_count
        );
        self.state = SessionState::SwitchConfirming {
            from: self.current_version_id.clone(),
            target: target.id,
        };
        Ok(SwitchOutcome::ConfirmationRequired {
            target_version_id: target_version_id.to_string(),
            pending_count,
        })
    }

    /// 확인 대기 중인 전환을 취소하거나, 보류 변경을 버리고 진행합니다.
    pub async fn resolve_switch(&mut self, decision: SwitchDecision) -> Result<SwitchOutcome, AppError> {
        let SessionState::SwitchConfirming { from, target } = self.state.clone() else {
            return Err(AppError::Conflict(
                "no version switch is awaiting confirmation".to_string(),
            ));
        };

        match decision {
            SwitchDecision::Cancel => {
                self.state = SessionState::Viewing {
                    version_id: from.clone(),
                };
                Ok(SwitchOutcome::Cancelled { version_id: from })
            }
            SwitchDecision::Discard => {
                let switched = match self.store.get_by_id(&target).await {
                    Ok(version) => self.checkout(&version).await,
                    Err(e) => Err(e),
                };
                match switched {
                    Ok(outcome) => {
                        // 포인터가 저장된 다음에만 변경을 버립니다.
                        let discarded = self.tracker.pending_count();
                        self.tracker.clear();
                        tracing::info!(
                            "Discarded {} pending change(s) switching document {} to {}",
                            discarded,
                            self.document_id,
                            target
                        );
                        Ok(outcome)
                    }
                    Err(e) => {
                        self.state = SessionState::Viewing { version_id: from };
                        Err(e)
                    }
                }
            }
        }
    }

    /// 문서 포인터를 옮기고 추적기 사본을 대상 버전의 주석으로 맞춥니다.
    ///
    /// 주석 스냅샷을 읽지 못하면 포인터도 세션도 그대로 둡니다.
    async fn checkout(&mut self, target: &Version) -> Result<SwitchOutcome, AppError> {
        let raws = raw_annotations(target)?;
        if !db::set_current_version(self.store.pool(), &self.document_id, &target.id).await? {
            return Err(AppError::NotFound);
        }

        self.current_version_id = target.id.clone();
        self.state = SessionState::Viewing {
            version_id: target.id.clone(),
        };
        self.tracker.resync(&raws);

        tracing::info!(
            "Switched document {} to version {}",
            self.document_id,
            target.version_number
        );
        Ok(SwitchOutcome::Switched {
            version: target.summary(),
        })
    }

    fn load_annotations(&mut self, version: &Version) -> Result<(), AppError> {
        let raws = raw_annotations(version)?;
        self.tracker.resync(&raws);
        Ok(())
    }
}

fn raw_annotations(version: &Version) -> Result<Vec<RawAnnotation>, AppError> {
    Ok(version.annotations()?.iter().map(RawAnnotation::from).collect())
}
