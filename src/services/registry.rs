//! 문서 세션 레지스트리
//!
//! 열린 문서마다 세션 작업(task)을 하나 띄우고, 그 작업이 [`DocumentSession`]을 소유합니다.
//! 렌더러 이벤트, 재동기화, 커밋, 전환 요청은 모두 [`SessionCommand`]로 같은 mpsc 큐에 들어가
//! 도착한 순서대로 하나씩 처리됩니다. 그래서 커밋 도중에 들어온 이벤트는 커밋이 끝난 뒤에
//! 반영되어 다음 커밋의 보류 변경으로 남습니다.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};

use crate::db::VersionStore;
use crate::error::AppError;
use crate::models::*;

use super::renderer::{CaptureLimits, Renderer};
use super::session::DocumentSession;

type Reply<T> = oneshot::Sender<Result<T, AppError>>;

pub enum SessionCommand {
    Event(RendererEvent),
    Resync(Vec<RawAnnotation>),
    Status {
        reply: oneshot::Sender<SessionStatus>,
    },
    PendingChanges {
        reply: oneshot::Sender<Vec<AnnotationChangeRecord>>,
    },
    Commit {
        message: String,
        renderer: Box<dyn Renderer>,
        reply: Reply<Version>,
    },
    RequestSwitch {
        target_version_id: String,
        reply: Reply<SwitchOutcome>,
    },
    ResolveSwitch {
        decision: SwitchDecision,
        reply: Reply<SwitchOutcome>,
    },
}

/// 세션 작업에 명령을 보내는 핸들. clone해서 여러 요청 핸들러가 같이 씁니다.
#[derive(Clone)]
pub struct SessionHandle {
    document_id: String,
    sender: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// 세션을 소유하는 작업을 띄웁니다. 모든 핸들이 사라지면 남은 명령을 처리하고 끝납니다.
    pub fn spawn(session: DocumentSession) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let document_id = session.document_id().to_string();
        tokio::spawn(run(session, receiver));
        Self { document_id, sender }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// 이벤트를 큐에 넣고 바로 돌아옵니다. 처리 순서는 보내는 순서와 같습니다.
    pub fn send_event(&self, event: RendererEvent) -> Result<(), AppError> {
        self.send(SessionCommand::Event(event))
    }

    pub fn resync(&self, annotations: Vec<RawAnnotation>) -> Result<(), AppError> {
        self.send(SessionCommand::Resync(annotations))
    }

    pub async fn status(&self) -> Result<SessionStatus, AppError> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Status { reply })?;
        response.await.map_err(|_| self.closed())
    }

    pub async fn pending_changes(&self) -> Result<Vec<AnnotationChangeRecord>, AppError> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::PendingChanges { reply })?;
        response.await.map_err(|_| self.closed())
    }

    pub async fn commit(&self, message: String, renderer: Box<dyn Renderer>) -> Result<Version, AppError> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Commit {
            message,
            renderer,
            reply,
        })?;
        response.await.map_err(|_| self.closed())?
    }

    pub async fn request_switch(&self, target_version_id: String) -> Result<SwitchOutcome, AppError> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::RequestSwitch {
            target_version_id,
            reply,
        })?;
        response.await.map_err(|_| self.closed())?
    }

    pub async fn resolve_switch(&self, decision: SwitchDecision) -> Result<SwitchOutcome, AppError> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::ResolveSwitch { decision, reply })?;
        response.await.map_err(|_| self.closed())?
    }

    fn send(&self, command: SessionCommand) -> Result<(), AppError> {
        self.sender.send(command).map_err(|_| self.closed())
    }

    fn closed(&self) -> AppError {
        AppError::Internal(format!("session for document {} is closed", self.document_id))
    }
}

async fn run(mut session: DocumentSession, mut receiver: mpsc::UnboundedReceiver<SessionCommand>) {
    while let Some(command) = receiver.recv().await {
        // 응답 받을 쪽이 먼저 사라졌으면 결과를 버립니다.
        match command {
            SessionCommand::Event(event) => session.handle_event(&event),
            SessionCommand::Resync(annotations) => session.resync(&annotations),
            SessionCommand::Status { reply } => {
                let _ = reply.send(session.status());
            }
            SessionCommand::PendingChanges { reply } => {
                let _ = reply.send(session.tracker().pending().to_vec());
            }
            SessionCommand::Commit {
                message,
                renderer,
                reply,
            } => {
                let _ = reply.send(session.commit(&message, renderer.as_ref()).await);
            }
            SessionCommand::RequestSwitch {
                target_version_id,
                reply,
            } => {
                let _ = reply.send(session.request_switch(&target_version_id).await);
            }
            SessionCommand::ResolveSwitch { decision, reply } => {
                let _ = reply.send(session.resolve_switch(decision).await);
            }
        }
    }
    tracing::debug!("Session for document {} closed", session.document_id());
}

/// 문서 ID → 세션 핸들. `AppState`에 담겨 모든 요청이 공유합니다.
#[derive(Clone)]
pub struct SessionRegistry {
    store: VersionStore,
    capture_limits: CaptureLimits,
    sessions: Arc<Mutex<HashMap<String, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new(store: VersionStore, capture_limits: CaptureLimits) -> Self {
        Self {
            store,
            capture_limits,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// 문서의 세션을 돌려줍니다. 아직 없으면 현재 버전에서 새로 엽니다.
    ///
    /// 세션을 여는 동안(DB 조회)에는 잠금을 잡지 않습니다. 그 사이 다른 요청이
    /// 먼저 세션을 등록했다면 그쪽을 돌려주고 새로 연 세션은 버립니다.
    pub async fn open(&self, document_id: &str) -> Result<SessionHandle, AppError> {
        if let Ok(handle) = self.get(document_id).await {
            return Ok(handle);
        }

        let session = DocumentSession::open(self.store.clone(), document_id, self.capture_limits).await?;

        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(document_id).filter(|h| !h.is_closed()) {
            return Ok(handle.clone());
        }
        let handle = SessionHandle::spawn(session);
        sessions.insert(document_id.to_string(), handle.clone());
        Ok(handle)
    }

    /// 이미 열린 세션만 돌려줍니다.
    pub async fn get(&self, document_id: &str) -> Result<SessionHandle, AppError> {
        self.sessions
            .lock()
            .await
            .get(document_id)
            .filter(|h| !h.is_closed())
            .cloned()
            .ok_or(AppError::NotFound)
    }

    /// 세션을 닫습니다. 큐에 남은 명령은 처리된 뒤 작업이 끝납니다.
    /// 보류 중이던 변경은 사라집니다.
    pub async fn close(&self, document_id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(document_id);
        if removed.is_some() {
            tracing::info!("Closed session for document {}", document_id);
        }
        removed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{raw_annotation, seed_document, FakeRenderer, CAPTURE_LIMITS};

    #[tokio::test]
    async fn events_are_applied_in_arrival_order() {
        let (store, doc, _v1) = seed_document().await;
        let registry = SessionRegistry::new(store, CAPTURE_LIMITS);
        let handle = registry.open(&doc.id).await.unwrap();

        handle
            .send_event(RendererEvent::Created(raw_annotation("ext-1", "note", Some("a"))))
            .unwrap();
        handle
            .send_event(RendererEvent::Updated(raw_annotation("ext-1", "note", Some("b"))))
            .unwrap();
        handle
            .send_event(RendererEvent::Deleted(raw_annotation("ext-1", "note", None)))
            .unwrap();

        let actions: Vec<ChangeAction> = handle
            .pending_changes()
            .await
            .unwrap()
            .iter()
            .map(|r| r.action)
            .collect();
        assert_eq!(actions, vec![ChangeAction::Create, ChangeAction::Update, ChangeAction::Delete]);
    }

    #[tokio::test]
    async fn events_queued_behind_a_commit_stay_pending() {
        let (store, doc, _v1) = seed_document().await;
        let registry = SessionRegistry::new(store, CAPTURE_LIMITS);
        let handle = registry.open(&doc.id).await.unwrap();

        handle
            .send_event(RendererEvent::Created(raw_annotation("ext-1", "note", None)))
            .unwrap();
        // 커밋 명령 바로 뒤에 이벤트를 넣어 둘이 같은 큐에서 순서대로 처리되게 합니다.
        let (reply, response) = oneshot::channel();
        handle
            .send(SessionCommand::Commit {
                message: "Snapshot".to_string(),
                renderer: Box::new(FakeRenderer::with_pages(&["x"])),
                reply,
            })
            .unwrap();
        handle
            .send_event(RendererEvent::Created(raw_annotation("ext-2", "note", None)))
            .unwrap();
        let version = response.await.unwrap().unwrap();

        assert_eq!(version.version_number, 2);
        let pending = handle.pending_changes().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].external_id, "ext-2");
    }

    #[tokio::test]
    async fn reopening_returns_the_same_session() {
        let (store, doc, _v1) = seed_document().await;
        let registry = SessionRegistry::new(store, CAPTURE_LIMITS);

        let first = registry.open(&doc.id).await.unwrap();
        first
            .send_event(RendererEvent::Created(raw_annotation("ext-1", "note", None)))
            .unwrap();
        let second = registry.open(&doc.id).await.unwrap();

        assert_eq!(second.status().await.unwrap().pending_count, 1);
    }

    #[tokio::test]
    async fn closing_drops_pending_changes() {
        let (store, doc, _v1) = seed_document().await;
        let registry = SessionRegistry::new(store, CAPTURE_LIMITS);

        let handle = registry.open(&doc.id).await.unwrap();
        handle
            .send_event(RendererEvent::Created(raw_annotation("ext-1", "note", None)))
            .unwrap();
        assert!(registry.close(&doc.id).await);
        assert!(matches!(registry.get(&doc.id).await, Err(AppError::NotFound)));

        let reopened = registry.open(&doc.id).await.unwrap();
        assert_eq!(reopened.status().await.unwrap().pending_count, 0);
    }

    #[tokio::test]
    async fn unknown_document_cannot_be_opened() {
        let (store, _doc, _v1) = seed_document().await;
        let registry = SessionRegistry::new(store, CAPTURE_LIMITS);
        assert!(matches!(registry.open("nope").await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn switch_round_trip_through_the_queue() {
        let (store, doc, v1) = seed_document().await;
        let registry = SessionRegistry::new(store, CAPTURE_LIMITS);
        let handle = registry.open(&doc.id).await.unwrap();

        handle
            .commit("Second".to_string(), Box::new(FakeRenderer::with_pages(&["x"])))
            .await
            .unwrap();
        handle
            .send_event(RendererEvent::Created(raw_annotation("ext-1", "note", None)))
            .unwrap();

        let outcome = handle.request_switch(v1.id.clone()).await.unwrap();
        assert!(matches!(outcome, SwitchOutcome::ConfirmationRequired { pending_count: 1, .. }));

        let outcome = handle.resolve_switch(SwitchDecision::Discard).await.unwrap();
        assert!(matches!(outcome, SwitchOutcome::Switched { .. }));

        let status = handle.status().await.unwrap();
        assert_eq!(status.current_version_id, v1.id);
        assert_eq!(status.pending_count, 0);
    }

    #[tokio::test]
    async fn oversized_page_count_is_rejected_and_session_survives() {
        let (store, doc, _v1) = seed_document().await;
        let registry = SessionRegistry::new(store, CAPTURE_LIMITS);
        let handle = registry.open(&doc.id).await.unwrap();
        handle
            .send_event(RendererEvent::Created(raw_annotation("ext-1", "note", None)))
            .unwrap();

        let snapshot = RendererSnapshot {
            binary_content: String::new(),
            annotations: AnnotationSnapshot::default(),
            total_page_count: usize::MAX,
            pages: Vec::new(),
        };
        let err = handle
            .commit("Huge".to_string(), Box::new(snapshot))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let status = handle.status().await.unwrap();
        assert_eq!(status.pending_count, 1);
        assert!(matches!(status.state, SessionState::Viewing { .. }));
    }

    #[tokio::test]
    async fn concurrent_opens_share_one_session() {
        let (store, doc, _v1) = seed_document().await;
        let registry = SessionRegistry::new(store, CAPTURE_LIMITS);

        let (first, second) = tokio::join!(registry.open(&doc.id), registry.open(&doc.id));
        let (first, second) = (first.unwrap(), second.unwrap());

        first
            .send_event(RendererEvent::Created(raw_annotation("ext-1", "note", None)))
            .unwrap();
        assert_eq!(second.status().await.unwrap().pending_count, 1);
        assert_eq!(registry.get(&doc.id).await.unwrap().status().await.unwrap().pending_count, 1);
    }
}
