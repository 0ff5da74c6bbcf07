//! 주석 변경 추적기
//!
//! 렌더러의 생성/수정/삭제 이벤트를 받아 두 가지를 유지합니다:
//! - 렌더러에 지금 존재하는 주석의 사본 (`external_id`로 다시 찾음)
//! - 마지막 커밋 이후의 변경 로그 (이벤트 하나당 한 줄, 도착 순서)
//!
//! 추적기는 문서 세션 하나에 속하고, 세션 작업 큐 하나만 이것을 건드립니다.
//! 그래서 내부에 잠금이 없습니다.

use chrono::Utc;

use crate::models::{AnnotationChangeRecord, AnnotationKind, ChangeAction, RawAnnotation, TrackedAnnotation};

#[derive(Debug, Default)]
pub struct AnnotationTracker {
    annotations: Vec<TrackedAnnotation>,
    pending: Vec<AnnotationChangeRecord>,
}

impl AnnotationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 주석을 사본에 넣고 `create` 기록을 남깁니다.
    ///
    /// 같은 `external_id`가 이미 있으면 렌더러 쪽에서 재생성된 것으로 보고 옛 사본을 교체합니다.
    pub fn on_created(&mut self, raw: &RawAnnotation) -> &TrackedAnnotation {
        let kind = AnnotationKind::from_raw(raw);
        if kind.is_unknown() {
            tracing::warn!(
                "Annotation {} has unrecognized type {:?}; tracking as unknown",
                raw.id,
                raw.subtype
            );
        }

        if let Some(pos) = self.position(&raw.id) {
            tracing::warn!("Annotation {} was created twice; replacing stale copy", raw.id);
            self.annotations.remove(pos);
        }

        let now = Utc::now();
        let tracked = TrackedAnnotation {
            id: uuid::Uuid::now_v7().to_string(),
            external_id: raw.id.clone(),
            page_index: raw.page_index,
            kind,
            created_at: now,
            updated_at: now,
        };
        self.record(ChangeAction::Create, &tracked);
        self.annotations.push(tracked);

        let last = self.annotations.len() - 1;
        &self.annotations[last]
    }

    /// 추적 중인 주석의 내용, 색, 페이지를 새 값으로 바꾸고 `update` 기록을 남깁니다.
    /// 종류는 바꾸지 않습니다. 모르는 ID면 경고만 남기고 아무것도 하지 않습니다.
    pub fn on_updated(&mut self, raw: &RawAnnotation) -> Option<&TrackedAnnotation> {
        let Some(pos) = self.position(&raw.id) else {
            tracing::warn!("Ignoring update for untracked annotation {}", raw.id);
            return None;
        };

        let tracked = &mut self.annotations[pos];
        tracked.kind.apply_update(raw.contents.clone(), raw.color.clone());
        tracked.page_index = raw.page_index;
        tracked.updated_at = Utc::now();

        let snapshot = tracked.clone();
        self.record(ChangeAction::Update, &snapshot);
        Some(&self.annotations[pos])
    }

    /// 주석을 사본에서 빼고, 삭제 직전 값으로 `delete` 기록을 남깁니다.
    /// 모르는 ID면 경고만 남기고 아무것도 하지 않습니다.
    pub fn on_deleted(&mut self, raw: &RawAnnotation) -> Option<TrackedAnnotation> {
        let Some(pos) = self.position(&raw.id) else {
            tracing::warn!("Ignoring delete for untracked annotation {}", raw.id);
            return None;
        };

        let removed = self.annotations.remove(pos);
        self.record(ChangeAction::Delete, &removed);
        Some(removed)
    }

    /// 렌더러의 전체 목록으로 사본을 다시 맞춥니다. 변경 로그에는 아무것도 추가하지 않습니다.
    ///
    /// 필드가 그대로인 주석은 기존 ID와 시각을 유지하므로 같은 목록으로 여러 번 불러도 결과가 같습니다.
    pub fn resync(&mut self, current: &[RawAnnotation]) {
        let now = Utc::now();
        let mut previous = std::mem::take(&mut self.annotations);

        for raw in current {
            let kind = AnnotationKind::from_raw(raw);
            let existing = previous
                .iter()
                .position(|a| a.external_id == raw.id)
                .map(|pos| previous.remove(pos));

            let tracked = match existing {
                Some(old) if old.kind == kind && old.page_index == raw.page_index => old,
                Some(old) => TrackedAnnotation {
                    kind,
                    page_index: raw.page_index,
                    updated_at: now,
                    ..old
                },
                None => TrackedAnnotation {
                    id: uuid::Uuid::now_v7().to_string(),
                    external_id: raw.id.clone(),
                    page_index: raw.page_index,
                    kind,
                    created_at: now,
                    updated_at: now,
                },
            };
            self.annotations.push(tracked);
        }

        tracing::debug!(
            "Resynced {} annotation(s), dropped {}",
            self.annotations.len(),
            previous.len()
        );
    }

    /// 변경 로그를 비웁니다. 사본은 그대로 둡니다 (커밋 직후 상태).
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> &[AnnotationChangeRecord] {
        &self.pending
    }

    #[cfg(test)]
    pub fn annotations(&self) -> &[TrackedAnnotation] {
        &self.annotations
    }

    fn position(&self, external_id: &str) -> Option<usize> {
        self.annotations.iter().position(|a| a.external_id == external_id)
    }

    fn record(&mut self, action: ChangeAction, annotation: &TrackedAnnotation) {
        self.pending.push(AnnotationChangeRecord {
            id: uuid::Uuid::now_v7().to_string(),
            annotation_id: annotation.id.clone(),
            external_id: annotation.external_id.clone(),
            action,
            kind: annotation.kind.type_name().to_string(),
            page_index: annotation.page_index,
            contents: annotation.kind.contents().map(str::to_string),
            timestamp: Utc::now(),
        });
    }
}
