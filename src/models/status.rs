//! Статусная модель моста: что видит пользователь вместо жёсткого отказа.
//!
//! Цикл кадров и сторожевой поток пишут в общую ячейку `StatusCell`;
//! хост читает последний снимок через `snapshot()`. Ячейка никогда не
//! влияет на dwell-автомат — это чистая диагностика.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::geometry::Point;

/// Состояние входного сигнала трекера.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum FeedStatus {
    /// Запись курсора отсутствует или поля не числовые.
    NotReady,
    /// Свежий отсчёт получен в пределах допустимого возраста.
    Live,
    /// Отсчёты идут, но последний старше допустимого возраста.
    Stale {
        #[serde(rename = "ageMs")]
        age_ms: u64,
    },
}

/// Состояние самого моста.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BridgeStatus {
    /// Целевая поверхность ещё недоступна (например, перезагружается).
    WaitingForSurface,
    Ready,
    /// Кадр завершился перехваченной ошибкой поверхности.
    SurfaceError,
}

/// Последний снимок состояния моста.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// UUID сессии моста — один на запуск цикла.
    pub session_id: String,
    pub feed: FeedStatus,
    pub bridge: BridgeStatus,
    /// Последняя спроецированная точка (координаты целевой поверхности).
    pub mapped_point: Option<Point>,
    pub updated_at: DateTime<Utc>,
}

impl StatusSnapshot {
    fn new(session_id: String) -> Self {
        Self {
            session_id,
            feed: FeedStatus::NotReady,
            bridge: BridgeStatus::WaitingForSurface,
            mapped_point: None,
            updated_at: Utc::now(),
        }
    }
}

/// Разделяемая ячейка «последний статус» — пишут цикл и сторож, читает хост.
#[derive(Clone)]
pub struct StatusCell {
    inner: Arc<Mutex<StatusSnapshot>>,
}

impl StatusCell {
    pub fn new() -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        Self {
            inner: Arc::new(Mutex::new(StatusSnapshot::new(session_id))),
        }
    }

    pub fn set_feed(&self, feed: FeedStatus) {
        if let Ok(mut snapshot) = self.inner.lock() {
            snapshot.feed = feed;
            snapshot.updated_at = Utc::now();
        }
    }

    pub fn set_bridge(&self, bridge: BridgeStatus) {
        if let Ok(mut snapshot) = self.inner.lock() {
            snapshot.bridge = bridge;
            snapshot.updated_at = Utc::now();
        }
    }

    pub fn set_mapped_point(&self, point: Option<Point>) {
        if let Ok(mut snapshot) = self.inner.lock() {
            snapshot.mapped_point = point;
            snapshot.updated_at = Utc::now();
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner
            .lock()
            .map(|snapshot| snapshot.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_reports_latest_write() {
        let cell = StatusCell::new();
        cell.set_feed(FeedStatus::Live);
        cell.set_bridge(BridgeStatus::Ready);
        cell.set_mapped_point(Some(Point::new(12.0, 34.0)));

        let snapshot = cell.snapshot();
        assert_eq!(snapshot.feed, FeedStatus::Live);
        assert_eq!(snapshot.bridge, BridgeStatus::Ready);
        assert_eq!(snapshot.mapped_point, Some(Point::new(12.0, 34.0)));
    }

    #[test]
    fn stale_status_serializes_age() {
        let json =
            serde_json::to_string(&FeedStatus::Stale { age_ms: 912 }).expect("serialize status");
        assert!(json.contains("\"state\":\"stale\""));
        assert!(json.contains("\"ageMs\":912"));
    }
}
