//! Ячейка «последний отсчёт курсора» — канал от трекера к циклу кадров.
//!
//! Один производитель (трекер или резервный источник мыши) перезаписывает
//! последний отсчёт; один потребитель (цикл кадров) читает его. Без
//! буферизации и без гарантий доставки: побеждает последняя запись,
//! отсутствие записи означает «сигнал не готов».

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::models::geometry::{CursorSample, ViewportSize};

/// Монотонные часы моста: миллисекунды от старта сессии.
#[derive(Debug, Clone, Copy)]
pub struct FeedClock {
    epoch: Instant,
}

impl FeedClock {
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

#[derive(Default)]
struct FeedInner {
    sample: Option<CursorSample>,
    viewport: Option<ViewportSize>,
}

/// Разделяемая ячейка последнего отсчёта курсора.
#[derive(Clone)]
pub struct CursorFeed {
    inner: Arc<Mutex<FeedInner>>,
}

impl CursorFeed {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FeedInner::default())),
        }
    }

    /// Публикует свежий отсчёт в координатах вьюпорта трекера.
    pub fn publish(&self, x: f64, y: f64, now_ms: u64) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        if let Ok(mut inner) = self.inner.lock() {
            inner.sample = Some(CursorSample { ts: now_ms, x, y });
        }
    }

    /// Толерантный приём слабо типизированной записи `{x, y}`.
    ///
    /// Принимаются только конечные числовые поля; всё остальное молча
    /// игнорируется — это «сигнал не готов», а не ошибка.
    pub fn publish_value(&self, value: &serde_json::Value, now_ms: u64) -> bool {
        let x = value.get("x").and_then(serde_json::Value::as_f64);
        let y = value.get("y").and_then(serde_json::Value::as_f64);

        match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => {
                self.publish(x, y, now_ms);
                true
            }
            _ => false,
        }
    }

    /// Размер вьюпорта, в котором трекер измеряет координаты.
    pub fn set_viewport(&self, viewport: ViewportSize) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.viewport = Some(viewport);
        }
    }

    #[must_use]
    pub fn latest(&self) -> Option<CursorSample> {
        self.inner.lock().ok().and_then(|inner| inner.sample)
    }

    #[must_use]
    pub fn viewport(&self) -> Option<ViewportSize> {
        self.inner.lock().ok().and_then(|inner| inner.viewport)
    }

    /// Возраст последнего отсчёта; `None`, если отсчётов ещё не было.
    pub fn age_ms(&self, now_ms: u64) -> Option<u64> {
        self.latest().map(|sample| now_ms.saturating_sub(sample.ts))
    }

    /// Протух ли сигнал. Отсутствие отсчётов — не «протухание», а NotReady.
    pub fn is_stale(&self, now_ms: u64, max_age_ms: u64) -> bool {
        self.age_ms(now_ms)
            .is_some_and(|age| age > max_age_ms)
    }

    /// Сбрасывает ячейку в состояние «сигнал не готов».
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.sample = None;
        }
    }
}

impl Default for CursorFeed {
    fn default() -> Self {
        Self::new()
    }
}
