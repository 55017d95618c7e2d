//! Резервный источник сигнала: зеркалирует физическую мышь в `CursorFeed`.
//!
//! Используется для калибровки и для запуска моста без подключённого
//! трекера головы. Один поток на всё время жизни приложения: rdev-хук
//! слушает глобальные события и перезаписывает последний отсчёт.

use crate::models::geometry::ViewportSize;
use crate::tracker::feed::{CursorFeed, FeedClock};

/// Запускает фоновый поток с глобальным хуком мыши.
/// Вызывается ОДИН РАЗ при старте приложения.
pub fn spawn_mouse_feed_thread(feed: CursorFeed, clock: FeedClock) {
    std::thread::Builder::new()
        .name("hnav-mouse-feed".to_string())
        .spawn(move || {
            // Источник публикует размер своего «вьюпорта» — основного дисплея.
            match rdev::display_size() {
                Ok((width, height)) => {
                    feed.set_viewport(ViewportSize::new(width as f64, height as f64));
                }
                Err(e) => log::warn!("mouse feed: display size unavailable: {e:?}"),
            }

            if let Err(e) = rdev::listen(move |event| {
                if let rdev::EventType::MouseMove { x, y } = event.event_type {
                    feed.publish(x, y, clock.now_ms());
                }
            }) {
                log::error!("rdev::listen error: {e:?}");
            }
        })
        .expect("Failed to spawn mouse feed thread");
}
