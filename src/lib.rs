pub mod algorithm;
pub mod bridge;
pub mod models;
pub mod surface;
pub mod tracker;

#[cfg(windows)]
pub async fn run() -> Result<(), String> {
    use bridge::runner::{spawn_watchdog, Bridge};
    use tracker::feed::{CursorFeed, FeedClock};

    env_logger::init();

    let config = models::config::load_config()?;
    let clock = FeedClock::start();
    let feed = CursorFeed::new();
    tracker::mouse::spawn_mouse_feed_thread(feed.clone(), clock);

    let surface = surface::uia::UiaSurface::new()?;
    let mut bridge = Bridge::new(surface, feed.clone(), clock, config.clone());

    let stop_flag = bridge.stop_flag();
    spawn_watchdog(
        feed,
        clock,
        bridge.status(),
        config.dwell.signal_stale_ms,
        stop_flag.clone(),
    );

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("ctrl-c received, stopping bridge");
            stop_flag.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });

    bridge.run().await;
    Ok(())
}

#[cfg(not(windows))]
pub async fn run() -> Result<(), String> {
    env_logger::init();
    Err(
        "No native interaction surface backend for this platform; \
         only Windows UI Automation is supported"
            .to_string(),
    )
}
