// Dashboard runtime - one task owns the dashboard and serialises every event
use crate::application::asset_source::{FeedSource, ResourceProbe};
use crate::application::dashboard::{Dashboard, DashboardEvent, DashboardView, Task};
use crate::application::error::DashboardError;
use crate::application::focus_controller::ProbeOutcome;
use crate::application::raster_selector::RasterRequest;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

const COMMAND_BUFFER: usize = 100;

enum Command {
    Dispatch {
        event: DashboardEvent,
        reply: oneshot::Sender<Result<(), DashboardError>>,
    },
    Snapshot {
        reply: oneshot::Sender<DashboardView>,
    },
    Complete(DashboardEvent),
}

/// Cloneable entry point used by request handlers.
#[derive(Clone)]
pub struct DashboardHandle {
    tx: mpsc::Sender<Command>,
}

impl DashboardHandle {
    pub async fn dispatch(&self, event: DashboardEvent) -> Result<(), DashboardError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Dispatch { event, reply })
            .await
            .map_err(|_| DashboardError::Stopped)?;
        rx.await.map_err(|_| DashboardError::Stopped)?
    }

    pub async fn snapshot(&self) -> Result<DashboardView, DashboardError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| DashboardError::Stopped)?;
        rx.await.map_err(|_| DashboardError::Stopped)
    }
}

struct DashboardRuntime {
    dashboard: Dashboard,
    feed: Arc<dyn FeedSource>,
    probe: Arc<dyn ResourceProbe>,
    // weak so the task ends once every handle is dropped
    completions: mpsc::WeakSender<Command>,
}

/// Spawn the task that owns `dashboard`. It exits when the last handle is dropped.
pub fn spawn_dashboard(
    dashboard: Dashboard,
    feed: Arc<dyn FeedSource>,
    probe: Arc<dyn ResourceProbe>,
) -> DashboardHandle {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let runtime = DashboardRuntime {
        dashboard,
        feed,
        probe,
        completions: tx.downgrade(),
    };
    tokio::spawn(runtime.run(rx));
    DashboardHandle { tx }
}

impl DashboardRuntime {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Dispatch { event, reply } => {
                    let result = self.process(event);
                    let _ = reply.send(result);
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(self.dashboard.view());
                }
                Command::Complete(event) => {
                    if let Err(e) = self.process(event) {
                        tracing::error!(error = %e, "failed to apply async completion");
                    }
                }
            }
        }
        tracing::debug!("dashboard task stopped");
    }

    fn process(&mut self, event: DashboardEvent) -> Result<(), DashboardError> {
        let tasks = self.dashboard.handle(event)?;
        for task in tasks {
            self.spawn_task(task);
        }
        Ok(())
    }

    fn spawn_task(&self, task: Task) {
        match task {
            Task::FetchFeed { generation } => {
                let Some(tx) = self.completions.upgrade() else {
                    return;
                };
                let feed = self.feed.clone();
                tokio::spawn(async move {
                    let result = feed.fetch_feed().await;
                    let event = DashboardEvent::FeedFetched { generation, result };
                    let _ = tx.send(Command::Complete(event)).await;
                });
            }
            Task::AwaitStyle(request) => self.await_style(request),
            Task::Probe(request) => {
                let Some(tx) = self.completions.upgrade() else {
                    return;
                };
                let probe = self.probe.clone();
                tokio::spawn(async move {
                    let exists = probe.exists(&request.path).await;
                    let event = DashboardEvent::ImageProbed(ProbeOutcome { request, exists });
                    let _ = tx.send(Command::Complete(event)).await;
                });
            }
        }
    }

    /// Park until the map style is ready. The wait may never end, so it keeps
    /// only the weak sender and cannot hold the task open.
    fn await_style(&self, request: RasterRequest) {
        let map = self.dashboard.map();
        let completions = self.completions.clone();
        tokio::spawn(async move {
            map.style_loaded().await;
            if let Some(tx) = completions.upgrade() {
                let _ = tx
                    .send(Command::Complete(DashboardEvent::StyleReady(request)))
                    .await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::FeedError;
    use crate::application::focus_controller::ImageCardKind;
    use crate::application::map_surface::{Camera, LngLat};
    use crate::application::raster_selector::RasterPhase;
    use crate::infrastructure::config::DashboardConfig;
    use crate::infrastructure::scene_map::SceneMap;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    struct StaticFeed(Mutex<Option<String>>);

    #[async_trait]
    impl FeedSource for StaticFeed {
        async fn fetch_feed(&self) -> Result<String, FeedError> {
            self.0
                .lock()
                .unwrap()
                .clone()
                .ok_or(FeedError::Status(503))
        }
    }

    /// Every image exists, but answers only after `release` is notified.
    struct GatedProbe {
        release: Notify,
    }

    #[async_trait]
    impl ResourceProbe for GatedProbe {
        async fn exists(&self, _path: &str) -> bool {
            self.release.notified().await;
            true
        }
    }

    const FEED: &str = "sensor_id,lat,lon,pm25,street\nA,57.7,11.9,12,Main\nB,57.6,11.8,75,";

    struct Harness {
        map: Arc<SceneMap>,
        feed: Arc<StaticFeed>,
        probe: Arc<GatedProbe>,
        handle: DashboardHandle,
    }

    fn harness(style_loaded: bool) -> Harness {
        let map = Arc::new(SceneMap::new(Camera {
            center: LngLat { lon: 11.97, lat: 57.70 },
            zoom: 11.0,
        }));
        if style_loaded {
            map.mark_style_loaded();
        }
        let feed = Arc::new(StaticFeed(Mutex::new(Some(FEED.to_string()))));
        let probe = Arc::new(GatedProbe {
            release: Notify::new(),
        });
        let dashboard = Dashboard::new(&DashboardConfig::default(), map.clone());
        let handle = spawn_dashboard(dashboard, feed.clone(), probe.clone());
        Harness {
            map,
            feed,
            probe,
            handle,
        }
    }

    async fn eventually<F>(handle: &DashboardHandle, predicate: F) -> DashboardView
    where
        F: Fn(&DashboardView) -> bool,
    {
        for _ in 0..200 {
            let view = handle.snapshot().await.unwrap();
            if predicate(&view) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_map_loaded_fetches_feed_and_draws_raster() {
        let h = harness(true);
        h.handle.dispatch(DashboardEvent::MapLoaded).await.unwrap();

        let view = eventually(&h.handle, |v| v.sensor_count == 2).await;
        assert_eq!(view.raster, RasterPhase::Present(0));
        assert_eq!(h.map.overlay_count(), 1);
        assert_eq!(h.map.marker_count(), 2);
    }

    #[tokio::test]
    async fn test_raster_waits_for_style() {
        let h = harness(false);
        h.handle
            .dispatch(DashboardEvent::DaySelected(3))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(h.map.overlay_count(), 0);

        h.map.mark_style_loaded();
        eventually(&h.handle, |v| v.raster == RasterPhase::Present(3)).await;
        assert_eq!(h.map.overlay_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_probe_after_clear_is_ignored() {
        let h = harness(true);
        h.handle.dispatch(DashboardEvent::MapLoaded).await.unwrap();
        eventually(&h.handle, |v| v.sensor_count == 2).await;

        h.handle
            .dispatch(DashboardEvent::MarkerClicked("A".into()))
            .await
            .unwrap();
        h.handle
            .dispatch(DashboardEvent::BackgroundClicked)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.probe.release.notify_waiters();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let view = h.handle.snapshot().await.unwrap();
        assert!(!view.forecast_card.visible);
        assert!(!view.hindcast_card.visible);
        assert!(!view.focus.visible);
    }

    #[tokio::test]
    async fn test_probe_for_current_focus_shows_cards() {
        let h = harness(true);
        h.handle.dispatch(DashboardEvent::MapLoaded).await.unwrap();
        eventually(&h.handle, |v| v.sensor_count == 2).await;

        h.handle
            .dispatch(DashboardEvent::MarkerClicked("B".into()))
            .await
            .unwrap();
        // probes may still be registering on the gate; keep releasing until they land
        let view = {
            let mut found = None;
            for _ in 0..200 {
                h.probe.release.notify_waiters();
                let view = h.handle.snapshot().await.unwrap();
                if view.forecast_card.visible && view.hindcast_card.visible {
                    found = Some(view);
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            found.expect("cards shown")
        };
        assert_eq!(
            view.forecast_card.src.as_deref(),
            Some("models/B/images/forecast.png")
        );

        h.handle
            .dispatch(DashboardEvent::CardClicked(ImageCardKind::Hindcast))
            .await
            .unwrap();
        let view = h.handle.snapshot().await.unwrap();
        assert_eq!(
            view.image_modal.src.as_deref(),
            Some("models/B/images/hindcast_prediction.png")
        );
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_data() {
        let h = harness(true);
        h.handle.dispatch(DashboardEvent::MapLoaded).await.unwrap();
        eventually(&h.handle, |v| v.sensor_count == 2).await;

        *h.feed.0.lock().unwrap() = None;
        h.handle.dispatch(DashboardEvent::ReloadFeed).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let view = h.handle.snapshot().await.unwrap();
        assert_eq!(view.sensor_count, 2);
        assert_eq!(h.map.marker_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_day_is_reported_to_caller() {
        let h = harness(true);
        assert_eq!(
            h.handle.dispatch(DashboardEvent::DaySelected(99)).await,
            Err(DashboardError::UnknownDay(99))
        );
    }

    #[tokio::test]
    async fn test_pending_style_waits_do_not_keep_task_alive() {
        let Harness { feed, handle, .. } = harness(false);
        for day in [1, 2, 3] {
            handle.dispatch(DashboardEvent::DaySelected(day)).await.unwrap();
        }
        drop(handle);

        for _ in 0..200 {
            if Arc::strong_count(&feed) == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("dashboard task still running with style never loaded");
    }
}
