mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{
    FakeMovies, FakeSeries, FakeTransfer, RecordingSink, movie_backends, series_backends,
    series_item, statistics,
};
use slavarr::domain::{ItemId, MediaKind, QueueEntry, TransferState, TransferStatus};
use slavarr::render::{Action, MessageHandle, StatusSink};
use slavarr::services::{
    Backends, StatusProbe, TrackState, Tracker, TrackingOutcome, TrackingSettings,
    TransferBackend,
};
use tokio::time::Instant;

const MOVIE: ItemId = ItemId::new(12);

fn settings(max_iterations: u32) -> TrackingSettings {
    TrackingSettings {
        interval: Duration::from_secs(10),
        max_iterations,
        bar_width: 20,
    }
}

fn tracker(backends: Backends, sink: &Arc<RecordingSink>, max_iterations: u32) -> Tracker {
    Tracker::new(
        StatusProbe::new(backends),
        Arc::clone(sink) as Arc<dyn StatusSink>,
        settings(max_iterations),
    )
}

fn held_movie() -> Arc<FakeMovies> {
    let movies = Arc::new(FakeMovies::with_results(Vec::new()));
    movies.hold(27205, MOVIE.value());
    movies
}

fn handle() -> MessageHandle {
    MessageHandle("status-1".to_string())
}

#[tokio::test(start_paused = true)]
async fn loop_stops_after_max_iterations() {
    let movies = held_movie();
    let sink = Arc::new(RecordingSink::default());
    let tracker = tracker(movie_backends(&movies), &sink, 3);

    let start = Instant::now();
    let tracking = tracker.start(MediaKind::Movie, MOVIE, handle());
    assert_eq!(tracking.wait().await, Some(TrackingOutcome::Exhausted));

    assert!(start.elapsed() <= Duration::from_secs(30));
    assert_eq!(tracking.iterations(), 3);
    assert!(tracking.is_finished());
    assert_eq!(sink.edits_for(&handle()).len(), 3);
    assert_eq!(movies.get_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn loop_ends_when_item_is_downloaded() {
    let movies = held_movie();
    let sink = Arc::new(RecordingSink::default());
    let tracker = tracker(movie_backends(&movies), &sink, 30);

    let tracking = tracker.start(MediaKind::Movie, MOVIE, handle());
    tokio::time::sleep(Duration::from_secs(15)).await;
    movies.finish(MOVIE);

    assert_eq!(tracking.wait().await, Some(TrackingOutcome::Done));
    assert_eq!(tracking.iterations(), 2);

    let last = sink.edits_for(&handle()).pop().unwrap();
    assert!(last.actions.is_empty());
    let embed = last.embed.unwrap();
    assert_eq!(embed.field_value("State"), Some("✅ Downloaded"));
}

#[tokio::test(start_paused = true)]
async fn stop_interrupts_pending_sleep() {
    let movies = held_movie();
    let sink = Arc::new(RecordingSink::default());
    let tracker = tracker(movie_backends(&movies), &sink, 30);

    let tracking = tracker.start(MediaKind::Movie, MOVIE, handle());
    tokio::time::sleep(Duration::from_secs(1)).await;

    let start = Instant::now();
    assert!(tracking.stop().await);
    assert!(tracking.is_cancelled());
    assert_eq!(tracking.wait().await, Some(TrackingOutcome::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(10));

    // Stopping again is a no-op and does not edit the message twice.
    let edits_before = sink.edits_for(&handle()).len();
    assert!(!tracking.stop().await);
    assert_eq!(sink.edits_for(&handle()).len(), edits_before);

    let last = sink.edits_for(&handle()).pop().unwrap();
    assert_eq!(last.content.as_deref(), Some("🛑 Tracking stopped."));
    assert!(last.embed.is_some());
    assert_eq!(tracking.wait().await, None);
}

#[tokio::test(start_paused = true)]
async fn uneditable_message_aborts_loop() {
    let movies = held_movie();
    let sink = Arc::new(RecordingSink::default());
    sink.fail_edits.store(true, Ordering::SeqCst);
    let tracker = tracker(movie_backends(&movies), &sink, 30);

    let tracking = tracker.start(MediaKind::Movie, MOVIE, handle());
    assert_eq!(tracking.wait().await, Some(TrackingOutcome::Aborted));
    assert_eq!(tracking.iterations(), 0);
}

#[tokio::test(start_paused = true)]
async fn refresh_does_not_count_as_iteration() {
    let movies = held_movie();
    let sink = Arc::new(RecordingSink::default());
    let tracker = tracker(movie_backends(&movies), &sink, 30);

    let tracking = tracker.start(MediaKind::Movie, MOVIE, handle());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(tracking.iterations(), 1);

    let report = tracking.refresh_now().await.unwrap();
    assert_eq!(report.state, TrackState::Queued);
    assert_eq!(tracking.iterations(), 1);
    assert_eq!(sink.edits_for(&handle()).len(), 2);

    let refreshed = sink.edits_for(&handle()).pop().unwrap();
    assert_eq!(
        refreshed.actions,
        vec![Action::RefreshNow, Action::StopTracking]
    );
    tracking.stop().await;
}

#[tokio::test(start_paused = true)]
async fn missing_item_ends_tracking() {
    let movies = Arc::new(FakeMovies::with_results(Vec::new()));
    let sink = Arc::new(RecordingSink::default());
    let tracker = tracker(movie_backends(&movies), &sink, 30);

    let tracking = tracker.start(MediaKind::Movie, ItemId::new(404), handle());
    assert_eq!(tracking.wait().await, Some(TrackingOutcome::Done));

    let embed = sink.edits_for(&handle()).pop().unwrap().embed.unwrap();
    assert_eq!(
        embed.description.as_deref(),
        Some("⚠️ Movie not found in Radarr.")
    );
}

#[tokio::test]
async fn downloading_movie_reports_transfer() {
    let movies = held_movie();
    *movies.queue.lock().unwrap() = vec![QueueEntry {
        item_id: Some(MOVIE),
        size: 200.0,
        size_left: 50.0,
        time_left: Some("00:10:00".to_string()),
        download_id: Some("HASH".to_string()),
        ..QueueEntry::default()
    }];
    let transfer = Arc::new(FakeTransfer {
        status: TransferStatus {
            state: TransferState::Download,
            percent_done: 0.75,
            rate_download: 1024,
            eta: 600,
        },
    });
    let probe = StatusProbe::new(
        movie_backends(&movies).with_transfer(transfer as Arc<dyn TransferBackend>),
    );

    let report = probe.probe(MediaKind::Movie, MOVIE).await.unwrap();
    assert_eq!(report.state, TrackState::Downloading);
    assert_eq!(report.percent, Some(75.0));
    assert!(!report.done);
    assert_eq!(
        report.transfer.as_deref(),
        Some("download • 75.0% • 1024 B/s • eta 600")
    );

    let embed = slavarr::render::status_embed(&report, 20);
    let progress = embed.field_value("Progress").unwrap();
    assert!(progress.ends_with("75.0% • ETA 00:10:00"));
    assert!(embed.field_value("Transmission").is_some());
}

#[tokio::test]
async fn series_at_full_percent_is_complete() {
    let movies = Arc::new(FakeMovies::with_results(Vec::new()));
    let mut show = series_item(Some(7), "Severance", Vec::new());
    show.statistics = Some(statistics(19, 19));
    let mut series = FakeSeries::with_results(Vec::new());
    *series.existing.get_mut().unwrap() = Some(show);
    let series = Arc::new(series);
    let probe = StatusProbe::new(series_backends(&movies, &series));

    let report = probe.probe(MediaKind::Series, ItemId::new(7)).await.unwrap();
    assert_eq!(report.state, TrackState::Complete);
    assert_eq!(report.episodes, Some((19, 19)));
    assert!(report.done);

    let embed = slavarr::render::status_embed(&report, 4);
    assert_eq!(
        embed.field_value("Progress"),
        Some("`████` 100.0%  (19/19 eps)")
    );
}
