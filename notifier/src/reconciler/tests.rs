use std::time::Duration;

use serde_json::{Value, json};
use twitch_client::api::testing::FakeTransport;
use twitch_client::api::KRAKEN_BASE;

use super::*;

const FOLLOWS: &str =
    "https://api.twitch.tv/kraken/users/fakeusername/follows/channels?limit=25&offset=0";
const STREAMS: &str =
    "https://api.twitch.tv/kraken/streams/followed?stream_type=live&limit=25&offset=0";

#[derive(Debug, Default)]
struct RecordingPresentation {
    displayed: Vec<Vec<String>>,
    log: Vec<String>,
    refreshing: bool,
    relayouts: usize,
    events: Vec<String>,
    status: Option<String>,
}

impl Presentation for RecordingPresentation {
    fn init_channel_display(&mut self, channels: &[Channel]) {
        self.displayed
            .push(channels.iter().map(|c| c.display_name.clone()).collect());
    }

    fn log_line(&mut self, text: &str) {
        self.log.push(text.to_string());
    }

    fn set_refresh_in_progress(&mut self, in_progress: bool) {
        self.refreshing = in_progress;
    }

    fn relayout(&mut self, _index: &OnlineOfflineIndex) {
        self.relayouts += 1;
    }

    fn event_logged(&mut self, entry: &TimelineEntry) {
        self.events.push(entry.message.clone());
    }

    fn set_status(&mut self, text: &str) {
        self.status = Some(text.to_string());
    }
}

type Reconciler = StateReconciler<FakeTransport, RecordingPresentation>;

fn channel_json(id: u64, name: &str) -> Value {
    json!({
        "_id": id,
        "display_name": name,
        "url": format!("https://www.twitch.tv/{}", name.to_lowercase()),
        "status": "somestatus",
        "logo": null
    })
}

fn follows_body(follows: &[(u64, &str, bool)]) -> String {
    let entries: Vec<Value> = follows
        .iter()
        .map(|&(id, name, notifications)| {
            json!({"channel": channel_json(id, name), "notifications": notifications})
        })
        .collect();
    json!({"follows": entries, "_total": follows.len()}).to_string()
}

fn stream_json(channel_id: u64, name: &str, stream_id: u64) -> Value {
    json!({
        "_id": stream_id,
        "channel": channel_json(channel_id, name),
        "is_playlist": false,
        "created_at": "2016-01-01T01:01:01Z",
        "game": "a vidya game"
    })
}

fn streams_body(streams: &[Value]) -> String {
    json!({"streams": streams, "_total": streams.len()}).to_string()
}

fn settings() -> ReconcilerSettings {
    ReconcilerSettings {
        username: Some("fakeusername".into()),
        ..ReconcilerSettings::default()
    }
}

fn reconciler_with(settings: ReconcilerSettings) -> Reconciler {
    StateReconciler::new(
        FakeTransport::new(),
        RecordingPresentation::default(),
        settings,
    )
}

fn reconciler() -> Reconciler {
    let r = reconciler_with(settings());
    r.transport().respond(
        FOLLOWS,
        200,
        &follows_body(&[(123, "FakeChannel", true), (7, "another", true)]),
    );
    r
}

async fn cycle_with_streams(r: &mut Reconciler, streams: &[Value]) -> Cycle {
    r.transport().respond(STREAMS, 200, &streams_body(streams));
    r.run_cycle().await.unwrap()
}

#[tokio::test]
async fn channel_goes_online_then_offline() {
    let mut r = reconciler();

    let cycle = cycle_with_streams(&mut r, &[stream_json(123, "FakeChannel", 456)]).await;
    assert_eq!(r.phase(), Phase::Polling);
    assert_eq!(r.presentation().displayed, vec![vec!["another", "FakeChannel"]]);
    assert_eq!(r.index().len(true), 1);
    assert_eq!(r.index().len(false), 1);
    assert_eq!(cycle.notifications.len(), 1);
    assert_eq!(
        cycle.notifications[0].url,
        "https://www.twitch.tv/fakechannel"
    );

    let cycle = cycle_with_streams(&mut r, &[]).await;
    assert_eq!(r.index().len(true), 0);
    assert_eq!(r.index().len(false), 2);
    assert!(cycle.notifications.is_empty());
    assert_eq!(
        r.presentation().events,
        vec![
            "FakeChannel is now live (a vidya game)",
            "FakeChannel is now offline"
        ]
    );
    assert_eq!(r.presentation().relayouts, 2);
    assert!(
        r.presentation()
            .status
            .as_deref()
            .is_some_and(|s| s.starts_with("Last poll "))
    );
}

#[tokio::test]
async fn same_stream_notifies_once() {
    let mut r = reconciler();
    let live = [stream_json(123, "FakeChannel", 456)];

    assert_eq!(cycle_with_streams(&mut r, &live).await.notifications.len(), 1);
    assert_eq!(cycle_with_streams(&mut r, &live).await.notifications.len(), 0);
    assert_eq!(r.last_notified(123), Some(456));
}

#[tokio::test]
async fn new_stream_id_notifies_again() {
    let mut r = reconciler();

    let first = cycle_with_streams(&mut r, &[stream_json(123, "FakeChannel", 456)]).await;
    let second = cycle_with_streams(&mut r, &[stream_json(123, "FakeChannel", 789)]).await;
    assert_eq!(first.notifications.len() + second.notifications.len(), 2);
    assert_eq!(r.last_notified(123), Some(789));
}

#[tokio::test]
async fn same_stream_after_going_offline_notifies_again() {
    let mut r = reconciler();
    let live = [stream_json(123, "FakeChannel", 456)];

    let mut total = 0;
    total += cycle_with_streams(&mut r, &live).await.notifications.len();
    total += cycle_with_streams(&mut r, &[]).await.notifications.len();
    assert_eq!(r.last_notified(123), None);
    total += cycle_with_streams(&mut r, &live).await.notifications.len();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn playlist_stream_counts_as_offline() {
    let mut r = reconciler();
    cycle_with_streams(&mut r, &[stream_json(123, "FakeChannel", 456)]).await;

    let mut rerun = stream_json(123, "FakeChannel", 457);
    rerun["is_playlist"] = json!(true);
    let cycle = cycle_with_streams(&mut r, &[rerun]).await;

    assert!(cycle.notifications.is_empty());
    assert_eq!(r.index().len(true), 0);
    assert_eq!(r.last_notified(123), None);
    assert!(r.presentation().log.iter().any(|l| l.contains("playlist")));
}

#[tokio::test]
async fn follows_without_notifications_are_not_watched() {
    let mut r = reconciler_with(settings());
    r.transport().respond(
        FOLLOWS,
        200,
        &follows_body(&[(1, "loud", true), (2, "quiet", false)]),
    );

    let cycle = cycle_with_streams(
        &mut r,
        &[stream_json(1, "loud", 10), stream_json(2, "quiet", 20)],
    )
    .await;

    assert_eq!(r.presentation().displayed, vec![vec!["loud"]]);
    assert_eq!(cycle.notifications.len(), 1);
    assert!(r.channel(2).is_none());
    assert!(
        r.presentation()
            .log
            .contains(&"Notifications disabled for: quiet".to_string())
    );
}

#[tokio::test]
async fn watch_all_overrides_per_follow_flag() {
    let mut r = reconciler_with(ReconcilerSettings {
        watch_all: true,
        ..settings()
    });
    r.transport().respond(
        FOLLOWS,
        200,
        &follows_body(&[(1, "loud", true), (2, "quiet", false)]),
    );

    let cycle = cycle_with_streams(
        &mut r,
        &[stream_json(1, "loud", 10), stream_json(2, "quiet", 20)],
    )
    .await;

    assert_eq!(r.presentation().displayed, vec![vec!["loud", "quiet"]]);
    assert_eq!(cycle.notifications.len(), 2);
}

#[tokio::test]
async fn popups_off_still_tracks_sessions() {
    let mut r = reconciler_with(ReconcilerSettings {
        popups: false,
        ..settings()
    });
    r.transport()
        .respond(FOLLOWS, 200, &follows_body(&[(123, "FakeChannel", true)]));

    let cycle = cycle_with_streams(&mut r, &[stream_json(123, "FakeChannel", 456)]).await;
    assert!(cycle.notifications.is_empty());
    assert_eq!(r.last_notified(123), Some(456));
    assert_eq!(r.index().len(true), 1);
}

#[tokio::test]
async fn failed_poll_keeps_channels_online_and_applies_partial_results() {
    let mut r = reconciler_with(ReconcilerSettings {
        page_size: 1,
        ..settings()
    });
    let follows_url = |offset: u32| {
        format!(
            "https://api.twitch.tv/kraken/users/fakeusername/follows/channels?limit=1&offset={offset}"
        )
    };
    let streams_url = |offset: u32| {
        format!(
            "https://api.twitch.tv/kraken/streams/followed?stream_type=live&limit=1&offset={offset}"
        )
    };
    let t = r.transport();
    t.respond(
        &follows_url(0),
        200,
        &json!({"follows": [{"channel": channel_json(1, "alpha"), "notifications": true}], "_total": 2})
            .to_string(),
    );
    t.respond(
        &follows_url(1),
        200,
        &json!({"follows": [{"channel": channel_json(2, "bravo"), "notifications": true}], "_total": 2})
            .to_string(),
    );

    // bravo is live
    t.respond(&streams_url(0), 200, &streams_body(&[stream_json(2, "bravo", 20)]));
    r.run_cycle().await.unwrap();
    assert_eq!(r.index().online_ids().collect::<Vec<_>>(), vec![2]);

    // alpha shows up on the first page, the second page keeps failing
    let t = r.transport();
    t.respond(
        &streams_url(0),
        200,
        &json!({"streams": [stream_json(1, "alpha", 10)], "_total": 2}).to_string(),
    );
    t.respond(&streams_url(1), 500, "");
    r.presentation_mut().status = None;
    let cycle = r.run_cycle().await.unwrap();

    assert_eq!(r.index().online_ids().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(cycle.notifications.len(), 1);
    assert_eq!(r.transport().request_count(&streams_url(1)), 2);
    let log = &r.presentation().log;
    assert!(log.iter().any(|l| l.starts_with("Error during update streams follows request")));
    assert!(log.contains(
        &"Processing any partial update and waiting until the next request time".to_string()
    ));
    assert_eq!(r.presentation().status, None);
}

#[tokio::test]
async fn failed_follows_load_retries_quickly() {
    let mut r = reconciler_with(settings());
    r.transport().respond(FOLLOWS, 500, "");

    let cycle = r.run_cycle().await.unwrap();
    assert_eq!(cycle.wait, FOLLOWS_RETRY_WAIT);
    assert_eq!(cycle.reason, "retrying followed channels list");
    assert_eq!(r.phase(), Phase::NeedsReload);
    assert!(r.presentation().refreshing);
    assert_eq!(r.transport().request_count(FOLLOWS), 2);
    assert_eq!(r.transport().request_count(STREAMS), 0);

    r.transport()
        .respond(FOLLOWS, 200, &follows_body(&[(123, "FakeChannel", true)]));
    cycle_with_streams(&mut r, &[]).await;
    assert_eq!(r.phase(), Phase::Polling);
    assert!(!r.presentation().refreshing);
}

#[tokio::test]
async fn follows_load_gives_up_after_repeated_failures() {
    let mut r = reconciler_with(settings());
    r.transport().respond(FOLLOWS, 503, "");

    for _ in 0..MAX_FOLLOWS_RETRIES {
        assert!(r.run_cycle().await.is_ok());
    }
    let err = r.run_cycle().await.unwrap_err();
    let ReconcileError::FollowsUnavailable { failures, source } = err;
    assert_eq!(failures, MAX_FOLLOWS_RETRIES + 1);
    assert_eq!(source.status(), Some(503));
}

#[tokio::test]
async fn poll_wait_has_a_floor() {
    let mut r = reconciler_with(ReconcilerSettings {
        poll_interval: Duration::from_secs(5),
        ..settings()
    });
    r.transport().respond(FOLLOWS, 200, &follows_body(&[]));
    let cycle = cycle_with_streams(&mut r, &[]).await;
    assert_eq!(cycle.wait, MIN_POLL_INTERVAL);
    assert_eq!(cycle.reason, "Waiting 60 s for next poll");

    let mut r = reconciler_with(ReconcilerSettings {
        poll_interval: Duration::from_secs(300),
        ..settings()
    });
    r.transport().respond(FOLLOWS, 200, &follows_body(&[]));
    let cycle = cycle_with_streams(&mut r, &[]).await;
    assert_eq!(cycle.wait, Duration::from_secs(300));
}

#[tokio::test]
async fn username_is_resolved_once() {
    let mut r = reconciler_with(ReconcilerSettings::default());
    r.transport().respond(
        KRAKEN_BASE,
        200,
        r#"{"token": {"valid": true, "user_name": "fakeusername"}}"#,
    );
    r.transport()
        .respond(FOLLOWS, 200, &follows_body(&[(123, "FakeChannel", true)]));

    cycle_with_streams(&mut r, &[]).await;
    r.request_reload();
    cycle_with_streams(&mut r, &[]).await;

    assert_eq!(r.username(), Some("fakeusername"));
    assert_eq!(r.transport().request_count(KRAKEN_BASE), 1);
    assert_eq!(r.transport().request_count(FOLLOWS), 2);
}

#[tokio::test]
#[should_panic(expected = "got empty username from root request")]
async fn missing_identity_is_fatal() {
    let mut r = reconciler_with(ReconcilerSettings::default());
    r.transport()
        .respond(KRAKEN_BASE, 200, r#"{"token": {"valid": false}}"#);
    let _ = r.run_cycle().await;
}

#[tokio::test(start_paused = true)]
async fn follows_are_reloaded_after_the_interval() {
    let mut r = reconciler();

    cycle_with_streams(&mut r, &[]).await;
    cycle_with_streams(&mut r, &[]).await;
    assert_eq!(r.transport().request_count(FOLLOWS), 1);

    tokio::time::advance(Duration::from_secs(10 * 60)).await;
    cycle_with_streams(&mut r, &[]).await;
    assert_eq!(r.transport().request_count(FOLLOWS), 2);
    assert_eq!(r.presentation().displayed.len(), 2);
}

#[tokio::test]
async fn reload_keeps_notified_sessions_of_live_channels() {
    let mut r = reconciler();
    let live = [stream_json(123, "FakeChannel", 456)];

    assert_eq!(cycle_with_streams(&mut r, &live).await.notifications.len(), 1);
    r.request_reload();
    let cycle = cycle_with_streams(&mut r, &live).await;

    assert!(cycle.notifications.is_empty());
    assert_eq!(r.index().len(true), 1);
    // the online event was re-logged at the same stream start time
    assert_eq!(r.timeline().len(), 1);
}

#[tokio::test]
async fn list_entries_resolve_to_urls() {
    let mut r = reconciler();
    let mut live = stream_json(123, "FakeChannel", 456);
    live["channel"]["url"] = json!("https://www.twitch.tv/fakechannel_live");
    cycle_with_streams(&mut r, &[live]).await;

    let online = r.entry_at(true, 0).unwrap();
    assert_eq!(online.channel.id, 123);
    assert_eq!(online.stream.map(|s| s.id), Some(456));
    assert_eq!(online.url, "https://www.twitch.tv/fakechannel_live");

    let offline = r.entry_at(false, 0).unwrap();
    assert_eq!(offline.channel.display_name, "another");
    assert!(offline.stream.is_none());
    assert_eq!(offline.url, "https://www.twitch.tv/another");
    assert!(r.entry_at(false, 1).is_none());

    let event = r.timeline_entry_at(0).unwrap();
    assert_eq!(event.channel.id, 123);
    assert!(r.timeline_entry_at(1).is_none());
}
