use std::time::Duration;

use tokio::time::{Instant, sleep};

use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Msg {
    Tick(u32),
    Select(&'static str),
    Open(&'static str),
    Dropped(&'static str),
}

#[tokio::test(start_paused = true)]
async fn scheduled_call_is_delivered_after_its_delay() {
    let (scheduler, mut mailbox) = channel();
    let started = Instant::now();

    scheduler.schedule(Duration::from_secs(5), Msg::Tick(1));
    assert_eq!(scheduler.pending_count(), 1);

    assert_eq!(mailbox.recv().await, Some(Msg::Tick(1)));
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(scheduler.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn messages_arrive_in_firing_order() {
    let (scheduler, mut mailbox) = channel();

    scheduler.schedule(Duration::from_secs(3), Msg::Tick(3));
    scheduler.schedule(Duration::from_secs(1), Msg::Tick(1));
    scheduler.post(Msg::Tick(0));
    scheduler.schedule(Duration::from_secs(2), Msg::Tick(2));

    for expected in 0..4 {
        assert_eq!(mailbox.recv().await, Some(Msg::Tick(expected)));
    }
}

#[tokio::test(start_paused = true)]
async fn cancelled_call_never_runs() {
    let (scheduler, mut mailbox) = channel();

    let first = scheduler.schedule(Duration::from_secs(5), Msg::Tick(1));
    scheduler.schedule(Duration::from_secs(10), Msg::Tick(2));

    assert!(first.is_pending());
    assert!(first.cancel());
    assert!(!first.is_pending());
    assert!(!first.cancel(), "a second cancel has nothing to cancel");

    assert_eq!(mailbox.recv().await, Some(Msg::Tick(2)));
    assert!(mailbox.try_recv().is_none());
}

#[tokio::test(start_paused = true)]
async fn cancel_after_firing_cannot_retract_the_message() {
    let (scheduler, mut mailbox) = channel();

    let handle = scheduler.schedule(Duration::from_secs(1), Msg::Tick(1));
    sleep(Duration::from_secs(2)).await;

    assert!(!handle.cancel());
    assert_eq!(mailbox.try_recv(), Some(Msg::Tick(1)));
}

#[tokio::test(start_paused = true)]
async fn call_ids_are_unique() {
    let (scheduler, _mailbox) = channel();
    let a = scheduler.schedule(Duration::from_secs(1), Msg::Tick(1));
    let b = scheduler.schedule(Duration::from_secs(1), Msg::Tick(2));
    a.cancel();
    let c = scheduler.schedule(Duration::from_secs(1), Msg::Tick(3));

    assert_ne!(a.id(), b.id());
    assert_ne!(a.id(), c.id());
    assert_ne!(b.id(), c.id());
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_pending_and_undelivered_messages() {
    let (scheduler, mut mailbox) = channel();

    scheduler.schedule(Duration::from_secs(1), Msg::Tick(1));
    scheduler.schedule(Duration::from_secs(60), Msg::Tick(2));
    scheduler.post(Msg::Tick(0));
    // the first timer fires into the mailbox but nobody receives it yet
    sleep(Duration::from_secs(2)).await;

    scheduler.shutdown();
    assert!(scheduler.is_shut_down());
    assert_eq!(scheduler.pending_count(), 0);

    assert_eq!(mailbox.recv().await, None);
    assert_eq!(mailbox.try_recv(), None);

    assert!(!scheduler.post(Msg::Tick(3)));
    let late = scheduler.schedule(Duration::from_secs(1), Msg::Tick(4));
    assert!(!late.is_pending());
}

fn selection_canceller(
    scheduler: &DeferredCallScheduler<Msg>,
) -> CallbackCanceller<&'static str, Msg> {
    CallbackCanceller::new(
        scheduler.clone(),
        Duration::from_millis(300),
        Msg::Select,
        Msg::Open,
    )
}

#[tokio::test(start_paused = true)]
async fn held_call_fires_after_timeout() {
    let (scheduler, mut mailbox) = channel();
    let mut canceller = selection_canceller(&scheduler);

    canceller.on_cancellable_event("a");
    assert!(canceller.has_pending());
    assert!(mailbox.try_recv().is_none());

    assert_eq!(mailbox.recv().await, Some(Msg::Select("a")));
    assert!(!canceller.has_pending());
}

#[tokio::test(start_paused = true)]
async fn consecutive_cancellable_events_release_the_previous_one() {
    let (scheduler, mut mailbox) = channel();
    let mut canceller = selection_canceller(&scheduler);

    canceller.on_cancellable_event("a");
    canceller.on_cancellable_event("b");

    // "a" is released immediately, "b" after the timeout
    assert_eq!(mailbox.try_recv(), Some(Msg::Select("a")));
    assert!(mailbox.try_recv().is_none());
    assert_eq!(mailbox.recv().await, Some(Msg::Select("b")));
}

#[tokio::test(start_paused = true)]
async fn other_event_cancels_the_held_call() {
    let (scheduler, mut mailbox) = channel();
    let mut canceller = selection_canceller(&scheduler).with_cancelled_callback(Msg::Dropped);

    canceller.on_cancellable_event("a");
    canceller.on_other_event("a");

    assert_eq!(mailbox.try_recv(), Some(Msg::Dropped("a")));
    assert_eq!(mailbox.try_recv(), Some(Msg::Open("a")));

    sleep(Duration::from_secs(1)).await;
    assert!(mailbox.try_recv().is_none(), "cancelled selection must not fire");
}

#[tokio::test(start_paused = true)]
async fn other_event_after_timeout_has_nothing_to_cancel() {
    let (scheduler, mut mailbox) = channel();
    let mut canceller = selection_canceller(&scheduler).with_cancelled_callback(Msg::Dropped);

    canceller.on_cancellable_event("a");
    assert_eq!(mailbox.recv().await, Some(Msg::Select("a")));

    canceller.on_other_event("b");
    assert_eq!(mailbox.try_recv(), Some(Msg::Open("b")));
    assert!(mailbox.try_recv().is_none());
}
