use serde_json::json;
use timer_relay::{
    protocol::ActionMessage,
    services::NotificationSink,
    state::TimerStateSnapshot,
    testing::Harness,
    worker::{DispatchOutcome, WorkerMode, CACHE_NAME, NOTIFICATION_TAG, NOTIFICATION_TITLE},
};

fn update(payload: serde_json::Value) -> ActionMessage {
    serde_json::from_value(json!({ "type": "TIMER_STATE_UPDATE", "payload": payload })).unwrap()
}

#[tokio::test]
async fn update_merges_into_prior_state() {
    let harness = Harness::new(CACHE_NAME, WorkerMode::Full);
    harness
        .worker
        .message(update(json!({ "gymSeconds": 10, "seriesCount": 2, "gymRunning": true })))
        .await
        .unwrap();

    let merged = harness
        .worker
        .message(update(json!({ "seriesCount": 5 })))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        merged,
        TimerStateSnapshot {
            gym_seconds: 10,
            series_count: 5,
            gym_running: true,
            ..TimerStateSnapshot::new()
        }
    );
    assert_eq!(harness.worker.snapshot(), merged);
}

#[tokio::test]
async fn disabled_notifications_are_never_shown() {
    let harness = Harness::new(CACHE_NAME, WorkerMode::Full);

    for payload in [
        json!({ "gymSeconds": 1, "gymRunning": true }),
        json!({ "seriesCount": 3 }),
        json!({ "notificationsEnabled": false, "restSeconds": 30 }),
    ] {
        harness.worker.message(update(payload)).await.unwrap();
    }

    assert!(harness.notifications.displayed().await.unwrap().is_empty());
    assert_eq!(harness.notifications.alert_count(), 0);
}

#[tokio::test]
async fn enabled_updates_replace_one_notification() {
    let harness = Harness::new(CACHE_NAME, WorkerMode::Full);
    harness
        .worker
        .message(update(json!({ "notificationsEnabled": true, "gymSeconds": 65 })))
        .await
        .unwrap();
    harness
        .worker
        .message(update(json!({ "gymSeconds": 66, "restRunning": true })))
        .await
        .unwrap();

    let displayed = harness.notifications.displayed().await.unwrap();
    assert_eq!(displayed.len(), 1);
    assert_eq!(displayed[0].title, NOTIFICATION_TITLE);
    assert_eq!(displayed[0].options.tag, NOTIFICATION_TAG);
    assert_eq!(
        displayed[0].options.body,
        "Tiempo: 00:01:06 ⏸️ · Descanso: 00:00 ▶️ · Series: 0"
    );
    assert_eq!(displayed[0].options.data.gym_seconds, 66);
    // Re-alerts on every publish.
    assert_eq!(harness.notifications.alert_count(), 2);
}

#[tokio::test]
async fn garbage_numbers_are_coerced() {
    let harness = Harness::new(CACHE_NAME, WorkerMode::Full);
    let merged = harness
        .worker
        .message(update(json!({ "gymSeconds": "soon", "restSeconds": -4, "seriesCount": 2.7 })))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(merged.gym_seconds, 0);
    assert_eq!(merged.rest_seconds, 0);
    assert_eq!(merged.series_count, 2);
}

#[tokio::test]
async fn foreground_bound_messages_are_ignored_by_the_worker() {
    let harness = Harness::new(CACHE_NAME, WorkerMode::Full);
    let result = harness.worker.message(ActionMessage::AddSeries).await.unwrap();
    assert_eq!(result, None);
    assert_eq!(harness.worker.snapshot(), TimerStateSnapshot::new());
}

#[tokio::test]
async fn minimal_mode_ignores_state_updates() {
    let harness = Harness::new(CACHE_NAME, WorkerMode::Minimal);
    let result = harness
        .worker
        .message(update(json!({ "notificationsEnabled": true, "seriesCount": 9 })))
        .await
        .unwrap();

    assert_eq!(result, None);
    assert!(harness.notifications.displayed().await.unwrap().is_empty());
}

#[tokio::test]
async fn add_series_broadcasts_to_every_window() {
    let harness = Harness::new(CACHE_NAME, WorkerMode::Full);
    for id in [1, 2, 3] {
        harness.clients.add_window(id);
    }

    let outcome = harness
        .worker
        .notification_click(Some("add-series"), NOTIFICATION_TAG)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::Broadcast {
            message: ActionMessage::AddSeries,
            delivered: 3
        }
    );
    let mut inbox = harness.clients.inbox();
    inbox.sort_by_key(|(id, _)| *id);
    assert_eq!(
        inbox,
        vec![
            (1, ActionMessage::AddSeries),
            (2, ActionMessage::AddSeries),
            (3, ActionMessage::AddSeries),
        ]
    );
    assert!(harness.clients.focused().is_empty());
    assert!(harness.clients.opened().is_empty());
}

#[tokio::test]
async fn reset_series_skips_unreachable_windows() {
    let harness = Harness::new(CACHE_NAME, WorkerMode::Full);
    harness.clients.add_window(1);
    harness.clients.add_window(2);
    harness.clients.make_unreachable(1);

    let outcome = harness
        .worker
        .notification_click(Some("reset-series"), NOTIFICATION_TAG)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::Broadcast {
            message: ActionMessage::ResetSeries,
            delivered: 1
        }
    );
    assert_eq!(harness.clients.inbox(), vec![(2, ActionMessage::ResetSeries)]);
}

#[tokio::test]
async fn click_closes_the_notification() {
    let harness = Harness::new(CACHE_NAME, WorkerMode::Full);
    harness
        .worker
        .message(update(json!({ "notificationsEnabled": true })))
        .await
        .unwrap();
    assert_eq!(harness.notifications.displayed().await.unwrap().len(), 1);

    harness
        .worker
        .notification_click(Some("add-series"), NOTIFICATION_TAG)
        .await
        .unwrap();

    assert!(harness.notifications.displayed().await.unwrap().is_empty());
}

#[tokio::test]
async fn default_action_without_windows_opens_the_timer() {
    let harness = Harness::new(CACHE_NAME, WorkerMode::Full);

    let outcome = harness
        .worker
        .notification_click(None, NOTIFICATION_TAG)
        .await
        .unwrap();

    let target = harness.url("./index.html#cronometro");
    assert_eq!(outcome, DispatchOutcome::Opened(target.clone()));
    assert_eq!(harness.clients.opened(), vec![target.clone()]);
    assert_eq!(target.fragment(), Some("cronometro"));
    assert!(harness.clients.inbox().is_empty());
}

#[tokio::test]
async fn default_action_focuses_the_first_window() {
    let harness = Harness::new(CACHE_NAME, WorkerMode::Full);
    harness.clients.add_window(7);
    harness.clients.add_window(8);

    let outcome = harness
        .worker
        .notification_click(Some("open-app"), NOTIFICATION_TAG)
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Focused(7));
    assert_eq!(harness.clients.focused(), vec![7]);
    assert_eq!(harness.clients.inbox(), vec![(7, ActionMessage::OpenTimer)]);
    assert!(harness.clients.opened().is_empty());
}

#[tokio::test]
async fn seeded_mirror_is_merged_into() {
    use timer_relay::state::StateMirror;

    let Harness { worker, .. } = Harness::new(CACHE_NAME, WorkerMode::Full);
    let worker = worker.with_mirror(StateMirror::with_snapshot(TimerStateSnapshot {
        rest_seconds: 45,
        rest_running: true,
        ..TimerStateSnapshot::new()
    }));

    let merged = worker
        .message(update(json!({ "restRunning": false })))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(merged.rest_seconds, 45);
    assert!(!merged.rest_running);
}
