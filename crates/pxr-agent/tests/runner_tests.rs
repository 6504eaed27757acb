//! Runner task on paused tokio time

use pxr_agent::{
    AgentError, Collaborators, ConfigError, Intent, SchedulerState, Session, SessionConfig,
    SessionRunner, TokioClock,
};
use pxr_test_utils::{
    raster_from_indices, RecordingNotifier, RecordingTransport, ScriptedRandom, StaticSurface,
};
use std::sync::Arc;
use std::time::Duration;

fn session(transport: &RecordingTransport) -> Session {
    let collaborators = Collaborators::new(
        Box::new(transport.clone()),
        Box::new(StaticSurface::blank(20, 20)),
    )
    .with_notifier(Box::new(RecordingNotifier::new()))
    .with_clock(Arc::new(TokioClock))
    .with_random(Box::new(ScriptedRandom::default()));

    Session::new(SessionConfig::default(), collaborators)
}

#[tokio::test(start_paused = true)]
async fn runner_ticks_and_applies_events() {
    let transport = RecordingTransport::new();
    let (runner, handle) = SessionRunner::channel(session(&transport));
    let task = tokio::spawn(runner.run());

    handle
        .request(Intent::LoadTemplate(raster_from_indices(2, 2, &[0, 1, 2, 254])))
        .await
        .unwrap();
    handle
        .request(Intent::SetOrigin { left: 5, top: 5 })
        .await
        .unwrap();
    handle.request(Intent::Start).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(transport.len(), 1);
    assert!(matches!(
        handle.snapshot().state,
        SchedulerState::CooldownWait { .. }
    ));

    handle
        .deliver(r#"{"type":"rate_limit","wait":180}"#)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.pending, None);
    assert_eq!(snapshot.confirmed, 1);

    // still cooling down a minute later
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.len(), 1);

    handle.request(Intent::Shutdown).await.unwrap();
    let last = task.await.unwrap();
    assert_eq!(last.sent, 1);
    assert!(!handle.is_running());
    assert!(matches!(
        handle.send(Intent::Stop).await,
        Err(AgentError::RunnerClosed)
    ));
}

#[tokio::test(start_paused = true)]
async fn runner_reports_intent_errors() {
    let transport = RecordingTransport::new();
    let (runner, handle) = SessionRunner::channel(session(&transport));
    let task = tokio::spawn(runner.run());

    let result = handle.request(Intent::Start).await;
    assert!(matches!(
        result,
        Err(AgentError::Config(ConfigError::MissingTemplate))
    ));
    assert_eq!(handle.snapshot().state, SchedulerState::Stopped);

    drop(handle);
    let last = task.await.unwrap();
    assert_eq!(last.sent, 0);
    assert!(transport.is_empty());
}
