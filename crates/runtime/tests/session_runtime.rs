//! End-to-end tests driving the session worker through [`RuntimeHandle`].

use std::time::Duration;

use game_content::ConfigLoader;
use game_core::NodeId;
use runtime::{
    Cipher, Event, FileEventLog, FileSaveStore, InMemoryEventLog, InMemorySaveStore,
    OutputEvent, Runtime, RuntimeConfig, RuntimeError, SaveStore, SessionEvent, Topic,
};
use tempfile::TempDir;
use tokio::sync::broadcast::Receiver;

fn config() -> RuntimeConfig {
    RuntimeConfig {
        char_delay: Duration::ZERO,
        seed: Some(11),
        ..RuntimeConfig::default()
    }
}

fn in_memory_runtime(saves: InMemorySaveStore, log: InMemoryEventLog) -> Runtime {
    Runtime::builder()
        .config(config())
        .game_config(ConfigLoader::bundled().unwrap())
        .save_store(saves)
        .event_log(log)
        .build()
        .unwrap()
}

fn drain(rx: &mut Receiver<Event>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Output(output) = event
            && let Some(text) = output.text()
        {
            lines.push(text.to_owned());
        }
    }
    lines
}

fn has(lines: &[String], needle: &str) -> bool {
    lines.iter().any(|l| l.contains(needle))
}

#[tokio::test]
async fn registration_flow_over_the_handle() {
    let saves = InMemorySaveStore::new();
    let runtime = in_memory_runtime(saves.clone(), InMemoryEventLog::new());
    let handle = runtime.handle();
    let mut output = handle.subscribe(Topic::Output);

    handle.boot().await.unwrap();
    assert!(has(&drain(&mut output), "[SETUP] No valid save found."));

    let outcome = handle.submit("Ada").await.unwrap();
    assert!(!outcome.quit);
    let lines = drain(&mut output);
    assert!(has(&lines, "Welcome, Ada."));
    assert!(has(&lines, "=== N1: Chromatic Dawn ==="));

    let state = handle.query_state().await.unwrap();
    assert_eq!(state.player_name.as_deref(), Some("Ada"));
    assert!(saves.snapshot().unwrap().is_some());

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn status_bar_follows_every_submission() {
    let runtime = in_memory_runtime(InMemorySaveStore::new(), InMemoryEventLog::new());
    let handle = runtime.handle();
    let mut output = handle.subscribe(Topic::Output);

    handle.boot().await.unwrap();
    handle.submit("Ada").await.unwrap();
    handle.submit("score").await.unwrap();

    let mut last_status = None;
    while let Ok(event) = output.try_recv() {
        if let Event::Output(OutputEvent::Status(status)) = event {
            last_status = Some(status);
        }
    }
    assert_eq!(last_status.as_deref(), Some("Ada | Node N1 (06:05) | Score 0"));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn progress_topic_carries_audit_events() {
    let log = InMemoryEventLog::new();
    let runtime = in_memory_runtime(InMemorySaveStore::new(), log.clone());
    let handle = runtime.handle();
    let mut progress = handle.subscribe(Topic::Progress);

    handle.boot().await.unwrap();
    handle.submit("Ada").await.unwrap();
    handle.submit("solve colors 180").await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(Event::Progress(event)) = progress.try_recv() {
        kinds.push(event.kind());
    }
    assert!(kinds.contains(&"solve"));
    assert!(kinds.contains(&"unlock"));
    assert!(log.kinds().iter().any(|k| k == "solve"));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn scheduled_wake_fires_on_the_worker_clock() {
    let runtime = in_memory_runtime(InMemorySaveStore::new(), InMemoryEventLog::new());
    let handle = runtime.handle();
    let mut output = handle.subscribe(Topic::Output);

    handle.boot().await.unwrap();
    handle.submit("Ada").await.unwrap();
    handle.submit("sleep 0.05").await.unwrap();

    let woke = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match output.recv().await {
                Ok(Event::Output(OutputEvent::Line(line))) if line == "[OK] awake" => break true,
                Ok(_) => continue,
                Err(_) => break false,
            }
        }
    })
    .await
    .unwrap();
    assert!(woke);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn quit_stops_the_worker_after_saving() {
    let saves = InMemorySaveStore::new();
    let runtime = in_memory_runtime(saves.clone(), InMemoryEventLog::new());
    let handle = runtime.handle();
    let mut output = handle.subscribe(Topic::Output);

    handle.boot().await.unwrap();
    handle.submit("Ada").await.unwrap();
    handle.submit("set mood calm").await.unwrap();
    let outcome = handle.submit("quit").await.unwrap();
    assert!(outcome.quit);

    let mut ended = false;
    while let Ok(event) = output.try_recv() {
        ended |= matches!(event, Event::Session(SessionEvent::Ended));
    }
    assert!(ended);

    runtime.join().await.unwrap();
    assert!(matches!(
        handle.submit("status").await,
        Err(RuntimeError::CommandChannelClosed)
    ));

    let saved = saves.snapshot().unwrap().unwrap();
    assert_eq!(saved.vars.get("mood").map(String::as_str), Some("calm"));
}

#[tokio::test]
async fn shutdown_after_quit_is_harmless() {
    let runtime = in_memory_runtime(InMemorySaveStore::new(), InMemoryEventLog::new());
    let handle = runtime.handle();
    handle.boot().await.unwrap();
    handle.submit("quit").await.unwrap();

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn progress_survives_a_restart_on_disk() {
    let dir = TempDir::new().unwrap();
    let saves = || FileSaveStore::new(dir.path(), Cipher::with_rounds(64), Some("pw".into()));
    let log = || FileEventLog::new(dir.path(), Cipher::with_rounds(64), Some("pw".into()));
    let build = || {
        Runtime::builder()
            .config(RuntimeConfig {
                save_dir: dir.path().to_path_buf(),
                ..config()
            })
            .game_config(ConfigLoader::bundled().unwrap())
            .save_store(saves())
            .event_log(log())
            .build()
            .unwrap()
    };

    let runtime = build();
    let handle = runtime.handle();
    handle.boot().await.unwrap();
    handle.submit("Ada").await.unwrap();
    handle.submit("godskip dawn-skip").await.unwrap();
    runtime.shutdown().await.unwrap();

    let saved = saves().read().unwrap().unwrap();
    assert_eq!(saved.current_node, NodeId::from("N2"));
    assert!(saves().load().is_some());

    let records = FileEventLog::read_records(log().path()).unwrap();
    assert!(records.iter().any(|r| r.kind == "unlock"));
    let first = FileEventLog::decrypt_payload(&Cipher::with_rounds(64), &records[0], "pw").unwrap();
    assert_eq!(first["kind"], records[0].kind.as_str());

    let runtime = build();
    let handle = runtime.handle();
    let mut output = handle.subscribe(Topic::Output);
    handle.boot().await.unwrap();
    let lines = drain(&mut output);
    assert!(has(&lines, "[SAVE] Loaded. Welcome back, Ada."));
    assert!(has(&lines, "=== N2: Forked Timeline ==="));
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn wrong_key_starts_fresh() {
    let dir = TempDir::new().unwrap();
    let store = |key: &str| FileSaveStore::new(dir.path(), Cipher::with_rounds(64), Some(key.into()));

    let runtime = Runtime::builder()
        .config(config())
        .game_config(ConfigLoader::bundled().unwrap())
        .save_store(store("right"))
        .event_log(InMemoryEventLog::new())
        .build()
        .unwrap();
    let handle = runtime.handle();
    handle.boot().await.unwrap();
    handle.submit("Ada").await.unwrap();
    runtime.shutdown().await.unwrap();

    let runtime = Runtime::builder()
        .config(config())
        .game_config(ConfigLoader::bundled().unwrap())
        .save_store(store("wrong"))
        .event_log(InMemoryEventLog::new())
        .build()
        .unwrap();
    let handle = runtime.handle();
    let mut output = handle.subscribe(Topic::Output);
    handle.boot().await.unwrap();
    assert!(has(&drain(&mut output), "[SETUP] No valid save found."));
    runtime.shutdown().await.unwrap();
}
