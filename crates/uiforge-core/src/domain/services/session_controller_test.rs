use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time;

use super::*;
use crate::domain::models::PreviewSyncError;
use crate::domain::models::PreviewTransport;
use crate::domain::models::GREETING_TEXT;
use crate::infrastructure::clients::stub::StubGenerationClient;
use crate::infrastructure::clients::stub::PLACEHOLDER_CODE;

struct ScriptedClient {
    prompts: Arc<Mutex<Vec<String>>>,
    results: Mutex<VecDeque<Result<String, GenerationError>>>,
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    fn name(&self) -> BackendName {
        BackendName::Remote
    }

    async fn health_check(&self) -> Result<()> {
        anyhow::bail!("connection refused")
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.results.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(format!("const App = () => <div>{prompt}</div>;")))
    }
}

struct RecordingTransport {
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl PreviewTransport for RecordingTransport {
    async fn sync(&self, code: &str) -> Result<(), PreviewSyncError> {
        self.calls.lock().unwrap().push(code.to_string());
        Ok(())
    }
}

struct Harness {
    controller: SessionController,
    prompts: Arc<Mutex<Vec<String>>>,
    previews: Arc<Mutex<Vec<String>>>,
}

fn settings() -> SessionSettings {
    SessionSettings {
        preview_debounce: Duration::from_millis(5),
        stub_latency: Duration::from_millis(10),
        max_attachment_bytes: 16,
        ..SessionSettings::default()
    }
}

fn scripted_props(
    results: Vec<Result<String, GenerationError>>,
) -> (SessionProps, Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<String>>>) {
    let prompts = Arc::new(Mutex::new(vec![]));
    let previews = Arc::new(Mutex::new(vec![]));
    let settings = settings();

    let props = SessionProps {
        remote_client: Box::new(ScriptedClient {
            prompts: prompts.clone(),
            results: Mutex::new(VecDeque::from(results)),
        }),
        stub_client: Box::new(StubGenerationClient::new(settings.stub_latency)),
        preview_transport: Box::new(RecordingTransport {
            calls: previews.clone(),
        }),
        settings,
    };

    (props, prompts, previews)
}

fn harness(results: Vec<Result<String, GenerationError>>) -> Harness {
    let (props, prompts, previews) = scripted_props(results);

    Harness {
        controller: SessionController::new(props),
        prompts,
        previews,
    }
}

async fn generate(controller: &mut SessionController, prompt: &str) {
    controller.submit_prompt(prompt).unwrap();
    assert_eq!(controller.process_next_event().await, Some(true));
}

async fn wait_for_preview(controller: &SessionController, seq: u64) {
    let mut status = controller.subscribe_preview();
    time::timeout(
        Duration::from_secs(5),
        status.wait_for(|s| s.applied_seq == seq),
    )
    .await
    .expect("preview never caught up")
    .unwrap();
}

fn kinds(state: &SessionState) -> Vec<MessageKind> {
    state.messages.iter().map(|m| m.kind()).collect()
}

#[tokio::test]
async fn it_starts_with_a_greeting() {
    let h = harness(vec![]);
    let state = h.controller.state();

    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].text, GREETING_TEXT);
    assert_eq!(state.messages[0].author, Author::Ai);
    assert!(state.versions.is_empty());
    assert!(state.selected_version_id.is_none());
    assert!(!state.is_generating);
}

#[tokio::test]
async fn it_rejects_empty_prompts_without_calling_the_backend() {
    let mut h = harness(vec![]);

    assert_eq!(
        h.controller.submit_prompt("  \n\t "),
        Err(SessionError::EmptyInput)
    );

    let state = h.controller.state();
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[1].text, EMPTY_PROMPT_TEXT);
    assert_eq!(state.messages[1].author, Author::Ai);
    assert!(!state.is_generating);
    assert!(h.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn it_generates_a_first_version_in_admin_mode() {
    let mut h = harness(vec![]);
    h.controller.set_admin_mode(true);

    generate(&mut h.controller, "make a login form").await;

    let state = h.controller.state();
    assert_eq!(state.versions.len(), 1);
    assert_eq!(state.versions[0].sequence_index, 1);
    assert_eq!(state.selected_version_id, Some(state.versions[0].id.clone()));
    assert_eq!(state.active_code, code_transformer::transform(PLACEHOLDER_CODE));
    assert!(!state.active_code.contains("from '@nlmk/ds-2.0'"));
    assert_eq!(
        kinds(state),
        vec![
            MessageKind::Normal,
            MessageKind::Normal,
            MessageKind::Working,
            MessageKind::Success
        ]
    );
    assert_eq!(state.messages[1].text, "make a login form");
    assert!(!state.is_generating);
    assert!(h.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn it_returns_the_same_placeholder_for_any_prompt_in_admin_mode() {
    let mut h = harness(vec![]);
    h.controller.set_admin_mode(true);

    generate(&mut h.controller, "make a login form").await;
    generate(&mut h.controller, "a dashboard with three charts").await;

    let state = h.controller.state();
    assert_eq!(state.versions[0].code, state.versions[1].code);
}

#[tokio::test]
async fn it_allows_one_generation_at_a_time() {
    let mut h = harness(vec![]);

    h.controller.submit_prompt("first").unwrap();
    let messages = h.controller.state().messages.len();

    assert_eq!(
        h.controller.submit_prompt("second"),
        Err(SessionError::GenerationInFlight)
    );
    assert_eq!(h.controller.state().messages.len(), messages);

    assert_eq!(h.controller.process_next_event().await, Some(true));
    assert_eq!(*h.prompts.lock().unwrap(), vec!["first".to_string()]);
}

#[tokio::test]
async fn it_reports_failures_without_creating_versions() {
    let mut h = harness(vec![Err(GenerationError::Backend(
        "An error occurred during generation: boom".to_string(),
    ))]);

    generate(&mut h.controller, "make a login form").await;

    let state = h.controller.state();
    assert!(state.versions.is_empty());
    assert!(!state.is_generating);
    assert_eq!(
        kinds(state),
        vec![
            MessageKind::Normal,
            MessageKind::Normal,
            MessageKind::Working,
            MessageKind::Error
        ]
    );
    assert!(state
        .last_message()
        .unwrap()
        .text
        .contains("An error occurred during generation: boom"));
    assert_eq!(h.controller.preview_pushes(), 0);
}

#[tokio::test]
async fn it_numbers_versions_without_gaps() {
    let mut h = harness(vec![
        Ok("one".to_string()),
        Err(GenerationError::Transport("timed out".to_string())),
        Ok("two".to_string()),
        Ok("three".to_string()),
        Ok("four".to_string()),
    ]);

    for prompt in ["a", "b", "c", "d"] {
        generate(&mut h.controller, prompt).await;
    }
    let first = h.controller.state().versions[0].id.clone();
    h.controller.select_version(&first).unwrap();
    generate(&mut h.controller, "e").await;

    let state = h.controller.state();
    let indices: Vec<u64> = state.versions.iter().map(|v| v.sequence_index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4]);
    assert_eq!(state.selected_version().unwrap().code, "four");
}

#[tokio::test]
async fn it_selects_versions_and_pushes_their_code_once() {
    let mut h = harness(vec![Ok("first".to_string()), Ok("second".to_string())]);
    generate(&mut h.controller, "a").await;
    generate(&mut h.controller, "b").await;
    wait_for_preview(&h.controller, 2).await;

    let first = h.controller.state().versions[0].clone();
    let pushes = h.controller.preview_pushes();
    h.controller.select_version(&first.id).unwrap();

    assert_eq!(h.controller.preview_pushes(), pushes + 1);
    assert_eq!(h.controller.state().active_code, "first");
    assert_eq!(h.controller.state().selected_version_id, Some(first.id));

    wait_for_preview(&h.controller, pushes + 1).await;
    assert_eq!(h.previews.lock().unwrap().last().unwrap(), "first");
}

#[tokio::test]
async fn it_ignores_unknown_versions() {
    let mut h = harness(vec![]);
    generate(&mut h.controller, "a").await;

    let before = h.controller.state().clone();
    let pushes = h.controller.preview_pushes();

    assert_eq!(
        h.controller.select_version("nope"),
        Err(SessionError::UnknownVersion("nope".to_string()))
    );
    assert_eq!(*h.controller.state(), before);
    assert_eq!(h.controller.preview_pushes(), pushes);
}

#[tokio::test]
async fn it_keeps_the_last_edit() {
    let mut h = harness(vec![]);

    h.controller.edit_code("A");
    h.controller.edit_code("B");

    assert_eq!(h.controller.state().active_code, "B");
    assert!(h.controller.state().versions.is_empty());
    assert!(h.controller.state().has_unsaved_edit());

    wait_for_preview(&h.controller, 2).await;
    let previews = h.previews.lock().unwrap().clone();
    assert_eq!(previews.last().unwrap(), "B");
    let last_b = previews.iter().rposition(|code| code == "B").unwrap();
    assert!(!previews[last_b..].contains(&"A".to_string()));
}

#[tokio::test]
async fn it_does_not_fold_edits_into_history() {
    let mut h = harness(vec![Ok("generated".to_string())]);
    generate(&mut h.controller, "a").await;

    h.controller.edit_code("edited");

    let state = h.controller.state();
    assert_eq!(state.versions[0].code, "generated");
    assert_eq!(state.active_code, "edited");
    assert_eq!(state.selected_version().unwrap().code, "generated");
}

#[tokio::test]
async fn it_resets_to_the_greeting() {
    let mut h = harness(vec![]);
    h.controller.set_admin_mode(true);
    h.controller.set_fullscreen(true);
    generate(&mut h.controller, "a").await;
    generate(&mut h.controller, "b").await;

    h.controller.reset_session();

    let state = h.controller.state();
    assert!(state.versions.is_empty());
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].text, GREETING_TEXT);
    assert!(state.selected_version_id.is_none());
    assert!(state.active_code.is_empty());
    assert!(state.is_admin_mode);
    assert!(state.is_fullscreen);

    generate(&mut h.controller, "c").await;
    assert_eq!(h.controller.state().versions[0].sequence_index, 1);
}

#[tokio::test]
async fn it_drops_results_that_arrive_after_a_reset() {
    let mut h = harness(vec![Ok("stale".to_string())]);

    h.controller.submit_prompt("a").unwrap();
    h.controller.reset_session();

    assert_eq!(h.controller.process_next_event().await, Some(false));
    let state = h.controller.state();
    assert!(state.versions.is_empty());
    assert_eq!(state.messages.len(), 1);
    assert!(!state.is_generating);
}

#[tokio::test]
async fn it_drops_results_for_superseded_attempts() {
    let mut h = harness(vec![]);
    let attempt = h.controller.submit_prompt("a").unwrap();

    assert!(!h
        .controller
        .on_generation_result(attempt + 1, Ok("someone else".to_string())));
    assert!(h.controller.state().is_generating);

    assert_eq!(h.controller.process_next_event().await, Some(true));
    assert_eq!(h.controller.state().versions.len(), 1);
}

#[tokio::test]
async fn it_publishes_snapshots() {
    let mut h = harness(vec![]);
    let mut snapshots = h.controller.subscribe();

    h.controller.submit_prompt("a").unwrap();
    assert!(snapshots.borrow_and_update().is_generating);

    h.controller.process_next_event().await;
    let snapshot = snapshots.borrow_and_update().clone();
    assert!(!snapshot.is_generating);
    assert_eq!(snapshot.versions.len(), 1);
    assert_eq!(snapshot, *h.controller.state());
}

#[tokio::test]
async fn it_shares_the_history_between_snapshots() {
    let mut h = harness(vec![]);
    generate(&mut h.controller, "a").await;
    let before = h.controller.subscribe().borrow().clone();

    h.controller.edit_code("tweaked");
    h.controller.set_fullscreen(true);
    let after = h.controller.subscribe().borrow().clone();

    assert!(Arc::ptr_eq(&before.versions, &after.versions));
    assert_eq!(after.active_code, "tweaked");

    generate(&mut h.controller, "b").await;
    assert_eq!(before.versions.len(), 1);
    assert_eq!(h.controller.state().versions.len(), 2);
}

#[tokio::test]
async fn it_warns_when_the_backend_is_unreachable() {
    let mut h = harness(vec![]);

    h.controller.check_backend().await;

    let last = h.controller.state().last_message().unwrap().clone();
    assert_eq!(last.kind(), MessageKind::Error);
    assert!(last.text.contains("connection refused"));
}

#[tokio::test]
async fn it_attaches_images() -> Result<()> {
    let mut h = harness(vec![]);
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(b"png bytes")?;

    h.controller.attach_image(file.path()).await?;

    let last = h.controller.state().last_message().unwrap().clone();
    assert_eq!(last.author, Author::User);
    assert_eq!(last.image, Some(BASE64.encode(b"png bytes")));

    Ok(())
}

#[tokio::test]
async fn it_rejects_unusable_attachments() -> Result<()> {
    let mut h = harness(vec![]);
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(&[0u8; 64])?;

    let res = h.controller.attach_image(file.path()).await;
    assert_eq!(
        res,
        Err(SessionError::AttachmentTooLarge {
            size: 64,
            limit: 16
        })
    );

    let res = h
        .controller
        .attach_image(Path::new("/definitely/not/here.png"))
        .await;
    assert!(matches!(res, Err(SessionError::Attachment(_))));

    let state = h.controller.state();
    assert_eq!(state.messages.len(), 3);
    assert!(state.messages.iter().all(|m| m.image.is_none()));

    Ok(())
}

#[tokio::test]
async fn it_stops_reading_attachments_at_the_limit() {
    let growing: &[u8] = &[7u8; 40];
    assert_eq!(
        read_bounded(growing, 16).await,
        Err(SessionError::AttachmentTooLarge {
            size: 17,
            limit: 16
        })
    );

    let exact: &[u8] = &[7u8; 16];
    assert_eq!(read_bounded(exact, 16).await, Ok(vec![7u8; 16]));
}

#[tokio::test]
async fn it_runs_commands_from_handles() -> Result<()> {
    let h = harness(vec![]);
    let mut snapshots = h.controller.subscribe();
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = SessionHandle { tx };
    let worker = tokio::spawn(h.controller.run(rx));

    handle.set_admin_mode(true)?;
    handle.submit_prompt("make a login form")?;

    let state = time::timeout(
        Duration::from_secs(5),
        snapshots.wait_for(|s| s.versions.len() == 1),
    )
    .await?
    .unwrap()
    .clone();
    assert_eq!(state.versions[0].sequence_index, 1);

    handle.edit_code("tweaked")?;
    handle.reset_session()?;
    time::timeout(
        Duration::from_secs(5),
        snapshots.wait_for(|s| s.versions.is_empty() && s.messages.len() == 1),
    )
    .await?
    .unwrap();

    drop(handle);
    worker.await??;

    Ok(())
}

#[tokio::test]
async fn it_checks_the_backend_of_a_spawned_session() -> Result<()> {
    let (props, prompts, _) = scripted_props(vec![]);
    let (handle, mut snapshots, worker) = SessionController::spawn(props);

    handle.check_backend()?;
    let state = time::timeout(
        Duration::from_secs(5),
        snapshots.wait_for(|s| s.messages.len() == 2),
    )
    .await?
    .unwrap()
    .clone();

    assert_eq!(state.messages[0].text, GREETING_TEXT);
    assert_eq!(state.messages[1].kind(), MessageKind::Error);
    assert!(state.messages[1].text.contains("connection refused"));
    assert!(prompts.lock().unwrap().is_empty());

    drop(handle);
    worker.await??;

    Ok(())
}
