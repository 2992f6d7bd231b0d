#[cfg(test)]
#[path = "session_controller_test.rs"]
mod tests;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::fs;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::code_transformer;
use super::PreviewStatus;
use super::PreviewSync;
use super::VersionStore;
use crate::configuration::SessionSettings;
use crate::domain::models::Author;
use crate::domain::models::BackendName;
use crate::domain::models::Command;
use crate::domain::models::Event;
use crate::domain::models::GenerationClient;
use crate::domain::models::GenerationClientBox;
use crate::domain::models::GenerationError;
use crate::domain::models::Message;
use crate::domain::models::MessageKind;
use crate::domain::models::PreviewTransportBox;
use crate::domain::models::SessionError;
use crate::domain::models::SessionState;
use crate::domain::models::EMPTY_PROMPT_TEXT;
use crate::domain::models::WORKING_TEXT;
use crate::infrastructure::clients::GenerationClientManager;
use crate::infrastructure::preview::PreviewTransportManager;

pub struct SessionProps {
    pub settings: SessionSettings,
    pub remote_client: GenerationClientBox,
    pub stub_client: GenerationClientBox,
    pub preview_transport: PreviewTransportBox,
}

impl SessionProps {
    pub fn from_settings(settings: SessionSettings) -> Result<SessionProps> {
        let remote_client = GenerationClientManager::get(BackendName::Remote, &settings)?;
        let stub_client = GenerationClientManager::get(BackendName::Stub, &settings)?;
        let preview_transport = PreviewTransportManager::get(&settings);

        return Ok(SessionProps {
            settings,
            remote_client,
            stub_client,
            preview_transport,
        });
    }
}

/// Cloneable command sender for hosts driving a spawned controller.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command)?;
        return Ok(());
    }

    pub fn submit_prompt(&self, text: &str) -> Result<()> {
        return self.send(Command::SubmitPrompt(text.to_string()));
    }

    pub fn select_version(&self, id: &str) -> Result<()> {
        return self.send(Command::SelectVersion(id.to_string()));
    }

    pub fn edit_code(&self, code: &str) -> Result<()> {
        return self.send(Command::EditCode(code.to_string()));
    }

    pub fn reset_session(&self) -> Result<()> {
        return self.send(Command::ResetSession);
    }

    pub fn set_admin_mode(&self, enabled: bool) -> Result<()> {
        return self.send(Command::SetAdminMode(enabled));
    }

    pub fn check_backend(&self) -> Result<()> {
        return self.send(Command::CheckBackend);
    }
}

/// Owns the session state. Every command and every completion from spawned
/// work goes through one of its handlers, one at a time, and each handler ends
/// by publishing a fresh snapshot.
pub struct SessionController {
    state: SessionState,
    versions: VersionStore,
    remote_client: Arc<dyn GenerationClient>,
    stub_client: Arc<dyn GenerationClient>,
    preview: PreviewSync,
    event_tx: mpsc::UnboundedSender<Event>,
    event_rx: mpsc::UnboundedReceiver<Event>,
    snapshots: watch::Sender<SessionState>,
    /// Generation attempt whose result is still expected. Bumped by every
    /// submit and by reset so late results can be recognised.
    attempt: u64,
    max_attachment_bytes: u64,
}

impl SessionController {
    /// Must be called inside a tokio runtime, the preview worker is spawned here.
    pub fn new(props: SessionProps) -> SessionController {
        let state = SessionState::initial(props.settings.admin_mode);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(state.clone());

        return SessionController {
            state,
            versions: VersionStore::new(),
            remote_client: Arc::from(props.remote_client),
            stub_client: Arc::from(props.stub_client),
            preview: PreviewSync::new(props.preview_transport, props.settings.preview_debounce),
            event_tx,
            event_rx,
            snapshots,
            attempt: 0,
            max_attachment_bytes: props.settings.max_attachment_bytes,
        };
    }

    /// Spawns the controller loop and returns the handle to feed it commands
    /// plus a receiver of state snapshots. The loop ends once every handle is
    /// dropped.
    pub fn spawn(
        props: SessionProps,
    ) -> (
        SessionHandle,
        watch::Receiver<SessionState>,
        JoinHandle<Result<()>>,
    ) {
        let controller = SessionController::new(props);
        let snapshots = controller.subscribe();
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(controller.run(rx));

        return (SessionHandle { tx }, snapshots, worker);
    }

    pub fn state(&self) -> &SessionState {
        return &self.state;
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        return self.snapshots.subscribe();
    }

    pub fn subscribe_preview(&self) -> watch::Receiver<PreviewStatus> {
        return self.preview.subscribe();
    }

    /// Number of preview pushes issued so far.
    pub fn preview_pushes(&self) -> u64 {
        return self.preview.last_pushed_seq();
    }

    fn client(&self) -> Arc<dyn GenerationClient> {
        match BackendName::for_admin_mode(self.state.is_admin_mode) {
            BackendName::Stub => self.stub_client.clone(),
            BackendName::Remote => self.remote_client.clone(),
        }
    }

    fn publish(&mut self) {
        self.state.versions = self.versions.shared();
        self.state.selected_version_id = self.versions.selected_id();
        self.snapshots.send_replace(self.state.clone());
    }

    fn add_message(&mut self, message: Message) {
        self.state.messages.push(message);
    }

    /// Checks the backend the next prompt would use, and posts a warning to
    /// the transcript when it can't be reached.
    pub async fn check_backend(&mut self) {
        let client = self.client();
        if let Err(err) = client.health_check().await {
            let name = client.name();
            self.add_message(Message::new_with_kind(
                Author::Ai,
                MessageKind::Error,
                &format!("Hey, it looks like the {name} generation backend isn't reachable. Prompts will fail until it's back, or you can switch to admin mode.\n\nError: {err}"),
            ));
            self.publish();
        }
    }

    pub fn submit_prompt(&mut self, text: &str) -> Result<u64, SessionError> {
        let prompt = text.trim();
        if prompt.is_empty() {
            self.add_message(Message::new(Author::Ai, EMPTY_PROMPT_TEXT));
            self.publish();
            return Err(SessionError::EmptyInput);
        }

        if self.state.is_generating {
            tracing::debug!(attempt = self.attempt, "generation already in flight, ignoring prompt");
            return Err(SessionError::GenerationInFlight);
        }

        self.add_message(Message::new(Author::User, text));
        self.state.is_generating = true;
        self.attempt += 1;
        self.add_message(Message::new_with_kind(
            Author::Ai,
            MessageKind::Working,
            WORKING_TEXT,
        ));

        let attempt = self.attempt;
        let client = self.client();
        let event_tx = self.event_tx.clone();
        let prompt = prompt.to_string();
        tracing::info!(attempt, backend = %client.name(), "starting generation");

        tokio::spawn(async move {
            let result = client.generate(&prompt).await;
            if event_tx
                .send(Event::GenerationFinished { attempt, result })
                .is_err()
            {
                tracing::debug!(attempt, "session closed before generation finished");
            }
        });

        self.publish();
        return Ok(attempt);
    }

    /// Applies a generation result. Returns false when the result belongs to
    /// an attempt that is no longer outstanding and was dropped.
    pub fn on_generation_result(
        &mut self,
        attempt: u64,
        result: Result<String, GenerationError>,
    ) -> bool {
        if !self.state.is_generating || attempt != self.attempt {
            tracing::debug!(attempt, current = self.attempt, "dropping stale generation result");
            return false;
        }

        match result {
            Ok(raw) => {
                let code = code_transformer::transform(&raw);
                let version = self.versions.append(&code);
                self.versions.select(&version.id);
                self.state.active_code = code;
                self.preview.push(&self.state.active_code);

                tracing::info!(attempt, version = version.sequence_index, "generation succeeded");
                self.add_message(Message::new_with_kind(
                    Author::Ai,
                    MessageKind::Success,
                    &format!(
                        "Version {} is ready. Edit the code, pick another version, or describe what to change next.",
                        version.sequence_index
                    ),
                ));
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "generation failed");
                self.add_message(Message::new_with_kind(
                    Author::Ai,
                    MessageKind::Error,
                    &format!("Sorry, the interface couldn't be generated: {}", err.cause()),
                ));
            }
        }

        self.state.is_generating = false;
        self.publish();
        return true;
    }

    pub fn select_version(&mut self, id: &str) -> Result<(), SessionError> {
        let code = match self.versions.select(id) {
            Some(version) => version.code.clone(),
            None => {
                tracing::debug!(id, "ignoring selection of unknown version");
                return Err(SessionError::UnknownVersion(id.to_string()));
            }
        };

        self.state.active_code = code;
        self.preview.push(&self.state.active_code);
        self.publish();
        return Ok(());
    }

    /// Replaces the working code without creating a version.
    pub fn edit_code(&mut self, code: &str) {
        self.state.active_code = code.to_string();
        self.preview.push(&self.state.active_code);
        self.publish();
    }

    pub fn reset_session(&mut self) {
        self.attempt += 1;
        self.versions.clear();

        let is_fullscreen = self.state.is_fullscreen;
        self.state = SessionState::initial(self.state.is_admin_mode);
        self.state.is_fullscreen = is_fullscreen;
        self.preview.push(&self.state.active_code);

        tracing::info!("session reset");
        self.publish();
    }

    pub fn set_admin_mode(&mut self, enabled: bool) {
        self.state.is_admin_mode = enabled;
        tracing::info!(backend = %BackendName::for_admin_mode(enabled), "admin mode changed");
        self.publish();
    }

    pub fn set_fullscreen(&mut self, enabled: bool) {
        self.state.is_fullscreen = enabled;
        self.publish();
    }

    /// Reads an image and posts it as a single user message. The file is
    /// closed when the read finishes, whatever the outcome.
    pub async fn attach_image(&mut self, path: &Path) -> Result<(), SessionError> {
        match read_attachment(path, self.max_attachment_bytes).await {
            Ok(encoded) => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.to_string_lossy().to_string());
                self.add_message(
                    Message::new(Author::User, &format!("Attached image {name}")).with_image(encoded),
                );
                self.publish();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to attach image");
                self.add_message(Message::new_with_kind(
                    Author::Ai,
                    MessageKind::Error,
                    &format!("The image couldn't be attached: {err}"),
                ));
                self.publish();
                Err(err)
            }
        }
    }

    pub async fn dispatch(&mut self, command: Command) {
        let res = match command {
            Command::SubmitPrompt(text) => self.submit_prompt(&text).map(|_| ()),
            Command::SelectVersion(id) => self.select_version(&id),
            Command::EditCode(code) => {
                self.edit_code(&code);
                Ok(())
            }
            Command::ResetSession => {
                self.reset_session();
                Ok(())
            }
            Command::SetAdminMode(enabled) => {
                self.set_admin_mode(enabled);
                Ok(())
            }
            Command::SetFullscreen(enabled) => {
                self.set_fullscreen(enabled);
                Ok(())
            }
            Command::AttachImage(path) => self.attach_image(&path).await,
            Command::CheckBackend => {
                self.check_backend().await;
                Ok(())
            }
        };

        if let Err(err) = res {
            tracing::debug!(error = %err, "command rejected");
        }
    }

    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::GenerationFinished { attempt, result } => {
                return self.on_generation_result(attempt, result);
            }
        }
    }

    /// Waits for the next completion from spawned work and applies it.
    pub async fn process_next_event(&mut self) -> Option<bool> {
        let event = self.event_rx.recv().await?;
        return Some(self.handle_event(event));
    }

    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) -> Result<()> {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.dispatch(command).await,
                    None => {
                        tracing::info!("all session handles dropped, stopping");
                        break;
                    }
                },
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
            }
        }

        return Ok(());
    }
}

async fn read_attachment(path: &Path, limit: u64) -> Result<String, SessionError> {
    let file = fs::File::open(path)
        .await
        .map_err(|err| SessionError::Attachment(err.to_string()))?;

    let size = file
        .metadata()
        .await
        .map_err(|err| SessionError::Attachment(err.to_string()))?
        .len();
    if size > limit {
        return Err(SessionError::AttachmentTooLarge { size, limit });
    }

    let bytes = read_bounded(file, limit).await?;
    return Ok(BASE64.encode(bytes));
}

/// Reads at most `limit` bytes. The file may have grown since its size was
/// checked, so one extra byte is requested to detect that.
async fn read_bounded<R: AsyncRead + Unpin>(reader: R, limit: u64) -> Result<Vec<u8>, SessionError> {
    let mut bytes = vec![];
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .await
        .map_err(|err| SessionError::Attachment(err.to_string()))?;

    let size = bytes.len() as u64;
    if size > limit {
        return Err(SessionError::AttachmentTooLarge { size, limit });
    }

    return Ok(bytes);
}
