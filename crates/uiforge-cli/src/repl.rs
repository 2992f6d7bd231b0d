use std::path::Path;

use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::watch;
use uiforge_core::Author;
use uiforge_core::Command;
use uiforge_core::Message;
use uiforge_core::MessageKind;
use uiforge_core::SessionController;
use uiforge_core::SessionHandle;
use uiforge_core::SessionProps;
use uiforge_core::SessionSettings;
use uiforge_core::SessionState;

use crate::slash_command::SlashCommand;
use crate::slash_command::HELP_TEXT;

fn format_message(message: &Message) -> String {
    let author = match message.author {
        Author::User => "you",
        Author::Ai => "uiforge",
    };
    let marker = match message.kind {
        MessageKind::Normal => "",
        MessageKind::Working => "… ",
        MessageKind::Success => "✓ ",
        MessageKind::Error => "✗ ",
    };
    let attachment = if message.has_image() { " [image]" } else { "" };

    let text = message.text.replace('\t', "  ");

    return format!("{author}> {marker}{text}{attachment}");
}

/// Turns published snapshots into transcript lines, printing each message
/// once. A reset shows up as a transcript whose first message changed.
#[derive(Default)]
pub struct Transcript {
    first_id: Option<String>,
    printed: usize,
    admin_mode: Option<bool>,
}

impl Transcript {
    pub fn render(&mut self, state: &SessionState) -> Vec<String> {
        let mut lines = vec![];

        let first_id = state.messages.first().map(|message| message.id.clone());
        if self.first_id.is_some() && first_id != self.first_id {
            lines.push("--- new session ---".to_string());
            self.printed = 0;
        }
        self.first_id = first_id;

        if self.admin_mode.is_some() && self.admin_mode != Some(state.is_admin_mode) {
            let mode = if state.is_admin_mode {
                "admin mode on, prompts use the placeholder backend"
            } else {
                "admin mode off, prompts use the generation service"
            };
            lines.push(format!("({mode})"));
        }
        self.admin_mode = Some(state.is_admin_mode);

        for message in state.messages.iter().skip(self.printed) {
            lines.push(format_message(message));
        }
        self.printed = state.messages.len();

        return lines;
    }
}

fn version_lines(state: &SessionState) -> Vec<String> {
    if state.versions.is_empty() {
        return vec!["No versions yet.".to_string()];
    }

    return state
        .versions
        .iter()
        .map(|version| {
            let selected = state.selected_version_id.as_deref() == Some(version.id.as_str());
            let marker = if selected { "*" } else { " " };
            let lines = version.code.lines().count();
            format!("{marker} {} ({lines} lines)", version.label())
        })
        .collect();
}

async fn read_code(path: &Path) -> Result<String> {
    return Ok(fs::read_to_string(path).await?);
}

/// Runs one input line. Returns false when the user asked to quit.
async fn handle_line(
    line: &str,
    handle: &SessionHandle,
    snapshots: &watch::Receiver<SessionState>,
) -> Result<bool> {
    let command = match SlashCommand::parse(line) {
        None => {
            handle.submit_prompt(line)?;
            return Ok(true);
        }
        Some(Err(err)) => {
            println!("{err}");
            return Ok(true);
        }
        Some(Ok(command)) => command,
    };

    let state = snapshots.borrow().clone();
    match command {
        SlashCommand::Admin(enabled) => {
            handle.set_admin_mode(enabled.unwrap_or(!state.is_admin_mode))?;
        }
        SlashCommand::Versions => {
            for line in version_lines(&state) {
                println!("{line}");
            }
            if state.has_unsaved_edit() {
                println!("The working code has edits that aren't saved as a version.");
            }
        }
        SlashCommand::Select(index) => {
            match state
                .versions
                .iter()
                .find(|version| version.sequence_index == index)
            {
                Some(version) => handle.select_version(&version.id)?,
                None => println!("There is no version {index}."),
            }
        }
        SlashCommand::Edit(path) => match read_code(&path).await {
            Ok(code) => handle.edit_code(&code)?,
            Err(err) => println!("Couldn't read {}: {err}", path.display()),
        },
        SlashCommand::Code => {
            if state.active_code.is_empty() {
                println!("No code yet.");
            } else {
                println!("{}", state.active_code);
            }
        }
        SlashCommand::Save(path) => match fs::write(&path, &state.active_code).await {
            Ok(()) => println!("Saved to {}", path.display()),
            Err(err) => println!("Couldn't write {}: {err}", path.display()),
        },
        SlashCommand::Attach(path) => handle.send(Command::AttachImage(path))?,
        SlashCommand::Fullscreen => {
            handle.send(Command::SetFullscreen(!state.is_fullscreen))?;
            let mode = if state.is_fullscreen { "off" } else { "on" };
            println!("(fullscreen preview {mode})");
        }
        SlashCommand::Reset => handle.reset_session()?,
        SlashCommand::Help => println!("{HELP_TEXT}"),
        SlashCommand::Quit => return Ok(false),
    }

    return Ok(true);
}

pub async fn start(settings: SessionSettings) -> Result<()> {
    let props = SessionProps::from_settings(settings)?;
    let (handle, mut snapshots, worker) = SessionController::spawn(props);
    handle.check_backend()?;

    let mut transcript = Transcript::default();
    for line in transcript.render(&snapshots.borrow_and_update()) {
        println!("{line}");
    }
    println!("Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = snapshots.borrow_and_update().clone();
                for line in transcript.render(&state) {
                    println!("{line}");
                }
            }
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };
                if !handle_line(&line, &handle, &snapshots).await? {
                    break;
                }
            }
        }
    }

    drop(handle);
    worker.await??;
    tracing::info!("session closed");

    return Ok(());
}
