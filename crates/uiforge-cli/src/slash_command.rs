use std::path::PathBuf;

use anyhow::bail;
use anyhow::Result;

pub const HELP_TEXT: &str = "Commands:
  /admin [on|off]   Switch between the generation service and the placeholder backend
  /versions         List generated versions
  /select N         Show version N
  /edit PATH        Replace the working code with the contents of a file
  /code             Print the working code
  /save PATH        Write the working code to a file
  /attach PATH      Attach an image to the conversation
  /fullscreen       Toggle the fullscreen preview
  /reset            Start a new session
  /help             Show this help
  /quit             Exit

Anything else is sent as a prompt.";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SlashCommand {
    /// `None` toggles the current mode.
    Admin(Option<bool>),
    Versions,
    Select(u64),
    Edit(PathBuf),
    Code,
    Save(PathBuf),
    Attach(PathBuf),
    Fullscreen,
    Reset,
    Help,
    Quit,
}

fn path_arg(name: &str, arg: &str) -> Result<PathBuf> {
    if arg.is_empty() {
        bail!("/{name} needs a file path");
    }
    return Ok(PathBuf::from(arg));
}

impl SlashCommand {
    /// Returns `None` for lines that are prompts rather than commands.
    pub fn parse(line: &str) -> Option<Result<SlashCommand>> {
        let line = line.trim();
        let rest = line.strip_prefix('/')?;

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let res = match name {
            "admin" => match arg {
                "" => Ok(SlashCommand::Admin(None)),
                "on" | "true" => Ok(SlashCommand::Admin(Some(true))),
                "off" | "false" => Ok(SlashCommand::Admin(Some(false))),
                other => Err(anyhow::anyhow!("/admin takes on or off, got '{other}'")),
            },
            "versions" => Ok(SlashCommand::Versions),
            "select" => match arg.parse::<u64>() {
                Ok(index) if index > 0 => Ok(SlashCommand::Select(index)),
                _ => Err(anyhow::anyhow!("/select needs a version number, like /select 2")),
            },
            "edit" => path_arg(name, arg).map(SlashCommand::Edit),
            "code" => Ok(SlashCommand::Code),
            "save" => path_arg(name, arg).map(SlashCommand::Save),
            "attach" => path_arg(name, arg).map(SlashCommand::Attach),
            "fullscreen" => Ok(SlashCommand::Fullscreen),
            "reset" | "new" => Ok(SlashCommand::Reset),
            "help" | "?" => Ok(SlashCommand::Help),
            "quit" | "exit" | "q" => Ok(SlashCommand::Quit),
            other => Err(anyhow::anyhow!("Unknown command /{other}, try /help")),
        };

        return Some(res);
    }
}
