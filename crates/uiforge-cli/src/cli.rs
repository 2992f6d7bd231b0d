use clap::builder::PossibleValuesParser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use uiforge_core::Config;
use uiforge_core::ConfigKey;

fn env_name(key: ConfigKey) -> String {
    return format!("UIFORGE_{}", key.to_string().to_uppercase().replace('-', "_"));
}

fn arg_for(key: ConfigKey, help: &str) -> Arg {
    let default = Config::default(key);
    let help = if default.is_empty() {
        help.to_string()
    } else {
        format!("{help} [default: {default}]")
    };

    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env_name(key))
        .num_args(1)
        .help(help)
        .action(ArgAction::Set);
}

fn arg_with_values(key: ConfigKey, help: &str, values: &[&'static str]) -> Arg {
    return arg_for(key, help).value_parser(PossibleValuesParser::new(values.to_vec()));
}

fn config_args() -> Vec<Arg> {
    return vec![
        arg_for(ConfigKey::ConfigFile, "Path to the configuration file"),
        arg_with_values(
            ConfigKey::AdminMode,
            "Start with admin mode enabled. Prompts are answered by the local placeholder backend.",
            &["true", "false"],
        ),
        arg_for(ConfigKey::GenerateUrl, "Base URL of the generation service"),
        arg_for(
            ConfigKey::PreviewUrl,
            "Base URL of the preview renderer. Leave empty to disable preview sync.",
        ),
        arg_for(
            ConfigKey::PreviewDebounceMs,
            "Quiet period in milliseconds before a code change is pushed to the preview",
        ),
        arg_for(
            ConfigKey::StubLatencyMs,
            "Simulated latency in milliseconds of the admin mode backend",
        ),
        arg_for(
            ConfigKey::RequestTimeoutMs,
            "Timeout in milliseconds for generation and preview requests",
        ),
        arg_for(
            ConfigKey::ErrorPrefix,
            "Result prefixes the generation service uses to report failures, separated by '|'",
        ),
        arg_for(
            ConfigKey::MaxAttachmentBytes,
            "Largest image in bytes that can be attached to the conversation",
        ),
        arg_with_values(
            ConfigKey::LogLevel,
            "Log level written to the log file",
            &["error", "warn", "info", "debug", "trace"],
        ),
        arg_for(ConfigKey::LogFile, "Path to the log file"),
    ];
}

pub fn build() -> Command {
    return Command::new("uiforge")
        .about("Describe an interface in plain language and iterate on the generated code.")
        .version(env!("CARGO_PKG_VERSION"))
        .args(config_args())
        .subcommand(
            Command::new("config")
                .about("Configuration file options")
                .subcommand_required(true)
                .subcommand(
                    Command::new("default")
                        .about("Prints the default configuration, ready to save as config.toml"),
                )
                .subcommand(Command::new("path").about("Prints the configuration file path")),
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_exposes_every_setting_as_a_flag() {
        let cmd = build();
        cmd.clone().debug_assert();

        let matches = cmd
            .try_get_matches_from(vec![
                "uiforge",
                "--admin-mode",
                "true",
                "--generate-url",
                "http://gen.local:5000",
                "--preview-debounce-ms",
                "50",
            ])
            .unwrap();

        assert_eq!(
            matches.get_one::<String>("admin-mode").map(String::as_str),
            Some("true")
        );
        assert_eq!(
            matches.get_one::<String>("generate-url").map(String::as_str),
            Some("http://gen.local:5000")
        );
        assert_eq!(
            matches
                .get_one::<String>("preview-debounce-ms")
                .map(String::as_str),
            Some("50")
        );
    }

    #[test]
    fn it_rejects_unknown_log_levels() {
        let res = build().try_get_matches_from(vec!["uiforge", "--log-level", "loud"]);
        assert!(res.is_err());
    }

    #[test]
    fn it_documents_defaults_in_the_serialized_config() {
        let toml = Config::serialize_default(build());
        assert!(toml.contains("generate-url = \"http://localhost:5000\""));
        assert!(toml.contains("preview-debounce-ms = 300"));
        assert!(toml.contains("[possible values: true, false]"));
        assert!(!toml.contains("config-file"));
    }
}
