#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Credential;
use crate::domain::models::Language;
use crate::domain::services::actions::help_text;
use crate::domain::services::Themes;
use crate::infrastructure::credentials::CredentialStore;

pub struct GenerateArgs {
    pub prompt: String,
    pub output: Option<path::PathBuf>,
}

/// What to run once the command line has been handled.
pub enum Launch {
    Chat,
    Generate(GenerateArgs),
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_chat() -> Command {
    return Command::new("chat").about("Start an interactive code generation chat. This is the default.");
}

fn subcommand_generate() -> Command {
    return Command::new("generate")
        .about("Generate code for a single prompt and print it to stdout.")
        .arg(
            Arg::new("prompt")
                .help("Description of the code to generate.")
                .num_args(1..)
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Write the generated code to this file instead of stdout.")
                .num_args(1)
                .value_parser(value_parser!(path::PathBuf)),
        );
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_credential() -> Command {
    return Command::new("credential")
        .about("Manage the stored OpenAI API token.")
        .subcommand(
            Command::new("set")
                .about("Saves an OpenAI API token for future sessions.")
                .arg(
                    Arg::new("token")
                        .help("OpenAI API token")
                        .num_args(1)
                        .required(true),
                ),
        )
        .subcommand(Command::new("clear").about("Deletes the stored token."))
        .subcommand(Command::new("path").about("Returns the path of the stored token."));
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("CODE BLOCKS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("codeai")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_generate())
        .subcommand(subcommand_credential())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("CODEAI_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::Language.to_string())
                .short('l')
                .long(ConfigKey::Language.to_string())
                .env("CODEAI_LANGUAGE")
                .num_args(1)
                .help(format!("The language to generate code in. [default: {}]", Config::default(ConfigKey::Language)))
                .value_parser(PossibleValuesParser::new(Language::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Model.to_string())
                .short('m')
                .long(ConfigKey::Model.to_string())
                .env("CODEAI_MODEL")
                .num_args(1)
                .help(format!("The chat completion model to request code from. [default: {}]", Config::default(ConfigKey::Model)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OpenAiURL.to_string())
                .long(ConfigKey::OpenAiURL.to_string())
                .env("CODEAI_OPENAI_URL")
                .num_args(1)
                .help(format!("OpenAI API URL. Can be swapped to a compatible proxy. [default: {}]", Config::default(ConfigKey::OpenAiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OpenAiToken.to_string())
                .long(ConfigKey::OpenAiToken.to_string())
                .env("CODEAI_OPENAI_TOKEN")
                .num_args(1)
                .help("OpenAI API token. Takes precedence over the stored token.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::CredentialFile.to_string())
                .long(ConfigKey::CredentialFile.to_string())
                .env("CODEAI_CREDENTIAL_FILE")
                .num_args(1)
                .help(format!("Where the OpenAI API token is stored. [default: {}]", Config::default(ConfigKey::CredentialFile)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RequestTimeout.to_string())
                .long(ConfigKey::RequestTimeout.to_string())
                .env("CODEAI_REQUEST_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds for a generation before giving up. [default: {}]", Config::default(ConfigKey::RequestTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
                .long(ConfigKey::BackendHealthCheckTimeout.to_string())
                .env("CODEAI_BACKEND_HEALTH_CHECK_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds before timing out when health checking the API. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Theme.to_string())
                .short('t')
                .long(ConfigKey::Theme.to_string())
                .env("CODEAI_THEME")
                .num_args(1)
                .help(format!("Sets code syntax highlighting theme. [default: {}]", Config::default(ConfigKey::Theme)))
                .value_parser(PossibleValuesParser::new(Themes::list()))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ThemeFile.to_string())
                .long(ConfigKey::ThemeFile.to_string())
                .env("CODEAI_THEME_FILE")
                .num_args(1)
                .help("Absolute path to a TextMate tmTheme to use for code syntax highlighting.")
                .global(true),
        );
}

pub async fn parse() -> Result<Option<Launch>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("generate", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;

            let prompt = subcmd_matches
                .get_many::<String>("prompt")
                .unwrap_or_default()
                .map(|e| return e.to_string())
                .collect::<Vec<String>>()
                .join(" ");
            let output = subcmd_matches.get_one::<path::PathBuf>("output").cloned();

            return Ok(Some(Launch::Generate(GenerateArgs { prompt, output })));
        }
        Some(("credential", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let store = CredentialStore::default();

            match subcmd_matches.subcommand() {
                Some(("set", set_matches)) => {
                    let token = set_matches
                        .get_one::<String>("token")
                        .map(|e| return e.to_string())
                        .unwrap_or_default();
                    let credential = Credential::new(&token);
                    if credential.is_empty() {
                        bail!("The token must not be empty");
                    }
                    store.save(&credential).await?;
                    println!("Saved API token to {}", store.path().to_string_lossy());
                }
                Some(("clear", _)) => {
                    store.clear().await?;
                    println!("Deleted stored API token");
                }
                Some(("path", _)) => {
                    println!("{}", store.path().to_string_lossy());
                }
                _ => {
                    subcommand_credential().print_long_help()?;
                }
            }

            return Ok(None);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }

            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(None);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(Some(Launch::Chat));
}
