use std::io::IsTerminal;

use anyhow::Result;
use tokio::io;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Credential;
use crate::domain::models::Event;
use crate::domain::models::Language;
use crate::domain::models::SharedBackend;
use crate::domain::services::AppState;
use crate::domain::services::Renderer;
use crate::domain::services::Reply;
use crate::domain::services::Themes;
use crate::infrastructure::credentials::CredentialStore;

fn renderer() -> Result<Renderer> {
    if !std::io::stdout().is_terminal() {
        return Ok(Renderer::plain());
    }

    let theme = Themes::get(
        &Config::get(ConfigKey::Theme),
        &Config::get(ConfigKey::ThemeFile),
    )?;

    return Ok(Renderer::new(theme));
}

fn print_reply(reply: &Reply) {
    for line in reply.lines.iter() {
        println!("{line}");
    }
}

/// Line based chat over stdin. Returns when stdin closes or on `/quit`.
pub async fn start(
    backend: SharedBackend,
    action_tx: mpsc::UnboundedSender<Action>,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let language = Language::parse(&Config::get(ConfigKey::Language)).unwrap_or_default();
    let explicit_credential = Credential::new(&Config::get(ConfigKey::OpenAiToken));
    let mut app_state = AppState::new(
        language,
        CredentialStore::default(),
        explicit_credential,
        renderer()?,
    );

    println!("{}", app_state.greeting());

    if let Err(err) = backend.health_check().await {
        tracing::warn!(error = ?err, "Backend health check failed");
        println!("{}", app_state.renderer.error(&format!("{err}")));
    }

    let mut lines = io::BufReader::new(io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };

                let reply = app_state.handle_input(&line, &action_tx).await?;
                print_reply(&reply);
                if reply.should_break {
                    break;
                }
            }
            event = event_rx.recv() => {
                let event = match event {
                    Some(event) => event,
                    None => break,
                };

                print_reply(&app_state.handle_event(event));
            }
        }
    }

    return Ok(());
}
