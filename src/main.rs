#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::io::IsTerminal;
use std::process;
use std::sync::Arc;

use anyhow::Error;
use anyhow::Result;
use domain::models::Action;
use domain::models::Event;
use domain::models::SharedBackend;
use domain::services::clipboard::ClipboardService;
use infrastructure::backends::openai::OpenAI;
use tokio::sync::mpsc;
use tokio::task;
use yansi::Paint;

use crate::application::chat;
use crate::application::cli;
use crate::application::cli::Launch;
use crate::application::generate;
use crate::domain::services::actions::ActionsService;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! CodeAI has failed with the following app version and error.\n\nVersion: {}\nCommit: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_GIT_DESCRIBE"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

async fn start_chat(backend: SharedBackend) -> Result<()> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut background_futures = task::JoinSet::new();
    let worker_backend = backend.clone();
    background_futures.spawn(async move {
        return ActionsService::start(worker_backend, event_tx, &mut action_rx).await;
    });

    if let Err(clipboard_err) = ClipboardService::healthcheck() {
        tracing::warn!(err = ?clipboard_err, "Clipboard service is unable to start")
    } else {
        background_futures.spawn(async move {
            return ClipboardService::start().await;
        });
    }

    let chat_future = chat::start(backend, action_tx, event_rx);

    let res = tokio::select!(
        res = background_futures.join_next() => match res {
            Some(Ok(res)) => res,
            Some(Err(err)) => Err(err.into()),
            None => Ok(()),
        },
        res = chat_future => res,
    );

    background_futures.abort_all();
    return res;
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    if !std::io::stdout().is_terminal() {
        Paint::disable();
    }

    let debug_log_dir = env::var("CODEAI_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("codeai")
            .to_string_lossy()
            .to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("codeai")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let launch = match cli::parse().await {
        Ok(Some(launch)) => launch,
        Ok(None) => process::exit(0),
        Err(err) => return handle_error(err),
    };

    let backend: SharedBackend = match OpenAI::from_config() {
        Ok(backend) => Arc::new(backend),
        Err(err) => return handle_error(err),
    };

    let res = match launch {
        Launch::Chat => start_chat(backend).await,
        Launch::Generate(args) => generate::start(backend, args).await,
    };

    if let Err(err) = res {
        handle_error(err);
    }

    process::exit(0);
}
