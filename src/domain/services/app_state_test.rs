use anyhow::bail;
use anyhow::Result;
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::AppState;
use crate::domain::models::Action;
use crate::domain::models::Credential;
use crate::domain::models::Event;
use crate::domain::models::GenerationError;
use crate::domain::models::Language;
use crate::domain::models::Role;
use crate::domain::services::Renderer;
use crate::infrastructure::credentials::CredentialStore;

fn app_state(dir: &TempDir, token: &str) -> AppState {
    return AppState::new(
        Language::Python,
        CredentialStore::new(dir.path().join("credential")),
        Credential::new(token),
        Renderer::plain(),
    );
}

/// Submits a prompt and feeds the dispatched ticket back as a success.
async fn generate(
    app_state: &mut AppState,
    rx: &mut mpsc::UnboundedReceiver<Action>,
    tx: &mpsc::UnboundedSender<Action>,
    prompt: &str,
    code: &str,
) -> Result<()> {
    app_state.handle_input(prompt, tx).await?;
    let ticket = match rx.recv().await.unwrap() {
        Action::Generate(ticket) => ticket,
        _ => bail!("Wrong enum"),
    };
    app_state.handle_event(Event::GenerationFinished(ticket.id, Ok(code.to_string())));

    return Ok(());
}

mod handle_input {
    use super::*;

    #[tokio::test]
    async fn it_ignores_blank_input() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");

        let reply = app_state.handle_input("   ", &tx).await?;

        assert!(reply.lines.is_empty());
        assert!(!reply.should_break);
        assert!(app_state.session.transcript().is_empty());
        assert!(rx.try_recv().is_err());

        return Ok(());
    }

    #[tokio::test]
    async fn it_dispatches_prompts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");

        let reply = app_state.handle_input("sum a list", &tx).await?;
        assert_eq!(reply.lines, vec!["Generating Python code...".to_string()]);
        assert!(app_state.session.is_generating());

        match rx.recv().await.unwrap() {
            Action::Generate(ticket) => {
                assert_eq!(ticket.request.prompt, "sum a list");
                assert_eq!(ticket.request.language, Language::Python);
                assert_eq!(ticket.credential.expose(), "abc");
            }
            _ => bail!("Wrong enum"),
        }

        return Ok(());
    }

    #[tokio::test]
    async fn it_uses_the_stored_credential() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "");
        app_state
            .credentials
            .save(&Credential::new("stored"))
            .await?;

        app_state.handle_input("sum a list", &tx).await?;
        match rx.recv().await.unwrap() {
            Action::Generate(ticket) => assert_eq!(ticket.credential.expose(), "stored"),
            _ => bail!("Wrong enum"),
        }

        return Ok(());
    }

    #[tokio::test]
    async fn it_answers_without_credential() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "");

        let reply = app_state.handle_input("sum a list", &tx).await?;

        assert_eq!(reply.lines.len(), 1);
        assert!(reply.lines[0].starts_with("CodeAI: No OpenAI API token"));
        assert!(!app_state.session.is_generating());
        assert!(rx.try_recv().is_err());

        return Ok(());
    }

    #[tokio::test]
    async fn it_holds_prompts_while_generating() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");

        app_state.handle_input("first", &tx).await?;
        let reply = app_state.handle_input("second", &tx).await?;

        insta::assert_snapshot!(reply.lines.join("\n"), @"Still generating. Wait for the result or use /cancel.");
        assert_eq!(app_state.session.transcript().len(), 1);
        assert!(matches!(rx.recv().await.unwrap(), Action::Generate(_)));
        assert!(rx.try_recv().is_err());

        return Ok(());
    }

    #[tokio::test]
    async fn it_reports_unreadable_credentials() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "");
        std::fs::create_dir_all(app_state.credentials.path())?;

        let reply = app_state.handle_input("write a function", &tx).await?;

        assert_eq!(reply.lines.len(), 1);
        assert!(reply.lines[0].starts_with("Failed to read the API token from"));
        assert!(!app_state.session.is_generating());
        assert!(rx.try_recv().is_err());

        let reply = app_state.handle_input("/help", &tx).await?;
        assert!(!reply.should_break);

        return Ok(());
    }
}

mod handle_event {
    use super::*;

    #[tokio::test]
    async fn it_renders_numbered_code() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");

        generate(&mut app_state, &mut rx, &tx, "one", "print(1)").await?;
        app_state.handle_input("two", &tx).await?;
        let ticket = match rx.recv().await.unwrap() {
            Action::Generate(ticket) => ticket,
            _ => bail!("Wrong enum"),
        };
        let reply = app_state.handle_event(Event::GenerationFinished(
            ticket.id,
            Ok("```python\nprint(2)\n```".to_string()),
        ));

        insta::assert_snapshot!(reply.lines.join("\n"), @r###"
        CodeAI: Done! Here's your code:
        (2) python.py
        print(2)
        "###);
        assert_eq!(app_state.codeblocks.len(), 2);

        return Ok(());
    }

    #[tokio::test]
    async fn it_renders_errors() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");

        app_state.handle_input("one", &tx).await?;
        let ticket = match rx.recv().await.unwrap() {
            Action::Generate(ticket) => ticket,
            _ => bail!("Wrong enum"),
        };
        let reply = app_state.handle_event(Event::GenerationFinished(
            ticket.id,
            Err(GenerationError::Api {
                status: 429,
                message: Some("rate limited".to_string()),
            }),
        ));

        assert_eq!(
            reply.lines,
            vec!["CodeAI: OpenAI API error: rate limited".to_string()]
        );
        assert!(!app_state.session.is_generating());

        return Ok(());
    }

    #[tokio::test]
    async fn it_ignores_cancelled_generations() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");

        app_state.handle_input("one", &tx).await?;
        let ticket = match rx.recv().await.unwrap() {
            Action::Generate(ticket) => ticket,
            _ => bail!("Wrong enum"),
        };

        let reply = app_state.handle_input("/cancel", &tx).await?;
        assert_eq!(reply.lines, vec!["CodeAI: Generation cancelled.".to_string()]);
        assert!(matches!(rx.recv().await.unwrap(), Action::Cancel()));

        let reply = app_state.handle_event(Event::GenerationFinished(
            ticket.id,
            Ok("print(1)".to_string()),
        ));
        assert!(reply.lines.is_empty());
        assert_eq!(app_state.session.transcript().len(), 2);
        assert_eq!(app_state.session.transcript()[1].role(), Role::Assistant);

        return Ok(());
    }

    #[test]
    fn it_renders_notices() {
        let dir = tempfile::tempdir().unwrap();
        let mut app_state = app_state(&dir, "abc");

        let reply = app_state.handle_event(Event::Notice("Copied code to clipboard.".to_string()));
        assert_eq!(reply.lines, vec!["Copied code to clipboard.".to_string()]);
    }
}

mod handle_slash_commands {
    use super::*;

    #[tokio::test]
    async fn it_breaks_on_quit() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");

        let reply = app_state.handle_input("/q", &tx).await?;
        assert!(reply.should_break);

        return Ok(());
    }

    #[tokio::test]
    async fn it_switches_languages() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");

        let reply = app_state.handle_input("/lua", &tx).await?;
        assert_eq!(reply.lines, vec!["Now generating Lua code.".to_string()]);
        assert_eq!(app_state.session.language(), Language::Lua);

        app_state.handle_input("/lang python", &tx).await?;
        assert_eq!(app_state.session.language(), Language::Python);

        app_state.handle_input("/lang lua", &tx).await?;
        app_state.handle_input("reverse a table", &tx).await?;
        match rx.recv().await.unwrap() {
            Action::Generate(ticket) => assert_eq!(ticket.request.language, Language::Lua),
            _ => bail!("Wrong enum"),
        }

        return Ok(());
    }

    #[tokio::test]
    async fn it_rejects_unknown_languages() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");

        let reply = app_state.handle_input("/lang rust", &tx).await?;
        assert_eq!(
            reply.lines,
            vec!["Unknown language rust. Choose python or lua.".to_string()]
        );
        assert_eq!(app_state.session.language(), Language::Python);

        return Ok(());
    }

    #[tokio::test]
    async fn it_copies_code_blocks() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");
        generate(&mut app_state, &mut rx, &tx, "one", "print(1)").await?;

        let reply = app_state.handle_input("/copy 1", &tx).await?;
        assert!(reply.lines.is_empty());

        match rx.recv().await.unwrap() {
            Action::CopyCode(blocks) => {
                assert_eq!(blocks.len(), 1);
                assert_eq!(blocks[0].source, "print(1)");
            }
            _ => bail!("Wrong enum"),
        }

        return Ok(());
    }

    #[tokio::test]
    async fn it_returns_error_message_on_invalid_codeblock() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");
        generate(&mut app_state, &mut rx, &tx, "one", "print(1)").await?;

        let reply = app_state.handle_input("/copy 1000", &tx).await?;
        insta::assert_snapshot!(reply.lines.join("\n"), @r###"
        There was an error trying to parse your command:

        1000 is out of bounds.
        "###);
        assert!(rx.try_recv().is_err());

        return Ok(());
    }

    #[tokio::test]
    async fn it_saves_code_blocks() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");
        generate(&mut app_state, &mut rx, &tx, "one", "print(1)").await?;

        let file_path = dir.path().join("out.py");
        let command = format!("/save 1 {}", file_path.to_string_lossy());
        let reply = app_state.handle_input(&command, &tx).await?;

        assert_eq!(
            reply.lines,
            vec![format!("Saved code to {}.", file_path.to_string_lossy())]
        );
        assert_eq!(std::fs::read_to_string(file_path)?, "print(1)\n");

        return Ok(());
    }

    #[tokio::test]
    async fn it_saves_tokens() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "");

        let reply = app_state.handle_input("/token sk-abc", &tx).await?;
        assert_eq!(reply.lines.len(), 1);
        assert_eq!(app_state.credentials.load().await?.expose(), "sk-abc");

        let reply = app_state.handle_input("/token", &tx).await?;
        assert_eq!(reply.lines, vec!["Usage: /token YOUR_TOKEN".to_string()]);

        return Ok(());
    }

    #[tokio::test]
    async fn it_has_nothing_to_cancel_when_idle() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "abc");

        let reply = app_state.handle_input("/cancel", &tx).await?;
        assert_eq!(reply.lines, vec!["Nothing to cancel.".to_string()]);
        assert!(rx.try_recv().is_err());

        return Ok(());
    }

    #[tokio::test]
    async fn it_reports_unwritable_token_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = app_state(&dir, "");
        std::fs::create_dir_all(app_state.credentials.path())?;

        let reply = app_state.handle_input("/token sk-abc", &tx).await?;

        assert_eq!(reply.lines.len(), 1);
        assert!(reply.lines[0].starts_with("Failed to save the API token to"));
        assert!(!reply.should_break);

        return Ok(());
    }
}
