use anyhow::bail;
use anyhow::Result;
use tokio::fs;

use super::cli::GenerateArgs;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Credential;
use crate::domain::models::Language;
use crate::domain::models::SharedBackend;
use crate::domain::services::GenerationSession;
use crate::infrastructure::credentials::CredentialStore;

/// Runs a single prompt to completion. The code goes to stdout or to
/// `--output`; anything else the assistant says is returned as an error.
pub async fn start(backend: SharedBackend, args: GenerateArgs) -> Result<()> {
    if args.prompt.trim().is_empty() {
        bail!("A prompt is required to generate code");
    }

    let language = Language::parse(&Config::get(ConfigKey::Language)).unwrap_or_default();
    let explicit_credential = Credential::new(&Config::get(ConfigKey::OpenAiToken));
    let credential = CredentialStore::default()
        .resolve(&explicit_credential)
        .await?;

    let mut session = GenerationSession::new(language);
    let entry = match session
        .run(backend.as_ref(), &args.prompt, language, &credential)
        .await
    {
        Some(entry) => entry.clone(),
        None => bail!("The prompt was not accepted"),
    };

    let code = match entry.code() {
        Some(code) => code,
        None => bail!(entry.text().to_string()),
    };

    if let Some(output) = args.output {
        fs::write(&output, format!("{}\n", code.source)).await?;
        eprintln!("Saved code to {}", output.to_string_lossy());
        return Ok(());
    }

    println!("{}", code.source);
    return Ok(());
}
