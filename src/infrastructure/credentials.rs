#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Credential;

/// File backed storage for the API token.
pub struct CredentialStore {
    path: path::PathBuf,
}

impl Default for CredentialStore {
    fn default() -> CredentialStore {
        return CredentialStore::new(path::PathBuf::from(Config::get(
            ConfigKey::CredentialFile,
        )));
    }
}

impl CredentialStore {
    pub fn new(path: path::PathBuf) -> CredentialStore {
        return CredentialStore { path };
    }

    pub fn path(&self) -> &path::Path {
        return &self.path;
    }

    /// A missing file is an empty credential, not an error.
    pub async fn load(&self) -> Result<Credential> {
        if !self.path.exists() {
            return Ok(Credential::default());
        }

        let payload = fs::read_to_string(&self.path).await?;
        return Ok(Credential::new(&payload));
    }

    /// Prefers an explicitly configured token over the stored one.
    pub async fn resolve(&self, explicit: &Credential) -> Result<Credential> {
        if !explicit.is_empty() {
            return Ok(explicit.clone());
        }

        return self.load().await;
    }

    pub async fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        // Mode only applies on creation, so existing files are tightened
        // before the token is written.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            options.mode(0o600);
            if self.path.exists() {
                fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
            }
        }

        let mut file = options.open(&self.path).await?;
        file.write_all(credential.expose().as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(path = ?self.path, "Saved credential");
        return Ok(());
    }

    pub async fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        fs::remove_file(&self.path).await?;
        return Ok(());
    }
}
