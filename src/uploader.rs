// Uploader: sends the finished image to every resolved profile, one after
// another, and drops stored tokens that Slack reports as dead.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::api::{ApiError, PhotoApi};
use crate::errors::AvatarError;
use crate::store::{self, CredentialStore, Profile, ResolvedToken, TokenSource};

/// Outcome of one profile's upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub alias: String,
    pub success: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub successful: Vec<String>,
    pub failed: Vec<String>,
}

impl UploadSummary {
    pub fn from_results(results: &[UploadResult]) -> Self {
        let (ok, failed): (Vec<_>, Vec<_>) = results.iter().partition(|r| r.success);
        UploadSummary {
            successful: ok.into_iter().map(|r| r.alias.clone()).collect(),
            failed: failed.into_iter().map(|r| r.alias.clone()).collect(),
        }
    }
}

/// Tokens gathered interactively when nothing is configured.
#[derive(Debug, Default)]
pub struct PromptedCredentials {
    pub profiles: Vec<Profile>,
    /// Save the profiles to the credential store for later runs.
    pub persist: bool,
}

/// Source of credentials when neither the environment nor the store has any.
pub trait CredentialPrompt {
    fn acquire(&mut self) -> std::io::Result<Option<PromptedCredentials>>;
}

/// Reports per-profile progress and failures to the user.
pub trait UploadObserver {
    fn uploading(&mut self, _alias: &str) {}
    fn failed(&mut self, _alias: &str, _error: &ApiError) {}
    fn io_failed(&mut self, _alias: &str, _error: &std::io::Error) {}
    fn pruned(&mut self, _alias: &str) {}
}

impl UploadObserver for () {}

pub struct Uploader<'a> {
    api: &'a dyn PhotoApi,
    store_path: PathBuf,
    env_token: Option<String>,
}

impl<'a> Uploader<'a> {
    pub fn new(api: &'a dyn PhotoApi, store_path: impl Into<PathBuf>, env_token: Option<String>) -> Self {
        Uploader {
            api,
            store_path: store_path.into(),
            env_token,
        }
    }

    /// Upload `image` to each resolved profile in turn.
    ///
    /// A failing profile never stops the others. If no token can be found
    /// or prompted for, nothing is uploaded and the result list is empty.
    pub fn upload(
        &self,
        image: &Path,
        requested: Option<&[String]>,
        prompt: &mut dyn CredentialPrompt,
        observer: &mut dyn UploadObserver,
    ) -> Result<Vec<UploadResult>, AvatarError> {
        let tokens = match self.acquire_tokens(requested, prompt) {
            Ok(tokens) => tokens,
            Err(AvatarError::CredentialMissing) => {
                info!("no Slack token available; upload canceled");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "avatar.png".into());

        let mut results = Vec::with_capacity(tokens.len());
        for (alias, resolved) in tokens {
            observer.uploading(&alias);
            let success = self.upload_one(&alias, &resolved, image, &file_name, observer);
            results.push(UploadResult { alias, success });
        }
        Ok(results)
    }

    fn upload_one(
        &self,
        alias: &str,
        resolved: &ResolvedToken,
        image: &Path,
        file_name: &str,
        observer: &mut dyn UploadObserver,
    ) -> bool {
        let bytes = match fs::read(image) {
            Ok(bytes) => bytes,
            Err(e) => {
                info!("could not read {} for '{alias}': {e}", image.display());
                observer.io_failed(alias, &e);
                return false;
            }
        };

        match self.api.set_photo(&resolved.token, file_name, bytes) {
            Ok(()) => {
                info!("uploaded profile photo for '{alias}'");
                true
            }
            Err(e) => {
                info!("upload for '{alias}' failed: {e}");
                observer.failed(alias, &e);
                if e.is_dead_credential() {
                    if resolved.source != TokenSource::Store {
                        info!("'{alias}' token is not stored; nothing to remove");
                    } else if self.prune(alias) {
                        observer.pruned(alias);
                    }
                }
                false
            }
        }
    }

    /// Drop a dead alias from disk. Failing to do so is only logged.
    fn prune(&self, alias: &str) -> bool {
        match store::remove_profile(&self.store_path, alias) {
            Ok(removed) => {
                if removed {
                    info!("removed invalid token for '{alias}' from the credential store");
                }
                removed
            }
            Err(e) => {
                warn!("could not remove '{alias}' from the credential store: {e}");
                false
            }
        }
    }

    fn acquire_tokens(
        &self,
        requested: Option<&[String]>,
        prompt: &mut dyn CredentialPrompt,
    ) -> Result<BTreeMap<String, ResolvedToken>, AvatarError> {
        let store = CredentialStore::load(&self.store_path);
        let tokens = store::resolve_tokens(&store, self.env_token.as_deref(), requested);
        if !tokens.is_empty() {
            return Ok(tokens);
        }

        let prompted = prompt
            .acquire()
            .map_err(AvatarError::Prompt)?
            .filter(|p| !p.profiles.is_empty())
            .ok_or(AvatarError::CredentialMissing)?;

        let mut source = TokenSource::Prompt;
        if prompted.persist {
            match store::save_profiles(&self.store_path, prompted.profiles.clone()) {
                Ok(_) => source = TokenSource::Store,
                Err(e) => warn!("failed to save token, it will be needed again next time: {e}"),
            }
        }

        Ok(prompted
            .profiles
            .into_iter()
            .map(|p| (p.alias, ResolvedToken { token: p.token, source }))
            .collect())
    }
}
