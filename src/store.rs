// Credential store: named Slack tokens persisted to a small JSON file with
// owner-only permissions. The store is a plain value; callers load it,
// change it and save it back explicitly.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::AvatarError;

/// Alias used for the environment token and for legacy single-token files.
pub const DEFAULT_ALIAS: &str = "default";

/// One stored credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Profile {
    pub alias: String,
    pub token: String,
}

impl Profile {
    pub fn new(alias: impl Into<String>, token: impl Into<String>) -> Self {
        Profile {
            alias: alias.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("alias", &self.alias)
            .field("token", &format_args!("<{} bytes>", self.token.len()))
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialStore {
    pub profiles: BTreeMap<String, Profile>,
    /// May name an alias that has since been removed; nothing re-elects it.
    pub default_alias: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

#[derive(Serialize, Deserialize, Default)]
struct StoreFile {
    #[serde(default)]
    profiles: BTreeMap<String, StoredToken>,
    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    default_alias: Option<String>,
    /// Single-token layout written by earlier versions.
    #[serde(default, skip_serializing)]
    token: Option<String>,
}

impl CredentialStore {
    /// Load the store at `path`. A missing file is an empty store; an
    /// unreadable or corrupt one is logged and also treated as empty.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(store) => store,
            Err(e) => {
                warn!("{e}; continuing with no profiles configured");
                CredentialStore::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, AvatarError> {
        if !path.exists() {
            debug!("no credential store at {}", path.display());
            return Ok(CredentialStore::default());
        }
        let data = fs::read_to_string(path).map_err(|e| AvatarError::config(path, e))?;
        let file: StoreFile = serde_json::from_str(&data).map_err(|e| AvatarError::config(path, e))?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: StoreFile) -> Self {
        let mut profiles: BTreeMap<String, Profile> = file
            .profiles
            .into_iter()
            .map(|(alias, stored)| (alias.clone(), Profile::new(alias, stored.token)))
            .collect();
        let mut default_alias = file.default_alias;

        if let Some(token) = file.token.filter(|t| !t.is_empty()) {
            if !profiles.contains_key(DEFAULT_ALIAS) {
                debug!("migrating legacy single-token store to profile '{DEFAULT_ALIAS}'");
                profiles.insert(DEFAULT_ALIAS.into(), Profile::new(DEFAULT_ALIAS, token));
                default_alias.get_or_insert_with(|| DEFAULT_ALIAS.into());
            }
        }

        CredentialStore {
            profiles,
            default_alias,
        }
    }

    /// Write the whole store to `path`, readable and writable by the owner only.
    pub fn save(&self, path: &Path) -> Result<(), AvatarError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AvatarError::io(parent, e))?;
        }

        let file = StoreFile {
            profiles: self
                .profiles
                .iter()
                .map(|(alias, p)| (alias.clone(), StoredToken { token: p.token.clone() }))
                .collect(),
            default_alias: self.default_alias.clone(),
            token: None,
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| AvatarError::io(path, e))?;

        let mut out = open_private(path).map_err(|e| AvatarError::io(path, e))?;
        out.write_all(json.as_bytes())
            .map_err(|e| AvatarError::io(path, e))?;
        restrict_permissions(path).map_err(|e| AvatarError::io(path, e))?;
        debug!("saved {} profile(s) to {}", self.profiles.len(), path.display());
        Ok(())
    }

    /// Insert `batch` (replacing tokens of re-used aliases) and elect a
    /// default when none is set yet.
    pub fn add_profiles<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = Profile>,
    {
        for profile in batch {
            self.profiles.insert(profile.alias.clone(), profile);
        }
        if self.default_alias.is_none() {
            self.default_alias = self.profiles.keys().next().cloned();
        }
    }

    pub fn remove(&mut self, alias: &str) -> bool {
        self.profiles.remove(alias).is_some()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Default alias when it still points at a stored profile.
    pub fn live_default(&self) -> Option<&str> {
        self.default_alias
            .as_deref()
            .filter(|alias| self.profiles.contains_key(*alias))
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Load the store at `path`, add `batch` to it and write it back.
pub fn save_profiles(path: &Path, batch: Vec<Profile>) -> Result<CredentialStore, AvatarError> {
    let mut store = CredentialStore::load(path);
    store.add_profiles(batch);
    store.save(path)?;
    Ok(store)
}

/// Remove `alias` from the store on disk. Returns whether anything changed.
pub fn remove_profile(path: &Path, alias: &str) -> Result<bool, AvatarError> {
    let mut store = CredentialStore::try_load(path)?;
    if !store.remove(alias) {
        return Ok(false);
    }
    store.save(path)?;
    Ok(true)
}

/// Where a resolved token came from. Only stored tokens may be pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    Store,
    Prompt,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: String,
    pub source: TokenSource,
}

impl fmt::Debug for ResolvedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedToken")
            .field("token", &format_args!("<{} bytes>", self.token.len()))
            .field("source", &self.source)
            .finish()
    }
}

/// Tokens to upload with, keyed by alias.
///
/// The environment token is the implicit `default` profile and is never
/// overridden by a stored profile of the same alias. When `requested` is
/// given, only those aliases are returned, the implicit one included.
pub fn resolve_tokens(
    store: &CredentialStore,
    env_token: Option<&str>,
    requested: Option<&[String]>,
) -> BTreeMap<String, ResolvedToken> {
    let wanted = |alias: &str| requested.map_or(true, |r| r.iter().any(|a| a == alias));
    let mut tokens = BTreeMap::new();

    if let Some(token) = env_token.filter(|t| !t.is_empty()) {
        if wanted(DEFAULT_ALIAS) {
            tokens.insert(
                DEFAULT_ALIAS.to_string(),
                ResolvedToken {
                    token: token.to_string(),
                    source: TokenSource::Environment,
                },
            );
        }
    }

    for (alias, profile) in &store.profiles {
        if wanted(alias) {
            tokens
                .entry(alias.clone())
                .or_insert_with(|| ResolvedToken {
                    token: profile.token.clone(),
                    source: TokenSource::Store,
                });
        }
    }

    if let Some(requested) = requested {
        for alias in requested.iter().filter(|a| !tokens.contains_key(a.as_str())) {
            warn!("profile '{alias}' is not configured; skipping");
        }
    }
    tokens
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}

// `mode` only applies on creation, so an existing file is tightened here.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
