// Runtime settings: where the tool looks for its folders and credential
// file, which API endpoint it talks to, and the optional token supplied
// through the environment. Everything is read once at startup.

use std::path::{Path, PathBuf};

/// Environment variable holding a token used as the implicit `default` profile.
pub const TOKEN_ENV: &str = "SLACK_USER_TOKEN";
/// Environment variable overriding the Slack Web API base URL.
pub const API_URL_ENV: &str = "SLACK_API_URL";
/// Environment variable overriding the credential store location.
pub const CONFIG_PATH_ENV: &str = "DAILY_AVATAR_CONFIG";

pub const DEFAULT_API_URL: &str = "https://slack.com/api";
pub const CONFIG_FILE_NAME: &str = ".slack_config.json";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory relative asset/output folders are resolved against.
    pub base_dir: PathBuf,
    pub store_path: PathBuf,
    pub api_url: String,
    pub env_token: Option<String>,
}

impl Settings {
    /// Build settings from the process environment. The base directory is
    /// the one holding the executable so scheduled runs behave the same
    /// regardless of the working directory.
    pub fn from_env() -> Self {
        let base_dir = executable_dir();
        let store_path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| base_dir.join(CONFIG_FILE_NAME));
        let api_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.into());
        let env_token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty());

        Settings {
            base_dir,
            store_path,
            api_url,
            env_token,
        }
    }

    /// Resolve a folder given on the command line.
    pub fn resolve_dir(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.base_dir.join(dir)
        }
    }
}

fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}
