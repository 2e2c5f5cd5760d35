// Credential setup: gathers alias/token pairs from a prompt and saves them
// as one batch. An empty batch writes nothing.

use std::io;
use std::path::Path;

use crate::errors::AvatarError;
use crate::store::{self, CredentialStore, Profile, DEFAULT_ALIAS};

/// Answers the questions asked while setting up profiles.
pub trait SetupPrompt {
    /// Next alias; an empty string ends the multi-profile loop.
    fn alias(&mut self) -> io::Result<String>;
    /// Token for `alias`, `None` when left empty.
    fn token(&mut self, alias: &str) -> io::Result<Option<String>>;
    fn skipped(&mut self, _alias: &str) {}
}

/// One alias (empty means `default`) and its token.
pub fn collect_single(prompt: &mut dyn SetupPrompt) -> io::Result<Vec<Profile>> {
    let alias = prompt.alias()?.trim().to_string();
    let alias = if alias.is_empty() {
        DEFAULT_ALIAS.to_string()
    } else {
        alias
    };
    Ok(prompt
        .token(&alias)?
        .map(|token| vec![Profile::new(alias, token)])
        .unwrap_or_default())
}

/// Alias/token pairs until an empty alias. Aliases without a token are skipped.
pub fn collect_many(prompt: &mut dyn SetupPrompt) -> io::Result<Vec<Profile>> {
    let mut batch = Vec::new();
    loop {
        let alias = prompt.alias()?.trim().to_string();
        if alias.is_empty() {
            return Ok(batch);
        }
        match prompt.token(&alias)? {
            Some(token) => batch.push(Profile::new(alias, token)),
            None => prompt.skipped(&alias),
        }
    }
}

/// Save a collected batch. Returns `None`, without touching the file, when
/// the batch is empty.
pub fn save_batch(store_path: &Path, batch: Vec<Profile>) -> Result<Option<CredentialStore>, AvatarError> {
    if batch.is_empty() {
        return Ok(None);
    }
    store::save_profiles(store_path, batch).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tempfile::tempdir;

    /// Replays alias answers and token answers in order.
    #[derive(Default)]
    struct Script {
        aliases: VecDeque<&'static str>,
        tokens: VecDeque<&'static str>,
        skipped: Vec<String>,
    }

    impl Script {
        fn new(aliases: &[&'static str], tokens: &[&'static str]) -> Self {
            Script {
                aliases: aliases.iter().copied().collect(),
                tokens: tokens.iter().copied().collect(),
                skipped: Vec::new(),
            }
        }
    }

    impl SetupPrompt for Script {
        fn alias(&mut self) -> io::Result<String> {
            Ok(self.aliases.pop_front().expect("asked for too many aliases").to_string())
        }

        fn token(&mut self, _alias: &str) -> io::Result<Option<String>> {
            let token = self.tokens.pop_front().expect("asked for too many tokens");
            Ok((!token.is_empty()).then(|| token.to_string()))
        }

        fn skipped(&mut self, alias: &str) {
            self.skipped.push(alias.to_string());
        }
    }

    #[test]
    fn empty_alias_ends_the_loop() {
        let mut script = Script::new(&["work", "home", "", "never"], &["w", "h"]);
        let batch = collect_many(&mut script).expect("collect");

        let aliases: Vec<_> = batch.iter().map(|p| p.alias.as_str()).collect();
        assert_eq!(aliases, vec!["work", "home"]);
        assert_eq!(script.aliases, VecDeque::from(vec!["never"]));
    }

    #[test]
    fn alias_without_token_is_skipped() {
        let mut script = Script::new(&["work", "home", ""], &["", "h"]);
        let batch = collect_many(&mut script).expect("collect");

        assert_eq!(batch, vec![Profile::new("home", "h")]);
        assert_eq!(script.skipped, vec!["work"]);
    }

    #[test]
    fn no_tokens_writes_no_file() {
        let temp = tempdir().expect("tempdir");
        let store_path = temp.path().join("config.json");
        let mut script = Script::new(&["work", ""], &[""]);

        let batch = collect_many(&mut script).expect("collect");
        assert!(save_batch(&store_path, batch).expect("save").is_none());
        assert!(!store_path.exists());
    }

    #[test]
    fn single_setup_defaults_the_alias() {
        let mut script = Script::new(&["  "], &["xoxp-1"]);
        let batch = collect_single(&mut script).expect("collect");
        assert_eq!(batch, vec![Profile::new(DEFAULT_ALIAS, "xoxp-1")]);
    }

    #[test]
    fn single_setup_without_token_writes_no_file() {
        let temp = tempdir().expect("tempdir");
        let store_path = temp.path().join("config.json");
        let mut script = Script::new(&["work"], &[""]);

        let batch = collect_single(&mut script).expect("collect");
        assert!(save_batch(&store_path, batch).expect("save").is_none());
        assert!(!store_path.exists());
    }

    #[test]
    fn saved_batch_elects_a_default() {
        let temp = tempdir().expect("tempdir");
        let store_path = temp.path().join("config.json");
        let mut script = Script::new(&["work", ""], &["w"]);

        let batch = collect_many(&mut script).expect("collect");
        let store = save_batch(&store_path, batch).expect("save").expect("written");
        assert_eq!(store.default_alias.as_deref(), Some("work"));
        assert!(store_path.exists());
    }
}
