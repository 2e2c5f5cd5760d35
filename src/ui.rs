// UI layer: terminal prompts and output built on `dialoguer`, `indicatif`
// and `crossterm`. Nothing in here decides policy; it collects input,
// hands it to the store or uploader, and reports what happened.

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{describe_code, ApiError};
use crate::setup::{self, SetupPrompt};
use crate::store::{CredentialStore, Profile, DEFAULT_ALIAS};
use crate::uploader::{CredentialPrompt, PromptedCredentials, UploadObserver, UploadResult, UploadSummary};

fn print_token_instructions() {
    println!("\nTo upload to Slack you need a User OAuth Token with the 'users.profile:write' scope.");
    println!("Follow these steps to get your token:");
    println!("1. Go to https://api.slack.com/apps");
    println!("2. Create a new app (or use an existing one)");
    println!("3. Go to 'OAuth & Permissions' and add 'users.profile:write' to 'User Token Scopes'");
    println!("4. Install the app to your workspace");
    println!("5. Copy the 'User OAuth Token' (starts with xoxp-)");
}

/// Ask for a token without echoing it. Empty input means "none".
fn ask_token(prompt: &str) -> io::Result<Option<String>> {
    let token: String = Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()?;
    let token = token.trim().to_string();
    Ok((!token.is_empty()).then_some(token))
}

/// Treat a missing terminal (scheduled runs, closed stdin) as "no answer".
fn unless_detached<T>(answer: io::Result<T>) -> io::Result<Option<T>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotConnected | io::ErrorKind::UnexpectedEof) => {
            println!("No terminal available to ask for a token.");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Interactive `CredentialPrompt` used when an upload finds no token.
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn acquire(&mut self) -> io::Result<Option<PromptedCredentials>> {
        print_token_instructions();
        let Some(token) = unless_detached(ask_token("Enter your Slack User OAuth Token"))?.flatten() else {
            println!("No token provided.");
            return Ok(None);
        };
        let persist = Confirm::new()
            .with_prompt("Would you like to save this token for future use?")
            .default(false)
            .interact();
        let persist = unless_detached(persist)?.unwrap_or(false);
        Ok(Some(PromptedCredentials {
            profiles: vec![Profile::new(DEFAULT_ALIAS, token)],
            persist,
        }))
    }
}

/// Terminal answers for the setup flows.
struct TerminalSetup {
    many: bool,
}

impl SetupPrompt for TerminalSetup {
    fn alias(&mut self) -> io::Result<String> {
        let mut input = Input::<String>::new();
        input.with_prompt("Profile alias");
        if self.many {
            input.allow_empty(true);
        } else {
            input.default(DEFAULT_ALIAS.to_string());
        }
        input.interact_text()
    }

    fn token(&mut self, alias: &str) -> io::Result<Option<String>> {
        ask_token(&format!("Token for '{alias}'"))
    }

    fn skipped(&mut self, alias: &str) {
        println!("No token given for '{alias}', skipping.");
    }
}

/// `--setup-slack`: store one token under an alias.
pub fn setup_single(store_path: &Path) -> Result<()> {
    print_token_instructions();
    let batch = setup::collect_single(&mut TerminalSetup { many: false })?;
    if save_batch(store_path, batch)? {
        println!("{}", "Slack token setup completed successfully.".green());
    }
    Ok(())
}

/// `--add-profiles`: collect alias/token pairs until an empty alias.
pub fn setup_many(store_path: &Path) -> Result<()> {
    print_token_instructions();
    println!("\nEnter one profile per workspace. Leave the alias empty to finish.");

    let batch = setup::collect_many(&mut TerminalSetup { many: true })?;
    let count = batch.len();
    if save_batch(store_path, batch)? {
        println!("{}", format!("Saved {count} profile(s).").green());
    }
    Ok(())
}

fn save_batch(store_path: &Path, batch: Vec<Profile>) -> Result<bool> {
    let saved = setup::save_batch(store_path, batch)
        .with_context(|| format!("Failed to save profiles to {}", store_path.display()))?;
    let Some(saved) = saved else {
        println!("No tokens provided. Setup aborted.");
        return Ok(false);
    };
    if let Some(default) = saved.default_alias.as_deref() {
        println!("Default profile: {default}");
    }
    Ok(true)
}

/// `--list-profiles`: show configured aliases and the default.
pub fn list_profiles(store_path: &Path, env_token_set: bool) {
    let store = CredentialStore::load(store_path);
    println!("Credential store: {}", store_path.display());

    if store.is_empty() {
        println!("No profiles configured. Run with --setup-slack or --add-profiles.");
    } else {
        println!("Configured profiles:");
        for alias in store.aliases() {
            if store.default_alias.as_deref() == Some(alias) {
                println!("  {} {}", alias.bold(), "(default)".dim());
            } else {
                println!("  {alias}");
            }
        }
    }

    match (&store.default_alias, store.live_default()) {
        (Some(alias), None) => println!(
            "{}",
            format!("Default profile '{alias}' no longer exists.").yellow()
        ),
        (None, _) if !store.is_empty() => println!("No default profile set."),
        _ => {}
    }
    if env_token_set {
        println!("A token from the environment is used as profile '{DEFAULT_ALIAS}'.");
    }
}

/// Shows a spinner while uploads run and prints failures as they happen.
#[derive(Default)]
pub struct ConsoleObserver {
    spinner: Option<ProgressBar>,
}

impl ConsoleObserver {
    fn spinner(&mut self) -> &ProgressBar {
        self.spinner.get_or_insert_with(|| {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                spinner.set_style(style);
            }
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        })
    }

    pub fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl UploadObserver for ConsoleObserver {
    fn uploading(&mut self, alias: &str) {
        self.spinner().set_message(format!("Uploading to '{alias}'..."));
    }

    fn failed(&mut self, alias: &str, error: &ApiError) {
        let mut line = format!("Failed to upload to '{alias}': {error}");
        if let Some(hint) = error.code().and_then(describe_code) {
            line.push_str(&format!("\n  {hint}"));
        }
        self.spinner().println(line.red().to_string());
    }

    fn io_failed(&mut self, alias: &str, error: &io::Error) {
        self.spinner()
            .println(format!("Could not read the image for '{alias}': {error}").red().to_string());
    }

    fn pruned(&mut self, alias: &str) {
        self.spinner()
            .println(format!("Removed invalid token for '{alias}' from the config file."));
    }
}

pub fn print_summary(results: &[UploadResult]) -> UploadSummary {
    let summary = UploadSummary::from_results(results);
    if results.is_empty() {
        println!("{}", "No Slack token available. Upload canceled.".yellow());
        return summary;
    }
    if !summary.successful.is_empty() {
        println!(
            "{} {}",
            "Profile photo updated for:".green(),
            summary.successful.join(", ")
        );
    }
    if !summary.failed.is_empty() {
        println!("{} {}", "Upload failed for:".red(), summary.failed.join(", "));
    }
    summary
}
