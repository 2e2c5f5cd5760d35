// Library root
// -----------
// This crate exposes the pieces the `daily-avatar` binary is assembled
// from, so each can be tested without a terminal or a network.
//
// Module responsibilities:
// - `assets`: picks random PNGs from folders and names the output file.
// - `compositor`: layers foreground over background and shapes profile photos.
// - `store`: the on-disk credential store and token resolution.
// - `api`: the blocking Slack Web API client behind the `PhotoApi` trait.
// - `uploader`: sequential multi-profile upload and dead-token cleanup.
// - `setup`: collects and saves profiles for the setup flows.
// - `ui`: terminal prompts, setup flows and upload reporting.
// - `config`: settings read from the environment at startup.
// - `errors`: the library's error type.
pub mod api;
pub mod assets;
pub mod compositor;
pub mod config;
pub mod errors;
pub mod setup;
pub mod store;
pub mod ui;
pub mod uploader;

pub use errors::AvatarError;
