// Entrypoint for the CLI application.
// - Parses flags, then either runs a credential setup/listing flow or the
//   pick → composite → upload pipeline.
// - Any failure prints a readable message and exits with status 1.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;

use daily_avatar::api::SlackClient;
use daily_avatar::compositor::PROFILE_SIZE;
use daily_avatar::config::Settings;
use daily_avatar::ui::{self, ConsoleObserver, TerminalPrompt};
use daily_avatar::uploader::Uploader;
use daily_avatar::{assets, compositor, AvatarError};

#[derive(Parser, Debug)]
#[command(author, version, about = "Layer a random foreground image on a random background image")]
struct Args {
    /// Folder containing foreground PNG images
    #[arg(short, long, default_value = "foreground")]
    foreground: PathBuf,

    /// Folder containing background PNG images
    #[arg(short, long, default_value = "background")]
    background: PathBuf,

    /// Output folder for layered images
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Output filename without extension (default: background_foreground)
    #[arg(short, long)]
    name: Option<String>,

    /// Optimize output for a Slack profile photo
    #[arg(short, long)]
    slack: bool,

    /// Upload the result to Slack as the profile photo (implies --slack)
    #[arg(short, long)]
    upload: bool,

    /// Only upload to these profile aliases
    #[arg(short, long, num_args = 1..)]
    profiles: Option<Vec<String>>,

    /// Set up a single Slack token, then exit
    #[arg(long)]
    setup_slack: bool,

    /// Add several Slack profiles interactively, then exit
    #[arg(long)]
    add_profiles: bool,

    /// List configured profiles, then exit
    #[arg(long)]
    list_profiles: bool,

    /// Seed for image selection, for reproducible picks
    #[arg(long)]
    seed: Option<u64>,

    /// Credential store location (default: beside the executable)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let mut settings = Settings::from_env();
    if let Some(path) = &args.config {
        settings.store_path = path.clone();
    }

    if let Err(err) = run(&args, &settings) {
        println!("Error: {err:#}");
        if err
            .downcast_ref::<AvatarError>()
            .map_or(false, AvatarError::is_not_found)
        {
            println!("\nPlease ensure you have PNG images in both the foreground and background folders.");
        }
        std::process::exit(1);
    }
}

fn run(args: &Args, settings: &Settings) -> Result<()> {
    if args.setup_slack {
        return ui::setup_single(&settings.store_path);
    }
    if args.add_profiles {
        return ui::setup_many(&settings.store_path);
    }
    if args.list_profiles {
        ui::list_profiles(&settings.store_path, settings.env_token.is_some());
        return Ok(());
    }

    let foreground_dir = settings.resolve_dir(&args.foreground);
    let background_dir = settings.resolve_dir(&args.background);
    let output_dir = settings.resolve_dir(&args.output);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output folder {}", output_dir.display()))?;

    println!("Looking for foreground images in: {}", foreground_dir.display());
    println!("Looking for background images in: {}", background_dir.display());

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let foreground = assets::pick_random(&foreground_dir, &mut rng)?;
    let background = assets::pick_random(&background_dir, &mut rng)?;

    let square_profile = args.slack || args.upload;
    let file_name = assets::output_file_name(
        &foreground,
        &background,
        args.name.as_deref(),
        square_profile,
    );
    let result = compositor::compose(
        &foreground,
        &background,
        &output_dir.join(file_name),
        square_profile,
    )?;

    if square_profile {
        println!("Optimized image for Slack profile photo ({PROFILE_SIZE}x{PROFILE_SIZE})");
    }
    println!("Created layered image: {}", result.display());
    println!("Using foreground: {}", foreground.display());
    println!("Using background: {}", background.display());

    if args.slack {
        println!("\nThis image is optimized for Slack. You can upload it as your profile photo!");
    }

    if args.upload {
        println!("\nUploading the image to Slack as your profile photo...");
        let client = SlackClient::new(&settings.api_url).context("Failed to build HTTP client")?;
        let uploader = Uploader::new(&client, &settings.store_path, settings.env_token.clone());
        let mut observer = ConsoleObserver::default();
        let results = uploader.upload(
            &result,
            args.profiles.as_deref(),
            &mut TerminalPrompt,
            &mut observer,
        );
        observer.finish();
        ui::print_summary(&results?);
    } else if args.profiles.is_some() {
        warn!("--profiles only applies together with --upload");
    }

    Ok(())
}
