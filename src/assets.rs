// Asset selection: pick one PNG at random from a folder, and derive the
// name of the file the composite is written to.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::errors::AvatarError;

pub const IMAGE_EXTENSION: &str = "png";
const PROFILE_PREFIX: &str = "slack_profile_";

/// Pick one `.png` file from `dir` uniformly at random.
///
/// A missing directory is created so the user knows where to put images,
/// but the call still fails because there is nothing to choose from.
pub fn pick_random<R: Rng + ?Sized>(dir: &Path, rng: &mut R) -> Result<PathBuf, AvatarError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| AvatarError::io(dir, e))?;
        return Err(AvatarError::NotFound(format!(
            "Created directory '{}', but it's empty. Please add PNG images to this folder.",
            dir.display()
        )));
    }

    let candidates = list_images(dir)?;
    let chosen = candidates.choose(rng).cloned().ok_or_else(|| {
        AvatarError::NotFound(format!(
            "No PNG files found in '{}'. Please add some PNG images to this folder.",
            dir.display()
        ))
    })?;
    debug!(
        "picked {} out of {} candidates in {}",
        chosen.display(),
        candidates.len(),
        dir.display()
    );
    Ok(chosen)
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, AvatarError> {
    let entries = fs::read_dir(dir).map_err(|e| AvatarError::io(dir, e))?;
    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AvatarError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        }
    }
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| {
            n.to_ascii_lowercase()
                .ends_with(&format!(".{IMAGE_EXTENSION}"))
        })
        .unwrap_or(false)
}

/// Name of the output file: `name.png` when given, otherwise
/// `{background}_{foreground}.png`, prefixed for profile-photo output.
pub fn output_file_name(
    foreground: &Path,
    background: &Path,
    name: Option<&str>,
    square_profile: bool,
) -> String {
    if let Some(name) = name {
        return format!("{name}.{IMAGE_EXTENSION}");
    }
    let stem = |p: &Path| {
        p.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let file_name = format!(
        "{}_{}.{IMAGE_EXTENSION}",
        stem(background),
        stem(foreground)
    );
    if square_profile {
        format!("{PROFILE_PREFIX}{file_name}")
    } else {
        file_name
    }
}
