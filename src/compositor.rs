// Compositor: layers a foreground PNG over a background PNG and, for
// profile photos, pads the result to a square and scales it to a fixed size.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, Rgba32FImage, RgbaImage};
use log::{debug, info};

use crate::errors::AvatarError;

/// Edge length of the square profile-photo output.
pub const PROFILE_SIZE: u32 = 512;

const RESAMPLE: FilterType = FilterType::Lanczos3;

/// Composite `foreground` over `background` and write a PNG to `output`.
///
/// The foreground is stretched to the background's size when they differ.
/// With `square_profile` the composite is centered on a transparent square
/// canvas and scaled to `PROFILE_SIZE`×`PROFILE_SIZE`.
pub fn compose(
    foreground: &Path,
    background: &Path,
    output: &Path,
    square_profile: bool,
) -> Result<PathBuf, AvatarError> {
    let fg = load_rgba(foreground)?;
    let bg = load_rgba(background)?;

    let mut composite = layer(&fg, bg);
    if square_profile {
        composite = square_for_profile(&composite);
        debug!("padded and scaled to {PROFILE_SIZE}x{PROFILE_SIZE}");
    }

    composite
        .save_with_format(output, ImageFormat::Png)
        .map_err(|e| AvatarError::io(output, e))?;
    info!("wrote {}", output.display());
    Ok(output.to_path_buf())
}

fn load_rgba(path: &Path) -> Result<RgbaImage, AvatarError> {
    let img = image::open(path).map_err(|source| AvatarError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgba8())
}

/// Alpha-composite `fg` on top of `bg`, resizing `fg` to match if needed.
pub fn layer(fg: &RgbaImage, mut bg: RgbaImage) -> RgbaImage {
    let (width, height) = bg.dimensions();
    if fg.dimensions() != (width, height) {
        debug!(
            "resizing foreground from {:?} to {width}x{height}",
            fg.dimensions()
        );
        let resized = resize_premultiplied(fg, width, height);
        imageops::overlay(&mut bg, &resized, 0, 0);
    } else {
        imageops::overlay(&mut bg, fg, 0, 0);
    }
    bg
}

/// Center `img` on a transparent square canvas and scale it to the profile size.
pub fn square_for_profile(img: &RgbaImage) -> RgbaImage {
    let (width, height) = img.dimensions();
    let size = width.max(height);

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0]));
    let x = (size - width) / 2;
    let y = (size - height) / 2;
    imageops::replace(&mut canvas, img, i64::from(x), i64::from(y));

    resize_premultiplied(&canvas, PROFILE_SIZE, PROFILE_SIZE)
}

/// Resample with colour weighted by alpha, so fully transparent pixels
/// contribute nothing to the colour of their visible neighbours.
pub fn resize_premultiplied(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let premultiplied = Rgba32FImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0.map(|c| f32::from(c) / 255.0);
        Rgba([r * a, g * a, b * a, a])
    });
    let resized = imageops::resize(&premultiplied, width, height, RESAMPLE);

    RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = resized.get_pixel(x, y).0;
        let a = a.clamp(0.0, 1.0);
        if a <= 0.0 {
            return Rgba([0, 0, 0, 0]);
        }
        let channel = |v: f32| ((v / a).clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([channel(r), channel(g), channel(b), (a * 255.0).round() as u8])
    })
}
