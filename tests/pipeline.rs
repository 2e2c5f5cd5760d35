use std::cell::RefCell;
use std::fs;
use std::path::Path;

use daily_avatar::api::{ApiError, PhotoApi};
use daily_avatar::assets;
use daily_avatar::compositor::{self, PROFILE_SIZE};
use daily_avatar::store::{self, CredentialStore, Profile};
use daily_avatar::uploader::{CredentialPrompt, PromptedCredentials, Uploader};
use image::{ImageFormat, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

fn write_png(path: &Path, img: &RgbaImage) {
    img.save_with_format(path, ImageFormat::Png).expect("write fixture");
}

/// 100×100 with an opaque red top-left quadrant, transparent elsewhere.
fn red_quadrant() -> RgbaImage {
    RgbaImage::from_fn(100, 100, |x, y| if x < 50 && y < 50 { RED } else { CLEAR })
}

#[derive(Default)]
struct RecordingApi {
    tokens: RefCell<Vec<String>>,
}

impl PhotoApi for RecordingApi {
    fn set_photo(&self, token: &str, _file_name: &str, _image: Vec<u8>) -> Result<(), ApiError> {
        self.tokens.borrow_mut().push(token.to_string());
        Ok(())
    }
}

struct NoPrompt;

impl CredentialPrompt for NoPrompt {
    fn acquire(&mut self) -> std::io::Result<Option<PromptedCredentials>> {
        panic!("prompt should not be needed");
    }
}

#[test]
fn red_quadrant_over_blue_background() {
    let temp = tempdir().expect("tempdir");
    let fg_dir = temp.path().join("foreground");
    let bg_dir = temp.path().join("background");
    fs::create_dir_all(&fg_dir).unwrap();
    fs::create_dir_all(&bg_dir).unwrap();
    write_png(&fg_dir.join("f1.png"), &red_quadrant());
    write_png(&bg_dir.join("b1.png"), &RgbaImage::from_pixel(100, 100, BLUE));

    let mut rng = StdRng::seed_from_u64(3);
    let fg = assets::pick_random(&fg_dir, &mut rng).expect("foreground");
    let bg = assets::pick_random(&bg_dir, &mut rng).expect("background");
    let name = assets::output_file_name(&fg, &bg, None, false);
    assert_eq!(name, "b1_f1.png");

    let out = compositor::compose(&fg, &bg, &temp.path().join(name), false).expect("compose");
    let img = image::open(&out).expect("decode output").to_rgba8();
    assert_eq!(img.dimensions(), (100, 100));
    for (x, y, p) in img.enumerate_pixels() {
        let expected = if x < 50 && y < 50 { RED } else { BLUE };
        assert_eq!(*p, expected, "pixel ({x}, {y})");
    }
}

#[test]
fn compositing_is_deterministic() {
    let temp = tempdir().expect("tempdir");
    let fg = temp.path().join("fg.png");
    let bg = temp.path().join("bg.png");
    write_png(&fg, &red_quadrant());
    write_png(
        &bg,
        &RgbaImage::from_fn(64, 48, |x, y| Rgba([(x * 4) as u8, (y * 5) as u8, 128, 255])),
    );

    let first = temp.path().join("first.png");
    let second = temp.path().join("second.png");
    compositor::compose(&fg, &bg, &first, false).expect("compose");
    compositor::compose(&fg, &bg, &second, false).expect("compose");
    assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
}

#[test]
fn profile_mode_is_always_square() {
    let temp = tempdir().expect("tempdir");
    let fg = temp.path().join("fg.png");
    write_png(&fg, &red_quadrant());

    for (w, h) in [(300, 120), (40, 90), (512, 512), (1000, 999)] {
        let bg = temp.path().join(format!("bg_{w}x{h}.png"));
        write_png(&bg, &RgbaImage::from_pixel(w, h, BLUE));
        let out = temp.path().join(format!("out_{w}x{h}.png"));

        compositor::compose(&fg, &bg, &out, true).expect("compose");
        let img = image::open(&out).expect("decode output");
        assert_eq!((img.width(), img.height()), (PROFILE_SIZE, PROFILE_SIZE));
    }
}

#[test]
fn existing_output_is_overwritten() {
    let temp = tempdir().expect("tempdir");
    let fg = temp.path().join("fg.png");
    let bg = temp.path().join("bg.png");
    write_png(&fg, &red_quadrant());
    write_png(&bg, &RgbaImage::from_pixel(100, 100, BLUE));
    let out = temp.path().join("out.png");
    fs::write(&out, b"stale").unwrap();

    compositor::compose(&fg, &bg, &out, false).expect("compose");
    assert!(image::open(&out).is_ok());
}

#[test]
fn requested_alias_limits_upload_to_that_profile() {
    let temp = tempdir().expect("tempdir");
    let store_path = temp.path().join("config.json");
    store::save_profiles(
        &store_path,
        vec![Profile::new("work", "xoxp-work"), Profile::new("home", "xoxp-home")],
    )
    .expect("save");
    let image = temp.path().join("avatar.png");
    write_png(&image, &RgbaImage::from_pixel(8, 8, BLUE));

    let api = RecordingApi::default();
    let uploader = Uploader::new(&api, &store_path, None);
    let requested = vec!["work".to_string()];
    let results = uploader
        .upload(&image, Some(requested.as_slice()), &mut NoPrompt, &mut ())
        .expect("upload");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].alias, "work");
    assert!(results[0].success);
    assert_eq!(*api.tokens.borrow(), vec!["xoxp-work".to_string()]);
    assert_eq!(CredentialStore::load(&store_path).profiles.len(), 2);
}
