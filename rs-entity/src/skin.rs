use std::collections::{HashMap, HashSet};
use std::thread;

use bevy::prelude::{Resource, Vec2};
use crossbeam::channel::{Receiver, Sender, unbounded};
use image::{Rgba, RgbaImage};
use rs_utils::{is_url, next_pow2};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SkinError {
    #[error("failed to fetch skin: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("failed to decode skin: {0}")]
    Decode(#[from] image::ImageError),
    #[error("unsupported skin dimensions {width}x{height}")]
    InvalidLayout { width: u32, height: u32 },
}

/// Texture layout of a player skin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SkinType {
    #[default]
    Skin64x32,
    Skin64x64,
    /// 64x64 with 3 pixel wide arms.
    Skin64x64Slim,
    Invalid,
}

/// Classifies a skin by its dimensions. Square skins whose probe pixel at
/// (54, 20) is transparent use the slim arm layout.
pub fn skin_type(image: &RgbaImage) -> SkinType {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return SkinType::Invalid;
    }
    if width == height * 2 {
        return SkinType::Skin64x32;
    }
    if width != height {
        return SkinType::Invalid;
    }
    let scale = width / 64;
    let (x, y) = (54 * scale, 20 * scale);
    if x >= width || y >= height {
        return SkinType::Invalid;
    }
    if image.get_pixel(x, y)[3] >= 127 {
        SkinType::Skin64x64
    } else {
        SkinType::Skin64x64Slim
    }
}

/// Pads `image` with transparent pixels up to power-of-two dimensions.
/// Returns the image and the fraction of each axis holding real data; an
/// image that is already a power of two is returned as is.
pub fn ensure_pow2(image: RgbaImage) -> (RgbaImage, Vec2) {
    let (width, height) = image.dimensions();
    let (pow_w, pow_h) = (next_pow2(width), next_pow2(height));
    if pow_w == width && pow_h == height {
        return (image, Vec2::ONE);
    }

    let mut padded = RgbaImage::new(pow_w, pow_h);
    image::imageops::replace(&mut padded, &image, 0, 0);
    let scale = Vec2::new(
        (width as f32 / pow_w as f32).min(1.0),
        (height as f32 / pow_h as f32).min(1.0),
    );
    (padded, scale)
}

/// Clears pure white and pure black pixels from the hat layer, but only
/// when the whole layer is opaque. Old skins often fill it with a solid
/// colour that would otherwise cover the head.
pub fn clear_hat(image: &mut RgbaImage, skin_type: SkinType) {
    let (width, height) = image.dimensions();
    let size_x = (width / 64) * 32;
    let y_scale = if skin_type == SkinType::Skin64x32 { 32 } else { 64 };
    let size_y = (height / y_scale) * 16;
    if size_x == 0 || size_y == 0 {
        return;
    }

    for y in 0..size_y {
        for x in size_x..size_x * 2 {
            if image.get_pixel(x, y)[3] != 255 {
                return;
            }
        }
    }

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    for y in 0..size_y {
        for x in size_x..size_x * 2 {
            let pixel = image.get_pixel_mut(x, y);
            if *pixel == WHITE || *pixel == BLACK {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        }
    }
}

/// A decoded skin ready to upload.
#[derive(Debug)]
pub struct ProcessedSkin {
    pub image: RgbaImage,
    pub skin_type: SkinType,
    pub uv_scale: Vec2,
}

/// Decodes, pads and classifies downloaded skin bytes.
pub fn process_skin(data: &[u8], uses_human_skin: bool) -> Result<ProcessedSkin, SkinError> {
    let decoded = image::load_from_memory(data)?.to_rgba8();
    let (mut image, uv_scale) = ensure_pow2(decoded);
    let skin_type = skin_type(&image);
    if skin_type == SkinType::Invalid {
        let (width, height) = image.dimensions();
        return Err(SkinError::InvalidLayout { width, height });
    }
    if uses_human_skin {
        clear_hat(&mut image, skin_type);
    }
    Ok(ProcessedSkin {
        image,
        skin_type,
        uv_scale,
    })
}

/// Outcome of a skin download. `data` is `None` when the fetch failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResult {
    pub key: String,
    pub data: Option<Vec<u8>>,
}

/// Asynchronous skin fetching, observed by polling.
pub trait SkinSource {
    /// Queues a download. Repeated requests for a pending key are ignored.
    fn request(&mut self, key: &str);
    /// Takes the finished result for `key`, or `None` while it is pending.
    fn poll(&mut self, key: &str) -> Option<FetchResult>;
    /// Abandons `key`. A result still in flight is discarded on arrival.
    fn forget(&mut self, key: &str);
}

/// Downloads skins on a worker thread. Player names resolve against the
/// configured skin server; URLs are fetched directly.
#[derive(Resource)]
pub struct SkinDownloader {
    request_tx: Sender<String>,
    result_rx: Receiver<FetchResult>,
    requested: HashSet<String>,
    completed: HashMap<String, FetchResult>,
    abandoned: HashSet<String>,
}

impl SkinDownloader {
    pub fn new(skin_server: impl Into<String>) -> Self {
        let skin_server = skin_server.into();
        let (request_tx, request_rx) = unbounded::<String>();
        let (result_tx, result_rx) = unbounded::<FetchResult>();
        thread::spawn(move || skin_worker(skin_server, request_rx, result_tx));
        Self::from_channels(request_tx, result_rx)
    }

    pub(crate) fn from_channels(request_tx: Sender<String>, result_rx: Receiver<FetchResult>) -> Self {
        Self {
            request_tx,
            result_rx,
            requested: HashSet::new(),
            completed: HashMap::new(),
            abandoned: HashSet::new(),
        }
    }

    fn drain_results(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            if self.abandoned.remove(&result.key) {
                continue;
            }
            self.completed.insert(result.key.clone(), result);
        }
    }
}

impl SkinSource for SkinDownloader {
    fn request(&mut self, key: &str) {
        if self.requested.insert(key.to_owned()) {
            let _ = self.request_tx.send(key.to_owned());
        }
    }

    fn poll(&mut self, key: &str) -> Option<FetchResult> {
        self.drain_results();
        let result = self.completed.remove(key)?;
        self.requested.remove(key);
        Some(result)
    }

    fn forget(&mut self, key: &str) {
        self.drain_results();
        if !self.requested.remove(key) {
            return;
        }
        if self.completed.remove(key).is_none() {
            self.abandoned.insert(key.to_owned());
        }
        debug!(skin = %key, "skin request abandoned");
    }
}

pub fn skin_url(skin_server: &str, key: &str) -> String {
    if is_url(key) {
        key.to_owned()
    } else {
        format!("{skin_server}{key}.png")
    }
}

fn skin_worker(skin_server: String, request_rx: Receiver<String>, result_tx: Sender<FetchResult>) {
    let client = reqwest::blocking::Client::new();
    while let Ok(key) = request_rx.recv() {
        let url = skin_url(&skin_server, &key);
        let data = match fetch(&client, &url) {
            Ok(bytes) => {
                debug!(%url, len = bytes.len(), "skin downloaded");
                Some(bytes)
            }
            Err(err) => {
                warn!(%url, "{err}");
                None
            }
        };
        if result_tx.send(FetchResult { key, data }).is_err() {
            break;
        }
    }
}

fn fetch(client: &reqwest::blocking::Client, url: &str) -> Result<Vec<u8>, SkinError> {
    let response = client.get(url).send()?.error_for_status()?;
    Ok(response.bytes()?.to_vec())
}
