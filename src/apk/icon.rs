use std::fs::File;
use std::path::Path;

use tracing::{debug, warn};

use crate::apk::zip::{self, ZipEntry};

/// Pulls the most likely launcher icon out of an APK. Any failure along
/// the way (unreadable archive, unsupported compression, corrupt entry)
/// yields no icon rather than an error.
pub fn extract_icon(apk_path: &Path) -> Option<Vec<u8>> {
    let mut file = match File::open(apk_path) {
        Ok(file) => file,
        Err(err) => {
            warn!("Cannot open {}: {}", apk_path.display(), err);
            return None;
        }
    };

    let entries = match zip::read_central_directory(&mut file) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Cannot read {}: {}", apk_path.display(), err);
            return None;
        }
    };

    let candidate = select_candidate(&entries)?;
    debug!("Selected icon candidate {}", candidate.name);
    match zip::read_entry(&mut file, candidate) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            warn!("Cannot extract {}: {}", candidate.name, err);
            None
        }
    }
}

/// PNGs beat WebP beat JPEG; within the chosen format, resource
/// directories (`mipmap`/`drawable`) are preferred when any exist, then
/// the highest-scoring name wins with ties going to central-directory
/// order.
fn select_candidate(entries: &[ZipEntry]) -> Option<&ZipEntry> {
    let with_extensions = |extensions: &[&str]| -> Vec<&ZipEntry> {
        entries
            .iter()
            .filter(|entry| {
                let name = entry.name.to_lowercase();
                extensions.iter().any(|extension| name.ends_with(extension))
            })
            .collect()
    };

    let mut pool = with_extensions(&[".png"]);
    if pool.is_empty() {
        pool = with_extensions(&[".webp"]);
    }
    if pool.is_empty() {
        pool = with_extensions(&[".jpg", ".jpeg"]);
    }

    let resource_entries: Vec<&ZipEntry> = pool
        .iter()
        .copied()
        .filter(|entry| {
            let name = entry.name.to_lowercase();
            name.contains("mipmap") || name.contains("drawable")
        })
        .collect();
    if !resource_entries.is_empty() {
        pool = resource_entries;
    }

    let mut best: Option<(&ZipEntry, u32)> = None;
    for entry in pool {
        let entry_score = score(entry);
        match best {
            Some((_, best_score)) if entry_score <= best_score => {}
            _ => best = Some((entry, entry_score)),
        }
    }
    best.map(|(entry, _)| entry)
}

fn score(entry: &ZipEntry) -> u32 {
    let name = entry.name.to_lowercase();
    let mut score = 0;

    if name.contains("ic_launcher") {
        score += 1000;
    }
    if name.contains("ic_launcher_foreground") {
        score += 200;
    }
    if name.contains("app_icon") || name.contains("appicon") {
        score += 400;
    }
    if name.contains("icon") || name.contains("logo") {
        score += 150;
    }

    // xxxhdpi contains xxhdpi contains xhdpi, so densest first.
    score += if name.contains("xxxhdpi") {
        500
    } else if name.contains("xxhdpi") {
        400
    } else if name.contains("xhdpi") {
        300
    } else if name.contains("hdpi") {
        200
    } else if name.contains("mdpi") {
        100
    } else {
        0
    };

    score + (entry.uncompressed_size / 1024).min(200)
}
