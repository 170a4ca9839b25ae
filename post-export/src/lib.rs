//! Serialization of scraped posts to CSV or JSON and writing them to disk.

use chrono::{DateTime, Local};
use scraper_core::{CoreError, OutputFormat, Post};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod csv;

#[cfg(test)]
mod tests;

/// Render posts in the given format. Both formats use the same field order.
pub fn render(posts: &[Post], format: OutputFormat) -> Result<Vec<u8>, CoreError> {
    match format {
        OutputFormat::Csv => Ok(csv::render_csv(posts)),
        OutputFormat::Json => {
            let mut bytes = serde_json::to_vec_pretty(posts)?;
            bytes.push(b'\n');
            Ok(bytes)
        }
    }
}

/// `tumblr_posts_YYYYmmdd_HHMMSS.{ext}`
pub fn default_filename(format: OutputFormat, at: DateTime<Local>) -> String {
    format!(
        "tumblr_posts_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// File name for one blog of a batch run, e.g. `staff_tumblr_com_posts.csv`.
pub fn batch_filename(blog: &str, format: OutputFormat) -> String {
    format!("{}_posts.{}", blog.replace('.', "_"), format.extension())
}

/// Write `posts` to `output_dir/filename`, creating the directory if needed.
///
/// Nothing is written for an empty result and `Ok(None)` is returned.
pub fn save_posts(
    posts: &[Post],
    format: OutputFormat,
    output_dir: &Path,
    filename: &str,
) -> Result<Option<PathBuf>, CoreError> {
    if posts.is_empty() {
        warn!("No posts to save, skipping {}", filename);
        return Ok(None);
    }

    let bytes = render(posts, format)?;
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(filename);
    fs::write(&path, bytes)?;

    info!("Saved {} posts to {}", posts.len(), path.display());
    Ok(Some(path))
}
