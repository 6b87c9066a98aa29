use super::print_options;
use crate::clients::{ThumbnailClient, YtDlpClient};
use crate::config::Config;
use crate::constants::limits::MAX_DESCRIPTION_CHARS;
use crate::parser::format_size;
use crate::services::LookupService;
use std::path::Path;
use tracing::warn;

pub async fn cmd_info(config: &Config, url: &str, thumbnail: Option<&Path>) -> anyhow::Result<()> {
    let service = LookupService::new(YtDlpClient::new(config.ytdlp.clone()));

    println!("Fetching info for: {url}");
    let result = service.lookup(url).await?;
    let info = &result.info;

    println!();
    println!("Video Info");
    println!("{:-<60}", "");
    println!("Title:    {}", info.title);
    println!("Uploader: {}", info.uploader);
    println!("Duration: {}", info.duration_str());
    if let Some(description) = info.description.as_deref().filter(|d| !d.trim().is_empty()) {
        println!("About:    {}", truncate(description.trim(), MAX_DESCRIPTION_CHARS));
    }
    println!();

    print_options(&result.options);

    if let Some(path) = thumbnail {
        println!();
        match &info.thumbnail {
            Some(thumb_url) => match save_thumbnail(thumb_url, path).await {
                Ok(bytes) => println!(
                    "✓ Thumbnail saved to {} ({})",
                    path.display(),
                    format_size(u64::try_from(bytes).unwrap_or(u64::MAX))
                ),
                Err(e) => {
                    warn!("Failed to save thumbnail: {}", e);
                    println!("⚠ Failed to save thumbnail: {e}");
                }
            },
            None => println!("No thumbnail available."),
        }
    }

    println!();
    Ok(())
}

async fn save_thumbnail(url: &str, path: &Path) -> anyhow::Result<usize> {
    ThumbnailClient::new()?.save(url, path).await
}

fn truncate(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let cut: String = single_line.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
