use crate::clients::YtDlpClient;
use crate::config::Config;
use crate::domain::TransferEvent;
use crate::models::ContainerFormat;
use crate::quality::{BEST_AUDIO_SELECTOR, QualityOption, find_option};
use crate::services::{DownloadRequest, LookupService, TransferService};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

pub async fn cmd_download(
    config: &Config,
    url: &str,
    quality: Option<&str>,
    container: Option<ContainerFormat>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let service = LookupService::new(YtDlpClient::new(config.ytdlp.clone()));

    println!("Fetching info for: {url}");
    let result = service.lookup(url).await?;

    let option = choose(&result.options, quality)?;

    let (selector, container) = plan(option, container, config.downloads.default_container);
    let output_dir = output.unwrap_or_else(|| config.output_dir());

    println!("Title:   {}", result.info.title);
    println!("Quality: {}", option.label);
    println!("Format:  {container}");
    println!("Saving to: {}", output_dir.display());
    println!();

    let transfer = TransferService::new(config.ytdlp.clone(), &config.downloads);
    let handle = transfer.start(DownloadRequest {
        url: url.to_string(),
        selector,
        container,
        output_dir,
    })?;

    let cancel = handle.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling download");
            cancel.cancel();
        }
    });

    let mut stdout = std::io::stdout();
    let terminal = handle
        .wait(|_, message| {
            // Pad so a shorter status fully overwrites the previous one.
            print!("\r{message:<50}");
            if let Err(e) = stdout.flush() {
                warn!("Failed to flush stdout: {}", e);
            }
        })
        .await;
    ctrl_c.abort();
    println!();

    match &terminal {
        TransferEvent::Finished { path, .. } => {
            println!("✓ {}", terminal.status());
            if let Some(path) = path {
                println!("  {}", path.display());
            }
            Ok(())
        }
        TransferEvent::Failed { .. } => anyhow::bail!("Download failed. {}", terminal.status()),
        TransferEvent::Cancelled | TransferEvent::Progress { .. } => {
            println!("{}", terminal.status());
            Ok(())
        }
    }
}

/// The option named by `quality`, or the first one when none is given.
///
/// An unmatched choice lists the options and fails so the exit status shows it.
fn choose<'a>(
    options: &'a [QualityOption],
    quality: Option<&str>,
) -> anyhow::Result<&'a QualityOption> {
    let chosen = match quality {
        Some(query) => find_option(options, query),
        None => options.first(),
    };

    chosen.ok_or_else(|| {
        super::print_options(options);
        anyhow::anyhow!("No quality matches '{}'", quality.unwrap_or_default())
    })
}

/// Selector and container for a chosen option.
///
/// Audio-only picks default to MP3 output, and MP3 output never fetches video.
fn plan(
    option: &QualityOption,
    container: Option<ContainerFormat>,
    default_container: ContainerFormat,
) -> (String, ContainerFormat) {
    let container = container.unwrap_or(if option.is_audio_only() {
        ContainerFormat::Mp3
    } else {
        default_container
    });

    let selector = if container.is_audio() {
        BEST_AUDIO_SELECTOR.to_string()
    } else {
        option.selector_id.clone()
    };

    (selector, container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{EncodingDescriptor, resolve};

    fn ladder() -> Vec<QualityOption> {
        resolve(&[EncodingDescriptor::video("22", 720)], 0.0)
    }

    #[test]
    fn test_choose_defaults_to_first_option() {
        let options = ladder();
        assert_eq!(choose(&options, None).unwrap().label, options[0].label);
        assert_eq!(choose(&options, Some("audio")).unwrap().label, options[1].label);
    }

    #[test]
    fn test_choose_unmatched_quality_is_an_error() {
        let options = ladder();
        let err = choose(&options, Some("1440p")).unwrap_err();
        assert_eq!(err.to_string(), "No quality matches '1440p'");
        assert!(choose(&[], None).is_err());
    }

    #[test]
    fn test_plan_uses_default_container_for_video() {
        let options = ladder();
        let (selector, container) = plan(&options[0], None, ContainerFormat::Webm);
        assert_eq!(selector, "22");
        assert_eq!(container, ContainerFormat::Webm);
    }

    #[test]
    fn test_plan_audio_option_defaults_to_mp3() {
        let options = ladder();
        let audio = options.last().unwrap();
        let (selector, container) = plan(audio, None, ContainerFormat::Mp4);
        assert_eq!(selector, BEST_AUDIO_SELECTOR);
        assert_eq!(container, ContainerFormat::Mp3);
    }

    #[test]
    fn test_plan_mp3_output_ignores_video_selector() {
        let options = ladder();
        let (selector, container) = plan(&options[0], Some(ContainerFormat::Mp3), ContainerFormat::Mp4);
        assert_eq!(selector, BEST_AUDIO_SELECTOR);
        assert_eq!(container, ContainerFormat::Mp3);
    }
}
