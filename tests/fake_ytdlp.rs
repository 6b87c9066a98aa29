//! Lookup and transfer against a shell script standing in for yt-dlp.
#![cfg(unix)]

use std::path::{Path, PathBuf};
use vigga::clients::{YtDlpClient, YtDlpError};
use vigga::config::{DownloadConfig, YtDlpConfig};
use vigga::domain::TransferEvent;
use vigga::models::ContainerFormat;
use vigga::quality::find_option;
use vigga::services::{DownloadRequest, LookupService, TransferService};

const INFO_JSON: &str = r#"{"title": "Fake Clip", "uploader": "Fake Channel", "duration": 10,
"formats": [
  {"format_id": "140", "vcodec": "none", "acodec": "mp4a.40.2", "tbr": 128},
  {"format_id": "136", "vcodec": "avc1", "acodec": "none", "height": 720, "fps": 30, "filesize": 5242880},
  {"format_id": "298", "vcodec": "avc1", "acodec": "none", "height": 720, "fps": 60, "filesize": 7340032},
  {"format_id": "18", "vcodec": "avc1", "acodec": "mp4a.40.2", "height": 360, "fps": 25, "filesize": 1048576}
]}"#;

/// Writes the fake tool; every invocation records its arguments in `args.txt`.
fn fake_ytdlp(dir: &Path) -> (YtDlpConfig, PathBuf) {
    let args_file = dir.join("args.txt");
    let script = format!(
        r#"printf '%s\n' "$@" > '{args}'
for arg in "$@"; do
  case "$arg" in
    *bad.example*) echo 'ERROR: [generic] Unsupported URL: https://bad.example/x' >&2; exit 1 ;;
  esac
done
for arg in "$@"; do
  case "$arg" in
    --version) echo 2024.12.06; exit 0 ;;
    -J) cat <<'JSON'
{json}
JSON
        exit 0 ;;
  esac
done
echo 'progress:512|1024|NA|2048'
echo 'progress:1024|1024|NA|2048'
echo '[Merger] Merging formats into "out.mp4"'
echo 'title:Fake Clip'
echo 'file:{out}/Fake Clip.mp4'
"#,
        args = args_file.display(),
        json = INFO_JSON,
        out = dir.display(),
    );

    let script_path = dir.join("yt-dlp.sh");
    std::fs::write(&script_path, script).unwrap();

    let config = YtDlpConfig {
        binary: "sh".to_string(),
        binary_args: vec![script_path.to_string_lossy().to_string()],
        ..YtDlpConfig::default()
    };
    (config, args_file)
}

fn recorded_args(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn lookup_resolves_ladder_from_tool_output() {
    let dir = tempfile::tempdir().unwrap();
    let (config, args_file) = fake_ytdlp(dir.path());

    let service = LookupService::new(YtDlpClient::new(config));
    let result = service.lookup("https://example.com/watch?v=1").await.unwrap();

    assert_eq!(result.info.title, "Fake Clip");
    assert_eq!(result.info.uploader, "Fake Channel");

    let labels: Vec<&str> = result.options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(
        labels,
        ["720p 60fps 7MB", "360p 1MB", "Audio only (best available)"]
    );
    assert_eq!(result.options[0].selector_id, "298+bestaudio/298");

    let args = recorded_args(&args_file);
    assert!(args.contains(&"-J".to_string()));
    assert_eq!(args.last().unwrap(), "https://example.com/watch?v=1");
}

#[tokio::test]
async fn lookup_failure_reports_tool_error() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = fake_ytdlp(dir.path());

    let err = LookupService::new(YtDlpClient::new(config))
        .lookup("https://bad.example/x")
        .await
        .unwrap_err();

    assert!(matches!(err, YtDlpError::Failed(_)));
    assert_eq!(
        err.to_string(),
        "[generic] Unsupported URL: https://bad.example/x"
    );
}

#[tokio::test]
async fn version_is_trimmed() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = fake_ytdlp(dir.path());

    let version = YtDlpClient::new(config).version().await.unwrap();
    assert_eq!(version, "2024.12.06");
}

#[tokio::test]
async fn download_chosen_quality() {
    let dir = tempfile::tempdir().unwrap();
    let (config, args_file) = fake_ytdlp(dir.path());
    let url = "https://example.com/watch?v=1";

    let lookup = LookupService::new(YtDlpClient::new(config.clone()));
    let result = lookup.lookup(url).await.unwrap();
    let option = find_option(&result.options, "360p").unwrap();

    let output_dir = dir.path().join("out");
    let transfer = TransferService::new(config, &DownloadConfig::default());
    let handle = transfer
        .start(DownloadRequest {
            url: url.to_string(),
            selector: option.selector_id.clone(),
            container: ContainerFormat::Mp4,
            output_dir: output_dir.clone(),
        })
        .unwrap();

    let mut progress = Vec::new();
    let terminal = handle.wait(|percent, _| progress.push(percent)).await;

    assert_eq!(
        terminal,
        TransferEvent::Finished {
            title: "Fake Clip".to_string(),
            path: Some(dir.path().join("Fake Clip.mp4")),
        }
    );
    assert_eq!(progress.first(), Some(&50));
    assert_eq!(progress.last(), Some(&100));
    assert!(output_dir.is_dir());

    let args = recorded_args(&args_file);
    let selector_at = args.iter().position(|a| a == "-f").unwrap();
    assert_eq!(args[selector_at + 1], "18");
    assert!(args.windows(2).any(|w| w == ["--merge-output-format", "mp4"]));
}
