use crate::clients::YtDlpClient;
use crate::config::Config;

pub async fn cmd_doctor(config: &Config) -> anyhow::Result<()> {
    println!("System Check");
    println!("{:-<60}", "");

    let mut healthy = true;

    match YtDlpClient::new(config.ytdlp.clone()).version().await {
        Ok(version) => println!("✓ yt-dlp  {version} ({})", config.ytdlp.binary),
        Err(e) => {
            healthy = false;
            println!("✗ yt-dlp  {e}");
        }
    }

    match git_version().await {
        Ok(version) => println!("✓ git     {version}"),
        Err(e) => {
            healthy = false;
            println!("✗ git     {e}");
        }
    }

    match Config::locate() {
        Some(path) => println!("✓ config  {}", path.display()),
        None => println!("- config  using defaults (run `vigga init` to create one)"),
    }
    println!("  output  {}", config.output_dir().display());

    println!();
    if healthy {
        println!("All checks passed.");
        Ok(())
    } else {
        anyhow::bail!("Some checks failed")
    }
}

async fn git_version() -> anyhow::Result<String> {
    let output = crate::process::command("git")
        .arg("--version")
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("not runnable: {e}"))?;

    if !output.status.success() {
        anyhow::bail!("git --version exited with {}", output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
