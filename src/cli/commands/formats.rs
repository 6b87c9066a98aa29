use super::print_options;
use crate::clients::YtDlpClient;
use crate::config::Config;
use crate::services::LookupService;

pub async fn cmd_formats(config: &Config, url: &str, json: bool) -> anyhow::Result<()> {
    let service = LookupService::new(YtDlpClient::new(config.ytdlp.clone()));
    let result = service.lookup(url).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.options)?);
        return Ok(());
    }

    println!("{}", result.info.title);
    println!();
    print_options(&result.options);
    Ok(())
}
