pub mod thumbnail;
pub mod ytdlp;

pub use thumbnail::ThumbnailClient;
pub use ytdlp::{YtDlpClient, YtDlpError};
