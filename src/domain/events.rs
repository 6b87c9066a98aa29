//! Events emitted by a running transfer.
//!
//! A transfer produces any number of [`TransferEvent::Progress`] events
//! followed by exactly one terminal event.

use serde::Serialize;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum TransferEvent {
    Progress {
        percent: u8,
        message: String,
    },
    Finished {
        title: String,
        path: Option<PathBuf>,
    },
    Failed {
        error: String,
    },
    Cancelled,
}

impl TransferEvent {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }

    /// Short status line for display.
    #[must_use]
    pub fn status(&self) -> String {
        match self {
            Self::Progress { message, .. } => message.clone(),
            Self::Finished { title, .. } => format!("Downloaded: {title}"),
            Self::Failed { error } => format!("Error: {error}"),
            Self::Cancelled => "Cancelled".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(
            !TransferEvent::Progress {
                percent: 5,
                message: String::new()
            }
            .is_terminal()
        );
        assert!(TransferEvent::Cancelled.is_terminal());
        assert!(
            TransferEvent::Failed {
                error: "x".to_string()
            }
            .is_terminal()
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = TransferEvent::Progress {
            percent: 42,
            message: "Downloading... 42%".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Progress");
        assert_eq!(json["payload"]["percent"], 42);
    }
}
