pub mod progress;
pub mod size;

pub use progress::{OutputLine, TransferProgress, parse_line};
pub use size::{format_rate, format_size};
