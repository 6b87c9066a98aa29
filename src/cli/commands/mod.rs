mod doctor;
mod download;
mod formats;
mod git;
mod info;

pub use doctor::cmd_doctor;
pub use download::cmd_download;
pub use formats::cmd_formats;
pub use git::{PushArgs, cmd_pull, cmd_push};
pub use info::cmd_info;

use crate::quality::QualityOption;

fn print_options(options: &[QualityOption]) {
    println!("Available Qualities:");
    println!("{:-<60}", "");
    for (i, option) in options.iter().enumerate() {
        println!("[{}] {}", i + 1, option.label);
    }
}
