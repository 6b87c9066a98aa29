pub const PARTIAL_EXTENSIONS: &[&str] = &["part", "ytdl"];

pub mod process {

    /// Keeps interactive credential prompts from hanging a background run.
    pub const GIT_ENV: &[(&str, &str)] = &[
        ("GIT_TERMINAL_PROMPT", "0"),
        ("LC_ALL", "C"),
        ("LANG", "C"),
    ];
}

pub mod git {

    /// Branch pushed when `HEAD` names none.
    pub const PUSH_FALLBACK_BRANCH: &str = "master";

    /// Branch pulled when `HEAD` names none, e.g. in a repository without commits.
    pub const PULL_FALLBACK_BRANCH: &str = "main";
}

pub mod transfer {

    pub const EVENT_BUFFER: usize = 64;

    /// Prefix of the progress lines requested from yt-dlp.
    pub const PROGRESS_PREFIX: &str = "progress:";

    pub const PROGRESS_TEMPLATE: &str = "download:progress:%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.speed)s";

    pub const TITLE_PREFIX: &str = "title:";

    pub const FILE_PREFIX: &str = "file:";
}

pub mod limits {

    pub const MAX_DESCRIPTION_CHARS: usize = 300;
}
