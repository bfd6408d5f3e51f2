use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::ytdlp::is_valid_video_id;

#[derive(Parser)]
#[command(
    name = "yt-captions",
    about = "YouTube captions as timestamped JSON",
    long_about = "Fetches a YouTube video's metadata and caption track through yt-dlp, reshapes the captions into timestamped segments and serves them over HTTP.",
    after_help = "EXAMPLES:\n    # Start the API server\n    yt-captions serve\n\n    # Serve on all interfaces with a custom cookie file\n    yt-captions serve --host 0.0.0.0 --port 8000 --cookies ~/cookies.txt\n\n    # Print timestamped captions from a running server\n    yt-captions fetch dQw4w9WgXcQ\n\n    # Plain transcript in German\n    yt-captions fetch dQw4w9WgXcQ --lang de --plain\n\n    # Check the cookie file\n    yt-captions auth-status --cookies cookies.txt"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(name = "serve")]
    Serve {
        /// Overrides HOST
        #[arg(long)]
        host: Option<String>,

        /// Overrides PORT
        #[arg(long)]
        port: Option<u16>,

        /// Overrides COOKIES_FILE
        #[arg(long)]
        cookies: Option<PathBuf>,

        /// Overrides CAPTION_LANG
        #[arg(long)]
        lang: Option<String>,

        /// Overrides YTDLP_BIN
        #[arg(long)]
        ytdlp_bin: Option<String>,
    },
    #[command(name = "fetch")]
    Fetch {
        #[arg(value_parser = validate_video_id)]
        video_id: String,

        #[arg(long, default_value = "http://127.0.0.1:8000")]
        server_url: String,

        #[arg(long)]
        lang: Option<String>,

        /// Print the plain transcript instead of timestamped segments
        #[arg(long)]
        plain: bool,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },
    #[command(name = "auth-status")]
    AuthStatus {
        #[arg(long, default_value = "cookies.txt")]
        cookies: PathBuf,
    },
}

pub fn validate_video_id(s: &str) -> Result<String, String> {
    let id = s.trim();
    if is_valid_video_id(id) {
        Ok(id.to_string())
    } else {
        Err("Video ID must be exactly 11 characters of letters, digits, '-' or '_'".to_string())
    }
}
