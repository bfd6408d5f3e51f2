mod captions;
mod cli;
mod client;
mod config;
mod cookies;
mod dto;
mod error;
mod server;
mod source;
mod ytdlp;

use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands};
use config::{ClientConfig, ServerConfig};
use cookies::CookieStatus;
use log::error;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            cookies,
            lang,
            ytdlp_bin,
        } => {
            let mut config = ServerConfig::from_env();
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(cookies) = cookies {
                config.cookies_file = cookies;
            }
            if let Some(lang) = lang {
                config.default_lang = lang;
            }
            if let Some(ytdlp_bin) = ytdlp_bin {
                config.ytdlp_bin = ytdlp_bin;
            }

            if let Err(e) = server::run_server(config).await {
                error!("Server failed: {e}");
                return Err(e.into());
            }
        }
        Commands::Fetch {
            video_id,
            server_url,
            lang,
            plain,
            timeout,
        } => {
            let config = ClientConfig::new(server_url, video_id, lang, plain)
                .with_timeout(Duration::from_secs(timeout));
            client::run_client(config).await?;
        }
        Commands::AuthStatus { cookies } => {
            let status = CookieStatus::inspect(&cookies);
            println!("{}", serde_json::to_string_pretty(&status)?);
            if !status.is_usable() {
                anyhow::bail!("{}", status.message);
            }
        }
    }

    Ok(())
}
