use std::time::Duration;

use anyhow::{Result, anyhow};
use reqwest::Url;
use serde_json::Value;

use crate::config::ClientConfig;

fn endpoint_url(config: &ClientConfig, endpoint: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/{}/{}", config.server_url, endpoint, config.video_id))
        .map_err(|e| anyhow!("Invalid server URL {}: {}", config.server_url, e))?;
    if let Some(lang) = &config.lang {
        url.query_pairs_mut().append_pair("lang", lang);
    }
    Ok(url)
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))
}

pub async fn send_caption_request(config: &ClientConfig) -> Result<Value> {
    let client = http_client(config.timeout)?;
    let endpoint = if config.plain { "transcript" } else { "video-info" };
    let url = endpoint_url(config, endpoint)?;

    println!("🚀 Requesting: {url}");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| anyhow!("Failed to send request: {}", e))?;

    let status = response.status();
    let response_text = response
        .text()
        .await
        .map_err(|e| anyhow!("Failed to read response: {}", e))?;

    if !status.is_success() {
        let detail = serde_json::from_str::<Value>(&response_text)
            .ok()
            .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(response_text);
        return Err(anyhow!("Server returned error {}: {}", status, detail));
    }

    let json: Value = serde_json::from_str(&response_text)
        .map_err(|e| anyhow!("Failed to parse JSON response: {}", e))?;

    Ok(json)
}

pub async fn check_server_health(server_url: &str, timeout: Duration) -> Result<()> {
    let client = http_client(timeout)?;

    println!("🔍 Checking server health at: {server_url}/health");

    let response = client
        .get(format!("{server_url}/health"))
        .send()
        .await
        .map_err(|e| anyhow!("Failed to connect to server: {}", e))?;

    if response.status().is_success() {
        println!("✅ Server is healthy");
        Ok(())
    } else {
        Err(anyhow!("Server health check failed: {}", response.status()))
    }
}

/// Renders a `/video-info` response the way it is read on screen.
pub fn render_video_info(data: &Value) -> String {
    let field = |key: &str| match &data[key] {
        Value::Null => "N/A".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let mut out = String::new();
    out.push_str(&format!("Video ID: {}\n", field("video_id")));
    out.push_str(&format!("Title: {}\n", field("title")));
    out.push_str(&format!("Duration: {} seconds\n", field("duration")));
    out.push_str(&format!("Uploader: {}\n", field("uploader")));
    out.push_str(&format!("Caption Type: {}\n", field("caption_type")));
    out.push_str(&format!("Success: {}\n", field("success")));
    out.push_str(&"=".repeat(80));
    out.push_str("\n\n");

    match data["captions"].as_array() {
        Some(captions) if !captions.is_empty() => {
            for (i, caption) in captions.iter().enumerate() {
                out.push_str(&format!(
                    "[{:3}] {} - {}: {}\n",
                    i + 1,
                    caption["start"].as_str().unwrap_or("00:00"),
                    caption["end"].as_str().unwrap_or("00:00"),
                    caption["text"].as_str().unwrap_or("")
                ));
            }
        }
        _ => {
            out.push_str("No captions found for this video.\n");
            out.push_str(&format!("Message: {}\n", field("message")));
        }
    }

    out
}

pub async fn run_client(config: ClientConfig) -> Result<()> {
    println!("🎬 YouTube Captions Client");
    println!("==========================");
    println!("📺 Video: {}", config.video_id);
    println!();

    if let Err(e) = check_server_health(&config.server_url, config.timeout).await {
        eprintln!("❌ {e}");
        eprintln!("💡 Make sure the server is running: yt-captions serve");
        return Err(e);
    }

    match send_caption_request(&config).await {
        Ok(result) => {
            println!();
            if config.plain {
                println!("📝 {}", result["video_name"].as_str().unwrap_or("Unknown Title"));
                println!("{}", result["transcript"].as_str().unwrap_or(""));
            } else {
                print!("{}", render_video_info(&result));
                let count = result["captions"].as_array().map_or(0, Vec::len);
                println!("✅ Found {count} caption segments");
            }
        }
        Err(e) => {
            eprintln!("❌ Caption request failed: {e}");
            return Err(e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_endpoint_urls() {
        let config = ClientConfig::new(
            "http://localhost:8000/".into(),
            "dQw4w9WgXcQ".into(),
            Some("de".into()),
            false,
        );
        assert_eq!(
            endpoint_url(&config, "video-info").unwrap().as_str(),
            "http://localhost:8000/video-info/dQw4w9WgXcQ?lang=de"
        );

        let config = ClientConfig::new("http://localhost:8000".into(), "dQw4w9WgXcQ".into(), None, true);
        assert_eq!(
            endpoint_url(&config, "transcript").unwrap().as_str(),
            "http://localhost:8000/transcript/dQw4w9WgXcQ"
        );
    }

    #[test]
    fn lang_is_encoded_as_a_single_query_pair() {
        let config = ClientConfig::new(
            "http://localhost:8000".into(),
            "dQw4w9WgXcQ".into(),
            Some("pt BR&x=1#frag".into()),
            false,
        );
        let url = endpoint_url(&config, "video-info").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, [("lang".to_string(), "pt BR&x=1#frag".to_string())]);
        assert_eq!(url.path(), "/video-info/dQw4w9WgXcQ");
        assert!(url.fragment().is_none());
    }

    #[test]
    fn unparseable_server_url_is_an_error() {
        let config = ClientConfig::new("not a url".into(), "dQw4w9WgXcQ".into(), None, false);
        assert!(endpoint_url(&config, "video-info").is_err());
    }

    #[test]
    fn client_config_carries_request_timeout() {
        let config = ClientConfig::new("http://localhost:8000".into(), "dQw4w9WgXcQ".into(), None, false)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(http_client(config.timeout).is_ok());
    }

    #[test]
    fn renders_numbered_segments() {
        let data = serde_json::json!({
            "video_id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "duration": 212.0,
            "uploader": null,
            "caption_type": "automatic",
            "success": true,
            "captions": [
                {"start": "00:00", "end": "00:01", "text": "never gonna"},
                {"start": "01:01", "end": "01:02", "text": "give you up"}
            ]
        });
        let out = render_video_info(&data);
        assert!(out.contains("Title: Never Gonna Give You Up\n"));
        assert!(out.contains("Uploader: N/A\n"));
        assert!(out.contains("[  1] 00:00 - 00:01: never gonna\n"));
        assert!(out.contains("[  2] 01:01 - 01:02: give you up\n"));
    }

    #[test]
    fn renders_missing_captions_message() {
        let data = serde_json::json!({"captions": [], "message": "nothing here"});
        let out = render_video_info(&data);
        assert!(out.contains("No captions found for this video.\nMessage: nothing here\n"));
    }
}
