use std::env;

/// Pipeline configuration loaded from environment variables.
///
/// Keys for optional acquisition sources are `Option`s: a missing key disables
/// that source and the acquisition chain falls through to the next one.
#[derive(Debug, Clone)]
pub struct Config {
    // Store
    pub db_path: String,

    // Video/channel discovery
    pub youtube_api_key: String,

    // Captions provider
    pub captions_api_key: Option<String>,
    pub captions_api_host: Option<String>,

    // Subtitle/audio downloader
    pub ytdlp_bin: String,
    pub cookies_file: String,
    pub proxy_list_url: String,

    // Speech-to-text fallback
    pub whisper_api_url: Option<String>,
    pub whisper_api_key: Option<String>,

    // LLM extraction
    pub openai_api_key: String,
    pub openai_model: String,

    // Transcript cache
    pub transcript_cache_dir: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("BRANDLENS_DB").unwrap_or_else(|_| "brandlens.db".to_string()),
            youtube_api_key: required_env("YOUTUBE_API_KEY"),
            captions_api_key: env::var("CAPTIONS_API_KEY").ok(),
            captions_api_host: env::var("CAPTIONS_API_HOST").ok(),
            ytdlp_bin: env::var("YTDLP_BIN").unwrap_or_else(|_| "yt-dlp".to_string()),
            cookies_file: env::var("YTDLP_COOKIES_FILE")
                .unwrap_or_else(|_| "cookies.txt".to_string()),
            proxy_list_url: env::var("PROXY_LIST_URL")
                .unwrap_or_else(|_| "https://free.redscrape.com/api/proxies".to_string()),
            whisper_api_url: env::var("WHISPER_API_URL").ok(),
            whisper_api_key: env::var("WHISPER_API_KEY").ok(),
            openai_api_key: required_env("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string()),
            transcript_cache_dir: env::var("TRANSCRIPT_CACHE_DIR")
                .unwrap_or_else(|_| "transcript_cache".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
