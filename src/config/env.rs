use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    WorkDir,
    FfmpegBin,
    FfprobeBin,
    YoutubeClientId,
    YoutubeClientSecret,
    YoutubeRefreshToken,
    YoutubeTokenUrl,
    YoutubeUploadUrl,
    YoutubeApiUrl,
    UploadChunkSize,
    UploadMaxRetries,
    UploadRetryBackoffMs,
    DownloadTimeoutSecs,
    UploadHttpTimeoutSecs,
    MaxBodyBytes,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::WorkDir => "WORK_DIR",
            EnvKey::FfmpegBin => "FFMPEG_BIN",
            EnvKey::FfprobeBin => "FFPROBE_BIN",
            EnvKey::YoutubeClientId => "YOUTUBE_CLIENT_ID",
            EnvKey::YoutubeClientSecret => "YOUTUBE_CLIENT_SECRET",
            EnvKey::YoutubeRefreshToken => "YOUTUBE_REFRESH_TOKEN",
            EnvKey::YoutubeTokenUrl => "YOUTUBE_TOKEN_URL",
            EnvKey::YoutubeUploadUrl => "YOUTUBE_UPLOAD_URL",
            EnvKey::YoutubeApiUrl => "YOUTUBE_API_URL",
            EnvKey::UploadChunkSize => "UPLOAD_CHUNK_SIZE",
            EnvKey::UploadMaxRetries => "UPLOAD_MAX_RETRIES",
            EnvKey::UploadRetryBackoffMs => "UPLOAD_RETRY_BACKOFF_MS",
            EnvKey::DownloadTimeoutSecs => "DOWNLOAD_TIMEOUT_SECS",
            EnvKey::UploadHttpTimeoutSecs => "UPLOAD_HTTP_TIMEOUT_SECS",
            EnvKey::MaxBodyBytes => "MAX_BODY_BYTES",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
