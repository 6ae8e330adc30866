use serde::Deserialize;
use songbird::input::{AudioStreamError, Compose, Input, YoutubeDl};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::audio::QueuedSong;

const SPOTIFY_OEMBED_URL: &str = "https://open.spotify.com/oembed";

/// How a `/play` query is handed to yt-dlp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// A direct http(s) link to a single video or track.
    Link,
    /// A YouTube playlist or SoundCloud set, expanded entry by entry.
    Playlist,
    /// A Spotify track link, played from a YouTube search on its title.
    SpotifyTrack,
    /// A Spotify album, playlist or artist link.
    SpotifyCollection,
    /// Free text searched on YouTube.
    Search,
}

impl QueryKind {
    pub fn classify(query: &str) -> Self {
        let url = match Url::parse(query.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => return Self::Search,
        };

        let Some(host) = url.host_str() else {
            return Self::Search;
        };
        let host = host.trim_start_matches("www.");
        let path = url.path();

        if host == "open.spotify.com" {
            return if path.contains("/track/") {
                Self::SpotifyTrack
            } else {
                Self::SpotifyCollection
            };
        }

        let youtube_playlist = host.ends_with("youtube.com")
            && path == "/playlist"
            && url.query_pairs().any(|(key, _)| key == "list");
        let soundcloud_set = host.ends_with("soundcloud.com") && path.contains("/sets/");

        if youtube_playlist || soundcloud_set {
            Self::Playlist
        } else {
            Self::Link
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Stream(#[from] AudioStreamError),
    #[error("could not run yt-dlp: {0}")]
    Process(#[from] std::io::Error),
    #[error("yt-dlp error: {0}")]
    YtDlp(String),
    #[error("playlist has no playable entries")]
    EmptyPlaylist,
    #[error("Spotify lookup failed: {0}")]
    Spotify(#[from] reqwest::Error),
    #[error("only Spotify track links are supported")]
    UnsupportedSpotifyLink,
}

/// A query resolved to a playable input plus the metadata shown in `/queue`.
pub struct ResolvedTrack {
    pub input: Input,
    pub song: QueuedSong,
}

/// One line of `yt-dlp --flat-playlist --dump-json`.
#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    title: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SpotifyEmbed {
    title: String,
}

/// Resolves a link, playlist or search query into at most `limit` playable tracks.
///
/// Fails when yt-dlp finds nothing or cannot read the link.
pub async fn resolve(
    client: reqwest::Client,
    query: &str,
    limit: usize,
) -> Result<Vec<ResolvedTrack>, SourceError> {
    let query = query.trim();
    let kind = QueryKind::classify(query);
    debug!("🔎 Resolviendo consulta {:?}: {}", kind, query);

    let tracks = match kind {
        QueryKind::Link => vec![resolve_single(YoutubeDl::new(client, query.to_string()), query).await?],
        QueryKind::Search => {
            vec![resolve_single(YoutubeDl::new_search(client, query.to_string()), query).await?]
        }
        QueryKind::SpotifyTrack => {
            let title = spotify_title(&client, query).await?;
            info!("🟢 Link de Spotify '{}' buscado como '{}'", query, title);
            vec![resolve_single(YoutubeDl::new_search(client, title.clone()), &title).await?]
        }
        QueryKind::SpotifyCollection => return Err(SourceError::UnsupportedSpotifyLink),
        QueryKind::Playlist => expand_playlist(client, query, limit).await?,
    };

    info!("✅ '{}' resuelto en {} track(s)", query, tracks.len());
    Ok(tracks)
}

async fn resolve_single(mut source: YoutubeDl<'static>, fallback_name: &str) -> Result<ResolvedTrack, SourceError> {
    let metadata = source.aux_metadata().await?;
    let name = metadata
        .title
        .or(metadata.track)
        .unwrap_or_else(|| fallback_name.to_string());

    Ok(ResolvedTrack {
        input: source.into(),
        song: QueuedSong::new(name, metadata.duration),
    })
}

async fn expand_playlist(
    client: reqwest::Client,
    url: &str,
    limit: usize,
) -> Result<Vec<ResolvedTrack>, SourceError> {
    info!("📋 Expandiendo playlist: {}", url);

    let output = async_process::Command::new("yt-dlp")
        .args([
            "--flat-playlist",
            "--dump-json",
            "--playlist-end",
            &limit.to_string(),
            "--no-warnings",
            url,
        ])
        .output()
        .await?;

    if !output.status.success() {
        let error = String::from_utf8_lossy(&output.stderr);
        return Err(SourceError::YtDlp(error.trim().to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let entries = parse_playlist(&stdout, limit);
    if entries.is_empty() {
        return Err(SourceError::EmptyPlaylist);
    }

    Ok(entries
        .into_iter()
        .map(|(entry_url, song)| ResolvedTrack {
            input: YoutubeDl::new(client.clone(), entry_url).into(),
            song,
        })
        .collect())
}

/// Reads flat playlist entries as `(url, song)` pairs, skipping lines without a usable url.
fn parse_playlist(stdout: &str, limit: usize) -> Vec<(String, QueuedSong)> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<PlaylistEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Entrada de playlist ilegible, saltando: {}", e);
                None
            }
        })
        .filter_map(|entry| {
            let url = entry.webpage_url.or(entry.url)?;
            let name = entry.title.unwrap_or_else(|| url.clone());
            let duration = entry
                .duration
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64);
            Some((url, QueuedSong::new(name, duration)))
        })
        .take(limit)
        .collect()
}

async fn spotify_title(client: &reqwest::Client, url: &str) -> Result<String, SourceError> {
    let embed: SpotifyEmbed = client
        .get(SPOTIFY_OEMBED_URL)
        .query(&[("url", url)])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(embed.title)
}
