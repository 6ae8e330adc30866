//! # Audio Module
//!
//! Playback-queue engine used by the slash commands.
//!
//! The dispatcher only talks to the [`QueueEngine`] trait. The production
//! implementation is [`player::SongbirdEngine`], which keeps one songbird
//! `Call` per guild and uses songbird's built-in track queue; tests swap in a
//! mock.
//!
//! Every operation returns an explicit [`EngineError`] instead of panicking or
//! silently doing nothing, so callers can decide what to tell the user.

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, UserId};
use thiserror::Error;

pub mod player;
pub mod queue;

pub use queue::{QueueSnapshot, QueuedSong};

/// Everything the engine needs to start playing a query for a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRequest {
    pub guild_id: GuildId,
    /// Voice channel the caller is connected to.
    pub voice_channel_id: ChannelId,
    /// Text channel the command was issued from; follow-up notices go here.
    pub text_channel_id: ChannelId,
    pub member: UserId,
    pub query: String,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no active voice session for guild {0}")]
    NoSession(GuildId),
    #[error("nothing is playing")]
    NothingPlaying,
    #[error("there is no track up next")]
    NoUpNext,
    #[error("the current track is already paused")]
    AlreadyPaused,
    #[error("the current track is already playing")]
    AlreadyPlaying,
    #[error("empty search query")]
    EmptyQuery,
    #[error("queue is full (max {0} tracks)")]
    QueueFull(usize),
    #[error("failed to join voice channel: {0}")]
    Join(#[from] songbird::error::JoinError),
    #[error("track control failed: {0}")]
    Control(#[from] songbird::error::ControlError),
    #[error("could not resolve audio: {0}")]
    Resolve(#[from] crate::sources::SourceError),
}

/// Per-guild playback operations backing the slash commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueEngine: Send + Sync {
    /// Starts resolving `request.query` and enqueues the result in the caller's channel.
    /// Playlist links enqueue every entry that still fits in the queue.
    ///
    /// Returns once the request is accepted; the search itself runs in the background.
    async fn play(&self, request: PlayRequest) -> Result<(), EngineError>;

    async fn skip(&self, guild_id: GuildId) -> Result<(), EngineError>;

    /// Stops the current track and clears the queue.
    async fn stop(&self, guild_id: GuildId) -> Result<(), EngineError>;

    async fn pause(&self, guild_id: GuildId) -> Result<(), EngineError>;

    async fn resume(&self, guild_id: GuildId) -> Result<(), EngineError>;

    /// Current queue, or `None` when the guild has no session or nothing queued.
    async fn queue(&self, guild_id: GuildId) -> Option<QueueSnapshot>;
}
