use std::time::Duration;

/// Metadata attached to every track enqueued on a songbird call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedSong {
    pub name: String,
    pub duration: Option<Duration>,
}

impl QueuedSong {
    pub fn new(name: impl Into<String>, duration: Option<Duration>) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }

    /// `mm:ss`, or `hh:mm:ss` past the hour. Tracks without a known length are live streams.
    pub fn formatted_duration(&self) -> String {
        match self.duration {
            Some(duration) => format_duration(duration),
            None => "Live".to_string(),
        }
    }
}

/// Point-in-time view of a guild's queue, current track first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub songs: Vec<QueuedSong>,
}

impl QueueSnapshot {
    pub fn new(songs: Vec<QueuedSong>) -> Self {
        Self { songs }
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn total_duration(&self) -> Duration {
        self.songs.iter().filter_map(|song| song.duration).sum()
    }
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
