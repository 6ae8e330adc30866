use std::fmt;

use crate::audio::QueueSnapshot;

/// Discord rejects message content longer than this many characters.
pub const MESSAGE_LIMIT: usize = 2000;

/// Respuesta única enviada para cada slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Searching { query: String },
    Skipped,
    Stopped,
    Paused,
    Resumed,
    Queue(QueueSnapshot),
    EmptyQueue,
    NotInVoiceChannel,
    Failed,
}

impl Reply {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::NotInVoiceChannel | Self::Failed)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Searching { query } => write!(f, "Searching: {}", query),
            Self::Skipped => f.write_str("Skipped!"),
            Self::Stopped => f.write_str("Stopped!"),
            Self::Paused => f.write_str("Paused!"),
            Self::Resumed => f.write_str("Resumed!"),
            Self::Queue(snapshot) => f.write_str(&queue_listing(snapshot, MESSAGE_LIMIT)),
            Self::EmptyQueue => f.write_str("No songs playing!"),
            Self::NotInVoiceChannel => f.write_str("You must be in a voice channel!"),
            Self::Failed => f.write_str("Error while processing command!"),
        }
    }
}

/// Crea las líneas `1. nombre (duración)`, cortando en un salto de línea para no pasar de `limit` caracteres.
pub fn queue_listing(snapshot: &QueueSnapshot, limit: usize) -> String {
    let lines: Vec<String> = snapshot
        .songs
        .iter()
        .enumerate()
        .map(|(i, song)| format!("{}. {} ({})", i + 1, song.name, song.formatted_duration()))
        .collect();

    let full = lines.join("\n");
    if full.chars().count() <= limit {
        return full;
    }

    let mut out = String::new();
    let mut used = 0;
    for (shown, line) in lines.iter().enumerate() {
        let trailer = format!("\n…and {} more", lines.len() - shown);
        let separator = usize::from(shown > 0);
        let needed = separator + line.chars().count();

        if used + needed + trailer.chars().count() > limit {
            if shown > 0 {
                out.push_str(&trailer);
            } else {
                out.push_str(trailer.trim_start_matches('\n'));
            }
            return out;
        }

        if shown > 0 {
            out.push('\n');
        }
        out.push_str(line);
        used += needed;
    }

    out
}
