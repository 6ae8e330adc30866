use async_trait::async_trait;
use serenity::{http::Http, model::id::GuildId};
use songbird::{
    tracks::{PlayMode, Track, TrackHandle},
    Call, Songbird,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    audio::{EngineError, PlayRequest, QueueEngine, QueueSnapshot, QueuedSong},
    sources,
};

/// Queue engine backed by songbird's built-in per-call track queue.
#[derive(Clone)]
pub struct SongbirdEngine {
    manager: Arc<Songbird>,
    http: Arc<Http>,
    client: reqwest::Client,
    volume: f32,
    max_queue_size: usize,
}

impl SongbirdEngine {
    pub fn new(manager: Arc<Songbird>, http: Arc<Http>, volume: f32, max_queue_size: usize) -> Self {
        Self {
            manager,
            http,
            client: reqwest::Client::new(),
            volume,
            max_queue_size,
        }
    }

    fn session(&self, guild_id: GuildId) -> Result<Arc<Mutex<Call>>, EngineError> {
        self.manager
            .get(guild_id)
            .ok_or(EngineError::NoSession(guild_id))
    }

    /// Joins the caller's channel, resolves the query and enqueues what fits.
    ///
    /// Capacity is checked again under the call lock, so concurrent `/play`s
    /// never push the queue past `max_queue_size`.
    async fn enqueue(&self, request: &PlayRequest) -> Result<usize, EngineError> {
        let call = self
            .manager
            .join(request.guild_id, request.voice_channel_id)
            .await?;

        let resolved = sources::resolve(self.client.clone(), &request.query, self.max_queue_size).await?;

        let mut handler = call.lock().await;
        let room = free_slots(handler.queue().len(), self.max_queue_size);
        if room == 0 {
            return Err(EngineError::QueueFull(self.max_queue_size));
        }
        if resolved.len() > room {
            warn!(
                "Cola del servidor {} con espacio para {} de {} tracks resueltos",
                request.guild_id,
                room,
                resolved.len()
            );
        }

        let mut queued = 0;
        for track in resolved.into_iter().take(room) {
            debug!("➕ Encolando '{}' ({})", track.song.name, track.song.formatted_duration());
            let track = Track::new_with_data(track.input, Arc::new(track.song)).volume(self.volume);
            handler.enqueue(track).await;
            queued += 1;
        }

        info!(
            "➕ Agregados {} track(s) en servidor {} ({} en cola, pedido por {})",
            queued,
            request.guild_id,
            handler.queue().len(),
            request.member
        );

        Ok(queued)
    }

    async fn report_failure(&self, request: &PlayRequest, err: &EngineError) {
        let notice = format!("Could not play **{}**: {}", request.query, err);
        let http: &Http = &self.http;

        if let Err(e) = request.text_channel_id.say(http, notice).await {
            warn!(
                "No se pudo avisar el fallo en el canal {}: {:?}",
                request.text_channel_id, e
            );
        }
    }
}

#[async_trait]
impl QueueEngine for SongbirdEngine {
    async fn play(&self, request: PlayRequest) -> Result<(), EngineError> {
        if request.query.trim().is_empty() {
            return Err(EngineError::EmptyQuery);
        }

        // Rechazo temprano si la cola ya está llena; `enqueue` vuelve a comprobar con el lock.
        if let Some(call) = self.manager.get(request.guild_id) {
            let queued = call.lock().await.queue().len();
            if free_slots(queued, self.max_queue_size) == 0 {
                return Err(EngineError::QueueFull(self.max_queue_size));
            }
        }

        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.enqueue(&request).await {
                error!(
                    "❌ No se pudo reproducir '{}' en servidor {}: {:?}",
                    request.query, request.guild_id, e
                );
                engine.report_failure(&request, &e).await;
            }
        });

        Ok(())
    }

    async fn skip(&self, guild_id: GuildId) -> Result<(), EngineError> {
        let call = self.session(guild_id)?;
        let handler = call.lock().await;
        let queue = handler.queue();

        match queue.len() {
            0 => return Err(EngineError::NothingPlaying),
            1 => return Err(EngineError::NoUpNext),
            _ => {}
        }

        queue.skip()?;
        info!("⏭️ Track saltado en servidor {}", guild_id);
        Ok(())
    }

    async fn stop(&self, guild_id: GuildId) -> Result<(), EngineError> {
        let call = self.session(guild_id)?;
        let handler = call.lock().await;
        let queue = handler.queue();

        if queue.is_empty() {
            return Err(EngineError::NothingPlaying);
        }

        queue.stop();
        info!("⏹️ Reproducción detenida y cola limpiada en servidor {}", guild_id);
        Ok(())
    }

    async fn pause(&self, guild_id: GuildId) -> Result<(), EngineError> {
        let call = self.session(guild_id)?;
        let handler = call.lock().await;
        let current = current_track(&handler)?;

        if current.get_info().await?.playing == PlayMode::Pause {
            return Err(EngineError::AlreadyPaused);
        }

        handler.queue().pause()?;
        info!("⏸️ Reproducción pausada en servidor {}", guild_id);
        Ok(())
    }

    async fn resume(&self, guild_id: GuildId) -> Result<(), EngineError> {
        let call = self.session(guild_id)?;
        let handler = call.lock().await;
        let current = current_track(&handler)?;

        if current.get_info().await?.playing == PlayMode::Play {
            return Err(EngineError::AlreadyPlaying);
        }

        handler.queue().resume()?;
        info!("▶️ Reproducción reanudada en servidor {}", guild_id);
        Ok(())
    }

    async fn queue(&self, guild_id: GuildId) -> Option<QueueSnapshot> {
        let call = self.manager.get(guild_id)?;
        let handler = call.lock().await;

        let songs: Vec<QueuedSong> = handler
            .queue()
            .current_queue()
            .iter()
            .map(|handle| handle.data::<QueuedSong>().as_ref().clone())
            .collect();

        if songs.is_empty() {
            return None;
        }

        let snapshot = QueueSnapshot::new(songs);
        debug!(
            "📋 Servidor {} tiene {} tracks en cola ({:?} en total)",
            guild_id,
            snapshot.len(),
            snapshot.total_duration()
        );
        Some(snapshot)
    }
}

fn free_slots(queued: usize, max_queue_size: usize) -> usize {
    max_queue_size.saturating_sub(queued)
}

fn current_track(handler: &Call) -> Result<TrackHandle, EngineError> {
    handler.queue().current().ok_or(EngineError::NothingPlaying)
}
