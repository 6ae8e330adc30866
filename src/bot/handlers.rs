use serenity::model::id::{ChannelId, GuildId, UserId};
use std::{fmt, str::FromStr, sync::Arc};
use thiserror::Error;
use tracing::{error, info};

use crate::{
    audio::{EngineError, PlayRequest, QueueEngine},
    ui::Reply,
};

/// Slash commands que responde el bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicCommand {
    Play,
    Skip,
    Stop,
    Pause,
    Resume,
    Queue,
}

impl MusicCommand {
    pub const ALL: [MusicCommand; 6] = [
        Self::Play,
        Self::Skip,
        Self::Stop,
        Self::Pause,
        Self::Resume,
        Self::Queue,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Skip => "skip",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Queue => "queue",
        }
    }
}

impl fmt::Display for MusicCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MusicCommand {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|command| command.name() == s)
            .ok_or_else(|| DispatchError::UnknownCommand(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown command /{0}")]
    UnknownCommand(String),
    #[error("missing required option `{0}`")]
    MissingOption(&'static str),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A slash command invocation, detached from the gateway types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub command_name: String,
    pub query: Option<String>,
    pub guild_id: Option<GuildId>,
    /// Voice channel the caller currently sits in, if any.
    pub voice_channel_id: Option<ChannelId>,
    pub text_channel_id: ChannelId,
    pub member: UserId,
}

/// Routes each invocation to exactly one engine call and produces exactly one reply.
///
/// Holds no per-invocation state, so concurrent invocations never interact here.
#[derive(Clone)]
pub struct CommandDispatcher {
    engine: Arc<dyn QueueEngine>,
}

impl CommandDispatcher {
    pub fn new(engine: Arc<dyn QueueEngine>) -> Self {
        Self { engine }
    }

    pub async fn handle(&self, invocation: &CommandInvocation) -> Reply {
        let (Some(guild_id), Some(voice_channel_id)) =
            (invocation.guild_id, invocation.voice_channel_id)
        else {
            info!(
                "🔇 /{} de {} ignorado: no está en un canal de voz",
                invocation.command_name, invocation.member
            );
            return Reply::NotInVoiceChannel;
        };

        match self.dispatch(invocation, guild_id, voice_channel_id).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    "❌ /{} falló en servidor {}: {}",
                    invocation.command_name, guild_id, e
                );
                Reply::Failed
            }
        }
    }

    async fn dispatch(
        &self,
        invocation: &CommandInvocation,
        guild_id: GuildId,
        voice_channel_id: ChannelId,
    ) -> Result<Reply, DispatchError> {
        let command: MusicCommand = invocation.command_name.parse()?;

        let reply = match command {
            MusicCommand::Play => {
                let query = invocation
                    .query
                    .clone()
                    .ok_or(DispatchError::MissingOption("query"))?;

                self.engine
                    .play(PlayRequest {
                        guild_id,
                        voice_channel_id,
                        text_channel_id: invocation.text_channel_id,
                        member: invocation.member,
                        query: query.clone(),
                    })
                    .await?;

                Reply::Searching { query }
            }
            MusicCommand::Skip => {
                self.engine.skip(guild_id).await?;
                Reply::Skipped
            }
            MusicCommand::Stop => {
                self.engine.stop(guild_id).await?;
                Reply::Stopped
            }
            MusicCommand::Pause => {
                self.engine.pause(guild_id).await?;
                Reply::Paused
            }
            MusicCommand::Resume => {
                self.engine.resume(guild_id).await?;
                Reply::Resumed
            }
            MusicCommand::Queue => match self.engine.queue(guild_id).await {
                Some(snapshot) if !snapshot.is_empty() => Reply::Queue(snapshot),
                _ => Reply::EmptyQueue,
            },
        };

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{MockQueueEngine, QueueSnapshot, QueuedSong};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const GUILD: GuildId = GuildId::new(10);
    const VOICE: ChannelId = ChannelId::new(20);
    const TEXT: ChannelId = ChannelId::new(30);
    const MEMBER: UserId = UserId::new(40);

    fn invocation(name: &str) -> CommandInvocation {
        CommandInvocation {
            command_name: name.to_string(),
            query: None,
            guild_id: Some(GUILD),
            voice_channel_id: Some(VOICE),
            text_channel_id: TEXT,
            member: MEMBER,
        }
    }

    fn dispatcher(engine: MockQueueEngine) -> CommandDispatcher {
        CommandDispatcher::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn callers_outside_voice_get_the_advisory_and_no_engine_call() {
        // No expectations: any engine call panics.
        let dispatcher = dispatcher(MockQueueEngine::new());

        for command in MusicCommand::ALL {
            let mut event = invocation(command.name());
            event.voice_channel_id = None;
            event.query = Some("song".into());

            assert_eq!(dispatcher.handle(&event).await, Reply::NotInVoiceChannel);
        }
    }

    #[tokio::test]
    async fn direct_messages_get_the_advisory() {
        let dispatcher = dispatcher(MockQueueEngine::new());
        let mut event = invocation("skip");
        event.guild_id = None;
        event.voice_channel_id = None;

        assert_eq!(dispatcher.handle(&event).await, Reply::NotInVoiceChannel);
    }

    #[tokio::test]
    async fn play_forwards_the_request_and_acknowledges() {
        let mut engine = MockQueueEngine::new();
        engine
            .expect_play()
            .with(eq(PlayRequest {
                guild_id: GUILD,
                voice_channel_id: VOICE,
                text_channel_id: TEXT,
                member: MEMBER,
                query: "daft punk".to_string(),
            }))
            .times(1)
            .returning(|_| Ok(()));

        let mut event = invocation("play");
        event.query = Some("daft punk".into());

        let reply = dispatcher(engine).handle(&event).await;
        assert_eq!(reply.to_string(), "Searching: daft punk");
    }

    #[tokio::test]
    async fn play_without_query_fails_without_calling_the_engine() {
        let reply = dispatcher(MockQueueEngine::new())
            .handle(&invocation("play"))
            .await;
        assert_eq!(reply, Reply::Failed);
    }

    #[tokio::test]
    async fn skip_calls_the_engine_once() {
        let mut engine = MockQueueEngine::new();
        engine
            .expect_skip()
            .with(eq(GUILD))
            .times(1)
            .returning(|_| Ok(()));

        let reply = dispatcher(engine).handle(&invocation("skip")).await;
        assert_eq!(reply.to_string(), "Skipped!");
    }

    #[tokio::test]
    async fn stop_pause_and_resume_map_to_their_engine_calls() {
        let mut engine = MockQueueEngine::new();
        engine.expect_stop().with(eq(GUILD)).times(1).returning(|_| Ok(()));
        engine.expect_pause().with(eq(GUILD)).times(1).returning(|_| Ok(()));
        engine.expect_resume().with(eq(GUILD)).times(1).returning(|_| Ok(()));
        let dispatcher = dispatcher(engine);

        assert_eq!(dispatcher.handle(&invocation("stop")).await, Reply::Stopped);
        assert_eq!(dispatcher.handle(&invocation("pause")).await, Reply::Paused);
        assert_eq!(dispatcher.handle(&invocation("resume")).await, Reply::Resumed);
    }

    #[tokio::test]
    async fn queue_without_session_is_the_empty_state() {
        let mut engine = MockQueueEngine::new();
        engine
            .expect_queue()
            .with(eq(GUILD))
            .times(1)
            .returning(|_| None);

        let reply = dispatcher(engine).handle(&invocation("queue")).await;
        assert_eq!(reply.to_string(), "No songs playing!");
        assert!(!reply.is_error());
    }

    #[tokio::test]
    async fn queue_lists_every_song_in_engine_order() {
        let mut engine = MockQueueEngine::new();
        engine.expect_queue().times(1).returning(|_| {
            Some(QueueSnapshot::new(vec![
                QueuedSong::new("Intro", Some(Duration::from_secs(95))),
                QueuedSong::new("Outro", Some(Duration::from_secs(200))),
            ]))
        });

        let reply = dispatcher(engine).handle(&invocation("queue")).await;
        assert_eq!(reply.to_string(), "1. Intro (01:35)\n2. Outro (03:20)");
    }

    #[tokio::test]
    async fn engine_errors_become_one_generic_reply() {
        let mut engine = MockQueueEngine::new();
        engine
            .expect_skip()
            .times(1)
            .returning(|guild_id| Err(EngineError::NoSession(guild_id)));
        engine
            .expect_pause()
            .times(1)
            .returning(|_| Err(EngineError::AlreadyPaused));
        engine
            .expect_play()
            .times(1)
            .returning(|_| Err(EngineError::QueueFull(3)));
        let dispatcher = dispatcher(engine);

        assert_eq!(dispatcher.handle(&invocation("skip")).await, Reply::Failed);
        assert_eq!(dispatcher.handle(&invocation("pause")).await, Reply::Failed);

        let mut play = invocation("play");
        play.query = Some("anything".into());
        assert_eq!(dispatcher.handle(&play).await.to_string(), "Error while processing command!");
    }

    #[tokio::test]
    async fn unknown_commands_get_the_generic_reply() {
        let reply = dispatcher(MockQueueEngine::new())
            .handle(&invocation("shuffle"))
            .await;
        assert_eq!(reply, Reply::Failed);
    }

    #[test]
    fn command_names_round_trip() {
        for command in MusicCommand::ALL {
            assert_eq!(command.name().parse::<MusicCommand>().unwrap(), command);
        }
        assert!(matches!(
            "Play".parse::<MusicCommand>(),
            Err(DispatchError::UnknownCommand(name)) if name == "Play"
        ));
    }
}
