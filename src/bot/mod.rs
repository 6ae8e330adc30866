//! # Bot Module
//!
//! Discord-facing side of the jukebox.
//!
//! - [`commands`]: slash command descriptors and their one-shot registration
//! - [`handlers`]: routing of a command invocation to the queue engine
//!
//! [`MusicBot`] implements Serenity's [`EventHandler`]. It turns each incoming
//! slash command into a [`CommandInvocation`], lets the [`CommandDispatcher`]
//! pick the single engine call, and sends back exactly one response.

use serenity::{
    all::{
        CommandInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
        EventHandler, Interaction, Ready,
    },
    async_trait,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub mod commands;
pub mod handlers;

use crate::audio::QueueEngine;
use handlers::{CommandDispatcher, CommandInvocation};

/// Handler principal de eventos de Discord.
///
/// Owns nothing mutable: the engine is injected at construction and shared
/// by every concurrently running event.
pub struct MusicBot {
    dispatcher: CommandDispatcher,
}

impl MusicBot {
    pub fn new(engine: Arc<dyn QueueEngine>) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(engine),
        }
    }

    async fn handle_command(&self, ctx: &Context, command: CommandInteraction) {
        let invocation = invocation_from(ctx, &command);

        info!(
            "📝 /{} usado por {} en servidor {:?}",
            invocation.command_name, command.user.name, invocation.guild_id
        );

        let reply = self.dispatcher.handle(&invocation).await;
        if reply.is_error() {
            warn!("/{} respondido con: {}", invocation.command_name, reply);
        }

        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new().content(reply.to_string()),
        );

        if let Err(e) = command.create_response(&ctx.http, response).await {
            error!(
                "Error enviando respuesta a /{}: {:?}",
                invocation.command_name, e
            );
        }
    }
}

/// Reads the invocation out of the interaction, looking the caller's voice channel up in the cache.
fn invocation_from(ctx: &Context, command: &CommandInteraction) -> CommandInvocation {
    let voice_channel_id = command.guild_id.and_then(|guild_id| {
        let guild = guild_id.to_guild_cached(&ctx.cache)?;
        let channel_id = guild
            .voice_states
            .get(&command.user.id)
            .and_then(|voice_state| voice_state.channel_id);
        channel_id
    });

    let query = command
        .data
        .options
        .iter()
        .find(|option| option.name == "query")
        .and_then(|option| option.value.as_str())
        .map(str::to_string);

    CommandInvocation {
        command_name: command.data.name.clone(),
        query,
        guild_id: command.guild_id,
        voice_channel_id,
        text_channel_id: command.channel_id,
        member: command.user.id,
    }
}

#[async_trait]
impl EventHandler for MusicBot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🤖 Conectado como {}", ready.user.tag());
        info!("📊 Conectado a {} servidores", ready.guilds.len());
    }

    /// Only slash commands are answered; every other interaction kind is ignored.
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => self.handle_command(&ctx, command).await,
            other => debug!("Interacción {:?} ignorada", other.kind()),
        }
    }
}
