use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    http::Http,
    model::application::{Command, CommandOptionType},
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Value type of a slash command option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    String,
}

impl From<ParameterKind> for CommandOptionType {
    fn from(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::String => CommandOptionType::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    pub name: &'static str,
    pub kind: ParameterKind,
    pub description: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParameterDescriptor>,
}

impl CommandDescriptor {
    fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            parameters: Vec::new(),
        }
    }

    fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn to_builder(&self) -> CreateCommand {
        self.parameters.iter().fold(
            CreateCommand::new(self.name).description(self.description),
            |command, parameter| {
                command.add_option(
                    CreateCommandOption::new(
                        parameter.kind.into(),
                        parameter.name,
                        parameter.description,
                    )
                    .required(parameter.required),
                )
            },
        )
    }
}

/// The full set of commands published at startup.
pub fn command_descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("play", "Play a song or playlist").with_parameter(
            ParameterDescriptor {
                name: "query",
                kind: ParameterKind::String,
                description: "Song name or link",
                required: true,
            },
        ),
        CommandDescriptor::new("skip", "Skip the current song"),
        CommandDescriptor::new("stop", "Stop playing music"),
        CommandDescriptor::new("pause", "Pause the music"),
        CommandDescriptor::new("resume", "Resume the music"),
        CommandDescriptor::new("queue", "Show current queue"),
    ]
}

/// Platform-side store of the application's global slash commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRegistry: Send + Sync {
    /// Replaces every registered global command with `commands`; returns how many are now registered.
    async fn overwrite_global_commands(&self, commands: &[CommandDescriptor]) -> Result<usize>;
}

#[async_trait]
impl CommandRegistry for Http {
    async fn overwrite_global_commands(&self, commands: &[CommandDescriptor]) -> Result<usize> {
        let builders = commands.iter().map(CommandDescriptor::to_builder).collect();
        let registered = Command::set_global_commands(self, builders).await?;
        Ok(registered.len())
    }
}

/// Publishes `descriptors` as the application's complete global command set.
pub async fn register_commands(
    registry: &dyn CommandRegistry,
    descriptors: &[CommandDescriptor],
) -> Result<usize> {
    info!("📝 Registrando {} slash commands globales...", descriptors.len());
    debug!("Payload de comandos: {}", serde_json::to_string(descriptors)?);

    let registered = registry.overwrite_global_commands(descriptors).await?;
    info!("✅ Slash commands registrados ({} activos)", registered);

    Ok(registered)
}

/// Runs registration in the background. Failures are logged and never retried.
pub fn spawn_registration(registry: Arc<dyn CommandRegistry>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let descriptors = command_descriptors();
        if let Err(e) = register_commands(registry.as_ref(), &descriptors).await {
            error!("❌ Error registrando slash commands: {:?}", e);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::handlers::MusicCommand;
    use pretty_assertions::assert_eq;
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicUsize, Ordering},
    };
    use tokio::sync::Mutex;

    /// Keeps the registered set the way the platform does: each call replaces it wholesale.
    #[derive(Default)]
    struct InMemoryRegistry {
        registered: Mutex<Vec<CommandDescriptor>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CommandRegistry for InMemoryRegistry {
        async fn overwrite_global_commands(&self, commands: &[CommandDescriptor]) -> Result<usize> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut registered = self.registered.lock().await;
            *registered = commands.to_vec();
            Ok(registered.len())
        }
    }

    #[test]
    fn descriptors_cover_every_command_once() {
        let descriptors = command_descriptors();
        let names: HashSet<_> = descriptors.iter().map(|d| d.name).collect();

        assert_eq!(names.len(), descriptors.len());
        for command in MusicCommand::ALL {
            assert!(names.contains(command.name()), "missing /{}", command);
        }
        for descriptor in &descriptors {
            assert!(descriptor.name.parse::<MusicCommand>().is_ok());
        }
    }

    #[test]
    fn only_play_takes_a_required_query() {
        for descriptor in command_descriptors() {
            if descriptor.name == "play" {
                assert_eq!(
                    descriptor.parameters,
                    vec![ParameterDescriptor {
                        name: "query",
                        kind: ParameterKind::String,
                        description: "Song name or link",
                        required: true,
                    }]
                );
            } else {
                assert!(descriptor.parameters.is_empty(), "/{}", descriptor.name);
            }
        }
    }

    #[test]
    fn builder_payload_matches_the_descriptor() {
        let play = command_descriptors().remove(0);
        let payload = serde_json::to_value(play.to_builder()).unwrap();

        assert_eq!(payload["name"], "play");
        assert_eq!(payload["description"], "Play a song or playlist");
        assert_eq!(payload["options"][0]["name"], "query");
        assert_eq!(payload["options"][0]["type"], 3);
        assert_eq!(payload["options"][0]["required"], true);
    }

    #[tokio::test]
    async fn registration_replaces_the_whole_set() {
        let registry = InMemoryRegistry::default();
        *registry.registered.lock().await = vec![CommandDescriptor::new("old", "Stale command")];

        let descriptors = command_descriptors();
        let count = register_commands(&registry, &descriptors).await.unwrap();

        assert_eq!(count, 6);
        assert_eq!(*registry.registered.lock().await, descriptors);
    }

    #[tokio::test]
    async fn registering_twice_is_idempotent() {
        let registry = InMemoryRegistry::default();
        let descriptors = command_descriptors();

        register_commands(&registry, &descriptors).await.unwrap();
        let first = registry.registered.lock().await.clone();
        register_commands(&registry, &descriptors).await.unwrap();

        assert_eq!(*registry.registered.lock().await, first);
        assert_eq!(registry.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_registration_is_logged_not_fatal() {
        let mut registry = MockCommandRegistry::new();
        registry
            .expect_overwrite_global_commands()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("401: Unauthorized")));

        // Completes normally and is not retried.
        spawn_registration(Arc::new(registry)).await.unwrap();
    }

    #[tokio::test]
    async fn background_registration_sends_all_descriptors() {
        let mut registry = MockCommandRegistry::new();
        registry
            .expect_overwrite_global_commands()
            .times(1)
            .returning(|commands| {
                assert_eq!(commands, command_descriptors().as_slice());
                Ok(commands.len())
            });

        spawn_registration(Arc::new(registry)).await.unwrap();
    }
}
