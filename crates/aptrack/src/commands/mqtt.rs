//! MQTT registry command handlers.

use owo_colors::OwoColorize;
use tracing::info;

use aptrack_core::{MqttRegistry, PresenceState, Registry};

use crate::cli::{GlobalOpts, MqttArgs, MqttCommand, PresenceArg};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

impl From<PresenceArg> for PresenceState {
    fn from(arg: PresenceArg) -> Self {
        match arg {
            PresenceArg::Home => PresenceState::Home,
            PresenceArg::NotHome => PresenceState::NotHome,
        }
    }
}

pub async fn handle(args: MqttArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let (registry, mut status) = MqttRegistry::connect(&config::registry_config(cfg));

    let result = match args.command {
        MqttCommand::Create { hostname } => {
            let topic = registry.discovery().config_topic(&hostname);
            registry.create(&hostname).await.map(|()| topic)
        }
        MqttCommand::Update { hostname, state } => {
            let topic = registry.discovery().state_topic(&hostname);
            registry
                .update_state(&hostname, state.into())
                .await
                .map(|()| topic)
        }
        MqttCommand::Delete { hostname } => {
            let topic = registry.discovery().config_topic(&hostname);
            registry.delete(&hostname).await.map(|()| topic)
        }
        MqttCommand::Listen => {
            let cancel = super::shutdown_token();
            let color = output::should_color(&global.color);
            info!("listening for Home Assistant status messages");
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    message = status.recv() => match message {
                        Some(online) => output::print_output(&status_line(online, color), global.quiet),
                        None => break,
                    },
                }
            }
            registry.close().await;
            return Ok(());
        }
    };

    // Close first so the queued publish is flushed before reporting.
    registry.close().await;
    let topic = result?;
    output::print_output(&format!("Published to {topic}"), global.quiet);
    Ok(())
}

fn status_line(online: bool, color: bool) -> String {
    match (online, color) {
        (true, true) => format!("Home Assistant is {}", "online".green()),
        (false, true) => format!("Home Assistant is {}", "offline".red()),
        (true, false) => "Home Assistant is online".into(),
        (false, false) => "Home Assistant is offline".into(),
    }
}
