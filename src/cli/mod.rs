//! CLI commands for SMS Bridge using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{create_deliverer, Poller, RelayClient};
use crate::config::{load_settings, load_settings_from, Settings};
use crate::core::message::timestamp;
use crate::web::{run_server, WebServerConfig};

/// SMS Bridge - queue text messages from a dashboard, deliver them from a phone.
#[derive(Parser)]
#[command(name = "smsbridge")]
#[command(version)]
#[command(about = "SMS Bridge - a minimal outbound message relay", long_about = None)]
pub struct Commands {
    /// Settings file (default: ~/.smsbridge/settings.json)
    #[arg(long, global = true, env = "SMSBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the relay server
    Serve {
        /// Address to bind
        #[arg(long, env = "SMSBRIDGE_HOST")]
        host: Option<String>,

        /// Port number
        #[arg(long, env = "SMSBRIDGE_PORT")]
        port: Option<u16>,

        /// Shared token required on /poll and /confirm
        #[arg(long, env = "SMSBRIDGE_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Queue a message through a running relay
    Send {
        /// Destination, e.g. +15551234567
        to: String,

        /// Message text
        body: String,

        /// Relay URL
        #[arg(long, env = "SMSBRIDGE_SERVER")]
        server: Option<String>,
    },

    /// Deliver pending messages and confirm them
    ///
    /// Without a command, messages are printed. With one, it runs per message:
    /// `smsbridge poll -- termux-sms-send -n {to} {body}`
    Poll {
        /// Relay URL
        #[arg(long, env = "SMSBRIDGE_SERVER")]
        server: Option<String>,

        /// Shared token
        #[arg(long, env = "SMSBRIDGE_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Seconds between polls
        #[arg(long)]
        interval: Option<u64>,

        /// Run a single poll cycle and exit
        #[arg(long)]
        once: bool,

        /// Delivery command; {to}, {body} and {id} are substituted
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Show every message, newest first
    Log {
        /// Relay URL
        #[arg(long, env = "SMSBRIDGE_SERVER")]
        server: Option<String>,
    },

    /// Show queue statistics
    Status {
        /// Relay URL
        #[arg(long, env = "SMSBRIDGE_SERVER")]
        server: Option<String>,
    },
}

impl Commands {
    /// Long-running commands also log to a file; one-shot commands only to stderr.
    pub fn writes_log_file(&self) -> bool {
        matches!(self.command, Command::Serve { .. } | Command::Poll { .. })
    }

    fn settings(&self) -> Result<Settings> {
        let settings = match &self.config {
            Some(path) => load_settings_from(path)?,
            None => load_settings()?,
        };
        Ok(settings)
    }

    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        let settings = self.settings()?;

        match &self.command {
            Command::Serve { host, port, token } => {
                cmd_serve(settings, host.clone(), *port, token.clone()).await
            }
            Command::Send { to, body, server } => cmd_send(settings, to, body, server.clone()).await,
            Command::Poll {
                server,
                token,
                interval,
                once,
                command,
            } => {
                cmd_poll(
                    settings,
                    server.clone(),
                    token.clone(),
                    *interval,
                    *once,
                    command.clone(),
                )
                .await
            }
            Command::Log { server } => cmd_log(settings, server.clone()).await,
            Command::Status { server } => cmd_status(settings, server.clone()).await,
        }
    }
}

/// Apply flag overrides on top of the file settings.
fn apply_overrides(
    mut settings: Settings,
    host: Option<String>,
    port: Option<u16>,
    token: Option<String>,
    server: Option<String>,
    interval: Option<u64>,
) -> Result<Settings> {
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }
    if token.is_some() {
        settings.token = token;
    }
    if let Some(server) = server {
        settings.client.server_url = server;
    }
    if let Some(interval) = interval {
        settings.client.poll_interval_secs = interval;
    }
    settings.validate()?;
    Ok(settings)
}

fn relay_client(settings: &Settings, token: Option<String>) -> Result<RelayClient> {
    Ok(RelayClient::with_timeout(
        &settings.client.server_url,
        token,
        Duration::from_secs(settings.client.request_timeout_secs),
    )?)
}

// Command implementations

async fn cmd_serve(
    settings: Settings,
    host: Option<String>,
    port: Option<u16>,
    token: Option<String>,
) -> Result<()> {
    let settings = apply_overrides(settings, host, port, token, None, None)?;
    let token = settings.require_token()?;

    println!(
        "Starting SMS Bridge on {}:{}...",
        settings.server.host, settings.server.port
    );
    println!("Press Ctrl+C to stop");

    run_server(WebServerConfig::new(&settings.server, token)).await?;
    Ok(())
}

async fn cmd_send(settings: Settings, to: &str, body: &str, server: Option<String>) -> Result<()> {
    let settings = apply_overrides(settings, None, None, None, server, None)?;
    let client = relay_client(&settings, None)?;

    let id = client.send(to, body).await?;
    println!("Queued {}", id);
    Ok(())
}

async fn cmd_poll(
    settings: Settings,
    server: Option<String>,
    token: Option<String>,
    interval: Option<u64>,
    once: bool,
    command: Vec<String>,
) -> Result<()> {
    let settings = apply_overrides(settings, None, None, token, server, interval)?;
    let token = settings.require_token()?.to_string();

    let command = if command.is_empty() {
        settings.client.deliver_command.clone()
    } else {
        Some(command)
    };

    let client = relay_client(&settings, Some(token))?;
    let poller = Poller::new(
        client,
        create_deliverer(
            command,
            Duration::from_secs(settings.client.deliver_timeout_secs),
        )?,
        Duration::from_secs(settings.client.poll_interval_secs),
    );

    if once {
        let report = poller.run_once().await?;
        println!("Delivered {}, failed {}", report.delivered, report.failed);
        return Ok(());
    }

    poller
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}

async fn cmd_log(settings: Settings, server: Option<String>) -> Result<()> {
    let settings = apply_overrides(settings, None, None, None, server, None)?;
    let client = relay_client(&settings, None)?;

    let log = client.log().await?;
    if log.is_empty() {
        println!("No messages.");
        return Ok(());
    }

    println!("Messages ({}):", log.len());
    for msg in log {
        let sent = msg
            .sent_at
            .map(|ts| format!(" sent {}", timestamp::format(&ts)))
            .unwrap_or_default();
        println!(
            "  {} [{}] {} -> {}: {}{}",
            timestamp::format(&msg.created_at),
            msg.status,
            msg.id,
            msg.to,
            msg.body.chars().take(50).collect::<String>(),
            sent
        );
    }
    Ok(())
}

async fn cmd_status(settings: Settings, server: Option<String>) -> Result<()> {
    let settings = apply_overrides(settings, None, None, None, server, None)?;
    let client = relay_client(&settings, None)?;

    println!("{}", client.stats().await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Commands::command().debug_assert();
    }

    #[test]
    fn poll_takes_trailing_command() {
        let args = Commands::try_parse_from([
            "smsbridge",
            "poll",
            "--once",
            "--",
            "termux-sms-send",
            "-n",
            "{to}",
            "{body}",
        ])
        .unwrap();

        match args.command {
            Command::Poll { once, command, .. } => {
                assert!(once);
                assert_eq!(command, vec!["termux-sms-send", "-n", "{to}", "{body}"]);
            }
            _ => panic!("expected poll"),
        }
    }

    #[test]
    fn only_daemons_write_log_file() {
        let parse = |args: &[&str]| Commands::try_parse_from(args).unwrap();

        assert!(parse(&["smsbridge", "serve"]).writes_log_file());
        assert!(parse(&["smsbridge", "poll", "--once"]).writes_log_file());
        assert!(!parse(&["smsbridge", "send", "+1555", "hi"]).writes_log_file());
        assert!(!parse(&["smsbridge", "status"]).writes_log_file());
    }

    #[test]
    fn overrides_win_over_file() {
        let settings = apply_overrides(
            Settings::default(),
            Some("127.0.0.1".to_string()),
            Some(8080),
            Some("secret".to_string()),
            Some("http://relay:8080".to_string()),
            Some(2),
        )
        .unwrap();

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.require_token().unwrap(), "secret");
        assert_eq!(settings.client.server_url, "http://relay:8080");
        assert_eq!(settings.client.poll_interval_secs, 2);
    }

    #[test]
    fn zero_interval_rejected() {
        assert!(apply_overrides(Settings::default(), None, None, None, None, Some(0)).is_err());
    }
}
