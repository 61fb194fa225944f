use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use kodo_cli::logging;
use kodo_client::config::{AccountConfig, ConfigError, KodoConfig, ServerConfig};
use kodo_client::{SessionState, WorldSession};
use kodo_protocol::messages::ChatType;
use kodo_protocol::SESSION_KEY_LEN;

const TICK: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "kodo")]
#[command(version, about = "Command line world client", long_about = None)]
struct Cli {
    /// Server entry from the config file
    #[arg(short, long)]
    server: String,

    /// Account entry from the config file
    #[arg(short, long)]
    account: String,

    /// World session key from the realm handshake, as 80 hex digits
    #[arg(short = 'k', long)]
    session_key: String,

    /// Character to enter the world with, overriding the config
    #[arg(short, long)]
    character: Option<String>,

    /// Line to say once after entering the world
    #[arg(long)]
    say: Option<String>,

    /// Mirror log output to a file under the data directory
    #[arg(long)]
    log_file: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init_logging("cli", cli.log_file)?;

    info!("Starting kodo client");

    let config = match KodoConfig::load() {
        Ok(config) => config,
        Err(ConfigError::NotFound(path)) => {
            create_example_config()?;
            eprintln!("Config file created at: {}", path.display());
            eprintln!("Edit it with your server and account details, then run kodo again.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let server = config.servers.get(&cli.server).ok_or_else(|| {
        let available = config
            .servers
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        anyhow::anyhow!(
            "Server '{}' not found. Available servers: {}",
            cli.server,
            available
        )
    })?;
    let account = config.accounts.get(&cli.account).ok_or_else(|| {
        let available = config
            .accounts
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        anyhow::anyhow!(
            "Account '{}' not found. Available accounts: {}",
            cli.account,
            available
        )
    })?;

    let session_key = parse_session_key(&cli.session_key)?;
    let character = cli.character.clone().or_else(|| account.character.clone());

    let mut session = WorldSession::new().with_chat_cap(config.chat_history);
    session.on_failure(|reason| error!("Session failed: {}", reason));

    info!("Connecting to {} ({}) as {}", cli.server, server, account.username);
    session
        .connect(
            &server.host,
            server.port,
            &session_key,
            &account.username,
            server.build,
        )
        .await?;

    run_session(&mut session, character.as_deref(), cli.say.as_deref()).await;

    if session.state() == SessionState::Failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Tick the session until it fails, disconnects, or the user interrupts.
/// Character selection and the optional one-shot say line are driven off
/// the observed session state.
async fn run_session(session: &mut WorldSession, character: Option<&str>, say: Option<&str>) {
    let mut said = false;
    let mut last_tick = Instant::now();
    let mut ticker = tokio::time::interval(TICK);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, disconnecting");
                session.disconnect();
                break;
            }
            _ = ticker.tick() => {
                let dt = last_tick.elapsed().as_secs_f32();
                last_tick = Instant::now();
                session.update(dt);

                match session.state() {
                    SessionState::Ready => session.request_character_list(),
                    SessionState::CharListReceived => {
                        if !enter_world(session, character) {
                            session.disconnect();
                            break;
                        }
                    }
                    SessionState::InWorld => {
                        if !said {
                            if let Some(line) = say {
                                session.send_chat_message(ChatType::Say, line, None);
                                session.add_local_chat(ChatType::Say, line);
                            }
                            said = true;
                        }
                    }
                    SessionState::Failed | SessionState::Disconnected => break,
                    _ => {}
                }
            }
        }
    }
}

/// Pick a character from the received list and send the world login.
/// Returns false when there is nothing sensible to log in with.
fn enter_world(session: &mut WorldSession, character: Option<&str>) -> bool {
    let characters = session.characters();
    if characters.is_empty() {
        error!("No characters on this account");
        return false;
    }

    let chosen = match character {
        Some(name) => {
            match characters
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
            {
                Some(c) => c,
                None => {
                    let available = characters
                        .iter()
                        .map(|c| c.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    error!(
                        "Character '{}' not found. Available characters: {}",
                        name, available
                    );
                    return false;
                }
            }
        }
        None => &characters[0],
    };

    let guid = chosen.guid;
    session.select_character(guid);
    true
}

fn create_example_config() -> Result<(), ConfigError> {
    let mut config = KodoConfig::default();
    config.servers.insert(
        "local".to_string(),
        ServerConfig {
            host: "localhost".to_string(),
            port: 8085,
            build: 12340,
        },
    );
    config.accounts.insert(
        "default".to_string(),
        AccountConfig {
            username: "user".to_string(),
            character: None,
        },
    );
    config.save()
}

fn parse_session_key(hex: &str) -> anyhow::Result<Vec<u8>> {
    if !hex.is_ascii() || hex.len() != SESSION_KEY_LEN * 2 {
        anyhow::bail!(
            "session key must be {} hex digits, got {} characters",
            SESSION_KEY_LEN * 2,
            hex.chars().count()
        );
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .with_context(|| format!("session key is not hex at offset {}", i))
        })
        .collect()
}
