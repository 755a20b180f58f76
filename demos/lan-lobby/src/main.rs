//! A terminal lobby for trying lanparty on a real network.
//!
//! ```text
//! cargo run -p lan-lobby -- [config.json]
//! ```
//!
//! Type `help` for commands. Run two copies on machines in the same
//! subnet (or twice on one machine) and `auto` in both.

use std::net::SocketAddr;

use lanparty::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  host                start a lobby and announce it
  join <ip:port>      join the lobby at ip:port
  auto                join the first lobby found, or host one
  search              list lobbies on the LAN
  ready | unready     toggle your ready flag
  clear               clear everyone's ready flag (host)
  start               start the game once everyone is ready (host)
  leave               leave or close the current lobby
  status              show state, players and lobbies
  quit";

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn load_config() -> Result<LanPartyConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)?;
            let config = serde_json::from_str(&text)?;
            info!(%path, "loaded config");
            Ok(config)
        }
        None => Ok(LanPartyConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let session = LanParty::builder().config(load_config()?).build();
    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            print_event(&event);
        }
    });

    eprintln!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let result = match (words.next(), words.next()) {
            (None, _) => continue,
            (Some("quit" | "exit"), _) => break,
            (Some("host"), _) => session.start_host().await,
            (Some("join"), Some(addr)) => match addr.parse::<SocketAddr>() {
                Ok(addr) => {
                    let game = ConnectionInfo::new(addr.ip(), addr.port(), addr.to_string());
                    session.join_session(game).await
                }
                Err(err) => {
                    warn!(%addr, "not an address: {err}");
                    Ok(())
                }
            },
            (Some("auto"), _) => session.auto_join().await,
            (Some("search"), _) => session.start_search().await,
            (Some("ready"), _) => session.set_ready(true).await,
            (Some("unready"), _) => session.set_ready(false).await,
            (Some("clear"), _) => session.clear_all_ready().await,
            (Some("start"), _) => session.start_game().await.map(|_| ()),
            (Some("leave"), _) => session.leave_session().await,
            (Some("status"), _) => session.snapshot().await.map(|s| print_snapshot(&s)),
            _ => {
                eprintln!("{HELP}");
                Ok(())
            }
        };
        result?;
    }

    session.shutdown().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_player(player: &Player) {
    let [r, g, b] = player.color().rgb();
    println!(
        "  #{} {}{}{} (#{r:02x}{g:02x}{b:02x})",
        player.number,
        player.label,
        if player.is_local { " (you)" } else { "" },
        if player.ready { " [ready]" } else { "" },
    );
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    println!("state: {}", snapshot.state);
    if let Some(addr) = snapshot.host_addr {
        println!("hosting on {addr}");
    }
    for player in &snapshot.players {
        print_player(player);
    }
    for game in &snapshot.peers {
        println!("  lobby {game}");
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::StateChanged(state) => println!("-> {state}"),
        SessionEvent::PeerDiscovered(game) => println!("found lobby {game}"),
        SessionEvent::PeerLost(game) => println!("lost lobby {game}"),
        SessionEvent::PeerListUpdated(_) => {}
        SessionEvent::PlayerRegistered(player) => {
            println!("joined:");
            print_player(player);
        }
        SessionEvent::PlayerUnregistered(player) => println!("left: {}", player.label),
        SessionEvent::PlayerRenumbered(player) => {
            println!("{} is now #{}", player.label, player.number);
        }
        SessionEvent::PlayerReadyChanged { player, ready } => {
            println!("player {player} {}", if *ready { "ready" } else { "not ready" });
        }
        SessionEvent::LocalPlayerReady => println!("you are ready"),
        SessionEvent::GameStarted => println!("game on!"),
        SessionEvent::Message(text) => println!("{text}"),
    }
}
