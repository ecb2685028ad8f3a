/// Play — interactive terminal shell for walking a content pack.
///
/// Usage: play [--content <path>] [--config <path>] [--save-dir <dir>] [--seed <n>]
///
/// Commands:
///   move           — take one step along the track
///   choose <n>     — pick option n of the open dialogue
///   buy <id>       — buy a shop listing
///   status         — show the player
///   shop           — list shop stock
///   track          — show remaining encounters
///   reset          — put every event and listing back
///   restart        — delete the save and start over
///   help           — list commands
///   quit           — exit

use journey_engine::core::pool::PoolState;
use journey_engine::core::session::{JourneySession, SessionError};
use journey_engine::core::store::FileStore;
use journey_engine::schema::dialogue::DialogueNode;
use journey_engine::schema::effect::AppliedEffects;
use journey_engine::schema::player::PlayerSnapshot;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONTENT: &str = "content_data/coastal_road/content.ron";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut content_path = DEFAULT_CONTENT.to_string();
    let mut config_path = None;
    let mut save_dir: Option<PathBuf> = None;
    let mut seed = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--content" if i + 1 < args.len() => {
                i += 1;
                content_path = args[i].clone();
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--save-dir" if i + 1 < args.len() => {
                i += 1;
                save_dir = Some(PathBuf::from(&args[i]));
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse::<u64>().ok();
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut builder = JourneySession::builder().content_file(&content_path);
    if let Some(ref path) = config_path {
        builder = builder.config_file(path);
    }
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    if let Some(ref dir) = save_dir {
        match FileStore::new(dir) {
            Ok(store) => builder = builder.with_store(store),
            Err(e) => {
                eprintln!("ERROR: Cannot open save directory '{}': {}", dir.display(), e);
                std::process::exit(1);
            }
        }
    }

    let mut session = match builder.build() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(ref dir) = save_dir {
        if let Some(state) = load_pool(dir) {
            session.restore_pool(&state);
        }
    }

    match session.player() {
        Ok(player) => print_status(&player),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }
    println!("Type 'help' for commands.\n");

    let mut open_node: Option<DialogueNode> = None;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("play> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "move" | "m" => match session.move_player() {
                Ok(outcome) => {
                    println!("You walk to position {} (energy {}).", outcome.player.position, outcome.player.energy);
                    if let Some(encounter) = &outcome.encounter {
                        println!("\n== {} [{}] ==", encounter.info.title, encounter.kind.label());
                        if !encounter.info.description.is_empty() {
                            println!("{}", encounter.info.description);
                        }
                    }
                    if let Some(event) = &outcome.step_event {
                        println!("\n== {} ==", event.title);
                    }
                    open_node = outcome.next_node;
                    if let Some(node) = &open_node {
                        print_node(node);
                    }
                }
                Err(e) => print_error(&e),
            },
            "choose" | "c" => {
                let Some(node) = open_node.clone() else {
                    println!("No dialogue is open.");
                    continue;
                };
                let index = parts.get(1).and_then(|n| n.parse::<usize>().ok());
                let Some(option) = index.and_then(|n| n.checked_sub(1)).and_then(|n| node.options.get(n)) else {
                    println!("Usage: choose <n>  (1..={})", node.options.len());
                    continue;
                };
                match session.choose_option(node.id.as_str(), &option.id) {
                    Ok(outcome) => {
                        if let Some(applied) = &outcome.applied {
                            print_applied(applied);
                        }
                        open_node = outcome.next_node;
                        match &open_node {
                            Some(next) => print_node(next),
                            None => println!("(dialogue ends)"),
                        }
                    }
                    Err(e) => print_error(&e),
                }
            }
            "buy" | "b" => {
                if parts.len() < 2 {
                    println!("Usage: buy <id>");
                    continue;
                }
                match session.purchase(parts[1]) {
                    Ok(outcome) => {
                        println!("Bought '{}'.", outcome.listing.title);
                        print_applied(&outcome.applied);
                    }
                    Err(e) => print_error(&e),
                }
            }
            "status" | "s" => match session.player() {
                Ok(player) => print_status(&player),
                Err(e) => print_error(&e),
            },
            "shop" => {
                let listings = session.shop_listings();
                if listings.is_empty() {
                    println!("The shop is sold out.");
                }
                for listing in listings {
                    println!("  {:<14} {:>5} gold  {}", listing.id, listing.cost, listing.title);
                }
            }
            "track" | "t" => {
                let track = session.track();
                let position = session.player().map(|p| p.position).unwrap_or(0);
                println!("{}", render_track(position, track.track_length, &track.encounters));
                for marker in &track.encounters {
                    println!("  @{:<3} {:<9} {}", marker.position, marker.kind.label(), marker.info.title);
                }
            }
            "reset" => {
                session.reset();
                open_node = None;
                println!("Events and shop restocked.");
            }
            "restart" => match session.restart() {
                Ok(player) => {
                    open_node = None;
                    println!("New journey started.");
                    print_status(&player);
                }
                Err(e) => print_error(&e),
            },
            _ => {
                println!("Unknown command '{}'. Type 'help' for commands.", cmd);
            }
        }

        if let Some(ref dir) = save_dir {
            save_pool(dir, &session.pool_state());
        }
    }
}

fn print_usage() {
    println!("Usage: play [--content <path>] [--config <path>] [--save-dir <dir>] [--seed <n>]");
}

fn print_help() {
    println!("Commands:");
    println!("  move           — take one step along the track");
    println!("  choose <n>     — pick option n of the open dialogue");
    println!("  buy <id>       — buy a shop listing");
    println!("  status         — show the player");
    println!("  shop           — list shop stock");
    println!("  track          — show remaining encounters");
    println!("  reset          — put every event and listing back");
    println!("  restart        — delete the save and start over");
    println!("  help           — show this help");
    println!("  quit           — exit");
}

fn print_status(player: &PlayerSnapshot) {
    println!(
        "{} | pos {} | health {} | energy {} | gold {} | cristal {}",
        player.name, player.position, player.health, player.energy, player.gold, player.cristal
    );
    if !player.items.is_empty() {
        let mut items: Vec<&str> = player.items.iter().map(|i| i.as_str()).collect();
        items.sort();
        println!("  items: {}", items.join(", "));
    }
}

fn print_node(node: &DialogueNode) {
    println!("\n{}: {}", node.speaker, node.text);
    for (i, option) in node.options.iter().enumerate() {
        println!("  {}. {}", i + 1, option.text);
    }
}

fn print_applied(applied: &AppliedEffects) {
    let summary = applied.to_string();
    if !summary.is_empty() {
        println!("{}", summary);
    }
    for item in &applied.items_gained {
        println!("  + {}", item.name);
    }
    for item in &applied.items_lost {
        println!("  - {}", item.name);
    }
}

fn print_error(error: &SessionError) {
    match error {
        SessionError::Rejected(reason) => println!("Can't do that: {}", reason),
        other => println!("ERROR: {}", other),
    }
}

fn render_track(
    position: u32,
    length: u32,
    encounters: &[journey_engine::core::session::EncounterMarker],
) -> String {
    (0..=length)
        .map(|step| {
            if step == position {
                '@'
            } else if encounters.iter().any(|m| m.position == step) {
                '!'
            } else {
                '.'
            }
        })
        .collect()
}

fn pool_path(dir: &Path) -> PathBuf {
    dir.join("pool.ron")
}

fn load_pool(dir: &Path) -> Option<PoolState> {
    let text = std::fs::read_to_string(pool_path(dir)).ok()?;
    match ron::from_str(&text) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!("Ignoring unreadable pool state: {}", e);
            None
        }
    }
}

fn save_pool(dir: &Path, state: &PoolState) {
    let text = match ron::ser::to_string_pretty(state, ron::ser::PrettyConfig::default()) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Failed to serialize pool state: {}", e);
            return;
        }
    };
    if let Err(e) = std::fs::write(pool_path(dir), text) {
        tracing::warn!("Failed to write pool state: {}", e);
    }
}
