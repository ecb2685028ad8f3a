/// Walks the Coastal Road sample pack from start to finish, always taking
/// the first offered option, and prints what happens along the way.
///
/// Run with: cargo run --example coastal_walk [seed]

use journey_engine::core::session::{JourneySession, Rejection, SessionError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SessionError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);

    let mut session = JourneySession::builder()
        .content_file("content_data/coastal_road/content.ron")
        .player_key("demo")
        .seed(seed)
        .build()?;

    let start = session.player()?;
    println!("{} sets off with {} gold.\n", start.name, start.gold);

    // A snack for the road, if the shop has one.
    if let Ok(bought) = session.purchase("snack") {
        println!("[shop] {} ({})", bought.listing.title, bought.applied);
    }

    loop {
        let outcome = match session.move_player() {
            Ok(outcome) => outcome,
            Err(SessionError::Rejected(Rejection::EndOfTrack { position })) => {
                println!("\nThe road ends at {}.", position);
                break;
            }
            Err(e) => return Err(e),
        };

        let title = match (&outcome.encounter, &outcome.step_event) {
            (Some(encounter), _) => encounter.info.title.clone(),
            (None, Some(event)) => event.title.clone(),
            (None, None) => continue,
        };
        println!("@{:<3} {}", outcome.player.position, title);

        let mut node = outcome.next_node;
        while let Some(current) = node.take() {
            let Some(option) = current.options.first() else {
                break;
            };
            println!("      {}: {}", current.speaker, current.text);
            println!("      > {}", option.text);

            let choice = session.choose_option(current.id.as_str(), &option.id)?;
            if let Some(applied) = &choice.applied {
                let summary = applied.to_string();
                if !summary.is_empty() {
                    println!("      {}", summary);
                }
            }
            node = choice.next_node;
        }
    }

    let end = session.player()?;
    println!(
        "Final: health {}, energy {}, gold {}, cristal {}, {} items",
        end.health,
        end.energy,
        end.gold,
        end.cristal,
        end.items.len()
    );
    Ok(())
}
