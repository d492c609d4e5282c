use std::env;

use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use chess_session_client::models::color_to_string;
use chess_session_client::session::{build_room_url, SessionConnection, SessionController};
use chess_session_client::{ClientAction, SessionEvent, SessionState};

/// Terminal driver for the session engine: one websocket connection,
/// one stdin command stream, one controller. Moves are typed in uci
/// (`e2e4`, `e7e8q`); `resign`, `draw`, `abort`, `pause` and `quit` are
/// the other commands.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let room_id = match env::args().nth(1) {
        Some(room_id) => room_id,
        None => {
            eprintln!("usage: chess_session_client <room-id>");
            std::process::exit(2);
        }
    };
    let base = env::var("CHESS_WS_API").unwrap_or_else(|_| "ws://127.0.0.1:8080".to_string());
    let token = env::var("CHESS_TOKEN").unwrap_or_default();

    let url = build_room_url(&base, &room_id, &token)?;
    info!("connecting to room {}", room_id);
    let connection = SessionConnection::open(&url).await?;
    let (mut sender, mut receiver) = connection.into_split();

    let mut controller = SessionController::new();
    sender.send(&controller.on_open()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            frame = receiver.recv() => match frame {
                Ok(Some(raw)) => {
                    for event in controller.on_frame(&raw) {
                        render(&event, &controller);
                    }
                }
                Ok(None) => {
                    controller.on_disconnect();
                    println!("-- disconnected --");
                    break;
                }
                Err(err) => {
                    controller.on_disconnect();
                    error!("transport failure: {}", err);
                    break;
                }
            },
            line = lines.next_line() => match line? {
                Some(line) => {
                    let command = line.trim();
                    if command.is_empty() {
                        continue;
                    }
                    if command == "quit" {
                        sender.close().await;
                        break;
                    }
                    if let Some(action) = handle_command(command, &mut controller) {
                        sender.send(&action).await?;
                    }
                }
                None => break,
            },
        }
    }
    Ok(())
}

fn handle_command(command: &str, controller: &mut SessionController) -> Option<ClientAction> {
    match command {
        "resign" => Some(controller.resign()),
        "draw" => Some(controller.offer_draw()),
        "abort" => Some(controller.abort()),
        "pause" => Some(controller.pause()),
        uci if uci.is_ascii() && (uci.len() == 4 || uci.len() == 5) => {
            let from = &uci[0..2];
            let to = &uci[2..4];
            let promotion = uci.chars().nth(4);
            let action = controller.on_drop(from, to, promotion);
            if action.is_some() {
                println!("{}", controller.store().fen());
            } else {
                match controller.state() {
                    SessionState::MyTurn => println!("illegal move: {}", uci),
                    SessionState::GameOver => println!("the game is over"),
                    _ => println!("not your turn"),
                }
            }
            action
        }
        other => {
            warn!("unknown command: {}", other);
            None
        }
    }
}

fn render(event: &SessionEvent, controller: &SessionController) {
    match event {
        SessionEvent::IdentityConfirmed { user } => {
            println!("-- connected as {} --", user);
        }
        SessionEvent::GameJoined { player1, player2, my_color, my_turn } => {
            println!(
                "-- {} vs {} | you play {} | {} to move --",
                player1.as_deref().unwrap_or("?"),
                player2.as_deref().unwrap_or("(waiting)"),
                my_color.map(color_to_string).unwrap_or_else(|| "?".to_string()),
                if *my_turn { "you" } else { "opponent" },
            );
        }
        SessionEvent::PositionChanged => {
            println!("{}", controller.store().fen());
            if let Some(square) = controller.store().check_square() {
                println!("check on {}", square);
            }
        }
        SessionEvent::MoveRejected => {
            println!("-- server rejected the move, position reverted --");
        }
        SessionEvent::DrawOffered => {
            println!("-- opponent offers a draw (`draw` to accept) --");
        }
        SessionEvent::GameOver(outcome) => {
            println!(
                "-- game over: {} ({}) wins by {} --",
                outcome.winner.as_deref().unwrap_or("nobody"),
                outcome.color.map(color_to_string).unwrap_or_else(|| "?".to_string()),
                outcome.over_type.as_deref().unwrap_or("unknown"),
            );
        }
        SessionEvent::ReplayFailed(err) => {
            println!("-- cannot restore game state: {} --", err);
        }
    }
}
