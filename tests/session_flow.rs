//! End-to-end session flows driven through the public API: raw JSON
//! frames in, outbound actions and surfaced events out. No network.

use chess::Color;
use chess_session_client::{
    ClientAction, SessionController, SessionEvent, SessionState,
};

const CONNECTED: &str =
    r#"{"message": {"type": "only_me", "info": "connected", "player": {"user": "alice"}, "error": null}}"#;

fn start_session() -> SessionController {
    let mut controller = SessionController::new();
    assert_eq!(controller.on_open(), ClientAction::JoinGame);
    controller.on_frame(CONNECTED);
    controller
}

fn frame(info: &str, scope: &str, game: &str) -> String {
    format!(
        r#"{{"message": {{"type": "{scope}", "info": "{info}", "player": null, "error": null}}, "game": {game}}}"#
    )
}

fn full_game() -> &'static str {
    r#"{
        "player1": "alice", "player2": "bob",
        "player1_color": "white", "player2_color": "black",
        "current_turn": "player1", "status": "in_progress"
    }"#
}

#[test]
fn join_move_reject_recover_cycle() {
    let mut controller = start_session();

    // Scenario A: joined as player1/white, our turn.
    controller.on_frame(&frame("joined", "both", full_game()));
    assert_eq!(controller.identity().assigned_color(), Some(Color::White));
    assert_eq!(controller.state(), SessionState::MyTurn);
    let baseline = controller.store().fen();

    // Scenario B: optimistic e2e4, sent to the server.
    let action = controller.on_drop("e2", "e4", None);
    assert_eq!(action, Some(ClientAction::MakeMove { uci: "e2e4".into() }));
    assert_eq!(controller.state(), SessionState::OpponentTurn);
    assert!(controller.store().fen().contains(" b "));

    // Scenario C: the server disagrees; exact pre-move position restored.
    let events = controller.on_frame(
        r#"{"message": {"type": "only_me", "info": "invalid", "player": null, "error": "Invalid move"}}"#,
    );
    assert!(matches!(events.first(), Some(SessionEvent::MoveRejected)));
    assert_eq!(controller.store().fen(), baseline);
    assert_eq!(controller.state(), SessionState::MyTurn);

    // The session continues: the same move, this time confirmed by echo.
    controller.on_drop("e2", "e4", None).unwrap();
    controller.on_frame(
        r#"{
            "message": {"type": "both", "info": "moved", "player": {"user": "alice"}, "error": null},
            "game": {
                "player1": "alice", "player2": "bob",
                "player1_color": "white", "player2_color": "black",
                "current_turn": "player2", "status": "in_progress", "move": "e2e4"
            }
        }"#,
    );
    assert_eq!(controller.store().move_count(), 1);
    assert_eq!(controller.state(), SessionState::OpponentTurn);
}

#[test]
fn irrelevant_broadcasts_are_idempotent() {
    let mut controller = start_session();
    controller.on_frame(&frame("joined", "both", full_game()));
    let fen = controller.store().fen();
    let state = controller.state();

    // Duplicate only_me notices and foreign-audience broadcasts must
    // leave the projection untouched.
    for raw in [
        frame("moved", "only_me", full_game()),
        frame("joined", "all", full_game()),
        frame("resigned", "only_me", full_game()),
    ] {
        assert!(controller.on_frame(&raw).is_empty());
    }
    assert_eq!(controller.store().fen(), fen);
    assert_eq!(controller.state(), state);
}

#[test]
fn reconnect_rebuilds_from_authoritative_history() {
    let mut controller = start_session();
    controller.on_frame(&frame("joined", "both", full_game()));
    controller.on_drop("d2", "d4", None).unwrap();

    // Connection drops; whatever we had locally is no longer trusted.
    controller.on_disconnect();
    assert_eq!(controller.state(), SessionState::Disconnected);
    assert_eq!(controller.on_open(), ClientAction::JoinGame);

    // The server's history disagrees with our optimistic d2d4.
    let events = controller.on_frame(
        r#"{
            "message": {"type": "both", "info": "reconnected", "player": null, "error": null},
            "game": {
                "player1": "alice", "player2": "bob",
                "player1_color": "white", "player2_color": "black",
                "current_turn": "player2", "status": "in_progress",
                "moves": [{"move": "e2e4", "played_at": "2026-01-01T00:00:01Z", "played_by": "alice"}]
            }
        }"#,
    );

    assert!(matches!(events.first(), Some(SessionEvent::PositionChanged)));
    assert_eq!(controller.store().moves(), vec!["e2e4"]);
    assert_eq!(controller.state(), SessionState::OpponentTurn);
}

#[test]
fn reconnect_into_a_finished_game() {
    let mut controller = start_session();
    let events = controller.on_frame(
        r#"{
            "message": {"type": "both", "info": "reconnected", "player": null, "error": null},
            "game": {
                "player1": "alice", "player2": "bob",
                "player1_color": "white", "player2_color": "black",
                "current_turn": "player2", "status": "ended",
                "winner": "player2", "over_type": "checkmate",
                "moves": [
                    {"move": "f2f3", "played_at": "2026-01-01T00:00:01Z", "played_by": "alice"},
                    {"move": "e7e5", "played_at": "2026-01-01T00:00:02Z", "played_by": "bob"},
                    {"move": "g2g4", "played_at": "2026-01-01T00:00:03Z", "played_by": "alice"},
                    {"move": "d8h4", "played_at": "2026-01-01T00:00:04Z", "played_by": "bob"}
                ]
            }
        }"#,
    );

    assert_eq!(controller.state(), SessionState::GameOver);
    let terminal = events
        .iter()
        .find_map(|event| match event {
            SessionEvent::GameOver(outcome) => Some(outcome.clone()),
            _ => None,
        })
        .expect("terminal event");
    assert_eq!(terminal.winner.as_deref(), Some("bob"));
    assert_eq!(terminal.color, Some(Color::Black));
    assert_eq!(terminal.over_type.as_deref(), Some("checkmate"));

    // Fool's mate replayed: black mates, white king checked on e1.
    assert_eq!(controller.store().move_count(), 4);
    assert!(controller.store().check_square().is_some());
    assert_eq!(controller.on_drop("a2", "a3", None), None);
}

#[test]
fn ancillary_actions_do_not_touch_local_state() {
    let mut controller = start_session();
    controller.on_frame(&frame("joined", "both", full_game()));
    let fen = controller.store().fen();

    assert_eq!(controller.resign(), ClientAction::ResignGame);
    assert_eq!(controller.offer_draw(), ClientAction::DrawRequest);
    assert_eq!(controller.abort(), ClientAction::AbortGame);
    assert_eq!(controller.pause(), ClientAction::PauseRequest);

    assert_eq!(controller.store().fen(), fen);
    assert_eq!(controller.state(), SessionState::MyTurn);
}

#[test]
fn draw_offer_is_informational_only() {
    let mut controller = start_session();
    controller.on_frame(&frame("joined", "both", full_game()));

    let events = controller.on_frame(
        r#"{"message": {"type": "both", "info": "draw_offered", "player": {"user": "bob"}, "error": null}}"#,
    );
    assert!(matches!(events.as_slice(), [SessionEvent::DrawOffered]));
    assert_eq!(controller.state(), SessionState::MyTurn);
}

#[test]
fn promotion_move_round_trip() {
    let mut controller = start_session();
    controller.on_frame(&frame("joined", "both", full_game()));

    // March a pawn to promotion through a scripted exchange.
    let script: &[(&str, &str)] = &[
        ("a2a4", "b7b5"),
        ("a4b5", "b8c6"),
        ("b5b6", "c6d4"),
        ("b6b7", "d4e6"),
    ];
    for (white, black) in script {
        let action = controller.on_drop(&white[0..2], &white[2..4], None);
        assert!(action.is_some(), "white move {} rejected", white);
        controller.on_frame(&format!(
            r#"{{
                "message": {{"type": "both", "info": "moved", "player": {{"user": "bob"}}, "error": null}},
                "game": {{
                    "player1": "alice", "player2": "bob",
                    "player1_color": "white", "player2_color": "black",
                    "current_turn": "player1", "status": "in_progress", "move": "{black}"
                }}
            }}"#
        ));
    }

    // No explicit piece: the queen default applies and goes on the wire.
    let action = controller.on_drop("b7", "a8", None);
    assert_eq!(action, Some(ClientAction::MakeMove { uci: "b7a8q".into() }));
    assert!(controller.store().fen().starts_with("Q"));
}
