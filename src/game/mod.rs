pub mod engine;
pub mod store;

pub use engine::{parse_square, parse_uci, replay, MoveDetail, Position};
pub use store::GameStateStore;
