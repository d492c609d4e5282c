pub mod connection;
pub mod controller;
pub mod router;

pub use connection::{build_room_url, SessionConnection, SessionReceiver, SessionSender};
pub use controller::{SessionController, SessionEvent, SessionState};
pub use router::{classify, Routed};
