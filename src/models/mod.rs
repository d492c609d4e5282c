pub mod identity;
pub mod messages;

// Re-export important types
pub use identity::*;
pub use messages::*;
