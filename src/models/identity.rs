use chess::Color;
use log::warn;

use crate::models::GameSnapshot;

/// Who this client is within the session: the username confirmed by the
/// server's `connected` message, and the color resolved from the
/// `joined`/`reconnected` snapshot.
///
/// Both fields are set once per connection lifetime. `reset_color`
/// clears the assignment on disconnect so a fresh join resolves anew.
#[derive(Debug, Default, Clone)]
pub struct ClientIdentity {
    username: Option<String>,
    assigned_color: Option<Color>,
}

impl ClientIdentity {
    pub fn new() -> Self {
        ClientIdentity::default()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn assigned_color(&self) -> Option<Color> {
        self.assigned_color
    }

    /// Bind the username confirmed by the server. First binding wins.
    pub fn bind_username(&mut self, user: String) {
        match &self.username {
            None => self.username = Some(user),
            Some(existing) if *existing != user => {
                warn!("server reported user {} but identity is already bound to {}", user, existing);
            }
            Some(_) => {}
        }
    }

    pub fn is_me(&self, name: Option<&str>) -> bool {
        match (self.username.as_deref(), name) {
            (Some(me), Some(other)) => me == other,
            _ => false,
        }
    }

    /// Resolve the assigned color from a session snapshot by comparing
    /// player names to the bound username. Set once; later snapshots on
    /// the same connection cannot reassign it.
    pub fn resolve_color(&mut self, game: &GameSnapshot) -> Option<Color> {
        if self.assigned_color.is_none() {
            if let Some(user) = self.username.as_deref() {
                self.assigned_color = game.color_of(user);
            }
        }
        self.assigned_color
    }

    /// Forget the color assignment. Called on disconnect; the next
    /// `joined`/`reconnected` snapshot re-resolves it.
    pub fn reset_color(&mut self) {
        self.assigned_color = None;
    }
}
