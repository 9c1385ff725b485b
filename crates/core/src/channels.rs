//! WebSocket frame type names pushed to connected clients.

/// A new in-app notification for the receiving user.
pub const FRAME_NOTIFICATION: &str = "notification";

/// Sent once after a socket has been authenticated and registered.
pub const FRAME_CONNECTED: &str = "connected";
