//! Notification routing infrastructure.
//!
//! The [`NotificationRouter`] subscribes to the event bus, stores one
//! notification per target user, and pushes it over that user's sockets.

pub mod router;

pub use router::NotificationRouter;
