//! Atrium event relay.
//!
//! - [`PlatformEvent`] is the event envelope handlers build.
//! - [`EventRelay`] writes each event to the `event_bus` table and then fans
//!   the stored row out on the in-process [`EventBus`].
//!
//! Subscribers (the notification router in the API crate) receive
//! [`PublishedEvent`]s, which always carry the database id of the event.

pub mod bus;
pub mod relay;

pub use bus::{EventBus, PlatformEvent, PublishedEvent};
pub use relay::{EventRelay, PublishOptions};
