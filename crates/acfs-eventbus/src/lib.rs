//! Event fan-out substrate: a bounded, TTL-aware ring buffer feeding a
//! channel-addressed pub/sub hub. Every other coordination core publishes
//! through [`hub::Hub`].

pub mod hub;
pub mod ring;

pub use hub::{Channel, Event, Hub, HubConfig, HubStats, SharedHub, SubscriptionHandle, publish_if_present};
pub use ring::{DropStats, RingBuffer};
