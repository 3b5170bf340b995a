//! Shared data model, advertisement bus, discovery cache and participant
//! primitives for Genesis — the distributed runtime described in
//! `SPEC_FULL.md`.

pub mod advertisement;
pub mod bus;
pub mod config;
pub mod discovery;
pub mod error;
pub mod guid;
pub mod lifecycle;
pub mod participant;
pub mod qos;

pub use advertisement::{Advertisement, AdvertisementBus, AdvertisementEvent, BusSubscription, Kind};
pub use bus::LocalBus;
pub use config::Config;
pub use discovery::DiscoveryCache;
pub use error::{GenesisError, Result};
pub use guid::Guid;
pub use lifecycle::{InterfaceState, ProviderState};
pub use participant::Participant;
pub use qos::{QosLibrary, QosProfile};
