//! # Rooster Core
//! Shared foundation for the Rooster broadcast bot: the workspace error
//! type, startup configuration, domain types, and the traits that seam off
//! the external collaborators (chat transport, image search).

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::RoosterConfig;
pub use error::{Result, RoosterError};
pub use traits::{ImageSearch, Transport};
pub use types::{AuthState, ChatId, MembershipEvent, MembershipStatus, Subscriber};
