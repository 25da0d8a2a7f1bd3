pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod relay;

pub use config::Config;
pub use error::{Error, Result};
pub use protocol::{PlayerId, SignalMessage};
pub use relay::{Admission, Relay};
