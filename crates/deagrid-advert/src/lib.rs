//! deagrid-advert — node capacity advertisements.
//!
//! Worker nodes periodically broadcast how much memory they have free,
//! which runtime stacks they host, and how many instances of each
//! application they run. Each broadcast becomes one [`Advertisement`],
//! which a scheduler consults to decide whether a new instance fits on
//! that node.
//!
//! # Components
//!
//! - **`message`** — Typed decoding and validation of the inbound payload
//! - **`advertisement`** — Capacity predicates, instance accounting, freshness
//! - **`clock`** — Injectable time source
//! - **`config`** — `deagrid.toml` parsing (freshness threshold)
//!
//! Receiving broadcasts, indexing them per node, and choosing between
//! eligible nodes are left to the caller.

pub mod advertisement;
pub mod clock;
pub mod config;
pub mod error;
pub mod message;

pub use advertisement::{ADVERTISEMENT_TTL, Advertisement};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AdvertisementConfig, DeagridConfig};
pub use error::{AdvertError, AdvertResult};
pub use message::AdvertisementMessage;
