//! Applied-state graph and persistence engine for interactive scripts.
//!
//! This crate provides:
//! - Qualified identifiers with a closed set of categories
//! - A per-domain registry of states linked by symmetric peer relations
//! - Durations that compose across linked states
//! - Items and instances applied onto states, with apply rules
//! - Opt-in persistence into a key-value store or a JSON snapshot file
//!
//! # Quick Start
//!
//! ```ignore
//! use playstate_core::{name, Item, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new().with_store_path("state.json");
//!     let mut session = Session::open(config).await?;
//!
//!     session.add_item(
//!         Item::new(name!("Toys.Collar:leather")).with_default_peers([name!("Body.AroundNeck")]),
//!     );
//!     session.apply_item(&name!("Toys.Collar:leather"))?;
//!     session.registry().remember(&name!("Toys.Collar"))?;
//!
//!     session.save().await?;
//!     Ok(())
//! }
//! ```

pub mod duration;
pub mod ident;
pub mod inventory;
pub mod item;
pub mod persist;
pub mod registry;
pub mod rules;
pub mod session;
pub mod state;
pub mod store;
pub mod testing;

// Primary public API
pub use duration::{Clock, Duration, DurationError, End, Limit, SystemClock, TimeUnit};
pub use ident::{Attribute, Category, Domain, IdentifierError, QualifiedName};
pub use inventory::Inventory;
pub use item::{Item, ItemError};
pub use persist::{JsonFileStore, PersistError, SavedStore};
pub use registry::{RegistryConfig, RegistryError, StateHandle, StateRegistry};
pub use rules::{ApplyRules, Rule};
pub use session::{Session, SessionConfig, SessionError};
pub use state::{PeerToken, State};
pub use store::{MemoryStore, PersistentStore, StoreError, StoreKey};
pub use testing::{ManualClock, TestHarness};
