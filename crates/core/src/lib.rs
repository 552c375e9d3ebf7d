pub mod config;
pub mod error;
pub mod state;
pub mod taxonomy;
pub mod types;

pub use config::{parse_site_toml, parse_site_toml_str};
pub use error::{Error, Result};
pub use state::AccordionState;
pub use taxonomy::{Category, Taxonomy};
pub use types::*;
