pub mod config_loader;
pub mod paths;
pub mod session_store;

pub use config_loader::{BACKEND_URL_ENV, ConfigLoader};
pub use paths::TutorlinkPaths;
pub use session_store::TomlSessionStore;
