pub mod toml_loader;

pub use toml_loader::{load_all_submissions, load_artifact, load_toml_to_submission};
