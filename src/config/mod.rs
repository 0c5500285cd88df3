//! Application configuration: schema and disk I/O.

mod io;
mod schema;

pub use io::{config_path, load_config, save_config};
pub use schema::Config;
