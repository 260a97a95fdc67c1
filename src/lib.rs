//! Spotdeck Library
//!
//! This library provides the pieces of a same-origin Spotify web player: the
//! cookie-based OAuth shim, a pass-through proxy for the Spotify Web API, the
//! playback controller with its position-extrapolating state model, and the
//! library browser used by both the web front end and the terminal client.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for auth, proxy, home feed and health
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `management` - Token cache, playback synchronization and home feed assembly
//! - `server` - Router construction and the HTTP servers
//! - `spotify` - Spotify accounts and Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use spotdeck::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> spotdeck::Res<()> {
//!     config::load_env().await?;
//!     server::start_web_server(config::ServerSettings::from_env()?).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Uses a boxed dynamic error trait object that stays `Send + Sync` so it can
/// cross task boundaries in the async server and CLI code.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Listening on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only meant for unrecoverable errors in the command-line layer. Request
/// handlers never call it; they log with [`warning!`] and answer with an
/// error response instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
