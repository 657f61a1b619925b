//! # CLI Module
//!
//! The `routekit` binary inspects a TOML route manifest.
//!
//! ## Commands
//!
//! ```bash
//! # Every route, in registration order
//! routekit --routes routes.toml list
//!
//! # Which route serves a request, and with which parameters
//! routekit --routes routes.toml match GET /users/42 --host api.example.com
//!
//! # Reverse routing
//! routekit --routes routes.toml url user_show id=42 --absolute --host example.com
//! ```
//!
//! `--config <FILE>` reads a [`crate::config::RouterConfig`] from TOML;
//! without it the `ROUTEKIT_*` environment variables apply. Middleware
//! aliases in the manifest need no implementation here.

mod commands;


pub use commands::{run_cli, Cli, Commands};
