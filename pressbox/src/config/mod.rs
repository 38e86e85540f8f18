//! Stack configuration generator
//!
//! Pure derivation of the database descriptor, security keys and the
//! wp-config / nginx / php-fpm text from environment input.

pub mod database;
pub mod env;
pub mod escape;
pub mod layout;
pub mod secrets;
pub mod templates;

pub use database::ConnectionDescriptor;
pub use env::{EnvSource, ProcessEnv};
pub use escape::escape_php_single_quoted;
pub use layout::StackLayout;
pub use secrets::SecurityKeys;
pub use templates::{render_fpm_conf, render_nginx_conf, render_wp_config, WordPressOptions};
