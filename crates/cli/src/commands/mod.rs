//! CLI subcommands.

pub mod migrate;
pub mod session;
pub mod user;

use secrecy::SecretString;

/// Database URL from `PD_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first if present.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    ["PD_DATABASE_URL", "DATABASE_URL"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
        .map(SecretString::from)
}
