//! Authentication command handlers.

use crate::auth::{
    ConsoleCodeProvider, Credential, CredentialResolver, CredentialSource, FileRefreshTokenStore,
    RefreshTokenStore,
};
use crate::config::load_config;
use crate::error::Result;

async fn resolve_credential(no_browser: bool) -> Result<Credential> {
    let config = load_config()?;
    // The default token path lives in the config directory; make sure it
    // exists before the exchanger tries to persist there.
    crate::config::paths::ensure_config_dir()?;
    let sources = CredentialSource::from_config(&config)?;

    let store = FileRefreshTokenStore::new(config.auth.token_path()?);
    let resolver = CredentialResolver::new(
        &config,
        Box::new(store),
        Box::new(ConsoleCodeProvider::new(no_browser)),
    )?;

    resolver.resolve(&sources).await
}

/// Handle the `dstore auth login` command.
pub async fn handle_login(no_browser: bool) -> Result<()> {
    let credential = resolve_credential(no_browser).await?;

    println!("Credential acquired.");
    if let Some(expires_at) = credential.expires_at {
        println!("  Expires: {expires_at}");
    }
    if credential.can_refresh() {
        println!("  Refresh token cached; future runs will not prompt.");
    }

    Ok(())
}

/// Handle the `dstore auth token` command.
///
/// Prints the bearer token alone to stdout so it can be piped; operator
/// prompts go to stderr.
pub async fn handle_token(no_browser: bool) -> Result<()> {
    let credential = resolve_credential(no_browser).await?;
    println!("{}", credential.access_token);
    Ok(())
}

/// Handle the `dstore auth status` command.
pub async fn handle_status() -> Result<()> {
    let config = load_config()?;

    let secrets_path = config.auth.secrets_path()?;
    let store = FileRefreshTokenStore::new(config.auth.token_path()?);

    println!("Client secrets: {}", secrets_path.display());
    if secrets_path.exists() {
        println!("  Present");
    } else {
        println!("  Missing - interactive authorization will not work");
    }

    println!("Refresh token:  {}", store.path().display());
    if store.load()?.is_some() {
        println!("  Cached - resolution will refresh without prompting");
    } else {
        println!("  Not cached - next resolution may prompt");
    }

    let sa = &config.auth.service_account;
    match (&sa.account_id, &sa.key_file) {
        (Some(account), Some(key)) => {
            println!("Service account: {account} (key: {})", key.display());
        }
        (None, None) => println!("Service account: not configured"),
        _ => println!("Service account: half-configured - will be skipped"),
    }

    if config.platform.enabled {
        println!("Platform identity probe: enabled");
    } else {
        println!("Platform identity probe: disabled");
    }

    Ok(())
}

/// Handle the `dstore auth reset` command.
pub async fn handle_reset() -> Result<()> {
    let config = load_config()?;
    let store = FileRefreshTokenStore::new(config.auth.token_path()?);

    if store.clear()? {
        println!("Cached refresh token removed. The next resolution will re-authorize.");
    } else {
        println!("No cached refresh token.");
    }

    Ok(())
}
