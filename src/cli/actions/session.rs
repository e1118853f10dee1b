use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::navigation::{NavigationGuard, RouteTable, Router};
use crate::session::{
    AuthFailure, LoginCredentials, Registered, Registration, SessionStore,
    DEFAULT_EXPIRY_LEAD_MINUTES,
};
use crate::storage::FileStore;
use anyhow::{anyhow, bail, Result};
use chrono::SecondsFormat;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub enum Command {
    Login {
        email: String,
        password: SecretString,
    },
    Logout,
    Register {
        first_name: String,
        last_name: String,
        email: String,
        password: SecretString,
        password_confirm: SecretString,
    },
    Status,
    Verify,
    Refresh,
    Navigate {
        path: String,
    },
}

#[derive(Debug)]
pub struct Args {
    pub config: AppConfig,
    pub command: Command,
}

/// Execute a session command against the persisted session.
/// # Errors
/// Returns an error if the client cannot be built or the command fails.
pub async fn execute(args: Args) -> Result<()> {
    let Args { config, command } = args;
    debug!(
        api = %config.api_base_url,
        store = %config.store_path.display(),
        profile = %config.profile,
        "session command"
    );

    let api = ApiClient::from_config(&config)?;
    let storage = Arc::new(FileStore::new(config.store_path.clone()));
    let session = Arc::new(SessionStore::new(api, storage, config.profile));
    session.initialize().await;

    match command {
        Command::Login { email, password } => {
            let credentials = LoginCredentials::new(email, password.expose_secret());
            session.login(&credentials).await.map_err(failure)?;
            if let Some(principal) = session.current_principal().await {
                println!("Signed in as {}", principal.display_name());
            }
        }
        Command::Logout => {
            session.logout().await;
            println!("Signed out");
        }
        Command::Register {
            first_name,
            last_name,
            email,
            password,
            password_confirm,
        } => {
            let registration = Registration {
                first_name,
                last_name,
                email,
                password: password.expose_secret().to_string(),
                password_confirm: password_confirm.expose_secret().to_string(),
            };
            match session.register(&registration).await.map_err(failure)? {
                Registered::Created(principal) => {
                    println!(
                        "Administrator {} created, sign in to continue",
                        principal.email
                    );
                }
                Registered::Authenticated(principal) => {
                    println!("Registered and signed in as {}", principal.display_name());
                }
            }
        }
        Command::Status => print_status(&session).await,
        Command::Verify => {
            if !session.is_logged_in().await {
                bail!("Not signed in");
            }
            if !session.verify_token().await {
                bail!("Session token was rejected, signed out");
            }
            println!("Session token is valid");
        }
        Command::Refresh => {
            session.refresh_tokens().await.map_err(failure)?;
            if let Some(expires_at) = session.expires_at().await {
                println!(
                    "Session refreshed, expires at {}",
                    expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)
                );
            } else {
                println!("Session refreshed");
            }
        }
        Command::Navigate { path } => {
            let guard = NavigationGuard::new(Arc::clone(&session));
            let mut router = Router::new(RouteTable::standard()?, guard);
            let route = router.navigate(&path).await?;
            println!("{} ({})", route.path, route.name);
            if let Some(title) = router.title() {
                println!("Title: {title}");
            }
        }
    }

    Ok(())
}

async fn print_status(session: &SessionStore) {
    let snapshot = session.snapshot().await;
    println!("Profile: {}", session.profile());
    println!("API: {}", session.api().base_url());

    let Some(principal) = snapshot.principal.filter(|_| snapshot.authenticated) else {
        println!("Not signed in");
        return;
    };
    println!("Signed in as {} <{}>", principal.display_name(), principal.email);

    match snapshot.expires_at {
        Some(expires_at) => {
            let expiring = session.is_token_expiring(DEFAULT_EXPIRY_LEAD_MINUTES).await;
            println!(
                "Expires at {}{}",
                expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                if expiring { " (expiring soon)" } else { "" }
            );
        }
        None => println!("No expiry tracked"),
    }
}

fn failure(err: AuthFailure) -> anyhow::Error {
    let mut message = err.message;
    for (field, errors) in err.field_errors.iter().flatten() {
        message.push_str(&format!("\n  {field}: {}", errors.join(" ")));
    }
    anyhow!(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FieldErrors;

    #[test]
    fn failure_lists_field_errors() {
        let mut field_errors = FieldErrors::new();
        field_errors.insert(
            "email".to_string(),
            vec!["Enter a valid email address.".to_string()],
        );
        field_errors.insert(
            "password".to_string(),
            vec!["Too short.".to_string(), "Too common.".to_string()],
        );

        let err = failure(AuthFailure {
            message: "Unable to create administrator.".to_string(),
            field_errors: Some(field_errors),
        });

        assert_eq!(
            err.to_string(),
            "Unable to create administrator.\n  email: Enter a valid email address.\n  password: Too short. Too common."
        );
    }

    #[test]
    fn failure_without_fields_is_the_message() {
        let err = failure(AuthFailure::new("Unable to sign in."));
        assert_eq!(err.to_string(), "Unable to sign in.");
    }
}
