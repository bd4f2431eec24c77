//! User Accounts
//!
//! Account lifecycle behind a role-based field access policy:
//! - Create, read, merge/replace and soft-delete user records
//! - Login/logout with explicit denial reasons
//! - Per-key profile data
//! - Append-only audit trail of every mutation

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::io::Write;
use std::sync::Arc;

use api::state::AppState;
use domain::{AuditEntry, ProfileEntry, User};
use infrastructure::{
    audit::StorageAuditLog,
    auth::{JwtConfig, JwtService},
    profile::ProfileDataStore,
    storage::{StorageFactory, AUDIT_TABLE, PROFILE_TABLE, USERS_TABLE},
    user::{Argon2Hasher, StorageUserRepository, UserAccountService},
};
use rand::Rng;
use tracing::{info, warn};

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config.storage.to_storage_config()?;
    info!("Storage backend: {:?}", storage_config.storage_type());

    let factory = StorageFactory::connect(&storage_config).await?;
    let user_storage = factory.create::<User>(USERS_TABLE).await?;
    let profile_storage = factory.create::<ProfileEntry>(PROFILE_TABLE).await?;
    let audit_storage = factory.create::<AuditEntry>(AUDIT_TABLE).await?;

    let accounts = Arc::new(UserAccountService::new(
        Arc::new(StorageUserRepository::new(user_storage)),
        Arc::new(Argon2Hasher::new()),
        ProfileDataStore::new(profile_storage),
        Arc::new(StorageAuditLog::new(audit_storage)),
    ));

    create_initial_admin_user(&accounts, config, &mut std::io::stderr()).await?;

    let jwt_service = create_jwt_service(config);

    Ok(AppState::new(accounts, jwt_service))
}

fn create_jwt_service(config: &AppConfig) -> Arc<JwtService> {
    if config.auth.jwt_secret == crate::config::AuthConfig::default().jwt_secret {
        warn!("Using the default JWT secret; set APP__AUTH__JWT_SECRET in production");
    }

    Arc::new(JwtService::new(JwtConfig::new(
        config.auth.jwt_secret.clone(),
        config.auth.jwt_expiration_hours,
    )))
}

/// Generate a random password for the initial admin user
fn generate_random_password() -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Create an initial admin user if no users exist
///
/// A generated password goes to `credential_out` only, never to the log.
async fn create_initial_admin_user<W: Write>(
    accounts: &api::state::AccountService,
    config: &AppConfig,
    credential_out: &mut W,
) -> anyhow::Result<()> {
    let bootstrap = &config.bootstrap;
    let (password, is_configured) = match &bootstrap.admin_password {
        Some(p) if !p.is_empty() => (p.clone(), true),
        _ => (generate_random_password(), false),
    };

    let Some(admin) = accounts
        .bootstrap_admin(&bootstrap.admin_email, &password)
        .await?
    else {
        return Ok(());
    };

    info!("===========================================");
    info!("Initial admin user created!");
    info!("Email: {}", bootstrap.admin_email);
    info!("UUID: {}", admin.uuid());

    if is_configured {
        info!("Password: (set via bootstrap.admin_password)");
    } else {
        write_generated_password(credential_out, &bootstrap.admin_email, &password)?;
        info!("Password: (generated, written to stderr)");
    }

    info!("Please change this password after first login.");
    info!("===========================================");

    Ok(())
}

fn write_generated_password<W: Write>(out: &mut W, email: &str, password: &str) -> std::io::Result<()> {
    writeln!(out, "Generated password for {}: {}", email, password)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Requester, UserUuid};

    fn config_with_admin_password() -> AppConfig {
        let mut config = AppConfig::default();
        config.bootstrap.admin_password = Some("bootstrap-secret".to_string());
        config
    }

    #[tokio::test]
    async fn test_state_bootstraps_admin_once() {
        let state = create_app_state_with_config(&config_with_admin_password())
            .await
            .unwrap();

        assert_eq!(state.accounts.count().await.unwrap(), 1);

        // second bootstrap on the same store is a no-op
        let mut out = Vec::new();
        create_initial_admin_user(&state.accounts, &config_with_admin_password(), &mut out)
            .await
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(state.accounts.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bootstrapped_admin_can_authenticate() {
        let state = create_app_state_with_config(&config_with_admin_password())
            .await
            .unwrap();

        let outcome = state
            .accounts
            .authenticate("admin@example.com", "bootstrap-secret")
            .await
            .unwrap();

        match outcome {
            infrastructure::user::LoginOutcome::Success(user) => {
                assert!(user.is_admin());
                assert_eq!(user.login_count(), 1);
                let requester = Requester::for_user(&user);
                assert!(requester.can_access(&UserUuid::generate()));
            }
            other => panic!("expected successful login, got {other:?}"),
        }
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn empty_accounts() -> api::state::AccountService {
        use crate::infrastructure::storage::InMemoryStorage;

        UserAccountService::new(
            Arc::new(StorageUserRepository::new(Arc::new(InMemoryStorage::<User>::new()))),
            Arc::new(Argon2Hasher::new()),
            ProfileDataStore::new(Arc::new(InMemoryStorage::<ProfileEntry>::new())),
            Arc::new(StorageAuditLog::new(Arc::new(InMemoryStorage::<AuditEntry>::new()))),
        )
    }

    #[tokio::test]
    async fn test_generated_password_is_never_logged() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let accounts = empty_accounts();
        let mut out = Vec::new();
        create_initial_admin_user(&accounts, &AppConfig::default(), &mut out)
            .await
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        let password = printed.trim_end().rsplit(": ").next().unwrap().to_string();
        assert_eq!(password.len(), 16);

        let outcome = accounts
            .authenticate("admin@example.com", &password)
            .await
            .unwrap();
        assert!(matches!(outcome, infrastructure::user::LoginOutcome::Success(_)));

        let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("Initial admin user created!"));
        assert!(!logs.contains(&password));
    }

    #[test]
    fn test_generated_password_goes_to_credential_output() {
        let mut out = Vec::new();
        write_generated_password(&mut out, "admin@example.com", "s3cretPassw0rd12").unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Generated password for admin@example.com: s3cretPassw0rd12\n"
        );
    }

    #[test]
    fn test_generated_password_shape() {
        let password = generate_random_password();
        assert_eq!(password.len(), 16);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_postgres_without_url_is_rejected() {
        let mut config = AppConfig::default();
        config.storage.backend = "postgres".to_string();
        config.storage.url = None;

        if std::env::var("DATABASE_URL").is_err() {
            assert!(create_app_state_with_config(&config).await.is_err());
        }
    }
}
