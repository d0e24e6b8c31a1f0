//! Operator CLI for clinic-records.
//!
//! Initializes the database schema, provisions admin accounts, and issues
//! bearer tokens for existing accounts without going through the HTTP API.

use std::collections::VecDeque;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use clinic_records::domain::{ProfileUpdate, Role};
use clinic_records::infra::PgPatientStore;
use clinic_records::server::Config;
use clinic_records::{AuthService, NewPatient, TokenCodec};

fn print_help() {
    eprintln!(
        r#"clinic-records-admin

USAGE:
    clinic-records-admin <COMMAND> [OPTIONS]

COMMANDS:
    migrate         Initialize the database schema
    create-admin    Create an account with the admin role
    issue-token     Issue a bearer token for an existing account
    help            Show this message

OPTIONS (migrate):
    --database-url <URL>    Postgres URL (defaults to env DATABASE_URL)

OPTIONS (create-admin):
    --email <EMAIL>         Login email (required)
    --password <PASSWORD>   Login password, at least 6 characters (required)
    --name <NAME>           First name (default: Admin)
    --last-name <NAME>      Last name (default: Account)
    --database-url <URL>    Postgres URL (defaults to env DATABASE_URL)

OPTIONS (issue-token):
    --email <EMAIL>         Account email (required)
    --database-url <URL>    Postgres URL (defaults to env DATABASE_URL)

create-admin and issue-token read the signing key from env JWT_SECRET."#
    );
}

fn require_database_url(database_url: Option<String>) -> anyhow::Result<String> {
    match database_url.or_else(|| std::env::var("DATABASE_URL").ok()) {
        Some(url) => Ok(url),
        None => anyhow::bail!("no database URL; pass --database-url or set DATABASE_URL"),
    }
}

async fn connect_store(database_url: Option<String>) -> anyhow::Result<Arc<PgPatientStore>> {
    let url = require_database_url(database_url)?;
    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await?;
    Ok(Arc::new(PgPatientStore::new(pool)))
}

fn auth_service(store: Arc<PgPatientStore>) -> anyhow::Result<AuthService> {
    let config = Config::from_env()?;
    let codec = TokenCodec::new(&config.signing_key, config.token_ttl)?;
    Ok(AuthService::new(store, Arc::new(codec)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args: VecDeque<String> = std::env::args().skip(1).collect();
    let Some(command) = args.pop_front() else {
        print_help();
        return Ok(());
    };

    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_help();
        return Ok(());
    }

    match command.as_str() {
        "migrate" => {
            let mut database_url: Option<String> = None;
            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--database-url" => {
                        database_url = Some(args.pop_front().ok_or_else(|| {
                            anyhow::anyhow!("missing value for --database-url")
                        })?);
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let store = connect_store(database_url).await?;
            store.initialize().await?;
            println!("ok: schema initialized");
        }
        "create-admin" => {
            let mut email: Option<String> = None;
            let mut password: Option<String> = None;
            let mut name = "Admin".to_owned();
            let mut last_name = "Account".to_owned();
            let mut database_url: Option<String> = None;
            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--email" => {
                        email = Some(
                            args.pop_front()
                                .ok_or_else(|| anyhow::anyhow!("missing value for --email"))?,
                        );
                    }
                    "--password" => {
                        password = Some(
                            args.pop_front()
                                .ok_or_else(|| anyhow::anyhow!("missing value for --password"))?,
                        );
                    }
                    "--name" => {
                        name = args
                            .pop_front()
                            .ok_or_else(|| anyhow::anyhow!("missing value for --name"))?;
                    }
                    "--last-name" => {
                        last_name = args
                            .pop_front()
                            .ok_or_else(|| anyhow::anyhow!("missing value for --last-name"))?;
                    }
                    "--database-url" => {
                        database_url = Some(args.pop_front().ok_or_else(|| {
                            anyhow::anyhow!("missing value for --database-url")
                        })?);
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let email = email.ok_or_else(|| anyhow::anyhow!("--email is required"))?;
            let password = password.ok_or_else(|| anyhow::anyhow!("--password is required"))?;
            if !email.contains('@') {
                anyhow::bail!("--email must be a valid email address");
            }
            if password.chars().count() < 6 {
                anyhow::bail!("--password must be at least 6 characters");
            }

            let store = connect_store(database_url).await?;
            store.initialize().await?;
            let service = auth_service(store)?;
            let outcome = service
                .create_account(
                    NewPatient {
                        email,
                        password,
                        name,
                        last_name,
                        profile: ProfileUpdate::default(),
                    },
                    Role::Admin,
                )
                .await?;
            println!("ok: admin account created");
            println!("  patient_id: {}", outcome.patient.id);
        }
        "issue-token" => {
            let mut email: Option<String> = None;
            let mut database_url: Option<String> = None;
            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--email" => {
                        email = Some(
                            args.pop_front()
                                .ok_or_else(|| anyhow::anyhow!("missing value for --email"))?,
                        );
                    }
                    "--database-url" => {
                        database_url = Some(args.pop_front().ok_or_else(|| {
                            anyhow::anyhow!("missing value for --database-url")
                        })?);
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let email = email.ok_or_else(|| anyhow::anyhow!("--email is required"))?;
            let store = connect_store(database_url).await?;
            let service = auth_service(store)?;
            let token = service.issue_token(&email).await?;
            println!("{token}");
        }
        other => {
            print_help();
            anyhow::bail!("unknown command: {other}");
        }
    }

    Ok(())
}
