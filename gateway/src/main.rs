//! Gateway main entry point
//!
//! Operator CLI for minting and inspecting storefront tokens with the
//! configured secret.

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::{TokenCodec, User};
use gateway_lib::GatewayConfig;

const USAGE: &str = "Usage:
  gateway issue <email> <user-id> [--staff] [--superuser] [--perm <PERMISSION>]...
  gateway inspect <token>

Environment:
  JWT_SECRET (required), JWT_ALGORITHM, JWT_ACCESS_TTL_SECS, JWT_REFRESH_TTL_SECS";

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gateway=info,auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        println!("{}", USAGE);
        return Ok(());
    };

    match command.as_str() {
        "issue" => {
            let config = GatewayConfig::from_env()?;
            let user = parse_issue_args(&args[2..])?;
            issue(&TokenCodec::new(config.token), &user)
        }
        "inspect" => {
            let config = GatewayConfig::from_env()?;
            let token = args.get(2).context("inspect requires a token")?;
            inspect(&TokenCodec::new(config.token), token)
        }
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("unknown command: {}\n\n{}", other, USAGE),
    }
}

fn parse_issue_args(args: &[String]) -> Result<User> {
    let email = args.first().context("issue requires an email")?;
    let id: i64 = args
        .get(1)
        .context("issue requires a user id")?
        .parse()
        .context("user id must be an integer")?;

    let mut user = User::new(id, email.clone());
    let mut permissions = Vec::new();
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--staff" => user = user.with_staff(true),
            "--superuser" => user = user.with_superuser(true),
            "--perm" if i + 1 < args.len() => {
                permissions.push(args[i + 1].clone());
                i += 1;
            }
            other => bail!("unexpected argument: {}", other),
        }
        i += 1;
    }

    Ok(user.with_permissions(permissions))
}

fn issue(codec: &TokenCodec, user: &User) -> Result<()> {
    let permissions = (!user.permissions.is_empty()).then_some(user.permissions.as_slice());
    let access = codec.create_access_token(user, permissions)?;
    let refresh = codec.create_refresh_token(user)?;

    tracing::info!("Issued tokens for {} ({})", user.email, user.global_id());
    println!("access:  {}", access);
    println!("refresh: {}", refresh);
    Ok(())
}

fn inspect(codec: &TokenCodec, token: &str) -> Result<()> {
    let claims = codec.decode(token)?;
    println!("{}", serde_json::to_string_pretty(&claims)?);
    Ok(())
}
