//! Walkthrough against a running Ebakus node
//!
//! Remote signing:
//!   EBAKUS_ADDRESS=0x... cargo run --example users
//! Local signing:
//!   EBAKUS_KEYSTORE=/path/keystore.json EBAKUS_KEYSTORE_PASS=... cargo run --example users
//!
//! `EBAKUS_HOST`, `EBAKUS_PORT` and `EBAKUS_SECURE` override the node endpoint.

use anyhow::{Context, Result};
use ebakusdb_client::EbakusDbClient;
use ebakusdb_core::{ClientConfig, FieldSchema, KeystoreSource, Schema, SigningMode, TableSchema};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct User {
    id: u64,
    name: String,
    pass: String,
    email: String,
}

fn config_from_env() -> Result<ClientConfig> {
    let schema = Schema::new().with_table(TableSchema::new(
        "Users",
        vec![
            FieldSchema::new("Id", "uint64"),
            FieldSchema::new("Name", "string"),
            FieldSchema::new("Pass", "string"),
            FieldSchema::new("Email", "string"),
        ],
    ));

    let signing = match std::env::var("EBAKUS_KEYSTORE") {
        Ok(path) => SigningMode::Local {
            keystore: KeystoreSource::Path(path.into()),
            password: std::env::var("EBAKUS_KEYSTORE_PASS")
                .context("EBAKUS_KEYSTORE_PASS is required with EBAKUS_KEYSTORE")?,
        },
        Err(_) => SigningMode::Remote {
            address: std::env::var("EBAKUS_ADDRESS")
                .context("set EBAKUS_ADDRESS or EBAKUS_KEYSTORE")?
                .parse()
                .context("invalid EBAKUS_ADDRESS")?,
        },
    };

    let mut config = ClientConfig::new(schema, signing)
        .with_secure(std::env::var("EBAKUS_SECURE").map(|v| v == "true").unwrap_or(false));
    if let Ok(host) = std::env::var("EBAKUS_HOST") {
        config = config.with_host(host);
    }
    if let Ok(port) = std::env::var("EBAKUS_PORT") {
        config = config.with_port(port.parse().context("invalid EBAKUS_PORT")?);
    }
    Ok(config)
}

async fn print_users(client: &EbakusDbClient) -> Result<()> {
    let mut cursor = client.select("Users", "", "Email ASC", None).await?;
    while let Some(user) = cursor.next_as::<User>().await? {
        info!("  {:?}", user);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let client = EbakusDbClient::new(config_from_env()?)?;
    info!("Connected as {:?}", client.address());

    // Fails when the table already exists for this account
    match client.create_table("Users", &["Name", "Email"]).await {
        Ok(created) => info!("createTable: {}", created),
        Err(e) if e.is_transaction_failure() => warn!("createTable: table already exists"),
        Err(e) => return Err(e.into()),
    }

    let users = [
        User {
            id: 0,
            name: "Harry".to_string(),
            pass: "123".to_string(),
            email: "harry@ebakus.com".to_string(),
        },
        User {
            id: 1,
            name: "Chris".to_string(),
            pass: "456".to_string(),
            email: "chris@ebakus.com".to_string(),
        },
    ];
    for user in &users {
        info!("insertObj {}: {}", user.name, client.insert_obj("Users", user).await?);
    }

    let chris: Option<User> = client.get_as("Users", "Id = 1", "Email ASC", None).await?;
    info!("get Id = 1: {:?}", chris);

    info!("Select all users");
    print_users(&client).await?;

    info!("deleteObj: {}", client.delete_obj("Users", &json!({ "Id": 1 })).await?);

    info!("Select all users");
    print_users(&client).await?;

    Ok(())
}
