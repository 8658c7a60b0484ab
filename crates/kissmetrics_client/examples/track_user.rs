use kissmetrics_client::{
    AliasIdentity, Client, ClientConfig, Properties, RecordEvent, SetProperties,
};

use std::env;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};

const ENV_PERSON: &str = "KISSMETRICS_EXAMPLE_PERSON"; // Optional

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let default_log_filter = "info,kissmetrics_client=debug,kissmetrics_transport=info";
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| default_log_filter.to_string()))
        .init();

    if dotenvy::dotenv().is_ok() {
        info!(".env file loaded successfully.");
    } else {
        info!("No .env file found. Proceeding with environment variables.");
    }

    let config = ClientConfig::from_env()?;
    let mut client = Client::new(config)?;

    let person = env::var(ENV_PERSON).unwrap_or_else(|_| "example-user@example.com".to_string());
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;

    let calls = [
        client
            .record(
                RecordEvent::builder()
                    .person(person.as_str())
                    .event("Ran Example")
                    .properties(Properties::new().insert("language", "rust"))
                    .timestamp(now)
                    .build(),
            )
            .await,
        client
            .set(
                SetProperties::builder()
                    .person(person.as_str())
                    .properties(Properties::new().insert("sdk", "kissmetrics_client"))
                    .build(),
            )
            .await,
        client
            .alias(
                AliasIdentity::builder()
                    .person(person.as_str())
                    .identity("example-anonymous-id")
                    .build(),
            )
            .await,
    ];

    for result in calls {
        match result {
            Ok(response) => info!(status = %response.status, "Tracking call accepted"),
            Err(e) => error!(error = %e, "Tracking call failed"),
        }
    }

    Ok(())
}
