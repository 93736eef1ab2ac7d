use std::net::TcpListener;
use jwt_gate::auth::{InMemoryCredentials, JwtAuth};
use jwt_gate::configuration::get_configuration;
use jwt_gate::startup::run;
use jwt_gate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                e.to_string(),
            ));
        }
    };

    let credentials = InMemoryCredentials::from_settings(&configuration.users);
    if credentials.is_empty() {
        tracing::warn!("No users configured; every login will be rejected");
    }

    // Misconfiguration stops startup here instead of failing requests later
    let auth = JwtAuth::builder(configuration.jwt.clone())
        .with_authenticator(credentials)
        .build()
        .map_err(|e| {
            tracing::error!("Invalid JWT configuration: {}", e);
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
        })?;

    tracing::info!(
        realm = %auth.realm(),
        algorithm = %auth.algorithm(),
        refresh_enabled = auth.refresh_enabled(),
        "JWT gate configured"
    );

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, auth)?.await
}
