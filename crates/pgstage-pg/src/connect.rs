//! Postgres connections with TLS chosen from the connection string's sslmode.

use std::sync::Arc;

use rustls::ClientConfig;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};
use tokio_postgres::{Client, Socket};
use tokio_postgres_rustls_improved::MakeRustlsConnect;
use tracing::debug;

use crate::error::{PgError, PgResult};

/// Connect and spawn the connection task, returning only the client.
///
/// Dropping the client closes the connection; any open transaction on it is
/// rolled back by the server.
pub async fn connect_postgres(connection_string: &str) -> PgResult<Client> {
    if requires_tls(connection_string) {
        let config =
            ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
                .with_safe_default_protocol_versions()
                .map_err(|e| PgError::Connection(format!("TLS config error: {}", e)))?
                .with_root_certificates(root_certs())
                .with_no_client_auth();

        connect_with(connection_string, MakeRustlsConnect::new(config)).await
    } else {
        connect_with(connection_string, tokio_postgres::NoTls).await
    }
}

async fn connect_with<T>(connection_string: &str, tls: T) -> PgResult<Client>
where
    T: MakeTlsConnect<Socket> + Send,
    T::Stream: Send + 'static,
    T::TlsConnect: Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let (client, connection) = tokio_postgres::connect(connection_string, tls)
        .await
        .map_err(|e| PgError::Connection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(error = %e, "Postgres connection error");
        }
    });

    debug!("Connected to Postgres");
    Ok(client)
}

fn root_certs() -> rustls::RootCertStore {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    roots
}

/// Whether the connection string asks for an encrypted connection.
fn requires_tls(connection_string: &str) -> bool {
    ["sslmode=require", "sslmode=verify-ca", "sslmode=verify-full"]
        .iter()
        .any(|mode| connection_string.contains(mode))
}
