use axum_server::tls_rustls::RustlsConfig;
use std::path::PathBuf;

use crate::core::SyncError;

pub async fn configure_tls(cert_path: PathBuf, key_path: PathBuf) -> Result<RustlsConfig, SyncError> {
    Ok(RustlsConfig::from_pem_file(cert_path, key_path).await?)
}
