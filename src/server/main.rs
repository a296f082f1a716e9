use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use todo_sync::adapters::{HostConfig, TodoHost};
use todo_sync::core::Todo;
use todo_sync::storage::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    #[cfg(feature = "tracing")]
    {
        tracing_subscriber::fmt()
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
            .init();
    }

    let addr = std::env::var("TODO_HOST_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let todos = match std::env::var("TODO_HOST_SEED") {
        Ok(path) => load_seed(&path)?,
        Err(_) => Vec::new(),
    };
    let host = TodoHost::new(Arc::new(MemoryStore::with_todos(todos)), HostConfig::default());

    match (std::env::var("TODO_HOST_TLS_CERT"), std::env::var("TODO_HOST_TLS_KEY")) {
        (Ok(cert), Ok(key)) => {
            let addr = addr
                .parse::<SocketAddr>()
                .with_context(|| format!("Invalid TODO_HOST_ADDR {addr}"))?;
            host.serve_tls(addr, PathBuf::from(cert), PathBuf::from(key)).await?;
        }
        (Err(_), Err(_)) => host.serve(&addr).await?,
        _ => anyhow::bail!("TODO_HOST_TLS_CERT and TODO_HOST_TLS_KEY must be set together"),
    }
    Ok(())
}

fn load_seed(path: &str) -> anyhow::Result<Vec<Todo>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read seed file {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Seed file {path} is not a JSON todo list"))
}
