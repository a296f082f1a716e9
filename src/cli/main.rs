use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use todo_sync::client::{ClientConfig, TodoSyncClient};
use todo_sync::render::TextRenderer;

/// Terminal client: draws the list on every snapshot and toggles the todo
/// whose id is typed on stdin. `q` or end of input quits.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    #[cfg(feature = "tracing")]
    {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
            .init();
    }

    let config = ClientConfig::from_env().context("Invalid client configuration")?;
    let (client, handle) = TodoSyncClient::new(config, TextRenderer::clearing(std::io::stdout()))
        .context("Failed to start sync client")?;
    let running = tokio::spawn(client.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    let line = line.trim();
                    if line == "q" || line == "quit" {
                        break;
                    }
                    match line.parse::<i64>() {
                        Ok(id) => handle.toggle(id)?,
                        Err(_) if line.is_empty() => {}
                        Err(_) => eprintln!("Type a todo id to toggle it, or q to quit"),
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown();
    running.await.context("Sync client task failed")?;
    Ok(())
}
