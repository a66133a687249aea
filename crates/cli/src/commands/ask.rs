//! `gena ask`: single question mode.

use std::path::PathBuf;

use gena_agent::CancellationToken;

pub async fn run(question: String, thread: Option<PathBuf>) -> anyhow::Result<()> {
    let agent = super::agent_from_config(thread).await?;

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let answer = agent.ask_with_cancellation(question, &token).await?;
    println!("{answer}");
    Ok(())
}
