//! `gena chat`: interactive conversation on a single thread.

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;

use gena_agent::{Agent, CancellationToken};
use gena_core::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

pub async fn run(thread: Option<PathBuf>) -> anyhow::Result<()> {
    let agent = super::agent_from_config(thread).await?;
    let history = agent.thread_store().snapshot().await?.len();

    println!();
    println!("  Gena: Interactive Mode");
    println!();
    println!("  Model:     {}", agent.model());
    println!("  Tools:     {}", agent.tool_names().join(", "));
    println!("  Thread:    {} ({history} messages)", agent.thread_store().name());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Ctrl+C cancels a pending answer. At the prompt, Ctrl+C, Ctrl+D or 'exit' quits.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = read_prompt(&mut lines, interrupted()).await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        match ask_until_interrupted(&agent, line, interrupted()).await {
            Ok(answer) => {
                println!();
                for line in answer.lines() {
                    println!("  Gena > {line}");
                }
                println!();
            }
            Err(Error::Cancelled) => eprintln!("  [Cancelled]"),
            Err(e) => eprintln!("  [Error] {e}"),
        }
    }

    println!();
    println!("  Bye.");
    Ok(())
}

/// Resolves on Ctrl+C. Never resolves if the signal cannot be watched.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Next input line, or `None` once input ends or `interrupt` fires first.
async fn read_prompt<R>(
    lines: &mut Lines<R>,
    interrupt: impl Future<Output = ()>,
) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    tokio::select! {
        line = lines.next_line() => line,
        () = interrupt => Ok(None),
    }
}

/// Ask `question`, cancelling the answer if `interrupt` fires first.
async fn ask_until_interrupted(
    agent: &Agent,
    question: &str,
    interrupt: impl Future<Output = ()>,
) -> Result<String, Error> {
    let token = CancellationToken::new();
    let answer = agent.ask_with_cancellation(question, &token);
    tokio::pin!(answer);

    tokio::select! {
        result = &mut answer => result,
        () = interrupt => {
            token.cancel();
            answer.await
        }
    }
}
