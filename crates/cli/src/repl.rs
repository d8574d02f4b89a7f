use {
    threadsage_auto_reply::{Dispatcher, Outcome},
    threadsage_common::types::InboundMessage,
    tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};

/// Channel id used when the config names none.
pub const REPL_CHANNEL: &str = "repl";

/// Read one question per line from stdin until EOF and print each reply.
pub async fn run(dispatcher: Dispatcher) -> anyhow::Result<()> {
    let channel = dispatcher.settings().channel_id.clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    stdout.write_all(b"> ").await?;
    stdout.flush().await?;
    while let Some(line) = lines.next_line().await? {
        let msg = InboundMessage::new(channel.as_str(), "terminal", line);
        if let Outcome::Reply(reply) = dispatcher.handle(&msg).await {
            stdout.write_all(reply.text.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }
    Ok(())
}
