//! One-shot queue depth probe.
//!
//! Prints the approximate number of messages in the work queue, for
//! external monitors that scale workers on backlog.

use anyhow::Context;

use pixmill_queue::{RedisStreamQueue, WorkQueue};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let queue = RedisStreamQueue::from_env().context("failed to create work queue")?;
    let depth = queue.depth().await.context("failed to read queue depth")?;

    println!("{depth}");
    Ok(())
}
