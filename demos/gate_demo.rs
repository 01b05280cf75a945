//! Example: bounding concurrent file access with a gate
//!
//! Run with: `cargo run --example gate_demo`

use filer::*;
use std::io::{Seek, SeekFrom, Write};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Allow two open files at a time and print shutdown diagnostics
    let gate = FileGate::builder()
        .limit(2)
        .diagnostics(|msg| println!("[diagnostics] {msg}"))
        .build();
    println!("Created gate with limit {}", gate.limit());

    // Eight workers compete for two slots
    let mut workers = Vec::new();
    for id in 0..8 {
        let gate = gate.clone();
        workers.push(tokio::spawn(async move {
            let mut file = gate.temp_file("", &format!("worker-{id}-"), ".txt").await?;
            writeln!(file, "hello from worker {id}")?;
            file.seek(SeekFrom::Start(0))?;
            tokio::time::sleep(Duration::from_millis(100)).await;
            println!("worker {id} wrote {}", file.path().display());
            file.close()?;
            Ok::<_, GateError>(())
        }));
    }
    for worker in workers {
        worker.await??;
    }
    println!("Peak concurrently open files: {}", gate.stats().peak);

    // Leave one file open and let shutdown close it
    let _forgotten = gate.temp_file("", "forgotten-", ".txt").await?;
    match gate.shutdown(Some(Duration::from_millis(200))).await {
        Ok(()) => println!("All files closed in time"),
        Err(e) => println!("Shutdown: {e}"),
    }

    Ok(())
}
