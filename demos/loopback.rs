// In demos/loopback.rs
//
// Drives the process-wide async table against a loopback dispatcher thread.
// Every message carries a SHA-256 tag of its sequence number; the dispatcher
// rejects tampered payloads and treats endpoint 0 as dead, and the sender polls
// for the failures it asked to hear about.
//
//   RUST_LOG=debug cargo run --example loopback -- 100000
use asyn_ipc::ASYN::process;
use asyn_ipc::ASYN::Structs::{Endpoint, ErrorCode, Message};
use asyn_ipc::ASYN::Table::AsynFlags;
use asyn_ipc::Core::LoopbackKernel;
use sha2::{Digest, Sha256};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const DEAD: Endpoint = Endpoint(0);

fn tag(seq: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seq.to_le_bytes());
    hasher.finalize().into()
}

fn encode(seq: u64) -> Message {
    let mut body = [0u8; 40];
    body[..8].copy_from_slice(&seq.to_le_bytes());
    body[8..].copy_from_slice(&tag(seq));
    Message::new(1, &body).expect("40 bytes fit the envelope")
}

fn route(dst: Endpoint, msg: &Message) -> Option<ErrorCode> {
    if dst == DEAD {
        return Some(ErrorCode::EDEADSRCDST);
    }
    let seq = u64::from_le_bytes(msg.payload[..8].try_into().ok()?);
    if msg.payload[8..40] != tag(seq) {
        return Some(ErrorCode::EBADREQUEST);
    }
    Some(ErrorCode::OK)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let num_messages: u64 = match args.get(1) {
        Some(n) => n.parse()?,
        None => 10_000,
    };

    let running = Arc::new(AtomicBool::new(true));
    let running_for_handler = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_for_handler.store(false, Ordering::SeqCst);
    })?;

    let kernel = Arc::new(LoopbackKernel::new());
    process::install(kernel.clone())?;

    let dispatcher = {
        let kernel = kernel.clone();
        thread::spawn(move || kernel.run(route))
    };

    println!("Sender: queueing {num_messages} messages (Ctrl+C to stop early)");
    let start = std::time::Instant::now();
    let mut sent = 0u64;
    let mut failed = 0u64;

    for seq in 0..num_messages {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        // Back off while the dispatcher catches up; the table holds at most
        // 512 live messages and running it dry of room is fatal.
        loop {
            let live = process::with_sender(|s| s.map_or(0, |s| s.outstanding() + s.undrained()));
            if live < 256 {
                break;
            }
            while let Some(record) = process::asyn_geterror() {
                failed += 1;
                log::warn!("delivery to {} failed: {}", record.dst, record.result);
            }
            thread::yield_now();
        }

        let dst = Endpoint((seq % 32) as i32);
        process::asynsend3(dst, &encode(seq), AsynFlags::NOTIFY_ERR)?;
        sent += 1;
        if sent % 10_000 == 0 {
            println!("Sent {sent} messages");
        }
    }

    while process::with_sender(|s| s.map_or(0, |s| s.outstanding())) > 0 {
        thread::yield_now();
    }
    while let Some(record) = process::asyn_geterror() {
        failed += 1;
        log::warn!("delivery to {} failed: {}", record.dst, record.result);
    }

    kernel.shutdown();
    dispatcher.join().map_err(|_| "dispatcher thread panicked")?;

    let elapsed = start.elapsed();
    println!("Sender: {sent} sent, {failed} failed, in {elapsed:.2?}");
    println!(
        "Sender: {} handoffs, {} pauses, {:.2} messages/sec",
        kernel.handoffs(),
        kernel.pauses(),
        sent as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}
