//! Estimate metric depth for a single JPEG frame.
//!
//! Demonstrates:
//! - Selecting the depth model
//! - Manual connect/close instead of `scoped`
//! - Decoding the depth PNG into metres
//!
//! Usage:
//!   cargo run --example 002_depth
//!   cargo run --example 002_depth -- --frame room.jpg --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::Args;
use vizion::{ModelId, Result, VizionClient};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 002: Depth ===\n");

    let jpeg = args.read_frame()?;
    println!("[1] Frame: {} ({} bytes)\n", args.frame.display(), jpeg.len());

    let mut client = VizionClient::builder()
        .api_key(common::api_key()?)
        .model(ModelId::DEPTH)
        .on_progress(common::print_progress)
        .build()?;

    println!("[2] Connecting...");
    client.connect().await?;
    println!("\n    ✓ Connected\n");

    println!("[3] Estimating depth...");
    let result = client.depth(jpeg).await;

    // Billing stops only once the worker is shut down.
    client.close().await;
    let result = result?;

    // ========================================================================
    // Results
    // ========================================================================

    println!("    Depth map: {}x{}", result.width, result.height);
    println!(
        "    Range:     {:.3} - {:.3} metres",
        result.depth_min, result.depth_max
    );

    let depth = result.decode_depth()?;
    let (rows, cols) = depth.shape();
    if let Some(centre) = depth.get(rows / 2, cols / 2) {
        println!("    Centre:    {centre:.3} metres");
    }

    println!(
        "\nTiming: decode={:.1}ms  inference={:.1}ms  encode={:.1}ms  total={:.1}ms",
        result.decode_ms,
        result.inference_ms,
        result.encode_ms,
        result.total_ms()
    );

    Ok(())
}
