//! Segment a single JPEG frame.
//!
//! Demonstrates:
//! - Building a client from `VIZION_API_KEY`
//! - Provisioning a worker with progress output
//! - Segmenting one frame with text prompts
//! - Reading boxes, confidences, masks and server timings
//!
//! Usage:
//!   cargo run --example 001_segment
//!   cargo run --example 001_segment -- --frame street.jpg --prompts person,bicycle
//!   cargo run --example 001_segment -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::Args;
use vizion::{Result, VizionClient};

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
    println!("=== 001: Segment ===\n");

    let jpeg = args.read_frame()?;
    println!("[1] Frame: {} ({} bytes)\n", args.frame.display(), jpeg.len());

    let client = VizionClient::builder()
        .api_key(common::api_key()?)
        .model("sam3")
        .on_progress(common::print_progress)
        .build()?;

    let prompts = args.prompts.clone();
    let result = client
        .scoped(async move |client: &mut VizionClient| {
            println!("[2] Connecting...");
            client.connect().await?;
            if let Some(session_id) = client.session_id() {
                println!("\n    ✓ Session {session_id}\n");
            }

            println!("[3] Segmenting {prompts:?}...");
            client.segment(jpeg, prompts).await
        })
        .await?;

    // ========================================================================
    // Results
    // ========================================================================

    for detection in &result.results {
        println!("    {}: {} instance(s)", detection.prompt, detection.instances.len());
        for instance in &detection.instances {
            let pixels = instance.decode_mask()?.count_true();
            println!(
                "      bbox=({:.0},{:.0})-({:.0},{:.0})  confidence={:.2}  mask={pixels}px",
                instance.x1, instance.y1, instance.x2, instance.y2, instance.confidence
            );
        }
    }

    println!(
        "\nTiming: decode={:.1}ms  vision={:.1}ms  text={:.1}ms  segment={:.1}ms  total={:.1}ms",
        result.decode_ms,
        result.vision_encode_ms,
        result.text_encode_ms,
        result.decode_segment_ms,
        result.total_ms()
    );

    Ok(())
}
