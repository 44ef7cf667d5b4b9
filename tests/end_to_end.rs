//! Full session flows against a local worker and a mocked provisioning API.

mod common;

use std::io::Cursor;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};
use pretty_assertions::assert_eq;
use serde_json::json;

use vizion::protocol::decode_segment_frame;
use vizion::{Error, SegmentationRequest, SessionState, VizionClient};

use common::{
    API_KEY, SESSION_ID, client, init_tracing, provisioning_api, segmentation_reply,
    spawn_slow_worker, spawn_worker,
};

const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

fn echo_prompts(request: &[u8]) -> Option<serde_json::Value> {
    let (header, _) = decode_segment_frame(request).ok()?;
    Some(segmentation_reply(&header.prompts))
}

// ============================================================================
// Segmentation
// ============================================================================

#[tokio::test]
async fn segment_session_end_to_end() -> anyhow::Result<()> {
    init_tracing();
    let worker = spawn_worker(echo_prompts).await;
    let api = provisioning_api(&worker.ws_url).await;
    let mut client = client(&api, "sam3");

    client.connect().await?;
    assert_eq!(client.state(), SessionState::Connected);
    assert_eq!(client.session_id().map(|id| id.as_str()), Some(SESSION_ID));

    let result = client.segment(FAKE_JPEG.to_vec(), ["person"]).await?;

    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].prompt, "person");
    let instance = &result.results[0].instances[0];
    assert_eq!(instance.bbox(), (10.0, 20.0, 110.0, 220.0));
    assert_eq!(instance.mask_rle.iter().sum::<u32>(), 9);
    assert_eq!(result.total_ms(), 17.0);

    let mask = instance.decode_mask()?;
    assert_eq!(mask.shape(), (3, 3));
    assert_eq!(mask.count_true(), 3);

    client.close().await;
    assert_eq!(client.state(), SessionState::Closed);

    let record = worker.finished().await;
    let record = record.lock();
    assert_eq!(record.text, vec!["shutdown".to_string()]);

    let (header, image) = decode_segment_frame(&record.binary[0])?;
    assert_eq!(header.prompts, vec!["person".to_string()]);
    assert_eq!(header.score_threshold, 0.5);
    assert_eq!(header.mask_threshold, 0.5);
    assert_eq!(image, FAKE_JPEG);
    Ok(())
}

#[tokio::test]
async fn multiple_requests_share_one_session() -> anyhow::Result<()> {
    let worker = spawn_worker(echo_prompts).await;
    let api = provisioning_api(&worker.ws_url).await;
    let mut client = client(&api, "sam3");

    client.connect().await?;

    let first = client.segment(FAKE_JPEG.to_vec(), ["person", "car"]).await?;
    let request = SegmentationRequest::new(FAKE_JPEG.to_vec(), ["dog"])
        .with_score_threshold(0.25)
        .with_mask_threshold(0.75);
    let second = client.segment_with(request).await?;

    assert_eq!(first.results.len(), 2);
    assert_eq!(first.detection("car").map(|d| d.instances.len()), Some(1));
    assert_eq!(second.results[0].prompt, "dog");

    client.close().await;

    let record = worker.finished().await;
    let record = record.lock();
    assert_eq!(record.binary.len(), 2);
    let (header, _) = decode_segment_frame(&record.binary[1])?;
    assert_eq!(header.score_threshold, 0.25);
    assert_eq!(header.mask_threshold, 0.75);
    Ok(())
}

#[tokio::test]
async fn scoped_session_always_shuts_down() -> anyhow::Result<()> {
    let worker = spawn_worker(|_| Some(json!({"unexpected": true}))).await;
    let api = provisioning_api(&worker.ws_url).await;
    let client = client(&api, "sam3");

    let result = client
        .scoped(async |client: &mut VizionClient| {
            client.connect().await?;
            client.segment(FAKE_JPEG.to_vec(), ["person"]).await
        })
        .await;

    assert!(matches!(result, Err(Error::Protocol { .. })));

    let record = worker.finished().await;
    assert_eq!(record.lock().text, vec!["shutdown".to_string()]);
    Ok(())
}

// ============================================================================
// Depth
// ============================================================================

fn depth_png_b64(width: u32, height: u32, pixels: Vec<u16>) -> String {
    let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(width, height, pixels).expect("buffer");
    let mut png = Vec::new();
    DynamicImage::ImageLuma16(buffer)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .expect("png");
    STANDARD.encode(png)
}

#[tokio::test]
async fn depth_session_end_to_end() -> anyhow::Result<()> {
    let png = depth_png_b64(3, 2, vec![0, 32768, 65535, 65535, 0, 0]);
    let worker = spawn_worker(move |request| {
        assert_eq!(request, FAKE_JPEG);
        Some(json!({
            "depth_png_b64": png,
            "depth_min": 1.0,
            "depth_max": 5.0,
            "height": 2,
            "width": 3,
            "decode_ms": 1.0,
            "inference_ms": 20.0,
            "encode_ms": 3.0
        }))
    })
    .await;
    let api = provisioning_api(&worker.ws_url).await;
    let mut client = client(&api, "depth-anything-3");

    client.connect().await?;
    let response = tokio_test::assert_ok!(client.depth(FAKE_JPEG.to_vec()).await);
    client.close().await;

    assert_eq!((response.height, response.width), (2, 3));
    assert_eq!(response.total_ms(), 24.0);

    let depth = response.decode_depth()?;
    assert_eq!(depth.shape(), (2, 3));
    assert_eq!(depth.get(0, 0), Some(&1.0));
    assert_eq!(depth.get(0, 2), Some(&5.0));
    assert_eq!(depth.get(1, 0), Some(&5.0));
    let middle = *depth.get(0, 1).expect("pixel");
    assert!((middle - 3.0).abs() < 1e-3, "got {middle}");

    for value in depth.as_slice() {
        assert!((1.0..=5.0).contains(value));
    }
    Ok(())
}

// ============================================================================
// Failure Paths
// ============================================================================

#[tokio::test]
async fn request_timeout_ends_session() -> anyhow::Result<()> {
    let worker = spawn_worker(|_| None).await;
    let api = provisioning_api(&worker.ws_url).await;
    let mut client = VizionClient::builder()
        .api_key(API_KEY)
        .api_url(api.uri())
        .request_timeout(Duration::from_millis(200))
        .build()?;

    client.connect().await?;
    let err = client.segment(FAKE_JPEG.to_vec(), ["person"]).await.unwrap_err();

    assert!(err.is_timeout(), "got {err:?}");
    assert_eq!(client.state(), SessionState::Closed);
    assert!(client.segment(FAKE_JPEG.to_vec(), ["car"]).await.unwrap_err().is_usage_error());

    let record = worker.finished().await;
    assert_eq!(record.lock().text, vec!["shutdown".to_string()]);
    Ok(())
}

#[tokio::test]
async fn late_reply_is_never_returned_for_the_next_frame() -> anyhow::Result<()> {
    let worker = spawn_slow_worker(Duration::from_millis(300), echo_prompts).await;
    let api = provisioning_api(&worker.ws_url).await;
    let mut client = VizionClient::builder()
        .api_key(API_KEY)
        .api_url(api.uri())
        .request_timeout(Duration::from_millis(200))
        .build()?;

    client.connect().await?;
    let first = client.segment(FAKE_JPEG.to_vec(), ["person"]).await;
    assert!(first.unwrap_err().is_timeout());

    // The reply to "person" lands while the next frame is being sent.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let second = client.segment(FAKE_JPEG.to_vec(), ["car"]).await;

    match second {
        Ok(response) => panic!(
            "reply {:?} returned for a request after a timeout",
            response.results.first().map(|d| &d.prompt)
        ),
        Err(err) => assert!(err.is_usage_error(), "got {err:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn shutdown_handle_cancels_pending_request() -> anyhow::Result<()> {
    let worker = spawn_worker(|_| None).await;
    let api = provisioning_api(&worker.ws_url).await;
    let mut client = client(&api, "sam3");

    client.connect().await?;
    let handle = client.shutdown_handle().expect("websocket transport");

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown();
    });

    let err = client.segment(FAKE_JPEG.to_vec(), ["person"]).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed), "got {err:?}");

    client.close().await;
    assert_eq!(client.state(), SessionState::Closed);
    Ok(())
}

#[tokio::test]
async fn worker_hangup_surfaces_connection_closed() -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("handshake");
        use futures_util::StreamExt;
        let _ = ws.next().await;
        drop(ws);
    });

    let api = provisioning_api(&format!("ws://127.0.0.1:{port}/ws")).await;
    let mut client = client(&api, "sam3");

    client.connect().await?;
    let err = client.segment(FAKE_JPEG.to_vec(), ["person"]).await.unwrap_err();

    assert!(err.is_transport_error(), "got {err:?}");
    client.close().await;
    Ok(())
}

#[tokio::test]
async fn unreachable_worker_leaves_client_unconnected() -> anyhow::Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);

    let api = provisioning_api(&format!("ws://127.0.0.1:{port}/ws")).await;
    let mut client = client(&api, "sam3");

    let err = tokio_test::assert_err!(client.connect().await);

    assert!(err.is_transport_error(), "got {err:?}");
    assert_eq!(client.state(), SessionState::Unconnected);
    assert!(client.session_id().is_none());
    Ok(())
}
