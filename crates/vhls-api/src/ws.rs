//! WebSocket handlers for streamed upload flows.
//!
//! Both endpoints follow the same framing: an optional JSON text frame
//! first, then binary frames carrying the source file, then an empty
//! frame marking end of transmission. Progress and errors travel back
//! as JSON text frames on the same connection.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use vhls_media::ChannelSink;
use vhls_models::{generate_key, ErrorMessage, Resolution, UploadRecord};

use crate::state::AppState;

const WS_SEND_BUFFER_SIZE: usize = 32;
const WS_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// First frame of the convert flow.
#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub resolutions: Vec<String>,
}

/// Terminal response of the upload flow.
#[derive(Debug, Serialize)]
pub struct UploadResult {
    pub success: bool,
    pub id: String,
    pub data: UploadRecord,
}

/// Serialize and queue a message for the send task.
async fn send_json<T: Serialize>(tx: &mpsc::Sender<Message>, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(json) => tx.send(Message::Text(json)).await.is_ok(),
        Err(_) => false,
    }
}

/// Split the socket and spawn the task that owns the write half.
fn spawn_sender(socket: WebSocket) -> (SplitStream<WebSocket>, mpsc::Sender<Message>, JoinHandle<()>) {
    let (mut ws_sender, receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(WS_SEND_BUFFER_SIZE);

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    (receiver, tx, send_task)
}

/// Read and decode the initial JSON text frame.
async fn read_request<T: serde::de::DeserializeOwned>(
    receiver: &mut SplitStream<WebSocket>,
) -> Result<T, String> {
    match tokio::time::timeout(WS_CLIENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => {
            serde_json::from_str(&text).map_err(|e| format!("Invalid request: {}", e))
        }
        Ok(Some(Ok(_))) => Err("Expected a JSON text frame".to_string()),
        Ok(Some(Err(e))) => Err(format!("WebSocket read failed: {}", e)),
        Ok(None) => Err("Connection closed before request".to_string()),
        Err(_) => Err("Timed out waiting for request".to_string()),
    }
}

/// Stream binary frames into a temp file until an empty frame or close.
///
/// The returned guard removes the file on drop.
async fn receive_upload(receiver: &mut SplitStream<WebSocket>) -> Result<NamedTempFile, String> {
    let temp =
        NamedTempFile::new().map_err(|e| format!("Failed to create temp file: {}", e))?;
    let mut file = File::create(temp.path())
        .await
        .map_err(|e| format!("Failed to open temp file: {}", e))?;

    loop {
        let frame = tokio::time::timeout(WS_CLIENT_TIMEOUT, receiver.next())
            .await
            .map_err(|_| "Timed out waiting for upload data".to_string())?;

        match frame {
            Some(Ok(Message::Binary(data))) => {
                if data.is_empty() {
                    break;
                }
                file.write_all(&data)
                    .await
                    .map_err(|e| format!("Failed to write upload data: {}", e))?;
            }
            Some(Ok(Message::Text(text))) if text.is_empty() => break,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(format!("WebSocket read failed: {}", e)),
        }
    }

    file.flush()
        .await
        .map_err(|e| format!("Failed to flush upload data: {}", e))?;

    Ok(temp)
}

/// `GET /convert` - streamed upload followed by per-resolution
/// transcoding with live progress events.
pub async fn convert(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_convert_socket(socket, state))
}

async fn handle_convert_socket(socket: WebSocket, state: AppState) {
    let (mut receiver, tx, send_task) = spawn_sender(socket);

    let request: ConvertRequest = match read_request(&mut receiver).await {
        Ok(req) => req,
        Err(msg) => {
            let _ = send_json(&tx, &ErrorMessage::new(msg, "invalid request")).await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
    };

    let resolutions: Vec<Resolution> = match request
        .resolutions
        .iter()
        .map(|s| s.parse::<Resolution>())
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(r) if !r.is_empty() => r,
        Ok(_) => {
            let _ = send_json(
                &tx,
                &ErrorMessage::new("No resolutions requested", "empty resolution list"),
            )
            .await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
        Err(e) => {
            let _ = send_json(
                &tx,
                &ErrorMessage::new("Invalid resolution", e.to_string()),
            )
            .await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
    };

    let upload = match receive_upload(&mut receiver).await {
        Ok(u) => u,
        Err(msg) => {
            let _ = send_json(&tx, &ErrorMessage::new(msg, "upload failed")).await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
    };

    info!("Upload received, transcoding {} resolutions", resolutions.len());

    // The watch channel cancels the running encoder if the client goes
    // away mid-transcode.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (progress_tx, mut progress_rx) = mpsc::channel(WS_SEND_BUFFER_SIZE);
    let sink = Arc::new(ChannelSink::new(progress_tx));

    let pipeline = Arc::clone(&state.pipeline);
    let input = upload.path().to_path_buf();
    let job = tokio::spawn(async move {
        pipeline
            .transcode_renditions(&input, &resolutions, sink, Some(cancel_rx))
            .await
    });

    let mut client_gone = false;
    loop {
        tokio::select! {
            event = progress_rx.recv() => match event {
                Some(event) => {
                    if !send_json(&tx, &event).await {
                        let _ = cancel_tx.send(true);
                    }
                }
                // all sink handles dropped: the job is wrapping up
                None => break,
            },
            frame = receiver.next(), if !client_gone => match frame {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    info!("Client disconnected, cancelling transcode");
                    client_gone = true;
                    let _ = cancel_tx.send(true);
                }
                Some(Ok(_)) => {}
            },
        }
    }

    match job.await {
        Ok(Ok(outcomes)) => {
            info!("Transcoded {} rendition(s)", outcomes.len());
        }
        Ok(Err(e)) => {
            warn!("Transcode run failed: {}", e);
            let _ = send_json(
                &tx,
                &ErrorMessage::new("Transcoding failed", e.to_string()),
            )
            .await;
        }
        Err(e) => {
            warn!("Transcode task aborted: {}", e);
        }
    }

    drop(tx);
    let _ = send_task.await;
    drop(upload);
}

/// `GET /upload` - streamed upload followed by thumbnail frame strip,
/// content hash and aspect ratio extraction.
pub async fn upload(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_upload_socket(socket, state))
}

async fn handle_upload_socket(socket: WebSocket, state: AppState) {
    let (mut receiver, tx, send_task) = spawn_sender(socket);

    let account = generate_key(16);
    let folder = generate_key(16);

    let upload = match receive_upload(&mut receiver).await {
        Ok(u) => u,
        Err(msg) => {
            let _ = send_json(&tx, &ErrorMessage::new(msg, "upload failed")).await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
    };

    match state
        .pipeline
        .preprocess_upload(upload.path(), &account, &folder)
        .await
    {
        Ok(record) => {
            info!(account = %account, folder = %folder, "Upload preprocessed");
            let result = UploadResult {
                success: true,
                id: uuid::Uuid::new_v4().to_string(),
                data: record,
            };
            let _ = send_json(&tx, &result).await;
        }
        Err(e) => {
            warn!("Upload preprocessing failed: {}", e);
            let _ = send_json(
                &tx,
                &ErrorMessage::new("Preprocessing failed", e.to_string()),
            )
            .await;
        }
    }

    drop(tx);
    let _ = send_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_request_shape() {
        let req: ConvertRequest =
            serde_json::from_str(r#"{"resolutions":["1920x1080","1280x720"]}"#).unwrap();
        assert_eq!(req.resolutions.len(), 2);
    }

    #[test]
    fn test_upload_result_wire_keys() {
        let record = UploadRecord {
            account: "a".into(),
            name: "h".into(),
            extname: ".mp4".into(),
            folder: "f".into(),
            thumbs: vec![],
            created: chrono::Utc::now(),
            updated: chrono::Utc::now(),
            ratio: 16.0 / 9.0,
        };
        let result = UploadResult {
            success: true,
            id: "x".into(),
            data: record,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"id\":\"x\""));
        assert!(json.contains("\"data\""));
    }
}
