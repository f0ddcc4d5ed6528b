use crate::adapter::WgslDebugAdapter;
use dap::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tracing::{debug, error};

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

pub struct DapServer {
    adapter: Arc<WgslDebugAdapter>,
}

impl Default for DapServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap a protocol message in its `Content-Length` header, stamping the
/// `seq` and `type` fields every message carries.
fn encode<T: Serialize>(message: &T, kind: &str, seq: i64) -> serde_json::Result<String> {
    let mut value = serde_json::to_value(message)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("seq".to_string(), seq.into());
        object.insert("type".to_string(), kind.into());
    }
    let json = serde_json::to_string(&value)?;
    Ok(format!("Content-Length: {}\r\n\r\n{}", json.len(), json))
}

/// Read one framed message body. `None` at end of input.
async fn read_message<R>(reader: &mut R) -> Result<Option<String>, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut length = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let line = line.trim();
        if line.is_empty() {
            if length.is_some() {
                break;
            }
            continue;
        }
        if let Some(value) = line.strip_prefix("Content-Length:") {
            length = Some(value.trim().parse::<usize>()?);
        }
    }
    let mut body = vec![0u8; length.unwrap_or(0)];
    reader.read_exact(&mut body).await?;
    Ok(Some(String::from_utf8(body)?))
}

impl DapServer {
    pub fn new() -> Self {
        let (tx, _rx) = mpsc::channel(100);
        let adapter = Arc::new(WgslDebugAdapter::new(tx));

        Self { adapter }
    }

    pub async fn run<R, W>(&self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
        W: tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let writer = Arc::new(Mutex::new(BufWriter::new(writer)));
        let seq = Arc::new(AtomicI64::new(1));

        let (event_tx, mut event_rx) = mpsc::channel::<dap::events::Event>(100);
        self.adapter.set_event_sender(event_tx).await;

        let writer_clone = writer.clone();
        let event_seq = seq.clone();
        let events = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let n = event_seq.fetch_add(1, Ordering::SeqCst);
                match encode(&event, "event", n) {
                    Ok(output) => {
                        let mut w = writer_clone.lock().await;
                        if let Err(e) = w.write_all(output.as_bytes()).await {
                            error!(error = %e, "Failed to write DAP event");
                        }
                        let _ = w.flush().await;
                    }
                    Err(e) => error!(error = %e, "Failed to encode DAP event"),
                }
            }
        });

        // Requests are read on their own task so a `pause` reaches the
        // shared flag while a `continue` is still running.
        let (request_tx, mut request_rx) = mpsc::channel::<Request>(100);
        let pause = self.adapter.pause_handle();
        let requests = tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            loop {
                let body = match read_message(&mut reader).await {
                    Ok(Some(body)) => body,
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, "DAP Server Error");
                        break;
                    }
                };
                let request: Request = match serde_json::from_str(&body) {
                    Ok(request) => request,
                    Err(e) => {
                        error!(error = %e, "Malformed DAP request");
                        continue;
                    }
                };
                if matches!(request.command, Command::Pause(_)) {
                    pause.store(true, Ordering::SeqCst);
                }
                if request_tx.send(request).await.is_err() {
                    break;
                }
            }
        });

        while let Some(request) = request_rx.recv().await {
            debug!(seq = request.seq, "request");
            let disconnect = matches!(request.command, Command::Disconnect(_));
            let response = self.adapter.handle_request(request).await;
            let output = encode(&response, "response", seq.fetch_add(1, Ordering::SeqCst))?;

            let mut w = writer.lock().await;
            if let Err(e) = w.write_all(output.as_bytes()).await {
                error!(error = %e, "Failed to write DAP response");
                break;
            }
            let _ = w.flush().await;
            if disconnect {
                break;
            }
        }

        requests.abort();
        // Dropping the adapter's sender ends the event task once it has
        // drained what is queued.
        let (closed_tx, _) = mpsc::channel(1);
        self.adapter.set_event_sender(closed_tx).await;
        let _ = events.await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_message_skips_extra_headers() {
        let input = b"Content-Length: 2\r\nContent-Type: application/json\r\n\r\n{}Content-Length: 4\r\n\r\nnull";
        let mut reader = BufReader::new(&input[..]);
        assert_eq!(read_message(&mut reader).await.unwrap().as_deref(), Some("{}"));
        assert_eq!(read_message(&mut reader).await.unwrap().as_deref(), Some("null"));
        assert_eq!(read_message(&mut reader).await.unwrap(), None);
    }

    #[test]
    fn test_encode_stamps_header_and_seq() {
        let framed = encode(&serde_json::json!({ "event": "initialized" }), "event", 7).unwrap();
        let (header, body) = framed.split_once("\r\n\r\n").unwrap();
        assert_eq!(header, format!("Content-Length: {}", body.len()));
        let value: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(value["seq"], 7);
        assert_eq!(value["type"], "event");
        assert_eq!(value["event"], "initialized");
    }
}
