// Newline-delimited JSON streaming of watched snapshots
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::watch;

/// Encodes one value as a JSON line.
pub fn ndjson_line<T: Serialize>(value: &T) -> serde_json::Result<Bytes> {
    let json = serde_json::to_vec(value)?;
    let mut line = BytesMut::with_capacity(json.len() + 1);
    line.put_slice(&json);
    line.put_u8(b'\n');
    Ok(line.freeze())
}

/// Resolves once `shutdown` holds `true`. A dropped sender never resolves.
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let stopped = shutdown.wait_for(|stop| *stop).await.is_ok();
    if !stopped {
        std::future::pending::<()>().await;
    }
}

/// Current value first, then one line per change until the sender goes away
/// or shutdown is requested.
pub fn watch_lines<T>(
    mut rx: watch::Receiver<T>,
    mut shutdown: watch::Receiver<bool>,
) -> impl Stream<Item = serde_json::Result<Bytes>>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    async_stream::stream! {
        let current = rx.borrow_and_update().clone();
        yield ndjson_line(&current);

        loop {
            let changed = tokio::select! {
                _ = shutdown_requested(&mut shutdown) => false,
                changed = rx.changed() => changed.is_ok(),
            };
            if !changed {
                break;
            }

            let next = rx.borrow_and_update().clone();
            yield ndjson_line(&next);
        }
    }
}

pub fn stream_from_watch<T>(
    rx: watch::Receiver<T>,
    shutdown: watch::Receiver<bool>,
) -> impl IntoResponse
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    let body = Body::from_stream(watch_lines(rx, shutdown));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
