//! Method channel over JSON lines: one call per input line, one response per
//! output line.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use capture_core::protocol::{MethodCall, MethodResponse};
use capture_core::ScreenCapturePlugin;

/// Answer calls until the reader hits EOF. Calls run one at a time; each
/// capture runs on the blocking pool.
pub async fn serve<R, W>(plugin: Arc<ScreenCapturePlugin>, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0u64;

    while let Some(line) = lines.next_line().await.context("failed to read call")? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match MethodCall::parse(&line) {
            Ok(call) => {
                debug!("received call {}", call.method);
                let plugin = plugin.clone();
                tokio::task::spawn_blocking(move || plugin.handle_method_call(&call))
                    .await
                    .context("capture task panicked")?
            }
            Err(e) => {
                warn!("malformed call: {}", e);
                MethodResponse::from(e)
            }
        };

        let mut out = response.to_json()?;
        out.push('\n');
        writer
            .write_all(out.as_bytes())
            .await
            .context("failed to write response")?;
        writer.flush().await?;
        handled += 1;
    }

    info!("input closed after {} calls", handled);
    Ok(())
}
