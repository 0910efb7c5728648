//! Line-delimited JSON transport.
//!
//! Each request line is `{"op": <name>, "params": <object>}`; each response
//! line is one envelope. Malformed lines get a validation-error envelope
//! rather than tearing the stream down. EOF ends the loop.

use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use crate::error::GatewayError;
use crate::gateway::{Gateway, ResponseEnvelope};

#[derive(Debug, Deserialize)]
struct RequestLine {
    op: String,
    #[serde(default)]
    params: Value,
}

/// Serve requests from `reader`, writing one envelope per line to `writer`,
/// until EOF.
pub async fn serve<R, W>(gateway: &Gateway, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    info!("transport ready");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let envelope = match serde_json::from_str::<RequestLine>(line) {
            Ok(request) => gateway.handle(&request.op, request.params).await,
            Err(e) => ResponseEnvelope::from_error(&GatewayError::Validation(format!(
                "malformed request: {e}"
            ))),
        };
        write_envelope(&mut writer, &envelope).await?;
    }

    info!("transport closed (EOF)");
    Ok(())
}

async fn write_envelope<W: AsyncWrite + Unpin>(
    writer: &mut W,
    envelope: &ResponseEnvelope,
) -> std::io::Result<()> {
    let mut line = serde_json::to_string(envelope)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::engine::PaperEngineFactory;
    use std::sync::Arc;

    fn gateway() -> Gateway {
        Gateway::new(&GatewayConfig::default(), Arc::new(PaperEngineFactory))
    }

    fn response_lines(output: &[u8]) -> Vec<Value> {
        String::from_utf8(output.to_vec())
            .expect("utf8 output")
            .lines()
            .map(|l| serde_json::from_str(l).expect("envelope json"))
            .collect()
    }

    #[tokio::test]
    async fn malformed_line_yields_validation_envelope() {
        let gateway = gateway();
        let input = b"this is not json\n" as &[u8];
        let mut output = Vec::new();
        serve(&gateway, input, &mut output).await.expect("serve");

        let responses = response_lines(&output);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["status"], "error");
        assert_eq!(responses[0]["error_kind"], "validation_error");
    }

    #[tokio::test]
    async fn requests_and_responses_pair_one_to_one() {
        let gateway = gateway();
        let input = concat!(
            "{\"op\":\"get_positions\",\"params\":{\"venue\":\"BINANCE\"}}\n",
            "\n",
            "{\"op\":\"initialize\",\"params\":{}}\n",
            "{\"op\":\"get_positions\",\"params\":{\"venue\":\"BINANCE\"}}\n",
        )
        .as_bytes();
        let mut output = Vec::new();
        serve(&gateway, input, &mut output).await.expect("serve");

        let responses = response_lines(&output);
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["error_kind"], "not_initialized");
        assert_eq!(responses[1]["status"], "success");
        assert_eq!(responses[2]["status"], "success");
    }
}
