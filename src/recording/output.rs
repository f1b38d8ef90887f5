use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::info;

/// Forward a child's stdout and stderr, as one stream, to the log
///
/// Reads both pipes until each has closed and returns the number of lines
/// forwarded. Every line becomes a single log event tagged with `source`, so
/// concurrent workers never interleave partial lines. Bytes that are not
/// valid UTF-8 are replaced rather than treated as an error.
pub async fn forward_merged<O, E>(source: &str, stdout: O, stderr: E) -> std::io::Result<usize>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut out = BufReader::new(stdout).split(b'\n');
    let mut err = BufReader::new(stderr).split(b'\n');
    let mut out_open = true;
    let mut err_open = true;
    let mut forwarded = 0;

    while out_open || err_open {
        let segment = tokio::select! {
            segment = out.next_segment(), if out_open => {
                let segment = segment?;
                out_open = segment.is_some();
                segment
            }
            segment = err.next_segment(), if err_open => {
                let segment = segment?;
                err_open = segment.is_some();
                segment
            }
        };

        if let Some(bytes) = segment {
            let line = String::from_utf8_lossy(&bytes);
            let line = line.trim_end_matches('\r');
            if !line.is_empty() {
                info!(source = %source, "{}", line);
                forwarded += 1;
            }
        }
    }

    Ok(forwarded)
}
