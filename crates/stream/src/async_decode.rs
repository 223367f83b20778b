//! Async decoding over tokio readers

use std::io;
use std::path::Path;

use futures::stream::{self, Stream};
use pnlog_errors::SourceError;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::decode::{decode_record, is_blank, DecodeOptions, Outcome};
use crate::source::{record_cap, trim_newline};

/// Label used in read errors from [`decode_async`].
const ASYNC_SOURCE_LABEL: &str = "<async reader>";

/// Open a log file for [`decode_async`].
///
/// # Errors
///
/// Returns [`SourceError::Unavailable`] if the file cannot be opened.
pub async fn open_async(path: impl AsRef<Path>) -> Result<BufReader<File>, SourceError> {
    let path = path.as_ref();
    let file = File::open(path)
        .await
        .map_err(|err| SourceError::unavailable(path.display().to_string(), &err))?;
    Ok(BufReader::new(file))
}

async fn read_record<R>(reader: &mut R, cap: usize, line: &mut Vec<u8>) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut consumed = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(consumed);
        }
        let (used, done) = match available.iter().position(|&b| b == b'\n') {
            Some(newline) => (newline + 1, true),
            None => (available.len(), false),
        };
        let room = cap.saturating_sub(line.len());
        line.extend_from_slice(&available[..used.min(room)]);
        reader.consume(used);
        consumed += used;
        if done {
            return Ok(consumed);
        }
    }
}

/// Decode newline-framed records from an async reader.
///
/// Same contract as [`crate::Decoder`]: one `Ok(outcome)` per record, in
/// order, never ending on a bad record. Reads are capped the way
/// [`crate::RecordSource`] caps them. A read error is yielded once as
/// `Err(SourceError::Read)` and ends the stream, so it cannot be mistaken
/// for EOF.
pub fn decode_async<R>(
    reader: R,
    options: DecodeOptions,
) -> impl Stream<Item = Result<Outcome, SourceError>>
where
    R: AsyncBufRead + Unpin,
{
    let cap = record_cap(options.max_record_bytes);
    stream::unfold(
        Some((reader, 0_usize)),
        move |state| async move {
            let (mut reader, mut position) = state?;
            loop {
                let mut line = Vec::new();
                match read_record(&mut reader, cap, &mut line).await {
                    Ok(0) => return None,
                    Ok(_) => {
                        position += 1;
                        trim_newline(&mut line);
                        if options.ignore_blank && is_blank(&line) {
                            continue;
                        }
                        let outcome = decode_record(position, &line, &options);
                        return Some((Ok(outcome), Some((reader, position))));
                    }
                    Err(err) => {
                        warn!(position, error = %err, "async record source read failed");
                        return Some((Err(SourceError::read(ASYNC_SOURCE_LABEL, &err)), None));
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use pnlog_errors::DecodeErrorKind;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, ReadBuf};

    /// Yields its bytes once, then fails every read.
    struct FailAfter {
        data: Option<Vec<u8>>,
    }

    impl AsyncRead for FailAfter {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.data.take() {
                Some(data) => {
                    buf.put_slice(&data);
                    Poll::Ready(Ok(()))
                }
                None => Poll::Ready(Err(io::Error::other("disk on fire"))),
            }
        }
    }

    #[tokio::test]
    async fn test_read_error_is_yielded_after_good_records() {
        let reader = BufReader::new(FailAfter {
            data: Some(b"{\"name\":\"pnpm:summary\",\"level\":\"info\"}\n".to_vec()),
        });
        let items: Vec<_> = decode_async(reader, DecodeOptions::default()).collect().await;
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Ok(Ok(_))));
        assert!(matches!(items[1], Err(SourceError::Read { .. })));
    }

    #[tokio::test]
    async fn test_oversized_line_does_not_swallow_the_next_record() {
        let mut input = vec![b'{'; 4096];
        input.extend_from_slice(b"\n{\"name\":\"pnpm:summary\",\"level\":\"info\"}\n");
        let options = DecodeOptions::default().with_max_record_bytes(64);
        let items: Vec<_> = decode_async(BufReader::with_capacity(16, &input[..]), options)
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        let first = items[0].as_ref().unwrap().as_ref().unwrap_err();
        assert_eq!(first.kind(), DecodeErrorKind::MalformedRecord);
        assert_eq!(first.position(), 1);
        assert!(items[1].as_ref().unwrap().is_ok());
    }
}
