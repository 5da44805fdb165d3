//! Streaming plumbing shared by the generation backends
//!
//! Two framings reach the backends. Chat models hand over already-decoded text
//! fragments ([`FragmentStream`]). Raw chat endpoints hand over a response body
//! ([`ByteStream`]) carrying newline-delimited JSON chat-delta records, which
//! [`ndjson_fragments`] turns into fragments.
//!
//! Every stream here owns its upstream resources, so dropping it early closes
//! the connection.

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};

use crate::generation::ChatReply;
use crate::{Error, Result};

/// Incremental text fragments of one answer
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Raw response body chunks
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// A fragment stream over fixed fragments
pub fn fragments_from<I>(fragments: I) -> FragmentStream
where
    I: IntoIterator<Item = String>,
    I::IntoIter: Send + 'static,
{
    futures::stream::iter(fragments.into_iter().map(Ok)).boxed()
}

/// Drain a fragment stream into the full text, stopping at the first error
pub async fn collect_fragments(mut stream: FragmentStream) -> Result<String> {
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}

/// Decode one NDJSON line into the text it carries.
///
/// Blank lines and records without message content yield `None`. A line that
/// is not a JSON record is a [`Error::MalformedStreamFrame`]; a record that
/// reports an error is an [`Error::Upstream`].
pub fn decode_frame(line: &[u8]) -> Result<Option<String>> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return Ok(None);
    }

    let reply: ChatReply =
        serde_json::from_slice(line).map_err(|e| Error::malformed_frame(line, e))?;

    if let Some(error) = reply.error {
        return Err(Error::Upstream(format!("model endpoint reported: {error}")));
    }

    Ok(reply
        .message
        .and_then(|message| message.content)
        .filter(|content| !content.is_empty()))
}

/// Split a response body into lines and decode each as a chat-delta record.
///
/// Lines may straddle body chunks. The first bad line ends the stream with an
/// error; nothing after it is yielded.
pub fn ndjson_fragments(body: ByteStream) -> FragmentStream {
    let fragments = async_stream::stream! {
        let mut body = body;
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            buffer.extend_from_slice(&chunk);

            while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                match decode_frame(&line) {
                    Ok(Some(fragment)) => yield Ok(fragment),
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        // final record without a trailing newline
        match decode_frame(&buffer) {
            Ok(Some(fragment)) => yield Ok(fragment),
            Ok(None) => {}
            Err(e) => yield Err(e),
        }
    };
    fragments.boxed()
}
