use blobbridge_protocol::{
    ChannelMessage, DEFAULT_CHUNK_SIZE, DEFAULT_FILENAME, encode_chunk, extension_for_mime,
};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::TransferError;

/// Metadata announced in the `start` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub filename: String,
    pub mime_type: String,
    /// Exact number of bytes the source will yield.
    pub size: u64,
}

/// Splits a blob into fixed-size chunks and emits the channel records
/// for one transfer.
///
/// Chunks are read and sent one at a time, so at most one chunk of the
/// blob is held in memory on the sending side.
#[derive(Debug, Clone)]
pub struct Segmenter {
    chunk_size: usize,
}

impl Segmenter {
    /// Creates a segmenter.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] (2 MiB) is used.
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks for a blob of `size` bytes; never less than 1.
    ///
    /// Fails with [`TransferError::TooManyChunks`] when the count does not
    /// fit the record's `u32` index.
    pub fn total_chunks(&self, size: u64) -> Result<u32, TransferError> {
        let count = size.div_ceil(self.chunk_size as u64).max(1);
        u32::try_from(count).map_err(|_| TransferError::TooManyChunks { size })
    }

    /// Picks the name announced to the host.
    ///
    /// Empty names become [`DEFAULT_FILENAME`]; an extension inferred from
    /// the MIME type is appended unless the name already ends with it.
    pub fn prepare_filename(filename: &str, mime_type: &str) -> String {
        let mut name = if filename.is_empty() {
            DEFAULT_FILENAME.to_string()
        } else {
            filename.to_string()
        };
        if let Some(ext) = extension_for_mime(mime_type) {
            let suffix = format!(".{ext}");
            if !name.to_ascii_lowercase().ends_with(&suffix) {
                name.push_str(&suffix);
            }
        }
        name
    }

    /// Sends `start`, every `chunk` and `finish` for the blob read from `source`.
    ///
    /// If the source fails, ends early or holds more than `info.size` bytes,
    /// a single `error` record is sent in place of `finish` and the error is
    /// returned. A blob too large to index sends nothing. A closed channel
    /// aborts with [`TransferError::ChannelClosed`].
    pub async fn send<R>(
        &self,
        id: &str,
        info: &BlobInfo,
        mut source: R,
        sink: &mpsc::Sender<String>,
    ) -> Result<(), TransferError>
    where
        R: AsyncRead + Unpin,
    {
        let total = self.total_chunks(info.size)?;
        let filename = Self::prepare_filename(&info.filename, &info.mime_type);
        debug!(id, filename = %filename, size = info.size, total_chunks = total, "segmenting blob");

        emit(
            sink,
            ChannelMessage::start(id, filename, info.mime_type.clone(), info.size, total),
        )
        .await?;

        let mut remaining = info.size;
        for index in 0..total {
            let want = remaining.min(self.chunk_size as u64) as usize;
            let mut buf = vec![0u8; want];
            if let Err(e) = source.read_exact(&mut buf).await {
                warn!(id, index, error = %e, "blob read failed; abandoning transfer");
                emit(sink, ChannelMessage::error(id, e.to_string())).await?;
                return Err(e.into());
            }
            remaining -= want as u64;
            emit(sink, ChannelMessage::chunk(id, index, total, encode_chunk(&buf))).await?;
        }

        let mut extra = [0u8; 1];
        match source.read(&mut extra).await {
            Ok(0) => {}
            Ok(_) => {
                warn!(id, size = info.size, "blob longer than announced; abandoning transfer");
                let err = TransferError::SourceOverrun {
                    id: id.to_string(),
                    size: info.size,
                };
                emit(sink, ChannelMessage::error(id, err.to_string())).await?;
                return Err(err);
            }
            Err(e) => {
                warn!(id, error = %e, "blob read failed; abandoning transfer");
                emit(sink, ChannelMessage::error(id, e.to_string())).await?;
                return Err(e.into());
            }
        }

        emit(sink, ChannelMessage::finish(id)).await
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

async fn emit(sink: &mpsc::Sender<String>, msg: ChannelMessage) -> Result<(), TransferError> {
    let text = msg.to_json()?;
    sink.send(text)
        .await
        .map_err(|_| TransferError::ChannelClosed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobbridge_protocol::decode_chunk;

    fn info(filename: &str, mime_type: &str, size: u64) -> BlobInfo {
        BlobInfo {
            filename: filename.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    async fn collect(mut rx: mpsc::Receiver<String>) -> Vec<ChannelMessage> {
        let mut out = Vec::new();
        while let Some(text) = rx.recv().await {
            out.push(ChannelMessage::parse(&text).unwrap());
        }
        out
    }

    #[test]
    fn total_chunks_rounds_up() {
        let s = Segmenter::new(4);
        assert_eq!(s.total_chunks(0).unwrap(), 1);
        assert_eq!(s.total_chunks(1).unwrap(), 1);
        assert_eq!(s.total_chunks(4).unwrap(), 1);
        assert_eq!(s.total_chunks(5).unwrap(), 2);
        assert_eq!(s.total_chunks(10).unwrap(), 3);
    }

    #[test]
    fn total_chunks_rejects_overflow() {
        let s = Segmenter::new(1);
        assert_eq!(s.total_chunks(u64::from(u32::MAX)).unwrap(), u32::MAX);
        assert!(matches!(
            s.total_chunks(u64::from(u32::MAX) + 1),
            Err(TransferError::TooManyChunks { .. })
        ));
    }

    #[tokio::test]
    async fn oversized_blob_sends_nothing() {
        let (tx, rx) = mpsc::channel(16);
        let result = Segmenter::new(1)
            .send("big", &info("big", "", u64::MAX), &b""[..], &tx)
            .await;
        assert!(matches!(result, Err(TransferError::TooManyChunks { .. })));
        drop(tx);
        assert!(collect(rx).await.is_empty());
    }

    #[tokio::test]
    async fn long_source_sends_error_instead_of_finish() {
        let (tx, rx) = mpsc::channel(16);
        // Announces 4 bytes but the source has 6.
        let result = Segmenter::new(4)
            .send("l", &info("long", "", 4), &b"ABCDEF"[..], &tx)
            .await;
        assert!(matches!(result, Err(TransferError::SourceOverrun { size: 4, .. })));
        drop(tx);

        let msgs = collect(rx).await;
        let actions: Vec<&str> = msgs.iter().map(ChannelMessage::action).collect();
        assert_eq!(actions, vec!["start", "chunk", "error"]);
    }

    #[test]
    fn zero_chunk_size_uses_default() {
        assert_eq!(Segmenter::new(0).chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(Segmenter::default().chunk_size(), DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn filename_gets_mime_extension() {
        assert_eq!(Segmenter::prepare_filename("report", "application/pdf"), "report.pdf");
        assert_eq!(Segmenter::prepare_filename("photo.JPG", "image/jpeg"), "photo.JPG");
        assert_eq!(Segmenter::prepare_filename("", "image/png"), "download.png");
        assert_eq!(Segmenter::prepare_filename("", ""), "download");
        assert_eq!(Segmenter::prepare_filename("clip.mp4", "video/mp4"), "clip.mp4");
    }

    #[tokio::test]
    async fn emits_start_chunks_finish() {
        let (tx, rx) = mpsc::channel(16);
        let data = b"AABBCCDDEE";
        Segmenter::new(4)
            .send("t1", &info("letters", "text/plain", 10), &data[..], &tx)
            .await
            .unwrap();
        drop(tx);

        let msgs = collect(rx).await;
        assert_eq!(msgs.len(), 5);
        assert_eq!(
            msgs[0],
            ChannelMessage::start("t1", "letters.txt", "text/plain", 10, 3)
        );

        let mut rebuilt = Vec::new();
        for (i, msg) in msgs[1..4].iter().enumerate() {
            let ChannelMessage::Chunk(c) = msg else {
                panic!("expected chunk, got {msg:?}");
            };
            assert_eq!(c.index, i as u32);
            assert_eq!(c.total_chunks, 3);
            rebuilt.extend(decode_chunk(&c.data).unwrap());
        }
        assert_eq!(rebuilt, data);
        assert_eq!(msgs[4], ChannelMessage::finish("t1"));
    }

    #[tokio::test]
    async fn empty_blob_sends_one_empty_chunk() {
        let (tx, rx) = mpsc::channel(16);
        Segmenter::new(4)
            .send("e", &info("empty", "", 0), &b""[..], &tx)
            .await
            .unwrap();
        drop(tx);

        let msgs = collect(rx).await;
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[1], ChannelMessage::chunk("e", 0, 1, String::new()));
    }

    #[tokio::test]
    async fn short_source_sends_single_error() {
        let (tx, rx) = mpsc::channel(16);
        // Announces 10 bytes but the source only has 6.
        let result = Segmenter::new(4)
            .send("s", &info("short", "", 10), &b"ABCDEF"[..], &tx)
            .await;
        assert!(matches!(result, Err(TransferError::Io(_))));
        drop(tx);

        let msgs = collect(rx).await;
        let actions: Vec<&str> = msgs.iter().map(ChannelMessage::action).collect();
        assert_eq!(actions, vec!["start", "chunk", "error"]);
    }

    #[tokio::test]
    async fn closed_channel_aborts() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let result = Segmenter::new(4)
            .send("c", &info("x", "", 4), &b"ABCD"[..], &tx)
            .await;
        assert!(matches!(result, Err(TransferError::ChannelClosed)));
    }
}
