use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;

use crate::{MAX_BLOCK_SIZE, TransferError};

// ---------------------------------------------------------------------------
// ChunkPlan
// ---------------------------------------------------------------------------

/// Cursor over a file of known size, handing out blocks of at most
/// [`MAX_BLOCK_SIZE`] bytes.
///
/// Invariant: `position <= total_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    position: u64,
    total_size: u64,
}

impl ChunkPlan {
    /// Starts a plan at offset 0.
    pub fn new(total_size: u64) -> Self {
        Self {
            position: 0,
            total_size,
        }
    }

    /// Size of the next block: `min(MAX_BLOCK_SIZE, total_size - position)`.
    pub fn next_chunk_size(&self) -> usize {
        std::cmp::min(MAX_BLOCK_SIZE as u64, self.remaining()) as usize
    }

    /// Records `n` transferred bytes.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n as u64 <= self.remaining(), "advance past end of plan");
        self.position = std::cmp::min(self.position + n as u64, self.total_size);
    }

    pub fn is_complete(&self) -> bool {
        self.position == self.total_size
    }

    /// Current byte offset.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total file size in bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> u64 {
        self.total_size - self.position
    }
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// One block of file data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw block data, never empty.
    pub data: Vec<u8>,
}

/// Reads a local file as a sequence of [`Block`]s following a [`ChunkPlan`].
///
/// The file size is captured once when the reader is opened; bytes appended
/// afterwards are not read. The file handle is released when the reader is
/// dropped.
pub struct ChunkReader {
    file: tokio::fs::File,
    path: PathBuf,
    plan: ChunkPlan,
}

impl ChunkReader {
    /// Opens `path` and stats it to size the plan.
    pub async fn open(path: &Path) -> Result<Self, TransferError> {
        let file = tokio::fs::File::open(path).await?;
        let total_size = file.metadata().await?.len();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            plan: ChunkPlan::new(total_size),
        })
    }

    /// Reads the next block. Returns `None` once the plan is complete or the
    /// file reports end-of-input.
    ///
    /// Short reads are retried until the planned block size is filled, so
    /// every block except a truncated tail is exactly `next_chunk_size()`.
    pub async fn next_block(&mut self) -> Result<Option<Block>, TransferError> {
        let want = self.plan.next_chunk_size();
        if want == 0 {
            return Ok(None);
        }

        let mut buf = vec![0u8; want];
        let mut filled = 0;
        while filled < want {
            let n = self.file.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);

        let offset = self.plan.position();
        self.plan.advance(filled);
        Ok(Some(Block { offset, data: buf }))
    }

    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
