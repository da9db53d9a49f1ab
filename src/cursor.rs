use std::cell::RefCell;
use std::io::{Read, Seek, SeekFrom};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::posting::DocId;

/// Scans forward from `offset` to find the byte position of the line's
/// terminating newline, giving a `FileCursor` a hard upper bound so it never
/// reads into the next term's line.
pub fn line_end(file: &Rc<RefCell<std::fs::File>>, offset: u64) -> Result<u64> {
    let mut f = file.borrow_mut();
    f.seek(SeekFrom::Start(offset))?;
    let mut pos = offset;
    let mut byte = [0u8; 1];
    loop {
        let n = f.read(&mut byte)?;
        if n == 0 || byte[0] == b'\n' {
            break;
        }
        pos += 1;
    }
    Ok(pos)
}

/// Uniform access over a posting source, whether it lives on disk
/// (skip-augmented postings file) or in memory (an intermediate result of
/// evaluating a Boolean subexpression). The Boolean evaluator never needs to
/// know which kind it is holding.
pub trait PostingCursor {
    /// Current doc_id, or `None` if the cursor has run off the end.
    fn value(&self) -> Option<DocId>;

    /// Advance by exactly one posting.
    fn advance(&mut self) -> Result<()>;

    /// Attempt to skip ahead using a precomputed skip pointer if doing so
    /// would still land at or before `target`. Returns whether a skip was
    /// taken; if not, the caller should fall back to `advance`.
    fn try_skip(&mut self, target: DocId) -> Result<bool>;
}

/// Cursor over an in-memory ascending list of doc ids, as produced by
/// evaluating a Boolean subexpression. Skip distance is fixed at
/// construction as `floor(sqrt(n))`, mirroring the on-disk augmenter.
pub struct SliceCursor {
    ids: Vec<DocId>,
    pos: usize,
    skip_distance: usize,
}

impl SliceCursor {
    pub fn new(ids: Vec<DocId>) -> Self {
        let skip_distance = (ids.len() as f64).sqrt().floor() as usize;
        SliceCursor {
            ids,
            pos: 0,
            skip_distance,
        }
    }

    pub fn into_ascending(mut self) -> Vec<DocId> {
        // drain the rest so callers that want the whole remaining list get it
        let mut out = Vec::new();
        while let Some(v) = self.value() {
            out.push(v);
            let _ = self.advance();
        }
        out
    }
}

impl PostingCursor for SliceCursor {
    fn value(&self) -> Option<DocId> {
        self.ids.get(self.pos).copied()
    }

    fn advance(&mut self) -> Result<()> {
        if self.pos < self.ids.len() {
            self.pos += 1;
        }
        Ok(())
    }

    fn try_skip(&mut self, target: DocId) -> Result<bool> {
        let k = self.skip_distance;
        if k <= 1 {
            return Ok(false);
        }
        // Only valid to skip from a position that is itself a multiple of k
        // within the current remaining window, matching the on-disk layout.
        if self.pos % k != 0 {
            return Ok(false);
        }
        let dest = self.pos + k;
        if dest >= self.ids.len() {
            return Ok(false);
        }
        if self.ids[dest] <= target {
            self.pos = dest;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Cursor over one line of the on-disk postings file, reading through a
/// shared file handle. Search is single-threaded, so one `RefCell<File>` is
/// safely shared by every live cursor.
pub struct FileCursor {
    file: Rc<RefCell<std::fs::File>>,
    /// Byte offset of the current posting's doc_id, or the file length if
    /// exhausted.
    pos: u64,
    end: u64,
    current: Option<(DocId, f64, u64, Option<u32>)>, // (doc_id, weight, offset_of_next_posting, skip)
}

impl FileCursor {
    /// `start` is the byte offset of the term_id's first posting (the
    /// dictionary's stored offset). `line_len` bounds how far this cursor is
    /// allowed to read before hitting the line's terminating newline.
    pub fn new(file: Rc<RefCell<std::fs::File>>, start: u64, end: u64) -> Result<Self> {
        let mut cursor = FileCursor {
            file,
            pos: start,
            end,
            current: None,
        };
        cursor.load()?;
        Ok(cursor)
    }

    fn load(&mut self) -> Result<()> {
        if self.pos >= self.end {
            self.current = None;
            return Ok(());
        }
        let token = self.read_token_at(self.pos)?;
        let next_offset = self.pos + token.len() as u64 + 1; // +1 for separator
        let mut parts = token.split(',');
        let doc_id: DocId = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed(&token))?;
        let weight: f64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed(&token))?;
        let skip = match parts.next() {
            Some(s) => Some(s.parse().map_err(|_| malformed(&token))?),
            None => None,
        };
        self.current = Some((doc_id, weight, next_offset, skip));
        Ok(())
    }

    /// The current posting's weight, or `None` if the cursor is exhausted.
    pub fn weight(&self) -> Option<f64> {
        self.current.map(|(_, weight, _, _)| weight)
    }

    fn read_token_at(&self, offset: u64) -> Result<String> {
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            let n = file.read(&mut byte)?;
            if n == 0 || byte[0] == b' ' || byte[0] == b'\n' {
                break;
            }
            buf.push(byte[0]);
        }
        String::from_utf8(buf).map_err(|_| Error::PostingsFormat {
            detail: "non-utf8 posting token".to_string(),
        })
    }
}

fn malformed(token: &str) -> Error {
    Error::PostingsFormat {
        detail: format!("bad posting token {:?}", token),
    }
}

impl PostingCursor for FileCursor {
    fn value(&self) -> Option<DocId> {
        self.current.map(|(doc_id, _, _, _)| doc_id)
    }

    fn advance(&mut self) -> Result<()> {
        if let Some((_, _, next_offset, _)) = self.current {
            self.pos = next_offset;
            self.load()?;
        }
        Ok(())
    }

    fn try_skip(&mut self, target: DocId) -> Result<bool> {
        let (_, _, next_offset, skip) = match self.current {
            Some(c) => c,
            None => return Ok(false),
        };
        let skip = match skip {
            Some(s) => s,
            None => return Ok(false),
        };
        let dest = next_offset + skip as u64;
        if dest >= self.end {
            return Ok(false);
        }
        let saved_pos = self.pos;
        let saved_current = self.current;
        self.pos = dest;
        self.load()?;
        match self.current {
            Some((doc_id, _, _, _)) if doc_id <= target => Ok(true),
            _ => {
                self.pos = saved_pos;
                self.current = saved_current;
                Ok(false)
            }
        }
    }
}
