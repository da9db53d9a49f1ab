use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::block::block_path;
use crate::error::{MergeInvariantSnafu, Result};
use crate::posting::PostingLine;
use snafu::ensure;

/// Merges two sorted block files into one, relying on the fact that
/// documents are processed in ascending doc_id order: any term_id shared by
/// both files has doc_id ranges that never overlap, so the merged list for a
/// shared term is the plain concatenation of the lower-doc_id side first.
pub fn merge_pair(a_path: &Path, b_path: &Path, out_path: &Path) -> Result<()> {
    let a = BufReader::new(File::open(a_path)?);
    let b = BufReader::new(File::open(b_path)?);
    let out = File::create(out_path)?;
    let mut writer = BufWriter::new(out);

    let mut a_lines = a.lines();
    let mut b_lines = b.lines();
    let mut a_next = next_line(&mut a_lines)?;
    let mut b_next = next_line(&mut b_lines)?;

    loop {
        match (&a_next, &b_next) {
            (Some(a_line), Some(b_line)) => match a_line.term_id.cmp(&b_line.term_id) {
                Ordering::Less => {
                    writer.write_all(a_line.render().as_bytes())?;
                    a_next = next_line(&mut a_lines)?;
                }
                Ordering::Greater => {
                    writer.write_all(b_line.render().as_bytes())?;
                    b_next = next_line(&mut b_lines)?;
                }
                Ordering::Equal => {
                    let merged = concat_disjoint(a_line, b_line)?;
                    writer.write_all(merged.render().as_bytes())?;
                    a_next = next_line(&mut a_lines)?;
                    b_next = next_line(&mut b_lines)?;
                }
            },
            (Some(a_line), None) => {
                writer.write_all(a_line.render().as_bytes())?;
                a_next = next_line(&mut a_lines)?;
            }
            (None, Some(b_line)) => {
                writer.write_all(b_line.render().as_bytes())?;
                b_next = next_line(&mut b_lines)?;
            }
            (None, None) => break,
        }
    }

    writer.flush()?;
    Ok(())
}

fn next_line(lines: &mut std::io::Lines<BufReader<File>>) -> Result<Option<PostingLine>> {
    match lines.next() {
        Some(line) => Ok(Some(PostingLine::parse(&line?)?)),
        None => Ok(None),
    }
}

/// Concatenates two posting lists for the same term_id. `a` is always the
/// file with the lower block id, which (because documents are processed in
/// ascending doc_id order, and block ids only ever grow across merge rounds)
/// always holds the lower doc_id range. Asserts that range disjointness
/// actually holds rather than silently producing an unsorted list.
fn concat_disjoint(a: &PostingLine, b: &PostingLine) -> Result<PostingLine> {
    let prev = a.postings.last().map(|p| p.doc_id);
    let next = b.postings.first().map(|p| p.doc_id);
    if let (Some(prev), Some(next)) = (prev, next) {
        ensure!(
            prev < next,
            MergeInvariantSnafu {
                term_id: a.term_id,
                prev,
                next,
            }
        );
    }

    let mut postings = a.postings.clone();
    postings.extend(b.postings.iter().cloned());
    Ok(PostingLine {
        term_id: a.term_id,
        postings,
    })
}

/// Repeatedly pairs up block files (sorted by numeric id) until exactly one
/// remains, returning its path. A trailing unpaired file is simply carried
/// forward under a fresh id rather than merged with itself.
pub fn merge_all(scratch_dir: &Path, mut block_ids: Vec<u32>, mut next_id: u32) -> Result<PathBuf> {
    block_ids.sort_unstable();

    while block_ids.len() > 1 {
        debug!(round_blocks = block_ids.len(), "merge round");
        let mut next_round = Vec::new();
        let mut iter = block_ids.into_iter();
        loop {
            let a = match iter.next() {
                Some(a) => a,
                None => break,
            };
            match iter.next() {
                Some(b) => {
                    let out_id = next_id;
                    next_id += 1;
                    let out_path = block_path(scratch_dir, out_id);
                    merge_pair(&block_path(scratch_dir, a), &block_path(scratch_dir, b), &out_path)?;
                    fs::remove_file(block_path(scratch_dir, a))?;
                    fs::remove_file(block_path(scratch_dir, b))?;
                    next_round.push(out_id);
                }
                None => {
                    // Odd one out: carry forward under a fresh id so the
                    // next round still sees strictly increasing ids.
                    let out_id = next_id;
                    next_id += 1;
                    fs::rename(block_path(scratch_dir, a), block_path(scratch_dir, out_id))?;
                    next_round.push(out_id);
                }
            }
        }
        block_ids = next_round;
    }

    Ok(block_path(scratch_dir, block_ids[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn merges_disjoint_doc_id_ranges_for_shared_term() {
        let dir = tempdir().unwrap();
        let a_path = dir.path().join("a");
        let b_path = dir.path().join("b");
        let out_path = dir.path().join("out");

        fs::write(&a_path, "0 1,0.5\n1 1,1\n").unwrap();
        fs::write(&b_path, "0 3,0.25\n2 3,1\n").unwrap();

        merge_pair(&a_path, &b_path, &out_path).unwrap();
        let contents = fs::read_to_string(&out_path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "0 1,0.5 3,0.25");
        assert_eq!(lines.next().unwrap(), "1 1,1");
        assert_eq!(lines.next().unwrap(), "2 3,1");
    }

    #[test]
    fn merge_all_reduces_to_one_file() {
        let dir = tempdir().unwrap();
        fs::write(block_path(dir.path(), 0), "0 1,1\n").unwrap();
        fs::write(block_path(dir.path(), 1), "0 2,1\n").unwrap();
        fs::write(block_path(dir.path(), 2), "0 3,1\n").unwrap();

        let final_path = merge_all(dir.path(), vec![0, 1, 2], 3).unwrap();
        let contents = fs::read_to_string(&final_path).unwrap();
        assert_eq!(contents, "0 1,1 2,1 3,1\n");
    }
}
