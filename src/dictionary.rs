use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;
use crate::posting::{PostingLine, TermId};

pub const UNIVERSAL_TERM: &str = "_universal";

/// One term's dictionary entry: its dense id, inverse document frequency,
/// and the byte offset of the first posting on its postings line. Serialized
/// as a 3-element JSON array `[term_id, idf, offset]`, not an object, to
/// match the on-disk dictionary format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DictEntry {
    pub term_id: TermId,
    pub idf: f64,
    pub offset: u64,
}

impl Serialize for DictEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (self.term_id, self.idf, self.offset).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DictEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (term_id, idf, offset) = <(TermId, f64, u64)>::deserialize(deserializer)?;
        Ok(DictEntry {
            term_id,
            idf,
            offset,
        })
    }
}

/// The in-memory dictionary, serialized as a single keyed JSON object whose
/// values are the 3-element arrays above.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Dictionary(pub HashMap<String, DictEntry>);

impl Dictionary {
    pub fn get(&self, term: &str) -> Option<&DictEntry> {
        self.0.get(term)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let dict: HashMap<String, DictEntry> = serde_json::from_reader(file)?;
        Ok(Dictionary(dict))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &self.0)?;
        Ok(())
    }
}

/// Builds the dictionary by scanning the final, skip-augmented postings
/// file once, with `term_to_id` providing the reverse mapping (id -> term
/// text) needed to key each entry.
pub fn build_dictionary(
    postings_path: &Path,
    id_to_term: &HashMap<TermId, String>,
    collection_size: u64,
) -> Result<Dictionary> {
    let file = File::open(postings_path)?;
    let reader = BufReader::new(file);

    let mut entries = HashMap::new();
    let mut offset: u64 = 0;

    for line in reader.lines() {
        let line = line?;
        let line_bytes = line.len() as u64 + 1; // account for the trailing '\n'
        let parsed = PostingLine::parse(&line)?;

        let term = id_to_term
            .get(&parsed.term_id)
            .cloned()
            .unwrap_or_else(|| UNIVERSAL_TERM.to_string());

        let term_prefix_len = parsed.term_id.to_string().len() as u64 + 1; // "<id> "
        let doc_freq = parsed.postings.len() as u64;
        let idf = if doc_freq == 0 {
            0.0
        } else {
            (collection_size as f64 / doc_freq as f64).ln()
        };

        entries.insert(
            term,
            DictEntry {
                term_id: parsed.term_id,
                idf,
                offset: offset + term_prefix_len,
            },
        );

        offset += line_bytes;
    }

    Ok(Dictionary(entries))
}
