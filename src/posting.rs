use crate::error::{Error, Result};

pub type DocId = u32;
pub type TermId = u32;

/// One entry on a postings line: a document id, its cosine-normalized
/// weight for that term, and an optional skip annotation added by the
/// augmenter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f64,
    pub skip: Option<u32>,
}

impl Posting {
    pub fn new(doc_id: DocId, weight: f64) -> Self {
        Posting {
            doc_id,
            weight,
            skip: None,
        }
    }

    /// Width in bytes of this posting's `doc_id,weight` token, excluding any
    /// skip suffix. This is what the augmenter sums over when computing skip
    /// offsets.
    pub fn token_width(&self) -> usize {
        format!("{},{}", self.doc_id, self.weight).len()
    }

    /// Renders this posting as it appears on a postings line, including the
    /// skip suffix if present.
    pub fn render(&self) -> String {
        match self.skip {
            Some(skip) => format!("{},{},{}", self.doc_id, self.weight, skip),
            None => format!("{},{}", self.doc_id, self.weight),
        }
    }

    fn parse(token: &str) -> Result<Self> {
        let mut parts = token.split(',');
        let doc_id: DocId = parts
            .next()
            .ok_or_else(|| malformed(token))?
            .parse()
            .map_err(|_| malformed(token))?;
        let weight: f64 = parts
            .next()
            .ok_or_else(|| malformed(token))?
            .parse()
            .map_err(|_| malformed(token))?;
        let skip = match parts.next() {
            Some(s) => Some(s.parse().map_err(|_| malformed(token))?),
            None => None,
        };
        Ok(Posting {
            doc_id,
            weight,
            skip,
        })
    }
}

fn malformed(token: &str) -> Error {
    Error::PostingsFormat {
        detail: format!("bad posting token {:?}", token),
    }
}

/// One parsed postings line: the term id and its ascending posting list.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingLine {
    pub term_id: TermId,
    pub postings: Vec<Posting>,
}

impl PostingLine {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches('\n');
        let mut fields = line.split(' ');
        let term_id: TermId = fields
            .next()
            .ok_or_else(|| malformed(line))?
            .parse()
            .map_err(|_| malformed(line))?;
        let postings = fields
            .filter(|tok| !tok.is_empty())
            .map(Posting::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(PostingLine { term_id, postings })
    }

    pub fn render(&self) -> String {
        let body = self
            .postings
            .iter()
            .map(Posting::render)
            .collect::<Vec<_>>()
            .join(" ");
        format!("{} {}\n", self.term_id, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_without_skip() {
        let line = PostingLine {
            term_id: 3,
            postings: vec![Posting::new(1, 0.5), Posting::new(4, 1.0)],
        };
        let rendered = line.render();
        let parsed = PostingLine::parse(&rendered).unwrap();
        assert_eq!(line, parsed);
    }

    #[test]
    fn round_trips_with_skip() {
        let mut p = Posting::new(7, 0.25);
        p.skip = Some(12);
        let line = PostingLine {
            term_id: 1,
            postings: vec![p],
        };
        let rendered = line.render();
        let parsed = PostingLine::parse(&rendered).unwrap();
        assert_eq!(parsed.postings[0].skip, Some(12));
    }

    #[test]
    fn rejects_garbage() {
        assert!(PostingLine::parse("not a line").is_err());
    }

    proptest::proptest! {
        #[test]
        fn parse_render_round_trips(
            term_id in 0u32..10_000,
            doc_ids in proptest::collection::vec(0u32..1_000_000, 0..20),
            weight_bits in proptest::collection::vec(1u32..1_000_000, 0..20),
        ) {
            let n = doc_ids.len().min(weight_bits.len());
            let postings: Vec<Posting> = doc_ids[..n]
                .iter()
                .zip(&weight_bits[..n])
                .map(|(&id, &w)| Posting::new(id, w as f64 / 1_000_000.0))
                .collect();
            let line = PostingLine { term_id, postings };
            let rendered = line.render();
            let parsed = PostingLine::parse(&rendered).unwrap();
            proptest::prop_assert_eq!(line, parsed);
        }
    }
}
