use crate::posting::PostingLine;

/// Adds skip pointers to one already-sorted postings line, in place.
///
/// Skip distance is `k = floor(sqrt(n))`. A posting at index `i` gets a skip
/// annotation iff `k > 1 && i % k == 0 && i + k < n`; the annotation is the
/// number of whitespace bytes to cross to reach posting `i + k`. Widths are
/// measured from the un-augmented `doc_id,weight` token text, in a single
/// left-to-right pass, so earlier skip annotations never feed into later
/// ones.
pub fn augment(line: &mut PostingLine) {
    let n = line.postings.len();
    let k = (n as f64).sqrt().floor() as usize;
    if k <= 1 {
        return;
    }

    let widths: Vec<usize> = line.postings.iter().map(|p| p.token_width()).collect();

    for i in 0..n {
        if i % k == 0 && i + k < n {
            let skip_offset = (k - 1) + widths[i + 1..i + k].iter().sum::<usize>();
            line.postings[i].skip = Some(skip_offset as u32);
        }
    }
}
