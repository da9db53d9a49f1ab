use std::cell::RefCell;
use std::rc::Rc;

use unicode_segmentation::UnicodeSegmentation;

use crate::cursor::{FileCursor, PostingCursor, SliceCursor};
use crate::dictionary::{Dictionary, UNIVERSAL_TERM};
use crate::error::Result;
use crate::posting::DocId;
use crate::tokenizer::TextAdapter;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Term(String),
    And,
    Or,
    Not,
    AndNot,
    LParen,
    RParen,
}

/// Tokenizes a Boolean query: `AND`/`OR`/`NOT`/parens are recognized
/// literally (case-sensitive, never stemmed); everything else is stemmed
/// and lowercased exactly as at index time.
fn tokenize<T: crate::tokenizer::Tokenizer>(query: &str, adapter: &TextAdapter<T>) -> Vec<Token> {
    // Split on whitespace first so `(` / `)` glued to a term are still
    // visible as separate raw words via unicode_words, but AND/OR/NOT must
    // be matched on whole words, not substrings of stemmed terms.
    let mut tokens = Vec::new();
    for word in query.split_whitespace() {
        let mut remainder = word;
        loop {
            if let Some(rest) = remainder.strip_prefix('(') {
                tokens.push(Token::LParen);
                remainder = rest;
                continue;
            }
            break;
        }
        let mut trailing_parens = 0;
        while remainder.ends_with(')') {
            remainder = &remainder[..remainder.len() - 1];
            trailing_parens += 1;
        }

        if !remainder.is_empty() {
            match remainder {
                "AND" => tokens.push(Token::And),
                "OR" => tokens.push(Token::Or),
                "NOT" => tokens.push(Token::Not),
                other => {
                    for stemmed in adapter.process(other) {
                        tokens.push(Token::Term(stemmed));
                    }
                }
            }
        }
        for _ in 0..trailing_parens {
            tokens.push(Token::RParen);
        }
    }
    tokens
}

/// Collapses runs of consecutive `NOT` tokens to a single `NOT` (odd count)
/// or nothing (even count).
fn collapse_nots(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::new();
    let mut run = 0usize;
    for tok in tokens {
        if tok == Token::Not {
            run += 1;
        } else {
            if run % 2 == 1 {
                out.push(Token::Not);
            }
            run = 0;
            out.push(tok);
        }
    }
    if run % 2 == 1 {
        out.push(Token::Not);
    }
    out
}

/// Finds the end index (exclusive) of the operand span starting at `start`:
/// either a single term token, or a balanced parenthesized group.
fn operand_span_end(tokens: &[Token], start: usize) -> Option<usize> {
    match tokens.get(start)? {
        Token::Term(_) => Some(start + 1),
        Token::LParen => {
            let mut depth = 0;
            for (i, tok) in tokens.iter().enumerate().skip(start) {
                match tok {
                    Token::LParen => depth += 1,
                    Token::RParen => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i + 1);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        _ => None,
    }
}

/// Folds `<span> AND NOT <span>` and `NOT <span> AND <span>` into a single
/// `<span> ANDNOT <span>`, in one left-to-right pass that emits a fresh
/// token vector rather than mutating the input in place.
fn fold_andnot(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        // NOT <span> AND <span>
        if tokens[i] == Token::Not {
            if let Some(span1_end) = operand_span_end(&tokens, i + 1) {
                if tokens.get(span1_end) == Some(&Token::And) {
                    if let Some(span2_end) = operand_span_end(&tokens, span1_end + 1) {
                        out.extend_from_slice(&tokens[span1_end + 1..span2_end]);
                        out.push(Token::AndNot);
                        out.extend_from_slice(&tokens[i + 1..span1_end]);
                        i = span2_end;
                        continue;
                    }
                }
            }
        }
        // <span> AND NOT <span>
        if let Some(span1_end) = operand_span_end(&tokens, i) {
            if tokens.get(span1_end) == Some(&Token::And) && tokens.get(span1_end + 1) == Some(&Token::Not) {
                if let Some(span2_end) = operand_span_end(&tokens, span1_end + 2) {
                    out.extend_from_slice(&tokens[i..span1_end]);
                    out.push(Token::AndNot);
                    out.extend_from_slice(&tokens[span1_end + 2..span2_end]);
                    i = span2_end;
                    continue;
                }
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

fn precedence(tok: &Token) -> u8 {
    match tok {
        Token::AndNot => 4,
        Token::Not => 3,
        Token::And => 2,
        Token::Or => 1,
        _ => 0,
    }
}

/// Shunting-yard: infix tokens to a postfix queue.
fn to_postfix(tokens: Vec<Token>) -> Vec<Token> {
    let mut output = Vec::new();
    let mut ops: Vec<Token> = Vec::new();

    for tok in tokens {
        match tok {
            Token::Term(_) => output.push(tok),
            Token::LParen => ops.push(tok),
            Token::RParen => {
                while let Some(top) = ops.last() {
                    if *top == Token::LParen {
                        break;
                    }
                    output.push(ops.pop().unwrap());
                }
                ops.pop(); // discard LParen
            }
            Token::Not => {
                // unary, right-associative: only pop higher-precedence ops
                while let Some(top) = ops.last() {
                    if *top == Token::LParen {
                        break;
                    }
                    if precedence(top) > precedence(&tok) {
                        output.push(ops.pop().unwrap());
                    } else {
                        break;
                    }
                }
                ops.push(tok);
            }
            Token::And | Token::Or | Token::AndNot => {
                while let Some(top) = ops.last() {
                    if *top == Token::LParen {
                        break;
                    }
                    if precedence(top) >= precedence(&tok) {
                        output.push(ops.pop().unwrap());
                    } else {
                        break;
                    }
                }
                ops.push(tok);
            }
        }
    }
    while let Some(top) = ops.pop() {
        output.push(top);
    }
    output
}

/// Either a term still to be resolved against the dictionary, or an already
/// materialized ascending doc_id list.
enum Operand {
    Term(String),
    List(Vec<DocId>),
}

/// Evaluates a Boolean query against the loaded dictionary and shared
/// postings file handle, returning the ascending list of matching doc ids.
pub fn evaluate<T: crate::tokenizer::Tokenizer>(
    query: &str,
    adapter: &TextAdapter<T>,
    dictionary: &Dictionary,
    postings_file: &Rc<RefCell<std::fs::File>>,
) -> Result<Vec<DocId>> {
    let tokens = tokenize(query, adapter);
    let tokens = collapse_nots(tokens);
    let tokens = fold_andnot(tokens);
    let postfix = to_postfix(tokens);

    let mut stack: Vec<Operand> = Vec::new();
    for tok in postfix {
        match tok {
            Token::Term(t) => stack.push(Operand::Term(t)),
            Token::Not => {
                let a = materialize(stack.pop().unwrap(), dictionary, postings_file)?;
                let universal = universal_list(dictionary, postings_file)?;
                stack.push(Operand::List(not_op(&universal, &a)));
            }
            Token::And => {
                let b = stack.pop().unwrap();
                let a = stack.pop().unwrap();
                stack.push(Operand::List(and_op(a, b, dictionary, postings_file)?));
            }
            Token::Or => {
                let b = materialize(stack.pop().unwrap(), dictionary, postings_file)?;
                let a = materialize(stack.pop().unwrap(), dictionary, postings_file)?;
                stack.push(Operand::List(or_op(&a, &b)));
            }
            Token::AndNot => {
                let b = stack.pop().unwrap();
                let a = stack.pop().unwrap();
                stack.push(Operand::List(andnot_op(a, b, dictionary, postings_file)?));
            }
            Token::LParen | Token::RParen => unreachable!("postfix never carries parens"),
        }
    }

    match stack.pop() {
        Some(op) => materialize(op, dictionary, postings_file),
        None => Ok(Vec::new()),
    }
}

fn materialize(
    op: Operand,
    dictionary: &Dictionary,
    postings_file: &Rc<RefCell<std::fs::File>>,
) -> Result<Vec<DocId>> {
    match op {
        Operand::List(list) => Ok(list),
        Operand::Term(term) => read_postings(&term, dictionary, postings_file),
    }
}

fn read_postings(
    term: &str,
    dictionary: &Dictionary,
    postings_file: &Rc<RefCell<std::fs::File>>,
) -> Result<Vec<DocId>> {
    let entry = match dictionary.get(term) {
        Some(e) => e,
        None => return Ok(Vec::new()),
    };
    let end = crate::cursor::line_end(postings_file, entry.offset)?;
    let cursor = FileCursor::new(Rc::clone(postings_file), entry.offset, end)?;
    let mut out = Vec::new();
    let mut cursor = cursor;
    while let Some(v) = cursor.value() {
        out.push(v);
        cursor.advance()?;
    }
    Ok(out)
}

fn universal_list(
    dictionary: &Dictionary,
    postings_file: &Rc<RefCell<std::fs::File>>,
) -> Result<Vec<DocId>> {
    read_postings(UNIVERSAL_TERM, dictionary, postings_file)
}

/// Builds the right kind of cursor for an operand: a `FileCursor` over the
/// real skip-augmented postings line for an unresolved term (preserving the
/// on-disk skip pointers), or a `SliceCursor` over an already materialized
/// intermediate list (using a freshly computed `floor(sqrt(n))` distance).
fn operand_cursor(
    op: Operand,
    dictionary: &Dictionary,
    postings_file: &Rc<RefCell<std::fs::File>>,
) -> Result<Box<dyn PostingCursor>> {
    match op {
        Operand::List(list) => Ok(Box::new(SliceCursor::new(list))),
        Operand::Term(term) => match dictionary.get(&term) {
            Some(entry) => {
                let end = crate::cursor::line_end(postings_file, entry.offset)?;
                Ok(Box::new(FileCursor::new(Rc::clone(postings_file), entry.offset, end)?))
            }
            None => Ok(Box::new(SliceCursor::new(Vec::new()))),
        },
    }
}

fn or_op(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

fn not_op(universal: &[DocId], a: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < universal.len() {
        if j < a.len() && universal[i] == a[j] {
            i += 1;
            j += 1;
        } else if j < a.len() && a[j] < universal[i] {
            j += 1;
        } else {
            out.push(universal[i]);
            i += 1;
        }
    }
    out
}

/// Skip-accelerated ascending intersection. When a cursor trails the other,
/// its skip pointer is tried first; a plain advance is the fallback. Each
/// operand keeps whatever cursor kind suits it, so a bare term still walks
/// its real on-disk skip pointers instead of ones recomputed from scratch.
fn and_op(
    a: Operand,
    b: Operand,
    dictionary: &Dictionary,
    postings_file: &Rc<RefCell<std::fs::File>>,
) -> Result<Vec<DocId>> {
    let mut ac = operand_cursor(a, dictionary, postings_file)?;
    let mut bc = operand_cursor(b, dictionary, postings_file)?;
    let mut out = Vec::new();
    loop {
        match (ac.value(), bc.value()) {
            (Some(av), Some(bv)) => {
                if av == bv {
                    out.push(av);
                    ac.advance()?;
                    bc.advance()?;
                } else if av < bv {
                    if !ac.try_skip(bv)? {
                        ac.advance()?;
                    }
                } else if !bc.try_skip(av)? {
                    bc.advance()?;
                }
            }
            _ => break,
        }
    }
    Ok(out)
}

fn andnot_op(
    a: Operand,
    b: Operand,
    dictionary: &Dictionary,
    postings_file: &Rc<RefCell<std::fs::File>>,
) -> Result<Vec<DocId>> {
    let mut ac = operand_cursor(a, dictionary, postings_file)?;
    let mut bc = operand_cursor(b, dictionary, postings_file)?;
    let mut out = Vec::new();
    loop {
        match (ac.value(), bc.value()) {
            (Some(av), Some(bv)) => {
                if av == bv {
                    ac.advance()?;
                    bc.advance()?;
                } else if av < bv {
                    out.push(av);
                    ac.advance()?;
                } else if !bc.try_skip(av)? {
                    bc.advance()?;
                }
            }
            (Some(av), None) => {
                out.push(av);
                ac.advance()?;
            }
            (None, _) => break,
        }
    }
    Ok(out)
}

/// True if `query` contains any of the literal Boolean operator words or
/// parentheses, meaning it should be evaluated as a Boolean expression
/// rather than a free-text ranked query.
pub fn looks_boolean(query: &str) -> bool {
    query.contains('(')
        || query.contains(')')
        || query
            .unicode_words()
            .any(|w| w == "AND" || w == "OR" || w == "NOT")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_even_and_odd_not_runs() {
        let tokens = vec![Token::Not, Token::Not, Token::Term("cat".into())];
        assert_eq!(collapse_nots(tokens), vec![Token::Term("cat".into())]);

        let tokens = vec![Token::Not, Token::Not, Token::Not, Token::Term("cat".into())];
        assert_eq!(
            collapse_nots(tokens),
            vec![Token::Not, Token::Term("cat".into())]
        );
    }

    #[test]
    fn folds_and_not_both_directions() {
        let tokens = vec![
            Token::Term("cat".into()),
            Token::And,
            Token::Not,
            Token::Term("dog".into()),
        ];
        let folded = fold_andnot(tokens);
        assert_eq!(
            folded,
            vec![
                Token::Term("cat".into()),
                Token::AndNot,
                Token::Term("dog".into())
            ]
        );

        let tokens = vec![
            Token::Not,
            Token::Term("dog".into()),
            Token::And,
            Token::Term("cat".into()),
        ];
        let folded = fold_andnot(tokens);
        assert_eq!(
            folded,
            vec![
                Token::Term("cat".into()),
                Token::AndNot,
                Token::Term("dog".into())
            ]
        );
    }

    #[test]
    fn double_negative_and_is_left_alone() {
        let tokens = vec![
            Token::Not,
            Token::Term("cat".into()),
            Token::And,
            Token::Not,
            Token::Term("dog".into()),
        ];
        let folded = fold_andnot(tokens);
        assert_eq!(folded, tokens);
    }

    #[test]
    fn and_before_or_in_postfix() {
        let tokens = vec![
            Token::Term("a".into()),
            Token::Or,
            Token::Term("b".into()),
            Token::And,
            Token::Term("c".into()),
        ];
        let postfix = to_postfix(tokens);
        assert_eq!(
            postfix,
            vec![
                Token::Term("a".into()),
                Token::Term("b".into()),
                Token::Term("c".into()),
                Token::And,
                Token::Or,
            ]
        );
    }

    #[test]
    fn or_merges_with_dedup() {
        assert_eq!(or_op(&[1, 3, 5], &[3, 4]), vec![1, 3, 4, 5]);
    }

    #[test]
    fn not_op_complements_against_universal() {
        assert_eq!(not_op(&[1, 2, 3, 4], &[1, 3]), vec![2, 4]);
    }

    proptest::proptest! {
        #[test]
        fn or_op_matches_set_union(
            a in proptest::collection::btree_set(0u32..200, 0..20),
            b in proptest::collection::btree_set(0u32..200, 0..20),
        ) {
            let av: Vec<DocId> = a.iter().cloned().collect();
            let bv: Vec<DocId> = b.iter().cloned().collect();
            let merged = or_op(&av, &bv);

            let expected: std::collections::BTreeSet<DocId> = a.union(&b).cloned().collect();
            let expected: Vec<DocId> = expected.into_iter().collect();
            proptest::prop_assert_eq!(merged, expected);
        }

        #[test]
        fn not_op_matches_set_difference(
            universe in proptest::collection::btree_set(0u32..200, 0..40),
            subset in proptest::collection::btree_set(0u32..200, 0..20),
        ) {
            // `a` must actually be a subset of `universal` for `not_op`'s
            // contract (it walks both lists assuming `a`'s ids all appear in
            // `universal`), so intersect before calling it.
            let a: std::collections::BTreeSet<DocId> =
                subset.intersection(&universe).cloned().collect();
            let universal_v: Vec<DocId> = universe.iter().cloned().collect();
            let a_v: Vec<DocId> = a.iter().cloned().collect();

            let complement = not_op(&universal_v, &a_v);
            let expected: Vec<DocId> = universe.difference(&a).cloned().collect();
            proptest::prop_assert_eq!(complement, expected);
        }
    }
}
