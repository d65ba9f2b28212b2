//! Tokenizer, validator, df-driven optimizer, and Shunting-Yard conversion.
//!
//! A query that fails validation or has mismatched parentheses compiles to
//! `None`; the evaluator treats that as an empty result, never as an error.

use crate::dictionary::Dictionary;
use crate::normalize::Normalizer;

/// A query token. `Term` already holds the normalized form.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Term(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

#[derive(Clone, Copy, PartialEq)]
enum Kind {
    Term,
    And,
    Or,
    Not,
    LParen,
    RParen,
}

fn kind(t: &Token) -> Kind {
    match t {
        Token::Term(_) => Kind::Term,
        Token::And => Kind::And,
        Token::Or => Kind::Or,
        Token::Not => Kind::Not,
        Token::LParen => Kind::LParen,
        Token::RParen => Kind::RParen,
    }
}

fn precedence(t: &Token) -> u8 {
    match t {
        Token::Not => 3,
        Token::And => 2,
        Token::Or => 1,
        _ => 0,
    }
}

/// Compiles `query` into a postfix token stream, or `None` if the query is
/// invalid (disallowed operator adjacency, a bare multi-word fragment, or
/// mismatched parentheses).
pub fn compile(query: &str, dictionary: &Dictionary, normalizer: &dyn Normalizer) -> Option<Vec<Token>> {
    let tokens = tokenize(query, normalizer)?;
    if tokens.is_empty() || is_invalid(&tokens) {
        return None;
    }
    let universe_len = dictionary.universe_len() as u64;
    let (infix, _df) = optimize_top_level(&tokens, dictionary, universe_len)?;
    shunting_yard(&infix)
}

/// Splits on the five reserved tokens while preserving them, normalizing every
/// other whitespace-delimited fragment. A fragment containing internal
/// whitespace (an un-separated multi-word run between operators) is invalid.
fn tokenize(query: &str, normalizer: &dyn Normalizer) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut frag_start = 0usize;
    let mut i = 0usize;
    let len = query.len();

    while i < len {
        let remaining = &query[i..];
        if let Some((matched_len, tok)) = match_reserved(remaining) {
            push_word_fragment(&query[frag_start..i], normalizer, &mut tokens)?;
            tokens.push(tok);
            i += matched_len;
            frag_start = i;
        } else {
            let ch_len = remaining.chars().next().map_or(1, char::len_utf8);
            i += ch_len;
        }
    }
    push_word_fragment(&query[frag_start..], normalizer, &mut tokens)?;
    Some(tokens)
}

fn match_reserved(s: &str) -> Option<(usize, Token)> {
    if s.starts_with("AND") {
        Some((3, Token::And))
    } else if s.starts_with("NOT") {
        Some((3, Token::Not))
    } else if s.starts_with("OR") {
        Some((2, Token::Or))
    } else if s.starts_with('(') {
        Some((1, Token::LParen))
    } else if s.starts_with(')') {
        Some((1, Token::RParen))
    } else {
        None
    }
}

fn push_word_fragment(frag: &str, normalizer: &dyn Normalizer, tokens: &mut Vec<Token>) -> Option<()> {
    let trimmed = frag.trim();
    if trimmed.is_empty() {
        return Some(());
    }
    if trimmed.split_whitespace().count() > 1 {
        return None;
    }
    let term = normalizer
        .normalize(trimmed)
        .into_iter()
        .next()
        .unwrap_or_else(|| trimmed.to_string());
    tokens.push(Token::Term(term));
    Some(())
}

/// Disallowed adjacency and boundary rules. Operates on the filtered token
/// stream, so two operators separated by a term are never "adjacent" here.
fn is_invalid(tokens: &[Token]) -> bool {
    use Kind::*;

    if matches!(kind(&tokens[0]), And | Or) {
        return true;
    }
    if matches!(kind(tokens.last().unwrap()), And | Or | Not) {
        return true;
    }

    for pair in tokens.windows(2) {
        let bad = matches!(
            (kind(&pair[0]), kind(&pair[1])),
            (And, Or)
                | (Or, And)
                | (Not, And)
                | (Not, Or)
                | (And, And)
                | (Or, Or)
                | (Not, Not)
                | (LParen, And)
                | (LParen, Or)
                | (And, RParen)
                | (Or, RParen)
                | (Not, RParen)
        );
        if bad {
            return true;
        }
    }
    false
}

/// An atom entering the optimizer: either an indexed term or an already
/// fully-optimized parenthesized group, each carrying its document frequency.
enum Atom {
    Term(String, u64),
    Group(Vec<Token>, u64),
}

impl Atom {
    fn into_tokens_and_df(self) -> (Vec<Token>, u64) {
        match self {
            Atom::Term(name, df) => (vec![Token::Term(name)], df),
            Atom::Group(tokens, df) => (tokens, df),
        }
    }
}

enum FlatTok {
    And,
    Or,
    Not,
    Atom(Atom),
}

/// Builds the outer flat sequence, recursively optimizing each top-level
/// bracketed group first (one level only: a nested `(` inside a group makes
/// the query invalid, not recursively optimized).
fn to_flat_sequence(tokens: &[Token], dictionary: &Dictionary, universe_len: u64) -> Option<Vec<FlatTok>> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < tokens.len() {
        match &tokens[i] {
            Token::And => {
                out.push(FlatTok::And);
                i += 1;
            }
            Token::Or => {
                out.push(FlatTok::Or);
                i += 1;
            }
            Token::Not => {
                out.push(FlatTok::Not);
                i += 1;
            }
            Token::Term(name) => {
                let df = dictionary.df(name);
                out.push(FlatTok::Atom(Atom::Term(name.clone(), df)));
                i += 1;
            }
            Token::LParen => {
                let close = find_matching_close(tokens, i)?;
                let inner = &tokens[i + 1..close];
                let inner_flat = to_flat_sequence(inner, dictionary, universe_len)?;
                let (group_tokens, group_df) = optimize_chunk_sequence(inner_flat, universe_len);
                out.push(FlatTok::Atom(Atom::Group(group_tokens, group_df)));
                i = close + 1;
            }
            Token::RParen => return None, // unmatched close, caught by find_matching_close elsewhere
        }
    }
    Some(out)
}

/// Finds the `)` matching the `(` at `open_idx`, rejecting any `(` found
/// before it (a second level of nesting is not supported).
fn find_matching_close(tokens: &[Token], open_idx: usize) -> Option<usize> {
    let mut i = open_idx + 1;
    while i < tokens.len() {
        match tokens[i] {
            Token::LParen => return None,
            Token::RParen => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Splits on `OR`, folds `NOT atom` into a single negated atom per AND-chunk,
/// sorts each chunk's atoms by ascending df, and combines chunks back with
/// `OR`. Returns the rewritten tokens wrapped in `(...)` plus the combined df.
fn optimize_chunk_sequence(flat: Vec<FlatTok>, universe_len: u64) -> (Vec<Token>, u64) {
    let chunks = split_by_or(flat);

    let mut chunk_results: Vec<(Vec<Token>, u64)> = Vec::new();
    for chunk in chunks {
        chunk_results.push(optimize_and_chunk(chunk, universe_len));
    }

    let mut out = vec![Token::LParen];
    let total_df = chunk_results.iter().map(|(_, df)| df).sum::<u64>().min(universe_len);
    for (i, (chunk_tokens, _)) in chunk_results.into_iter().enumerate() {
        if i > 0 {
            out.push(Token::Or);
        }
        out.extend(chunk_tokens);
    }
    out.push(Token::RParen);
    (out, total_df)
}

fn split_by_or(flat: Vec<FlatTok>) -> Vec<Vec<FlatTok>> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    for item in flat {
        match item {
            FlatTok::Or => {
                chunks.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    chunks.push(current);
    chunks
}

/// A chunk has no `OR`; atoms can be freely reordered around `AND`.
fn optimize_and_chunk(chunk: Vec<FlatTok>, universe_len: u64) -> (Vec<Token>, u64) {
    let mut atoms: Vec<(Vec<Token>, u64)> = Vec::new();
    let mut iter = chunk.into_iter();
    while let Some(item) = iter.next() {
        match item {
            FlatTok::And => {}
            FlatTok::Not => {
                // validation rejects `NOT AND`, `NOT OR`, `NOT NOT`, and a
                // trailing `NOT`, so the next item is always an atom.
                match iter.next() {
                    Some(FlatTok::Atom(atom)) => {
                        let (base_tokens, df) = atom.into_tokens_and_df();
                        let negated_df = universe_len.saturating_sub(df);
                        let mut toks = vec![Token::Not];
                        toks.extend(base_tokens);
                        atoms.push((toks, negated_df));
                    }
                    _ => unreachable!("validation guarantees NOT precedes an atom"),
                }
            }
            FlatTok::Atom(atom) => {
                atoms.push(atom.into_tokens_and_df());
            }
            FlatTok::Or => unreachable!("chunks never contain OR"),
        }
    }
    finish_chunk(atoms)
}

fn finish_chunk(mut atoms: Vec<(Vec<Token>, u64)>) -> (Vec<Token>, u64) {
    atoms.sort_by_key(|(_, df)| *df);
    let chunk_df = atoms.iter().map(|(_, df)| *df).min().unwrap_or(0);
    let mut out = Vec::new();
    for (i, (tokens, _)) in atoms.into_iter().enumerate() {
        if i > 0 {
            out.push(Token::And);
        }
        out.extend(tokens);
    }
    (out, chunk_df)
}

/// Runs Shunting-Yard over the optimized infix token stream: `NOT = 3`,
/// `AND = 2`, `OR = 1`, both binary operators popped with a `<=` rule.
/// Returns `None` on mismatched parentheses.
fn shunting_yard(infix: &[Token]) -> Option<Vec<Token>> {
    let mut output = Vec::new();
    let mut stack: Vec<Token> = Vec::new();

    for token in infix {
        match token {
            Token::Term(_) => output.push(token.clone()),
            Token::LParen => stack.push(token.clone()),
            Token::RParen => {
                loop {
                    match stack.pop() {
                        Some(Token::LParen) => break,
                        Some(op) => output.push(op),
                        None => return None,
                    }
                }
            }
            Token::And | Token::Or | Token::Not => {
                while let Some(top) = stack.last() {
                    if matches!(top, Token::LParen) {
                        break;
                    }
                    if precedence(token) <= precedence(top) {
                        output.push(stack.pop().unwrap());
                    } else {
                        break;
                    }
                }
                stack.push(token.clone());
            }
        }
    }

    while let Some(op) = stack.pop() {
        if matches!(op, Token::LParen) {
            return None;
        }
        output.push(op);
    }
    Some(output)
}

/// Top-level optimization pass: same procedure as a bracketed group, but the
/// outermost wrapping parentheses are stripped since they add nothing before
/// Shunting-Yard.
fn optimize_top_level(
    tokens: &[Token],
    dictionary: &Dictionary,
    universe_len: u64,
) -> Option<(Vec<Token>, u64)> {
    let flat = to_flat_sequence(tokens, dictionary, universe_len)?;
    let (mut wrapped, df) = optimize_chunk_sequence(flat, universe_len);
    if wrapped.first() == Some(&Token::LParen) && wrapped.last() == Some(&Token::RParen) {
        wrapped.pop();
        wrapped.remove(0);
    }
    Some((wrapped, df))
}
