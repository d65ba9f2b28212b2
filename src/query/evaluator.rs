//! Postfix stack machine over postings.

use super::compiler::Token;
use crate::dictionary::Dictionary;
use crate::error::IndexError;
use crate::skiplist::SkipList;

/// Evaluates a postfix token stream against `dictionary`, returning the
/// result's value string. Stack underflow here would mean the optimizer or
/// Shunting-Yard produced a malformed stream; that is a programming error,
/// not a user-facing one, so it panics rather than returning a result.
pub fn evaluate(postfix: &[Token], dictionary: &mut Dictionary) -> Result<String, IndexError> {
    let universe = dictionary.universe_list();
    let mut stack: Vec<SkipList> = Vec::new();

    for token in postfix {
        match token {
            Token::Term(name) => {
                stack.push(dictionary.get_postings(name)?);
            }
            Token::Not => {
                let operand = stack.pop().expect("optimizer bug: NOT with empty stack");
                stack.push(universe.not(&operand));
            }
            Token::And => {
                let b = stack.pop().expect("optimizer bug: AND with < 2 operands");
                let a = stack.pop().expect("optimizer bug: AND with < 2 operands");
                stack.push(a.and(&b));
            }
            Token::Or => {
                let b = stack.pop().expect("optimizer bug: OR with < 2 operands");
                let a = stack.pop().expect("optimizer bug: OR with < 2 operands");
                stack.push(a.or(&b));
            }
            Token::LParen | Token::RParen => {
                unreachable!("Shunting-Yard never emits parentheses into postfix")
            }
        }
    }

    let result = stack.pop().expect("optimizer bug: empty postfix stream");
    debug_assert!(stack.is_empty(), "optimizer bug: postfix left extra operands on the stack");
    Ok(result.get_value_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{Dictionary, DictionaryFile, TermEntry};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn fixture() -> (tempfile::TempDir, Dictionary) {
        let dir = tempdir().unwrap();
        let postings_path = dir.path().join("postings.txt");
        let dict_path = dir.path().join("dict.json");

        let mut f = File::create(&postings_path).unwrap();
        // cat -> 1, dog -> 1 2, fish -> 2
        write!(f, "1\n1 2\n2\n").unwrap();
        drop(f);

        let mut dict = DictionaryFile::new();
        dict.terms.insert("cat".into(), TermEntry { df: 1, offset: 0 });
        dict.terms.insert("dog".into(), TermEntry { df: 2, offset: 2 });
        dict.terms.insert("fish".into(), TermEntry { df: 1, offset: 6 });
        dict.universe = vec![1, 2];
        dict.save(&dict_path).unwrap();

        let dictionary = Dictionary::open(&dict_path, &postings_path).unwrap();
        (dir, dictionary)
    }

    #[test]
    fn evaluates_and() {
        let (_dir, mut dict) = fixture();
        let postfix = vec![
            Token::Term("cat".into()),
            Token::Term("dog".into()),
            Token::And,
        ];
        assert_eq!(evaluate(&postfix, &mut dict).unwrap(), "1");
    }

    #[test]
    fn evaluates_or() {
        let (_dir, mut dict) = fixture();
        let postfix = vec![
            Token::Term("cat".into()),
            Token::Term("fish".into()),
            Token::Or,
        ];
        assert_eq!(evaluate(&postfix, &mut dict).unwrap(), "1 2");
    }

    #[test]
    fn evaluates_not() {
        let (_dir, mut dict) = fixture();
        let postfix = vec![Token::Term("dog".into()), Token::Not];
        assert_eq!(evaluate(&postfix, &mut dict).unwrap(), "");
    }
}
