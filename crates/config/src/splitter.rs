//! Escaping-aware splitting of delimited configuration strings
//!
//! A run wrapped in single quotes is kept as one element even when it
//! contains the delimiter; inside such a run `''` stands for a literal quote.
//! Unquoted elements are trimmed.

use types::ConversionError;

const QUOTE: char = '\'';

#[derive(Debug, PartialEq)]
enum Token {
    Quoted { text: String, position: usize },
    Unquoted { text: String, position: usize },
    Delimiter { position: usize },
}

impl Token {
    fn position(&self) -> usize {
        match self {
            Token::Quoted { position, .. }
            | Token::Unquoted { position, .. }
            | Token::Delimiter { position } => *position,
        }
    }
}

/// Split `text` on `delimiter`, honouring single-quote escaping.
///
/// Empty or blank input yields no elements. A delimiter directly followed by
/// another delimiter yields an empty element between them.
pub fn split_escaped(text: &str, delimiter: char) -> Result<Vec<String>, ConversionError> {
    let tokens = tokenize(text, delimiter)?;
    let mut splits = Vec::with_capacity(tokens.len() / 2 + 1);
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        match token {
            Token::Quoted { text: quoted, .. } => {
                if let Some(next) = tokens.peek() {
                    if !matches!(next, Token::Delimiter { .. }) {
                        return Err(ConversionError::malformed(
                            text,
                            format!("illegal quoting at position {}", next.position()),
                        ));
                    }
                }
                splits.push(quoted);
            }
            Token::Unquoted { text: unquoted, .. } => splits.push(unquoted),
            Token::Delimiter { .. } => {
                if matches!(tokens.peek(), Some(Token::Delimiter { .. })) {
                    splits.push(String::new());
                }
            }
        }
    }

    Ok(splits)
}

/// Quote `text` so that [`split_escaped`] returns it as a single element
/// for any of the given delimiters.
///
/// Text that needs no protection is returned unchanged.
pub fn escape_with_single_quote(text: &str, delimiters: &[char]) -> String {
    let needs_quoting = text.is_empty()
        || text.contains(delimiters)
        || text.contains(QUOTE)
        || text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace);

    if !needs_quoting {
        return text.to_string();
    }

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(QUOTE);
    for c in text.chars() {
        if c == QUOTE {
            quoted.push(QUOTE);
        }
        quoted.push(c);
    }
    quoted.push(QUOTE);
    quoted
}

fn tokenize(text: &str, delimiter: char) -> Result<Vec<Token>, ConversionError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut cursor = 0;

    while cursor < chars.len() {
        let c = chars[cursor];
        if c == QUOTE {
            let (quoted, next) = consume_in_quotes(text, &chars, cursor)?;
            tokens.push(Token::Quoted {
                text: quoted,
                position: cursor,
            });
            cursor = next;
        } else if c == delimiter {
            tokens.push(Token::Delimiter { position: cursor });
            cursor += 1;
        } else if c.is_whitespace() {
            cursor += 1;
        } else {
            let end = chars[cursor..]
                .iter()
                .position(|&c| c == delimiter)
                .map_or(chars.len(), |offset| cursor + offset);
            let unquoted: String = chars[cursor..end].iter().collect();
            tokens.push(Token::Unquoted {
                text: unquoted.trim_end().to_string(),
                position: cursor,
            });
            cursor = end;
        }
    }

    Ok(tokens)
}

/// Returns the unescaped content of the quoted run starting at `start` and
/// the position right after its closing quote.
fn consume_in_quotes(
    text: &str,
    chars: &[char],
    start: usize,
) -> Result<(String, usize), ConversionError> {
    let mut content = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i];
        if c == QUOTE {
            if chars.get(i + 1) == Some(&QUOTE) {
                content.push(QUOTE);
                i += 2;
                continue;
            }
            return Ok((content, i + 1));
        }
        content.push(c);
        i += 1;
    }

    Err(ConversionError::malformed(
        text,
        format!("quoting starting at position {} was not closed", start),
    ))
}
