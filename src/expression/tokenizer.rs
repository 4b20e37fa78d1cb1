//! Rule text tokenizer

use smallvec::SmallVec;

/// Token buffer; typical rules fit without spilling to the heap
pub type Tokens = SmallVec<[String; 16]>;

/// Split rule text into attribute, operator, literal, connective and paren tokens.
///
/// Quoted spans keep their delimiters and are never split, even on spaces or
/// parentheses. Only the quote character that opened a span closes it. Runs of
/// whitespace collapse to a single space everywhere, quoted spans included.
pub fn tokenize(text: &str) -> Tokens {
    let mut tokens = Tokens::new();
    let mut current = String::new();
    let mut open_quote: Option<char> = None;

    for c in text.trim().chars() {
        if let Some(quote) = open_quote {
            if c.is_whitespace() {
                if !current.ends_with(' ') {
                    current.push(' ');
                }
                continue;
            }
            current.push(c);
            if c == quote {
                open_quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' => {
                open_quote = Some(c);
                current.push(c);
            }
            '(' | ')' => {
                flush(&mut current, &mut tokens);
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() => flush(&mut current, &mut tokens),
            _ => current.push(c),
        }
    }

    flush(&mut current, &mut tokens);
    tokens
}

#[inline]
fn flush(current: &mut String, tokens: &mut Tokens) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}
