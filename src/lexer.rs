use std::fmt;

use crate::diagnostic::{Diagnostic, Label, Span};
use crate::stream::{Position, Stream};
use crate::token::{Kind, Token, TokenValue};

/// Tokenizer failure: an unrecognized character, an unterminated
/// string, or a malformed number literal.
#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub position: Position,
    pub row: String,
}

impl LexError {
    pub fn new(message: impl Into<String>, position: Position, row: String) -> Self {
        Self { message: message.into(), position, row }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.message.clone())
            .with_code("E0101")
            .with_label(Label::primary(
                Span::new(self.position.offset, self.position.offset + 1),
                "",
            ))
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at ({}:{})", self.message, self.position.line, self.position.col)
    }
}

impl std::error::Error for LexError {}

fn is_operator_char(ch: char) -> bool {
    "=&|<>!+-*/^%".contains(ch)
}

fn is_punct_char(ch: char) -> bool {
    ",:;()[]{}|".contains(ch)
}

fn starts_word(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '\''
}

/// Converts the cursor's character stream into classified, positioned
/// lexemes with a single token of lookahead.
pub struct Lexer {
    stream: Stream,
    current: Option<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self { stream: Stream::new(source), current: None }
    }

    /// The next token without consuming it.
    pub fn peek(&mut self) -> Result<Token, LexError> {
        if self.current.is_none() {
            self.current = Some(self.scan()?);
        }
        Ok(self.current.clone().unwrap_or_else(|| self.eof_token()))
    }

    /// Consumes the buffered lookahead if present, scanning otherwise.
    pub fn next(&mut self) -> Result<Token, LexError> {
        match self.current.take() {
            Some(token) => Ok(token),
            None => self.scan(),
        }
    }

    pub fn eof(&mut self) -> Result<bool, LexError> {
        Ok(self.peek()?.is_eof())
    }

    pub fn position(&self) -> Position {
        self.stream.position()
    }

    /// Canonical false literal positioned at the cursor, handed to the
    /// parser for elided values.
    pub fn synthetic_false(&self) -> Token {
        Token::synthetic_false(self.stream.position())
    }

    fn eof_token(&self) -> Token {
        Token::new(
            Kind::EndOfInput,
            TokenValue::Str("\\0".into()),
            "\\0",
            self.stream.position(),
        )
    }

    fn scan(&mut self) -> Result<Token, LexError> {
        loop {
            self.eat_while(|c| c.is_whitespace());

            if self.stream.eof() {
                return Ok(self.eof_token());
            }

            let ch = match self.stream.peek() {
                Some(c) => c,
                None => return Ok(self.eof_token()),
            };

            if ch == '~' && matches!(self.stream.after(), Some('~') | Some('*')) {
                self.comment();
                continue;
            }

            return match ch {
                '"' => self.string(),
                c if c.is_ascii_digit() => self.number(),
                c if starts_word(c) => Ok(self.word()),
                c if is_punct_char(c) => {
                    // `|` followed by another operator character is the
                    // logical-or operator, not a lambda delimiter
                    if c == '|' && self.stream.after().is_some_and(is_operator_char) {
                        Ok(self.operator())
                    } else {
                        Ok(self.punct())
                    }
                }
                c if is_operator_char(c) => Ok(self.operator()),
                c => Err(self.stream.error(format!("Unable to tokenize `{c}`"))),
            };
        }
    }

    /// Number literal scanner. At most one structural marker per
    /// literal: a decimal point, a base prefix (`b`/`o`/`x` directly
    /// after a leading `0`), or an exponent `e`; a sign is accepted
    /// only immediately after the exponent marker.
    fn number(&mut self) -> Result<Token, LexError> {
        let start = self.stream.position();
        let mut text = String::new();
        let mut infixed = false;
        let mut base: Option<u32> = None;
        let mut sign_ok = false;

        while let Some(c) = self.stream.peek() {
            let take = if let Some(radix) = base {
                c.is_digit(radix)
            } else if c == '.' {
                if infixed {
                    false
                } else {
                    infixed = true;
                    true
                }
            } else if (c == 'b' || c == 'o' || c == 'x') && text == "0" {
                base = Some(match c {
                    'b' => 2,
                    'o' => 8,
                    _ => 16,
                });
                infixed = true;
                true
            } else if c == 'e' {
                if infixed {
                    false
                } else {
                    infixed = true;
                    true
                }
            } else if c == '+' || c == '-' {
                sign_ok
            } else {
                c.is_ascii_digit()
            };

            if !take {
                break;
            }
            sign_ok = c == 'e' && base.is_none();
            text.push(c);
            self.stream.next();
        }

        let value = match base {
            Some(radix) => {
                let digits = &text[2..];
                if digits.is_empty() {
                    return Err(self
                        .stream
                        .error(format!("Unable to parse integer '{text}' with base '{radix}'")));
                }
                match u64::from_str_radix(digits, radix) {
                    Ok(n) => n as f64,
                    Err(_) => {
                        return Err(self
                            .stream
                            .error(format!("Unable to parse integer '{text}' with base '{radix}'")))
                    }
                }
            }
            None => match text.parse::<f64>() {
                Ok(n) => n,
                Err(_) => return Err(self.stream.error(format!("Unable to parse number '{text}'"))),
            },
        };

        Ok(Token::new(Kind::Number, TokenValue::Number(value), text, start))
    }

    /// String literal body: a backslash takes the following character
    /// literally, including the terminating quote.
    fn string(&mut self) -> Result<Token, LexError> {
        let start = self.stream.position();
        let mut raw = String::new();
        if let Some(quote) = self.stream.next() {
            raw.push(quote);
        }
        let mut text = String::new();
        let mut escaped = false;
        loop {
            let c = match self.stream.next() {
                Some(c) => c,
                None => return Err(self.stream.error("Unterminated string")),
            };
            raw.push(c);
            if escaped {
                text.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                break;
            } else {
                text.push(c);
            }
        }
        Ok(Token::new(Kind::String, TokenValue::Str(text.into()), raw, start))
    }

    fn word(&mut self) -> Token {
        let start = self.stream.position();
        let text = self.eat_while(is_word_char);
        Token::word(&text, start)
    }

    fn comment(&mut self) {
        if self.stream.after() == Some('~') {
            self.eat_while(|c| c != '\n');
        } else {
            let mut penult = false;
            self.eat_while(|c| {
                if penult {
                    if c == '~' {
                        return false;
                    }
                    penult = false;
                } else if c == '*' {
                    penult = true;
                }
                true
            });
        }
        self.stream.next();
    }

    fn punct(&mut self) -> Token {
        let start = self.stream.position();
        let text: String = self.stream.next().into_iter().collect();
        Token::new(Kind::Punctuation, TokenValue::Str(text.as_str().into()), text, start)
    }

    fn operator(&mut self) -> Token {
        let start = self.stream.position();
        let text = self.eat_while(is_operator_char);
        Token::new(Kind::Operator, TokenValue::Str(text.as_str().into()), text, start)
    }

    fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.stream.peek() {
            if !pred(c) {
                break;
            }
            text.push(c);
            self.stream.next();
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next().expect("lexer failed");
            if token.is_eof() {
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    fn lex_one(source: &str) -> Token {
        let mut lexer = Lexer::new(source);
        lexer.next().expect("lexer failed")
    }

    fn number_value(source: &str) -> f64 {
        match lex_one(source).value {
            TokenValue::Number(n) => n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn decimal_and_exponent_forms() {
        assert_eq!(number_value("3.14"), 3.14);
        assert_eq!(number_value("12e3"), 12e3);
        assert_eq!(number_value("10e+2"), 10e2);
        assert_eq!(number_value("10e-2"), 10e-2);
        assert_eq!(number_value("42"), 42.0);
    }

    #[test]
    fn base_prefixed_integers() {
        assert_eq!(number_value("0b11"), 3.0);
        assert_eq!(number_value("0x11"), 17.0);
        assert_eq!(number_value("0xAA"), 170.0);
        assert_eq!(number_value("0o17"), 15.0);
    }

    #[test]
    fn base_prefix_requires_leading_zero() {
        // `1x2` is the number 1 followed by the word `x2`
        let tokens = lex_all("1x2");
        assert_eq!(tokens[0].kind, Kind::Number);
        assert_eq!(tokens[1].kind, Kind::Reference);
    }

    #[test]
    fn empty_base_digits_is_an_error() {
        let mut lexer = Lexer::new("0x");
        assert!(lexer.next().is_err());
    }

    #[test]
    fn one_structural_marker_per_literal() {
        // the second dot ends the literal
        assert_eq!(lex_one("1.2.3").value, TokenValue::Number(1.2));
        // an exponent after a decimal point ends the literal too
        assert_eq!(lex_one("1.5e2").value, TokenValue::Number(1.5));
    }

    #[test]
    fn sign_only_after_exponent() {
        let tokens = lex_all("1+2");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].value, TokenValue::Number(1.0));
        assert_eq!(tokens[1].kind, Kind::Operator);
        assert_eq!(tokens[2].value, TokenValue::Number(2.0));
    }

    #[test]
    fn single_word_string() {
        let token = lex_one(r#""cars""#);
        assert_eq!(token.kind, Kind::String);
        assert_eq!(token.value, TokenValue::Str("cars".into()));
        assert_eq!(&*token.literal, r#""cars""#);
    }

    #[test]
    fn escaped_quote_stays_in_string() {
        let token = lex_one(r#""say \"hi\"""#);
        assert_eq!(token.value, TokenValue::Str(r#"say "hi""#.into()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = Lexer::new(r#""no end"#);
        assert!(lexer.next().is_err());
    }

    #[test]
    fn trailing_escape_is_an_error() {
        let mut lexer = Lexer::new(r#""dangling\"#);
        assert!(lexer.next().is_err());
    }

    #[test]
    fn wildcard_is_a_symbol() {
        assert_eq!(lex_one("_").kind, Kind::Symbol);
    }

    #[test]
    fn keywords_and_references() {
        assert_eq!(lex_one("let").kind, Kind::Keyword);
        assert_eq!(lex_one("true").kind, Kind::Boolean);
        assert_eq!(lex_one("for'each").kind, Kind::Reference);
        assert_eq!(lex_one("Num").kind, Kind::MetaType);
    }

    #[test]
    fn lambda_delimiters_are_punctuation() {
        let kinds: Vec<Kind> = lex_all("|a, b|").iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::Punctuation,
                Kind::Reference,
                Kind::Punctuation,
                Kind::Reference,
                Kind::Punctuation,
            ]
        );
    }

    #[test]
    fn double_vertical_bar_is_an_operator() {
        let token = lex_one("||");
        assert_eq!(token.kind, Kind::Operator);
        assert_eq!(&*token.literal, "||");
    }

    #[test]
    fn greedy_operators() {
        assert_eq!(&*lex_one("<-").literal, "<-");
        assert_eq!(&*lex_one("<=").literal, "<=");
        assert_eq!(&*lex_one("<>").literal, "<>");
        assert_eq!(&*lex_one("!=").literal, "!=");
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = lex_all("1 ~~ ignored to end of line\n+ 2");
        assert_eq!(tokens.len(), 3);
        let tokens = lex_all("1 ~* a\nblock *~ + 2");
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn unrecognized_character_is_an_error() {
        let mut lexer = Lexer::new("1 @ 2");
        assert!(lexer.next().is_ok());
        let err = lexer.next().expect_err("expected tokenizer failure");
        assert!(err.message.contains('@'));
    }

    #[test]
    fn peek_buffers_one_token() {
        let mut lexer = Lexer::new("a b");
        let peeked = lexer.peek().expect("peek");
        let consumed = lexer.next().expect("next");
        assert_eq!(peeked, consumed);
        assert_eq!(&*lexer.next().expect("next").literal, "b");
    }
}
