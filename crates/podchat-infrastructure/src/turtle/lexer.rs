//! Tokenizer shared by the Turtle and SPARQL Update parsers.

use podchat_core::{PodError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// `<…>` with escapes resolved, not yet resolved against the base.
    Iri(String),
    /// `prefix:local` (the prefix may be empty, so may the local part).
    Prefixed { prefix: String, local: String },
    /// `_:label`
    Blank(String),
    /// `?name` or `$name`
    Var(String),
    /// A quoted string with escapes resolved.
    Str(String),
    /// `@word`: a language tag or `@prefix` / `@base`.
    At(String),
    Integer(String),
    Decimal(String),
    Double(String),
    /// Bare word: `a`, `true`, `PREFIX`, `INSERT`, …
    Word(String),
    /// `^^`
    Carets,
    /// `.` `;` `,` `[` `]` `(` `)` `{` `}` `=`
    Punct(char),
    Eof,
}

#[derive(Debug, Clone)]
pub(crate) struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

pub(crate) struct Lexer<'a> {
    format: &'static str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str, format: &'static str) -> Self {
        Self {
            format,
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenizes the whole input; the last token is always `Eof`.
    pub(crate) fn tokenize(mut self) -> Result<Vec<Spanned>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let (line, column) = (self.line, self.column);
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(Spanned {
                token,
                line,
                column,
            });
            if done {
                return Ok(tokens);
            }
        }
    }

    fn error(&self, message: impl AsRef<str>) -> PodError {
        PodError::codec(
            self.format,
            format!(
                "line {}, column {}: {}",
                self.line,
                self.column,
                message.as_ref()
            ),
        )
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn expect_char(&mut self, expected: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };
        match c {
            '<' => self.iri(),
            '"' | '\'' => self.string(c),
            '@' => {
                self.bump();
                let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-');
                if word.is_empty() {
                    return Err(self.error("empty '@' keyword"));
                }
                Ok(Token::At(word))
            }
            '^' => {
                self.bump();
                self.expect_char('^')?;
                Ok(Token::Carets)
            }
            '?' | '$' => {
                self.bump();
                let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
                if name.is_empty() {
                    return Err(self.error("empty variable name"));
                }
                Ok(Token::Var(name))
            }
            '_' if self.is_blank_label_start() => {
                self.bump();
                self.bump();
                let label = self.name_run();
                if label.is_empty() {
                    return Err(self.error("empty blank node label"));
                }
                Ok(Token::Blank(label))
            }
            '.' | ';' | ',' | '[' | ']' | '(' | ')' | '{' | '}' | '=' => {
                // ".5" is a decimal, not a terminator
                if c == '.' && self.next_is_digit_after_current() {
                    return self.number();
                }
                self.bump();
                Ok(Token::Punct(c))
            }
            '+' | '-' | '0'..='9' => self.number(),
            c if is_name_start(c) || c == ':' => {
                let name = self.name_run();
                match name.split_once(':') {
                    Some((prefix, local)) => Ok(Token::Prefixed {
                        prefix: prefix.to_string(),
                        local: unescape_local(local),
                    }),
                    None => Ok(Token::Word(name)),
                }
            }
            other => Err(self.error(format!("unexpected character '{other}'"))),
        }
    }

    fn is_blank_label_start(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next() == Some(':')
    }

    fn next_is_digit_after_current(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().is_some_and(|c| c.is_ascii_digit())
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    /// A prefixed-name / label / keyword run. A trailing `.` is left for the
    /// statement terminator.
    fn name_run(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                out.push(c);
                self.bump();
                if let Some(escaped) = self.bump() {
                    out.push(escaped);
                }
                continue;
            }
            if c == '.' {
                let mut ahead = self.chars.clone();
                ahead.next();
                if !ahead.next().is_some_and(|n| is_name_char(n) || n == ':') {
                    break;
                }
            } else if !(is_name_char(c) || c == ':') {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    fn iri(&mut self) -> Result<Token> {
        self.expect_char('<')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('>') => return Ok(Token::Iri(out)),
                Some('\\') => out.push(self.unicode_escape()?),
                Some(c) if c.is_whitespace() => {
                    return Err(self.error("whitespace inside IRI"));
                }
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated IRI")),
            }
        }
    }

    fn unicode_escape(&mut self) -> Result<char> {
        let width = match self.bump() {
            Some('u') => 4,
            Some('U') => 8,
            _ => return Err(self.error("invalid escape sequence")),
        };
        let mut hex = String::with_capacity(width);
        for _ in 0..width {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                _ => return Err(self.error("invalid unicode escape")),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("invalid unicode code point"))
    }

    fn string(&mut self, quote: char) -> Result<Token> {
        self.bump();
        let long = {
            let mut ahead = self.chars.clone();
            ahead.next() == Some(quote) && ahead.next() == Some(quote)
        };
        if long {
            self.bump();
            self.bump();
        } else if self.peek() == Some(quote) {
            // empty short string
            self.bump();
            return Ok(Token::Str(String::new()));
        }

        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error("unterminated string literal"));
            };
            match c {
                '\\' => out.push(self.string_escape()?),
                c if c == quote && !long => return Ok(Token::Str(out)),
                c if c == quote => {
                    let mut ahead = self.chars.clone();
                    if ahead.next() == Some(quote) && ahead.next() == Some(quote) {
                        // a run of more than three quotes ends with the last three
                        let mut extra = self.chars.clone();
                        extra.next();
                        extra.next();
                        if extra.next() == Some(quote) {
                            out.push(c);
                            continue;
                        }
                        self.bump();
                        self.bump();
                        return Ok(Token::Str(out));
                    }
                    out.push(c);
                }
                '\n' | '\r' if !long => {
                    return Err(self.error("line break in short string literal"));
                }
                c => out.push(c),
            }
        }
    }

    fn string_escape(&mut self) -> Result<char> {
        match self.peek() {
            Some('u') | Some('U') => self.unicode_escape(),
            Some(c) => {
                self.bump();
                match c {
                    't' => Ok('\t'),
                    'b' => Ok('\u{8}'),
                    'n' => Ok('\n'),
                    'r' => Ok('\r'),
                    'f' => Ok('\u{c}'),
                    '"' => Ok('"'),
                    '\'' => Ok('\''),
                    '\\' => Ok('\\'),
                    other => Err(self.error(format!("invalid escape '\\{other}'"))),
                }
            }
            None => Err(self.error("unterminated escape")),
        }
    }

    fn number(&mut self) -> Result<Token> {
        let mut out = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            out.push(sign);
            self.bump();
        }
        out.push_str(&self.take_while(|c| c.is_ascii_digit()));

        let mut is_decimal = false;
        if self.peek() == Some('.') && self.next_is_digit_after_current() {
            is_decimal = true;
            out.push('.');
            self.bump();
            out.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }

        if let Some(e @ ('e' | 'E')) = self.peek() {
            out.push(e);
            self.bump();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                out.push(sign);
                self.bump();
            }
            let exponent = self.take_while(|c| c.is_ascii_digit());
            if exponent.is_empty() {
                return Err(self.error("missing exponent digits"));
            }
            out.push_str(&exponent);
            return Ok(Token::Double(out));
        }

        if !out.chars().any(|c| c.is_ascii_digit()) {
            return Err(self.error(format!("malformed number '{out}'")));
        }
        Ok(if is_decimal {
            Token::Decimal(out)
        } else {
            Token::Integer(out)
        })
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || (!c.is_ascii() && !c.is_whitespace())
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-' || c == '.' || c == '%'
}

fn unescape_local(local: &str) -> String {
    let mut out = String::with_capacity(local.len());
    let mut chars = local.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input, "Turtle")
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_statement_terminator_after_prefixed_name() {
        assert_eq!(
            tokens("ex:a a rdf:List."),
            vec![
                Token::Prefixed {
                    prefix: "ex".into(),
                    local: "a".into()
                },
                Token::Word("a".into()),
                Token::Prefixed {
                    prefix: "rdf".into(),
                    local: "List".into()
                },
                Token::Punct('.'),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes_and_long_strings() {
        assert_eq!(
            tokens(r##""a\"bé" """line1
"quoted" line2""""  "##),
            vec![
                Token::Str("a\"bé".into()),
                Token::Str("line1\n\"quoted\" line2\"".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("12 -3.5 4e10 .5"),
            vec![
                Token::Integer("12".into()),
                Token::Decimal("-3.5".into()),
                Token::Double("4e10".into()),
                Token::Decimal(".5".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_comment_and_error_position() {
        let err = Lexer::new("# comment\n  <http://a b>", "Turtle")
            .tokenize()
            .unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }
}
