//! Usage: Tokenizer for JSON with comments (line/block comments, BOM).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Colon,
    Comma,
    String,
    Number,
    True,
    False,
    Null,
    Eof,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub length: usize,
}

impl Token {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

pub(super) struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        let pos = if text.starts_with('\u{feff}') {
            '\u{feff}'.len_utf8()
        } else {
            0
        };
        Self {
            text,
            bytes: text.as_bytes(),
            pos,
        }
    }

    pub fn slice(&self, token: &Token) -> &'a str {
        &self.text[token.offset..token.end()]
    }

    pub fn next_token(&mut self) -> Result<Token, String> {
        self.skip_trivia()?;

        let start = self.pos;
        let Some(&byte) = self.bytes.get(start) else {
            return Ok(Token {
                kind: TokenKind::Eof,
                offset: start,
                length: 0,
            });
        };

        let kind = match byte {
            b'{' => TokenKind::OpenBrace,
            b'}' => TokenKind::CloseBrace,
            b'[' => TokenKind::OpenBracket,
            b']' => TokenKind::CloseBracket,
            b':' => TokenKind::Colon,
            b',' => TokenKind::Comma,
            b'"' => return self.scan_string(),
            b'-' | b'0'..=b'9' => return Ok(self.scan_number()),
            b'a'..=b'z' => return self.scan_literal(),
            _ => {
                let ch = self.text[start..].chars().next().unwrap_or('?');
                return Err(format!("unexpected character '{ch}' at offset {start}"));
            }
        };

        self.pos += 1;
        Ok(Token {
            kind,
            offset: start,
            length: 1,
        })
    }

    fn skip_trivia(&mut self) -> Result<(), String> {
        loop {
            while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.bytes.get(self.pos) {
                self.pos += 1;
            }

            let rest = &self.bytes[self.pos..];
            if rest.starts_with(b"//") {
                self.pos = match rest.iter().position(|&b| b == b'\n') {
                    Some(idx) => self.pos + idx + 1,
                    None => self.bytes.len(),
                };
                continue;
            }
            if rest.starts_with(b"/*") {
                let Some(idx) = self.text[self.pos + 2..].find("*/") else {
                    return Err(format!("unterminated block comment at offset {}", self.pos));
                };
                self.pos += 2 + idx + 2;
                continue;
            }
            return Ok(());
        }
    }

    fn scan_string(&mut self) -> Result<Token, String> {
        let start = self.pos;
        self.pos += 1;
        while let Some(&byte) = self.bytes.get(self.pos) {
            match byte {
                b'"' => {
                    self.pos += 1;
                    return Ok(Token {
                        kind: TokenKind::String,
                        offset: start,
                        length: self.pos - start,
                    });
                }
                b'\\' => self.pos += 2,
                b'\n' => break,
                _ => self.pos += 1,
            }
        }
        Err(format!("unterminated string at offset {start}"))
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;
        while let Some(b'-' | b'+' | b'.' | b'e' | b'E' | b'0'..=b'9') = self.bytes.get(self.pos) {
            self.pos += 1;
        }
        Token {
            kind: TokenKind::Number,
            offset: start,
            length: self.pos - start,
        }
    }

    fn scan_literal(&mut self) -> Result<Token, String> {
        let start = self.pos;
        while let Some(b'a'..=b'z') = self.bytes.get(self.pos) {
            self.pos += 1;
        }
        let kind = match &self.text[start..self.pos] {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            other => return Err(format!("unexpected literal '{other}' at offset {start}")),
        };
        Ok(Token {
            kind,
            offset: start,
            length: self.pos - start,
        })
    }
}
