//! Whitespace and comment handling over the textual source.
//!
//! A token is a maximal run of non whitespace bytes; a `#` starts a
//! comment that runs through the end of its line. Every token carries
//! the 1-based source line it started on for diagnostics.

/// A single source token.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Token<'a> {
    pub text: &'a str,
    pub line: usize,
}

/// The token stream over one source text.
pub struct Lexer<'a> {
    source: &'a [u8],
    text: &'a str,
    position: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            source: text.as_bytes(),
            text,
            position: 0,
            line: 1,
        }
    }

    /// Will skip whitespace and comments up to the next token start.
    fn skip_filler(&mut self) {
        while let Some(&byte) = self.source.get(self.position) {
            match byte {
                b'\n' => {
                    self.line += 1;
                    self.position += 1;
                }
                byte if byte.is_ascii_whitespace() => self.position += 1,
                b'#' => {
                    while let Some(&byte) = self.source.get(self.position) {
                        if byte == b'\n' {
                            break;
                        }
                        self.position += 1;
                    }
                }
                _ => break,
            }
        }
    }

    /// Will return the next token, or `None` at the end of the file.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        self.skip_filler();

        let start = self.position;
        let line = self.line;
        while let Some(&byte) = self.source.get(self.position) {
            if byte.is_ascii_whitespace() {
                break;
            }
            self.position += 1;
        }

        if start == self.position {
            None
        } else {
            Some(Token {
                text: &self.text[start..self.position],
                line,
            })
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_and_lines() {
        let source = "LD IX0.0\n  AND IX0.1\n";
        let tokens: Vec<_> = Lexer::new(source).collect();
        assert_eq!(
            tokens,
            vec![
                Token { text: "LD", line: 1 },
                Token { text: "IX0.0", line: 1 },
                Token { text: "AND", line: 2 },
                Token { text: "IX0.1", line: 2 },
            ]
        );
    }

    #[test]
    fn test_comments_run_to_end_of_line() {
        let source = "# header comment\nLD IX0.0 # trailing\nST QX0.0";
        let tokens: Vec<_> = Lexer::new(source).collect();
        let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["LD", "IX0.0", "ST", "QX0.0"]);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(Lexer::new("").next_token(), None);
        assert_eq!(Lexer::new("  \n# only a comment\n").next_token(), None);
    }
}
