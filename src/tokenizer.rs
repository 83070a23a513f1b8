//! Lexical analyzer (tokenizer) for the Jack language.
//!
//! The whole file is loaded upfront (Jack files are small, see spec §5) and
//! tokenized eagerly into a `TokenStream`, which then hands the compilation
//! engine one-token lookahead via typed accessors.

use crate::error::CompileError;
use crate::token::{Keyword, Span, SpannedToken, Token, is_symbol};

/// Jack language tokenizer.
pub struct JackTokenizer<'a> {
    chars: Vec<char>,
    pos: usize,
    byte_offset: usize,
    line: usize,
    column: usize,
    _input: &'a str,
}

impl<'a> JackTokenizer<'a> {
    /// Create a new tokenizer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            byte_offset: 0,
            line: 1,
            column: 1,
            _input: input,
        }
    }

    /// Tokenize the whole input, stopping at the first lexical error.
    ///
    /// Compilation has no error-recovery path (spec §4.4/§7), so unlike a
    /// batch linter we don't accumulate multiple lexical errors here.
    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, CompileError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;
            if self.is_at_end() {
                break;
            }
            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        self.byte_offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn here(&self) -> Span {
        Span::new(self.byte_offset, self.byte_offset, self.line, self.column)
    }

    /// Skip block comments, line comments and whitespace, repeating until
    /// none of the three matches at the cursor (spec §4.1 "Skipping").
    fn skip_whitespace_and_comments(&mut self) -> Result<(), CompileError> {
        loop {
            let mut moved = false;

            while let Some(c) = self.peek() {
                if c.is_whitespace() {
                    self.advance();
                    moved = true;
                } else {
                    break;
                }
            }

            if self.peek() == Some('/') && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                moved = true;
            } else if self.peek() == Some('/') && self.peek_next() == Some('*') {
                let start = self.here();
                self.advance();
                self.advance();
                let mut closed = false;
                while !self.is_at_end() {
                    if self.peek() == Some('*') && self.peek_next() == Some('/') {
                        self.advance();
                        self.advance();
                        closed = true;
                        break;
                    }
                    self.advance();
                }
                if !closed {
                    return Err(CompileError::lexical(start, "unterminated block comment"));
                }
                moved = true;
            }

            if !moved {
                break;
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<SpannedToken, CompileError> {
        let start = self.here();
        let c = self.peek().expect("caller checked is_at_end");

        if is_symbol(c) {
            self.advance();
            return Ok(SpannedToken::new(Token::Symbol(c), start));
        }

        if c.is_ascii_digit() {
            return self.read_integer(start);
        }

        if c == '"' {
            return self.read_string(start);
        }

        if c.is_alphabetic() || c == '_' {
            return Ok(self.read_identifier(start));
        }

        self.advance();
        Err(CompileError::lexical(
            start,
            format!("unexpected character '{}'", c),
        ))
    }

    /// Longest run of decimal digits. Jack integers are `0..=32767`; a
    /// numerically larger literal is a lexical error rather than silently
    /// wrapping (spec §9 "Integer range").
    fn read_integer(&mut self, start: Span) -> Result<SpannedToken, CompileError> {
        let mut value: u32 = 0;
        let mut overflowed = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
                let digit = c.to_digit(10).unwrap();
                value = value.saturating_mul(10).saturating_add(digit);
                overflowed |= value > 32767;
            } else {
                break;
            }
        }

        if overflowed {
            return Err(CompileError::lexical(
                start,
                format!("integer constant {} exceeds maximum value 32767", value),
            ));
        }

        Ok(SpannedToken::new(Token::IntegerConstant(value as u16), start))
    }

    /// No escape-sequence handling (spec §1 Non-goals); a newline before the
    /// closing quote is an unterminated string.
    fn read_string(&mut self, start: Span) -> Result<SpannedToken, CompileError> {
        self.advance(); // opening quote

        let mut value = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    return Ok(SpannedToken::new(Token::StringConstant(value), start));
                }
                Some('\n') | None => {
                    return Err(CompileError::lexical(start, "unterminated string constant"));
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Longest identifier run; only promoted to `Keyword` if the run
    /// matches a reserved word exactly (spec §4.1 "Contract note" — `ifoo`
    /// must never be recognized as `if` followed by `oo`, which the
    /// longest-run-first discipline here guarantees for free).
    fn read_identifier(&mut self, start: Span) -> SpannedToken {
        let mut value = String::new();

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let token = match Keyword::parse_keyword(&value) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Identifier(value),
        };

        SpannedToken::new(token, start)
    }
}

/// A tokenized buffer with a cursor, offering one-token lookahead and the
/// typed accessors the compilation engine drives its grammar dispatch from.
pub struct TokenStream {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn has_more(&self) -> bool {
        self.pos < self.tokens.len()
    }

    /// The current lookahead token. Panics if called past end of stream —
    /// callers must check `has_more()` (or rely on `expect`/the typed
    /// accessors, which surface a `Syntax`/`AccessorMismatch` error instead
    /// of running off the end during normal grammar dispatch).
    pub fn current(&self) -> &SpannedToken {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn current_span(&self) -> Span {
        self.current().span.clone()
    }

    /// Look at a token further ahead without consuming anything.
    /// `offset` of `1` is the token right after `current()`.
    pub fn peek_ahead(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> SpannedToken {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// `true` if the current token is exactly this symbol.
    pub fn at_symbol(&self, c: char) -> bool {
        self.has_more() && matches!(&self.current().token, Token::Symbol(s) if *s == c)
    }

    /// `true` if the current token is exactly this keyword.
    pub fn at_keyword(&self, k: Keyword) -> bool {
        self.has_more() && matches!(&self.current().token, Token::Keyword(kw) if *kw == k)
    }

    /// Consume the current token, which must be the given symbol.
    pub fn expect_symbol(&mut self, c: char, context: &str) -> Result<(), CompileError> {
        if self.at_symbol(c) {
            self.advance();
            Ok(())
        } else {
            let span = self.current_span();
            let found = self.current().token.clone();
            Err(CompileError::syntax(
                span,
                format!("'{}'", c),
                &found,
                context,
            ))
        }
    }

    /// Consume the current token, which must be the given keyword.
    pub fn expect_keyword(&mut self, k: Keyword, context: &str) -> Result<(), CompileError> {
        if self.at_keyword(k) {
            self.advance();
            Ok(())
        } else {
            let span = self.current_span();
            let found = self.current().token.clone();
            Err(CompileError::syntax(span, k.as_str(), &found, context))
        }
    }

    /// Consume the current token, which must be an identifier, returning
    /// its name.
    pub fn expect_identifier(&mut self, context: &str) -> Result<String, CompileError> {
        match &self.current().token {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => {
                let span = self.current_span();
                Err(CompileError::syntax(span, "identifier", &other.clone(), context))
            }
        }
    }

    /// Typed accessor: the current token must be `IntegerConstant`.
    pub fn int_val(&self) -> Result<u16, CompileError> {
        match &self.current().token {
            Token::IntegerConstant(n) => Ok(*n),
            other => Err(CompileError::accessor_mismatch(
                "IntegerConstant",
                other,
                self.current_span(),
            )),
        }
    }

    /// Typed accessor: the current token must be `StringConstant`.
    pub fn string_val(&self) -> Result<&str, CompileError> {
        match &self.current().token {
            Token::StringConstant(s) => Ok(s.as_str()),
            other => Err(CompileError::accessor_mismatch(
                "StringConstant",
                other,
                self.current_span(),
            )),
        }
    }

    /// Typed accessor: the current token must be `Keyword`.
    pub fn keyword_val(&self) -> Result<Keyword, CompileError> {
        match &self.current().token {
            Token::Keyword(k) => Ok(*k),
            other => Err(CompileError::accessor_mismatch(
                "Keyword",
                other,
                self.current_span(),
            )),
        }
    }

    /// Typed accessor: the current token must be `Symbol`.
    pub fn symbol_val(&self) -> Result<char, CompileError> {
        match &self.current().token {
            Token::Symbol(c) => Ok(*c),
            other => Err(CompileError::accessor_mismatch(
                "Symbol",
                other,
                self.current_span(),
            )),
        }
    }

    /// Typed accessor: the current token must be `Identifier`.
    pub fn identifier_val(&self) -> Result<&str, CompileError> {
        match &self.current().token {
            Token::Identifier(s) => Ok(s.as_str()),
            other => Err(CompileError::accessor_mismatch(
                "Identifier",
                other,
                self.current_span(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        JackTokenizer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(tokenize("class"), vec![Token::Keyword(Keyword::Class)]);
        assert_eq!(
            tokenize("if else while"),
            vec![
                Token::Keyword(Keyword::If),
                Token::Keyword(Keyword::Else),
                Token::Keyword(Keyword::While),
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        // spec §4.1 contract note: `ifoo` must not tokenize as `if` + `oo`.
        assert_eq!(tokenize("ifoo"), vec![Token::Identifier("ifoo".into())]);
        assert_eq!(
            tokenize("classy"),
            vec![Token::Identifier("classy".into())]
        );
    }

    #[test]
    fn test_symbols() {
        assert_eq!(
            tokenize("{}()"),
            vec![
                Token::Symbol('{'),
                Token::Symbol('}'),
                Token::Symbol('('),
                Token::Symbol(')'),
            ]
        );
    }

    #[test]
    fn test_integers() {
        assert_eq!(tokenize("0"), vec![Token::IntegerConstant(0)]);
        assert_eq!(tokenize("32767"), vec![Token::IntegerConstant(32767)]);
    }

    #[test]
    fn test_integer_overflow_is_lexical_error() {
        let err = JackTokenizer::new("32768").tokenize().unwrap_err();
        assert!(matches!(err, CompileError::Lexical { .. }));
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            tokenize("\"hello world\""),
            vec![Token::StringConstant("hello world".to_string())]
        );
    }

    #[test]
    fn test_unterminated_string_is_lexical_error() {
        let err = JackTokenizer::new("\"abc\ndef\"").tokenize().unwrap_err();
        assert!(matches!(err, CompileError::Lexical { .. }));
    }

    #[test]
    fn test_unterminated_block_comment_is_lexical_error() {
        let err = JackTokenizer::new("/* never closed").tokenize().unwrap_err();
        assert!(matches!(err, CompileError::Lexical { .. }));
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(tokenize("foo"), vec![Token::Identifier("foo".to_string())]);
        assert_eq!(tokenize("_bar"), vec![Token::Identifier("_bar".to_string())]);
        assert_eq!(tokenize("x123"), vec![Token::Identifier("x123".to_string())]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            tokenize("// comment\nclass"),
            vec![Token::Keyword(Keyword::Class)]
        );
        assert_eq!(
            tokenize("/* comment */ class"),
            vec![Token::Keyword(Keyword::Class)]
        );
        assert_eq!(
            tokenize("/** doc comment */ class"),
            vec![Token::Keyword(Keyword::Class)]
        );
    }

    #[test]
    fn test_block_comments_do_not_nest() {
        // spec §4.1: block comments do not nest, so this closes at the
        // first `*/`, leaving `class` followed by a dangling `*/` that
        // tokenizes as two trailing symbols.
        let tokens = tokenize("/* outer /* inner */ class */");
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Class),
                Token::Symbol('*'),
                Token::Symbol('/'),
            ]
        );
    }

    #[test]
    fn test_complex_program() {
        let input = "class Main { function void main() { return; } }";
        let tokens = tokenize(input);
        assert_eq!(tokens.len(), 13);
        assert_eq!(tokens[0], Token::Keyword(Keyword::Class));
        assert_eq!(tokens[1], Token::Identifier("Main".to_string()));
    }

    #[test]
    fn test_token_stream_typed_accessors() {
        let tokens = JackTokenizer::new("class 7").tokenize().unwrap();
        let mut stream = TokenStream::new(tokens);
        assert_eq!(stream.keyword_val().unwrap(), Keyword::Class);
        stream.advance();
        assert_eq!(stream.int_val().unwrap(), 7);
        assert!(stream.string_val().is_err());
    }
}
