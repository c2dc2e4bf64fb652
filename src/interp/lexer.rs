//! Hand-written lexer for the snippet language.
//!
//! Template literals are lexed structurally: a template token carries its
//! literal chunks and, for every `${ ... }` interpolation, the token stream
//! of the embedded expression. The parser re-parses those sub-streams, which
//! keeps nesting (templates inside interpolations) free.

use crate::interp::RuntimeError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Keyword(Keyword),
    Number(f64),
    Str(String),
    Template(Vec<TplPart>),
    Punct(Punct),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TplPart {
    Lit(String),
    Expr(Vec<Token>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Let,
    Const,
    Function,
    Return,
    If,
    Else,
    While,
    For,
    Of,
    True,
    False,
    Null,
    Undefined,
    Try,
    Catch,
    Finally,
    Throw,
    New,
    Typeof,
    Async,
    Await,
    Break,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    Dot,
    Ellipsis,
    Arrow,
    OptChain,
    Question,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Eq,
    StrictEq,
    NotEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Not,
}

impl Keyword {
    /// Source text of the keyword, used where keywords are valid property
    /// names (`promise.catch`, `entry.of`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Let => "let",
            Keyword::Const => "const",
            Keyword::Function => "function",
            Keyword::Return => "return",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::For => "for",
            Keyword::Of => "of",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::Undefined => "undefined",
            Keyword::Try => "try",
            Keyword::Catch => "catch",
            Keyword::Finally => "finally",
            Keyword::Throw => "throw",
            Keyword::New => "new",
            Keyword::Typeof => "typeof",
            Keyword::Async => "async",
            Keyword::Await => "await",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
        }
    }
}

fn keyword(ident: &str) -> Option<Keyword> {
    Some(match ident {
        "let" => Keyword::Let,
        "const" => Keyword::Const,
        "function" => Keyword::Function,
        "return" => Keyword::Return,
        "if" => Keyword::If,
        "else" => Keyword::Else,
        "while" => Keyword::While,
        "for" => Keyword::For,
        "of" => Keyword::Of,
        "true" => Keyword::True,
        "false" => Keyword::False,
        "null" => Keyword::Null,
        "undefined" => Keyword::Undefined,
        "try" => Keyword::Try,
        "catch" => Keyword::Catch,
        "finally" => Keyword::Finally,
        "throw" => Keyword::Throw,
        "new" => Keyword::New,
        "typeof" => Keyword::Typeof,
        "async" => Keyword::Async,
        "await" => Keyword::Await,
        "break" => Keyword::Break,
        "continue" => Keyword::Continue,
        _ => return None,
    })
}

pub fn lex(source: &str) -> Result<Vec<Token>, RuntimeError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
    };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) -> Result<(), RuntimeError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.pos += 1;
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.pos += 2;
                    loop {
                        match self.peek() {
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.pos += 2;
                                break;
                            }
                            Some(_) => self.pos += 1,
                            None => {
                                return Err(RuntimeError::syntax("unterminated block comment"))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, RuntimeError> {
        self.skip_trivia()?;
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };

        if c.is_ascii_digit() {
            return Ok(Some(self.read_number()?));
        }
        if c.is_alphabetic() || c == '_' || c == '$' {
            return Ok(Some(self.read_ident()));
        }
        if c == '\'' || c == '"' {
            return Ok(Some(self.read_string(c)?));
        }
        if c == '`' {
            return Ok(Some(self.read_template()?));
        }

        self.pos += 1;
        let punct = match c {
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            '{' => Punct::LBrace,
            '}' => Punct::RBrace,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            ',' => Punct::Comma,
            ';' => Punct::Semi,
            ':' => Punct::Colon,
            '.' => {
                if self.peek() == Some('.') && self.peek_at(1) == Some('.') {
                    self.pos += 2;
                    Punct::Ellipsis
                } else {
                    Punct::Dot
                }
            }
            '?' => {
                if self.eat('.') {
                    Punct::OptChain
                } else {
                    Punct::Question
                }
            }
            '+' => {
                if self.eat('=') {
                    Punct::PlusAssign
                } else {
                    Punct::Plus
                }
            }
            '-' => {
                if self.eat('=') {
                    Punct::MinusAssign
                } else {
                    Punct::Minus
                }
            }
            '*' => {
                if self.eat('=') {
                    Punct::StarAssign
                } else {
                    Punct::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    Punct::SlashAssign
                } else {
                    Punct::Slash
                }
            }
            '%' => Punct::Percent,
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        Punct::StrictEq
                    } else {
                        Punct::Eq
                    }
                } else if self.eat('>') {
                    Punct::Arrow
                } else {
                    Punct::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        Punct::StrictNotEq
                    } else {
                        Punct::NotEq
                    }
                } else {
                    Punct::Not
                }
            }
            '<' => {
                if self.eat('=') {
                    Punct::LtEq
                } else {
                    Punct::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Punct::GtEq
                } else {
                    Punct::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    Punct::AndAnd
                } else {
                    return Err(RuntimeError::syntax("unexpected character `&`"));
                }
            }
            '|' => {
                if self.eat('|') {
                    Punct::OrOr
                } else {
                    return Err(RuntimeError::syntax("unexpected character `|`"));
                }
            }
            other => {
                return Err(RuntimeError::syntax(format!(
                    "unexpected character `{other}`"
                )))
            }
        };
        Ok(Some(Token::Punct(punct)))
    }

    fn read_number(&mut self) -> Result<Token, RuntimeError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| RuntimeError::syntax(format!("invalid number literal `{text}`")))
    }

    fn read_ident(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '$') {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        match keyword(&text) {
            Some(kw) => Token::Keyword(kw),
            None => Token::Ident(text),
        }
    }

    fn read_string(&mut self, quote: char) -> Result<Token, RuntimeError> {
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => break,
                Some('\\') => text.push(self.read_escape()?),
                Some('\n') | None => {
                    return Err(RuntimeError::syntax("unterminated string literal"))
                }
                Some(c) => text.push(c),
            }
        }
        Ok(Token::Str(text))
    }

    fn read_escape(&mut self) -> Result<char, RuntimeError> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some(c @ ('\\' | '\'' | '"' | '`' | '$')) => Ok(c),
            Some(other) => Err(RuntimeError::syntax(format!(
                "unknown escape sequence `\\{other}`"
            ))),
            None => Err(RuntimeError::syntax("unterminated escape sequence")),
        }
    }

    fn read_template(&mut self) -> Result<Token, RuntimeError> {
        self.pos += 1;
        let mut parts = Vec::new();
        let mut lit = String::new();
        loop {
            match self.peek() {
                None => return Err(RuntimeError::syntax("unterminated template literal")),
                Some('`') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    self.pos += 1;
                    lit.push(self.read_escape()?);
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    self.pos += 2;
                    if !lit.is_empty() {
                        parts.push(TplPart::Lit(std::mem::take(&mut lit)));
                    }
                    parts.push(TplPart::Expr(self.read_interpolation()?));
                }
                Some(c) => {
                    self.pos += 1;
                    lit.push(c);
                }
            }
        }
        if !lit.is_empty() || parts.is_empty() {
            parts.push(TplPart::Lit(lit));
        }
        Ok(Token::Template(parts))
    }

    /// Lex the token stream of one `${ ... }` interpolation, balancing
    /// braces so object literals inside interpolations work.
    fn read_interpolation(&mut self) -> Result<Vec<Token>, RuntimeError> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        loop {
            let token = self
                .next_token()?
                .ok_or_else(|| RuntimeError::syntax("unterminated template interpolation"))?;
            match token {
                Token::Punct(Punct::LBrace) => {
                    depth += 1;
                    tokens.push(token);
                }
                Token::Punct(Punct::RBrace) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    tokens.push(token);
                }
                other => tokens.push(other),
            }
        }
        if tokens.is_empty() {
            return Err(RuntimeError::syntax("empty template interpolation"));
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_punctuation_greedily() {
        let tokens = lex("a === b !== c => ...rest ?. x").unwrap();
        assert!(tokens.contains(&Token::Punct(Punct::StrictEq)));
        assert!(tokens.contains(&Token::Punct(Punct::StrictNotEq)));
        assert!(tokens.contains(&Token::Punct(Punct::Arrow)));
        assert!(tokens.contains(&Token::Punct(Punct::Ellipsis)));
        assert!(tokens.contains(&Token::Punct(Punct::OptChain)));
    }

    #[test]
    fn lexes_template_with_interpolation() {
        let tokens = lex("`sum: ${1 + 2}!`").unwrap();
        match &tokens[0] {
            Token::Template(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[0], TplPart::Lit("sum: ".to_string()));
                assert!(matches!(&parts[1], TplPart::Expr(inner) if inner.len() == 3));
                assert_eq!(parts[2], TplPart::Lit("!".to_string()));
            }
            other => panic!("expected template token, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = lex("'open").unwrap_err();
        assert_eq!(err.kind, crate::models::ErrorKind::Syntax);
    }
}
