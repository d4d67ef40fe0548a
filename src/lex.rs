use std::fmt;

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Keyword {
    Stop,
    Words,
    Wait,
    Watch,
    Listen,
    Pause,
    Contemplate,
    Eat,
    Drink,
    Sleep,
    Rest,
    Obey,
    If,
    Then,
    Else,
    Elif,
    While,
    Do,
    End,
    Define,
    Call,
    Return,
    Modify,
    Recurse,
}

// Matching order matters: the first keyword that fits at a position wins.
const KEYWORDS: [Keyword; 24] = [
    Keyword::Stop,
    Keyword::Words,
    Keyword::Wait,
    Keyword::Watch,
    Keyword::Listen,
    Keyword::Pause,
    Keyword::Contemplate,
    Keyword::Eat,
    Keyword::Drink,
    Keyword::Sleep,
    Keyword::Rest,
    Keyword::Obey,
    Keyword::If,
    Keyword::Then,
    Keyword::Else,
    Keyword::Elif,
    Keyword::While,
    Keyword::Do,
    Keyword::End,
    Keyword::Define,
    Keyword::Call,
    Keyword::Return,
    Keyword::Modify,
    Keyword::Recurse,
];

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Stop => "STOP",
            Keyword::Words => "WORDS",
            Keyword::Wait => "WAIT",
            Keyword::Watch => "WATCH",
            Keyword::Listen => "LISTEN",
            Keyword::Pause => "PAUSE",
            Keyword::Contemplate => "CONTEMPLATE",
            Keyword::Eat => "EAT",
            Keyword::Drink => "DRINK",
            Keyword::Sleep => "SLEEP",
            Keyword::Rest => "REST",
            Keyword::Obey => "OBEY",
            Keyword::If => "IF",
            Keyword::Then => "THEN",
            Keyword::Else => "ELSE",
            Keyword::Elif => "ELIF",
            Keyword::While => "WHILE",
            Keyword::Do => "DO",
            Keyword::End => "END",
            Keyword::Define => "DEFINE",
            Keyword::Call => "CALL",
            Keyword::Return => "RETURN",
            Keyword::Modify => "MODIFY",
            Keyword::Recurse => "RECURSE",
        }
    }
}

/// A numeric literal. Integer and float are told apart only by the
/// presence of a decimal point in the source.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(x) => x,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Token {
    Keyword(Keyword),
    Number(Number),
    Identifier(String),
    Str(String),
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    Lparen,
    Rparen,
    Lbrace,
    Rbrace,
    Lsquare,
    Rsquare,
    Comma,
    Semicolon,
    Colon,
    Question,
    Exclaim,
    Dot,
    DotDot,
    Lt,
    Gt,
    EqEq,
    NotEq,
    LtEq,
    GtEq,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Token::Keyword(keyword) => keyword.as_str(),
            Token::Number(Number::Integer(i)) => return write!(f, "{}", i),
            Token::Number(Number::Float(x)) => return write!(f, "{:?}", x),
            Token::Identifier(name) => return write!(f, "{}", name),
            Token::Str(s) => return write!(f, "{:?}", s),
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Assign => "=",
            Token::Lparen => "(",
            Token::Rparen => ")",
            Token::Lbrace => "{",
            Token::Rbrace => "}",
            Token::Lsquare => "[",
            Token::Rsquare => "]",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::Question => "?",
            Token::Exclaim => "!",
            Token::Dot => ".",
            Token::DotDot => "..",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::Eof => return write!(f, "end of input"),
        };
        write!(f, "'{}'", symbol)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct AnnotatedToken {
    pub token: Token,
    pub line: u64,
    pub column: u64,
}

impl Token {
    fn annotate(self, line: u64, column: u64) -> AnnotatedToken {
        AnnotatedToken {
            token: self,
            line,
            column,
        }
    }
}

/// Structural error raised while lexing or parsing. Positions are 1-based.
#[derive(PartialEq, Debug, Clone)]
pub struct Error {
    line: u64,
    column: u64,
    message: String,
}

impl Error {
    pub(crate) fn new(line: u64, column: u64, message: String) -> Self {
        Error {
            line,
            column,
            message,
        }
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn column(&self) -> u64 {
        self.column
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Syntax error at line {}, col {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for Error {}

const UNTERMINATED_STRING_ERROR: &str = "unterminated string";
const INVALID_NUMBER_ERROR: &str = "invalid number literal";
const UNEXPECTED_CHARACTER_ERROR: &str = "unexpected character";

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u64,
    column: u64,
}

impl Lexer {
    fn new(source: &str) -> Lexer {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn next_chr(&mut self) -> Option<char> {
        let next = self.peek();

        match next {
            Some('\n') => {
                self.column = 1;
                self.line += 1;
            }
            Some(_) => {
                self.column += 1;
            }
            None => return None,
        }

        self.pos += 1;
        next
    }

    // next returns the next token from the source
    // if there are no more tokens it returns Ok(None)
    // it returns Err if there is a syntax error
    fn next(&mut self) -> Result<Option<AnnotatedToken>, Error> {
        let next_chr = loop {
            self.dump_whitespace();

            match self.peek() {
                None => return Ok(None),
                Some('#') => self.dump_comment(),
                Some(chr) => break chr,
            }
        };

        let line = self.line;
        let column = self.column;

        if let Some(keyword) = self.match_keyword() {
            return Ok(Some(Token::Keyword(keyword).annotate(line, column)));
        }

        let token = if next_chr.is_ascii_digit() {
            self.get_number()?
        } else if next_chr.is_ascii_alphabetic() || next_chr == '_' {
            self.get_identifier()
        } else if next_chr == '"' || next_chr == '\'' {
            self.get_string(next_chr)?
        } else {
            self.get_operator(next_chr)?
        };

        Ok(Some(token.annotate(line, column)))
    }

    fn dump_whitespace(&mut self) {
        while let Some(chr) = self.peek() {
            match chr {
                ' ' | '\t' | '\n' | '\r' => {
                    self.next_chr();
                }
                _ => return,
            }
        }
    }

    fn dump_comment(&mut self) {
        while let Some(chr) = self.peek() {
            if chr == '\n' {
                return;
            }
            self.next_chr();
        }
    }

    // A keyword only counts when it is not the prefix of a longer word.
    fn match_keyword(&mut self) -> Option<Keyword> {
        for &keyword in KEYWORDS.iter() {
            let text = keyword.as_str();

            let prefix_matches = text.chars().enumerate().all(|(i, expected)| {
                self.peek_at(i)
                    .map_or(false, |chr| chr.to_ascii_uppercase() == expected)
            });
            if !prefix_matches {
                continue;
            }

            let at_boundary = self
                .peek_at(text.len())
                .map_or(true, |chr| !chr.is_alphanumeric());
            if at_boundary {
                for _ in 0..text.len() {
                    self.next_chr();
                }
                return Some(keyword);
            }
        }

        None
    }

    fn get_number(&mut self) -> Result<Token, Error> {
        let line = self.line;
        let column = self.column;

        let mut val = String::new();
        while let Some(chr) = self.peek() {
            if !chr.is_ascii_digit() && chr != '.' {
                break;
            }
            val.push(chr);
            self.next_chr();
        }

        let number = if val.contains('.') {
            val.parse::<f64>().ok().map(Number::Float)
        } else {
            val.parse::<i64>().ok().map(Number::Integer)
        };

        number.map(Token::Number).ok_or_else(|| {
            Error::new(line, column, format!("{}: {}", INVALID_NUMBER_ERROR, val))
        })
    }

    fn get_identifier(&mut self) -> Token {
        let mut val = String::new();

        while let Some(chr) = self.peek() {
            if !chr.is_ascii_alphanumeric() && chr != '_' {
                break;
            }
            val.push(chr);
            self.next_chr();
        }

        Token::Identifier(val)
    }

    fn get_string(&mut self, quote: char) -> Result<Token, Error> {
        let line = self.line;
        let column = self.column;
        let unterminated = || Error::new(line, column, UNTERMINATED_STRING_ERROR.to_string());

        self.next_chr();
        let mut val = String::new();

        loop {
            match self.next_chr() {
                None => return Err(unterminated()),
                Some(chr) if chr == quote => return Ok(Token::Str(val)),
                Some('\\') => match self.next_chr() {
                    None => return Err(unterminated()),
                    Some('n') => val.push('\n'),
                    Some('t') => val.push('\t'),
                    Some('r') => val.push('\r'),
                    // covers \\ and the escaped quote as well
                    Some(other) => val.push(other),
                },
                Some(chr) => val.push(chr),
            }
        }
    }

    fn get_operator(&mut self, chr: char) -> Result<Token, Error> {
        let two_char = match (chr, self.peek_at(1)) {
            ('=', Some('=')) => Some(Token::EqEq),
            ('!', Some('=')) => Some(Token::NotEq),
            ('<', Some('=')) => Some(Token::LtEq),
            ('>', Some('=')) => Some(Token::GtEq),
            ('.', Some('.')) => Some(Token::DotDot),
            _ => None,
        };

        if let Some(token) = two_char {
            self.next_chr();
            self.next_chr();
            return Ok(token);
        }

        let token = match chr {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '=' => Token::Assign,
            '(' => Token::Lparen,
            ')' => Token::Rparen,
            '{' => Token::Lbrace,
            '}' => Token::Rbrace,
            '[' => Token::Lsquare,
            ']' => Token::Rsquare,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            ':' => Token::Colon,
            '?' => Token::Question,
            '!' => Token::Exclaim,
            '.' => Token::Dot,
            '<' => Token::Lt,
            '>' => Token::Gt,
            _ => {
                return Err(Error::new(
                    self.line,
                    self.column,
                    format!("{} '{}'", UNEXPECTED_CHARACTER_ERROR, chr),
                ))
            }
        };

        self.next_chr();
        Ok(token)
    }
}

/// Turns source text into tokens. The result always ends with `Token::Eof`.
pub fn tokenize(source: &str) -> Result<Vec<AnnotatedToken>, Error> {
    let mut lexer = Lexer::new(source);
    let mut res = Vec::new();

    while let Some(token) = lexer.next()? {
        res.push(token)
    }

    res.push(Token::Eof.annotate(lexer.line, lexer.column));
    Ok(res)
}

#[cfg(test)]
mod test {
    use super::*;

    fn tokens_of(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|tok| tok.token)
            .collect::<Vec<_>>()
    }

    #[test]
    fn generates_correct_tokens() {
        use Token::*;

        assert_eq!(
            tokens_of("x = 10 + 5"),
            vec![
                Identifier("x".to_string()),
                Assign,
                Number(super::Number::Integer(10)),
                Plus,
                Number(super::Number::Integer(5)),
                Eof
            ]
        );
    }

    #[test]
    fn annotates_positions() {
        let tokens = tokenize("a\n  bc = 1").unwrap();
        let positions = tokens
            .iter()
            .map(|tok| (tok.line, tok.column))
            .collect::<Vec<_>>();
        assert_eq!(positions, vec![(1, 1), (2, 3), (2, 6), (2, 8), (2, 9)]);
    }

    #[test]
    fn matches_keywords_ignoring_case() {
        use Token::*;

        assert_eq!(
            tokens_of("define While end"),
            vec![
                Keyword(super::Keyword::Define),
                Keyword(super::Keyword::While),
                Keyword(super::Keyword::End),
                Eof
            ]
        );
    }

    #[test]
    fn keyword_prefix_of_identifier_is_identifier() {
        use Token::*;

        assert_eq!(
            tokens_of("double ending if2"),
            vec![
                Identifier("double".to_string()),
                Identifier("ending".to_string()),
                Identifier("if2".to_string()),
                Eof
            ]
        );
    }

    #[test]
    fn underscore_ends_a_keyword() {
        use Token::*;

        assert_eq!(
            tokens_of("do_it"),
            vec![
                Keyword(super::Keyword::Do),
                Identifier("_it".to_string()),
                Eof
            ]
        );
    }

    #[test]
    fn distinguishes_integers_and_floats() {
        use Token::*;

        assert_eq!(
            tokens_of("3 3.5 7."),
            vec![
                Number(super::Number::Integer(3)),
                Number(super::Number::Float(3.5)),
                Number(super::Number::Float(7.0)),
                Eof
            ]
        );
    }

    #[test]
    fn rejects_malformed_number() {
        let err = tokenize("x = 1..2").unwrap_err();
        assert_eq!(err.line(), 1);
        assert_eq!(err.column(), 5);
    }

    #[test]
    fn handles_string_escapes() {
        assert_eq!(
            tokens_of("\"a\\nb\""),
            vec![Token::Str("a\nb".to_string()), Token::Eof]
        );
        assert_eq!(
            tokens_of(r#"'it\'s' "tab\there" "back\\slash" "\q""#),
            vec![
                Token::Str("it's".to_string()),
                Token::Str("tab\there".to_string()),
                Token::Str("back\\slash".to_string()),
                Token::Str("q".to_string()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_reports_opening_line() {
        let err = tokenize("x = 1\ny = \"abc\n\nz").unwrap_err();
        assert_eq!(err.line(), 2);
        assert_eq!(err.column(), 5);
        assert_eq!(err.message(), UNTERMINATED_STRING_ERROR);
    }

    #[test]
    fn trailing_backslash_is_unterminated() {
        assert!(tokenize("\"abc\\").is_err());
    }

    #[test]
    fn prefers_two_character_operators() {
        use Token::*;

        assert_eq!(
            tokens_of("== != <= >= .. < > = ! ."),
            vec![EqEq, NotEq, LtEq, GtEq, DotDot, Lt, Gt, Assign, Exclaim, Dot, Eof]
        );
    }

    #[test]
    fn skips_comments() {
        use Token::*;

        assert_eq!(
            tokens_of("# heading\nx # trailing\n# last"),
            vec![Identifier("x".to_string()), Eof]
        );
    }

    #[test]
    fn generates_error() {
        let res = tokenize("hello\n  @");
        assert!(res.is_err());
        let err = res.unwrap_err();
        assert_eq!(err.line(), 2);
        assert_eq!(err.column(), 3);
    }

    #[test]
    fn empty_source_is_just_eof() {
        let tokens = tokenize("").unwrap();
        assert_eq!(
            tokens,
            vec![AnnotatedToken {
                token: Token::Eof,
                line: 1,
                column: 1
            }]
        );
    }
}
