use std::error;
use std::fmt;
use std::io;
use std::rc::Rc;
use std::result;

mod display;
mod environment;
mod interpreter;
mod lexer;
mod parser;

pub type Env = environment::Env;
pub type Environment = environment::Environment;
pub type Interpreter = interpreter::Interpreter;
pub type Lexer = lexer::Lexer;
pub type Result<T> = result::Result<T, ScriptError>;

pub use interpreter::{evaluate, MAX_CALL_DEPTH, STACK_SIZE};
pub use lexer::tokenize;
pub use parser::{parse, Parser};

/// The interpreter's "true" singleton.
pub const TRUE: Object = Object::Boolean(true);
/// The interpreter's "false" singleton.
pub const FALSE: Object = Object::Boolean(false);
/// The interpreter's only `Null`.
pub const NULL: Object = Object::Null;

/// Failures that belong to the host rather than to the running program.
///
/// Runtime failures inside a program are `Object::Error` values and never
/// show up here.
#[derive(Debug)]
pub enum ScriptError {
    /// Reading a script or the prompt failed.
    Io(io::Error),
    /// The parser recorded at least one syntax error. The messages are kept
    /// in the order they were found.
    Syntax(Vec<String>),
}

impl error::Error for ScriptError {}

impl From<io::Error> for ScriptError {
    fn from(e: io::Error) -> Self {
        ScriptError::Io(e)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character tokens
    Comma,
    Equal,
    Bang,
    Greater,
    LeftBrace,
    LeftParen,
    Less,
    Minus,
    Plus,
    RightBrace,
    RightParen,
    Semicolon,
    Slash,
    Star,

    // Two character tokens
    BangEqual,
    EqualEqual,

    // Literals
    Identifier,
    Int,
    String,

    // Keywords
    Else,
    False,
    Function,
    If,
    Let,
    Return,
    True,

    Eof,
    Illegal,
}

impl TokenKind {
    /// Resolves an identifier to its keyword kind, or `Identifier` if it is
    /// not a keyword.
    #[must_use]
    pub fn keyword(identifier: &str) -> TokenKind {
        match identifier {
            "else" => TokenKind::Else,
            "false" => TokenKind::False,
            "fn" => TokenKind::Function,
            "if" => TokenKind::If,
            "let" => TokenKind::Let,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            _ => TokenKind::Identifier,
        }
    }

    /// The binding strength of this kind when it follows an expression.
    #[must_use]
    pub fn precedence(self) -> Precedence {
        match self {
            TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equals,
            TokenKind::Less | TokenKind::Greater => Precedence::LessGreater,
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Star | TokenKind::Slash => Precedence::Product,
            TokenKind::LeftParen => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

/// Operator binding strengths, weakest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    literal: String,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, literal: String) -> Self {
        Token { kind, literal }
    }

    #[must_use]
    pub fn eof() -> Self {
        Token::new(TokenKind::Eof, String::new())
    }

    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    #[must_use]
    pub fn literal(&self) -> &str {
        &self.literal
    }

    fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// The root of a parsed source text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    /// Whether a REPL should echo the value of this program.
    ///
    /// Empty input and input ending in a `let` have nothing to show.
    #[must_use]
    pub fn displays_result(&self) -> bool {
        match self.statements.last() {
            None | Some(Stmt::Let(..)) => false,
            Some(_) => true,
        }
    }
}

/// A braced statement list. Only ever appears as the body of an `if` branch
/// or a function literal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockStatement {
    pub statements: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    Let(String, Expr),
    Return(Expr),
    Expression(Expr),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionLiteral {
    pub parameters: Vec<String>,
    pub body: BlockStatement,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Identifier(String),
    Integer(i64),
    String(String),
    Boolean(bool),
    /// The operator is either `Bang` or `Minus`.
    Prefix(TokenKind, Box<Expr>),
    Infix(Box<Expr>, TokenKind, Box<Expr>),
    If(Box<Expr>, BlockStatement, Option<BlockStatement>),
    Function(Rc<FunctionLiteral>),
    Call(Box<Expr>, Vec<Expr>),
}

/// A runtime value.
///
/// `ReturnValue` and `Error` only exist while a program is being evaluated:
/// the first carries a `return` out to the nearest call boundary, the second
/// is a failure that every evaluation step hands back unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Null,
    String(String),
    Array(Vec<Object>),
    Function(Function),
    ReturnValue(Box<Object>),
    Error(String),
}

impl Object {
    /// The tag runtime error messages use for this value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::Null => "NULL",
            Object::String(_) => "STRING",
            Object::Array(_) => "ARRAY",
            Object::Function(_) => "FUNCTION",
            Object::ReturnValue(_) => "RETURN_VALUE",
            Object::Error(_) => "ERROR",
        }
    }

    /// `false`, `null` and `0` are falsey. Every other value is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Null => false,
            Object::Boolean(b) => *b,
            Object::Integer(i) => *i != 0,
            _ => true,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        if b {
            TRUE
        } else {
            FALSE
        }
    }
}

/// A closure: a function literal paired with the environment it was defined
/// in.
///
/// The literal is shared with the AST, so copying a `Function` out of an
/// environment never copies its body.
#[derive(Clone)]
pub struct Function {
    literal: Rc<FunctionLiteral>,
    env: Env,
}

impl Function {
    #[must_use]
    pub fn new(literal: &Rc<FunctionLiteral>, env: &Env) -> Self {
        Function {
            literal: Rc::clone(literal),
            env: Rc::clone(env),
        }
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.literal.parameters.len()
    }

    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.literal.parameters
    }

    #[must_use]
    pub fn body(&self) -> &BlockStatement {
        &self.literal.body
    }

    /// Whether `env` is the frame this function was defined in.
    #[must_use]
    pub fn captures(&self, env: &Env) -> bool {
        Rc::ptr_eq(&self.env, env)
    }
}

/// Two functions are equal only if they close over the very same frame.
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.literal == other.literal && Rc::ptr_eq(&self.env, &other.env)
    }
}

// A closure is often stored in the frame it captured, so printing the
// environment here would never terminate.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        f.debug_struct("Function")
            .field("parameters", &self.literal.parameters)
            .field("body", &self.literal.body)
            .finish()
    }
}
