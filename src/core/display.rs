use std::fmt;
use std::result;

use super::{BlockStatement, Expr, Function, Object, Program, ScriptError, Stmt, Token, TokenKind};

/// Writes `items` separated by `separator`.
fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter,
    items: &[T],
    separator: &str,
) -> result::Result<(), fmt::Error> {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", item)?;
    }

    Ok(())
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            Self::Io(e) => write!(f, "error: {}", e),
            Self::Syntax(messages) => {
                for (i, message) in messages.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "\t{}", message)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        let kind = match self {
            Self::Comma => ",",
            Self::Equal => "=",
            Self::Bang => "!",
            Self::Greater => ">",
            Self::LeftBrace => "{",
            Self::LeftParen => "(",
            Self::Less => "<",
            Self::Minus => "-",
            Self::Plus => "+",
            Self::RightBrace => "}",
            Self::RightParen => ")",
            Self::Semicolon => ";",
            Self::Slash => "/",
            Self::Star => "*",
            Self::BangEqual => "!=",
            Self::EqualEqual => "==",
            Self::Identifier => "identifier",
            Self::Int => "int",
            Self::String => "string",
            Self::Else => "else",
            Self::False => "false",
            Self::Function => "fn",
            Self::If => "if",
            Self::Let => "let",
            Self::Return => "return",
            Self::True => "true",
            Self::Eof => "end-of-input",
            Self::Illegal => "illegal",
        };

        write!(f, "{}", kind)
    }
}

// `{:<10}` only pads types that honor the formatter's width, so render the
// kind to a string first.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{:<10} = {:?}", self.kind.to_string(), self.literal)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write_joined(f, &self.statements, " ")
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write_joined(f, &self.statements, " ")
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            Self::Let(name, value) => write!(f, "let {} = {};", name, value),
            Self::Return(value) => write!(f, "return {};", value),
            Self::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            Self::Identifier(name) => write!(f, "{}", name),
            Self::Integer(i) => write!(f, "{}", i),
            Self::String(s) => write!(f, "\"{}\"", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Prefix(op, right) => write!(f, "({}{})", op, right),
            Self::Infix(left, op, right) => write!(f, "({} {} {})", left, op, right),
            Self::If(condition, consequence, alternative) => {
                write!(f, "if {} {{ {} }}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {{ {} }}", alternative)?;
                }
                Ok(())
            }
            Self::Function(literal) => {
                write!(f, "fn(")?;
                write_joined(f, &literal.parameters, ", ")?;
                write!(f, ") {{ {} }}", literal.body)
            }
            Self::Call(function, arguments) => {
                write!(f, "{}(", function)?;
                write_joined(f, arguments, ", ")?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "fn(")?;
        write_joined(f, self.parameters(), ", ")?;
        write!(f, ") {{ {} }}", self.body())
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Null => write!(f, "null"),
            Self::String(s) => write!(f, "{}", s),
            Self::Array(elements) => {
                write!(f, "[")?;
                write_joined(f, elements, ", ")?;
                write!(f, "]")
            }
            Self::Function(function) => write!(f, "{}", function),
            Self::ReturnValue(value) => write!(f, "{}", value),
            Self::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}
