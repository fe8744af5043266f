use std::collections::HashMap;
use std::convert::TryFrom;
use std::rc::Rc;

use log::debug;

use super::{
    BlockStatement, Expr, FunctionLiteral, Lexer, Precedence, Program, Stmt, Token, TokenKind,
};

type PrefixRule<I> = fn(&mut Parser<I>) -> Option<Expr>;
type InfixRule<I> = fn(&mut Parser<I>, Expr) -> Option<Expr>;

/// Parses a stream of tokens into a `Program`.
///
/// `Parser` is a Pratt parser. Every token kind that can begin an expression
/// owns a *prefix* rule, and every kind that can continue one owns an *infix*
/// rule plus a `Precedence`:
///
/// ```notrust
/// program    → statement* EOF ;
/// statement  → "let" IDENTIFIER "=" expression ";"?
///            | "return" expression ";"?
///            | expression ";"? ;
/// block      → "{" statement* "}" ;
///
/// prefix     → IDENTIFIER | INT | STRING | "true" | "false"
///            | ( "!" | "-" ) expression
///            | "(" expression ")"
///            | "if" "(" expression ")" block ( "else" block )?
///            | "fn" "(" parameters? ")" block ;
/// infix      → expression ( "==" | "!=" | "<" | ">" | "+" | "-" | "*" | "/" ) expression
///            | expression "(" arguments? ")" ;
/// ```
///
/// A syntax error never stops the parse. The message is recorded, the
/// failing statement is dropped, and parsing picks up again at the next
/// statement. Callers must check the returned errors before evaluating.
///
/// Every rule returns `None` when it cannot produce a node, and a parent with
/// a missing child is itself missing.
pub struct Parser<I: Iterator<Item = Token>> {
    tokens: I,
    current: Token,
    next: Token,
    errors: Vec<String>,
    // Number of blocks currently open. Recovery inside a block must not step
    // over the block's closing brace.
    depth: usize,
    prefix_rules: HashMap<TokenKind, PrefixRule<I>>,
    infix_rules: HashMap<TokenKind, InfixRule<I>>,
}

impl<I: Iterator<Item = Token>> Parser<I> {
    #[must_use]
    pub fn new(tokens: I) -> Self {
        let mut parser = Parser {
            tokens,
            current: Token::eof(),
            next: Token::eof(),
            errors: Vec::new(),
            depth: 0,
            prefix_rules: HashMap::new(),
            infix_rules: HashMap::new(),
        };

        parser.register_prefix(TokenKind::Identifier, Self::parse_identifier);
        parser.register_prefix(TokenKind::Int, Self::parse_integer_literal);
        parser.register_prefix(TokenKind::String, Self::parse_string_literal);
        parser.register_prefix(TokenKind::True, Self::parse_boolean);
        parser.register_prefix(TokenKind::False, Self::parse_boolean);
        parser.register_prefix(TokenKind::Bang, Self::parse_prefix_expression);
        parser.register_prefix(TokenKind::Minus, Self::parse_prefix_expression);
        parser.register_prefix(TokenKind::LeftParen, Self::parse_grouped_expression);
        parser.register_prefix(TokenKind::If, Self::parse_if_expression);
        parser.register_prefix(TokenKind::Function, Self::parse_function_literal);
        parser.register_prefix(TokenKind::Illegal, Self::parse_illegal);

        for kind in &[
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Slash,
            TokenKind::Star,
            TokenKind::EqualEqual,
            TokenKind::BangEqual,
            TokenKind::Less,
            TokenKind::Greater,
        ] {
            parser.register_infix(*kind, Self::parse_infix_expression);
        }
        parser.register_infix(TokenKind::LeftParen, Self::parse_call_expression);

        // fill both current and next
        parser.advance();
        parser.advance();
        parser
    }

    /// Parses every statement and returns the program together with the
    /// syntax errors found along the way, in source order.
    #[must_use]
    pub fn parse_program(mut self) -> (Program, Vec<String>) {
        let mut program = Program::default();

        while !self.current.is(TokenKind::Eof) {
            match self.parse_statement() {
                Some(statement) => {
                    program.statements.push(statement);
                    self.advance();
                }
                None => self.synchronize(),
            }
        }

        (program, self.errors)
    }

    fn register_prefix(&mut self, kind: TokenKind, rule: PrefixRule<I>) {
        self.prefix_rules.insert(kind, rule);
    }

    fn register_infix(&mut self, kind: TokenKind, rule: InfixRule<I>) {
        self.infix_rules.insert(kind, rule);
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.current.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Stmt> {
        self.expect(TokenKind::Identifier)?;
        let name = self.current.literal.clone();

        self.expect(TokenKind::Equal)?;
        self.advance();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Some(Stmt::Let(name, value))
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        self.advance();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Some(Stmt::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Some(Stmt::Expression(expr))
    }

    /// Parses everything that binds tighter than `precedence`.
    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let prefix = if let Some(rule) = self.prefix_rules.get(&self.current.kind) {
            *rule
        } else {
            self.error(format!("no prefix parse rule for {}", self.current.kind));
            return None;
        };

        let mut left = prefix(self)?;

        while !self.next.is(TokenKind::Semicolon) && precedence < self.next.kind.precedence() {
            let infix = match self.infix_rules.get(&self.next.kind) {
                Some(rule) => *rule,
                None => return Some(left),
            };

            self.advance();
            left = infix(self, left)?;
        }

        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expr> {
        Some(Expr::Identifier(self.current.literal.clone()))
    }

    fn parse_integer_literal(&mut self) -> Option<Expr> {
        if let Some(value) = parse_integer(&self.current.literal) {
            Some(Expr::Integer(value))
        } else {
            let message = format!("could not parse {:?} as integer", self.current.literal);
            self.error(message);
            None
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expr> {
        Some(Expr::String(self.current.literal.clone()))
    }

    fn parse_boolean(&mut self) -> Option<Expr> {
        Some(Expr::Boolean(self.current.is(TokenKind::True)))
    }

    // The lexer's diagnostic was already recorded when the token was pulled.
    fn parse_illegal(&mut self) -> Option<Expr> {
        None
    }

    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let operator = self.current.kind;
        self.advance();

        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix(operator, Box::new(right)))
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let operator = self.current.kind;
        let precedence = operator.precedence();
        self.advance();

        let right = self.parse_expression(precedence)?;
        Some(Expr::Infix(Box::new(left), operator, Box::new(right)))
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.advance();

        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RightParen)?;

        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        self.expect(TokenKind::LeftParen)?;
        self.advance();

        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RightParen)?;
        self.expect(TokenKind::LeftBrace)?;

        let consequence = self.parse_block_statement()?;

        let alternative = if self.next.is(TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::LeftBrace)?;
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Some(Expr::If(Box::new(condition), consequence, alternative))
    }

    /// Parses the statements of a block. `current` must be the opening brace;
    /// on success `current` is the closing one.
    fn parse_block_statement(&mut self) -> Option<BlockStatement> {
        let mut block = BlockStatement::default();
        self.depth += 1;
        self.advance();

        while !self.current.is(TokenKind::RightBrace) {
            if self.current.is(TokenKind::Eof) {
                self.error(format!(
                    "expected token '{}', got '{}' instead",
                    TokenKind::RightBrace,
                    TokenKind::Eof
                ));
                self.depth -= 1;
                return None;
            }

            match self.parse_statement() {
                Some(statement) => {
                    block.statements.push(statement);
                    self.advance();
                }
                None => self.synchronize(),
            }
        }

        self.depth -= 1;
        Some(block)
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        self.expect(TokenKind::LeftParen)?;
        let parameters = self.parse_function_parameters()?;

        self.expect(TokenKind::LeftBrace)?;
        let body = self.parse_block_statement()?;

        Some(Expr::Function(Rc::new(FunctionLiteral { parameters, body })))
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut parameters = Vec::new();

        if self.next.is(TokenKind::RightParen) {
            self.advance();
            return Some(parameters);
        }

        self.expect(TokenKind::Identifier)?;
        parameters.push(self.current.literal.clone());

        while self.next.is(TokenKind::Comma) {
            self.advance();
            self.expect(TokenKind::Identifier)?;
            parameters.push(self.current.literal.clone());
        }

        self.expect(TokenKind::RightParen)?;
        Some(parameters)
    }

    fn parse_call_expression(&mut self, function: Expr) -> Option<Expr> {
        let arguments = self.parse_call_arguments()?;
        Some(Expr::Call(Box::new(function), arguments))
    }

    fn parse_call_arguments(&mut self) -> Option<Vec<Expr>> {
        let mut arguments = Vec::new();

        if self.next.is(TokenKind::RightParen) {
            self.advance();
            return Some(arguments);
        }

        self.advance();
        arguments.push(self.parse_expression(Precedence::Lowest)?);

        while self.next.is(TokenKind::Comma) {
            self.advance();
            self.advance();
            arguments.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect(TokenKind::RightParen)?;
        Some(arguments)
    }

    /// Skips ahead to the start of the next statement after a failed one.
    ///
    /// Always moves at least one token, except when sitting on the closing
    /// brace of an open block, which the block itself has to see.
    fn synchronize(&mut self) {
        if self.current.is(TokenKind::Eof)
            || (self.depth > 0 && self.current.is(TokenKind::RightBrace))
        {
            return;
        }

        loop {
            let previous = self.current.kind;
            self.advance();

            if previous == TokenKind::Semicolon {
                return;
            }

            match self.current.kind {
                TokenKind::Let | TokenKind::Return | TokenKind::Eof => return,
                TokenKind::RightBrace if self.depth > 0 => return,
                _ => {}
            }
        }
    }

    fn skip_semicolon(&mut self) {
        if self.next.is(TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Moves onto the next token if it is `kind`. Otherwise records an error
    /// and leaves the unexpected token in place.
    fn expect(&mut self, kind: TokenKind) -> Option<()> {
        if self.next.is(kind) {
            self.advance();
            Some(())
        } else {
            self.error(format!(
                "expected token '{}', got '{}' instead",
                kind, self.next.kind
            ));
            None
        }
    }

    fn advance(&mut self) {
        let pulled = self.tokens.next().unwrap_or_else(Token::eof);

        if pulled.is(TokenKind::Illegal) {
            self.error(pulled.literal.clone());
        }

        self.current = std::mem::replace(&mut self.next, pulled);
    }

    fn error(&mut self, message: String) {
        debug!("syntax error: {}", message);
        self.errors.push(message);
    }
}

/// Lexes and parses `source` in one go.
#[must_use]
pub fn parse(source: &str) -> (Program, Vec<String>) {
    Parser::new(Lexer::new(source.to_owned())).parse_program()
}

/// Converts integer literal text to a value.
///
/// Accepts an optional sign, then `0x`, `0o` or `0b` for hexadecimal, octal
/// or binary digits. A bare leading `0` also means octal.
fn parse_integer(text: &str) -> Option<i64> {
    let (negative, unsigned) = if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else {
        (false, text.strip_prefix('+').unwrap_or(text))
    };

    let lowered = unsigned.to_ascii_lowercase();
    let (radix, digits) = if let Some(digits) = lowered.strip_prefix("0x") {
        (16, digits)
    } else if let Some(digits) = lowered.strip_prefix("0o") {
        (8, digits)
    } else if let Some(digits) = lowered.strip_prefix("0b") {
        (2, digits)
    } else if lowered.len() > 1 && lowered.starts_with('0') {
        (8, &lowered[1..])
    } else {
        (10, lowered.as_str())
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        program
    }

    fn single_expression(source: &str) -> Expr {
        let mut program = parse_ok(source);
        assert_eq!(1, program.statements.len());
        match program.statements.remove(0) {
            Stmt::Expression(expr) => expr,
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    fn integer(value: i64) -> Box<Expr> {
        Box::new(Expr::Integer(value))
    }

    fn identifier(name: &str) -> Box<Expr> {
        Box::new(Expr::Identifier(name.to_owned()))
    }

    #[test]
    fn it_can_parse_let_statements() {
        let program = parse_ok("let x = 5;\nlet y = true\nlet foobar = y;");
        assert_eq!(
            vec![
                Stmt::Let("x".to_owned(), Expr::Integer(5)),
                Stmt::Let("y".to_owned(), Expr::Boolean(true)),
                Stmt::Let("foobar".to_owned(), Expr::Identifier("y".to_owned())),
            ],
            program.statements
        );
    }

    #[test]
    fn it_can_parse_return_statements() {
        let program = parse_ok("return 5; return x + 1");
        assert_eq!(
            vec![
                Stmt::Return(Expr::Integer(5)),
                Stmt::Return(Expr::Infix(identifier("x"), TokenKind::Plus, integer(1))),
            ],
            program.statements
        );
    }

    #[test]
    fn it_can_parse_a_comparison() {
        assert_eq!(
            Expr::Infix(integer(5), TokenKind::Less, integer(10)),
            single_expression("5 < 10")
        );
    }

    #[test]
    fn it_can_parse_literals() {
        assert_eq!(Expr::Integer(5), single_expression("5;"));
        assert_eq!(Expr::Boolean(false), single_expression("false"));
        assert_eq!(
            Expr::String("hello world".to_owned()),
            single_expression("\"hello world\"")
        );
        assert_eq!(Expr::Identifier("foobar".to_owned()), single_expression("foobar"));
    }

    #[test]
    fn it_can_parse_prefix_expressions() {
        assert_eq!(
            Expr::Prefix(TokenKind::Bang, integer(5)),
            single_expression("!5")
        );
        assert_eq!(
            Expr::Prefix(TokenKind::Minus, integer(15)),
            single_expression("-15")
        );
    }

    #[test]
    fn it_respects_operator_precedence() {
        let cases = [
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b / c", "((a * b) / c)"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
            ("3 + 4; -5 * 5", "(3 + 4) ((-5) * 5)"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4))"),
            (
                "3 + 4 * 5 == 3 * 1 + 4 * 5",
                "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))",
            ),
            ("true == !false", "(true == (!false))"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
            ("(5 + 5) * 2", "((5 + 5) * 2)"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("!(true == true)", "(!(true == true))"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))",
            ),
            ("add(a + b + c * d / f + g)", "add((((a + b) + ((c * d) / f)) + g))"),
        ];

        for (source, expected) in &cases {
            assert_eq!(*expected, parse_ok(source).to_string(), "source: {}", source);
        }
    }

    #[test]
    fn it_can_parse_an_if_expression() {
        let expr = single_expression("if (x < y) { x }");
        assert_eq!(
            Expr::If(
                Box::new(Expr::Infix(identifier("x"), TokenKind::Less, identifier("y"))),
                BlockStatement {
                    statements: vec![Stmt::Expression(Expr::Identifier("x".to_owned()))]
                },
                None
            ),
            expr
        );
    }

    #[test]
    fn it_can_parse_an_if_else_expression() {
        let expr = single_expression("if (x < y) { x } else { y; }");
        assert_eq!("if (x < y) { x } else { y }", expr.to_string());
    }

    #[test]
    fn it_can_parse_a_function_literal() {
        let expr = single_expression("fn(x, y) { x + y; }");
        assert_eq!(
            Expr::Function(Rc::new(FunctionLiteral {
                parameters: vec!["x".to_owned(), "y".to_owned()],
                body: BlockStatement {
                    statements: vec![Stmt::Expression(Expr::Infix(
                        identifier("x"),
                        TokenKind::Plus,
                        identifier("y")
                    ))]
                },
            })),
            expr
        );
    }

    #[test]
    fn it_can_parse_function_parameter_lists() {
        let cases: [(&str, &[&str]); 3] = [
            ("fn() {};", &[]),
            ("fn(x) {};", &["x"]),
            ("fn(x, y, z) {};", &["x", "y", "z"]),
        ];

        for (source, expected) in &cases {
            match single_expression(source) {
                Expr::Function(literal) => assert_eq!(*expected, literal.parameters.as_slice()),
                other => panic!("expected a function literal, got {:?}", other),
            }
        }
    }

    #[test]
    fn it_can_parse_a_call_expression() {
        assert_eq!(
            Expr::Call(
                identifier("add"),
                vec![
                    Expr::Integer(1),
                    Expr::Infix(integer(2), TokenKind::Star, integer(3)),
                    Expr::Infix(integer(4), TokenKind::Plus, integer(5)),
                ]
            ),
            single_expression("add(1, 2 * 3, 4 + 5);")
        );
        assert_eq!(Expr::Call(identifier("f"), vec![]), single_expression("f()"));
    }

    #[test]
    fn it_can_call_a_function_literal_directly() {
        assert_eq!(
            "fn(x) { x }(5)",
            single_expression("fn(x) { x }(5)").to_string()
        );
    }

    #[test]
    fn it_understands_integer_bases_and_signs() {
        assert_eq!(Some(42), parse_integer("42"));
        assert_eq!(Some(8), parse_integer("010"));
        assert_eq!(Some(0), parse_integer("0"));
        assert_eq!(Some(255), parse_integer("0xff"));
        assert_eq!(Some(5), parse_integer("0b101"));
        assert_eq!(Some(-7), parse_integer("-0o7"));
        assert_eq!(Some(i64::MIN), parse_integer("-9223372036854775808"));
        assert_eq!(None, parse_integer("9223372036854775808"));
        assert_eq!(None, parse_integer("08"));
        assert_eq!(None, parse_integer("0x"));
        assert_eq!(None, parse_integer("--1"));
    }

    #[test]
    fn it_reports_integers_that_do_not_fit() {
        let (program, errors) = parse("99999999999999999999; 1");
        assert_eq!(
            vec!["could not parse \"99999999999999999999\" as integer".to_owned()],
            errors
        );
        assert_eq!(vec![Stmt::Expression(Expr::Integer(1))], program.statements);
    }

    #[test]
    fn it_reports_unexpected_tokens() {
        let (_, errors) = parse("let x 5;");
        assert_eq!(
            vec!["expected token '=', got 'int' instead".to_owned()],
            errors
        );

        let (_, errors) = parse("let = 10;");
        assert_eq!(
            "expected token 'identifier', got '=' instead",
            errors[0]
        );
    }

    #[test]
    fn it_reports_missing_prefix_rules() {
        let (program, errors) = parse("*5");
        assert_eq!(vec!["no prefix parse rule for *".to_owned()], errors);
        assert!(program.statements.is_empty());
    }

    #[test]
    fn it_keeps_parsing_after_a_malformed_statement() {
        let (program, errors) = parse("let = 5; return 5;");
        assert!(!errors.is_empty());
        assert_eq!(vec![Stmt::Return(Expr::Integer(5))], program.statements);
    }

    #[test]
    fn it_recovers_inside_a_block() {
        let (program, errors) = parse("let f = fn(x) { x + }; f");
        assert_eq!(vec!["no prefix parse rule for }".to_owned()], errors);
        assert_eq!(2, program.statements.len());
    }

    #[test]
    fn it_reports_an_unclosed_block() {
        let (program, errors) = parse("if (true) { 1");
        assert_eq!(
            vec!["expected token '}', got 'end-of-input' instead".to_owned()],
            errors
        );
        assert!(program.statements.is_empty());
    }

    #[test]
    fn it_requires_identifiers_as_parameters() {
        let (_, errors) = parse("fn(1) { 1 }");
        assert_eq!(
            "expected token 'identifier', got 'int' instead",
            errors[0]
        );
    }

    #[test]
    fn it_reports_unclosed_parenthesis() {
        let (_, errors) = parse("(1 + 2");
        assert_eq!(
            vec!["expected token ')', got 'end-of-input' instead".to_owned()],
            errors
        );
    }

    #[test]
    fn it_surfaces_the_lexer_diagnostic() {
        let (program, errors) = parse("let s = \"oops");
        assert_eq!(vec!["unterminated string \"oops".to_owned()], errors);
        assert!(program.statements.is_empty());

        let (_, errors) = parse("1 + #");
        assert_eq!(vec!["illegal character '#'".to_owned()], errors);
    }

    #[test]
    fn it_can_parse_an_empty_program() {
        assert!(parse_ok("").statements.is_empty());
        assert!(parse_ok("   \n\t").statements.is_empty());
    }

    #[test]
    fn it_can_parse_from_a_token_vector() {
        let tokens = super::super::tokenize("1 + 2");
        let (program, errors) = Parser::new(tokens.into_iter()).parse_program();
        assert!(errors.is_empty());
        assert_eq!("(1 + 2)", program.to_string());
    }
}
