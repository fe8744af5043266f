use log::debug;

use super::{
    BlockStatement, Env, Environment, Expr, Function, Object, Program, Stmt, TokenKind, NULL,
};

/// Hands `$value` straight back to the caller if it interrupts evaluation,
/// i.e. if it is an `Object::Error` or an `Object::ReturnValue` on its way to
/// the nearest call boundary. Otherwise evaluates to `$value`.
macro_rules! propagate {
    ($value:expr) => {{
        let value = $value;
        if is_abrupt(&value) {
            return value;
        }
        value
    }};
}

fn is_abrupt(value: &Object) -> bool {
    matches!(value, Object::Error(_) | Object::ReturnValue(_))
}

/// Calls nested deeper than this fail with `maximum call depth exceeded`.
pub const MAX_CALL_DEPTH: usize = 5_000;

/// Stack size for a thread that evaluates programs. Leaves room for
/// `MAX_CALL_DEPTH` nested calls even in unoptimized builds.
pub const STACK_SIZE: usize = 256 * 1024 * 1024;

fn error(message: String) -> Object {
    debug!("runtime error: {}", message);
    Object::Error(message)
}

/// Evaluates programs against one long-lived root environment, so bindings
/// made by one program are visible to the next.
#[derive(Debug)]
pub struct Interpreter {
    environment: Env,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    #[must_use]
    pub fn new() -> Self {
        Interpreter {
            environment: Environment::new(),
        }
    }

    #[must_use]
    pub fn with_environment(environment: Env) -> Self {
        Interpreter { environment }
    }

    #[must_use]
    pub fn environment(&self) -> &Env {
        &self.environment
    }

    pub fn interpret(&mut self, program: &Program) -> Object {
        evaluate(program, &self.environment)
    }
}

/// Evaluates `program` in `env` and returns the value of its last statement.
///
/// A top-level `return` ends the program with the returned value. The first
/// runtime error ends it with that `Object::Error`.
#[must_use]
pub fn evaluate(program: &Program, env: &Env) -> Object {
    let mut result = NULL;

    for statement in &program.statements {
        result = eval_statement(statement, env, 0);

        if let Object::ReturnValue(value) = result {
            return *value;
        }
        if result.is_error() {
            return result;
        }
    }

    result
}

// Unlike `evaluate`, a block leaves `ReturnValue` wrapped so the signal
// reaches the enclosing call.
fn eval_block(block: &BlockStatement, env: &Env, depth: usize) -> Object {
    let mut result = NULL;

    for statement in &block.statements {
        result = eval_statement(statement, env, depth);

        if is_abrupt(&result) {
            return result;
        }
    }

    result
}

// `depth` is the number of calls in progress.
fn eval_statement(statement: &Stmt, env: &Env, depth: usize) -> Object {
    match statement {
        Stmt::Let(name, value) => {
            let value = propagate!(eval_expression(value, env, depth));
            env.borrow_mut().set(name.clone(), value);
            NULL
        }
        Stmt::Return(value) => {
            let value = propagate!(eval_expression(value, env, depth));
            Object::ReturnValue(Box::new(value))
        }
        Stmt::Expression(expr) => eval_expression(expr, env, depth),
    }
}

fn eval_expression(expr: &Expr, env: &Env, depth: usize) -> Object {
    match expr {
        Expr::Identifier(name) => eval_identifier(name, env),
        Expr::Integer(i) => Object::Integer(*i),
        Expr::String(s) => Object::String(s.clone()),
        Expr::Boolean(b) => Object::from(*b),
        Expr::Prefix(operator, right) => {
            let right = propagate!(eval_expression(right, env, depth));
            eval_prefix(*operator, right)
        }
        Expr::Infix(left, operator, right) => {
            let left = propagate!(eval_expression(left, env, depth));
            let right = propagate!(eval_expression(right, env, depth));
            eval_infix(*operator, &left, &right)
        }
        Expr::If(condition, consequence, alternative) => {
            let condition = propagate!(eval_expression(condition, env, depth));

            if condition.is_truthy() {
                eval_block(consequence, env, depth)
            } else if let Some(alternative) = alternative {
                eval_block(alternative, env, depth)
            } else {
                NULL
            }
        }
        Expr::Function(literal) => Object::Function(Function::new(literal, env)),
        Expr::Call(function, arguments) => {
            let function = match propagate!(eval_expression(function, env, depth)) {
                Object::Function(f) => f,
                other => return error(format!("not a function: {}", other.type_name())),
            };

            let mut values = Vec::with_capacity(arguments.len());
            for argument in arguments {
                values.push(propagate!(eval_expression(argument, env, depth)));
            }

            apply_function(&function, values, depth)
        }
    }
}

fn eval_identifier(name: &str, env: &Env) -> Object {
    let value = env.borrow().get(name);
    value.unwrap_or_else(|| error(format!("identifier not found: {}", name)))
}

fn eval_prefix(operator: TokenKind, right: Object) -> Object {
    match operator {
        TokenKind::Bang => Object::from(!right.is_truthy()),
        TokenKind::Minus => match right {
            Object::Integer(i) => Object::Integer(i.wrapping_neg()),
            other => error(format!("invalid operation: -{}", other.type_name())),
        },
        _ => error(format!(
            "invalid operation: {}{}",
            operator,
            right.type_name()
        )),
    }
}

/// Two integers get arithmetic and comparison. Any other pair only supports
/// `==` and `!=`, which compare the truthiness of each side.
fn eval_infix(operator: TokenKind, left: &Object, right: &Object) -> Object {
    if let (Object::Integer(l), Object::Integer(r)) = (left, right) {
        return eval_integer_infix(operator, *l, *r);
    }

    match operator {
        TokenKind::EqualEqual => Object::from(left.is_truthy() == right.is_truthy()),
        TokenKind::BangEqual => Object::from(left.is_truthy() != right.is_truthy()),
        _ => error(format!(
            "invalid operation: {} {} {}",
            left.type_name(),
            operator,
            right.type_name()
        )),
    }
}

// Arithmetic wraps on overflow.
fn eval_integer_infix(operator: TokenKind, left: i64, right: i64) -> Object {
    match operator {
        TokenKind::Plus => Object::Integer(left.wrapping_add(right)),
        TokenKind::Minus => Object::Integer(left.wrapping_sub(right)),
        TokenKind::Star => Object::Integer(left.wrapping_mul(right)),
        TokenKind::Slash => {
            if right == 0 {
                error("division by zero".to_owned())
            } else {
                Object::Integer(left.wrapping_div(right))
            }
        }
        TokenKind::Less => Object::from(left < right),
        TokenKind::Greater => Object::from(left > right),
        TokenKind::EqualEqual => Object::from(left == right),
        TokenKind::BangEqual => Object::from(left != right),
        _ => error(format!("invalid operation: INTEGER {} INTEGER", operator)),
    }
}

/// Calls `function` with `arguments` in a fresh frame whose parent is the
/// frame the function was defined in, not the caller's.
fn apply_function(function: &Function, arguments: Vec<Object>, depth: usize) -> Object {
    if arguments.len() != function.arity() {
        return error(format!(
            "wrong number of arguments: expected {}, got {}",
            function.arity(),
            arguments.len()
        ));
    }

    if depth >= MAX_CALL_DEPTH {
        return error("maximum call depth exceeded".to_owned());
    }

    let frame = Environment::enclosed(&function.env);
    {
        let mut frame = frame.borrow_mut();
        for (parameter, argument) in function.parameters().iter().zip(arguments) {
            frame.set(parameter.clone(), argument);
        }
    }

    let result = match eval_block(function.body(), &frame, depth + 1) {
        Object::ReturnValue(value) => *value,
        other => other,
    };

    Environment::release(frame);
    result
}
