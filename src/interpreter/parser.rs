use std::fmt;
use std::rc::Rc;

use super::error::Error;
use crate::ast::{Binding, Expr, LambdaExpr, Param};
use crate::diagnostic::{Diagnostic, Label, Span};
use crate::lexer::Lexer;
use crate::token::{op, Kind, Token};

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub expected: Vec<String>,
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: Vec::new(),
            found: None,
        }
    }

    pub fn with_expected(mut self, expected: Vec<String>) -> Self {
        self.expected = expected;
        self
    }

    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut message = self.message.clone();
        if !self.expected.is_empty() {
            message = format!("expected {}", self.expected.join(" or "));
            if let Some(found) = &self.found {
                message.push_str(&format!(", found `{found}`"));
            }
        }

        let mut diagnostic = Diagnostic::error(message)
            .with_code("E0201")
            .with_label(Label::primary(self.span, ""));

        if self.expected.len() == 1 {
            diagnostic = diagnostic.with_help(format!("expected {} here", self.expected[0]));
        }

        diagnostic
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

type PResult<T> = Result<T, Error>;

/// Recursive-descent, precedence-climbing parser. Consumes lexemes
/// straight off the tokenizer's one-token lookahead and produces one
/// AST per program: a block of semicolon-separated expressions.
pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self { lexer: Lexer::new(source) }
    }

    fn peek(&mut self) -> PResult<Token> {
        Ok(self.lexer.peek()?)
    }

    fn next(&mut self) -> PResult<Token> {
        Ok(self.lexer.next()?)
    }

    fn eof(&mut self) -> PResult<bool> {
        Ok(self.lexer.eof()?)
    }

    /// Consumes the next token, which must carry exactly `literal`.
    fn eat(&mut self, literal: &str) -> PResult<Token> {
        let token = self.peek()?;
        if token.is_eof() {
            return Err(self.unexpected_eof(Some(literal)));
        }
        if token.text() != literal {
            return Err(ParseError::new(
                format!("Expected the literal `{literal}` but instead got `{}`", token.text()),
                token.span(),
            )
            .with_expected(vec![format!("`{literal}`")])
            .with_found(token.text())
            .into());
        }
        self.next()
    }

    fn unexpected_eof(&self, expected: Option<&str>) -> Error {
        let offset = self.lexer.position().offset;
        let mut err = ParseError::new("Unexpected end of input!", Span::new(offset, offset + 1));
        if let Some(literal) = expected {
            err = err.with_expected(vec![format!("`{literal}`")]);
        }
        err.into()
    }

    /// Parses the entire stream: expression (`;` expression)* into one
    /// top-level block, the separator optional before end of input.
    pub fn parse(&mut self) -> PResult<Expr> {
        let mut body = Vec::new();
        while !self.eof()? {
            body.push(self.expression()?);
            if !self.eof()? {
                self.eat(";")?;
            }
        }
        Ok(Expr::Block { body })
    }

    /// A single top-level form.
    pub fn expression(&mut self) -> PResult<Expr> {
        let expr = self.group()?;
        self.postfix(expr)
    }

    /// Entry into the precedence chain; a leading operator token means
    /// a unary position, handled at the atom level.
    fn group(&mut self) -> PResult<Expr> {
        if self.peek()?.kind_is(Kind::Operator) {
            self.atom()
        } else {
            self.assign()
        }
    }

    /// Applies trailing call/index forms: `expr(args)` and `expr[idx]`,
    /// repeating as long as either follows.
    fn postfix(&mut self, mut expr: Expr) -> PResult<Expr> {
        loop {
            let token = self.peek()?;
            if token.validate(Kind::Punctuation, &["("]) {
                let args = self.circumscribed("(", ",", ")", Self::expression)?;
                expr = Expr::Call { target: Box::new(expr), args };
            } else if token.validate(Kind::Punctuation, &["["]) {
                self.eat("[")?;
                let idx = self.expression()?;
                self.eat("]")?;
                expr = Expr::Index { body: Box::new(expr), idx: Box::new(idx) };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Parses a `prefix`-opened, `infix`-separated, `suffix`-closed
    /// sequence, applying `parser` to each element. A trailing
    /// separator before the suffix is tolerated.
    fn circumscribed<T>(
        &mut self,
        prefix: &str,
        infix: &str,
        suffix: &str,
        parser: fn(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        let mut nodes = Vec::new();
        let mut first = true;
        self.eat(prefix)?;
        while !self.eof()? {
            if self.peek()?.validate(Kind::Punctuation, &[suffix]) {
                break;
            }
            if first {
                first = false;
            } else {
                self.eat(infix)?;
            }
            if self.peek()?.validate(Kind::Punctuation, &[suffix]) {
                break;
            }
            nodes.push(parser(self)?);
        }
        self.eat(suffix)?;
        Ok(nodes)
    }

    fn atom(&mut self) -> PResult<Expr> {
        let token = self.peek()?;
        let expr = if token.validate(Kind::Punctuation, &["("]) {
            self.next()?;
            let inner = self.expression()?;
            self.eat(")")?;
            inner
        } else if token.validate(Kind::Punctuation, &["{"]) {
            self.block()?
        } else if token.validate(Kind::Punctuation, &["["]) {
            self.vector()?
        } else if token.validate(Kind::Punctuation, &["|"]) {
            self.lambda()?
        } else if token.validate(Kind::Keyword, &["if"]) {
            self.conditional()?
        } else if token.validate(Kind::Keyword, &["let"]) {
            self.variable()?
        } else if token.validate(Kind::Keyword, &["fn"]) {
            self.next()?;
            self.lambda()?
        } else if token.validate(Kind::Operator, &[op::NOT, op::NEG]) {
            self.unary()?
        } else {
            let token = self.next()?;
            if token.is_eof() {
                return Err(self.unexpected_eof(None));
            }
            if token.kind_in(&[Kind::Boolean, Kind::Number, Kind::String, Kind::Symbol]) {
                Expr::Literal(token)
            } else if token.kind_is(Kind::Reference) {
                Expr::Reference(token)
            } else {
                return Err(ParseError::new(
                    format!("Unable to parse `{}`", token.text()),
                    token.span(),
                )
                .with_found(token.text())
                .into());
            }
        };
        self.postfix(expr)
    }

    /// Prefix `!`/`-` desugar at parse time into a binary against a
    /// synthetic literal: `!x` is `false == x`, `-x` is `0 - x`.
    fn unary(&mut self) -> PResult<Expr> {
        let token = self.next()?;
        let operand = self.atom()?;
        let (operator, left) = if token.text() == op::NOT {
            (op::EQ, Expr::Literal(Token::synthetic_false(token.position)))
        } else {
            (op::MINUS, Expr::Literal(Token::synthetic_number(0.0, token.position)))
        };
        Ok(Expr::Binary {
            operator: Rc::from(operator),
            left: Box::new(left),
            right: Box::new(operand),
        })
    }

    /// `{` expr (`;` expr)* `}` — empty yields the canonical false
    /// literal, a single expression collapses to itself.
    fn block(&mut self) -> PResult<Expr> {
        let position = self.peek()?.position;
        let mut body = self.circumscribed("{", ";", "}", Self::expression)?;
        Ok(match body.len() {
            0 => Expr::Literal(Token::synthetic_false(position)),
            1 => body.remove(0),
            _ => Expr::Block { body },
        })
    }

    fn vector(&mut self) -> PResult<Expr> {
        let body = self.circumscribed("[", ",", "]", Self::expression)?;
        Ok(Expr::Vector { body })
    }

    /// `if` cond [`then`] then-expr [`else` else-expr] — the `then`
    /// keyword is elided when the then-branch opens a block.
    fn conditional(&mut self) -> PResult<Expr> {
        self.eat("if")?;
        let cond = self.expression()?;
        if !self.peek()?.validate(Kind::Punctuation, &["{"]) {
            self.eat("then")?;
        }
        let then = self.expression()?;
        let otherwise = if self.peek()?.validate(Kind::Keyword, &["else"]) {
            self.next()?;
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise,
        })
    }

    /// `let [name] ( binding,* ) [in] body`. With a leading name this
    /// is sugar for an immediately-applied self-referencing lambda;
    /// otherwise a genuine variable node.
    fn variable(&mut self) -> PResult<Expr> {
        self.eat("let")?;

        if self.peek()?.kind_is(Kind::Reference) {
            let name: Rc<str> = Rc::from(self.next()?.text());
            let defs = self.circumscribed("(", ",", ")", Self::binding)?;
            if self.peek()?.validate(Kind::Keyword, &["in"]) {
                self.next()?;
            }
            let body = self.expression()?;
            let fallback = self.lexer.synthetic_false();
            let params = defs
                .iter()
                .map(|def| Param { name: def.name.clone(), annotation: def.annotation.clone() })
                .collect();
            let args = defs
                .into_iter()
                .map(|def| def.init.unwrap_or_else(|| Expr::Literal(fallback.clone())))
                .collect();
            return Ok(Expr::Call {
                target: Box::new(Expr::Lambda(Rc::new(LambdaExpr {
                    name: Some(name),
                    params,
                    body,
                }))),
                args,
            });
        }

        let bindings = self.circumscribed("(", ",", ")", Self::binding)?;
        if self.peek()?.validate(Kind::Keyword, &["in"]) {
            self.next()?;
        }
        let body = self.expression()?;
        Ok(Expr::Variable { bindings, body: Box::new(body) })
    }

    /// `name [: type] [= initializer]`
    fn binding(&mut self) -> PResult<Binding> {
        let token = self.next()?;
        if token.is_eof() {
            return Err(self.unexpected_eof(None));
        }
        if !token.kind_is(Kind::Reference) {
            return Err(ParseError::new(
                "Binding names must be unbound symbols!",
                token.span(),
            )
            .with_found(token.text())
            .into());
        }
        let name: Rc<str> = Rc::from(token.text());
        let annotation = self.annotation()?;
        let init = if self.peek()?.validate(Kind::Operator, &[op::DEF]) {
            self.next()?;
            Some(self.expression()?)
        } else {
            None
        };
        Ok(Binding { name, annotation, init })
    }

    /// Optional `: MetaType` suffix on parameters and bindings.
    fn annotation(&mut self) -> PResult<Option<Rc<str>>> {
        if !self.peek()?.validate(Kind::Punctuation, &[":"]) {
            return Ok(None);
        }
        self.next()?;
        let token = self.next()?;
        if !token.kind_is(Kind::MetaType) {
            return Err(ParseError::new(
                format!("Expected a builtin type name but instead got `{}`", token.text()),
                token.span(),
            )
            .with_found(token.text())
            .into());
        }
        Ok(Some(Rc::from(token.text())))
    }

    /// `[name] | param,* | body` — the body is a block when `{`
    /// follows, a single expression otherwise. A lambda immediately
    /// followed by `at` becomes a one-shot call.
    fn lambda(&mut self) -> PResult<Expr> {
        let name = if self.peek()?.kind_is(Kind::Reference) {
            Some(Rc::from(self.next()?.text()))
        } else {
            None
        };
        self.eat("|")?;
        let mut params = Vec::new();
        while !self.peek()?.validate(Kind::Punctuation, &["|"]) {
            let token = self.next()?;
            if token.is_eof() {
                return Err(self.unexpected_eof(Some("|")));
            }
            if !token.kind_is(Kind::Reference) {
                return Err(ParseError::new(
                    "Lambda parameters must be unbound symbols!",
                    token.span(),
                )
                .with_found(token.text())
                .into());
            }
            let annotation = self.annotation()?;
            params.push(Param { name: Rc::from(token.text()), annotation });
            if self.peek()?.validate(Kind::Punctuation, &[","]) {
                self.eat(",")?;
            }
        }
        self.eat("|")?;

        let body = if self.peek()?.validate(Kind::Punctuation, &["{"]) {
            self.block()?
        } else {
            self.expression()?
        };
        let lambda = Expr::Lambda(Rc::new(LambdaExpr { name, params, body }));

        if self.peek()?.validate(Kind::Keyword, &["at"]) {
            self.next()?;
            let args = self.circumscribed("(", ",", ")", Self::expression)?;
            return Ok(Expr::Call { target: Box::new(lambda), args });
        }
        Ok(lambda)
    }

    /// One shared left-fold implements every binary precedence level;
    /// the assignment level builds `Assign` nodes instead.
    fn fold_binary(
        &mut self,
        operand: fn(&mut Self) -> PResult<Expr>,
        ops: &[&str],
        is_assign: bool,
    ) -> PResult<Expr> {
        let mut expr = operand(self)?;
        loop {
            let token = self.peek()?;
            if !token.validate(Kind::Operator, ops) {
                return Ok(expr);
            }
            self.next()?;
            let right = operand(self)?;
            let operator: Rc<str> = Rc::from(token.text());
            expr = if is_assign {
                Expr::Assign {
                    operator,
                    left: Box::new(expr),
                    right: Box::new(right),
                }
            } else {
                Expr::Binary {
                    operator,
                    left: Box::new(expr),
                    right: Box::new(right),
                }
            };
        }
    }

    fn assign(&mut self) -> PResult<Expr> {
        self.fold_binary(Self::or, &[op::DEF, op::ASSIGN], true)
    }

    fn or(&mut self) -> PResult<Expr> {
        self.fold_binary(Self::and, &[op::OR], false)
    }

    fn and(&mut self) -> PResult<Expr> {
        self.fold_binary(Self::equality, &[op::AND], false)
    }

    fn equality(&mut self) -> PResult<Expr> {
        self.fold_binary(Self::compare, &[op::EQ, op::NEQ], false)
    }

    fn compare(&mut self) -> PResult<Expr> {
        self.fold_binary(Self::term, &[op::LT, op::LEQ, op::GT, op::GEQ], false)
    }

    fn term(&mut self) -> PResult<Expr> {
        self.fold_binary(Self::factor, &[op::PLUS, op::MINUS], false)
    }

    fn factor(&mut self) -> PResult<Expr> {
        self.fold_binary(Self::conc, &[op::TIMES, op::DIV, op::MOD], false)
    }

    /// Polymorphic list/string concatenation binds tighter than the
    /// multiplicative operators.
    fn conc(&mut self) -> PResult<Expr> {
        self.fold_binary(Self::atom, &[op::CONC], false)
    }
}

/// Parses a complete program into its top-level block.
pub fn parse(source: &str) -> Result<Expr, Error> {
    Parser::new(source).parse()
}
