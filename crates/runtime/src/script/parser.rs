//! Recursive-descent parser producing the closure body AST.

use super::lexer::{Token, tokenize};
use crate::value::Value;

#[derive(Debug, Clone)]
pub(crate) enum Stmt {
	Return(Option<Expr>),
	Let(String, Option<Expr>),
	If(Expr, Box<Stmt>, Option<Box<Stmt>>),
	Block(Vec<Stmt>),
	Expr(Expr),
}

#[derive(Debug, Clone)]
pub(crate) enum Key {
	Name(String),
	Computed(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
	Not,
	Neg,
	TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	Eq,
	NotEq,
	StrictEq,
	StrictNotEq,
	Lt,
	LtEq,
	Gt,
	GtEq,
	And,
	Or,
}

#[derive(Debug, Clone)]
pub(crate) enum Expr {
	Literal(Value),
	Ident(String),
	This,
	Array(Vec<Expr>),
	Object(Vec<(String, Expr)>),
	Member(Box<Expr>, Key),
	Call(Box<Expr>, Vec<Expr>),
	Assign(Box<Expr>, Box<Expr>),
	Unary(UnaryOp, Box<Expr>),
	Binary(BinaryOp, Box<Expr>, Box<Expr>),
	Cond(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
	/// Whether the expression can appear on the left of `=`.
	pub(crate) fn is_place(&self) -> bool {
		matches!(self, Expr::Ident(_) | Expr::Member(..))
	}
}

/// Nesting limit for statements and expressions.
///
/// Every level of the resulting tree costs one, including each link of an
/// operator or member chain, so bodies that would exhaust the stack while
/// parsing, evaluating, or dropping are rejected up front.
pub(crate) const MAX_NESTING: usize = 256;

/// Parses a closure body into statements.
pub(crate) fn parse_body(src: &str) -> Result<Vec<Stmt>, String> {
	let tokens = tokenize(src)?;
	let mut parser = Parser {
		tokens,
		pos: 0,
		depth: 0,
	};
	let mut stmts = Vec::new();
	while !parser.at_end() {
		stmts.push(parser.statement()?);
	}
	Ok(stmts)
}

struct Parser {
	tokens: Vec<Token>,
	pos: usize,
	depth: usize,
}

impl Parser {
	fn at_end(&self) -> bool {
		self.pos >= self.tokens.len()
	}

	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos)
	}

	fn peek_punct(&self, p: &str) -> bool {
		matches!(self.peek(), Some(Token::Punct(q)) if *q == p)
	}

	fn peek_ident(&self, name: &str) -> bool {
		matches!(self.peek(), Some(Token::Ident(id)) if id == name)
	}

	fn eat_punct(&mut self, p: &str) -> bool {
		if self.peek_punct(p) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	fn expect_punct(&mut self, p: &str) -> Result<(), String> {
		if self.eat_punct(p) {
			Ok(())
		} else {
			Err(format!("expected '{p}', found {}", self.describe_next()))
		}
	}

	fn expect_ident(&mut self) -> Result<String, String> {
		match self.tokens.get(self.pos) {
			Some(Token::Ident(name)) => {
				let name = name.clone();
				self.pos += 1;
				Ok(name)
			}
			_ => Err(format!("expected identifier, found {}", self.describe_next())),
		}
	}

	fn describe_next(&self) -> String {
		match self.peek() {
			None => "end of input".to_string(),
			Some(Token::Num(n)) => format!("number {n}"),
			Some(Token::Str(s)) => format!("string {s:?}"),
			Some(Token::Ident(id)) => format!("'{id}'"),
			Some(Token::Punct(p)) => format!("'{p}'"),
		}
	}

	fn deepen(&mut self) -> Result<(), String> {
		if self.depth >= MAX_NESTING {
			return Err("expression nested too deeply".to_string());
		}
		self.depth += 1;
		Ok(())
	}

	/// Runs `f` one nesting level deeper.
	fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, String>) -> Result<T, String> {
		self.deepen()?;
		let result = f(self);
		self.depth -= 1;
		result
	}

	fn statement(&mut self) -> Result<Stmt, String> {
		self.nested(Self::statement_inner)
	}

	fn statement_inner(&mut self) -> Result<Stmt, String> {
		if self.eat_punct(";") {
			return Ok(Stmt::Block(Vec::new()));
		}

		if self.eat_punct("{") {
			let mut stmts = Vec::new();
			while !self.eat_punct("}") {
				if self.at_end() {
					return Err("unterminated block".to_string());
				}
				stmts.push(self.statement()?);
			}
			return Ok(Stmt::Block(stmts));
		}

		if self.peek_ident("return") {
			self.pos += 1;
			let value = if self.at_end() || self.peek_punct(";") || self.peek_punct("}") {
				None
			} else {
				Some(self.expression()?)
			};
			self.eat_punct(";");
			return Ok(Stmt::Return(value));
		}

		if self.peek_ident("var") || self.peek_ident("let") || self.peek_ident("const") {
			self.pos += 1;
			let name = self.expect_ident()?;
			let init = if self.eat_punct("=") {
				Some(self.expression()?)
			} else {
				None
			};
			self.eat_punct(";");
			return Ok(Stmt::Let(name, init));
		}

		if self.peek_ident("if") {
			self.pos += 1;
			self.expect_punct("(")?;
			let cond = self.expression()?;
			self.expect_punct(")")?;
			let then = Box::new(self.statement()?);
			let otherwise = if self.peek_ident("else") {
				self.pos += 1;
				Some(Box::new(self.statement()?))
			} else {
				None
			};
			return Ok(Stmt::If(cond, then, otherwise));
		}

		let expr = self.expression()?;
		self.eat_punct(";");
		Ok(Stmt::Expr(expr))
	}

	fn expression(&mut self) -> Result<Expr, String> {
		self.nested(Self::assignment)
	}

	fn assignment(&mut self) -> Result<Expr, String> {
		let lhs = self.conditional()?;
		if self.eat_punct("=") {
			if !lhs.is_place() {
				return Err("invalid assignment target".to_string());
			}
			let rhs = self.expression()?;
			return Ok(Expr::Assign(Box::new(lhs), Box::new(rhs)));
		}
		Ok(lhs)
	}

	fn conditional(&mut self) -> Result<Expr, String> {
		let cond = self.binary(0)?;
		if self.eat_punct("?") {
			let then = self.expression()?;
			self.expect_punct(":")?;
			let otherwise = self.expression()?;
			return Ok(Expr::Cond(Box::new(cond), Box::new(then), Box::new(otherwise)));
		}
		Ok(cond)
	}

	/// Precedence climbing over the binary operator table.
	fn binary(&mut self, min_prec: u8) -> Result<Expr, String> {
		let mut lhs = self.unary()?;
		let base = self.depth;
		loop {
			let Some((op, prec)) = self.peek_binary() else {
				break;
			};
			if prec < min_prec {
				break;
			}
			self.pos += 1;
			self.deepen()?;
			let rhs = self.binary(prec + 1)?;
			lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
		}
		self.depth = base;
		Ok(lhs)
	}

	fn peek_binary(&self) -> Option<(BinaryOp, u8)> {
		let Some(Token::Punct(p)) = self.peek() else {
			return None;
		};
		let entry = match *p {
			"||" => (BinaryOp::Or, 1),
			"&&" => (BinaryOp::And, 2),
			"==" => (BinaryOp::Eq, 3),
			"!=" => (BinaryOp::NotEq, 3),
			"===" => (BinaryOp::StrictEq, 3),
			"!==" => (BinaryOp::StrictNotEq, 3),
			"<" => (BinaryOp::Lt, 4),
			"<=" => (BinaryOp::LtEq, 4),
			">" => (BinaryOp::Gt, 4),
			">=" => (BinaryOp::GtEq, 4),
			"+" => (BinaryOp::Add, 5),
			"-" => (BinaryOp::Sub, 5),
			"*" => (BinaryOp::Mul, 6),
			"/" => (BinaryOp::Div, 6),
			"%" => (BinaryOp::Rem, 6),
			_ => return None,
		};
		Some(entry)
	}

	fn unary(&mut self) -> Result<Expr, String> {
		self.nested(Self::unary_inner)
	}

	fn unary_inner(&mut self) -> Result<Expr, String> {
		if self.eat_punct("!") {
			return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
		}
		if self.eat_punct("-") {
			return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
		}
		if self.eat_punct("+") {
			let operand = self.unary()?;
			return Ok(Expr::Binary(
				BinaryOp::Sub,
				Box::new(operand),
				Box::new(Expr::Literal(Value::from(0i64))),
			));
		}
		if self.peek_ident("typeof") {
			self.pos += 1;
			return Ok(Expr::Unary(UnaryOp::TypeOf, Box::new(self.unary()?)));
		}
		self.postfix()
	}

	fn postfix(&mut self) -> Result<Expr, String> {
		let mut expr = self.primary()?;
		let base = self.depth;
		loop {
			if self.peek_punct(".") || self.peek_punct("[") || self.peek_punct("(") {
				self.deepen()?;
			}
			if self.eat_punct(".") {
				let name = self.expect_ident()?;
				expr = Expr::Member(Box::new(expr), Key::Name(name));
			} else if self.eat_punct("[") {
				let index = self.expression()?;
				self.expect_punct("]")?;
				expr = Expr::Member(Box::new(expr), Key::Computed(Box::new(index)));
			} else if self.eat_punct("(") {
				let args = self.list(")")?;
				expr = Expr::Call(Box::new(expr), args);
			} else {
				self.depth = base;
				return Ok(expr);
			}
		}
	}

	/// Comma-separated expressions up to `close`; trailing comma allowed.
	fn list(&mut self, close: &str) -> Result<Vec<Expr>, String> {
		let mut items = Vec::new();
		while !self.eat_punct(close) {
			items.push(self.expression()?);
			if !self.eat_punct(",") {
				self.expect_punct(close)?;
				break;
			}
		}
		Ok(items)
	}

	fn primary(&mut self) -> Result<Expr, String> {
		let token = self.tokens.get(self.pos).cloned();
		let Some(token) = token else {
			return Err("unexpected end of input".to_string());
		};
		self.pos += 1;

		match token {
			Token::Num(n) => Ok(Expr::Literal(Value::from_f64(n))),
			Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
			Token::Ident(id) => Ok(match id.as_str() {
				"true" => Expr::Literal(Value::Bool(true)),
				"false" => Expr::Literal(Value::Bool(false)),
				"null" | "undefined" => Expr::Literal(Value::Null),
				"this" => Expr::This,
				"function" => return Err("nested functions are not supported".to_string()),
				_ => Expr::Ident(id),
			}),
			Token::Punct("(") => {
				let inner = self.expression()?;
				self.expect_punct(")")?;
				Ok(inner)
			}
			Token::Punct("[") => Ok(Expr::Array(self.list("]")?)),
			Token::Punct("{") => self.object_literal(),
			Token::Punct(p) => Err(format!("unexpected '{p}'")),
		}
	}

	fn object_literal(&mut self) -> Result<Expr, String> {
		let mut props = Vec::new();
		while !self.eat_punct("}") {
			let key = match self.tokens.get(self.pos).cloned() {
				Some(Token::Ident(id)) => id,
				Some(Token::Str(s)) => s,
				Some(Token::Num(n)) => Value::from_f64(n).to_display_string(),
				_ => return Err(format!("expected property name, found {}", self.describe_next())),
			};
			self.pos += 1;
			let value = if self.eat_punct(":") {
				self.expression()?
			} else {
				Expr::Ident(key.clone())
			};
			props.push((key, value));
			if !self.eat_punct(",") {
				self.expect_punct("}")?;
				break;
			}
		}
		Ok(Expr::Object(props))
	}
}
