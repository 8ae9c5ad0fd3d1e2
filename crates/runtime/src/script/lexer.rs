//! Tokenizer for closure bodies.

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
	Num(f64),
	Str(String),
	Ident(String),
	Punct(&'static str),
}

/// Longest punctuators first so `===` wins over `==` and `=`.
const PUNCTUATORS: &[&str] = &[
	"===", "!==", "==", "!=", "<=", ">=", "&&", "||", "(", ")", "{", "}", "[", "]", ",", ";", ".",
	":", "?", "+", "-", "*", "/", "%", "<", ">", "=", "!",
];

pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, String> {
	let chars: Vec<char> = src.chars().collect();
	let mut tokens = Vec::new();
	let mut i = 0;

	while i < chars.len() {
		let c = chars[i];

		if c.is_whitespace() {
			i += 1;
			continue;
		}

		if c == '/' && chars.get(i + 1) == Some(&'/') {
			while i < chars.len() && chars[i] != '\n' {
				i += 1;
			}
			continue;
		}

		if c == '/' && chars.get(i + 1) == Some(&'*') {
			i += 2;
			loop {
				if i + 1 >= chars.len() {
					return Err("unterminated comment".to_string());
				}
				if chars[i] == '*' && chars[i + 1] == '/' {
					i += 2;
					break;
				}
				i += 1;
			}
			continue;
		}

		if c == '"' || c == '\'' {
			let (text, next) = read_string(&chars, i)?;
			tokens.push(Token::Str(text));
			i = next;
			continue;
		}

		if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) {
			let start = i;
			while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
				i += 1;
			}
			if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
				i += 1;
				if i < chars.len() && (chars[i] == '+' || chars[i] == '-') {
					i += 1;
				}
				while i < chars.len() && chars[i].is_ascii_digit() {
					i += 1;
				}
			}
			let text: String = chars[start..i].iter().collect();
			let n = text
				.parse::<f64>()
				.map_err(|_| format!("invalid number literal '{text}'"))?;
			tokens.push(Token::Num(n));
			continue;
		}

		if is_ident_start(c) {
			let start = i;
			while i < chars.len() && is_ident_part(chars[i]) {
				i += 1;
			}
			tokens.push(Token::Ident(chars[start..i].iter().collect()));
			continue;
		}

		let rest: String = chars[i..chars.len().min(i + 3)].iter().collect();
		match PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) {
			Some(&p) => {
				tokens.push(Token::Punct(p));
				i += p.len();
			}
			None => return Err(format!("unexpected character '{c}'")),
		}
	}

	Ok(tokens)
}

fn read_string(chars: &[char], start: usize) -> Result<(String, usize), String> {
	let quote = chars[start];
	let mut out = String::new();
	let mut i = start + 1;

	while i < chars.len() {
		let c = chars[i];
		if c == quote {
			return Ok((out, i + 1));
		}
		if c == '\\' {
			let escaped = chars.get(i + 1).ok_or("unterminated string")?;
			match *escaped {
				'n' => out.push('\n'),
				't' => out.push('\t'),
				'r' => out.push('\r'),
				'0' => out.push('\0'),
				'u' => {
					let hex: String = chars.get(i + 2..i + 6).ok_or("bad unicode escape")?.iter().collect();
					let code = u32::from_str_radix(&hex, 16).map_err(|_| "bad unicode escape")?;
					out.push(char::from_u32(code).ok_or("bad unicode escape")?);
					i += 4;
				}
				other => out.push(other),
			}
			i += 2;
			continue;
		}
		out.push(c);
		i += 1;
	}

	Err("unterminated string".to_string())
}

pub(crate) fn is_ident_start(c: char) -> bool {
	c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_ident_part(c: char) -> bool {
	c.is_alphanumeric() || c == '_' || c == '$'
}

/// Returns true when `s` is a single identifier.
pub(crate) fn is_identifier(s: &str) -> bool {
	let mut chars = s.chars();
	chars.next().is_some_and(is_ident_start) && chars.all(is_ident_part)
}
