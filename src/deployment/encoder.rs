//! Contract creation payload: compiled bytecode followed by the ABI encoded
//! constructor arguments.

use crate::{bytecode, ClientError, Error, ServerError};
use ethabi::{param_type::Reader, Address, ParamType, Token, Uint};
use serde_json::Value;

/// Builds the init code (hex, no `0x` prefix) deploying `bytecode` with the
/// given constructor arguments.
pub fn build_init_code(
    constructor_signature: &str,
    constructor_arguments: &[Value],
    bytecode: &str,
) -> Result<String, Error> {
    let code = bytecode::without_prefix(bytecode);
    if hex::decode(code).is_err() {
        return Err(ServerError::InvalidCompiledBytecode(code.to_string()).into());
    }

    let params = parse_constructor(constructor_signature)?;
    if params.len() != constructor_arguments.len() {
        return Err(ClientError::InvalidConstructorArguments(format!(
            "constructor expects {} arguments, {} given",
            params.len(),
            constructor_arguments.len()
        ))
        .into());
    }
    let tokens = params
        .iter()
        .zip(constructor_arguments)
        .enumerate()
        .map(|(i, (param, value))| {
            tokenize(param, value).map_err(|err| {
                ClientError::InvalidConstructorArguments(format!("argument {i}: {err}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format!("{code}{}", hex::encode(ethabi::encode(&tokens))))
}

/// Parameter types of a constructor written the way it appears in source
/// code, e.g. `constructor(uint256 a, address payable b) public`.
///
/// An empty string means a constructor without parameters.
pub fn parse_constructor(signature: &str) -> Result<Vec<ParamType>, ClientError> {
    let invalid = |reason: &str| ClientError::InvalidConstructor {
        signature: signature.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = signature.trim();
    if trimmed.is_empty() {
        return Ok(vec![]);
    }
    let rest = trimmed
        .strip_prefix("constructor")
        .unwrap_or(trimmed)
        .trim_start();
    if !rest.starts_with('(') {
        return Err(invalid("expected parameter list"));
    }
    let close = matching_paren(rest).ok_or_else(|| invalid("unbalanced parentheses"))?;
    parse_params(&rest[1..close]).map_err(|reason| invalid(&reason))
}

/// Index of the parenthesis closing the one `s` starts with.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

fn parse_params(list: &str) -> Result<Vec<ParamType>, String> {
    if list.trim().is_empty() {
        return Ok(vec![]);
    }
    split_top_level(list)
        .into_iter()
        .map(|param| parse_param(param.trim()))
        .collect()
}

/// Parses a single parameter declaration, dropping its name and any
/// data location or `payable` keywords.
fn parse_param(param: &str) -> Result<ParamType, String> {
    if param.is_empty() {
        return Err("empty parameter".to_string());
    }

    let tuple_body = param.strip_prefix("tuple").unwrap_or(param).trim_start();
    if tuple_body.starts_with('(') {
        let close = matching_paren(tuple_body)
            .ok_or_else(|| format!("unbalanced parentheses in '{param}'"))?;
        let components = parse_params(&tuple_body[1..close])?;
        let after = &tuple_body[close + 1..];
        let suffix_len = after
            .find(char::is_whitespace)
            .unwrap_or(after.len());
        return wrap_arrays(ParamType::Tuple(components), &after[..suffix_len]);
    }

    let ty = param
        .split_whitespace()
        .next()
        .ok_or_else(|| "empty parameter".to_string())?;
    let ty = match ty.strip_prefix("byte") {
        // `byte` is an alias of `bytes1`
        Some(rest) if rest.is_empty() || rest.starts_with('[') => format!("bytes1{rest}"),
        _ => ty.to_string(),
    };
    let param = Reader::read(&ty).map_err(|err| match user_defined_type(&ty) {
        Some(name) => format!(
            "'{name}' is not an ABI elementary type; declare contracts and interfaces as \
             'address' and enums as 'uint8'"
        ),
        None => format!("invalid type '{ty}': {err}"),
    })?;
    if !has_valid_sizes(&param) {
        return Err(format!("invalid type '{ty}'"));
    }
    Ok(param)
}

/// Name of a contract, interface, enum or struct type, possibly qualified
/// (`Lib.Kind`) and followed by array suffixes.
fn user_defined_type(ty: &str) -> Option<&str> {
    let name = &ty[..ty.find('[').unwrap_or(ty.len())];
    let is_identifier = |part: &str| {
        part.chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic() || c == '_' || c == '$')
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    };
    name.split('.').all(is_identifier).then_some(name)
}

fn has_valid_sizes(param: &ParamType) -> bool {
    match param {
        ParamType::Uint(size) | ParamType::Int(size) => {
            *size > 0 && *size <= 256 && size % 8 == 0
        }
        ParamType::FixedBytes(size) => *size > 0 && *size <= 32,
        ParamType::Array(inner) | ParamType::FixedArray(inner, _) => has_valid_sizes(inner),
        ParamType::Tuple(components) => components.iter().all(has_valid_sizes),
        _ => true,
    }
}

/// Applies array suffixes like `[]` or `[2][]` to `inner`.
fn wrap_arrays(mut inner: ParamType, mut suffix: &str) -> Result<ParamType, String> {
    while !suffix.is_empty() {
        let close = match (suffix.starts_with('['), suffix.find(']')) {
            (true, Some(close)) => close,
            _ => return Err(format!("invalid array suffix '{suffix}'")),
        };
        let size = &suffix[1..close];
        inner = if size.is_empty() {
            ParamType::Array(Box::new(inner))
        } else {
            let size = size
                .parse::<usize>()
                .map_err(|_| format!("invalid array size '{size}'"))?;
            ParamType::FixedArray(Box::new(inner), size)
        };
        suffix = &suffix[close + 1..];
    }
    Ok(inner)
}

/// Converts a JSON value into a token of the given type.
fn tokenize(param: &ParamType, value: &Value) -> Result<Token, String> {
    let mismatch = || format!("cannot convert {value} to {param}");
    match param {
        ParamType::Address => {
            let s = value.as_str().ok_or_else(mismatch)?;
            let bytes = decode_hex(s).ok_or_else(mismatch)?;
            if bytes.len() != Address::len_bytes() {
                return Err(mismatch());
            }
            Ok(Token::Address(Address::from_slice(&bytes)))
        }
        ParamType::Bytes => {
            let s = value.as_str().ok_or_else(mismatch)?;
            Ok(Token::Bytes(decode_hex(s).ok_or_else(mismatch)?))
        }
        ParamType::FixedBytes(size) => {
            let s = value.as_str().ok_or_else(mismatch)?;
            let bytes = decode_hex(s).ok_or_else(mismatch)?;
            if bytes.len() != *size {
                return Err(format!("expected {size} bytes, found {}", bytes.len()));
            }
            Ok(Token::FixedBytes(bytes))
        }
        ParamType::Uint(size) => {
            let (negative, abs) = parse_integer(value).ok_or_else(mismatch)?;
            if negative || abs.bits() > *size {
                return Err(format!("{value} is out of range for {param}"));
            }
            Ok(Token::Uint(abs))
        }
        ParamType::Int(size) => {
            let (negative, abs) = parse_integer(value).ok_or_else(mismatch)?;
            let limit = Uint::one() << (size - 1);
            let in_range = if negative { abs <= limit } else { abs < limit };
            if !in_range {
                return Err(format!("{value} is out of range for {param}"));
            }
            // two's complement over the whole 256-bit word
            let word = if negative {
                (!abs).overflowing_add(Uint::one()).0
            } else {
                abs
            };
            Ok(Token::Int(word))
        }
        ParamType::Bool => match value {
            Value::Bool(b) => Ok(Token::Bool(*b)),
            Value::String(s) if s == "true" => Ok(Token::Bool(true)),
            Value::String(s) if s == "false" => Ok(Token::Bool(false)),
            _ => Err(mismatch()),
        },
        ParamType::String => Ok(Token::String(
            value.as_str().ok_or_else(mismatch)?.to_string(),
        )),
        ParamType::Array(inner) => {
            let items = value.as_array().ok_or_else(mismatch)?;
            Ok(Token::Array(tokenize_all(inner, items)?))
        }
        ParamType::FixedArray(inner, size) => {
            let items = value.as_array().ok_or_else(mismatch)?;
            if items.len() != *size {
                return Err(format!("expected {size} items, found {}", items.len()));
            }
            Ok(Token::FixedArray(tokenize_all(inner, items)?))
        }
        ParamType::Tuple(components) => {
            let items = value.as_array().ok_or_else(mismatch)?;
            if items.len() != components.len() {
                return Err(format!(
                    "expected {} tuple components, found {}",
                    components.len(),
                    items.len()
                ));
            }
            components
                .iter()
                .zip(items)
                .map(|(component, item)| tokenize(component, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Token::Tuple)
        }
    }
}

fn tokenize_all(param: &ParamType, items: &[Value]) -> Result<Vec<Token>, String> {
    items.iter().map(|item| tokenize(param, item)).collect()
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).ok()
}

/// Accepts JSON integers, decimal strings and `0x` prefixed hex strings.
/// Returns the sign and the absolute value.
fn parse_integer(value: &Value) -> Option<(bool, Uint)> {
    match value {
        Value::Number(n) => {
            if let Some(n) = n.as_u64() {
                Some((false, Uint::from(n)))
            } else {
                n.as_i64().map(|n| (n < 0, Uint::from(n.unsigned_abs())))
            }
        }
        Value::String(s) => {
            let s = s.trim();
            let (negative, digits) = match s.strip_prefix('-') {
                Some(digits) => (true, digits),
                None => (false, s),
            };
            let abs = match digits.strip_prefix("0x") {
                Some(hex) => Uint::from_str_radix(hex, 16).ok()?,
                None => Uint::from_dec_str(digits).ok()?,
            };
            Some((negative && !abs.is_zero(), abs))
        }
        _ => None,
    }
}
