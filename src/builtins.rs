//! Standard template functions.
//!
//! Booleans are written as `True` / `False` and read case-insensitively, so
//! the output of `$Equal(...)` feeds straight into `$If(...)`.

use std::fmt::{self, Write as _};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use evalexpr::Value;
use regex::Regex;
use tracing::warn;

use crate::error::{BoxError, BuiltinError};
use crate::registry::{Arity, FunctionRegistry};

/// Widest result `PadLeft` / `PadRight` will produce
const MAX_PAD_WIDTH: usize = 1 << 16;

type Builtin = fn(&[String]) -> Result<String, BoxError>;

const BUILTINS: &[(&str, usize, Builtin)] = &[
    ("If", 3, if_true),
    ("IfNot", 3, if_false),
    ("IfBlank", 3, if_blank),
    ("IfNotBlank", 3, if_not_blank),
    ("Equal", 2, equal),
    ("NotEqual", 2, not_equal),
    ("Index", 2, index),
    ("LastIndex", 2, last_index),
    ("Length", 1, length),
    ("RegexMatch", 2, regex_match),
    ("RegexReplace", 3, regex_replace),
    ("PadLeft", 3, pad_left),
    ("PadRight", 3, pad_right),
    ("Substring", 3, substring),
    ("Trim", 1, trim),
    ("TrimStart", 1, trim_start),
    ("TrimEnd", 1, trim_end),
    ("DateTime", 2, date_time),
    ("DateTimeNow", 1, date_time_now),
    ("Env", 1, env),
    ("Calc", 1, calc),
];

pub(crate) fn install(registry: &mut FunctionRegistry) {
    for &(name, arity, function) in BUILTINS {
        registry.register(name, Arity::Exact(arity), function);
    }
}

fn bool_text(value: bool) -> String {
    let text = if value { "True" } else { "False" };
    text.to_string()
}

fn parse_bool(args: &[String], index: usize) -> Result<bool, BuiltinError> {
    let value = args[index].trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(BuiltinError::NotBoolean {
            position: index + 1,
            value: args[index].clone(),
        })
    }
}

fn parse_count(args: &[String], index: usize) -> Result<usize, BuiltinError> {
    args[index]
        .trim()
        .parse()
        .map_err(|_| BuiltinError::NotInteger {
            position: index + 1,
            value: args[index].clone(),
        })
}

fn parse_char(args: &[String], index: usize) -> Result<char, BuiltinError> {
    let mut chars = args[index].chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(BuiltinError::NotChar {
            position: index + 1,
            value: args[index].clone(),
        }),
    }
}

fn choose(condition: bool, args: &[String]) -> String {
    if condition { args[1].clone() } else { args[2].clone() }
}

fn if_true(args: &[String]) -> Result<String, BoxError> {
    Ok(choose(parse_bool(args, 0)?, args))
}

fn if_false(args: &[String]) -> Result<String, BoxError> {
    Ok(choose(!parse_bool(args, 0)?, args))
}

fn if_blank(args: &[String]) -> Result<String, BoxError> {
    Ok(choose(args[0].trim().is_empty(), args))
}

fn if_not_blank(args: &[String]) -> Result<String, BoxError> {
    Ok(choose(!args[0].trim().is_empty(), args))
}

fn equal(args: &[String]) -> Result<String, BoxError> {
    Ok(bool_text(args[0] == args[1]))
}

fn not_equal(args: &[String]) -> Result<String, BoxError> {
    Ok(bool_text(args[0] != args[1]))
}

/// Character index of a byte offset
fn char_index(haystack: &str, byte: Option<usize>) -> String {
    match byte {
        Some(byte) => haystack[..byte].chars().count().to_string(),
        None => "-1".to_string(),
    }
}

fn index(args: &[String]) -> Result<String, BoxError> {
    Ok(char_index(&args[0], args[0].find(args[1].as_str())))
}

fn last_index(args: &[String]) -> Result<String, BoxError> {
    Ok(char_index(&args[0], args[0].rfind(args[1].as_str())))
}

fn length(args: &[String]) -> Result<String, BoxError> {
    Ok(args[0].chars().count().to_string())
}

fn regex_match(args: &[String]) -> Result<String, BoxError> {
    let pattern = Regex::new(&args[1]).map_err(BuiltinError::from)?;
    Ok(bool_text(pattern.is_match(&args[0])))
}

fn regex_replace(args: &[String]) -> Result<String, BoxError> {
    let pattern = Regex::new(&args[1]).map_err(BuiltinError::from)?;
    Ok(pattern.replace_all(&args[0], args[2].as_str()).into_owned())
}

fn padding(args: &[String]) -> Result<String, BoxError> {
    let width = parse_count(args, 1)?;
    if width > MAX_PAD_WIDTH {
        return Err(BuiltinError::TooWide {
            width,
            limit: MAX_PAD_WIDTH,
        }
        .into());
    }
    let fill = parse_char(args, 2)?;
    let missing = width.saturating_sub(args[0].chars().count());
    Ok(std::iter::repeat_n(fill, missing).collect())
}

fn pad_left(args: &[String]) -> Result<String, BoxError> {
    Ok(padding(args)? + &args[0])
}

fn pad_right(args: &[String]) -> Result<String, BoxError> {
    Ok(args[0].clone() + &padding(args)?)
}

/// `$Substring(value, start, length)`, with the length clamped to the end
fn substring(args: &[String]) -> Result<String, BoxError> {
    let start = parse_count(args, 1)?;
    let count = parse_count(args, 2)?;
    let length = args[0].chars().count();
    if start > length {
        return Err(BuiltinError::OutOfRange { start, length }.into());
    }
    Ok(args[0].chars().skip(start).take(count).collect())
}

fn trim(args: &[String]) -> Result<String, BoxError> {
    Ok(args[0].trim().to_string())
}

fn trim_start(args: &[String]) -> Result<String, BoxError> {
    Ok(args[0].trim_start().to_string())
}

fn trim_end(args: &[String]) -> Result<String, BoxError> {
    Ok(args[0].trim_end().to_string())
}

/// Write a chrono `format(...)` result, catching invalid format strings
fn write_formatted(formatted: impl fmt::Display, format: &str) -> Result<String, BoxError> {
    let mut output = String::new();
    write!(output, "{formatted}").map_err(|_| BuiltinError::InvalidFormat {
        format: format.to_string(),
    })?;
    Ok(output)
}

fn date_time(args: &[String]) -> Result<String, BoxError> {
    let (value, format) = (args[0].trim(), args[1].as_str());

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return write_formatted(parsed.format(format), format);
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| BuiltinError::InvalidDateTime {
            value: args[0].clone(),
        })?;
    write_formatted(naive.format(format), format)
}

fn date_time_now(args: &[String]) -> Result<String, BoxError> {
    write_formatted(Local::now().format(&args[0]), &args[0])
}

fn env(args: &[String]) -> Result<String, BoxError> {
    let value = std::env::var(&args[0]).unwrap_or_default();
    if value.trim().is_empty() {
        warn!(variable = %args[0], "environment variable is empty");
    }
    Ok(value)
}

/// `$Calc(expression)`, e.g. `$Calc(<Build> + 100)`
fn calc(args: &[String]) -> Result<String, BoxError> {
    let expression = args[0].trim();
    let value = evalexpr::eval(expression).map_err(|err| BuiltinError::Calc {
        expression: expression.to_string(),
        message: err.to_string(),
    })?;
    match value {
        Value::Boolean(value) => Ok(bool_text(value)),
        Value::String(value) => Ok(value),
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::FunctionSource;

    fn call(name: &str, args: &[&str]) -> Result<String, String> {
        let registry = FunctionRegistry::with_builtins();
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        registry
            .call(name, &args)
            .expect("builtin should exist")
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_if() {
        assert_eq!(call("If", &["True", "yes", "no"]).unwrap(), "yes");
        assert_eq!(call("if", &[" false ", "yes", "no"]).unwrap(), "no");
        assert_eq!(call("IfNot", &["TRUE", "yes", "no"]).unwrap(), "no");
        assert_eq!(
            call("If", &["maybe", "yes", "no"]).unwrap_err(),
            "argument 1 must be true or false, got \"maybe\""
        );
    }

    #[test]
    fn test_if_blank() {
        assert_eq!(call("IfBlank", &["  ", "empty", "full"]).unwrap(), "empty");
        assert_eq!(call("IfNotBlank", &["x", "full", "empty"]).unwrap(), "full");
    }

    #[test]
    fn test_equal_feeds_if() {
        assert_eq!(call("Equal", &["main", "main"]).unwrap(), "True");
        assert_eq!(call("NotEqual", &["main", "main"]).unwrap(), "False");
    }

    #[test]
    fn test_index() {
        assert_eq!(call("Index", &["feature/x/y", "/"]).unwrap(), "7");
        assert_eq!(call("LastIndex", &["feature/x/y", "/"]).unwrap(), "9");
        assert_eq!(call("Index", &["abc", "z"]).unwrap(), "-1");
        assert_eq!(call("Index", &["ééx", "x"]).unwrap(), "2");
    }

    #[test]
    fn test_length() {
        assert_eq!(call("Length", &["héllo"]).unwrap(), "5");
    }

    #[test]
    fn test_regex() {
        assert_eq!(call("RegexMatch", &["release/1.2", r"^release/\d"]).unwrap(), "True");
        assert_eq!(
            call("RegexReplace", &["feature/ABC-12", r"^feature/(\w+)-(\d+)$", "$1.$2"]).unwrap(),
            "ABC.12"
        );
        assert!(call("RegexMatch", &["x", "("]).is_err());
    }

    #[test]
    fn test_pad() {
        assert_eq!(call("PadLeft", &["7", "4", "0"]).unwrap(), "0007");
        assert_eq!(call("PadRight", &["ab", "4", "."]).unwrap(), "ab..");
        assert_eq!(call("PadLeft", &["12345", "3", "0"]).unwrap(), "12345");
        assert!(call("PadLeft", &["7", "four", "0"]).is_err());
        assert_eq!(
            call("PadLeft", &["7", "4", "00"]).unwrap_err(),
            "argument 3 must be a single character, got \"00\""
        );
    }

    #[test]
    fn test_pad_rejects_huge_width() {
        assert_eq!(
            call("PadLeft", &["7", "18446744073709551615", "0"]).unwrap_err(),
            "width 18446744073709551615 exceeds the limit of 65536"
        );
        assert!(call("PadRight", &["7", "65537", "0"]).is_err());
        assert_eq!(call("PadRight", &["", "65536", "x"]).unwrap().len(), 65536);
    }

    #[test]
    fn test_substring() {
        assert_eq!(call("Substring", &["abcdef", "1", "3"]).unwrap(), "bcd");
        assert_eq!(call("Substring", &["abcdef", "4", "10"]).unwrap(), "ef");
        assert_eq!(call("Substring", &["abc", "3", "1"]).unwrap(), "");
        assert!(call("Substring", &["abc", "4", "1"]).is_err());
    }

    #[test]
    fn test_trim() {
        assert_eq!(call("Trim", &["  a  "]).unwrap(), "a");
        assert_eq!(call("TrimStart", &["  a  "]).unwrap(), "a  ");
        assert_eq!(call("TrimEnd", &["  a  "]).unwrap(), "  a");
    }

    #[test]
    fn test_date_time() {
        assert_eq!(
            call("DateTime", &["2024-03-05T10:20:30+02:00", "%Y%m%d.%H%M"]).unwrap(),
            "20240305.1020"
        );
        assert_eq!(call("DateTime", &["2024-03-05 10:20:30", "%y.%j"]).unwrap(), "24.065");
        assert_eq!(call("DateTime", &["2024-03-05", "%d/%m"]).unwrap(), "05/03");
        assert!(call("DateTime", &["yesterday", "%Y"]).is_err());
    }

    #[test]
    fn test_date_time_rejects_bad_format() {
        assert_eq!(
            call("DateTime", &["2024-03-05", "%Q"]).unwrap_err(),
            "invalid date/time format \"%Q\""
        );
    }

    #[test]
    fn test_date_time_now() {
        let year = call("DateTimeNow", &["%Y"]).unwrap();
        assert_eq!(year.len(), 4);
    }

    #[test]
    fn test_env_missing_is_empty() {
        assert_eq!(call("Env", &["VERFMT_SURELY_UNSET_VARIABLE"]).unwrap(), "");
    }

    #[test]
    fn test_calc() {
        assert_eq!(call("Calc", &["37 + 100"]).unwrap(), "137");
        assert_eq!(call("Calc", &[" (1 + 2) * 3 "]).unwrap(), "9");
        assert_eq!(call("Calc", &["7 % 4"]).unwrap(), "3");
        assert_eq!(call("Calc", &["3 > 2"]).unwrap(), "True");
    }

    #[test]
    fn test_calc_rejects_bad_expression() {
        let err = call("Calc", &["1 +"]).unwrap_err();
        assert!(err.starts_with("cannot evaluate \"1 +\": "), "{err}");
    }

    #[test]
    fn test_every_builtin_is_registered() {
        let registry = FunctionRegistry::with_builtins();
        for (name, arity, _) in BUILTINS {
            assert_eq!(registry.arity(name), Some(Arity::Exact(*arity)));
        }
    }
}
