//! Compact "operation + arguments" encoding
//!
//! A verb string names the data source operation to run on a cache miss:
//! `"<operation>[:<arg>[,<arg>...]]"`, where an argument containing `|` is a
//! list. `"paginate:15,id|name"` is `paginate` with `15` and `[id, name]`.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

const OPERATION_SEPARATOR: char = ':';
const ARGUMENT_SEPARATOR: char = ',';
const LIST_SEPARATOR: char = '|';

/// Verb used when the caller does not name one
pub const DEFAULT_VERB: &str = "get";

/// One positional argument of a verb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerbArg {
    Scalar(String),
    List(Vec<String>),
}

impl VerbArg {
    /// The scalar text, if this is a scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VerbArg::Scalar(s) => Some(s),
            VerbArg::List(_) => None,
        }
    }

    /// The scalar parsed as an unsigned integer
    pub fn as_u64(&self) -> Option<u64> {
        self.as_str().and_then(|s| s.trim().parse().ok())
    }

    /// The argument as a list; a scalar becomes a one-element list
    pub fn to_list(&self) -> Vec<String> {
        match self {
            VerbArg::Scalar(s) => vec![s.clone()],
            VerbArg::List(items) => items.clone(),
        }
    }
}

impl fmt::Display for VerbArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbArg::Scalar(s) => write!(f, "{}", s),
            VerbArg::List(items) => write!(f, "{}", items.join("|")),
        }
    }
}

/// Parsed call descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verb {
    pub operation: String,
    pub arguments: Vec<VerbArg>,
}

impl Verb {
    /// Parse a verb string. Never fails: whether the operation exists is for
    /// the data source to decide.
    pub fn parse(input: &str) -> Self {
        let (operation, rest) = match input.split_once(OPERATION_SEPARATOR) {
            Some((operation, rest)) => (operation, Some(rest)),
            None => (input, None),
        };

        let arguments = match rest {
            Some(rest) if !rest.is_empty() => rest
                .split(ARGUMENT_SEPARATOR)
                .map(|piece| {
                    if piece.contains(LIST_SEPARATOR) {
                        VerbArg::List(piece.split(LIST_SEPARATOR).map(str::to_string).collect())
                    } else {
                        VerbArg::Scalar(piece.to_string())
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            operation: operation.trim().to_string(),
            arguments,
        }
    }

    /// Argument at `index`, if present
    pub fn arg(&self, index: usize) -> Option<&VerbArg> {
        self.arguments.get(index)
    }
}

impl Default for Verb {
    fn default() -> Self {
        Self::parse(DEFAULT_VERB)
    }
}

impl FromStr for Verb {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation)?;
        if !self.arguments.is_empty() {
            let args: Vec<String> = self.arguments.iter().map(ToString::to_string).collect();
            write!(f, "{}{}", OPERATION_SEPARATOR, args.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar_and_list_arguments() {
        let verb = Verb::parse("paginate:15,foo|bar");

        assert_eq!(verb.operation, "paginate");
        assert_eq!(
            verb.arguments,
            vec![
                VerbArg::Scalar("15".to_string()),
                VerbArg::List(vec!["foo".to_string(), "bar".to_string()]),
            ]
        );
        assert_eq!(verb.arg(0).and_then(VerbArg::as_u64), Some(15));
    }

    #[test]
    fn test_parse_without_arguments() {
        let verb = Verb::parse("get");
        assert_eq!(verb.operation, "get");
        assert!(verb.arguments.is_empty());

        let verb = Verb::parse("first:");
        assert_eq!(verb.operation, "first");
        assert!(verb.arguments.is_empty());
    }

    #[test]
    fn test_parse_splits_on_first_colon_only() {
        let verb = Verb::parse("where:time,12:30");
        assert_eq!(verb.operation, "where");
        assert_eq!(verb.arguments.len(), 2);
        assert_eq!(verb.arg(1).and_then(VerbArg::as_str), Some("12:30"));
    }

    #[test]
    fn test_parse_keeps_unknown_operations() {
        let verb: Verb = "definitely_not_real:1".parse().unwrap();
        assert_eq!(verb.operation, "definitely_not_real");
    }

    #[test]
    fn test_display_reencodes() {
        let verb = Verb::parse("paginate:15,foo|bar");
        assert_eq!(verb.to_string(), "paginate:15,foo|bar");
        assert_eq!(Verb::default().to_string(), "get");
    }

    #[test]
    fn test_verb_arg_to_list() {
        assert_eq!(VerbArg::Scalar("id".to_string()).to_list(), vec!["id".to_string()]);
        assert_eq!(VerbArg::List(vec!["a".into(), "b".into()]).as_u64(), None);
    }
}
