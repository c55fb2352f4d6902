//! Parsing of operation specs from request query parameters.
//!
//! Each query pair is one operation: `thumbnail=width|200;height|150`. The pair
//! named after the token parameter carries the previously issued token.

use serde::{Deserialize, Serialize};

use crate::error::{ImagineError, Result};
use crate::models::{OperationSet, ParamValue, Params};

pub const DEFAULT_TOKEN_PARAM: &str = "hash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySyntax {
    /// Between two `name|value` segments.
    pub pair_separator: String,
    /// Between a parameter name and its value.
    pub value_separator: String,
}

impl Default for QuerySyntax {
    fn default() -> Self {
        Self {
            pair_separator: ";".to_string(),
            value_separator: "|".to_string(),
        }
    }
}

/// Parses `width|200;height|150` into ordered, typed parameters.
///
/// Segments without a value (`width`, `width|`) are skipped.
pub fn parse_param_list(raw: &str, syntax: &QuerySyntax) -> Result<Params> {
    if syntax.pair_separator.is_empty() || syntax.value_separator.is_empty() {
        return Err(ImagineError::Config("query separators must not be empty".into()));
    }

    let mut params = Params::new();
    for segment in raw.split(syntax.pair_separator.as_str()) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let mut parts = segment.split(syntax.value_separator.as_str());
        let name = parts.next().unwrap_or_default().trim();
        let value = match parts.next() {
            Some(value) => value.trim(),
            None => {
                tracing::debug!("Skipping parameter `{}` without value", segment);
                continue;
            }
        };

        if parts.next().is_some() {
            return Err(ImagineError::Parse(format!(
                "segment `{}` has more than one `{}`",
                segment, syntax.value_separator
            )));
        }
        if name.is_empty() {
            return Err(ImagineError::Parse(format!(
                "segment `{}` has no parameter name",
                segment
            )));
        }
        if value.is_empty() {
            tracing::debug!("Skipping parameter `{}` without value", name);
            continue;
        }

        params.insert(name.to_string(), ParamValue::parse_lossless(value));
    }

    Ok(params)
}

/// Builds an [`OperationSet`] from query pairs in request order, ignoring the
/// token parameter.
pub fn parse_query<K, V>(pairs: &[(K, V)], token_param: &str, syntax: &QuerySyntax) -> Result<OperationSet>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut operations = OperationSet::new();
    for (name, raw) in pairs {
        let name = name.as_ref().trim();
        if name == token_param {
            continue;
        }
        if name.is_empty() {
            return Err(ImagineError::Parse("operation name is empty".into()));
        }
        let params = parse_param_list(raw.as_ref(), syntax)?;
        operations.insert(name, params);
    }
    Ok(operations)
}

/// Value of the token parameter; an empty value counts as absent.
pub fn find_token<'a, K, V>(pairs: &'a [(K, V)], token_param: &str) -> Option<&'a str>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .iter()
        .rev()
        .find(|(name, _)| name.as_ref().trim() == token_param)
        .map(|(_, value)| value.as_ref().trim())
        .filter(|value| !value.is_empty())
}
