//! Canonical, filename-safe rendering of an [`OperationSet`].
//!
//! Cached variants of a source file are stored as
//! `my_horse.thumbnail+width-100-height-100.jpg`, so every variant of a source
//! can be found (and batch deleted) by its base name.

use serde::{Deserialize, Serialize};

use crate::error::{ImagineError, Result};
use crate::models::OperationSet;

/// Characters that are invalid in file names on at least one common
/// platform, plus whitespace and control characters.
fn is_filename_safe(c: char) -> bool {
    !c.is_control()
        && !c.is_whitespace()
        && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

fn unsafe_char(token: &str) -> Option<char> {
    token.chars().find(|c| !is_filename_safe(*c))
}

/// Delimiters used by [`serialize`].
///
/// Names and values must never contain any of these, otherwise two different
/// operation sets could render to the same string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Separators {
    /// Between two operations.
    pub operations: String,
    /// Between an operation name and its parameter list.
    pub params: String,
    /// Between two `name-value` parameter pairs.
    pub pairs: String,
    /// Between a parameter name and its value.
    pub value: String,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            operations: ".".to_string(),
            params: "+".to_string(),
            pairs: "-".to_string(),
            value: "-".to_string(),
        }
    }
}

impl Separators {
    pub fn validate(&self) -> Result<()> {
        for (label, separator) in self.labelled() {
            if separator.is_empty() {
                return Err(ImagineError::InvalidInput(format!(
                    "{} separator must not be empty",
                    label
                )));
            }
            if let Some(c) = unsafe_char(separator) {
                return Err(ImagineError::InvalidInput(format!(
                    "{} separator contains {:?}, which is not allowed in file names",
                    label, c
                )));
            }
        }
        Ok(())
    }

    fn labelled(&self) -> [(&'static str, &str); 4] {
        [
            ("operations", self.operations.as_str()),
            ("params", self.params.as_str()),
            ("pairs", self.pairs.as_str()),
            ("value", self.value.as_str()),
        ]
    }

    fn guard(&self, kind: &str, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(ImagineError::InvalidInput(format!("empty {}", kind)));
        }
        if let Some(c) = unsafe_char(token) {
            return Err(ImagineError::InvalidInput(format!(
                "{} `{}` contains {:?}, which is not allowed in file names",
                kind,
                token.escape_debug(),
                c
            )));
        }
        if token == "." || token == ".." {
            return Err(ImagineError::InvalidInput(format!(
                "{} `{}` is a relative path component",
                kind, token
            )));
        }
        if let Some((label, separator)) = self
            .labelled()
            .into_iter()
            .find(|(_, separator)| token.contains(separator))
        {
            return Err(ImagineError::InvalidInput(format!(
                "{} `{}` contains the {} separator `{}`",
                kind, token, label, separator
            )));
        }
        Ok(())
    }
}

/// Renders `operations` in insertion order, e.g.
/// `thumbnail+width-200-height-150.sharpen+amount-2`.
pub fn serialize(operations: &OperationSet, separators: &Separators) -> Result<String> {
    separators.validate()?;

    let mut rendered = Vec::with_capacity(operations.len());
    for (name, params) in operations.iter() {
        separators.guard("operation name", name)?;

        let mut tokens = Vec::with_capacity(params.len());
        for (key, value) in params {
            let value = value.to_string();
            separators.guard("parameter name", key)?;
            separators.guard("parameter value", &value)?;
            tokens.push(format!("{}{}{}", key, separators.value, value));
        }

        if tokens.is_empty() {
            rendered.push(name.to_string());
        } else {
            rendered.push(format!(
                "{}{}{}",
                name,
                separators.params,
                tokens.join(&separators.pairs)
            ));
        }
    }

    Ok(rendered.join(&separators.operations))
}

/// md5 of the canonical string, for callers that want fixed-width names.
pub fn serialize_hashed(operations: &OperationSet, separators: &Separators) -> Result<String> {
    let canonical = serialize(operations, separators)?;
    if canonical.is_empty() {
        return Ok(canonical);
    }
    Ok(format!("{:x}", md5::compute(canonical.as_bytes())))
}

/// Suffixes `base` with the canonical string, before its extension.
pub fn variant_file_name(
    base: &str,
    operations: &OperationSet,
    separators: &Separators,
) -> Result<String> {
    if base.is_empty() || unsafe_char(base).is_some() || base == "." || base == ".." {
        return Err(ImagineError::InvalidInput(format!(
            "`{}` is not a plain file name",
            base
        )));
    }

    let canonical = serialize(operations, separators)?;
    if canonical.is_empty() {
        return Ok(base.to_string());
    }

    match base.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => {
            Ok(format!("{}.{}.{}", stem, canonical, extension))
        }
        _ => Ok(format!("{}.{}", base, canonical)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::params;

    fn thumbnail() -> OperationSet {
        OperationSet::new().with("thumbnail", params([("width", 200), ("height", 150)]))
    }

    #[test]
    fn renders_regression_anchor() {
        let out = serialize(&thumbnail(), &Separators::default()).unwrap();
        assert_eq!(out, "thumbnail+width-200-height-150");
    }

    #[test]
    fn joins_operations_in_order() {
        let ops = thumbnail().with("sharpen", params([("amount", 2)]));
        let out = serialize(&ops, &Separators::default()).unwrap();
        assert_eq!(out, "thumbnail+width-200-height-150.sharpen+amount-2");

        let reversed = OperationSet::new()
            .with("sharpen", params([("amount", 2)]))
            .with("thumbnail", params([("width", 200), ("height", 150)]));
        assert_ne!(serialize(&reversed, &Separators::default()).unwrap(), out);
    }

    #[test]
    fn operation_without_params_is_bare_name() {
        let ops = OperationSet::new()
            .with("grayscale", params(Vec::<(String, i64)>::new()))
            .with("flip", params([("axis", "x")]));
        let out = serialize(&ops, &Separators::default()).unwrap();
        assert_eq!(out, "grayscale.flip+axis-x");
    }

    #[test]
    fn custom_separators() {
        let separators = Separators {
            operations: "~".into(),
            params: "_".into(),
            pairs: ",".into(),
            value: "=".into(),
        };
        let out = serialize(&thumbnail(), &separators).unwrap();
        assert_eq!(out, "thumbnail_width=200,height=150");
    }

    #[test]
    fn rejects_separator_collisions() {
        let ops = OperationSet::new().with("crop", params([("offset", -5)]));
        assert!(matches!(
            serialize(&ops, &Separators::default()),
            Err(ImagineError::InvalidInput(_))
        ));

        let ops = OperationSet::new().with("my.op", params([("a", 1)]));
        assert!(matches!(
            serialize(&ops, &Separators::default()),
            Err(ImagineError::InvalidInput(_))
        ));

        let ops = OperationSet::new().with("op", params([("", 1)]));
        assert!(serialize(&ops, &Separators::default()).is_err());
    }

    #[test]
    fn rejects_characters_invalid_in_file_names() {
        let separators = Separators::default();
        for value in ["a/b", "a\\b", "c:d", "x*", "what?", "a b", "nul\0", "<i>", "\"q\""] {
            let ops = OperationSet::new().with("thumbnail", params([("mode", value)]));
            assert!(
                matches!(serialize(&ops, &separators), Err(ImagineError::InvalidInput(_))),
                "{:?} was accepted",
                value
            );
        }

        let ops = OperationSet::new().with("thumb/nail", params([("width", 1)]));
        assert!(serialize(&ops, &separators).is_err());
    }

    #[test]
    fn custom_separators_do_not_allow_traversal() {
        let separators = Separators {
            operations: "~".into(),
            params: "_".into(),
            pairs: ",".into(),
            value: "=".into(),
        };
        let ops = OperationSet::new().with("thumbnail", params([("mode", "../../../etc/cron")]));
        assert!(variant_file_name("my_horse.jpg", &ops, &separators).is_err());

        let ops = OperationSet::new().with("thumbnail", params([("mode", "..")]));
        assert!(serialize(&ops, &separators).is_err());
    }

    #[test]
    fn rejects_unsafe_separator() {
        let separators = Separators {
            operations: "/".into(),
            ..Separators::default()
        };
        assert!(matches!(separators.validate(), Err(ImagineError::InvalidInput(_))));
    }

    #[test]
    fn rejects_empty_separator() {
        let separators = Separators {
            pairs: String::new(),
            ..Separators::default()
        };
        assert!(matches!(
            serialize(&thumbnail(), &separators),
            Err(ImagineError::InvalidInput(_))
        ));
    }

    #[test]
    fn hashed_form_is_md5_hex() {
        let out = serialize_hashed(&thumbnail(), &Separators::default()).unwrap();
        assert_eq!(out.len(), 32);
        assert!(out.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(serialize_hashed(&OperationSet::new(), &Separators::default()).unwrap(), "");
    }

    #[test]
    fn variant_names() {
        let separators = Separators::default();
        let ops = OperationSet::new().with("thumbnail", params([("width", 100), ("height", 100)]));
        assert_eq!(
            variant_file_name("my_horse.jpg", &ops, &separators).unwrap(),
            "my_horse.thumbnail+width-100-height-100.jpg"
        );
        assert_eq!(
            variant_file_name("README", &ops, &separators).unwrap(),
            "README.thumbnail+width-100-height-100"
        );
        assert_eq!(
            variant_file_name("my_horse.jpg", &OperationSet::new(), &separators).unwrap(),
            "my_horse.jpg"
        );
        assert!(variant_file_name("../etc/passwd", &ops, &separators).is_err());
    }
}
