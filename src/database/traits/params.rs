//! Bound statement parameters.
//!
//! Parameters are always handed to the engine separately from the SQL text.
//! Postgres, MySQL and DuckDB take positional parameters; ClickHouse takes
//! named ones (`{name:Type}` in the query).

use anyhow::{bail, Result};

use super::row::Value;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl Params {
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Named(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Positional(values) => values.is_empty(),
            Self::Named(values) => values.is_empty(),
        }
    }

    /// Positional values, for `$N` and `?` engines.
    pub fn as_positional(&self) -> Result<&[Value]> {
        match self {
            Self::None => Ok(&[]),
            Self::Positional(values) => Ok(values),
            Self::Named(_) => bail!("named parameters are not supported here; use positional parameters"),
        }
    }

    /// Named values, for `{name:Type}` engines.
    pub fn as_named(&self) -> Result<&[(String, Value)]> {
        match self {
            Self::None => Ok(&[]),
            Self::Named(values) => Ok(values),
            Self::Positional(_) => bail!("positional parameters are not supported here; use named parameters"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_checks() {
        let positional = Params::positional([1i64, 2]);
        assert_eq!(positional.as_positional().unwrap().len(), 2);
        assert!(positional.as_named().is_err());

        let named = Params::named([("id", 7i64)]);
        assert_eq!(named.as_named().unwrap()[0].0, "id");
        assert!(named.as_positional().is_err());

        assert!(Params::None.as_positional().unwrap().is_empty());
        assert!(Params::None.as_named().unwrap().is_empty());
        assert!(Params::None.is_empty());
    }
}
