//! Label keys, label sets and name validation.
//!
//! A metric fixes its label keys at registration. Each observation supplies
//! one value per key, in key order; the ordered value tuple is the series key.
//! Label cardinality is controlled by the caller: every distinct value tuple
//! allocates a series that lives until process exit.

use std::fmt;
use std::sync::Arc;

use crate::error::{PaysimError, Result};

/// Validate a metric name against `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(PaysimError::InvalidArgument(format!("invalid metric name: {name:?}")))
    }
}

fn validate_label_key(key: &str) -> Result<()> {
    let mut chars = key.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !ok || key.starts_with("__") {
        return Err(PaysimError::InvalidArgument(format!("invalid label key: {key:?}")));
    }
    Ok(())
}

/// Label keys of one metric, fixed at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelKeys(Arc<[String]>);

impl LabelKeys {
    /// Validate and freeze a key list. `reserved` names keys the metric kind
    /// synthesizes itself (`le` for histograms).
    pub fn new(keys: &[&str], reserved: &[&str]) -> Result<Self> {
        for (i, k) in keys.iter().enumerate() {
            validate_label_key(k)?;
            if reserved.contains(k) {
                return Err(PaysimError::InvalidArgument(format!("label key {k:?} is reserved")));
            }
            if keys[..i].contains(k) {
                return Err(PaysimError::InvalidArgument(format!("label key {k:?} repeated")));
            }
        }
        Ok(Self(keys.iter().map(|k| k.to_string()).collect()))
    }

    pub fn empty() -> Self {
        Self(Arc::from(Vec::<String>::new()))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build the series key for one observation. Arity must match.
    pub(crate) fn series_key(&self, values: &[&str]) -> Result<Vec<String>> {
        if values.len() != self.0.len() {
            return Err(PaysimError::InvalidArgument(format!(
                "expected {} label values ({}), got {}",
                self.0.len(),
                self.0.join(","),
                values.len()
            )));
        }
        Ok(values.iter().map(|v| v.to_string()).collect())
    }

    /// Pair a series key back up with the key names.
    pub(crate) fn label_set(&self, values: &[String]) -> LabelSet {
        LabelSet(
            self.0
                .iter()
                .cloned()
                .zip(values.iter().cloned())
                .collect(),
        )
    }
}

/// Ordered `(key, value)` pairs identifying one series.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelSet(Vec<(String, String)>);

impl LabelSet {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Escape a label value for the text format.
pub(crate) fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

impl fmt::Display for LabelSet {
    /// Renders `k="v",k2="v2"` without surrounding braces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}=\"{}\"", k, escape_label(v))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn metric_names() {
        assert!(validate_metric_name("payment_requests_total").is_ok());
        assert!(validate_metric_name("ns:sub_metric").is_ok());
        assert!(validate_metric_name("9lives").is_err());
        assert!(validate_metric_name("has-dash").is_err());
        assert!(validate_metric_name("").is_err());
    }

    #[test]
    fn label_keys_reject_reserved_and_repeats() {
        assert!(LabelKeys::new(&["method", "status"], &[]).is_ok());
        assert!(LabelKeys::new(&["le"], &["le"]).is_err());
        assert!(LabelKeys::new(&["method", "method"], &[]).is_err());
        assert!(LabelKeys::new(&["__internal"], &[]).is_err());
        assert!(LabelKeys::new(&["bad key"], &[]).is_err());
    }

    #[test]
    fn series_key_checks_arity() {
        let keys = LabelKeys::new(&["method", "status"], &[]).unwrap();
        assert_eq!(keys.series_key(&["GET", "success"]).unwrap(), vec!["GET", "success"]);
        let err = keys.series_key(&["GET"]).unwrap_err();
        assert_eq!(err.client_code().as_str(), "INVALID_ARGUMENT");
    }

    #[test]
    fn label_set_display_escapes() {
        let set = LabelSet::from_pairs(&[("path", "a\"b\\c\nd"), ("m", "GET")]);
        assert_eq!(set.to_string(), r#"path="a\"b\\c\nd",m="GET""#);
        assert_eq!(set.get("m"), Some("GET"));
    }
}
