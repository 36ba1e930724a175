//! Parameter maps.

use serde_json::{Map, Value};

/// A string-keyed JSON object: the universal shape for query parameters,
/// request bodies and resource records.
pub type Params = Map<String, Value>;

/// Builds a [`Params`] map from key/value pairs.
pub fn params<I, K>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Returns `base` with every entry of `overlay` applied on top.
///
/// Overlay entries win on key collisions.
pub fn merged(base: &Params, overlay: &Params) -> Params {
    let mut out = base.clone();
    for (k, v) in overlay {
        out.insert(k.clone(), v.clone());
    }
    out
}
