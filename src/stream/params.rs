//! `key=value;key=value` parameter strings and the routing key they carry.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::HalError;

/// Key carrying the routing device id.
pub const KEY_ROUTING: &str = "routing";

/// A parsed parameter string.
///
/// Pairs are separated by `;`. A pair without `=` is a key with an empty
/// value. Pairs are kept sorted by key and a repeated key keeps its last value.
///
/// # Example
///
/// ```
/// use tiny_audio_hal::stream::AudioParameter;
///
/// let mut param = AudioParameter::parse("routing=2;screen_state=on");
/// assert_eq!(param.get_int("routing"), Some(2));
///
/// param.remove("screen_state");
/// assert_eq!(param.to_string(), "routing=2");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioParameter {
    pairs: BTreeMap<String, String>,
}

impl AudioParameter {
    /// Parses a parameter string.
    pub fn parse(s: &str) -> Self {
        let pairs = s
            .split(';')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect();

        Self { pairs }
    }

    /// Returns the raw value of a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    /// Returns the value of a key as an integer.
    ///
    /// `None` if the key is absent or its value has no leading integer.
    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(parse_c_int)
    }

    /// Sets a key to a string value.
    pub fn add(&mut self, key: &str, value: &str) {
        self.pairs.insert(key.to_string(), value.to_string());
    }

    /// Sets a key to an integer value.
    pub fn add_int(&mut self, key: &str, value: i32) {
        self.pairs.insert(key.to_string(), value.to_string());
    }

    /// Removes a key, returning `true` if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.pairs.remove(key).is_some()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.keys().map(String::as_str)
    }
}

impl std::fmt::Display for AudioParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Parses the leading decimal integer of `s` the way `sscanf("%d")` does.
///
/// Leading whitespace and a sign are accepted and parsing stops at the first
/// non-digit, so `010` is ten and `0x20` is zero. Out-of-range values
/// saturate and then wrap to `int`.
fn parse_c_int(s: &str) -> Option<i32> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    let mut any = false;
    for d in digits.bytes().map_while(|b| b.is_ascii_digit().then(|| b - b'0')) {
        any = true;
        value = value.saturating_mul(10).saturating_add(i64::from(d));
    }
    if !any {
        return None;
    }

    let value = if negative { -value } else { value };
    #[allow(clippy::cast_possible_truncation)]
    Some(value as i32)
}

/// Routing device id of a stream and the parameter protocol that sets it.
///
/// The id is not guarded by the stream lock: a parameter call may race with a
/// write, and each side sees either the old or the new id.
#[derive(Debug, Default)]
pub struct RoutingParameters {
    device: AtomicI32,
}

impl RoutingParameters {
    /// Current routing device id.
    pub fn device(&self) -> i32 {
        self.device.load(Ordering::Relaxed)
    }

    /// Applies a parameter string.
    ///
    /// A valid `routing` key is applied immediately and consumed. If any other
    /// key remains, the call fails with `BadValue` and the routing change
    /// stays applied.
    pub fn set_parameters(&self, key_value_pairs: &str) -> Result<(), HalError> {
        tracing::debug!(params = key_value_pairs, "set_parameters");
        let mut param = AudioParameter::parse(key_value_pairs);

        if let Some(device) = param.get_int(KEY_ROUTING) {
            self.device.store(device, Ordering::Relaxed);
            param.remove(KEY_ROUTING);
        }

        if param.is_empty() {
            Ok(())
        } else {
            Err(HalError::bad_value(format!(
                "unsupported parameters: {param}"
            )))
        }
    }

    /// Answers a parameter query.
    ///
    /// Every requested key is echoed back; only `routing` gets a value.
    pub fn get_parameters(&self, keys: &str) -> String {
        let mut param = AudioParameter::parse(keys);

        if param.get(KEY_ROUTING).is_some() {
            param.add_int(KEY_ROUTING, self.device());
        }

        let reply = param.to_string();
        tracing::debug!(reply = %reply, "get_parameters");
        reply
    }
}
