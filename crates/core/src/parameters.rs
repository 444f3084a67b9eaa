//! Navigation parameters.
//!
//! [`NavigationParameters`] is an ordered multi-map: keys may repeat, lookups
//! scan front to back, and the textual form is a query string
//! (`?id=7&tag=a&tag=b`). Values are either scalars, which serialize, or
//! shared objects, which only travel in-process.
//!
//! # Lookup rules
//!
//! - [`NavigationParameters::get`] returns the first value stored under a key.
//! - [`NavigationParameters::get_all`] returns every value stored under a key,
//!   in insertion order.
//! - Keys compare case-sensitively.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Everything but the RFC 3986 unreserved characters is escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Query keys the navigation engine interprets itself.
pub mod keys {
    /// Adds a tab to a freshly created tab set. `Stack|Child` wraps the
    /// child in a stack.
    pub const CREATE_TAB: &str = "createTab";
    /// Selects the tab whose page type matches the value.
    pub const SELECTED_TAB: &str = "selectedTab";
    /// Forces (`true`) or forbids (`false`) a modal push for a segment.
    pub const USE_MODAL_NAVIGATION: &str = "useModalNavigation";
}

/// Direction of the navigation that produced a parameter bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationMode {
    /// Forward navigation to a new or reused page.
    New,
    /// A go-back.
    Back,
}

/// A single parameter value.
#[derive(Clone)]
pub enum ParameterValue {
    Text(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    /// Arbitrary in-process data, retrieved with
    /// [`NavigationParameters::get_object`].
    Object(Arc<dyn Any + Send + Sync>),
}

impl ParameterValue {
    /// Wraps an arbitrary value.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        ParameterValue::Object(Arc::new(value))
    }

    fn describe(&self) -> String {
        match self {
            ParameterValue::Text(text) => format!("text {:?}", text),
            ParameterValue::Bool(value) => format!("bool {}", value),
            ParameterValue::Integer(value) => format!("integer {}", value),
            ParameterValue::Float(value) => format!("float {}", value),
            ParameterValue::Object(_) => "an object".to_string(),
        }
    }
}

impl fmt::Debug for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ParameterValue::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            ParameterValue::Integer(value) => f.debug_tuple("Integer").field(value).finish(),
            ParameterValue::Float(value) => f.debug_tuple("Float").field(value).finish(),
            ParameterValue::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl PartialEq for ParameterValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParameterValue::Text(a), ParameterValue::Text(b)) => a == b,
            (ParameterValue::Bool(a), ParameterValue::Bool(b)) => a == b,
            (ParameterValue::Integer(a), ParameterValue::Integer(b)) => a == b,
            (ParameterValue::Float(a), ParameterValue::Float(b)) => a == b,
            (ParameterValue::Object(a), ParameterValue::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Objects serialize as an empty value.
impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Text(text) => f.write_str(text),
            ParameterValue::Bool(value) => write!(f, "{}", value),
            ParameterValue::Integer(value) => write!(f, "{}", value),
            ParameterValue::Float(value) => write!(f, "{}", value),
            ParameterValue::Object(_) => Ok(()),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Text(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::Text(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Integer(value)
    }
}

impl From<i32> for ParameterValue {
    fn from(value: i32) -> Self {
        ParameterValue::Integer(i64::from(value))
    }
}

impl From<u32> for ParameterValue {
    fn from(value: u32) -> Self {
        ParameterValue::Integer(i64::from(value))
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Float(value)
    }
}

/// Errors raised by typed parameter retrieval.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    /// The stored value can't be converted to the requested type.
    #[error("parameter '{key}' holds {found}, which is not a valid {expected}")]
    Conversion {
        key: String,
        expected: &'static str,
        found: String,
    },
}

/// Conversion from a stored value into a concrete type.
///
/// Text values are parsed, numbers widen or narrow when lossless, and
/// integers convert to booleans by comparing against zero.
pub trait FromParameter: Sized {
    fn from_parameter(value: &ParameterValue) -> Option<Self>;
}

impl FromParameter for String {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Object(_) => None,
            scalar => Some(scalar.to_string()),
        }
    }
}

impl FromParameter for bool {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Bool(value) => Some(*value),
            ParameterValue::Integer(value) => Some(*value != 0),
            ParameterValue::Text(text) => {
                let text = text.trim();
                if text.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if text.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            ParameterValue::Float(_) | ParameterValue::Object(_) => None,
        }
    }
}

macro_rules! integer_parameter {
    ($($ty:ty),*) => {
        $(
            impl FromParameter for $ty {
                fn from_parameter(value: &ParameterValue) -> Option<Self> {
                    match value {
                        ParameterValue::Integer(value) => <$ty>::try_from(*value).ok(),
                        ParameterValue::Bool(value) => Some(<$ty>::from(*value)),
                        ParameterValue::Text(text) => text.trim().parse().ok(),
                        ParameterValue::Float(value) if value.fract() == 0.0 => {
                            let value = *value;
                            if value >= <$ty>::MIN as f64 && value <= <$ty>::MAX as f64 {
                                Some(value as $ty)
                            } else {
                                None
                            }
                        }
                        ParameterValue::Float(_) | ParameterValue::Object(_) => None,
                    }
                }
            }
        )*
    };
}

integer_parameter!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromParameter for f64 {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Float(value) => Some(*value),
            ParameterValue::Integer(value) => Some(*value as f64),
            ParameterValue::Text(text) => text.trim().parse().ok(),
            ParameterValue::Bool(_) | ParameterValue::Object(_) => None,
        }
    }
}

impl FromParameter for f32 {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        f64::from_parameter(value).map(|value| value as f32)
    }
}

/// Ordered key/value pairs handed to lifecycle callbacks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationParameters {
    entries: Vec<(String, ParameterValue)>,
    mode: Option<NavigationMode>,
}

impl NavigationParameters {
    pub fn new() -> Self {
        NavigationParameters::default()
    }

    /// Parses a query string.
    ///
    /// A leading `?` is optional. Pairs are separated by `&`, the first `=`
    /// splits key from value, and both are percent-decoded. Pairs without
    /// `=` are skipped. Parsed values are always text.
    pub fn parse(query: &str) -> Self {
        let mut parameters = NavigationParameters::new();
        let query = query.strip_prefix('?').unwrap_or(query);

        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            parameters.add(
                decode_component(key),
                ParameterValue::Text(decode_component(value)),
            );
        }

        parameters
    }

    /// Appends a value, keeping any earlier values under the same key.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Appends every entry of `other` after the existing ones.
    pub fn extend_from(&mut self, other: &NavigationParameters) {
        self.entries.extend(other.entries.iter().cloned());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Returns the first raw value stored under `key`.
    pub fn value(&self, key: &str) -> Option<&ParameterValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Returns the first value under `key` converted to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Conversion`] if the value exists but can't
    /// be converted.
    pub fn get<T: FromParameter>(&self, key: &str) -> Result<Option<T>, ParameterError> {
        self.value(key)
            .map(|value| convert(key, value))
            .transpose()
    }

    /// Like [`get`](Self::get), treating conversion failures as absence.
    pub fn try_get<T: FromParameter>(&self, key: &str) -> Option<T> {
        self.value(key).and_then(T::from_parameter)
    }

    /// Returns every value under `key` converted to `T`, in insertion order.
    pub fn get_all<T: FromParameter>(&self, key: &str) -> Result<Vec<T>, ParameterError> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, value)| convert(key, value))
            .collect()
    }

    /// Returns the first object under `key` if it has type `T`.
    pub fn get_object<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.entries.iter().find_map(|(k, value)| match value {
            ParameterValue::Object(object) if k == key => Arc::clone(object).downcast::<T>().ok(),
            _ => None,
        })
    }

    /// Distinct keys in first-seen order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (key, _) in &self.entries {
            if !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Direction of the navigation these parameters were delivered with.
    /// Set by the engine and never serialized.
    pub fn navigation_mode(&self) -> Option<NavigationMode> {
        self.mode
    }

    pub(crate) fn set_navigation_mode(&mut self, mode: NavigationMode) {
        self.mode = Some(mode);
    }

    /// Serializes to `?k=v&k2=v2`, or an empty string when there are no
    /// entries.
    pub fn to_query_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NavigationParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.entries.iter().enumerate() {
            f.write_str(if index == 0 { "?" } else { "&" })?;
            let value = value.to_string();
            write!(
                f,
                "{}={}",
                utf8_percent_encode(key, COMPONENT),
                utf8_percent_encode(&value, COMPONENT)
            )?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<ParameterValue>> FromIterator<(K, V)> for NavigationParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut parameters = NavigationParameters::new();
        for (key, value) in iter {
            parameters.add(key, value);
        }
        parameters
    }
}

fn convert<T: FromParameter>(key: &str, value: &ParameterValue) -> Result<T, ParameterError> {
    T::from_parameter(value).ok_or_else(|| ParameterError::Conversion {
        key: key.to_string(),
        expected: std::any::type_name::<T>(),
        found: value.describe(),
    })
}

fn decode_component(component: &str) -> String {
    percent_decode_str(component)
        .decode_utf8_lossy()
        .into_owned()
}
