use once_cell::sync::Lazy;
use regex::Regex;

/// Separators accepted between numbers stored as text (`"1, 2;3 4"`).
static VALUE_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[,;]\s*|\s+").expect("value separator regex is valid"));

/// A typed attribute or field value of the hierarchical file.
///
/// Conversions are lenient in the way the legacy readers are: scalars widen to
/// one-element arrays, integers widen to floats and text is split and parsed.
/// A conversion that cannot succeed returns `None` rather than a partial result.
#[derive(Debug, Clone, PartialEq)]
pub enum NxValue {
    Int(i64),
    Float(f64),
    Text(String),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

impl NxValue {
    /// Number of elements held; text counts as one element.
    pub fn len(&self) -> usize {
        match self {
            NxValue::Int(_) | NxValue::Float(_) | NxValue::Text(_) => 1,
            NxValue::IntArray(v) => v.len(),
            NxValue::FloatArray(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` for integer scalars and integer arrays.
    pub fn is_integer(&self) -> bool {
        matches!(self, NxValue::Int(_) | NxValue::IntArray(_))
    }

    fn split_text(text: &str) -> impl Iterator<Item = &str> {
        VALUE_SEPARATORS
            .split(text.trim())
            .filter(|token| !token.is_empty())
    }

    /// All elements as floats.
    ///
    /// Return
    /// ------
    /// * `None` for empty text or when any text token is not a number
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            NxValue::Int(v) => Some(vec![*v as f64]),
            NxValue::Float(v) => Some(vec![*v]),
            NxValue::IntArray(v) => Some(v.iter().map(|x| *x as f64).collect()),
            NxValue::FloatArray(v) => Some(v.clone()),
            NxValue::Text(text) => {
                let parsed = Self::split_text(text)
                    .map(|token| token.parse::<f64>().ok())
                    .collect::<Option<Vec<f64>>>()?;
                (!parsed.is_empty()).then_some(parsed)
            }
        }
    }

    /// All elements as integers. Floats are truncated; non-finite floats fail the conversion.
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        let truncate = |x: f64| x.is_finite().then_some(x as i64);
        match self {
            NxValue::Int(v) => Some(vec![*v]),
            NxValue::Float(v) => truncate(*v).map(|x| vec![x]),
            NxValue::IntArray(v) => Some(v.clone()),
            NxValue::FloatArray(v) => v.iter().map(|x| truncate(*x)).collect(),
            NxValue::Text(text) => {
                let parsed = Self::split_text(text)
                    .map(|token| token.parse::<i64>().ok())
                    .collect::<Option<Vec<i64>>>()?;
                (!parsed.is_empty()).then_some(parsed)
            }
        }
    }

    /// First element as a float.
    pub fn as_f64(&self) -> Option<f64> {
        self.to_f64_vec()?.first().copied()
    }

    /// First element as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        self.to_i64_vec()?.first().copied()
    }

    /// Text form of the value; numbers render their first element.
    pub fn to_text(&self) -> Option<String> {
        match self {
            NxValue::Text(text) => Some(text.clone()),
            NxValue::Int(v) => Some(v.to_string()),
            NxValue::Float(v) => Some(v.to_string()),
            NxValue::IntArray(v) => v.first().map(|x| x.to_string()),
            NxValue::FloatArray(v) => v.first().map(|x| x.to_string()),
        }
    }
}

impl From<i64> for NxValue {
    fn from(value: i64) -> Self {
        NxValue::Int(value)
    }
}

impl From<i32> for NxValue {
    fn from(value: i32) -> Self {
        NxValue::Int(value as i64)
    }
}

impl From<f64> for NxValue {
    fn from(value: f64) -> Self {
        NxValue::Float(value)
    }
}

impl From<&str> for NxValue {
    fn from(value: &str) -> Self {
        NxValue::Text(value.to_string())
    }
}

impl From<String> for NxValue {
    fn from(value: String) -> Self {
        NxValue::Text(value)
    }
}

impl From<Vec<i64>> for NxValue {
    fn from(value: Vec<i64>) -> Self {
        NxValue::IntArray(value)
    }
}

impl From<Vec<f64>> for NxValue {
    fn from(value: Vec<f64>) -> Self {
        NxValue::FloatArray(value)
    }
}
