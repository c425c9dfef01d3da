//! Interpolation functions:
//! - `Lerp` gives every signal type its default interpolation
//! - `text_lerp` (typewriter style character blend)
//! - `bool_lerp` (midpoint cutover)
//! - `deep_lerp` (structural blend over `Value` trees)

use std::collections::BTreeMap;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::context::{try_use_playback, use_logger};
use crate::logging::LogPayload;
use crate::tweening::helpers::map;
use crate::value::Value;

/// Shared interpolation function handle: `(from, to, progress) -> value`.
pub type InterpolationFn<T> = Rc<dyn Fn(&T, &T, f64) -> T>;

/// Default interpolation for a value type.
pub trait Lerp: Sized {
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self;
}

impl Lerp for f64 {
    #[inline]
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        map(*from, *to, progress)
    }
}

impl Lerp for f32 {
    #[inline]
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        map(*from as f64, *to as f64, progress) as f32
    }
}

impl Lerp for bool {
    #[inline]
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        bool_lerp(*from, *to, progress)
    }
}

impl Lerp for String {
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        text_lerp(from, to, progress)
    }
}

impl Lerp for Value {
    /// Missing operands resolve to whichever endpoint is closer. Warnings
    /// follow `warn_on_lerp_mismatch` of the active playback config.
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        let suppress = try_use_playback()
            .is_some_and(|playback| !playback.config().warn_on_lerp_mismatch);
        deep_lerp(from, to, progress, suppress).unwrap_or_else(|| {
            if progress < 1.0 {
                from.clone()
            } else {
                to.clone()
            }
        })
    }
}

/// Interpolation handle built from a type's [`Lerp`] impl.
pub fn lerp_fn<T: Lerp + 'static>() -> InterpolationFn<T> {
    Rc::new(|from: &T, to: &T, progress| T::lerp(from, to, progress))
}

/// `from` below the midpoint, `to` from the midpoint on.
#[inline]
pub fn bool_lerp<T>(from: T, to: T, progress: f64) -> T {
    if progress < 0.5 {
        from
    } else {
        to
    }
}

/// Character-wise blend between two strings.
///
/// The output length is the rounded blend of both lengths. Character `i`
/// comes from `to` once `progress` passes `i / length` (or when `from` is too
/// short), otherwise from `from`, otherwise it is a space.
pub fn text_lerp(from: &str, to: &str, progress: f64) -> String {
    let from: Vec<char> = from.chars().collect();
    let to: Vec<char> = to.chars().collect();
    let length = map(from.len() as f64, to.len() as f64, progress)
        .round()
        .max(0.0) as usize;

    let mut text = String::with_capacity(length);
    for i in 0..length {
        let threshold = i as f64 / length as f64;
        let prefer_to = i >= from.len() || progress > threshold;
        let ch = match (from.get(i), to.get(i)) {
            (_, Some(t)) if prefer_to => *t,
            (Some(f), _) => *f,
            (None, Some(t)) => *t,
            (None, None) => ' ',
        };
        text.push(ch);
    }
    text
}

/// Structural interpolation across `Value` trees.
///
/// Returns `None` when either operand is `Null`. Shapes that cannot be
/// blended snap from `from` to `to` as soon as `progress` leaves zero; a
/// warning is logged unless `suppress_warnings` is set.
pub fn deep_lerp(from: &Value, to: &Value, progress: f64, suppress_warnings: bool) -> Option<Value> {
    if from.is_null() || to.is_null() {
        if !suppress_warnings {
            use_logger().warn(
                LogPayload::new("Attempted to interpolate with a missing value.")
                    .with_remarks(format!("from: {:?}, to: {:?}", from.kind(), to.kind())),
            );
        }
        return None;
    }

    if let Value::Custom(custom) = from {
        if let Some(value) = custom.lerp_to(to, progress) {
            return Some(value);
        }
        return Some(incompatible(from, to, progress, suppress_warnings));
    }

    if progress == 0.0 {
        return Some(from.clone());
    }
    if progress == 1.0 {
        return Some(to.clone());
    }

    let value = match (from, to) {
        (Value::Number(a), Value::Number(b)) => Value::Number(map(*a, *b, progress)),
        (Value::Text(a), Value::Text(b)) => Value::Text(text_lerp(a, b, progress)),
        (Value::Bool(a), Value::Bool(b)) => Value::Bool(bool_lerp(*a, *b, progress)),
        (Value::List(a), Value::List(b)) => {
            if a.len() == b.len() {
                Value::List(
                    a.iter()
                        .zip(b)
                        .map(|(x, y)| deep_lerp(x, y, progress, suppress_warnings).unwrap_or(Value::Null))
                        .collect(),
                )
            } else {
                // progress is nonzero here, mismatched lengths cut over immediately.
                to.clone()
            }
        }
        (Value::Map(a), Value::Map(b)) => {
            let mut out: HashMap<String, Value> = HashMap::with_capacity(a.len());
            for (key, value) in a {
                out.insert(key.clone(), lerp_entry(value, b.get(key), progress, suppress_warnings));
            }
            Value::Map(out)
        }
        (Value::Object(a), Value::Object(b)) => {
            let mut out = BTreeMap::new();
            for (key, value) in a {
                out.insert(key.clone(), lerp_entry(value, b.get(key), progress, suppress_warnings));
            }
            Value::Object(out)
        }
        _ => incompatible(from, to, progress, suppress_warnings),
    };
    Some(value)
}

/// Keys missing from `to` are retained until the tween completes.
fn lerp_entry(from: &Value, to: Option<&Value>, progress: f64, suppress_warnings: bool) -> Value {
    match to {
        Some(to) => deep_lerp(from, to, progress, suppress_warnings).unwrap_or(Value::Null),
        None => from.clone(),
    }
}

fn incompatible(from: &Value, to: &Value, progress: f64, suppress_warnings: bool) -> Value {
    if !suppress_warnings {
        use_logger().warn(
            LogPayload::new("Attempted to interpolate between incompatible values.")
                .with_remarks(format!("from: {:?}, to: {:?}", from.kind(), to.kind())),
        );
    }
    if progress == 0.0 {
        from.clone()
    } else {
        to.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vector2;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn text_lerp_cases() {
        assert_eq!(text_lerp("foo", "foobar", 2.0 / 3.0), "fooba");
        assert_eq!(text_lerp("", "hello", 0.5), "hel");
        assert_eq!(text_lerp("abc", "xyz", 0.5), "xyc");
        assert_eq!(text_lerp("hello", "", 0.5), "hel");
        assert_eq!(text_lerp("abc", "xyz", 0.0), "abc");
        assert_eq!(text_lerp("abc", "xyz", 1.0), "xyz");
    }

    #[test]
    fn bool_lerp_cuts_at_midpoint() {
        for p in [0.0, 0.1, 0.25, 0.49, 0.4999] {
            assert!(bool_lerp(true, false, p));
        }
        for p in [0.5, 0.51, 0.75, 1.0] {
            assert!(!bool_lerp(true, false, p));
        }
    }

    #[test]
    fn deep_lerp_endpoints() {
        let cases = [
            (v(json!(1.0)), v(json!(3.0))),
            (v(json!("ab")), v(json!("xyz"))),
            (v(json!([1.0, 2.0])), v(json!([3.0, 4.0]))),
            (v(json!({ "a": 1.0, "b": "x" })), v(json!({ "a": 2.0, "b": "y" }))),
        ];
        for (from, to) in cases {
            assert_eq!(deep_lerp(&from, &to, 0.0, true), Some(from.clone()));
            assert_eq!(deep_lerp(&from, &to, 1.0, true), Some(to.clone()));
        }
    }

    #[test]
    fn mismatched_lists_cut_over_at_zero() {
        let from = v(json!([1.0, 2.0]));
        let to = v(json!([3.0, 4.0, 5.0]));
        assert_eq!(deep_lerp(&from, &to, 0.0, true), Some(from.clone()));
        for t in [1e-6, 0.25, 0.5, 0.99, 1.0] {
            assert_eq!(deep_lerp(&from, &to, t, true), Some(to.clone()));
        }
    }

    #[test]
    fn equal_lists_lerp_elementwise() {
        let from = v(json!([0.0, 10.0]));
        let to = v(json!([10.0, 20.0]));
        assert_eq!(deep_lerp(&from, &to, 0.5, true), Some(v(json!([5.0, 15.0]))));
    }

    #[test]
    fn objects_keep_removed_keys_and_delay_new_ones() {
        let from = v(json!({ "a": 0.0, "gone": 1.0 }));
        let to = v(json!({ "a": 10.0, "new": 2.0 }));
        let mid = deep_lerp(&from, &to, 0.5, true).unwrap();
        assert_eq!(mid, v(json!({ "a": 5.0, "gone": 1.0 })));
        assert_eq!(deep_lerp(&from, &to, 1.0, true), Some(to));
    }

    #[test]
    fn maps_follow_keyed_semantics() {
        let from = Value::Map(HashMap::from_iter([
            ("x".to_string(), Value::Number(0.0)),
            ("old".to_string(), Value::Bool(true)),
        ]));
        let to = Value::Map(HashMap::from_iter([
            ("x".to_string(), Value::Number(4.0)),
            ("fresh".to_string(), Value::Bool(false)),
        ]));
        let Some(Value::Map(mid)) = deep_lerp(&from, &to, 0.25, true) else {
            panic!("expected map");
        };
        assert_eq!(mid.get("x"), Some(&Value::Number(1.0)));
        assert_eq!(mid.get("old"), Some(&Value::Bool(true)));
        assert!(!mid.contains_key("fresh"));
    }

    #[test]
    fn null_operands_resolve_to_none() {
        assert_eq!(deep_lerp(&Value::Null, &v(json!(1.0)), 0.5, true), None);
        assert_eq!(deep_lerp(&v(json!(1.0)), &Value::Null, 0.5, true), None);
    }

    #[test]
    fn custom_values_delegate() {
        let from = Value::custom(Vector2::new(0.0, 0.0));
        let to = Value::custom(Vector2::new(10.0, 20.0));
        let mid = deep_lerp(&from, &to, 0.5, true).unwrap();
        assert_eq!(mid.downcast_custom::<Vector2>(), Some(&Vector2::new(5.0, 10.0)));
    }

    #[test]
    fn incompatible_shapes_snap() {
        let from = v(json!(1.0));
        let to = v(json!("text"));
        assert_eq!(deep_lerp(&from, &to, 0.0, true), Some(from.clone()));
        assert_eq!(deep_lerp(&from, &to, 0.3, true), Some(to.clone()));
    }

    #[test]
    fn lerp_trait_impls() {
        assert_eq!(<f64 as Lerp>::lerp(&0.0, &10.0, 0.25), 2.5);
        assert_eq!(<f32 as Lerp>::lerp(&0.0, &10.0, 0.5), 5.0);
        assert!(bool::lerp(&true, &false, 0.2));
        assert_eq!(String::lerp(&"abc".into(), &"xyz".into(), 0.5), "xyc");
        assert_eq!(Value::lerp(&Value::Null, &Value::Number(2.0), 0.5), Value::Null);
        let interp = lerp_fn::<f64>();
        assert_eq!(interp(&1.0, &3.0, 0.5), 2.0);
    }
}
