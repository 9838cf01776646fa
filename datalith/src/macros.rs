//! Macros for constructing [`Value`](crate::Value) trees.

/// Creates a [`Value`](crate::Value) from a JSON-like literal.
///
/// ```
/// use datalith::value;
///
/// let v = value!({
///     "name": "engine",
///     "tags": ["fast", "small"],
///     "threads": 4,
///     "extra": null
/// });
/// assert!(v.is_object());
/// assert_eq!(v["threads"].as_int(), 4);
/// ```
///
/// Expressions interpolate through parentheses:
///
/// ```
/// use datalith::value;
///
/// let name = "interpolated";
/// let v = value!({ "key": (name) });
/// assert_eq!(v["key"].as_str(), Some("interpolated"));
/// ```
#[macro_export]
macro_rules! value {
    // Null
    (null) => {
        $crate::Value::null()
    };

    // Booleans
    (true) => {
        $crate::Value::boolean(true)
    };
    (false) => {
        $crate::Value::boolean(false)
    };

    // Empty array
    ([]) => {
        $crate::Value::array($crate::Array::new())
    };

    // Array with elements
    ([ $($elem:tt),+ $(,)? ]) => {{
        let mut arr = $crate::Array::new();
        $(
            arr.push($crate::value!($elem));
        )+
        $crate::Value::array(arr)
    }};

    // Empty object
    ({}) => {
        $crate::Value::object($crate::Object::new())
    };

    // Object with entries
    ({ $($key:tt : $val:tt),+ $(,)? }) => {{
        let mut obj = $crate::Object::new();
        $(
            obj.insert($crate::value!($key), $crate::value!($val));
        )+
        $crate::Value::object(obj)
    }};

    // Parenthesized expression (interpolation)
    (( $expr:expr )) => {
        $crate::Value::from($expr)
    };

    // Literal expression
    ($other:expr) => {
        $crate::Value::from($other)
    };
}

#[cfg(test)]
mod tests {
    use crate::Value;

    #[test]
    fn scalars() {
        assert!(value!(null).is_null());
        assert_eq!(value!(true), Value::boolean(true));
        assert_eq!(value!(7), Value::int(7));
        assert_eq!(value!(1.5), Value::real(1.5));
        assert_eq!(value!("s"), Value::string("s"));
    }

    #[test]
    fn containers() {
        let v = value!([1, "two", true, null]);
        assert_eq!(v.array_size(), 4);
        assert!(v[3].is_null());

        let v = value!({});
        assert!(v.is_object());
        assert_eq!(v.object_size(), 0);

        let v = value!({"b": 2, "a": 1});
        let keys: Vec<_> = v
            .get_object_unchecked()
            .keys()
            .map(|k| k.as_str().unwrap().to_owned())
            .collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn interpolation() {
        let n = 9i64;
        let nested = value!([(n), (n * 2)]);
        assert_eq!(nested[0].as_int(), 9);
        assert_eq!(nested[1].as_int(), 18);
    }

    #[test]
    fn trailing_commas() {
        let v = value!([1, 2,]);
        assert_eq!(v.array_size(), 2);
        let v = value!({"a": 1,});
        assert_eq!(v.object_size(), 1);
    }
}
