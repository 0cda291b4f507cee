use std::fmt::Debug;

/// Helper trait for types that can be stored in a value cell.
///
/// Values move between cells by cloning. The text form is used when a
/// connection targets a `String` cell and for parameter injection from text.
pub trait CellValue: Clone + Debug + Send + Sync + 'static {
    /// Default string representation of the value
    fn to_text(&self) -> String;

    /// Parse a value from its text form
    fn from_text(text: &str) -> Option<Self>;
}

macro_rules! impl_cell_value_via_str {
    ($($t:ty),* $(,)?) => {
        $(
            impl CellValue for $t {
                fn to_text(&self) -> String {
                    self.to_string()
                }

                fn from_text(text: &str) -> Option<Self> {
                    text.trim().parse::<$t>().ok()
                }
            }
        )*
    };
}

// Implement for common types
impl_cell_value_via_str!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, char);

impl CellValue for String {
    fn to_text(&self) -> String {
        self.clone()
    }

    fn from_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

impl<T: CellValue> CellValue for Option<T> {
    fn to_text(&self) -> String {
        match self {
            Some(value) => value.to_text(),
            None => String::new(),
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            Some(None)
        } else {
            T::from_text(text).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_text_round_trip() {
        assert_eq!(42i64.to_text(), "42");
        assert_eq!(i64::from_text(" 17 "), Some(17));
        assert_eq!(f64::from_text("2.5"), Some(2.5));
        assert_eq!(u32::from_text("-1"), None);
    }

    #[test]
    fn test_option_text() {
        assert_eq!(Some(3i32).to_text(), "3");
        assert_eq!(None::<i32>.to_text(), "");
        assert_eq!(Option::<i32>::from_text(""), Some(None));
        assert_eq!(Option::<i32>::from_text("x"), None);
    }
}
