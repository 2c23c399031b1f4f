//! Dependency values and the same-value comparison.
//!
//! Hooks that take a dependency list decide between recomputing and reusing
//! by comparing the previous list with the new one element by element. The
//! comparison is identity, not equality: primitives are identical when they
//! hold the same value (NaN is identical to NaN, `0.0` is not identical to
//! `-0.0`), references are identical only when they point at the same
//! allocation.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Strict same-value identity.
///
/// This is intentionally a separate trait from [`PartialEq`]: two structurally
/// equal `Rc`s are not the same value unless they share one allocation.
pub trait SameValue {
    /// Returns true if `self` and `other` are the same value.
    fn same_value(&self, other: &Self) -> bool;
}

macro_rules! same_value_by_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SameValue for $ty {
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

same_value_by_eq!(
    bool, char, (), i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, String,
    &'static str, Duration,
);

impl SameValue for f64 {
    fn same_value(&self, other: &Self) -> bool {
        if self.is_nan() && other.is_nan() {
            return true;
        }
        #[allow(clippy::float_cmp)]
        let equal = self == other;
        equal && self.is_sign_negative() == other.is_sign_negative()
    }
}

impl SameValue for f32 {
    fn same_value(&self, other: &Self) -> bool {
        f64::from(*self).same_value(&f64::from(*other))
    }
}

impl<T: ?Sized> SameValue for Rc<T> {
    fn same_value(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: SameValue> SameValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_value(b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// A single element of a dependency list.
///
/// Values of different variants are never the same value; `Int(1)` and
/// `Float(1.0)` are distinct dependencies. Every integer type up to 64 bits,
/// plus `i128`, converts losslessly into `Int`, so `1u64` and `1i32` are the
/// same dependency.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use hooktape::{Dep, SameValue};
///
/// assert!(Dep::Float(f64::NAN).same_value(&Dep::Float(f64::NAN)));
/// assert!(!Dep::Float(0.0).same_value(&Dep::Float(-0.0)));
///
/// let shared = Rc::new(vec![1, 2, 3]);
/// let a = Dep::reference(&shared);
/// let b = Dep::reference(&shared);
/// let c = Dep::reference(&Rc::new(vec![1, 2, 3]));
/// assert!(a.same_value(&b));
/// assert!(!a.same_value(&c));
/// ```
#[derive(Clone)]
pub enum Dep {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Char(char),
    Str(String),
    Duration(Duration),
    Ref(Rc<dyn Any>),
}

impl Dep {
    /// Wraps a shared allocation, compared by pointer identity.
    #[must_use]
    pub fn reference<T: Any>(value: &Rc<T>) -> Self {
        let erased: Rc<dyn Any> = Rc::clone(value) as Rc<dyn Any>;
        Self::Ref(erased)
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Char(_) => "char",
            Self::Str(_) => "string",
            Self::Duration(_) => "duration",
            Self::Ref(_) => "ref",
        }
    }

    /// True for the absent-value dependency.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl SameValue for Dep {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.same_value(b),
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Duration(a), Self::Duration(b)) => a == b,
            // Compare data pointers only; vtable pointers are not unique.
            (Self::Ref(a), Self::Ref(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Char(v) => f.debug_tuple("Char").field(v).finish(),
            Self::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Self::Duration(v) => f.debug_tuple("Duration").field(v).finish(),
            Self::Ref(v) => write!(f, "Ref({:p})", Rc::as_ptr(v)),
        }
    }
}

impl From<bool> for Dep {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! dep_from_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Dep {
                fn from(value: $ty) -> Self {
                    Self::Int(i128::from(value))
                }
            }
        )*
    };
}

dep_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<isize> for Dep {
    fn from(value: isize) -> Self {
        // isize is at most 64 bits on every supported target.
        Self::Int(value as i128)
    }
}

impl From<usize> for Dep {
    fn from(value: usize) -> Self {
        Self::Int(value as i128)
    }
}

impl From<char> for Dep {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

impl From<f64> for Dep {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for Dep {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<&str> for Dep {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Dep {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for Dep {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<Duration> for Dep {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl<T: Into<Dep>> From<Option<T>> for Dep {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Builds a dependency list, converting each element with [`Dep::from`].
///
/// ```
/// use hooktape::{deps, Dep};
///
/// let list: Vec<Dep> = deps![1, "two", 3.0];
/// assert_eq!(list.len(), 3);
/// let empty: Vec<Dep> = deps![];
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        ::std::vec::Vec::<$crate::Dep>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Dep::from($value)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_same_value() {
        assert!(f64::NAN.same_value(&f64::NAN));
        assert!(!0.0f64.same_value(&-0.0));
        assert!(1.5f64.same_value(&1.5));
        assert!(!1.5f64.same_value(&2.5));
    }

    #[test]
    fn test_rc_identity_not_equality() {
        let a = Rc::new(String::from("x"));
        let b = Rc::new(String::from("x"));
        assert!(a.same_value(&Rc::clone(&a)));
        assert!(!a.same_value(&b));
    }

    #[test]
    fn test_dep_variants_never_cross_match() {
        assert!(!Dep::Int(1).same_value(&Dep::Float(1.0)));
        assert!(!Dep::Null.same_value(&Dep::Bool(false)));
        assert!(Dep::Null.same_value(&Dep::Null));
    }

    #[test]
    fn test_dep_strings_compare_by_content() {
        assert!(Dep::from("a").same_value(&Dep::from(String::from("a"))));
        assert!(!Dep::from("a").same_value(&Dep::from("b")));
    }

    #[test]
    fn test_dep_reference_identity() {
        let shared = Rc::new(42u8);
        assert!(Dep::reference(&shared).same_value(&Dep::reference(&shared)));
        assert!(!Dep::reference(&shared).same_value(&Dep::reference(&Rc::new(42u8))));
    }

    #[test]
    fn test_wide_integers_convert_losslessly() {
        assert!(Dep::from(u64::MAX).same_value(&Dep::Int(i128::from(u64::MAX))));
        assert!(!Dep::from(u64::MAX).same_value(&Dep::from(-1i64)));
        assert!(Dep::from(7usize).same_value(&Dep::from(7u8)));
        assert!(Dep::from(i128::MIN).same_value(&Dep::Int(i128::MIN)));
        assert!(Dep::from(-3isize).same_value(&Dep::from(-3i32)));
    }

    #[test]
    fn test_char_dependencies() {
        assert!(Dep::from('x').same_value(&Dep::Char('x')));
        assert!(!Dep::from('x').same_value(&Dep::from("x")));
        assert_eq!(Dep::from('x').type_name(), "char");
    }

    #[test]
    fn test_dep_from_option() {
        assert!(Dep::from(None::<i32>).is_null());
        assert!(Dep::from(Some(3)).same_value(&Dep::Int(3)));
    }

    #[test]
    fn test_deps_macro() {
        let list = deps![1, true, "s", Duration::from_millis(5)];
        assert_eq!(list.len(), 4);
        assert_eq!(list[0].type_name(), "int");
        assert_eq!(list[1].type_name(), "bool");
        assert_eq!(list[2].type_name(), "string");
        assert_eq!(list[3].type_name(), "duration");
    }

    #[test]
    fn test_debug_ref_prints_pointer() {
        let dep = Dep::reference(&Rc::new(()));
        assert!(format!("{dep:?}").starts_with("Ref(0x"));
    }
}
