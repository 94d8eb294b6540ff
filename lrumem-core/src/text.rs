//! Debug text rendering for cache contents.
//!
//! The `Display` output of [`Cache`](crate::Cache) and
//! [`SafeCache`](crate::SafeCache) is a debugging aid, not a stable format:
//!
//! ```text
//! lrumem::Cache<Key=u32, Value=alloc::string::String> at 0x7ffd5c1e8a40
//! hits 0 | misses 0 | maxsize inf | currsize 2 | maxmem inf | currmem 112
//! 0: [2] = 'two'
//! 1: [1] = 'one'
//! ```

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use crate::CacheStats;

/// Text form of a key or value in the cache's debug rendering.
///
/// Types with a `Display` form get it for free from the impls below. Any
/// other type can opt in with an empty impl, which renders a
/// `<type at 0x...>` placeholder instead.
///
/// # Examples
///
/// ```
/// use lrumem_core::{Cache, ItemText};
///
/// struct Opaque;
/// impl ItemText for Opaque {}
///
/// let mut cache: Cache<u8, Opaque> = Cache::new();
/// cache.set(1, Opaque);
/// let text = cache.to_string();
/// assert!(text.contains("[1] = '<"));
/// assert!(text.contains("Opaque at 0x"));
/// ```
pub trait ItemText {
    fn fmt_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} at {:p}>", type_name::<Self>(), self)
    }
}

macro_rules! display_text {
    ($($ty:ty),* $(,)?) => {$(
        impl ItemText for $ty {
            fn fmt_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }
    )*};
}

display_text!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char, str,
    String,
);

impl<T: ItemText + ?Sized> ItemText for &T {
    fn fmt_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt_text(f)
    }
}

impl<T: ItemText + ?Sized> ItemText for Box<T> {
    fn fmt_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt_text(f)
    }
}

impl<T: ItemText + ?Sized> ItemText for Arc<T> {
    fn fmt_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt_text(f)
    }
}

impl<T: ItemText> ItemText for Option<T> {
    fn fmt_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Some(inner) => inner.fmt_text(f),
            None => f.write_str("None"),
        }
    }
}

impl<T: ItemText> ItemText for [T] {
    fn fmt_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (n, item) in self.iter().enumerate() {
            if n > 0 {
                f.write_str(", ")?;
            }
            item.fmt_text(f)?;
        }
        f.write_str("]")
    }
}

impl<T: ItemText> ItemText for Vec<T> {
    fn fmt_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_slice().fmt_text(f)
    }
}

impl<T: ItemText, const N: usize> ItemText for [T; N] {
    fn fmt_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_slice().fmt_text(f)
    }
}

/// `Display` adapter for any [`ItemText`] value.
pub struct Text<'a, T: ?Sized>(pub &'a T);

impl<T: ItemText + ?Sized> fmt::Display for Text<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_text(f)
    }
}

/// Writes the header, the stats line and one line per entry, head to tail.
/// Writes the `lrumem::<kind><Key=K, Value=V> at 0x..` line.
pub(crate) fn render_header<K: ?Sized, V: ?Sized>(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    address: *const (),
) -> fmt::Result {
    writeln!(
        f,
        "lrumem::{}<Key={}, Value={}> at {:p}",
        kind,
        type_name::<K>(),
        type_name::<V>(),
        address
    )
}

pub(crate) fn render_cache<'a, K, V>(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    address: *const (),
    stats: CacheStats,
    entries: impl Iterator<Item = (&'a K, &'a V)>,
) -> fmt::Result
where
    K: ItemText + 'a,
    V: ItemText + 'a,
{
    render_header::<K, V>(f, kind, address)?;
    writeln!(f, "{}", stats)?;
    for (n, (key, value)) in entries.enumerate() {
        writeln!(f, "{}: [{}] = '{}'", n, Text(key), Text(value))?;
    }
    Ok(())
}
