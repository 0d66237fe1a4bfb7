/// Position of a node or a bare value in the list order.
///
/// Sentinels are not values: `Left` sorts before every `Value`, `Right` after
/// every `Value`. Every comparison in the list, whether node against node,
/// node against value or value against node, is a comparison of two `KeyRef`s.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyRef<'a, T> {
    Left,
    Value(&'a T),
    Right,
}

impl<T> Clone for KeyRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for KeyRef<'_, T> {}

impl<'a, T> From<&'a T> for KeyRef<'a, T> {
    fn from(value: &'a T) -> Self {
        KeyRef::Value(value)
    }
}

impl<'a, T> KeyRef<'a, T> {
    pub fn value(self) -> Option<&'a T> {
        match self {
            KeyRef::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_sentinel(self) -> bool {
        !matches!(self, KeyRef::Value(_))
    }
}
