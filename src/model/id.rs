use uuid::Uuid;

/// A model that lives in its own table.
pub trait Table {
    /// Returns the name of the table associated with the model.
    fn table() -> &'static str;
}

#[macro_export]
macro_rules! table {
    ($table:literal : $model:ty) => {
        impl $crate::model::Table for $model {
            fn table() -> &'static str {
                $table
            }
        }
    };
}

/// A typed record id. The type parameter only exists so that an `Id<Ad>` cannot be handed to
/// something expecting an `Id<View>`.
///
/// This type implements [Default] which creates a new id with a random UUID.
pub struct Id<T> {
    inner: Uuid,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(inner: Uuid) -> Self {
        Id {
            inner,
            _marker: std::marker::PhantomData,
        }
    }

    /// Creates a new `Id` with a random UUID.
    pub fn uuid() -> Self {
        Self::new(Uuid::new_v4())
    }
}

impl<T: Table> Id<T> {
    /// The `table:id` form used in log output.
    pub fn qualified(&self) -> String {
        format!("{}:{}", T::table(), self.inner)
    }
}

impl<T> std::default::Default for Id<T> {
    fn default() -> Self {
        Self::uuid()
    }
}

impl<T> std::str::FromStr for Id<T> {
    type Err = uuid::Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        input.parse().map(Self::new)
    }
}

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T> std::clone::Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> std::marker::Copy for Id<T> {}

impl<T> serde::Serialize for Id<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}

impl<'de, T> serde::Deserialize<'de> for Id<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::new)
    }
}

impl<T> std::cmp::PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> std::cmp::Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.hash(state)
    }
}
