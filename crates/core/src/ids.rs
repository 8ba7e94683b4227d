use std::fmt::{Display, Formatter};

use serde::Serialize;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw store handle.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw store handle.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Opaque handle of a resource (accessor or accessed).
    ResourceId
);

numeric_id!(
    /// Opaque handle of a domain node.
    DomainId
);

numeric_id!(
    /// Opaque handle of a registered resource class.
    ResourceClassId
);

#[cfg(test)]
mod tests {
    use super::{DomainId, ResourceId};

    #[test]
    fn ids_format_as_raw_handle() {
        assert_eq!(ResourceId::new(42).to_string(), "42");
        assert_eq!(DomainId::new(-7).as_i64(), -7);
    }

    #[test]
    fn ids_order_by_raw_handle() {
        let mut ids = vec![ResourceId::new(3), ResourceId::new(1), ResourceId::new(2)];
        ids.sort();
        assert_eq!(
            ids,
            vec![ResourceId::new(1), ResourceId::new(2), ResourceId::new(3)]
        );
    }
}
