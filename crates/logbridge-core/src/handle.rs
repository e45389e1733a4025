//! Opaque native handles.
//!
//! Every value crossing the native boundary is an integral handle. Each
//! resource kind gets its own newtype so a template handle can never be passed
//! where a message handle is expected. Handles are plain `Copy` identifiers;
//! ownership of the underlying native reference is carried by the wrapper
//! types ([`LogTemplate`](crate::LogTemplate), [`LogMessage`](crate::LogMessage)),
//! which are neither `Copy` nor `Clone`.

use std::fmt;
use std::num::NonZeroU64;

macro_rules! native_handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Resource kind name, used in diagnostics.
            pub const KIND: &'static str = $kind;

            /// Wraps a raw handle received from the native side.
            ///
            /// Returns `None` for the null handle.
            pub fn from_raw(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map(Self)
            }

            pub fn from_nonzero(raw: NonZeroU64) -> Self {
                Self(raw)
            }

            /// Returns the raw handle value.
            pub fn as_raw(self) -> u64 {
                self.0.get()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.0.get())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{:#x}", $kind, self.0.get())
            }
        }
    };
}

native_handle!(
    /// Native configuration object that templates are created against.
    ConfigHandle,
    "config"
);

native_handle!(
    /// Native destination state. Non-owning: the native side owns the object.
    DestinationHandle,
    "destination"
);

native_handle!(
    /// Reference-counted native template.
    TemplateHandle,
    "template"
);

native_handle!(
    /// Native template formatting options (time-zone overrides, precision).
    TemplateOptionsHandle,
    "template-options"
);

native_handle!(
    /// Reference-counted native log message.
    MessageHandle,
    "message"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handle_is_rejected() {
        assert!(TemplateHandle::from_raw(0).is_none());
        assert_eq!(TemplateHandle::from_raw(7).map(TemplateHandle::as_raw), Some(7));
    }

    #[test]
    fn test_handle_display() {
        let handle = MessageHandle::from_raw(0x2a).unwrap();
        assert_eq!(handle.to_string(), "message:0x2a");
        assert_eq!(format!("{handle:?}"), "MessageHandle(0x2a)");
    }
}
