//! Opaque handles passed across the boundary
//!
//! Every handle is a pointer-sized value that only the bridge knows how to
//! turn back into a proxy (or module) object. Handles deliberately expose no
//! arithmetic and no dereference: the only operations are construction from a
//! raw pointer, the null check and conversion back to the raw pointer inside
//! a bridge implementation.
//!
//! Validity windows:
//!
//! | Handle                | Valid for                                     |
//! |-----------------------|-----------------------------------------------|
//! | `FilterPtr`           | the whole life of the filter instance         |
//! | `*HeadersPtr`         | the hook invocation that supplied it          |
//! | `*BodyPtr`            | until the next mutation of that buffer        |
//! | `ModuleConfigPtr`     | between config-new and config-destroy         |
//! | `ModuleFilterPtr`     | between filter-new and filter-destroy         |

use crate::types::Direction;
use std::ffi::c_void;
use std::ptr;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(*mut c_void);

        impl $name {
            /// The null handle.
            pub const fn null() -> Self {
                Self(ptr::null_mut())
            }

            /// Wrap a raw pointer. Constructing a handle is safe; using one is not.
            pub const fn from_raw(raw: *mut c_void) -> Self {
                Self(raw)
            }

            /// The raw pointer, for bridge implementations only.
            pub const fn as_raw(self) -> *mut c_void {
                self.0
            }

            pub fn is_null(self) -> bool {
                self.0.is_null()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::null()
            }
        }
    };
}

define_handle!(
    /// The proxy-side filter instance bound to one stream.
    FilterPtr
);
define_handle!(
    /// Request header collection lent for one hook invocation.
    RequestHeadersPtr
);
define_handle!(
    /// Response header collection lent for one hook invocation.
    ResponseHeadersPtr
);
define_handle!(
    /// Request body buffer.
    RequestBodyPtr
);
define_handle!(
    /// Response body buffer.
    ResponseBodyPtr
);
define_handle!(
    /// Module-owned object created once per filter configuration.
    ModuleConfigPtr
);
define_handle!(
    /// Module-owned object created once per stream.
    ModuleFilterPtr
);

// SAFETY: a filter handle is only an address. The one operation that may be
// performed from a foreign thread (continuation) marshals onto the stream's
// owning context before any proxy state is touched.
unsafe impl Send for FilterPtr {}
// SAFETY: see above; the handle itself is immutable.
unsafe impl Sync for FilterPtr {}

/// A header collection handle of either direction.
///
/// Lets one generic accessor serve both the request and response families
/// while keeping them distinct types at the boundary.
pub trait HeadersHandle: Copy {
    const DIRECTION: Direction;

    fn as_raw(self) -> *mut c_void;
}

impl HeadersHandle for RequestHeadersPtr {
    const DIRECTION: Direction = Direction::Request;

    fn as_raw(self) -> *mut c_void {
        self.0
    }
}

impl HeadersHandle for ResponseHeadersPtr {
    const DIRECTION: Direction = Direction::Response;

    fn as_raw(self) -> *mut c_void {
        self.0
    }
}

/// A body buffer handle of either direction.
pub trait BodyHandle: Copy {
    const DIRECTION: Direction;

    fn from_raw(raw: *mut c_void) -> Self;

    fn as_raw(self) -> *mut c_void;
}

impl BodyHandle for RequestBodyPtr {
    const DIRECTION: Direction = Direction::Request;

    fn from_raw(raw: *mut c_void) -> Self {
        Self(raw)
    }

    fn as_raw(self) -> *mut c_void {
        self.0
    }
}

impl BodyHandle for ResponseBodyPtr {
    const DIRECTION: Direction = Direction::Response;

    fn from_raw(raw: *mut c_void) -> Self {
        Self(raw)
    }

    fn as_raw(self) -> *mut c_void {
        self.0
    }
}
