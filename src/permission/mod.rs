//! Camera access authorization.

mod gate;

pub use gate::{
    DeferredPermission, PermissionCallback, PermissionGate, PermissionProvider, PermissionStatus,
    StaticPermission,
};
