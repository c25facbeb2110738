pub mod config;
pub mod constants;
pub mod error;
pub mod primitives;

/// Identifier of a storage device declared in the configuration.
///
/// Partitions and verity devices share a single id namespace.
pub type DeviceId = String;

/// Returns whether a value is the default for its type. Used to skip
/// serializing unset fields.
pub(crate) fn is_default<T: Default + PartialEq>(t: &T) -> bool {
    t == &T::default()
}
