//! FIT profile subset: message kinds, identifiers, and identity config.
//!
//! This module handles:
//! - Global message numbers and well-known manufacturer/product ids
//! - Field templates for the typed message subset
//! - The device identity and spoof policy supplied by the caller

pub mod identity;
pub mod messages;
pub mod types;

// Re-export main types
pub use identity::{ConversionProfile, DeviceIdentity, SpoofPolicy};
pub use types::{garmin_product, kind_name, manufacturer, manufacturer_name, mesg_num};
