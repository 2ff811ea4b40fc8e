//! Device identity and spoof-policy configuration.
//!
//! These are the pipeline's external inputs: which device the output should
//! claim to be, and which source manufacturers qualify for substitution.
//! Both deserialize from the profile JSON file so new trainer apps can be
//! admitted without touching the codec.

use serde::{Deserialize, Serialize};

use crate::utils::config::{
    DEFAULT_MANUFACTURER, DEFAULT_PRODUCT, DEFAULT_SERIAL_NUMBER,
    DEFAULT_SPOOFABLE_MANUFACTURERS, SERIAL_NUMBER_MAX, SERIAL_NUMBER_MIN,
};
use crate::utils::error::IdentityError;

/// The identity stamped onto rewritten files.
///
/// Immutable for the duration of a rewrite run; validated before any file
/// is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Manufacturer id to write (normally GARMIN, 1)
    pub manufacturer: u16,
    /// Product id to write (e.g. 3122 for an Edge 830)
    pub product: u16,
    /// Unit id / serial number; must look like a real 10-digit unit id
    pub serial_number: u32,
    /// Firmware version in FIT encoding (e.g. 975 = v9.75). When set, a
    /// file-creator record carrying it is synthesized after the file-id.
    #[serde(default)]
    pub software_version: Option<u16>,
}

impl Default for DeviceIdentity {
    /// Garmin Edge 830, the device the original rewrite rules were tuned on
    fn default() -> Self {
        Self {
            manufacturer: DEFAULT_MANUFACTURER,
            product: DEFAULT_PRODUCT,
            serial_number: DEFAULT_SERIAL_NUMBER,
            software_version: None,
        }
    }
}

impl DeviceIdentity {
    /// Reject identities that would produce implausible or broken output
    pub fn validate(&self) -> Result<(), IdentityError> {
        if self.manufacturer == 0 {
            return Err(IdentityError::ZeroManufacturer);
        }
        if self.product == 0 {
            return Err(IdentityError::ZeroProduct);
        }
        if self.serial_number < SERIAL_NUMBER_MIN {
            return Err(IdentityError::SerialOutOfRange(
                self.serial_number,
                SERIAL_NUMBER_MIN,
                SERIAL_NUMBER_MAX,
            ));
        }
        Ok(())
    }
}

/// The set of source manufacturers whose identity gets replaced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoofPolicy {
    pub manufacturers: Vec<u16>,
}

impl Default for SpoofPolicy {
    fn default() -> Self {
        Self {
            manufacturers: DEFAULT_SPOOFABLE_MANUFACTURERS.to_vec(),
        }
    }
}

impl SpoofPolicy {
    /// Gate for file-id records
    pub fn is_spoofable(&self, manufacturer: u16) -> bool {
        self.manufacturers.contains(&manufacturer)
    }

    /// Gate for device-info records: additionally admits the blank/unknown
    /// manufacturer code 0, which trainer apps leave on sensor rows
    pub fn admits_device_info(&self, manufacturer: u16) -> bool {
        manufacturer == 0 || self.is_spoofable(manufacturer)
    }
}

/// On-disk profile file: identity plus optional policy override
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionProfile {
    #[serde(default)]
    pub identity: DeviceIdentity,
    /// Overrides the built-in spoofable list when present
    #[serde(default)]
    pub spoofable_manufacturers: Option<Vec<u16>>,
}

impl ConversionProfile {
    pub fn policy(&self) -> SpoofPolicy {
        match &self.spoofable_manufacturers {
            Some(list) => SpoofPolicy {
                manufacturers: list.clone(),
            },
            None => SpoofPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_identity_is_valid() {
        assert!(DeviceIdentity::default().validate().is_ok());
    }

    #[test]
    fn test_short_serial_rejected() {
        let identity = DeviceIdentity {
            serial_number: 999,
            ..Default::default()
        };
        assert!(matches!(
            identity.validate(),
            Err(IdentityError::SerialOutOfRange(999, _, _))
        ));
    }

    #[test]
    fn test_zero_ids_rejected() {
        let identity = DeviceIdentity {
            manufacturer: 0,
            ..Default::default()
        };
        assert!(matches!(identity.validate(), Err(IdentityError::ZeroManufacturer)));
    }

    #[test]
    fn test_policy_gates() {
        let policy = SpoofPolicy::default();
        assert!(policy.is_spoofable(260)); // ZWIFT
        assert!(!policy.is_spoofable(1)); // GARMIN itself
        assert!(!policy.is_spoofable(0));
        assert!(policy.admits_device_info(0));
        assert!(policy.admits_device_info(294)); // COROS
    }

    #[test]
    fn test_profile_json_roundtrip() {
        let json = r#"{
            "identity": {
                "manufacturer": 1,
                "product": 3843,
                "serial_number": 3999999999,
                "software_version": 2922
            },
            "spoofable_manufacturers": [260, 294]
        }"#;
        let profile: ConversionProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.identity.product, 3843);
        assert_eq!(profile.identity.software_version, Some(2922));
        let policy = profile.policy();
        assert!(policy.is_spoofable(260));
        assert!(!policy.is_spoofable(255));
    }

    #[test]
    fn test_empty_profile_uses_defaults() {
        let profile: ConversionProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile.identity.product, 3122);
        assert!(profile.policy().is_spoofable(331));
    }
}
