//! Configuration and constants for the CLI.

/// FIT epoch: 1989-12-31T00:00:00Z as a unix timestamp.
/// Timestamp fields count seconds from this instant.
pub const FIT_EPOCH_UNIX: i64 = 631_065_600;

/// Valid unit-id range for spoofed serial numbers (uint32z; real Garmin
/// unit ids are 10-digit values, so the low end is pinned there too)
pub const SERIAL_NUMBER_MIN: u32 = 1_000_000_000;
pub const SERIAL_NUMBER_MAX: u32 = u32::MAX;

/// Default simulated device: Garmin Edge 830
pub const DEFAULT_MANUFACTURER: u16 = 1; // GARMIN
pub const DEFAULT_PRODUCT: u16 = 3122; // EDGE_830
pub const DEFAULT_SERIAL_NUMBER: u32 = 1_234_567_890;

/// Manufacturers whose files qualify for identity substitution.
/// Extensible through the profile file without touching the codec.
pub const DEFAULT_SPOOFABLE_MANUFACTURERS: &[u16] = &[
    255, // DEVELOPMENT
    260, // ZWIFT
    32,  // WAHOO_FITNESS
    28,  // PEAKSWARE (TrainingPeaks Virtual)
    289, // HAMMERHEAD
    294, // COROS
    331, // MYWHOOSH
    307, // ONELAP
];

/// Suffix appended to the input stem when no output path is given
pub const OUTPUT_SUFFIX: &str = "_modified";

/// Upper bound on a declared record payload, well above any real activity
/// file; a larger declared length means a corrupt or hostile header.
pub const MAX_DATA_SIZE: usize = 64 * 1024 * 1024;

/// Protocol version stamped on output headers when the input had none
pub const DEFAULT_PROTOCOL_VERSION: u8 = 0x20;

/// Profile version stamped on output headers when the input had none
pub const DEFAULT_PROFILE_VERSION: u16 = 2195;
