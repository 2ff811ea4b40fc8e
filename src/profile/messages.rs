//! Field templates for the typed message subset.
//!
//! The rewrite pipeline only needs to look inside file-id, file-creator,
//! device-info, activity and software records; those kinds get field
//! templates here. Every other global id decodes as an opaque record and
//! round-trips byte-for-byte.

use crate::codec::data::DataRecord;
use crate::codec::field::{BaseType, Field, SubField};
use crate::profile::types::{manufacturer, mesg_num};

/// file_id field ids
pub mod file_id {
    pub const TYPE: u8 = 0;
    pub const MANUFACTURER: u8 = 1;
    pub const PRODUCT: u8 = 2;
    pub const SERIAL_NUMBER: u8 = 3;
    pub const TIME_CREATED: u8 = 4;
    pub const NUMBER: u8 = 5;
    pub const PRODUCT_NAME: u8 = 8;
}

/// file_creator field ids
pub mod file_creator {
    pub const SOFTWARE_VERSION: u8 = 0;
    pub const HARDWARE_VERSION: u8 = 1;
}

/// device_info field ids
pub mod device_info {
    pub const DEVICE_INDEX: u8 = 0;
    pub const DEVICE_TYPE: u8 = 1;
    pub const MANUFACTURER: u8 = 2;
    pub const SERIAL_NUMBER: u8 = 3;
    pub const PRODUCT: u8 = 4;
    pub const SOFTWARE_VERSION: u8 = 5;
    pub const HARDWARE_VERSION: u8 = 6;
    pub const BATTERY_VOLTAGE: u8 = 10;
    pub const BATTERY_STATUS: u8 = 11;
    pub const SOURCE_TYPE: u8 = 25;
    pub const PRODUCT_NAME: u8 = 27;
}

/// activity field ids
pub mod activity {
    pub const TIMESTAMP: u8 = 253;
    pub const TOTAL_TIMER_TIME: u8 = 0;
    pub const NUM_SESSIONS: u8 = 1;
    pub const TYPE: u8 = 2;
    pub const EVENT: u8 = 3;
    pub const EVENT_TYPE: u8 = 4;
    pub const LOCAL_TIMESTAMP: u8 = 5;
    pub const EVENT_GROUP: u8 = 6;
}

/// software field ids
pub mod software {
    pub const MESSAGE_INDEX: u8 = 254;
    pub const VERSION: u8 = 3;
    pub const PART_NUMBER: u8 = 5;
}

/// Manufacturers whose product field reads as a garmin_product value
const GARMIN_PRODUCT_MANUFACTURERS: &[u64] = &[
    manufacturer::GARMIN as u64,
    manufacturer::DYNASTREAM_OEM as u64,
    manufacturer::DYNASTREAM as u64,
    manufacturer::TACX as u64,
];

static FILE_ID_PRODUCT_VARIANTS: &[SubField] = &[SubField {
    name: "garmin_product",
    ref_field_id: file_id::MANUFACTURER,
    ref_values: GARMIN_PRODUCT_MANUFACTURERS,
}];

static DEVICE_INFO_PRODUCT_VARIANTS: &[SubField] = &[
    SubField {
        name: "garmin_product",
        ref_field_id: device_info::MANUFACTURER,
        ref_values: GARMIN_PRODUCT_MANUFACTURERS,
    },
    SubField {
        name: "favero_product",
        ref_field_id: device_info::MANUFACTURER,
        ref_values: &[manufacturer::FAVERO_ELECTRONICS as u64],
    },
];

static DEVICE_INFO_TYPE_VARIANTS: &[SubField] = &[
    SubField {
        name: "antplus_device_type",
        ref_field_id: device_info::SOURCE_TYPE,
        ref_values: &[1], // source_type: antplus
    },
    SubField {
        name: "ble_device_type",
        ref_field_id: device_info::SOURCE_TYPE,
        ref_values: &[3], // source_type: bluetooth_low_energy
    },
];

pub fn new_file_id() -> DataRecord {
    DataRecord::new(
        mesg_num::FILE_ID,
        "file_id",
        vec![
            Field::new(file_id::TYPE, "type", BaseType::Enum),
            Field::new(file_id::MANUFACTURER, "manufacturer", BaseType::UInt16),
            Field::with_sub_fields(
                file_id::PRODUCT,
                "product",
                BaseType::UInt16,
                FILE_ID_PRODUCT_VARIANTS,
            ),
            Field::new(file_id::SERIAL_NUMBER, "serial_number", BaseType::UInt32z),
            Field::new(file_id::TIME_CREATED, "time_created", BaseType::UInt32),
            Field::new(file_id::NUMBER, "number", BaseType::UInt16),
            Field::new(file_id::PRODUCT_NAME, "product_name", BaseType::String),
        ],
    )
}

pub fn new_file_creator() -> DataRecord {
    DataRecord::new(
        mesg_num::FILE_CREATOR,
        "file_creator",
        vec![
            Field::new(file_creator::SOFTWARE_VERSION, "software_version", BaseType::UInt16),
            Field::new(file_creator::HARDWARE_VERSION, "hardware_version", BaseType::UInt8),
        ],
    )
}

pub fn new_device_info() -> DataRecord {
    DataRecord::new(
        mesg_num::DEVICE_INFO,
        "device_info",
        vec![
            Field::new(device_info::DEVICE_INDEX, "device_index", BaseType::UInt8),
            Field::with_sub_fields(
                device_info::DEVICE_TYPE,
                "device_type",
                BaseType::UInt8,
                DEVICE_INFO_TYPE_VARIANTS,
            ),
            Field::new(device_info::MANUFACTURER, "manufacturer", BaseType::UInt16),
            Field::new(device_info::SERIAL_NUMBER, "serial_number", BaseType::UInt32z),
            Field::with_sub_fields(
                device_info::PRODUCT,
                "product",
                BaseType::UInt16,
                DEVICE_INFO_PRODUCT_VARIANTS,
            ),
            Field::new(device_info::SOFTWARE_VERSION, "software_version", BaseType::UInt16),
            Field::new(device_info::HARDWARE_VERSION, "hardware_version", BaseType::UInt8),
            Field::new(device_info::BATTERY_VOLTAGE, "battery_voltage", BaseType::UInt16),
            Field::new(device_info::BATTERY_STATUS, "battery_status", BaseType::UInt8),
            Field::new(device_info::SOURCE_TYPE, "source_type", BaseType::Enum),
            Field::new(device_info::PRODUCT_NAME, "product_name", BaseType::String),
        ],
    )
}

pub fn new_activity() -> DataRecord {
    DataRecord::new(
        mesg_num::ACTIVITY,
        "activity",
        vec![
            Field::new(activity::TIMESTAMP, "timestamp", BaseType::UInt32),
            Field::new(activity::TOTAL_TIMER_TIME, "total_timer_time", BaseType::UInt32),
            Field::new(activity::NUM_SESSIONS, "num_sessions", BaseType::UInt16),
            Field::new(activity::TYPE, "type", BaseType::Enum),
            Field::new(activity::EVENT, "event", BaseType::Enum),
            Field::new(activity::EVENT_TYPE, "event_type", BaseType::Enum),
            Field::new(activity::LOCAL_TIMESTAMP, "local_timestamp", BaseType::UInt32),
            Field::new(activity::EVENT_GROUP, "event_group", BaseType::UInt8),
        ],
    )
}

pub fn new_software() -> DataRecord {
    DataRecord::new(
        mesg_num::SOFTWARE,
        "software",
        vec![
            Field::new(software::MESSAGE_INDEX, "message_index", BaseType::UInt16),
            Field::new(software::VERSION, "version", BaseType::UInt16),
            Field::new(software::PART_NUMBER, "part_number", BaseType::String),
        ],
    )
}

/// Factory keyed by global message number.
/// Returns `None` for kinds outside the typed subset; the stream codec
/// carries those through as opaque records.
pub fn template_for(global_id: u16) -> Option<DataRecord> {
    match global_id {
        mesg_num::FILE_ID => Some(new_file_id()),
        mesg_num::FILE_CREATOR => Some(new_file_creator()),
        mesg_num::DEVICE_INFO => Some(new_device_info()),
        mesg_num::ACTIVITY => Some(new_activity()),
        mesg_num::SOFTWARE => Some(new_software()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::field::FieldValue;

    #[test]
    fn test_factory_covers_typed_subset() {
        for id in [0u16, 23, 34, 35, 49] {
            assert!(template_for(id).is_some(), "global id {} should be typed", id);
        }
        assert!(template_for(20).is_none()); // record samples stay opaque
        assert!(template_for(12345).is_none());
    }

    #[test]
    fn test_device_info_product_variant_resolution() {
        let mut rec = new_device_info();
        rec.set(device_info::MANUFACTURER, FieldValue::Unsigned(1));
        rec.set(device_info::PRODUCT, FieldValue::Unsigned(3122));
        assert_eq!(
            rec.field_display_name(device_info::PRODUCT),
            Some("garmin_product")
        );

        rec.set(device_info::MANUFACTURER, FieldValue::Unsigned(294));
        assert_eq!(rec.field_display_name(device_info::PRODUCT), Some("product"));
    }

    #[test]
    fn test_device_type_variant_resolution_by_source() {
        let mut rec = new_device_info();
        rec.set(device_info::DEVICE_TYPE, FieldValue::Unsigned(120));
        rec.set(device_info::SOURCE_TYPE, FieldValue::Unsigned(1));
        assert_eq!(
            rec.field_display_name(device_info::DEVICE_TYPE),
            Some("antplus_device_type")
        );
    }
}
