use super::structs::{SmlFile, SmlListEntry, SmlMessageBody, ObisCode};
use super::units::UnitTable;
use super::utils::apply_scaler;
use crate::models::{Measurement, PowerReadings};
use log::warn;

/// The two readings this exporter extracts from a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerSlot {
    CurrentPower,
    TotalEnergy,
}

impl PowerSlot {
    /// Classify an OBIS code by its C.D.E groups: `1.8.0` is the active
    /// energy total, `16.7.0` the summed instantaneous power. Everything
    /// else a meter reports is not of interest here.
    pub fn from_obis(obis: &ObisCode) -> Option<Self> {
        match obis.short_code().as_str() {
            "1.8.0" => Some(PowerSlot::TotalEnergy),
            "16.7.0" => Some(PowerSlot::CurrentPower),
            _ => None,
        }
    }
}

/// Walk every GetList response in the frame and pick out the entries that
/// carry one of the recognized readings, in scan order.
///
/// Rows without a value are skipped with a warning, rows with a non-numeric
/// value silently; the scan never aborts on a bad row. Duplicate matches
/// for the same slot all stay in the result, the caller keeps the last one.
pub fn select_power_entries(file: &SmlFile) -> Vec<(&SmlListEntry, PowerSlot)> {
    let mut selected = Vec::new();

    for message in &file.messages {
        let response = match &message.message_body {
            SmlMessageBody::GetListResponse(response) => response,
            _ => continue,
        };

        for entry in &response.val_list {
            let value = match &entry.value {
                Some(value) => value,
                None => {
                    warn!("List entry {} carries no value, skipping it", entry.obis);
                    continue;
                }
            };

            if value.as_f64().is_none() {
                continue;
            }

            if let Some(slot) = PowerSlot::from_obis(&entry.obis) {
                selected.push((entry, slot));
            }
        }
    }

    selected
}

/// Turn a selected entry into a measurement: widen the raw integer, apply
/// the scaler exponent and resolve the unit code.
pub fn normalize_entry(entry: &SmlListEntry, units: &UnitTable) -> Option<Measurement> {
    let raw = entry.value.as_ref()?.as_f64()?;
    let value = apply_scaler(raw, entry.scaler);
    let unit = entry.unit.map(|code| units.resolve(code));
    Some(Measurement { value, unit })
}

/// Extract both power readings from a decoded frame. Pure: no I/O, no
/// shared state beyond the unit table, same frame gives the same result.
pub fn extract_power_data(file: &SmlFile, units: &UnitTable) -> PowerReadings {
    let mut readings = PowerReadings::default();

    for (entry, slot) in select_power_entries(file) {
        if let Some(measurement) = normalize_entry(entry, units) {
            match slot {
                PowerSlot::CurrentPower => readings.current_power = Some(measurement),
                PowerSlot::TotalEnergy => readings.total_energy = Some(measurement),
            }
        }
    }

    readings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metering_sml::structs::*;

    const OBIS_TOTAL: [u8; 6] = [1, 0, 1, 8, 0, 255];
    const OBIS_CURRENT: [u8; 6] = [1, 0, 16, 7, 0, 255];

    fn entry(
        obis: [u8; 6],
        value: Option<SmlValue>,
        scaler: Option<i8>,
        unit: Option<u8>,
    ) -> SmlListEntry {
        SmlListEntry {
            obis: ObisCode::new(obis),
            status: None,
            val_time: None,
            unit,
            scaler,
            value,
            value_signature: None,
        }
    }

    fn message(body: SmlMessageBody) -> SmlMessage {
        SmlMessage {
            transaction_id: vec![0x01],
            group_no: 0,
            abort_on_error: 0,
            message_body: body,
            crc: None,
            end_of_message: 0,
        }
    }

    fn list_frame(entries: Vec<SmlListEntry>) -> SmlFile {
        SmlFile {
            messages: vec![message(SmlMessageBody::GetListResponse(SmlGetListResponse {
                client_id: None,
                server_id: Some(vec![0x06, 0x45, 0x4d, 0x48]),
                list_name: None,
                act_sensor_time: None,
                val_list: entries,
                list_signature: None,
                act_gateway_time: None,
            }))],
        }
    }

    #[test]
    fn test_slot_classification() {
        assert_eq!(
            PowerSlot::from_obis(&ObisCode::new(OBIS_TOTAL)),
            Some(PowerSlot::TotalEnergy)
        );
        assert_eq!(
            PowerSlot::from_obis(&ObisCode::new(OBIS_CURRENT)),
            Some(PowerSlot::CurrentPower)
        );
        // tariff register 1.8.1 is close but not one of ours
        assert_eq!(PowerSlot::from_obis(&ObisCode::new([1, 0, 1, 8, 1, 255])), None);
        assert_eq!(PowerSlot::from_obis(&ObisCode::new([129, 129, 199, 130, 3, 255])), None);
    }

    #[test]
    fn test_extract_both_readings() {
        let file = list_frame(vec![
            entry(OBIS_TOTAL, Some(SmlValue::UInt64(123741484)), Some(-1), Some(27)),
            entry(OBIS_CURRENT, Some(SmlValue::Int32(1635)), Some(-1), Some(30)),
        ]);
        let readings = extract_power_data(&file, &UnitTable::new());

        let total = readings.total_energy.expect("total energy present");
        assert!((total.value - 12374148.4).abs() < 1e-6);
        assert_eq!(total.unit.as_deref(), Some("Wh"));

        let current = readings.current_power.expect("current power present");
        assert!((current.value - 163.5).abs() < 1e-9);
        assert_eq!(current.unit.as_deref(), Some("W"));
        assert_eq!(current.format(), "163.5 W");
    }

    #[test]
    fn test_missing_unit_yields_bare_value() {
        let file = list_frame(vec![entry(
            OBIS_TOTAL,
            Some(SmlValue::UInt64(123741484)),
            Some(-1),
            None,
        )]);
        let readings = extract_power_data(&file, &UnitTable::new());

        let total = readings.total_energy.expect("total energy present");
        assert_eq!(total.unit, None);
        assert_eq!(total.format(), "12374148.4");
    }

    #[test]
    fn test_missing_scaler_means_exponent_zero() {
        let file = list_frame(vec![entry(
            OBIS_CURRENT,
            Some(SmlValue::UInt16(240)),
            None,
            Some(30),
        )]);
        let readings = extract_power_data(&file, &UnitTable::new());
        assert_eq!(readings.current_power.unwrap().value, 240.0);
    }

    #[test]
    fn test_last_match_wins() {
        let file = list_frame(vec![
            entry(OBIS_CURRENT, Some(SmlValue::UInt16(100)), Some(-1), Some(30)),
            entry(OBIS_CURRENT, Some(SmlValue::UInt16(163)), Some(-1), Some(30)),
        ]);
        let readings = extract_power_data(&file, &UnitTable::new());

        let current = readings.current_power.expect("current power present");
        assert!((current.value - 16.3).abs() < 1e-9);
    }

    #[test]
    fn test_non_numeric_values_are_skipped() {
        // a manufacturer string and a flag at matching addresses must not
        // become readings
        let file = list_frame(vec![
            entry(OBIS_TOTAL, Some(SmlValue::OctetString(b"EMH".to_vec())), None, None),
            entry(OBIS_CURRENT, Some(SmlValue::Bool(true)), None, None),
        ]);
        let readings = extract_power_data(&file, &UnitTable::new());
        assert!(readings.is_empty());
    }

    #[test]
    fn test_entries_without_value_are_skipped() {
        let file = list_frame(vec![
            entry(OBIS_TOTAL, None, Some(-1), Some(27)),
            entry(OBIS_CURRENT, Some(SmlValue::UInt16(1635)), Some(-1), Some(30)),
        ]);
        let readings = extract_power_data(&file, &UnitTable::new());
        assert!(readings.total_energy.is_none());
        assert!(readings.current_power.is_some());
    }

    #[test]
    fn test_unrelated_entries_are_ignored() {
        let file = list_frame(vec![
            entry([1, 0, 0, 0, 9, 255], Some(SmlValue::UInt32(7)), None, None),
            entry([1, 0, 32, 7, 0, 255], Some(SmlValue::UInt16(2301)), Some(-1), Some(37)),
        ]);
        let readings = extract_power_data(&file, &UnitTable::new());
        assert!(readings.is_empty());
    }

    #[test]
    fn test_non_list_messages_are_ignored() {
        let file = SmlFile {
            messages: vec![
                message(SmlMessageBody::Attention(SmlAttentionMessage {
                    server_id: None,
                    attention_no: vec![0x81],
                    attention_msg: None,
                })),
                message(SmlMessageBody::GetProcParameterResponse(
                    SmlGetProcParameterResponse {
                        server_id: None,
                        parameter_tree_path: vec![0x01],
                    },
                )),
            ],
        };
        let readings = extract_power_data(&file, &UnitTable::new());
        assert!(readings.is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let file = list_frame(vec![
            entry(OBIS_TOTAL, Some(SmlValue::UInt64(123741484)), Some(-1), Some(27)),
            entry(OBIS_CURRENT, Some(SmlValue::Int32(1635)), Some(-1), Some(30)),
        ]);
        let units = UnitTable::new();
        let first = extract_power_data(&file, &units);
        let second = extract_power_data(&file, &units);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_unit_code_still_produces_reading() {
        let file = list_frame(vec![entry(
            OBIS_CURRENT,
            Some(SmlValue::UInt16(1635)),
            Some(-1),
            Some(200),
        )]);
        let readings = extract_power_data(&file, &UnitTable::new());

        let current = readings.current_power.expect("current power present");
        let unit = current.unit.expect("fallback unit present");
        assert!(!unit.is_empty());
        assert_eq!(unit, "200");
    }
}
