use log::warn;
use std::collections::HashMap;

/// Display names for the DLMS unit codes carried in SML list entries.
///
/// Built once at startup and handed by reference into the extraction; the
/// table is never mutated afterwards. The code domain is 0..=255 and sparse,
/// codes outside the table resolve to the code rendered as text so a reading
/// with an exotic unit still comes out annotated.
pub struct UnitTable {
    names: HashMap<u8, &'static str>,
}

impl UnitTable {
    pub fn new() -> Self {
        let mut names = HashMap::new();
        names.insert(1, "a"); // year
        names.insert(2, "mo"); // month
        names.insert(3, "wk"); // week
        names.insert(4, "d"); // day
        names.insert(5, "h"); // hour
        names.insert(6, "min"); // minute
        names.insert(7, "s"); // second
        names.insert(8, "°"); // degree
        names.insert(9, "°C"); // degree celsius
        names.insert(10, "K"); // kelvin
        names.insert(11, "m"); // meter
        names.insert(12, "dm");
        names.insert(13, "cm");
        names.insert(14, "mm");
        names.insert(15, "km");
        names.insert(16, "m²");
        names.insert(17, "m³");
        names.insert(18, "l"); // liter
        names.insert(19, "kg");
        names.insert(20, "g");
        names.insert(21, "t"); // ton
        names.insert(22, "N"); // newton
        names.insert(23, "Pa"); // pascal
        names.insert(24, "bar");
        names.insert(25, "J"); // joule
        names.insert(26, "kJ");
        names.insert(27, "Wh"); // watt hour
        names.insert(28, "kWh");
        names.insert(29, "MWh");
        names.insert(30, "W"); // watt
        names.insert(31, "kW");
        names.insert(32, "MW");
        names.insert(33, "var"); // volt ampere reactive
        names.insert(34, "kvar");
        names.insert(35, "VA"); // volt ampere
        names.insert(36, "kVA");
        names.insert(37, "V"); // volt
        names.insert(38, "mV");
        names.insert(39, "kV");
        names.insert(40, "A"); // ampere
        names.insert(41, "mA");
        names.insert(42, "kA");
        names.insert(43, "Ω"); // ohm
        names.insert(44, "mΩ");
        names.insert(45, "kΩ");
        names.insert(46, "F"); // farad
        names.insert(47, "C"); // coulomb
        names.insert(48, "Hz"); // hertz
        names.insert(49, "kHz");
        names.insert(50, "MHz");
        names.insert(51, "1/h"); // per hour
        names.insert(52, "1/d"); // per day
        names.insert(53, "1/wk");
        names.insert(54, "1/mo");
        names.insert(55, "1/a");
        UnitTable { names }
    }

    /// Resolve a unit code to its display string. Never empty: unknown codes
    /// come back as the decimal code itself.
    pub fn resolve(&self, code: u8) -> String {
        match self.names.get(&code) {
            Some(name) => (*name).to_string(),
            None => {
                warn!("Unknown unit code {}, keeping the numeric code", code);
                code.to_string()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_units() {
        let units = UnitTable::new();
        assert_eq!(units.resolve(30), "W");
        assert_eq!(units.resolve(27), "Wh");
        assert_eq!(units.resolve(37), "V");
    }

    #[test]
    fn test_unknown_unit_falls_back_to_code() {
        let units = UnitTable::new();
        let resolved = units.resolve(200);
        assert_eq!(resolved, "200");
        assert!(!resolved.is_empty());
    }

    #[test]
    fn test_table_is_populated() {
        let units = UnitTable::new();
        assert!(units.len() >= 55);
    }
}
