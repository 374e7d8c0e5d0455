//! Subscriber Document Types
//!
//! Field names, lengths and default values for subscriber documents stored in
//! the shared `subscribers` collection.

use serde::{Deserialize, Serialize};

// Identifier and credential lengths (hex digits)
pub const IMSI_MIN_LEN: usize = 14;
pub const IMSI_MAX_LEN: usize = 15;
pub const KEY_HEX_LEN: usize = 32;
pub const AMF_HEX_LEN: usize = 4;
pub const SD_HEX_LEN: usize = 6;
pub const MAX_NAME_LEN: usize = 100;

// Defaults
pub const DEFAULT_SCHEMA_VERSION: i32 = 1;
pub const DEFAULT_AMF: &str = "8000";
pub const DEFAULT_SST: i32 = 1;
pub const DEFAULT_SD: &str = "000001";
pub const DEFAULT_APN: &str = "internet";
pub const DEFAULT_QOS_INDEX: i32 = 9;
pub const DEFAULT_ARP_PRIORITY_LEVEL: i32 = 8;
pub const DEFAULT_PRE_EMPTION_CAPABILITY: i32 = 1;
pub const DEFAULT_PRE_EMPTION_VULNERABILITY: i32 = 2;
pub const DEFAULT_AMBR_VALUE: i64 = 1_000_000_000;
pub const DEFAULT_ACCESS_RESTRICTION_DATA: i32 = 32;
pub const DEFAULT_RAU_TAU_TIMER: i32 = 12;

// MongoDB field names
pub const IMSI_STRING: &str = "imsi";
pub const NAME_STRING: &str = "name";
pub const SLICE_STRING: &str = "slice";
pub const SST_STRING: &str = "sst";
pub const SD_STRING: &str = "sd";
pub const SESSION_STRING: &str = "session";
pub const UE_STRING: &str = "ue";

/// Bit-rate unit, stored as its integer code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum AmbrUnit {
    #[default]
    Bps = 0,
    Kbps = 1,
    Mbps = 2,
    Gbps = 3,
    Tbps = 4,
}

impl AmbrUnit {
    /// Multiplier to convert a value in this unit to bits per second
    pub fn multiplier(self) -> u64 {
        match self {
            AmbrUnit::Bps => 1,
            AmbrUnit::Kbps => 1_000,
            AmbrUnit::Mbps => 1_000_000,
            AmbrUnit::Gbps => 1_000_000_000,
            AmbrUnit::Tbps => 1_000_000_000_000,
        }
    }
}

impl TryFrom<i32> for AmbrUnit {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(AmbrUnit::Bps),
            1 => Ok(AmbrUnit::Kbps),
            2 => Ok(AmbrUnit::Mbps),
            3 => Ok(AmbrUnit::Gbps),
            4 => Ok(AmbrUnit::Tbps),
            other => Err(format!("invalid AMBR unit {other} (expected 0..=4)")),
        }
    }
}

impl From<AmbrUnit> for i32 {
    fn from(unit: AmbrUnit) -> Self {
        unit as i32
    }
}

/// PDN type of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum PdnType {
    Ipv4 = 1,
    Ipv6 = 2,
    #[default]
    Ipv4v6 = 3,
}

impl TryFrom<i32> for PdnType {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(PdnType::Ipv4),
            2 => Ok(PdnType::Ipv6),
            3 => Ok(PdnType::Ipv4v6),
            other => Err(format!("invalid PDN type {other} (expected 1, 2 or 3)")),
        }
    }
}

impl From<PdnType> for i32 {
    fn from(pdn_type: PdnType) -> Self {
        pdn_type as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambr_unit_codes() {
        assert_eq!(AmbrUnit::try_from(3), Ok(AmbrUnit::Gbps));
        assert_eq!(i32::from(AmbrUnit::Tbps), 4);
        assert!(AmbrUnit::try_from(5).is_err());
        assert_eq!(AmbrUnit::Mbps.multiplier(), 1_000_000);
    }

    #[test]
    fn test_pdn_type_serde() {
        let json = serde_json::to_string(&PdnType::Ipv6).unwrap();
        assert_eq!(json, "2");

        let parsed: PdnType = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, PdnType::Ipv4);

        assert!(serde_json::from_str::<PdnType>("0").is_err());
    }
}
