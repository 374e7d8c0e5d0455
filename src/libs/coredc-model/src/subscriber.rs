//! Subscriber Record Model
//!
//! The subscriber document graph (slices, sessions, QoS, security) together
//! with the defaults applied to omitted fields and the validation that turns
//! untrusted input into a [`ValidatedSubscriber`].

use std::net::{Ipv4Addr, Ipv6Addr};
use std::ops::Deref;

use bson::oid::ObjectId;
use bson::Bson;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::validate::{
    validate_hex, validate_imsi, validate_security, ValidationError, ValidationResult,
};

/// Accept `_id` either as a plain string or as a BSON ObjectId
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Bson>::deserialize(deserializer)? {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::String(s)) => Ok(Some(s)),
        Some(Bson::ObjectId(oid)) => Ok(Some(oid.to_hex())),
        Some(other) => Err(de::Error::custom(format!(
            "invalid _id of type {:?}",
            other.element_type()
        ))),
    }
}

fn generate_id() -> String {
    ObjectId::new().to_hex()
}

fn default_schema_version() -> i32 {
    DEFAULT_SCHEMA_VERSION
}

fn default_amf() -> String {
    DEFAULT_AMF.to_string()
}

fn default_sst() -> i32 {
    DEFAULT_SST
}

fn default_sd() -> Option<String> {
    Some(DEFAULT_SD.to_string())
}

fn default_true() -> bool {
    true
}

fn default_apn() -> String {
    DEFAULT_APN.to_string()
}

fn default_qos_index() -> i32 {
    DEFAULT_QOS_INDEX
}

fn default_access_restriction_data() -> i32 {
    DEFAULT_ACCESS_RESTRICTION_DATA
}

fn default_rau_tau_timer() -> i32 {
    DEFAULT_RAU_TAU_TIMER
}

/// A bit rate with its unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbrValue {
    pub value: i64,
    pub unit: AmbrUnit,
}

impl AmbrValue {
    pub fn new(value: i64, unit: AmbrUnit) -> Self {
        Self { value, unit }
    }

    /// Rate in bits per second, saturating on overflow
    pub fn bits_per_second(&self) -> u64 {
        (self.value.max(0) as u64).saturating_mul(self.unit.multiplier())
    }
}

impl Default for AmbrValue {
    fn default() -> Self {
        Self::new(DEFAULT_AMBR_VALUE, AmbrUnit::Bps)
    }
}

/// Aggregate Maximum Bit Rate (downlink/uplink)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ambr {
    #[serde(default)]
    pub downlink: AmbrValue,
    #[serde(default)]
    pub uplink: AmbrValue,
}

/// Allocation and Retention Priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arp {
    pub priority_level: i32,
    pub pre_emption_capability: i32,
    pub pre_emption_vulnerability: i32,
}

impl Default for Arp {
    fn default() -> Self {
        Self {
            priority_level: DEFAULT_ARP_PRIORITY_LEVEL,
            pre_emption_capability: DEFAULT_PRE_EMPTION_CAPABILITY,
            pre_emption_vulnerability: DEFAULT_PRE_EMPTION_VULNERABILITY,
        }
    }
}

/// QoS profile (QCI/5QI index + ARP)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qos {
    #[serde(default = "default_qos_index")]
    pub index: i32,
    #[serde(default)]
    pub arp: Arp,
}

impl Default for Qos {
    fn default() -> Self {
        Self {
            index: DEFAULT_QOS_INDEX,
            arp: Arp::default(),
        }
    }
}

/// Static UE address assignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UeAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,
}

/// Session (APN) inside a slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default = "default_apn")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub pdn_type: PdnType,
    #[serde(default)]
    pub qos: Qos,
    #[serde(default)]
    pub ambr: Ambr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ue: Option<UeAddress>,
    /// Policy and charging rules, kept opaque
    #[serde(default)]
    pub pcc_rule: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lbo_roaming_allowed: Option<bool>,
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            name: default_apn(),
            pdn_type: PdnType::default(),
            qos: Qos::default(),
            ambr: Ambr::default(),
            ue: None,
            pcc_rule: Vec::new(),
            lbo_roaming_allowed: None,
            id: None,
        }
    }
}

/// Network slice (S-NSSAI) with its sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    #[serde(default = "default_sst")]
    pub sst: i32,
    #[serde(default = "default_sd")]
    pub sd: Option<String>,
    #[serde(default = "default_true")]
    pub default_indicator: bool,
    pub session: Vec<Session>,
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
}

impl Slice {
    /// Slice with default SST/SD carrying the given sessions
    pub fn with_sessions(session: Vec<Session>) -> Self {
        Self {
            sst: DEFAULT_SST,
            sd: default_sd(),
            default_indicator: true,
            session,
            id: None,
        }
    }

    /// True if this slice has `sst` and, when given, `sd` (canonical form)
    pub fn matches(&self, sst: i32, sd: Option<&str>) -> bool {
        self.sst == sst && sd.map_or(true, |sd| self.sd.as_deref() == Some(sd))
    }
}

/// Authentication credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    pub k: String,
    #[serde(default = "default_amf")]
    pub amf: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opc: Option<String>,
}

/// Subscriber document stored in the `subscribers` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriberRecord {
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default = "default_schema_version")]
    pub schema_version: i32,
    pub imsi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub msisdn: Vec<String>,
    #[serde(default)]
    pub imeisv: Vec<String>,
    #[serde(default)]
    pub mme_host: Vec<String>,
    #[serde(default)]
    pub mm_realm: Vec<String>,
    #[serde(default)]
    pub purge_flag: Vec<bool>,
    pub slice: Vec<Slice>,
    pub security: Security,
    #[serde(default)]
    pub ambr: Ambr,
    #[serde(default = "default_access_restriction_data")]
    pub access_restriction_data: i32,
    #[serde(default)]
    pub network_access_mode: i32,
    #[serde(default)]
    pub subscriber_status: i32,
    #[serde(default)]
    pub operator_determined_barring: i32,
    #[serde(default = "default_rau_tau_timer")]
    pub subscribed_rau_tau_timer: i32,
    #[serde(rename = "__v", default)]
    pub v: i32,
}

impl SubscriberRecord {
    /// Record with every optional field at its default
    pub fn new(imsi: impl Into<String>, slice: Vec<Slice>, security: Security) -> Self {
        Self {
            id: None,
            schema_version: DEFAULT_SCHEMA_VERSION,
            imsi: imsi.into(),
            name: None,
            msisdn: Vec::new(),
            imeisv: Vec::new(),
            mme_host: Vec::new(),
            mm_realm: Vec::new(),
            purge_flag: Vec::new(),
            slice,
            security,
            ambr: Ambr::default(),
            access_restriction_data: DEFAULT_ACCESS_RESTRICTION_DATA,
            network_access_mode: 0,
            subscriber_status: 0,
            operator_determined_barring: 0,
            subscribed_rau_tau_timer: DEFAULT_RAU_TAU_TIMER,
            v: 0,
        }
    }

    /// Parse and validate an untrusted JSON document
    pub fn from_json(body: &str) -> ValidationResult<ValidatedSubscriber> {
        let record: SubscriberRecord = serde_json::from_str(body)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        record.validate()
    }

    /// Validate and canonicalise this record
    ///
    /// Consumes the record, so a failed validation leaves nothing behind.
    pub fn validate(mut self) -> ValidationResult<ValidatedSubscriber> {
        validate_imsi(&self.imsi)?;

        if let Some(name) = &self.name {
            let len = name.chars().count();
            if len > MAX_NAME_LEN {
                return Err(ValidationError::NameTooLong(len));
            }
        }

        if self.slice.is_empty() {
            return Err(ValidationError::Empty(SLICE_STRING.to_string()));
        }

        for (i, slice) in self.slice.iter_mut().enumerate() {
            validate_slice(i, slice)?;
        }

        let security = validate_security(
            &self.security.k,
            &self.security.amf,
            self.security.op.as_deref(),
            self.security.opc.as_deref(),
        )?;
        self.security = Security {
            k: security.k,
            amf: security.amf,
            op: security.op,
            opc: security.opc,
        };

        Ok(ValidatedSubscriber(self))
    }

    /// True if any slice carries `sst` (and `sd`, when given)
    pub fn has_slice(&self, sst: i32, sd: Option<&str>) -> bool {
        self.slice.iter().any(|slice| slice.matches(sst, sd))
    }
}

fn validate_slice(index: usize, slice: &mut Slice) -> ValidationResult<()> {
    if let Some(sd) = &slice.sd {
        slice.sd = Some(validate_hex(
            &format!("{SLICE_STRING}[{index}].{SD_STRING}"),
            sd,
            SD_HEX_LEN,
        )?);
    }

    if slice.session.is_empty() {
        return Err(ValidationError::Empty(format!(
            "{SLICE_STRING}[{index}].{SESSION_STRING}"
        )));
    }

    for (j, session) in slice.session.iter_mut().enumerate() {
        if let Some(ue) = &session.ue {
            let field = format!("{SLICE_STRING}[{index}].{SESSION_STRING}[{j}].{UE_STRING}");
            validate_ue_address(&field, ue)?;
        }
        if session.id.is_none() {
            session.id = Some(generate_id());
        }
    }

    if slice.id.is_none() {
        slice.id = Some(generate_id());
    }

    Ok(())
}

fn validate_ue_address(field: &str, ue: &UeAddress) -> ValidationResult<()> {
    if let Some(ipv4) = &ue.ipv4 {
        if ipv4.parse::<Ipv4Addr>().is_err() {
            return Err(ValidationError::InvalidIp {
                field: format!("{field}.ipv4"),
                value: ipv4.clone(),
            });
        }
    }
    if let Some(ipv6) = &ue.ipv6 {
        if ipv6.parse::<Ipv6Addr>().is_err() {
            return Err(ValidationError::InvalidIp {
                field: format!("{field}.ipv6"),
                value: ipv6.clone(),
            });
        }
    }
    Ok(())
}

/// A subscriber record that passed [`SubscriberRecord::validate`]
///
/// Only this type is accepted by storage write operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubscriber(SubscriberRecord);

impl ValidatedSubscriber {
    pub fn imsi(&self) -> &str {
        &self.0.imsi
    }

    /// Re-key the record to `imsi`, keeping the IMSI rule intact
    pub fn with_imsi(mut self, imsi: &str) -> ValidationResult<Self> {
        validate_imsi(imsi)?;
        self.0.imsi = imsi.to_string();
        Ok(self)
    }

    /// Drop the storage id so the store assigns (or keeps) its own
    pub fn without_id(mut self) -> Self {
        self.0.id = None;
        self
    }

    pub fn into_inner(self) -> SubscriberRecord {
        self.0
    }
}

impl Deref for ValidatedSubscriber {
    type Target = SubscriberRecord;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
