//! Test fixtures shared by the crates of this workspace.

use serde_json::json;

use crate::subscriber::{Security, Session, Slice, SubscriberRecord};

/// K from 3GPP TS 35.208 test set 1
pub const TEST_K: &str = "465B5CE8B199B49FAA5F0A2EE238A6BC";
/// OPc from 3GPP TS 35.208 test set 1
pub const TEST_OPC: &str = "CD63CB71954A9F4E48A5994E37A02BAF";

/// Minimal valid subscriber: one default slice, one default session, OPc auth
pub fn sample_subscriber(imsi: &str) -> SubscriberRecord {
    SubscriberRecord::new(
        imsi,
        vec![Slice::with_sessions(vec![Session::default()])],
        Security {
            k: TEST_K.to_string(),
            amf: "8000".to_string(),
            op: None,
            opc: Some(TEST_OPC.to_string()),
        },
    )
}

/// JSON body equivalent to [`sample_subscriber`], as a client would send it
pub fn sample_json(imsi: &str) -> serde_json::Value {
    json!({
        "imsi": imsi,
        "slice": [{
            "sst": 1,
            "sd": "000001",
            "default_indicator": true,
            "session": [{
                "name": "internet",
                "type": 3,
                "qos": { "index": 9, "arp": { "priority_level": 8, "pre_emption_capability": 1, "pre_emption_vulnerability": 2 } },
                "ambr": { "downlink": { "value": 1, "unit": 3 }, "uplink": { "value": 1, "unit": 3 } }
            }]
        }],
        "security": { "k": TEST_K, "amf": "8000", "opc": TEST_OPC }
    })
}
