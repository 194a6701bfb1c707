//! Notification topics, command bytes and message text shared with the native peer.
//!
//! The peer parses values by substring (`true`/`false`) and fields by
//! `tag=` up to the next delimiter, so the exact layouts here are contract.

use crate::apn::ApnRecord;
use crate::status::OperatorRecord;

pub const MSG_AIRPLANE_MODE: &str = "AIRPLANE_MODE";
pub const MSG_EXTRA_NETWORK_INFO: &str = "EXTRA_NETWORK_INFO";
pub const MSG_EXTRA_OTHER_NETWORK_INFO: &str = "EXTRA_OTHER_NETWORK_INFO";
pub const MSG_EXTRA_NO_CONNECTIVITY: &str = "EXTRA_NO_CONNECTIVITY";
pub const MSG_BACKGROUND_DATA_SETTING: &str = "BACKGROUND_DATA_SETTING";
pub const MSG_MOBILE_DATA_ALLOWED: &str = "MOBILE_DATA_ALLOWED";
pub const MSG_ROAMING_ALLOWED: &str = "ROAMING_ALLOWED";
pub const MSG_ANY_DATA_STATE: &str = "ANY_DATA_STATE";
pub const MSG_APN_INFO: &str = "APN_INFO";
pub const MSG_NO_APN_DEFINED: &str = "NO_APN_DEFINED";
pub const MSG_OPERATOR_INFO: &str = "OPERATOR_INFO";
/// The `MSG_` prefix is part of the literal the peer matches on.
pub const MSG_PGPS_DATA: &str = "MSG_PGPS_DATA";

/// Field delimiter used in every multi-field payload, including the inbound
/// download command.
pub const MSG_DELIMITER: &str = "\n";

/// Inbound command bytes read by the command loop.
pub const CMD_DOWNLOAD_PGPS_DATA: u8 = 1;
pub const CMD_QUIT: u8 = 2;
pub const CMD_SEND_ALL_INFO: u8 = 3;

/// Single-value notification: `<TOPIC>:<value>`.
pub fn scalar_message(topic: &str, value: impl std::fmt::Display) -> String {
    format!("{topic}:{value}")
}

/// APN notification. Trailing delimiter included; the peer's field parser
/// needs a delimiter after the last tag.
pub fn apn_info_message(apn: &ApnRecord) -> String {
    format!(
        "{}:default={}{d}apn={}{d}user={}{d}pass={}{d}mcc={}{d}mnc={}{d}type={}{d}authtype={}{d}",
        MSG_APN_INFO,
        apn.current,
        apn.apn,
        apn.username,
        apn.password,
        apn.mcc,
        apn.mnc,
        apn.apn_type,
        apn.auth_type,
        d = MSG_DELIMITER,
    )
}

pub fn operator_info_message(operator: &OperatorRecord) -> String {
    format!(
        "{}:name={}{d}mcc={}{d}mnc={}",
        MSG_OPERATOR_INFO,
        operator.name,
        operator.mcc,
        operator.mnc,
        d = MSG_DELIMITER,
    )
}

/// Download completion: id and the absolute path the data was written to.
pub fn pgps_data_ready_message(id: i64, path: &str) -> String {
    format!(
        "{}:{d}id={id}{d}path={path}{d}",
        MSG_PGPS_DATA,
        d = MSG_DELIMITER,
    )
}

/// Download failure, whatever the cause.
pub fn pgps_data_failed_message() -> String {
    format!("{MSG_PGPS_DATA}:failed")
}
