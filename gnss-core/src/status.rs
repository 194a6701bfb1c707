//! State aggregator: the single mutable snapshot of connectivity and
//! telephony state. Every mutation pushes exactly one notification through
//! the sink before returning; the snapshot is never read back over the wire.

use std::fmt;
use std::sync::Arc;

use crate::apn::ApnRecord;
use crate::clock;
use crate::proto;

/// Outbound seam between the aggregator and the link. Implementations must
/// be best-effort and non-blocking: a failed send is the sink's problem, the
/// state mutation itself still succeeds.
pub trait MessageSink: Send + Sync {
    fn send_text(&self, text: &str);
}

/// Airplane-mode value converted at the boundary; the raw platform extra is
/// not carried through the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirplaneMode {
    Unknown,
    On,
    Off,
}

impl From<Option<bool>> for AirplaneMode {
    fn from(state: Option<bool>) -> Self {
        match state {
            Some(true) => AirplaneMode::On,
            Some(false) => AirplaneMode::Off,
            None => AirplaneMode::Unknown,
        }
    }
}

impl fmt::Display for AirplaneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AirplaneMode::Unknown => write!(f, "unknown"),
            AirplaneMode::On => write!(f, "true"),
            AirplaneMode::Off => write!(f, "false"),
        }
    }
}

/// Current network operator. Mutable in place: observation callbacks update
/// one long-lived record as new readings arrive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorRecord {
    pub name: String,
    pub mcc: String,
    pub mnc: String,
}

impl OperatorRecord {
    pub fn new(name: &str, mcc: &str, mnc: &str) -> Self {
        Self {
            name: name.trim().to_owned(),
            mcc: mcc.trim().to_owned(),
            mnc: mnc.trim().to_owned(),
        }
    }
}

/// The snapshot plus its sink. One setter per tracked field; `send_all`
/// re-emits the whole snapshot in a fixed order.
pub struct Status {
    sink: Arc<dyn MessageSink>,
    apn: Option<ApnRecord>,
    operator: OperatorRecord,
    network_info: String,
    other_network_info: String,
    background_data: bool,
    mobile_data_allowed: bool,
    roaming_allowed: bool,
    no_connectivity: bool,
    airplane_mode: AirplaneMode,
    data_state: String,
    time: String,
}

impl Status {
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self {
            sink,
            apn: None,
            operator: OperatorRecord::default(),
            network_info: String::new(),
            other_network_info: String::new(),
            background_data: false,
            mobile_data_allowed: false,
            roaming_allowed: false,
            no_connectivity: true,
            airplane_mode: AirplaneMode::Unknown,
            data_state: String::new(),
            time: clock::current_timestamp(),
        }
    }

    fn send(&self, text: &str) {
        self.sink.send_text(text);
    }

    fn send_apn(&self) {
        match &self.apn {
            Some(apn) => self.send(&proto::apn_info_message(apn)),
            None => self.send(proto::MSG_NO_APN_DEFINED),
        }
    }

    /// Re-emit the full snapshot. The order is fixed and consumed as-is by
    /// the peer.
    pub fn send_all(&self) {
        self.send_apn();
        self.send(&proto::operator_info_message(&self.operator));
        self.send(&proto::scalar_message(
            proto::MSG_EXTRA_NETWORK_INFO,
            &self.network_info,
        ));
        self.send(&proto::scalar_message(
            proto::MSG_EXTRA_OTHER_NETWORK_INFO,
            &self.other_network_info,
        ));
        self.send(&proto::scalar_message(
            proto::MSG_BACKGROUND_DATA_SETTING,
            self.background_data,
        ));
        self.send(&proto::scalar_message(
            proto::MSG_MOBILE_DATA_ALLOWED,
            self.mobile_data_allowed,
        ));
        self.send(&proto::scalar_message(
            proto::MSG_ROAMING_ALLOWED,
            self.roaming_allowed,
        ));
        self.send(&proto::scalar_message(
            proto::MSG_EXTRA_NO_CONNECTIVITY,
            self.no_connectivity,
        ));
        self.send(&proto::scalar_message(
            proto::MSG_AIRPLANE_MODE,
            self.airplane_mode,
        ));
        self.send(&proto::scalar_message(
            proto::MSG_ANY_DATA_STATE,
            &self.data_state,
        ));
    }

    pub fn apn(&self) -> Option<&ApnRecord> {
        self.apn.as_ref()
    }

    /// `None` means no preferred APN could be selected; the peer is told via
    /// the sentinel, not an error.
    pub fn set_apn(&mut self, apn: Option<ApnRecord>) {
        self.apn = apn;
        self.send_apn();
    }

    pub fn operator(&self) -> &OperatorRecord {
        &self.operator
    }

    pub fn set_operator(&mut self, operator: OperatorRecord) {
        self.operator = operator;
        self.send(&proto::operator_info_message(&self.operator));
    }

    pub fn set_network_info(&mut self, info: String) {
        self.network_info = info;
        self.send(&proto::scalar_message(
            proto::MSG_EXTRA_NETWORK_INFO,
            &self.network_info,
        ));
    }

    pub fn set_other_network_info(&mut self, info: String) {
        self.other_network_info = info;
        self.send(&proto::scalar_message(
            proto::MSG_EXTRA_OTHER_NETWORK_INFO,
            &self.other_network_info,
        ));
    }

    pub fn set_background_data(&mut self, enabled: bool) {
        self.background_data = enabled;
        self.send(&proto::scalar_message(
            proto::MSG_BACKGROUND_DATA_SETTING,
            enabled,
        ));
    }

    pub fn set_mobile_data_allowed(&mut self, allowed: bool) {
        self.mobile_data_allowed = allowed;
        self.send(&proto::scalar_message(proto::MSG_MOBILE_DATA_ALLOWED, allowed));
    }

    pub fn set_roaming_allowed(&mut self, allowed: bool) {
        self.roaming_allowed = allowed;
        self.send(&proto::scalar_message(proto::MSG_ROAMING_ALLOWED, allowed));
    }

    pub fn set_no_connectivity(&mut self, no_connectivity: bool) {
        self.no_connectivity = no_connectivity;
        self.send(&proto::scalar_message(
            proto::MSG_EXTRA_NO_CONNECTIVITY,
            no_connectivity,
        ));
    }

    pub fn set_airplane_mode(&mut self, mode: AirplaneMode) {
        self.airplane_mode = mode;
        self.send(&proto::scalar_message(proto::MSG_AIRPLANE_MODE, mode));
    }

    pub fn data_state(&self) -> &str {
        &self.data_state
    }

    pub fn set_data_state(&mut self, state: String) {
        self.data_state = state;
        self.send(&proto::scalar_message(
            proto::MSG_ANY_DATA_STATE,
            &self.data_state,
        ));
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    /// Recompute the stored timestamp from the wall clock. Not pushed; the
    /// peer asks for time through other channels.
    pub fn refresh_time(&mut self) {
        self.time = clock::current_timestamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<String>>,
    }

    impl MessageSink for RecordingSink {
        fn send_text(&self, text: &str) {
            self.messages.lock().unwrap().push(text.to_owned());
        }
    }

    impl RecordingSink {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut self.messages.lock().unwrap())
        }
    }

    fn status() -> (Arc<RecordingSink>, Status) {
        let sink = Arc::new(RecordingSink::default());
        let status = Status::new(sink.clone());
        (sink, status)
    }

    #[test]
    fn each_setter_pushes_exactly_one_message() {
        let (sink, mut status) = status();
        status.set_background_data(true);
        assert_eq!(sink.take(), vec!["BACKGROUND_DATA_SETTING:true"]);
        status.set_mobile_data_allowed(false);
        assert_eq!(sink.take(), vec!["MOBILE_DATA_ALLOWED:false"]);
        status.set_roaming_allowed(true);
        assert_eq!(sink.take(), vec!["ROAMING_ALLOWED:true"]);
        status.set_no_connectivity(false);
        assert_eq!(sink.take(), vec!["EXTRA_NO_CONNECTIVITY:false"]);
        status.set_airplane_mode(AirplaneMode::On);
        assert_eq!(sink.take(), vec!["AIRPLANE_MODE:true"]);
        status.set_data_state("connected".to_owned());
        assert_eq!(sink.take(), vec!["ANY_DATA_STATE:connected"]);
        status.set_network_info("type=0\nroaming=false".to_owned());
        assert_eq!(sink.take(), vec!["EXTRA_NETWORK_INFO:type=0\nroaming=false"]);
    }

    #[test]
    fn apn_setter_sends_record_or_sentinel() {
        let (sink, mut status) = status();
        let apn = ApnRecord::new("supl.example", "", "", "240", "01", "supl", "0", "1");
        status.set_apn(Some(apn));
        let msgs = sink.take();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].starts_with("APN_INFO:default=1\napn=supl.example\n"));

        status.set_apn(None);
        assert_eq!(sink.take(), vec!["NO_APN_DEFINED"]);
    }

    #[test]
    fn operator_setter_pushes_record() {
        let (sink, mut status) = status();
        status.set_operator(OperatorRecord::new("Operator", "240", "01"));
        assert_eq!(sink.take(), vec!["OPERATOR_INFO:name=Operator\nmcc=240\nmnc=01"]);
    }

    #[test]
    fn send_all_order_is_fixed() {
        let (sink, status) = status();
        status.send_all();
        let msgs = sink.take();
        let topics: Vec<&str> = msgs
            .iter()
            .map(|m| m.split(':').next().unwrap())
            .collect();
        assert_eq!(
            topics,
            vec![
                "NO_APN_DEFINED",
                "OPERATOR_INFO",
                "EXTRA_NETWORK_INFO",
                "EXTRA_OTHER_NETWORK_INFO",
                "BACKGROUND_DATA_SETTING",
                "MOBILE_DATA_ALLOWED",
                "ROAMING_ALLOWED",
                "EXTRA_NO_CONNECTIVITY",
                "AIRPLANE_MODE",
                "ANY_DATA_STATE",
            ]
        );
    }

    #[test]
    fn snapshot_defaults() {
        let (sink, status) = status();
        status.send_all();
        let msgs = sink.take();
        assert!(msgs.contains(&"BACKGROUND_DATA_SETTING:false".to_owned()));
        assert!(msgs.contains(&"EXTRA_NO_CONNECTIVITY:true".to_owned()));
        assert!(msgs.contains(&"AIRPLANE_MODE:unknown".to_owned()));
        assert!(msgs.contains(&"ANY_DATA_STATE:".to_owned()));
    }

    #[test]
    fn airplane_mode_boundary_conversion() {
        assert_eq!(AirplaneMode::from(Some(true)), AirplaneMode::On);
        assert_eq!(AirplaneMode::from(Some(false)), AirplaneMode::Off);
        assert_eq!(AirplaneMode::from(None), AirplaneMode::Unknown);
    }

    #[test]
    fn refresh_time_updates_stamp() {
        let (_sink, mut status) = status();
        let before = status.time().to_owned();
        status.refresh_time();
        assert_eq!(status.time().len(), before.len());
    }
}
