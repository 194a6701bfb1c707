//! External event feed: JSON lines standing in for the platform broadcast,
//! settings and provider sources. Each line is one event; malformed lines
//! are logged and skipped.

use std::sync::Arc;

use gnss_core::apn::{select_preferred, ApnRecord};
use gnss_core::{AirplaneMode, OperatorRecord, Status};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::supervisor::Supervisor;

/// Raw APN candidate row as delivered by the external record source. Field
/// names follow the carrier table columns.
#[derive(Debug, Deserialize)]
pub struct RawApn {
    #[serde(default)]
    pub apn: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub mcc: String,
    #[serde(default)]
    pub mnc: String,
    #[serde(rename = "type", default)]
    pub apn_type: String,
    #[serde(default)]
    pub authtype: String,
    #[serde(default)]
    pub current: String,
}

impl RawApn {
    fn into_record(self) -> ApnRecord {
        // Access-point names are compared lowercase downstream.
        ApnRecord::new(
            &self.apn.to_lowercase(),
            &self.user,
            &self.password,
            &self.mcc,
            &self.mnc,
            &self.apn_type,
            &self.authtype,
            &self.current,
        )
    }
}

/// One input event. Raw platform values (settings integers, PLMN strings,
/// tri-state extras) are converted at this boundary, not inside the core.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    AirplaneMode {
        #[serde(default)]
        state: Option<bool>,
    },
    Connectivity {
        #[serde(default)]
        network: Option<String>,
        #[serde(default)]
        other_network: Option<String>,
        no_connectivity: bool,
    },
    BackgroundData {
        enabled: bool,
    },
    PhoneState {
        background_data: bool,
        mobile_data: i64,
        data_roaming: i64,
    },
    OperatorSeen {
        plmn: String,
        #[serde(default)]
        name: String,
    },
    DataState {
        state: String,
        background_data: bool,
        mobile_data: i64,
        data_roaming: i64,
        #[serde(default)]
        plmn: Option<String>,
        #[serde(default)]
        operator_name: Option<String>,
        #[serde(default)]
        candidates: Vec<RawApn>,
    },
    ClockChanged,
    ProvidersChanged,
}

/// Applies events to the aggregator. Keeps the one long-lived operator
/// record that observation callbacks update in place.
pub struct EventFeed {
    status: Arc<Mutex<Status>>,
    supervisor: Arc<Supervisor>,
    operator: OperatorRecord,
}

impl EventFeed {
    pub fn new(status: Arc<Mutex<Status>>, supervisor: Arc<Supervisor>) -> Self {
        Self {
            status,
            supervisor,
            operator: OperatorRecord::default(),
        }
    }

    /// Consume JSON-line events until the reader is exhausted.
    pub async fn run<R: AsyncBufRead + Unpin>(mut self, reader: R) {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Event>(line) {
                        Ok(event) => self.apply(event).await,
                        Err(e) => warn!(error = %e, "ignoring malformed event line"),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "event feed read failed");
                    break;
                }
            }
        }
        debug!("event feed closed");
    }

    pub async fn apply(&mut self, event: Event) {
        match event {
            Event::AirplaneMode { state } => {
                self.status
                    .lock()
                    .await
                    .set_airplane_mode(AirplaneMode::from(state));
            }
            Event::Connectivity {
                network,
                other_network,
                no_connectivity,
            } => {
                let mut status = self.status.lock().await;
                status.set_network_info(network.unwrap_or_default());
                status.set_other_network_info(other_network.unwrap_or_default());
                status.set_no_connectivity(no_connectivity);
            }
            Event::BackgroundData { enabled } => {
                self.status.lock().await.set_background_data(enabled);
            }
            Event::PhoneState {
                background_data,
                mobile_data,
                data_roaming,
            } => {
                self.apply_settings(background_data, mobile_data, data_roaming)
                    .await;
            }
            Event::OperatorSeen { plmn, name } => {
                self.update_operator(&plmn, &name).await;
            }
            Event::DataState {
                state,
                background_data,
                mobile_data,
                data_roaming,
                plmn,
                operator_name,
                candidates,
            } => {
                self.apply_settings(background_data, mobile_data, data_roaming)
                    .await;
                if let Some(plmn) = plmn {
                    self.update_operator(&plmn, operator_name.as_deref().unwrap_or(""))
                        .await;
                }
                // Only settled transitions update the data state and requery
                // the candidate list.
                if state == "CONNECTED" || state == "DISCONNECTED" {
                    let records: Vec<ApnRecord> =
                        candidates.into_iter().map(RawApn::into_record).collect();
                    let preferred = select_preferred(&records).cloned();
                    let mut status = self.status.lock().await;
                    status.set_data_state(state.to_lowercase());
                    status.set_apn(preferred);
                }
            }
            Event::ClockChanged => {
                self.status.lock().await.refresh_time();
            }
            Event::ProvidersChanged => {
                debug!("location providers changed, retriggering supervisor");
                let supervisor = self.supervisor.clone();
                tokio::spawn(async move {
                    supervisor.run().await;
                });
            }
        }
    }

    async fn apply_settings(&self, background_data: bool, mobile_data: i64, data_roaming: i64) {
        let mut status = self.status.lock().await;
        status.set_background_data(background_data);
        status.set_mobile_data_allowed(mobile_data == 1);
        status.set_roaming_allowed(data_roaming == 1);
    }

    /// A PLMN shorter than five characters carries no usable MCC/MNC pair.
    async fn update_operator(&mut self, plmn: &str, name: &str) {
        if plmn.len() < 5 {
            debug!(plmn, "ignoring short operator reading");
            return;
        }
        let (Some(mcc), Some(mnc)) = (plmn.get(0..3), plmn.get(3..)) else {
            return;
        };
        self.operator.name = name.trim().to_owned();
        self.operator.mcc = mcc.to_owned();
        self.operator.mnc = mnc.to_owned();
        self.status
            .lock()
            .await
            .set_operator(self.operator.clone());
    }
}
