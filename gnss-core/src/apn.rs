//! APN records and preferred-APN selection.

/// One access-point configuration row. All fields are trimmed at construction
/// and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApnRecord {
    pub apn: String,
    pub username: String,
    pub password: String,
    pub mcc: String,
    pub mnc: String,
    pub apn_type: String,
    pub auth_type: String,
    /// Raw "current" flag from the carrier table. The source format is
    /// uncertain (possibly a bitmask or multi-flag string), so activity is
    /// a substring check, not an equality check.
    pub current: String,
}

impl ApnRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        apn: &str,
        username: &str,
        password: &str,
        mcc: &str,
        mnc: &str,
        apn_type: &str,
        auth_type: &str,
        current: &str,
    ) -> Self {
        Self {
            apn: apn.trim().to_owned(),
            username: username.trim().to_owned(),
            password: password.trim().to_owned(),
            mcc: mcc.trim().to_owned(),
            mnc: mnc.trim().to_owned(),
            apn_type: apn_type.trim().to_owned(),
            auth_type: auth_type.trim().to_owned(),
            current: current.trim().to_owned(),
        }
    }

    /// Whether this record is marked active in the carrier table.
    pub fn is_active(&self) -> bool {
        self.current.contains('1')
    }
}

/// Pick the access point to use for assistance-data sessions: scan once in
/// input order, keep the last active SUPL-type record and the last active
/// default-type record, prefer SUPL. SUPL-over-default is a hard contract;
/// assistance-data routing depends on it.
pub fn select_preferred(candidates: &[ApnRecord]) -> Option<&ApnRecord> {
    let mut supl = None;
    let mut default = None;

    for record in candidates {
        if !record.is_active() {
            continue;
        }
        let ty = record.apn_type.to_lowercase();
        if ty.contains("supl") {
            supl = Some(record);
        } else if ty.contains("internet") || ty.contains("default") || ty.contains('*') || ty.is_empty()
        {
            default = Some(record);
        }
    }

    supl.or(default)
}
