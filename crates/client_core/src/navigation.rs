//! Browsing position <-> address string.
//!
//! The address is a form-urlencoded key/value list (the part after `#` in a viewer
//! link). Navigation owns the `tab`, `subtab`, `report`, `reportHash` and `run` keys;
//! anything else in the address belongs to other components and is never touched.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::domain::{ReportId, RunId};
use tracing::warn;
use url::form_urlencoded;

use crate::error::ViewerError;

pub const TAB_KEY: &str = "tab";
pub const SUBTAB_KEY: &str = "subtab";
pub const REPORT_KEY: &str = "report";
pub const REPORT_HASH_KEY: &str = "reportHash";
pub const RUN_KEY: &str = "run";
pub const RUN_HISTORY_SUBTAB: &str = "runHistory";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    entries: Vec<(String, String)>,
}

impl Address {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().trim_start_matches('#');
        let mut address = Self::default();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            address.set(key.into_owned(), value.into_owned());
        }
        address
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Merges `values` into the address; a `None` value removes the key.
    pub fn set_values<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in values {
            let key = key.into();
            match value {
                Some(value) => self.set(key, value),
                None => {
                    self.remove(&key);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.entries.iter())
            .finish();
        f.write_str(&encoded)
    }
}

/// Process-wide address shared by every controller.
pub type SharedAddress = Arc<Mutex<Address>>;

pub fn shared_address(address: Address) -> SharedAddress {
    Arc::new(Mutex::new(address))
}

pub fn lock_address(address: &SharedAddress) -> MutexGuard<'_, Address> {
    address.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NavigationView {
    #[default]
    Overview,
    RunHistory,
    Report {
        subtab: String,
        report: Option<ReportId>,
        run: Option<RunId>,
        report_hash: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub tab: Option<String>,
    pub view: NavigationView,
}

impl NavigationState {
    pub fn overview(tab: Option<String>) -> Self {
        Self {
            tab,
            view: NavigationView::Overview,
        }
    }

    pub fn run_history(tab: Option<String>) -> Self {
        Self {
            tab,
            view: NavigationView::RunHistory,
        }
    }

    pub fn report(
        tab: Option<String>,
        report: ReportId,
        run: Option<RunId>,
        report_hash: Option<String>,
    ) -> Self {
        Self {
            tab,
            view: NavigationView::Report {
                subtab: report.to_string(),
                report: Some(report),
                run,
                report_hash,
            },
        }
    }
}

/// Writes `state` into `address`, removing every navigation key the state does not use.
pub fn write(address: &mut Address, state: &NavigationState) {
    let tab = state.tab.clone();
    let (subtab, report, run, report_hash) = match &state.view {
        NavigationView::Overview => (None, None, None, None),
        NavigationView::RunHistory => (Some(RUN_HISTORY_SUBTAB.to_string()), None, None, None),
        NavigationView::Report {
            subtab,
            report,
            run,
            report_hash,
        } => (
            Some(subtab.clone()),
            report.map(|id| id.to_string()),
            run.map(|id| id.to_string()),
            report_hash.clone(),
        ),
    };

    address.set_values([
        (TAB_KEY, tab),
        (SUBTAB_KEY, subtab),
        (REPORT_KEY, report),
        (REPORT_HASH_KEY, report_hash),
        (RUN_KEY, run),
    ]);
}

pub fn encode(state: &NavigationState) -> String {
    let mut address = Address::default();
    write(&mut address, state);
    address.to_string()
}

pub fn try_decode(address: &Address) -> Result<NavigationState, ViewerError> {
    let tab = address.get(TAB_KEY).map(str::to_string);

    let view = match address.get(SUBTAB_KEY) {
        None => NavigationView::Overview,
        Some(RUN_HISTORY_SUBTAB) => NavigationView::RunHistory,
        Some("") => return Err(ViewerError::malformed("empty subtab")),
        Some(subtab) => NavigationView::Report {
            subtab: subtab.to_string(),
            report: parse_key(address, REPORT_KEY)?,
            run: parse_key(address, RUN_KEY)?,
            report_hash: address
                .get(REPORT_HASH_KEY)
                .filter(|hash| !hash.is_empty())
                .map(str::to_string),
        },
    };

    Ok(NavigationState { tab, view })
}

/// Like [`try_decode`], but an address that cannot be interpreted falls back to the
/// overview of the same tab.
pub fn decode(address: &Address) -> NavigationState {
    try_decode(address).unwrap_or_else(|err| {
        warn!(%err, address = %address, "falling back to overview");
        NavigationState::overview(address.get(TAB_KEY).map(str::to_string))
    })
}

fn parse_key<T: std::str::FromStr>(address: &Address, key: &str) -> Result<Option<T>, ViewerError> {
    match address.get(key) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ViewerError::malformed(format!("{key}={raw} is not an integer id"))),
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
