//! Notices shown to network administrators

use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// No site has a language yet, so nothing can be translated
    NoSiteRelations,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::NoSiteRelations => {
                "MultilingualPress is active, but no site has a language yet. \
                 Assign languages and relate sites to start translating."
            }
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Notices raised during this request, each at most once
#[derive(Debug, Default)]
pub struct Notices {
    raised: Mutex<Vec<Notice>>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a notice; returns false if it was already raised
    pub fn raise(&self, notice: Notice) -> bool {
        let mut raised = self.raised.lock();
        if raised.contains(&notice) {
            return false;
        }

        info!(?notice, "raising admin notice");
        raised.push(notice);
        true
    }

    pub fn all(&self) -> Vec<Notice> {
        self.raised.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.raised.lock().is_empty()
    }
}
