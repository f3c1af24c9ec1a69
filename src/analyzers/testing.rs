//! Shared analyzer fixtures for unit tests

use super::base::AnalysisContext;
use crate::config::ProjectConfig;
use crate::models::ResourceDescriptor;
use crate::providers::DirectoryProvider;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

pub struct Fixture {
    pub config: ProjectConfig,
    pub cancel: CancellationToken,
    pub as_of: DateTime<Utc>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            config: ProjectConfig::default(),
            cancel: CancellationToken::new(),
            as_of: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    pub fn days_ago(&self, days: i64) -> DateTime<Utc> {
        self.as_of - Duration::days(days)
    }

    pub fn context<'a>(
        &'a self,
        resources: &'a [ResourceDescriptor],
        directory: &'a dyn DirectoryProvider,
    ) -> AnalysisContext<'a> {
        AnalysisContext {
            resources,
            all_resources: resources,
            scheme: None,
            config: &self.config,
            directory,
            cancel: &self.cancel,
            as_of: self.as_of,
        }
    }
}
