//! 소스 수집기 트레이트 정의
//!
//! The contract every retail source implements. A collector fetches raw
//! listings for all of its categories and reports either every record it
//! obtained or a single failure; a category that fails while others succeed is
//! a partial result, not an error.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::errors::CollectorError;
use crate::domain::records::{RawRecord, SourceId};

pub const DEFAULT_COLLECTOR_TIMEOUT: Duration = Duration::from_secs(60);

#[async_trait]
pub trait SourceCollector: Send + Sync {
    fn source_id(&self) -> &SourceId;

    /// Upper bound for one `fetch` call, enforced by the coordinator
    fn timeout(&self) -> Duration {
        DEFAULT_COLLECTOR_TIMEOUT
    }

    /// Fetches every category this source covers
    async fn fetch(&self) -> Result<Vec<RawRecord>, CollectorError>;
}
