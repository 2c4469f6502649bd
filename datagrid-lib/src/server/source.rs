//! Server data source contract.

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::DataSourceError;
use crate::model::FilterModel;
use crate::model::SortModel;

/// One page request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRequest {
    pub page: usize,
    pub page_size: usize,
    pub sort_model: SortModel,
    pub filter_model: FilterModel,
    pub quick_filter_text: String,
}

impl ServerRequest {
    /// Identity of the request for caching and stale-response detection.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// One page of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerResponse {
    pub data: Vec<Value>,
    /// Rows matching the request across all pages.
    pub total_rows: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Answers page requests for a grid in server mode.
///
/// Implementations should stop work and return
/// [`DataSourceError::Cancelled`] once `cancel` fires; the store has already
/// moved on to a newer request by then.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use datagrid_lib::error::DataSourceError;
/// use datagrid_lib::server::{ServerRequest, ServerResponse, ServerSideDataSource};
/// use tokio_util::sync::CancellationToken;
///
/// struct OrdersApi;
///
/// #[async_trait]
/// impl ServerSideDataSource for OrdersApi {
///     async fn get_rows(
///         &self,
///         request: ServerRequest,
///         cancel: CancellationToken,
///     ) -> Result<ServerResponse, DataSourceError> {
///         // Query the backend for one page...
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait ServerSideDataSource: Send + Sync {
    async fn get_rows(
        &self,
        request: ServerRequest,
        cancel: CancellationToken,
    ) -> Result<ServerResponse, DataSourceError>;
}
