mod client;
mod http;
mod models;
mod retry;

pub use client::{ArgocdClient, LogsQuery, SyncOptions};
pub use http::{ArgocdHttp, DEFAULT_TIMEOUT};
pub use models::{Application, array_of, str_or};
pub use retry::{RetryConfig, is_retryable_error, with_retry_if};
