// ── Metric source seam ──
//
// The traversal only needs sign-in plus the four listings. `ApiClient`
// is the production implementation; tests plug in an in-memory tree.

use std::future::Future;

use metricsnap_api::{
    ApiClient, AuthToken, Credentials, Device, Error, Indicator, MonitoredObject, Sample,
    TimeWindow,
};

/// Everything the exporter reads from the monitoring platform.
///
/// Futures must be `Send`: each call runs inside a spawned worker task.
pub trait MetricSource: Send + Sync + 'static {
    fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthToken, Error>> + Send;

    fn list_devices(
        &self,
        token: &AuthToken,
    ) -> impl Future<Output = Result<Vec<Device>, Error>> + Send;

    fn list_objects(
        &self,
        token: &AuthToken,
        device_id: i64,
    ) -> impl Future<Output = Result<Vec<MonitoredObject>, Error>> + Send;

    fn list_indicators(
        &self,
        token: &AuthToken,
        device_id: i64,
        object_id: i64,
    ) -> impl Future<Output = Result<Vec<Indicator>, Error>> + Send;

    fn list_samples(
        &self,
        token: &AuthToken,
        device_id: i64,
        object_id: i64,
        indicator_id: i64,
        window: TimeWindow,
    ) -> impl Future<Output = Result<Vec<Sample>, Error>> + Send;
}

impl MetricSource for ApiClient {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthToken, Error> {
        ApiClient::sign_in(self, credentials).await
    }

    async fn list_devices(&self, token: &AuthToken) -> Result<Vec<Device>, Error> {
        ApiClient::list_devices(self, token).await
    }

    async fn list_objects(
        &self,
        token: &AuthToken,
        device_id: i64,
    ) -> Result<Vec<MonitoredObject>, Error> {
        ApiClient::list_objects(self, token, device_id).await
    }

    async fn list_indicators(
        &self,
        token: &AuthToken,
        device_id: i64,
        object_id: i64,
    ) -> Result<Vec<Indicator>, Error> {
        ApiClient::list_indicators(self, token, device_id, object_id).await
    }

    async fn list_samples(
        &self,
        token: &AuthToken,
        device_id: i64,
        object_id: i64,
        indicator_id: i64,
        window: TimeWindow,
    ) -> Result<Vec<Sample>, Error> {
        ApiClient::list_samples(self, token, device_id, object_id, indicator_id, window).await
    }
}
