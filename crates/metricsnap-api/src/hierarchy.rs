// Hierarchy listings
//
// devices → objects → indicators → data. The three listings share the
// `Page<T>` envelope and pagination; the data endpoint is a bare array
// filtered by a time window.

use tracing::debug;

use crate::auth::AuthToken;
use crate::client::{ApiClient, EmptyBody, decode, is_empty_sentinel};
use crate::error::Error;
use crate::models::{Device, Indicator, MonitoredObject, Sample, TimeWindow};

impl ApiClient {
    /// List every device: `GET devices?page=N&size=S`.
    ///
    /// A `[]` body is an [`Error::EmptyResponse`]; a run without devices
    /// has nothing to export.
    pub async fn list_devices(&self, token: &AuthToken) -> Result<Vec<Device>, Error> {
        let devices = self
            .get_paged("devices", token, EmptyBody::Reject)
            .await?;
        debug!(count = devices.len(), "listed devices");
        Ok(devices)
    }

    /// List the objects of one device: `GET devices/{d}/objects`.
    pub async fn list_objects(
        &self,
        token: &AuthToken,
        device_id: i64,
    ) -> Result<Vec<MonitoredObject>, Error> {
        self.get_paged(
            &format!("devices/{device_id}/objects"),
            token,
            EmptyBody::AsEmpty,
        )
        .await
    }

    /// List the indicators of one object: `GET devices/{d}/objects/{o}/indicators`.
    pub async fn list_indicators(
        &self,
        token: &AuthToken,
        device_id: i64,
        object_id: i64,
    ) -> Result<Vec<Indicator>, Error> {
        self.get_paged(
            &format!("devices/{device_id}/objects/{object_id}/indicators"),
            token,
            EmptyBody::AsEmpty,
        )
        .await
    }

    /// Fetch the samples of one indicator inside `window`:
    /// `GET devices/{d}/objects/{o}/indicators/{i}/data?startTime=..&endTime=..`.
    pub async fn list_samples(
        &self,
        token: &AuthToken,
        device_id: i64,
        object_id: i64,
        indicator_id: i64,
        window: TimeWindow,
    ) -> Result<Vec<Sample>, Error> {
        let mut url = self.url(&format!(
            "devices/{device_id}/objects/{object_id}/indicators/{indicator_id}/data"
        ))?;
        url.query_pairs_mut()
            .append_pair("startTime", &window.start_ms.to_string())
            .append_pair("endTime", &window.end_ms.to_string());
        let endpoint = url.to_string();

        let body = self.get_text(url, token).await?;
        if is_empty_sentinel(&body) {
            return Ok(Vec::new());
        }
        decode(&endpoint, &body)
    }
}
