// Device listing endpoints
//
// `type=devices` is the only read surface the bridge needs: discovery
// lists everything, the poller lists everything, and single-device
// lookups narrow with `rid=`.

use tracing::{debug, warn};

use crate::client::DomoticzClient;
use crate::error::Error;
use crate::models::{DeviceDescriptor, DeviceFilter};

impl DomoticzClient {
    /// Find devices matching a filter.
    ///
    /// `GET /json.htm?type=devices&filter={kind|all}&used=true[&rid={idx}]`
    pub async fn find_devices(&self, filter: &DeviceFilter) -> Result<Vec<DeviceDescriptor>, Error> {
        let kind = filter.kind.as_deref().unwrap_or("all");
        let mut query = vec![("type", "devices"), ("filter", kind), ("used", "true")];
        if let Some(idx) = filter.idx.as_deref() {
            query.push(("rid", idx));
        }

        debug!(kind, idx = ?filter.idx, "listing devices");
        // Entries are parsed one by one so a single malformed device does
        // not take the rest of the listing down with it.
        let entries: Vec<serde_json::Value> = self.get_envelope(&query).await?;
        let devices = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<DeviceDescriptor>(entry) {
                Ok(device) => Some(device),
                Err(e) => {
                    warn!(error = %e, "skipping malformed device entry");
                    None
                }
            })
            .filter(|d| filter.matches(d))
            .collect();

        Ok(devices)
    }

    /// List every used device on the server.
    pub async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, Error> {
        self.find_devices(&DeviceFilter::all()).await
    }

    /// Get a single device by identifier. Returns `None` if no device matches.
    pub async fn get_device(&self, idx: &str) -> Result<Option<DeviceDescriptor>, Error> {
        let devices = self.find_devices(&DeviceFilter::by_idx(idx)).await?;
        Ok(devices.into_iter().find(|d| d.idx == idx))
    }
}
