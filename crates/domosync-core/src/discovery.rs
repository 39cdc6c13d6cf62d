// ── Discovery and credential validation ──

use domosync_api::{DeviceDescriptor, DeviceFilter, VersionInfo};
use tracing::{debug, info};
use uuid::Uuid;

use crate::decode::reading_number;
use crate::error::CoreError;
use crate::mapper::{map_capabilities, map_device_class};
use crate::model::{DeviceIdx, PairingCandidate};
use crate::registry::DeviceRegistry;
use crate::remote::RemoteClient;

const DEFAULT_DEVICE_NAME: &str = "Domoticz device";

/// List remote devices that could be paired.
///
/// Devices already in `registry`, and devices for which no capability
/// or class maps, are left out.
pub async fn discover<R: RemoteClient>(
    remote: &R,
    registry: &DeviceRegistry,
) -> Result<Vec<PairingCandidate>, CoreError> {
    let descriptors = remote.find_devices(&DeviceFilter::all()).await?;
    let total = descriptors.len();

    let candidates: Vec<PairingCandidate> = descriptors
        .iter()
        .filter(|d| !registry.contains(&DeviceIdx::new(d.idx.as_str())))
        .filter_map(candidate_for)
        .collect();

    info!(
        found = total,
        candidates = candidates.len(),
        "discovery complete"
    );
    Ok(candidates)
}

/// Pairing candidate for one descriptor, if it maps to anything.
pub fn candidate_for(descriptor: &DeviceDescriptor) -> Option<PairingCandidate> {
    let capabilities = map_capabilities(descriptor);
    if capabilities.is_empty() {
        debug!(idx = %descriptor.idx, kind = ?descriptor.device_type, sub_type = ?descriptor.sub_type, "no capabilities map");
        return None;
    }
    let class = map_device_class(descriptor)?;

    let name = descriptor
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_DEVICE_NAME);

    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    let hardware_type = descriptor
        .hardware_type_val
        .as_ref()
        .and_then(reading_number)
        .map(|n| n as i64);

    Some(PairingCandidate {
        id: Uuid::new_v4(),
        idx: DeviceIdx::new(descriptor.idx.as_str()),
        name: name.to_owned(),
        class,
        capabilities,
        hardware_name: descriptor.hardware_name.clone(),
        hardware_type,
    })
}

/// Check that the server accepts the configured credentials.
///
/// Any failure, including an unreachable server, is reported as
/// `InvalidCredentials`; the caller decides what to do next.
pub async fn validate_credentials<R: RemoteClient>(remote: &R) -> Result<VersionInfo, CoreError> {
    match remote.check_credentials().await {
        Ok(version) => {
            info!(version = ?version.version, "credentials accepted");
            Ok(version)
        }
        Err(e) => Err(CoreError::InvalidCredentials {
            message: e.to_string(),
        }),
    }
}
