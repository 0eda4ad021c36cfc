//! Devices known to the home automation controller.
//!
//! The catalog is fetched once on startup. Failures leave the registry empty or
//! partially populated so that built-in voice commands keep working.

use crate::error::{DispatcherError, DispatcherResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::*;

const CATALOG_SERVICE: &str = "CheckItemsData";
const CATALOG_CATEGORY: &str = "general";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    id: String,
    hotword: Option<String>,
}

impl Device {
    pub fn new(id: &str, hotword: Option<&str>) -> DispatcherResult<Self> {
        if id.is_empty() {
            return Err(DispatcherError::InvalidDevice(String::from("empty id")));
        }
        Ok(Self {
            id: id.to_owned(),
            hotword: hotword.map(ToOwned::to_owned),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn hotword(&self) -> Option<&str> {
        self.hotword.as_deref()
    }
}

#[derive(Serialize, Debug)]
struct CatalogRequest {
    service: &'static str,
    receive: &'static str,
    category: &'static str,
}

impl Default for CatalogRequest {
    fn default() -> Self {
        Self {
            service: CATALOG_SERVICE,
            receive: "1",
            category: CATALOG_CATEGORY,
        }
    }
}

#[derive(Deserialize, Debug)]
struct CatalogResponse {
    items: Option<Vec<Value>>,
}

/// Insertion ordered, immutable after load
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    /// Fetch the catalog from the controller
    ///
    /// Never fails. Errors are logged and whatever was parsed before the
    /// failure is kept.
    pub async fn load(client: &reqwest::Client, catalog_url: &str) -> Self {
        info!("Loading device catalog from {}", catalog_url);
        let mut devices = vec![];
        if let Err(err) = fetch_catalog(client, catalog_url, &mut devices).await {
            error!("Failed to load device catalog {:?}", err);
        }
        if devices.is_empty() {
            warn!("No devices loaded. Only built-in commands will work");
        } else {
            info!("Loaded {} devices", devices.len());
        }
        Self { devices }
    }

    /// Populate from a raw catalog response body
    pub fn from_catalog_json(body: &str) -> (Self, DispatcherResult<()>) {
        let mut devices = vec![];
        let result = parse_catalog(body, &mut devices);
        (Self { devices }, result)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    /// Devices that can be addressed by voice
    pub fn with_hotwords(&self) -> impl Iterator<Item = (&Device, &str)> {
        self.devices
            .iter()
            .filter_map(|device| device.hotword().map(|hotword| (device, hotword)))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

async fn fetch_catalog(
    client: &reqwest::Client,
    catalog_url: &str,
    devices: &mut Vec<Device>,
) -> DispatcherResult<()> {
    let body = client
        .post(catalog_url)
        .json(&CatalogRequest::default())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_catalog(&body, devices)
}

fn parse_catalog(body: &str, devices: &mut Vec<Device>) -> DispatcherResult<()> {
    let response: CatalogResponse = serde_json::from_str(body)?;
    let Some(items) = response.items else {
        warn!("Device catalog has no items");
        return Ok(());
    };

    for item in items {
        let hotword = match item.get("hotword") {
            Some(Value::String(hotword)) => hotword,
            _ => continue,
        };
        let id = match item.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            other => {
                return Err(DispatcherError::InvalidDevice(format!(
                    "hotword {:?} has id {:?}",
                    hotword, other
                )))
            }
        };
        let device = Device::new(&id, Some(hotword.as_str()))?;
        info!("Found configured device {} by hotword {}", id, hotword);
        devices.push(device);
    }
    Ok(())
}
