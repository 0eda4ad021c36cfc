use crate::{error::DispatcherResult, matcher::Action};
use serde::Serialize;
use tracing::*;

/// Fire and forget device actuation
///
/// Implementations must return immediately. Failures are handled internally
/// and never reach the caller.
pub trait ActuationDispatcher: Send + Sync {
    fn dispatch(&self, device_id: &str, action: Action);
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct ToggleRequest {
    outlet_id: String,
    outlet_status: Action,
    outlet_delayed: &'static str,
}

impl ToggleRequest {
    fn new(device_id: &str, action: Action) -> Self {
        Self {
            outlet_id: device_id.to_owned(),
            outlet_status: action,
            outlet_delayed: "0",
        }
    }
}

/// Posts toggle requests to the home automation controller on detached tasks
#[derive(Clone)]
pub struct HttpActuationDispatcher {
    client: reqwest::Client,
    toggle_url: String,
}

impl HttpActuationDispatcher {
    pub fn new(client: reqwest::Client, toggle_url: String) -> Self {
        Self { client, toggle_url }
    }
}

impl ActuationDispatcher for HttpActuationDispatcher {
    fn dispatch(&self, device_id: &str, action: Action) {
        info!("Dispatching {} to device {}", action, device_id);
        let client = self.client.clone();
        let url = self.toggle_url.clone();
        let request = ToggleRequest::new(device_id, action);
        tokio::spawn(async move {
            if let Err(err) = send_toggle(&client, &url, &request).await {
                error!(
                    "Failed to toggle device {} to {}: {:?}",
                    request.outlet_id, request.outlet_status, err
                );
            }
        });
    }
}

async fn send_toggle(
    client: &reqwest::Client,
    url: &str,
    request: &ToggleRequest,
) -> DispatcherResult<()> {
    let response = client
        .post(url)
        .json(request)
        .send()
        .await?
        .error_for_status()?;
    info!(
        "Device {} toggled to {} with status {}",
        request.outlet_id,
        request.outlet_status,
        response.status()
    );
    Ok(())
}
