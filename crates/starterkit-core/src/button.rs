// IoT button configuration
//
// Three POSTs to the button's access point: WiFi credentials, hub identity,
// then the switch to client mode. Response codes are not inspected. The
// button drops its access point while answering the last call, so an error
// there is the normal outcome and is ignored.

use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, info, instrument};

use starterkit_api::ButtonClient;

use crate::context::SessionContext;
use crate::error::CoreError;

/// Status codes seen during configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ButtonReport {
    pub wifi_status: u16,
    pub hub_status: u16,
    /// `None` when the button closed the connection instead of answering.
    pub client_mode_status: Option<u16>,
}

pub struct ButtonConfigurator<'a> {
    client: &'a ButtonClient,
}

impl<'a> ButtonConfigurator<'a> {
    pub fn new(client: &'a ButtonClient) -> Self {
        Self { client }
    }

    /// Needs the hub hostname, device name and device key.
    #[instrument(skip_all, fields(button = %self.client.base_url()))]
    pub async fn configure(&self, ctx: &SessionContext) -> Result<ButtonReport, CoreError> {
        let hostname = ctx.hostname()?;
        let device = ctx.device_name()?;
        let key = ctx.device_key()?;

        let wifi = self
            .client
            .configure_wifi(&ctx.wifi.ssid, ctx.wifi.password.expose_secret())
            .await?;
        debug!(status = %wifi, "wifi settings sent");

        let hub = self.client.configure_hub(hostname, device, key).await?;
        debug!(status = %hub, "hub settings sent");

        let client_mode = match self.client.switch_to_client_mode().await {
            Ok(status) => Some(status.as_u16()),
            Err(e) => {
                debug!(error = %e, "button left access point mode");
                None
            }
        };

        info!(device, "button configured");
        Ok(ButtonReport {
            wifi_status: wifi.as_u16(),
            hub_status: hub.as_u16(),
            client_mode_status: client_mode,
        })
    }
}
