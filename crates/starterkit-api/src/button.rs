// IoT button access-point client
//
// While in setup mode the button serves a small JSON API on its own WiFi
// access point. None of its responses carry useful bodies, so every call
// returns just the status code and leaves interpretation to the caller.

use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Address of the button while it serves its access point.
pub const DEFAULT_BUTTON_URL: &str = "http://192.168.4.1";

#[derive(Debug, Serialize)]
struct WifiPayload<'a> {
    ssid: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct HubPayload<'a> {
    iothub: &'a str,
    iotdevicename: &'a str,
    iotdevicesecret: &'a str,
}

#[derive(Debug, Serialize)]
struct OpsModePayload<'a> {
    opsmode: &'a str,
}

/// HTTP client for the button's configuration endpoints.
pub struct ButtonClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ButtonClient {
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Self::from_reqwest(base_url, transport.build_client()?)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /config/wifi`
    pub async fn configure_wifi(&self, ssid: &str, password: &str) -> Result<StatusCode, Error> {
        self.post("config/wifi", &WifiPayload { ssid, password })
            .await
    }

    /// `POST /config/iothub`
    pub async fn configure_hub(
        &self,
        hostname: &str,
        device: &str,
        device_key: &str,
    ) -> Result<StatusCode, Error> {
        let payload = HubPayload {
            iothub: hostname,
            iotdevicename: device,
            iotdevicesecret: device_key,
        };
        self.post("config/iothub", &payload).await
    }

    /// `POST /config/opsmode`. The button turns off its access point while
    /// handling this request, so a transport error is the usual outcome.
    pub async fn switch_to_client_mode(&self) -> Result<StatusCode, Error> {
        self.post("config/opsmode", &OpsModePayload { opsmode: "client" })
            .await
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<StatusCode, Error> {
        let url = self.base_url.join(path)?;
        debug!(%url, "button POST");

        let resp = self
            .http
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        debug!(%status, "button responded");
        Ok(status)
    }
}
