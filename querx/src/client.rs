//! Device client: login, current values refresh and sensor lookups

use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::error::{QuerxError, Result};
use crate::net::{HttpTransport, Transport, CURRENT_VALUES_PATH};
use crate::types::{CurrentDocument, Sensor};

/// Client for one Querx device.
///
/// Lookups read the most recently fetched current values document. When
/// nothing has been fetched yet they fetch it first. The document is only
/// replaced by a fetch that succeeds end to end.
#[derive(Debug)]
pub struct DeviceClient<T = HttpTransport> {
    transport: T,
    current: Option<CurrentDocument>,
}

impl DeviceClient<HttpTransport> {
    /// Create a client with [`ClientConfig::new`] settings.
    ///
    /// No request is made until [`DeviceClient::login`] or
    /// [`DeviceClient::refresh_current`] is called.
    pub fn new(host: impl Into<String>, port: u16, tls: bool) -> Result<Self> {
        Self::from_config(ClientConfig::new(host, port, tls))
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }

    pub fn config(&self) -> &ClientConfig {
        self.transport.config()
    }
}

impl<T: Transport> DeviceClient<T> {
    pub fn with_transport(transport: T) -> Self {
        DeviceClient {
            transport,
            current: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Last successfully fetched document, if any.
    pub fn current(&self) -> Option<&CurrentDocument> {
        self.current.as_ref()
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        self.transport.login(username, password).await
    }

    /// Fetch and decode the current values document.
    ///
    /// On error the previously stored document is kept.
    #[instrument(skip(self))]
    pub async fn refresh_current(&mut self) -> Result<&CurrentDocument> {
        let document = self.fetch_current().await?;
        info!(
            hostname = %document.hostname,
            sensors = document.sensors().len(),
            records = document.records().len(),
            "Current values updated"
        );
        Ok(self.current.insert(document))
    }

    /// Sensor at catalog position `index`, in device order.
    pub async fn sensor_by_index(&mut self, index: usize) -> Result<Sensor> {
        self.ensure_current()
            .await?
            .sensors()
            .get(index)
            .cloned()
            .ok_or(QuerxError::SensorNotFound(index))
    }

    /// Sensor whose own identifier is `id`. Stable across catalog reorders.
    pub async fn sensor_by_id(&mut self, id: &str) -> Result<Sensor> {
        self.ensure_current()
            .await?
            .sensor(id)
            .cloned()
            .ok_or_else(|| QuerxError::UnknownSensor(id.to_string()))
    }

    /// Reading of `sensor` in the first record.
    ///
    /// Returns `0.0` when the record has no entry for the sensor, which can
    /// not be told apart from a real zero reading. Use
    /// [`DeviceClient::try_current_value`] to detect that case.
    pub async fn current_value(&mut self, sensor: &Sensor) -> Result<f64> {
        let value = self.try_current_value(sensor).await?;
        Ok(value.unwrap_or_else(|| {
            debug!(sensor_id = %sensor.id, "No entry for sensor, reporting 0");
            0.0
        }))
    }

    /// Reading of `sensor` in the first record, `None` without an entry.
    pub async fn try_current_value(&mut self, sensor: &Sensor) -> Result<Option<f64>> {
        let record = self
            .ensure_current()
            .await?
            .first_record()
            .ok_or(QuerxError::NoRecords)?;
        Ok(record.entry(&sensor.id).map(|entry| entry.value))
    }

    async fn fetch_current(&self) -> Result<CurrentDocument> {
        let body = self.transport.get(CURRENT_VALUES_PATH).await?;
        debug!(bytes = body.len(), "Decoding current values");
        CurrentDocument::from_xml(&body)
    }

    async fn ensure_current(&mut self) -> Result<&CurrentDocument> {
        let document = match self.current.take() {
            Some(document) => document,
            None => {
                debug!("No current values yet, fetching");
                self.fetch_current().await?
            }
        };
        Ok(self.current.insert(document))
    }
}
