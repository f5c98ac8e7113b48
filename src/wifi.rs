use anyhow::{anyhow, Context, Result};
use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::{EspNvsPartition, NvsDefault};
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{info, warn};

#[derive(Debug)]
pub struct WifiNetwork<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
    pub auth_method: AuthMethod,
}

impl<'a> WifiNetwork<'a> {
    /// Open networks are detected from the empty password
    pub fn new(ssid: &'a str, password: &'a str) -> Self {
        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        Self {
            ssid,
            password,
            auth_method,
        }
    }
}

/// Station connection that stays up for the life of the firmware
pub struct WifiManager {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl WifiManager {
    pub fn new(modem: Modem) -> Result<Self> {
        let sys_loop = EspSystemEventLoop::take()?;
        let nvs = EspNvsPartition::<NvsDefault>::take()?;

        let wifi = BlockingWifi::wrap(EspWifi::new(modem, sys_loop.clone(), Some(nvs))?, sys_loop)?;

        Ok(Self { wifi })
    }

    /// Join `network`, scanning first so a missing access point is reported as such
    pub fn connect(&mut self, network: &WifiNetwork) -> Result<()> {
        let available_networks = self.scan_networks()?;
        info!("Found {} available networks", available_networks.len());

        if !available_networks.iter().any(|ssid| ssid == network.ssid) {
            warn!("{} not seen in scan, trying anyway", network.ssid);
        }

        info!("Attempting to connect to network: {}", network.ssid);
        self.connect_to_network(network)
            .with_context(|| format!("Failed to connect to {}", network.ssid))?;
        info!("Successfully connected to {}", network.ssid);

        let ip_info = self.wifi.wifi().sta_netif().get_ip_info()?;
        info!("IP: {}", ip_info.ip);

        Ok(())
    }

    fn scan_networks(&mut self) -> Result<Vec<String>> {
        // Start WiFi in station mode for scanning
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
        self.wifi.start()?;

        let ap_infos = self.wifi.scan()?;
        Ok(ap_infos.iter().map(|ap| ap.ssid.to_string()).collect())
    }

    fn connect_to_network(&mut self, network: &WifiNetwork) -> Result<()> {
        let wifi_config = Configuration::Client(ClientConfiguration {
            ssid: network
                .ssid
                .try_into()
                .map_err(|_| anyhow!("SSID {} is too long", network.ssid))?,
            password: network
                .password
                .try_into()
                .map_err(|_| anyhow!("WiFi password is too long"))?,
            auth_method: network.auth_method,
            ..Default::default()
        });

        self.wifi.set_configuration(&wifi_config)?;
        self.wifi.connect()?;
        self.wifi.wait_netif_up()?;

        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}
