use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use esp_idf_sys::EspError;
use log::info;

/// Station-mode credentials. Per-deployment; replace before flashing.
pub struct WifiConfig {
    pub ssid: &'static str,
    pub password: &'static str,
}

impl Default for WifiConfig {
    fn default() -> Self {
        WifiConfig {
            ssid: "robot-net",
            password: "changeme",
        }
    }
}

/// Bring the station up and block until the netif has an address.
/// The returned handle must stay alive for the connection to persist.
pub fn connect(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
    config: &WifiConfig,
) -> Result<BlockingWifi<EspWifi<'static>>, EspError> {
    let mut wifi = BlockingWifi::wrap(
        EspWifi::new(modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;

    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: config.ssid.try_into().unwrap_or_default(),
        password: config.password.try_into().unwrap_or_default(),
        auth_method: AuthMethod::WPA2Personal,
        ..Default::default()
    }))?;

    wifi.start()?;
    info!("Connecting to '{}'...", config.ssid);
    wifi.connect()?;
    wifi.wait_netif_up()?;

    let ip = wifi.wifi().sta_netif().get_ip_info()?;
    info!("Connected, IP: {}", ip.ip);

    Ok(wifi)
}
