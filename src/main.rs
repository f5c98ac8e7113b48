use anyhow::{Context, Result};

use embedded_graphics::prelude::*;
use embedded_hal::delay::DelayNs;

use esp_idf_svc::hal::delay::Delay;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::sntp::{EspSntp, SyncStatus};

use nightscout_pixoo::clock::{clock_text, Clock, SystemClock};
use nightscout_pixoo::config::{self, Config};
use nightscout_pixoo::http::EspHttpClient;
use nightscout_pixoo::pixoo::{DisplayInterface, Pixoo};
use nightscout_pixoo::render::{Dashboard, Layout};
use nightscout_pixoo::{Nightscout, RetryPolicy};

mod wifi;

use crate::wifi::{WifiManager, WifiNetwork};

// Include the pre-converted splash image (generated at build time, empty without media/splash.png)
const SPLASH_IMAGE: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/splash.rgb"));

const SNTP_POLL_MS: u32 = 500;

/// Block until SNTP has set the system time, the clock text is wrong before
fn wait_for_time<D: DelayNs>(sntp: &EspSntp<'_>, delay: &mut D) {
    log::info!("Waiting for SNTP");
    while sntp.get_sync_status() != SyncStatus::Completed {
        delay.delay_ms(SNTP_POLL_MS);
    }
}

// https://docs.esp-rs.org/esp-idf-svc/esp_idf_svc/
fn main() -> Result<()> {
    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    let config = Config::from_lookup(config::baked).context("Invalid build-time configuration")?;
    log::info!(
        "Pixoo {} ({}x{}), Nightscout {}",
        config.pixoo_host,
        config.screen_size,
        config.screen_size,
        config.nightscout_url
    );

    let peripherals = Peripherals::take().context("Could not take peripherals")?;

    let ssid = config.wifi_ssid.as_deref().context("WIFI_SSID is not set")?;
    let password = config.wifi_password.as_deref().unwrap_or_default();
    let mut wifi = WifiManager::new(peripherals.modem)?;
    wifi.connect(&WifiNetwork::new(ssid, password))?;

    let mut delay = Delay::default();

    let sntp = EspSntp::new_default().context("Could not start SNTP")?;
    wait_for_time(&sntp, &mut delay);
    let clock = SystemClock::new(config.utc_offset_minutes);
    log::info!("Time is {}", clock_text(&clock.now()));

    let retry = RetryPolicy::from_secs(config.retry_delay_secs);

    let interface = DisplayInterface::new(EspHttpClient::new()?, &config.pixoo_host);
    let mut pixoo = Pixoo::connect(interface, config.screen_size, retry, &mut delay);

    if let Some(percent) = config.brightness {
        retry.run(&mut delay, "Pixoo brightness", || pixoo.set_brightness(percent));
    }

    if SPLASH_IMAGE.is_empty() {
        log::warn!("Splash image not available (media/splash.png not found at build time)");
    } else {
        log::info!("Splash image embedded, size: {} bytes", SPLASH_IMAGE.len());
        pixoo.draw_image(SPLASH_IMAGE, config.screen_size, Point::zero(), false)?;
        retry.run(&mut delay, "Pixoo splash", || pixoo.push());
    }

    let nightscout = Nightscout::new(
        EspHttpClient::new()?,
        &config.nightscout_url,
        retry,
        Delay::default(),
    );

    let mut dashboard = Dashboard::new(
        pixoo,
        nightscout,
        clock,
        Layout::from_config(&config),
        retry,
        delay,
    );

    log::info!("WiFi connected: {}", wifi.is_connected());
    dashboard.run()
}
