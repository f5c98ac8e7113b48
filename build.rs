use image::GenericImageView;
use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Settings baked into the firmware through `option_env!`
const CONFIG_KEYS: [&str; 10] = [
    "PIXOO_HOST",
    "PIXOO_SCREEN_SIZE",
    "PIXOO_RETRY_DELAY",
    "PIXOO_BRIGHTNESS",
    "NIGHTSCOUT_URL",
    "SCREEN_TIME",
    "DISPLAY_LABEL",
    "UTC_OFFSET_MINUTES",
    "WIFI_SSID",
    "WIFI_PASSWORD",
];

/// Convert a PNG image to raw RGB888 bytes at build time, letterboxed on black
fn convert_image_to_rgb(
    input_path: &str,
    output_path: &str,
    screen_size: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={}", input_path);

    // Missing splash is fine, the firmware skips it
    if !Path::new(input_path).exists() {
        let mut file = File::create(output_path)?;
        file.write_all(&[])?;
        return Ok(());
    }

    let img = image::open(input_path)?;
    println!(
        "cargo:warning=Converting splash {} ({}x{}) to {}x{}",
        input_path,
        img.width(),
        img.height(),
        screen_size,
        screen_size
    );

    // Fit the longer side, keep aspect ratio
    let resized = img.resize(
        screen_size,
        screen_size,
        image::imageops::FilterType::Nearest,
    );
    let (new_width, new_height) = resized.dimensions();
    let rgba = resized.to_rgba8();

    let offset_x = (screen_size - new_width) / 2;
    let offset_y = (screen_size - new_height) / 2;

    let mut buffer = vec![0u8; (screen_size * screen_size * 3) as usize];
    for y in 0..new_height {
        for x in 0..new_width {
            let pixel = rgba.get_pixel(x, y);
            // Alpha composite over black
            let alpha = u16::from(pixel[3]);
            let index = (((y + offset_y) * screen_size + x + offset_x) * 3) as usize;
            for channel in 0..3 {
                buffer[index + channel] = (u16::from(pixel[channel]) * alpha / 255) as u8;
            }
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(&buffer)?;
    Ok(())
}

fn main() {
    if env::var_os("CARGO_FEATURE_ESP32").is_some() {
        embuild::espidf::sysenv::output();
    }

    for key in CONFIG_KEYS {
        println!("cargo:rerun-if-env-changed={}", key);
    }

    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");

    let screen_size = env::var("PIXOO_SCREEN_SIZE")
        .ok()
        .and_then(|size| size.parse::<u32>().ok())
        .filter(|size| matches!(size, 16 | 32 | 64))
        .unwrap_or(64);

    let splash_output = format!("{}/splash.rgb", out_dir);
    if let Err(e) = convert_image_to_rgb("media/splash.png", &splash_output, screen_size) {
        println!("cargo:warning=Failed to convert media/splash.png: {}", e);
        // Still leave a file behind for include_bytes!
        if let Err(e) = File::create(&splash_output) {
            println!("cargo:warning=Could not create {}: {}", splash_output, e);
        }
    }

    println!("cargo:rerun-if-changed=media/splash.png");
}
