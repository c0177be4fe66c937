use std::io::Write;
use std::thread;
use std::time::Duration;

use bandviz::audio::devices::{default_input_index, get_input_device, list_input_devices};
use bandviz::config::{BAND_HIGH_BIN, BAND_LOW_BIN, DEFAULT_BANDS, UPDATE_INTERVAL_MS};
use bandviz::ui::{band_levels, render_bars};
use bandviz::{AudioStream, FrequencyAnalyzer};

fn main() {
    env_logger::init();

    let host = cpal::default_host();

    let names = list_input_devices(&host).expect("Failed to enumerate input devices");
    if names.is_empty() {
        eprintln!("No input devices available");
        std::process::exit(1);
    }

    let index = default_input_index(&host, &names).unwrap_or(0);
    let device = get_input_device(&host, &names, index).expect("Failed to open input device");

    let stream = AudioStream::open(&device).expect("Failed to start capture");
    let analyzer = FrequencyAnalyzer::initialize(stream).expect("Failed to initialize analyzer");

    println!(
        "Capturing \"{}\": bins {}..{} ({:.0} Hz to {:.0} Hz), Ctrl-C to quit",
        names[index],
        BAND_LOW_BIN,
        BAND_HIGH_BIN,
        analyzer.bin_frequency(BAND_LOW_BIN),
        analyzer.bin_frequency(BAND_HIGH_BIN),
    );

    loop {
        thread::sleep(Duration::from_millis(UPDATE_INTERVAL_MS));

        match analyzer.get_frequency_bands(DEFAULT_BANDS, BAND_LOW_BIN, BAND_HIGH_BIN) {
            Ok(bands) => {
                let levels = band_levels(&bands);
                print!("\r{}", render_bars(&levels));
                let _ = std::io::stdout().flush();
            }
            Err(err) => {
                log::error!("visualizer stopped: {}", err);
                break;
            }
        }
    }
}
