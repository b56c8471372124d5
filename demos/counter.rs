//! BTHome counter example
//!
//! This example advertises a 16 bit counter that is incremented every cycle. Each cycle resets
//! the measurements, adds the counter, and advertises it for a limited duration. There is no
//! Bluetooth controller behind this example, the advertising data is logged instead.
//!
//! ```text
//! cargo run --example counter -- --cycles 5 --period 2000 --duration 500
//! ```

use bthome::address::StaticRandomAddress;
use bthome::advertiser::scheduler::TokioScheduler;
use bthome::{AdElement, AdvertiseError, AdvertisingParameters, AdvertisingTransport, BtHomeDevice, DeviceConfig, ObjectId};
use std::time::Duration;

/// A transport that logs the advertising data
struct LoggingTransport;

impl AdvertisingTransport for LoggingTransport {
    type Error = std::convert::Infallible;

    fn start(&mut self, parameters: &AdvertisingParameters, data: &[AdElement]) -> Result<(), Self::Error> {
        match parameters.random_address {
            Some(address) => log::info!("advertising enabled with address {}", address),
            None => log::info!("advertising enabled with identity address"),
        }

        data.iter().for_each(|element| log::info!("{:?}", element));

        Ok(())
    }

    fn update(&mut self, data: &[AdElement]) -> Result<(), Self::Error> {
        log::info!("advertising data updated, service data: {:?}", data.get(1));

        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        log::info!("advertising disabled");

        Ok(())
    }
}

struct Args {
    name: String,
    cycles: u16,
    period: Duration,
    duration: Duration,
    address: Option<StaticRandomAddress>,
}

fn get_arg_options() -> getopts::Options {
    let mut opts = getopts::Options::new();
    opts.parsing_style(getopts::ParsingStyle::FloatingFrees);
    opts.long_only(false);
    opts.optflag("h", "help", "Print this help menu");
    opts.optopt("n", "name", "The advertised device name", "NAME");
    opts.optopt("c", "cycles", "The number of counter cycles (default 10)", "COUNT");
    opts.optopt("p", "period", "Milliseconds between cycles (default 1000)", "MS");
    opts.optopt("d", "duration", "Milliseconds to advertise each cycle, 0 to never stop (default 500)", "MS");
    opts.optopt(
        "i",
        "device-id",
        "Factory device id to derive a static random address from. The id is in the \
            format of HIGH:LOW with both words in hexadecimal",
        "ID",
    );
    opts.optflag("r", "random-address", "Advertise with a randomly generated static address");
    opts
}

fn parse_ms(matches: &getopts::Matches, opt: &str, default: u64) -> Duration {
    let ms = matches
        .opt_str(opt)
        .map(|s| s.parse::<u64>().expect("Invalid milliseconds"))
        .unwrap_or(default);

    Duration::from_millis(ms)
}

fn parse_args(mut args: std::env::Args) -> Args {
    let options = get_arg_options();

    let program_name = args.next().unwrap();

    let matches = match options.parse(&args.collect::<Vec<_>>()) {
        Ok(all_match) => all_match,
        Err(no_match) => panic!("{}", no_match.to_string()),
    };

    if matches.opt_present("h") {
        print!("{}", options.usage(&format!("Usage: {} [options]", program_name)));
        std::process::exit(0);
    }

    let address = if let Some(id) = matches.opt_str("i") {
        let (high, low) = id.split_once(':').expect("Invalid device id");

        let high = u32::from_str_radix(high, 16).expect("Invalid device id");
        let low = u32::from_str_radix(low, 16).expect("Invalid device id");

        Some(StaticRandomAddress::from_device_id(low, high))
    } else if matches.opt_present("r") {
        Some(StaticRandomAddress::random().expect("failed to generate address"))
    } else {
        None
    };

    Args {
        name: matches.opt_str("n").unwrap_or_else(|| "BTHome Counter".to_string()),
        cycles: matches
            .opt_str("c")
            .map(|s| s.parse().expect("Invalid cycle count"))
            .unwrap_or(10),
        period: parse_ms(&matches, "p", 1000),
        duration: parse_ms(&matches, "d", 500),
        address,
    }
}

#[tokio::main]
async fn main() {
    use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

    TermLogger::init(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    let args = parse_args(std::env::args());

    let mut config = DeviceConfig::new(args.name);

    if let Some(address) = args.address {
        log::info!("Generated fixed MAC: {}", address);

        config.parameters.use_identity = false;
        config.parameters.random_address = Some(address);
    }

    let mut device = BtHomeDevice::new(config, LoggingTransport, TokioScheduler::current());

    for counter in 1..=args.cycles {
        device.reset_measurements();

        device
            .add_measurement(&bthome::Measurement::new(ObjectId::COUNT_16, counter))
            .expect("failed to add counter");

        // the previous advertisement may have ended at any point before the update
        match device.update_advertisement() {
            Ok(()) => (),
            Err(AdvertiseError::NotAdvertising) => {
                device.advertise(args.duration).expect("failed to advertise")
            }
            Err(e) => panic!("failed to update the advertisement: {:?}", e),
        }

        log::info!("counter: {}", counter);

        tokio::time::sleep(args.period).await;
    }

    device.stop_advertising().unwrap();
}
