//! Advertising with the tokio scheduler

#![cfg(feature = "tokio")]

use bthome::advertiser::scheduler::TokioScheduler;
use bthome::assigned::service_data::ServiceData;
use bthome::{AdElement, AdvertisingParameters, AdvertisingTransport, BtHomeDevice, DeviceConfig, ObjectId};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Start(Vec<u8>),
    Update(Vec<u8>),
    Stop,
}

#[derive(Clone, Default)]
struct SharedTransport(Arc<Mutex<Vec<Event>>>);

impl SharedTransport {
    fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    fn stops(&self) -> usize {
        self.events().iter().filter(|e| **e == Event::Stop).count()
    }
}

fn concat(data: &[AdElement]) -> Vec<u8> {
    data.iter().flat_map(|e| e.as_bytes().to_vec()).collect()
}

impl AdvertisingTransport for SharedTransport {
    type Error = std::convert::Infallible;

    fn start(&mut self, _: &AdvertisingParameters, data: &[AdElement]) -> Result<(), Self::Error> {
        self.0.lock().unwrap().push(Event::Start(concat(data)));
        Ok(())
    }

    fn update(&mut self, data: &[AdElement]) -> Result<(), Self::Error> {
        self.0.lock().unwrap().push(Event::Update(concat(data)));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.0.lock().unwrap().push(Event::Stop);
        Ok(())
    }
}

fn init_logger() {
    use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

    // another test may have already set the logger
    let _ = TermLogger::init(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}

fn device() -> (BtHomeDevice<SharedTransport, TokioScheduler>, SharedTransport) {
    let transport = SharedTransport::default();

    let device = BtHomeDevice::new(
        DeviceConfig::new("BTHome Sensor"),
        transport.clone(),
        TokioScheduler::current(),
    );

    (device, transport)
}

#[tokio::test]
async fn advertisement_ends_after_duration() {
    init_logger();

    let (mut device, transport) = device();

    device.add_sensor(ObjectId::TEMPERATURE, 21.5).unwrap();
    device.add_sensor(ObjectId::BATTERY, 97.0).unwrap();

    device.advertise(Duration::from_millis(50)).unwrap();

    assert!(device.is_advertising());

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(!device.is_advertising());

    let events = transport.events();

    assert_eq!(2, events.len());
    assert_eq!(Event::Stop, events[1]);

    match &events[0] {
        Event::Start(ad) => {
            let service_data = ServiceData::find(ad).unwrap().unwrap();

            let objects: Vec<_> = service_data
                .objects()
                .map(|o| o.map(|o| (o.object_id(), o.to_signed())))
                .collect::<Result<_, _>>()
                .unwrap();

            assert_eq!(vec![(ObjectId::TEMPERATURE, 215), (ObjectId::BATTERY, 97)], objects);
        }
        event => panic!("unexpected event {:?}", event),
    }
}

#[tokio::test]
async fn stop_before_deadline() {
    init_logger();

    let (mut device, transport) = device();

    device.add_state(ObjectId::DOOR, true).unwrap();

    device.advertise(Duration::from_millis(50)).unwrap();

    device.stop_advertising().unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(1, transport.stops());
    assert!(!device.is_advertising());
}

#[tokio::test]
async fn restart_outlives_first_deadline() {
    init_logger();

    let (mut device, transport) = device();

    device.add_sensor(ObjectId::COUNT_16, 1.0).unwrap();

    device.advertise(Duration::from_millis(50)).unwrap();

    device.reset_measurements();
    device.add_sensor(ObjectId::COUNT_16, 2.0).unwrap();

    // advertise without a deadline
    device.advertise(Duration::ZERO).unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(device.is_advertising());

    // only the stop for the restart
    assert_eq!(1, transport.stops());

    device.stop_advertising().unwrap();

    assert_eq!(2, transport.stops());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deadline_racing_manual_stop() {
    init_logger();

    // the deadline and the manual stop happen at about the same time
    for _ in 0..20 {
        let (mut device, transport) = device();

        device.add_sensor(ObjectId::COUNT_16, 1.0).unwrap();

        device.advertise(Duration::from_millis(5)).unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;

        device.stop_advertising().unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(1, transport.stops());
        assert!(!device.is_advertising());
    }
}

#[tokio::test]
async fn update_keeps_deadline() {
    init_logger();

    let (mut device, transport) = device();

    device.add_sensor(ObjectId::COUNT_16, 1.0).unwrap();

    device.advertise(Duration::from_millis(80)).unwrap();

    device.reset_measurements();
    device.add_sensor(ObjectId::COUNT_16, 2.0).unwrap();

    device.update_advertisement().unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    let events = transport.events();

    assert_eq!(3, events.len());
    assert!(matches!(events[1], Event::Update(_)));
    assert_eq!(Event::Stop, events[2]);
}
