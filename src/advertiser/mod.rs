//! The advertising lifecycle
//!
//! An [`Advertiser`] is either idle or advertising. Advertising is started with the built AD
//! elements and an optional duration. When the duration is not zero a deferred stop is scheduled
//! through a [`Scheduler`](scheduler::Scheduler).
//!
//! Each start begins a new session. The deferred stop only stops the session it was scheduled
//! for, so a late firing deadline never stops an advertisement that was restarted or already
//! stopped. The transport, the state, and the session number are all behind the same mutex.

pub mod scheduler;

use crate::address::StaticRandomAddress;
use crate::advertise::AdElements;
use crate::Error;
use scheduler::Scheduler;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// The smallest advertising interval
pub const MIN_INTERVAL: Duration = Duration::from_millis(20);

/// The largest advertising interval
pub const MAX_INTERVAL: Duration = Duration::from_millis(10_240);

/// Advertising parameters
///
/// The default is the slow advertising interval of the GAP (1 s to 1.2 s) using the identity
/// address of the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisingParameters {
    /// The minimum advertising interval
    pub interval_min: Duration,
    /// The maximum advertising interval
    pub interval_max: Duration,
    /// Advertise with the identity address instead of a resolvable private address
    pub use_identity: bool,
    /// A static random address to advertise with instead of the identity address
    pub random_address: Option<StaticRandomAddress>,
}

impl AdvertisingParameters {
    /// Validate the parameters
    ///
    /// # Error
    /// [`Error::InvalidArgument`] is returned if the intervals are not within the range of 20ms to
    /// 10.24s, the minimum is larger than the maximum, or the random address is not static.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(address) = self.random_address.filter(|a| !a.is_static_random()) {
            log::error!("{} is not a static random address", address);

            return Err(Error::InvalidArgument);
        }

        if MIN_INTERVAL <= self.interval_min
            && self.interval_min <= self.interval_max
            && self.interval_max <= MAX_INTERVAL
        {
            Ok(())
        } else {
            log::error!(
                "invalid advertising interval {:?} to {:?}",
                self.interval_min,
                self.interval_max
            );

            Err(Error::InvalidArgument)
        }
    }
}

impl Default for AdvertisingParameters {
    fn default() -> Self {
        AdvertisingParameters {
            interval_min: Duration::from_millis(1000),
            interval_max: Duration::from_millis(1200),
            use_identity: true,
            random_address: None,
        }
    }
}

/// The radio side of advertising
///
/// This is implemented by whatever sends the advertising data to the Bluetooth controller.
pub trait AdvertisingTransport {
    type Error;

    /// Start advertising `data`
    fn start(&mut self, parameters: &AdvertisingParameters, data: &[crate::AdElement]) -> Result<(), Self::Error>;

    /// Replace the data of the current advertisement
    fn update(&mut self, data: &[crate::AdElement]) -> Result<(), Self::Error>;

    /// Stop advertising
    fn stop(&mut self) -> Result<(), Self::Error>;
}

/// The state of an [`Advertiser`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvertisingState {
    Idle,
    Advertising,
}

/// Errors of the advertising lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvertiseError<E> {
    /// The advertisement could not be built or the parameters are invalid
    Codec(Error),
    /// The transport failed
    Transport(E),
    /// An update was requested while not advertising
    NotAdvertising,
}

impl<E> From<Error> for AdvertiseError<E> {
    fn from(e: Error) -> Self {
        AdvertiseError::Codec(e)
    }
}

impl<E> core::fmt::Display for AdvertiseError<E>
where
    E: core::fmt::Display,
{
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            AdvertiseError::Codec(e) => core::fmt::Display::fmt(e, f),
            AdvertiseError::Transport(e) => write!(f, "advertising transport error, {}", e),
            AdvertiseError::NotAdvertising => f.write_str("not advertising"),
        }
    }
}

impl<E> std::error::Error for AdvertiseError<E> where E: core::fmt::Debug + core::fmt::Display {}

struct Inner<T> {
    transport: T,
    state: AdvertisingState,
    session: u64,
}

/// Stop the advertisement of `session`
///
/// This is the action of the deferred stop. Nothing is done if the session has ended.
fn expire<T: AdvertisingTransport>(inner: &Mutex<Inner<T>>, session: u64)
where
    T::Error: core::fmt::Debug,
{
    let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);

    if inner.session != session || inner.state != AdvertisingState::Advertising {
        log::debug!("advertising deadline of session {} has passed", session);
        return;
    }

    match inner.transport.stop() {
        Ok(()) => {
            inner.state = AdvertisingState::Idle;
            inner.session = inner.session.wrapping_add(1);

            log::info!("advertising duration elapsed, advertising stopped");
        }
        Err(e) => log::error!("failed to stop advertising when duration elapsed: {:?}", e),
    }
}

/// The advertising lifecycle
pub struct Advertiser<T, S: Scheduler> {
    inner: Arc<Mutex<Inner<T>>>,
    scheduler: S,
    deadline: Option<S::Handle>,
}

impl<T, S> Advertiser<T, S>
where
    T: AdvertisingTransport + Send + 'static,
    T::Error: core::fmt::Debug,
    S: Scheduler,
{
    /// Create a new, idle, `Advertiser`
    pub fn new(transport: T, scheduler: S) -> Self {
        let inner = Inner {
            transport,
            state: AdvertisingState::Idle,
            session: 0,
        };

        Advertiser {
            inner: Arc::new(Mutex::new(inner)),
            scheduler,
            deadline: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_deadline(&mut self) {
        if let Some(handle) = self.deadline.take() {
            self.scheduler.cancel(handle)
        }
    }

    /// Start advertising
    ///
    /// If this is already advertising, then the current advertisement is stopped and advertising
    /// is restarted with `elements`.
    ///
    /// A `duration` of zero advertises until [`stop`](Advertiser::stop) is called, otherwise
    /// advertising is stopped once `duration` has elapsed. Any deadline of a previous start is
    /// cancelled.
    ///
    /// # Error
    /// * [`AdvertiseError::Codec`] if the parameters are invalid
    /// * [`AdvertiseError::Transport`] if the transport failed. If the restart failed when
    ///   stopping the current advertisement the state remains advertising, otherwise it is idle.
    pub fn start(
        &mut self,
        parameters: &AdvertisingParameters,
        elements: &AdElements,
        duration: Duration,
    ) -> Result<(), AdvertiseError<T::Error>> {
        parameters.validate()?;

        let mut inner = self.lock();

        if inner.state == AdvertisingState::Advertising {
            log::debug!("restarting advertising");

            inner.transport.stop().map_err(|e| {
                log::error!("failed to stop advertising for restart: {:?}", e);

                AdvertiseError::Transport(e)
            })?;

            inner.state = AdvertisingState::Idle;
        }

        // ends any previous session
        inner.session = inner.session.wrapping_add(1);

        inner.transport.start(parameters, elements.as_slice()).map_err(|e| {
            log::error!("failed to start advertising: {:?}", e);

            AdvertiseError::Transport(e)
        })?;

        inner.state = AdvertisingState::Advertising;

        let session = inner.session;

        drop(inner);

        self.cancel_deadline();

        if duration.is_zero() {
            log::info!("advertising started");
        } else {
            log::info!("advertising started for {:?}", duration);

            let inner = Arc::clone(&self.inner);

            let handle = self.scheduler.schedule(duration, move || expire(&inner, session));

            self.deadline = Some(handle);
        }

        Ok(())
    }

    /// Replace the data of the current advertisement
    ///
    /// The deadline of the advertisement is unchanged.
    ///
    /// # Error
    /// [`AdvertiseError::NotAdvertising`] is returned if this is idle.
    pub fn update(&mut self, elements: &AdElements) -> Result<(), AdvertiseError<T::Error>> {
        let mut inner = self.lock();

        if inner.state != AdvertisingState::Advertising {
            return Err(AdvertiseError::NotAdvertising);
        }

        inner.transport.update(elements.as_slice()).map_err(|e| {
            log::error!("failed to update advertising data: {:?}", e);

            AdvertiseError::Transport(e)
        })?;

        log::debug!("advertising data updated");

        Ok(())
    }

    /// Stop advertising
    ///
    /// Stopping while idle does nothing.
    ///
    /// # Error
    /// The transport failed to stop, the state remains advertising.
    pub fn stop(&mut self) -> Result<(), AdvertiseError<T::Error>> {
        let mut inner = self.lock();

        if inner.state == AdvertisingState::Idle {
            return Ok(());
        }

        inner.transport.stop().map_err(|e| {
            log::error!("failed to stop advertising: {:?}", e);

            AdvertiseError::Transport(e)
        })?;

        inner.state = AdvertisingState::Idle;
        inner.session = inner.session.wrapping_add(1);

        drop(inner);

        self.cancel_deadline();

        log::info!("advertising stopped");

        Ok(())
    }

    pub fn state(&self) -> AdvertisingState {
        self.lock().state
    }

    pub fn is_advertising(&self) -> bool {
        self.state() == AdvertisingState::Advertising
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::advertise::build;
    use crate::{AdElement, DeviceInfo};

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Call {
        Start(Vec<Vec<u8>>),
        Update(Vec<Vec<u8>>),
        Stop,
    }

    /// A transport that records the calls made to it
    #[derive(Clone, Default)]
    pub struct RecordingTransport {
        pub calls: Arc<Mutex<Vec<Call>>>,
        pub fail_start: Arc<Mutex<bool>>,
        pub fail_stop: Arc<Mutex<bool>>,
    }

    impl RecordingTransport {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn to_raw(data: &[AdElement]) -> Vec<Vec<u8>> {
        data.iter().map(|e| e.as_bytes().to_vec()).collect()
    }

    impl AdvertisingTransport for RecordingTransport {
        type Error = &'static str;

        fn start(&mut self, _: &AdvertisingParameters, data: &[AdElement]) -> Result<(), Self::Error> {
            if *self.fail_start.lock().unwrap() {
                return Err("start failed");
            }

            self.calls.lock().unwrap().push(Call::Start(to_raw(data)));
            Ok(())
        }

        fn update(&mut self, data: &[AdElement]) -> Result<(), Self::Error> {
            self.calls.lock().unwrap().push(Call::Update(to_raw(data)));
            Ok(())
        }

        fn stop(&mut self) -> Result<(), Self::Error> {
            if *self.fail_stop.lock().unwrap() {
                return Err("stop failed");
            }

            self.calls.lock().unwrap().push(Call::Stop);
            Ok(())
        }
    }

    type Action = Box<dyn FnOnce() + Send>;

    /// A scheduler where actions are run by the test
    #[derive(Clone, Default)]
    pub struct ManualScheduler {
        actions: Arc<Mutex<Vec<(Action, bool)>>>,
    }

    impl ManualScheduler {
        /// Run every action that was not cancelled
        pub fn fire(&self) {
            self.fire_where(|cancelled| !cancelled)
        }

        /// Run every action, even the cancelled ones
        ///
        /// This is a deadline that fired at the same time it was cancelled.
        pub fn fire_late(&self) {
            self.fire_where(|_| true)
        }

        fn fire_where<P: Fn(bool) -> bool>(&self, pred: P) {
            let actions: Vec<_> = self.actions.lock().unwrap().drain(..).collect();

            for (action, cancelled) in actions {
                if pred(cancelled) {
                    action()
                }
            }
        }

        pub fn pending(&self) -> usize {
            self.actions.lock().unwrap().iter().filter(|(_, c)| !c).count()
        }
    }

    impl Scheduler for ManualScheduler {
        type Handle = usize;

        fn schedule<F>(&self, _: Duration, action: F) -> Self::Handle
        where
            F: FnOnce() + Send + 'static,
        {
            let mut actions = self.actions.lock().unwrap();

            actions.push((Box::new(action), false));

            actions.len() - 1
        }

        fn cancel(&self, handle: Self::Handle) {
            if let Some((_, cancelled)) = self.actions.lock().unwrap().get_mut(handle) {
                *cancelled = true;
            }
        }
    }

    fn elements(count: u8) -> AdElements {
        build(DeviceInfo::NoEncrypt, &[0x09, count], "test").unwrap()
    }

    fn advertiser() -> (Advertiser<RecordingTransport, ManualScheduler>, RecordingTransport, ManualScheduler) {
        let transport = RecordingTransport::default();
        let scheduler = ManualScheduler::default();

        (
            Advertiser::new(transport.clone(), scheduler.clone()),
            transport,
            scheduler,
        )
    }

    /// An address as if deserialized from storage written by something else
    fn foreign_address() -> Option<StaticRandomAddress> {
        bincode::deserialize(&[1, 0x11, 0x22, 0x33, 0x44, 0x55, 0x06]).ok()
    }

    const DURATION: Duration = Duration::from_secs(5);

    #[test]
    fn stop_while_idle() {
        let (mut advertiser, transport, _) = advertiser();

        advertiser.stop().unwrap();

        assert!(transport.calls().is_empty());
        assert_eq!(AdvertisingState::Idle, advertiser.state());
    }

    #[test]
    fn deadline_stops_advertising() {
        let (mut advertiser, transport, scheduler) = advertiser();

        advertiser.start(&Default::default(), &elements(1), DURATION).unwrap();

        assert!(advertiser.is_advertising());
        assert_eq!(1, scheduler.pending());

        scheduler.fire();

        assert!(!advertiser.is_advertising());
        assert_eq!(Call::Stop, *transport.calls().last().unwrap());
        assert_eq!(2, transport.calls().len());
    }

    #[test]
    fn stop_cancels_deadline() {
        let (mut advertiser, transport, scheduler) = advertiser();

        advertiser.start(&Default::default(), &elements(1), DURATION).unwrap();

        advertiser.stop().unwrap();

        assert_eq!(0, scheduler.pending());

        // even if the deadline raced the stop, it must not stop again
        scheduler.fire_late();

        assert_eq!(2, transport.calls().len());
        assert_eq!(AdvertisingState::Idle, advertiser.state());
    }

    #[test]
    fn restart_replaces_session() {
        let (mut advertiser, transport, scheduler) = advertiser();

        advertiser.start(&Default::default(), &elements(1), DURATION).unwrap();
        advertiser.start(&Default::default(), &elements(2), Duration::ZERO).unwrap();

        let calls = transport.calls();

        assert_eq!(3, calls.len());
        assert!(matches!(calls[0], Call::Start(_)));
        assert_eq!(Call::Stop, calls[1]);
        assert_eq!(Call::Start(to_raw(elements(2).as_slice())), calls[2]);

        // the deadline of the first session is stale
        scheduler.fire_late();

        assert!(advertiser.is_advertising());
        assert_eq!(3, transport.calls().len());
    }

    #[test]
    fn restart_with_new_deadline() {
        let (mut advertiser, transport, scheduler) = advertiser();

        advertiser.start(&Default::default(), &elements(1), DURATION).unwrap();
        advertiser.start(&Default::default(), &elements(2), DURATION).unwrap();

        assert_eq!(1, scheduler.pending());

        scheduler.fire_late();

        assert!(!advertiser.is_advertising());
        assert_eq!(4, transport.calls().len());
    }

    #[test]
    fn indefinite_advertising() {
        let (mut advertiser, _, scheduler) = advertiser();

        advertiser.start(&Default::default(), &elements(1), Duration::ZERO).unwrap();

        assert_eq!(0, scheduler.pending());
        assert!(advertiser.is_advertising());
    }

    #[test]
    fn transport_start_failure() {
        let (mut advertiser, transport, scheduler) = advertiser();

        *transport.fail_start.lock().unwrap() = true;

        assert_eq!(
            Err(AdvertiseError::Transport("start failed")),
            advertiser.start(&Default::default(), &elements(1), DURATION)
        );

        assert_eq!(AdvertisingState::Idle, advertiser.state());
        assert_eq!(0, scheduler.pending());
    }

    #[test]
    fn transport_stop_failure() {
        let (mut advertiser, transport, scheduler) = advertiser();

        advertiser.start(&Default::default(), &elements(1), DURATION).unwrap();

        *transport.fail_stop.lock().unwrap() = true;

        assert_eq!(Err(AdvertiseError::Transport("stop failed")), advertiser.stop());

        assert!(advertiser.is_advertising());

        // the deadline is still pending and fails the same way
        scheduler.fire();

        assert!(advertiser.is_advertising());

        *transport.fail_stop.lock().unwrap() = false;

        advertiser.stop().unwrap();

        assert!(!advertiser.is_advertising());
    }

    #[test]
    fn update_requires_advertising() {
        let (mut advertiser, transport, _) = advertiser();

        assert_eq!(Err(AdvertiseError::NotAdvertising), advertiser.update(&elements(1)));

        advertiser.start(&Default::default(), &elements(1), Duration::ZERO).unwrap();

        advertiser.update(&elements(2)).unwrap();

        assert_eq!(
            Call::Update(to_raw(elements(2).as_slice())),
            *transport.calls().last().unwrap()
        );
    }

    #[test]
    fn invalid_parameters() {
        let (mut advertiser, transport, _) = advertiser();

        let too_fast = AdvertisingParameters {
            interval_min: Duration::from_millis(10),
            ..Default::default()
        };

        let inverted = AdvertisingParameters {
            interval_min: Duration::from_secs(2),
            interval_max: Duration::from_secs(1),
            use_identity: false,
            random_address: None,
        };

        let too_slow = AdvertisingParameters {
            interval_max: Duration::from_secs(11),
            ..Default::default()
        };

        for parameters in [too_fast, inverted, too_slow].iter() {
            assert_eq!(
                Err(AdvertiseError::Codec(Error::InvalidArgument)),
                advertiser.start(parameters, &elements(1), Duration::ZERO)
            );
        }

        assert!(transport.calls().is_empty());

        let limits = AdvertisingParameters {
            interval_min: MIN_INTERVAL,
            interval_max: MAX_INTERVAL,
            use_identity: false,
            random_address: Some(StaticRandomAddress::from_device_id(1, 2)),
        };

        assert_eq!(Ok(()), limits.validate());

        let not_static = AdvertisingParameters {
            random_address: foreign_address(),
            ..limits
        };

        assert_eq!(Err(Error::InvalidArgument), not_static.validate());
    }
}
