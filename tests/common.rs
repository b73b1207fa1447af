//! Shared fixtures for the integration tests: a scripted sensor that can burn
//! clock time, a transport that records what was sent, and a scheduler builder.
#![allow(dead_code)]

use meshuplink::config::UplinkConfig;
use meshuplink::errors::{SensorError, TransportError};
use meshuplink::meshtastic::identity::{MacAddress, MacIdentity};
use meshuplink::meshtastic::{PortNum, Transport};
use meshuplink::sensor::SensorSource;
use meshuplink::uplink::clock::ManualClock;
use meshuplink::uplink::encoder::{UplinkEncoder, WireFormat};
use meshuplink::uplink::reading::{AdcSample, ClimateSample, Measurement};
use meshuplink::uplink::scheduler::{Peripherals, UplinkScheduler};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// MAC whose short id is `ABCD`.
pub const TEST_MAC: MacAddress = MacAddress([0x24, 0x6F, 0x28, 0xA1, 0xAB, 0xCD]);

pub fn adc_1234() -> Measurement {
    Measurement::Adc(AdcSample {
        pin: 2,
        raw: 1234,
        volts: 1234.0 * 3.3 / 4095.0,
    })
}

pub fn climate(temperature: f32, humidity: f32) -> Measurement {
    Measurement::Climate(ClimateSample {
        temperature,
        humidity,
    })
}

/// Sensor that replays a script, then repeats `fallback`. Every read advances
/// the shared clock by `work_ms` to simulate time spent sampling.
pub struct ScriptedSensor {
    pub script: VecDeque<Result<Measurement, SensorError>>,
    pub fallback: Measurement,
    pub init_result: Result<(), SensorError>,
    pub clock: ManualClock,
    pub work_ms: u64,
    pub reads: Arc<Mutex<u32>>,
}

impl ScriptedSensor {
    pub fn steady(value: Measurement, clock: ManualClock) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: value,
            init_result: Ok(()),
            clock,
            work_ms: 0,
            reads: Arc::new(Mutex::new(0)),
        }
    }

    pub fn working_for(mut self, ms: u64) -> Self {
        self.work_ms = ms;
        self
    }

    pub fn then(mut self, step: Result<Measurement, SensorError>) -> Self {
        self.script.push_back(step);
        self
    }

    pub fn missing(mut self) -> Self {
        self.init_result = Err(SensorError::NotFound("test sensor".into()));
        self
    }
}

impl SensorSource for ScriptedSensor {
    fn init(&mut self) -> Result<(), SensorError> {
        self.init_result.clone()
    }

    fn read(&mut self) -> Result<Measurement, SensorError> {
        if let Ok(mut n) = self.reads.lock() {
            *n += 1;
        }
        self.clock.advance(self.work_ms);
        self.script.pop_front().unwrap_or(Ok(self.fallback))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub port: PortNum,
    pub payload: Vec<u8>,
    pub hop_limit: u8,
    pub at_ms: u64,
}

/// Transport that keeps every accepted packet; can be told to refuse sends.
#[derive(Clone)]
pub struct RecordingTransport {
    pub sent: Arc<Mutex<Vec<Sent>>>,
    pub fail: Arc<AtomicBool>,
    clock: ManualClock,
}

impl RecordingTransport {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(AtomicBool::new(false)),
            clock,
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl Transport for RecordingTransport {
    fn broadcast(
        &mut self,
        port: PortNum,
        payload: &[u8],
        hop_limit: u8,
    ) -> Result<(), TransportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        use meshuplink::uplink::clock::Clock;
        self.sent.lock().unwrap().push(Sent {
            port,
            payload: payload.to_vec(),
            hop_limit,
            at_ms: self.clock.now_ms(),
        });
        Ok(())
    }
}

pub fn scheduler(
    cfg: UplinkConfig,
    format: WireFormat,
    sensor: ScriptedSensor,
    transport: RecordingTransport,
    clock: ManualClock,
) -> UplinkScheduler {
    let encoder = UplinkEncoder::new(format, cfg.max_payload);
    UplinkScheduler::new(
        cfg,
        encoder,
        Peripherals {
            sensor: Box::new(sensor),
            identity: Box::new(MacIdentity::new(TEST_MAC)),
            transport: Box::new(transport),
        },
        Arc::new(clock),
    )
    .with_seed(7)
}
