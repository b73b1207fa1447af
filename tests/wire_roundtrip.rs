//! What one node encodes, another node must decode to the same values within
//! the precision of the wire format.
mod common;

use common::*;
use meshuplink::config::Config;
use meshuplink::meshtastic::identity::{MacAddress, MacIdentity, ShortId};
use meshuplink::meshtastic::MeshPacket;
use meshuplink::uplink::clock::ManualClock;
use meshuplink::uplink::decoder::PeerDecoder;
use meshuplink::uplink::encoder::{UplinkEncoder, WireFormat};
use meshuplink::uplink::reading::{PeerValues, Reading};
use meshuplink::uplink::scheduler::Peripherals;
use meshuplink::uplink::{MessageReceiver, PeriodicTask, UplinkModule};
use std::sync::Arc;

fn short_id() -> ShortId {
    ShortId::from_mac(&TEST_MAC)
}

fn decoded(format: WireFormat, reading: &Reading) -> (String, PeerValues) {
    let payload = UplinkEncoder::new(format, 256).encode(reading).unwrap();
    let peer = PeerDecoder::default().decode(&payload).unwrap();
    (peer.node_id, peer.values)
}

#[test]
fn climate_survives_every_format() {
    let reading = Reading::new(short_id(), climate(-3.47, 61.25));
    let expected = PeerValues::from(reading.values());
    for format in [WireFormat::Json, WireFormat::JsonNested, WireFormat::Text] {
        let (id, values) = decoded(format, &reading);
        assert_eq!(id, "ABCD", "{:?}", format);
        assert!(
            values.approx_eq(&expected, 0.051),
            "{:?}: {:?} vs {:?}",
            format,
            values,
            expected
        );
    }
}

#[test]
fn adc_voltage_keeps_two_decimals_in_json() {
    let reading = Reading::new(short_id(), adc_1234());
    for format in [WireFormat::Json, WireFormat::JsonNested] {
        let (_, values) = decoded(format, &reading);
        assert_eq!(values.pin, Some(2));
        assert_eq!(values.raw, Some(1234));
        assert_eq!(values.voltage, Some(0.99));
    }
}

#[test]
fn adc_text_carries_one_decimal() {
    let reading = Reading::new(short_id(), adc_1234());
    let payload = UplinkEncoder::new(WireFormat::Text, 256)
        .encode(&reading)
        .unwrap();
    assert_eq!(
        String::from_utf8(payload.clone()).unwrap(),
        "⚡ Sensor [ABCD]\nPin: 2\nRaw: 1234\nVoltage: 1.0V"
    );
    let values = PeerDecoder::default().decode(&payload).unwrap().values;
    assert_eq!(values.raw, Some(1234));
    assert_eq!(values.voltage, Some(1.0));
    assert_eq!(values.temperature, None);
}

#[test]
fn freezing_point_is_a_real_reading() {
    let reading = Reading::new(short_id(), climate(0.0, 80.0));
    for format in [WireFormat::Json, WireFormat::Text] {
        let (_, values) = decoded(format, &reading);
        assert_eq!(values.temperature, Some(0.0));
        assert_eq!(values.primary(), Some(0.0));
    }
}

#[test]
fn encode_into_respects_buffer() {
    let reading = Reading::new(short_id(), adc_1234());
    let encoder = UplinkEncoder::new(WireFormat::Json, 256);
    let mut small = [0u8; 8];
    assert_eq!(encoder.encode_into(&reading, &mut small), 0);
    let mut buf = [0u8; 256];
    let n = encoder.encode_into(&reading, &mut buf);
    assert_eq!(&buf[..n], br#"{"id":"ABCD","pin":2,"raw":1234,"V":0.99}"#);
}

fn node(
    config: &Config,
    mac: MacAddress,
    clock: &ManualClock,
) -> (UplinkModule, RecordingTransport) {
    let transport = RecordingTransport::new(clock.clone());
    let module = UplinkModule::new(
        config,
        Peripherals {
            sensor: Box::new(ScriptedSensor::steady(adc_1234(), clock.clone())),
            identity: Box::new(MacIdentity::new(mac)),
            transport: Box::new(transport.clone()),
        },
        Arc::new(clock.clone()),
    )
    .with_seed(3);
    (module, transport)
}

#[test]
fn anything_sent_at_the_payload_bound_is_accepted_by_peers() {
    let flat_len = UplinkEncoder::new(WireFormat::Json, 256)
        .encode(&Reading::new(short_id(), adc_1234()))
        .unwrap()
        .len();
    let peer_mac = MacAddress([0x02, 0, 0, 0, 0x12, 0x34]);

    for max_payload in [flat_len, flat_len + 1] {
        let mut config = Config::default();
        config.encoding.format = WireFormat::Json;
        config.uplink.max_payload = max_payload;
        let clock = ManualClock::new(0);
        let (mut sender, transport) = node(&config, TEST_MAC, &clock);
        let (mut peer, _) = node(&config, peer_mac, &clock);

        sender.scheduler.run_once();
        let sent = transport.sent();
        if max_payload == flat_len {
            assert!(
                sent.is_empty(),
                "{}-byte message sent with bound {}",
                flat_len,
                max_payload
            );
            continue;
        }
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload.len(), flat_len);
        peer.receiver.handle_received(&MeshPacket {
            from: TEST_MAC.node_num(),
            port: sent[0].port,
            hop_limit: sent[0].hop_limit,
            payload: sent[0].payload.clone(),
        });
        let peers = peer.peers();
        let cache = peers.lock().unwrap();
        let entry = cache
            .get(TEST_MAC.node_num())
            .expect("peer accepted the message");
        assert_eq!(entry.node_id, "ABCD");
        assert_eq!(entry.values.raw, Some(1234));
    }
}
