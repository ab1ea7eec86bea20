#![allow(clippy::unwrap_used, reason = "tests")]

mod common;

use common::{FakeAccessPoint, FakeTransport, GET_ROOT, RecordingDelay, SANDY_SHORES_BODY, post};
use embassy_futures::block_on;
use stac::Error;
use stac::portal::{ApConfig, REQUEST_CAPACITY, capture_credentials};

const MAC: [u8; 6] = [0x24, 0x0a, 0xc4, 0x12, 0x34, 0x56];

#[test]
fn form_then_submission_completes_capture() {
    let mut access_point = FakeAccessPoint::default();
    let mut transport = FakeTransport::with_requests(&[GET_ROOT, &post(SANDY_SHORES_BODY)]);
    let mut delay = RecordingDelay::default();
    let config = ApConfig::for_device(MAC).unwrap();

    let record =
        block_on(capture_credentials(&mut access_point, &mut transport, &mut delay, &config))
            .unwrap();

    assert_eq!(record.ssid.as_str(), "SandyShores222");
    assert_eq!(access_point.started, vec![config]);
    assert_eq!(access_point.stops, 1);
    assert_eq!(transport.ports, vec![80, 80]);
    assert_eq!(
        transport.status_lines(),
        vec!["HTTP/1.1 200 OK", "HTTP/1.1 200 OK"]
    );
    assert!(transport.responses[0].contains("name=\"stIP\""));
    assert!(transport.responses[0].contains(stac::FIRMWARE_VERSION));
    assert!(transport.responses[1].contains("STAC configuration received."));
    assert_eq!(delay.requested_ms, vec![500]);
}

#[test]
fn unknown_paths_get_404_and_capture_continues() {
    let mut access_point = FakeAccessPoint::default();
    let mut transport = FakeTransport::with_requests(&[
        "GET /favicon.ico HTTP/1.1\r\n\r\n",
        "GET /generate_204 HTTP/1.1\r\n\r\n",
        &post(SANDY_SHORES_BODY),
    ]);
    let mut delay = RecordingDelay::default();
    let config = ApConfig::for_device(MAC).unwrap();

    block_on(capture_credentials(&mut access_point, &mut transport, &mut delay, &config)).unwrap();

    assert_eq!(
        transport.status_lines(),
        vec!["HTTP/1.1 404 Not Found", "HTTP/1.1 404 Not Found", "HTTP/1.1 200 OK"]
    );
}

#[test]
fn malformed_submission_gets_400_and_capture_continues() {
    let mut access_point = FakeAccessPoint::default();
    let mut transport = FakeTransport::with_requests(&[
        &post("SSID=a&pwd=b&stIP=not-an-ip&stPort=80&stChan=6&pollTime=300"),
        &post(SANDY_SHORES_BODY),
    ]);
    let mut delay = RecordingDelay::default();
    let config = ApConfig::for_device(MAC).unwrap();

    let record =
        block_on(capture_credentials(&mut access_point, &mut transport, &mut delay, &config))
            .unwrap();

    assert_eq!(record.max_tally_channel, 7);
    assert_eq!(
        transport.status_lines(),
        vec!["HTTP/1.1 400 Bad Request", "HTTP/1.1 200 OK"]
    );
}

#[test]
fn request_split_across_chunks_is_drained() {
    let request = post(SANDY_SHORES_BODY);
    let (head, body) = request.split_at(request.len() / 2);
    let mut access_point = FakeAccessPoint::default();
    let mut transport = FakeTransport::default();
    transport
        .sessions
        .push_back(Some(vec![head.as_bytes().to_vec(), body.as_bytes().to_vec()]));
    let mut delay = RecordingDelay::default();
    let config = ApConfig::for_device(MAC).unwrap();

    let record =
        block_on(capture_credentials(&mut access_point, &mut transport, &mut delay, &config))
            .unwrap();
    assert_eq!(record.poll_interval_ms, 300);
}

#[test]
fn oversized_request_is_rejected() {
    let mut access_point = FakeAccessPoint::default();
    let mut transport = FakeTransport::default();
    transport
        .sessions
        .push_back(Some(vec![vec![b'A'; REQUEST_CAPACITY + 10]]));
    transport
        .sessions
        .push_back(Some(vec![post(SANDY_SHORES_BODY).into_bytes()]));
    let mut delay = RecordingDelay::default();
    let config = ApConfig::for_device(MAC).unwrap();

    block_on(capture_credentials(&mut access_point, &mut transport, &mut delay, &config)).unwrap();
    assert_eq!(
        transport.status_lines(),
        vec!["HTTP/1.1 400 Bad Request", "HTTP/1.1 200 OK"]
    );
}

#[test]
fn accept_failure_is_retried_after_a_pause() {
    let mut access_point = FakeAccessPoint::default();
    let mut transport = FakeTransport::default();
    transport.sessions.push_back(None);
    transport
        .sessions
        .push_back(Some(vec![post(SANDY_SHORES_BODY).into_bytes()]));
    let mut delay = RecordingDelay::default();
    let config = ApConfig::for_device(MAC).unwrap();

    block_on(capture_credentials(&mut access_point, &mut transport, &mut delay, &config)).unwrap();
    assert_eq!(delay.requested_ms, vec![500, 500]);
    assert_eq!(transport.responses.len(), 1);
}

#[test]
fn access_point_start_failure_is_fatal() {
    let mut access_point = FakeAccessPoint {
        fail_start: true,
        ..FakeAccessPoint::default()
    };
    let mut transport = FakeTransport::default();
    let mut delay = RecordingDelay::default();
    let config = ApConfig::for_device(MAC).unwrap();

    let result =
        block_on(capture_credentials(&mut access_point, &mut transport, &mut delay, &config));
    assert_eq!(result, Err(Error::AccessPoint));
    assert!(transport.ports.is_empty());
}

#[test]
fn device_ap_settings() {
    let config = ApConfig::for_device(MAC).unwrap();
    assert_eq!(config.ssid.as_str(), "STAC-563412");
    assert_eq!(config.passphrase, "1234567890");
    assert_eq!(config.channel, 1);
    assert_eq!(config.address, core::net::Ipv4Addr::new(192, 168, 6, 14));
    assert_eq!(config.gateway, config.address);
    assert_eq!(config.prefix_len, 24);
}
