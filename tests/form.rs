#![allow(clippy::unwrap_used, reason = "tests")]

mod common;

use core::net::Ipv4Addr;

use common::{SANDY_SHORES_BODY, post};
use stac::FormError;
use stac::portal::ProvisioningRecord;
use stac::portal::form::{
    FIELD_MAX_CHANNEL, FIELD_SSID, FIELD_TARGET_IP, FIELD_TARGET_PORT, url_decode,
};

#[test]
fn url_decode_examples() {
    assert_eq!(
        url_decode::<32>("abcd%24%26%40%29%28-987", FIELD_SSID).unwrap().as_str(),
        "abcd$&@)(-987"
    );
    assert_eq!(url_decode::<32>("a+b", FIELD_SSID).unwrap().as_str(), "a b");
    assert_eq!(url_decode::<32>("%4", FIELD_SSID).unwrap().as_str(), "%4");
    assert_eq!(url_decode::<32>("50%", FIELD_SSID).unwrap().as_str(), "50%");
    assert_eq!(url_decode::<32>("%2B%2b", FIELD_SSID).unwrap().as_str(), "++");
}

#[test]
fn sandy_shores_submission_parses() {
    let record = ProvisioningRecord::from_request(&post(SANDY_SHORES_BODY)).unwrap();
    assert_eq!(record.ssid.as_str(), "SandyShores222");
    assert_eq!(record.password.as_str(), "flatBUSH@&$)(;:/-3546");
    assert_eq!(record.target_address_text.as_str(), "192.168.2.132");
    assert_eq!(record.target_address, Ipv4Addr::new(192, 168, 2, 132));
    assert_eq!(record.target_port, 80);
    assert_eq!(record.max_tally_channel, 7);
    assert_eq!(record.poll_interval_ms, 300);
}

#[test]
fn field_order_does_not_matter() {
    let reordered = "pollTime=300&stChan=7&stPort=80&stIP=192.168.2.132&pwd=flatBUSH%40%26%24%29%28%3B%3A%2F-3546&SSID=SandyShores222";
    assert_eq!(
        ProvisioningRecord::from_request(reordered),
        ProvisioningRecord::from_request(SANDY_SHORES_BODY)
    );
}

#[test]
fn spaces_in_ssid_and_empty_password() {
    let body = "SSID=Control+Room%202&pwd=&stIP=10.0.0.9&stPort=8080&stChan=8&pollTime=175";
    let record = ProvisioningRecord::from_request(body).unwrap();
    assert_eq!(record.ssid.as_str(), "Control Room 2");
    assert_eq!(record.password.as_str(), "");
    assert_eq!(record.target_port, 8080);
}

#[test]
fn malformed_submissions_name_the_field() {
    let cases = [
        ("", FormError::MissingBody),
        (
            "pwd=x&stIP=10.0.0.9&stPort=80&stChan=6&pollTime=300",
            FormError::MissingField(FIELD_SSID),
        ),
        (
            "SSID=&pwd=x&stIP=10.0.0.9&stPort=80&stChan=6&pollTime=300",
            FormError::MissingField(FIELD_SSID),
        ),
        (
            "SSID=a&pwd=x&stIP=10.0.0.300&stPort=80&stChan=6&pollTime=300",
            FormError::InvalidAddress(FIELD_TARGET_IP),
        ),
        (
            "SSID=a&pwd=x&stIP=10.0.0.9&stPort=70000&stChan=6&pollTime=300",
            FormError::InvalidNumber(FIELD_TARGET_PORT),
        ),
        (
            "SSID=a&pwd=x&stIP=10.0.0.9&stPort=80&stChan=0&pollTime=300",
            FormError::OutOfRange(FIELD_MAX_CHANNEL),
        ),
        (
            "SSID=abcdefghijklmnopqrstuvwxyz0123456&pwd=x&stIP=10.0.0.9&stPort=80&stChan=6&pollTime=300",
            FormError::TooLong(FIELD_SSID),
        ),
    ];
    for (body, expected) in cases {
        assert_eq!(ProvisioningRecord::from_request(body), Err(expected), "{body}");
    }
}
