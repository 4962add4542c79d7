use std::error::Error;
use std::path::PathBuf;

use crate::adb::errors::adb_error::AdbError;
use crate::constants::{DEFAULT_ADB_PORT, NULL_TERMINATOR};

/// The directory where adb conventionally keeps its keypair.
pub fn default_key_dir() -> Result<PathBuf, Box<dyn Error>> {
    let mut path = dirs::home_dir().ok_or("Home directory not found")?;
    path.push(".android");
    Ok(path)
}

pub(crate) fn ensure_null_terminated(mut service: String) -> String {
    if !service.ends_with(NULL_TERMINATOR) {
        service.push(NULL_TERMINATOR);
    }
    service
}

/// Splits `host`, `host:port`, `[v6addr]` or `[v6addr]:port`. A bare
/// address with more than one colon is taken as an unbracketed IPv6 host.
pub fn split_endpoint(endpoint: &str) -> Result<(String, u16), AdbError> {
    if endpoint.is_empty() {
        return Err(AdbError::InvalidHost);
    }

    if let Some(rest) = endpoint.strip_prefix('[') {
        let (host, remainder) = rest.split_once(']').ok_or(AdbError::InvalidHost)?;
        if host.is_empty() {
            return Err(AdbError::InvalidHost);
        }
        return match remainder.strip_prefix(':') {
            Some(port) => Ok((host.to_string(), parse_port(port)?)),
            None if remainder.is_empty() => Ok((host.to_string(), DEFAULT_ADB_PORT)),
            None => Err(AdbError::InvalidHost),
        };
    }

    if endpoint.matches(':').count() > 1 {
        return Ok((endpoint.to_string(), DEFAULT_ADB_PORT));
    }

    match endpoint.split_once(':') {
        Some((host, port)) if !host.is_empty() => Ok((host.to_string(), parse_port(port)?)),
        Some(_) => Err(AdbError::InvalidHost),
        None => Ok((endpoint.to_string(), DEFAULT_ADB_PORT)),
    }
}

fn parse_port(port: &str) -> Result<u16, AdbError> {
    port.parse::<u16>().map_err(|_| AdbError::InvalidHost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_forms() {
        assert_eq!(
            split_endpoint("192.168.1.20").unwrap(),
            (String::from("192.168.1.20"), DEFAULT_ADB_PORT)
        );
        assert_eq!(
            split_endpoint("tv.local:5556").unwrap(),
            (String::from("tv.local"), 5556)
        );
        assert_eq!(
            split_endpoint("[fe80::1]").unwrap(),
            (String::from("fe80::1"), DEFAULT_ADB_PORT)
        );
        assert_eq!(
            split_endpoint("[fe80::1]:5557").unwrap(),
            (String::from("fe80::1"), 5557)
        );
        assert_eq!(
            split_endpoint("fe80::1").unwrap(),
            (String::from("fe80::1"), DEFAULT_ADB_PORT)
        );
    }

    #[test]
    fn invalid_endpoints_are_rejected() {
        assert!(split_endpoint("").is_err());
        assert!(split_endpoint(":5555").is_err());
        assert!(split_endpoint("host:notaport").is_err());
        assert!(split_endpoint("[fe80::1").is_err());
        assert!(split_endpoint("[fe80::1]x").is_err());
        assert!(split_endpoint("host:70000").is_err());
    }

    #[test]
    fn null_termination_is_idempotent() {
        assert_eq!(ensure_null_terminated(String::from("sync:")), "sync:\0");
        assert_eq!(ensure_null_terminated(String::from("sync:\0")), "sync:\0");
    }
}
