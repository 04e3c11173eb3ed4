use std::cmp::max;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::time::Duration;

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use tokio::net::{ToSocketAddrs, UdpSocket};
use tokio::time::{timeout, Instant};

use crate::error::Result;
use crate::util::device::Device;

/// Multicast group and port bulbs listen on for search requests.
pub const MULTICAST_ADDRESS: &str = "239.255.255.250:1982";

/// How long replies are collected after the search request went out.
pub const DEFAULT_DISCOVERY_WINDOW: Duration = Duration::from_millis(500);

const RECEIVE_BUFFER_SIZE: usize = 2048;

lazy_static! {
    static ref NON_LETTERS: Regex = Regex::new(r"[^a-z]+").unwrap();
}

/// A datagram received during discovery, kept verbatim until it is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryReply {
    pub data: String,
    pub sender: SocketAddr,
}

pub struct Discovery;

impl Discovery {
    /// The SSDP-style search request, one header per line.
    pub fn search_message() -> String {
        format!(
            "M-SEARCH * HTTP/1.1\r\nHOST: {}\r\nMAN: \"ssdp:discover\"\r\nST: wifi_bulb",
            MULTICAST_ADDRESS
        )
    }

    /// Turns a header name into a field name: `Color  Mode` becomes `color_mode`.
    pub fn normalize_key(key: &str) -> String {
        let lowered = key.to_lowercase();
        NON_LETTERS
            .replace_all(lowered.trim(), "_")
            .into_owned()
    }

    /// Collects the `Key: Value` lines of a reply. Lines without a colon, such as
    /// the status line, are skipped; values keep everything after the first colon.
    pub fn parse_reply(text: &str) -> HashMap<String, String> {
        text.lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (Self::normalize_key(key), value.trim().to_string()))
            .collect()
    }

    pub fn decode_discovery_reply(reply: &DiscoveryReply) -> Result<Device> {
        Device::from_fields(&Self::parse_reply(&reply.data))
    }

    /// Finds the bulbs on the local network segment, listening for `window`.
    ///
    /// Returns one device per id, in the order the first reply for each id arrived.
    /// No replies is not an error; the result is simply empty.
    pub async fn find_devices(window: Duration) -> Result<Vec<Device>> {
        Self::find_devices_at(MULTICAST_ADDRESS, window).await
    }

    /// Sends the search request to `target` instead of the multicast group, which
    /// lets a single known bulb be probed directly.
    pub async fn find_devices_at<A: ToSocketAddrs>(
        target: A,
        window: Duration,
    ) -> Result<Vec<Device>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket
            .send_to(Self::search_message().as_bytes(), target)
            .await?;

        let replies = Self::collect_replies(&socket, window).await;
        drop(socket);

        let devices = replies
            .iter()
            .filter_map(|reply| match Self::decode_discovery_reply(reply) {
                Ok(device) => Some(device),
                Err(e) => {
                    warn!("Skipping discovery reply from {}: {}", reply.sender, e);
                    None
                }
            })
            .collect();
        Ok(Self::deduplicate(devices))
    }

    /// Receives until the window closes. A receive error ends the window early and
    /// keeps whatever already arrived.
    async fn collect_replies(socket: &UdpSocket, window: Duration) -> Vec<DiscoveryReply> {
        let mut replies = Vec::new();
        let mut buffer = [0; RECEIVE_BUFFER_SIZE];
        let timeout_end = Instant::now() + window;

        loop {
            let now = Instant::now();
            if now >= timeout_end {
                break;
            }

            match timeout(timeout_end - now, socket.recv_from(&mut buffer)).await {
                Ok(Ok((number_of_bytes, sender))) => {
                    let data = String::from_utf8_lossy(&buffer[..number_of_bytes]).into_owned();
                    debug!("Discovery reply from {}: {:?}", sender, data);
                    replies.push(DiscoveryReply { data, sender });
                }
                Ok(Err(e)) => {
                    warn!("Failed to receive discovery reply: {}", e);
                    break;
                }
                Err(_) => {
                    debug!(
                        "Discovery window closed with {} replies collected",
                        replies.len()
                    );
                    break;
                }
            }
        }

        replies
    }

    /// Keeps the first device seen for each id.
    fn deduplicate(devices: Vec<Device>) -> Vec<Device> {
        let mut seen = HashSet::new();
        devices
            .into_iter()
            .filter(|device| {
                if seen.insert(device.id().to_string()) {
                    info!("Found device: {}", device);
                    true
                } else {
                    debug!("Found device {} again, skipping", device.id());
                    false
                }
            })
            .collect()
    }

    pub fn pretty_print_devices(devices: &[Device]) {
        let max_id_width = devices.iter().map(|d| d.id().len()).max().unwrap_or(0);
        let max_host_width = devices
            .iter()
            .map(|d| format!("{}:{}", d.host(), d.port()).len())
            .max()
            .unwrap_or(0);
        let max_name_width = devices
            .iter()
            .map(|d| max(d.name.len(), 12))
            .max()
            .unwrap_or(0);

        println!(
            "{:<id_width$} {:<host_width$} {:<name_width$} {:<6} {:<6}",
            "Device ID",
            "Address",
            "Name",
            "Power",
            "Bright",
            id_width = max_id_width + 2,
            host_width = max_host_width + 2,
            name_width = max_name_width + 2,
        );

        println!(
            "{:<id_width$} {:<host_width$} {:<name_width$} {:<6} {:<6}",
            "-".repeat(max_id_width),
            "-".repeat(max_host_width),
            "-".repeat(max_name_width),
            "-".repeat(5),
            "-".repeat(6),
            id_width = max_id_width + 2,
            host_width = max_host_width + 2,
            name_width = max_name_width + 2,
        );

        for device in devices {
            println!(
                "{:<id_width$} {:<host_width$} {:<name_width$} {:<6} {:<6}",
                device.id(),
                format!("{}:{}", device.host(), device.port()),
                device.name,
                device.power.to_string(),
                device.bright,
                id_width = max_id_width + 2,
                host_width = max_host_width + 2,
                name_width = max_name_width + 2,
            );
        }
    }
}
