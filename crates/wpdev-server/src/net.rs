//! Local network address lookup.

use std::net::UdpSocket;

/// First local network address of this machine, if any.
///
/// Uses the routing-table trick: connect a UDP socket to a public
/// address (no packets are sent) and read back the chosen local address.
/// Returns `None` when the machine has no route, leaving the caller to
/// fall back to localhost.
pub fn local_network_host() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    if ip.is_loopback() || ip.is_unspecified() {
        None
    } else {
        Some(ip.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_never_yields_loopback() {
        // The result depends on the machine; only the invariant is checked.
        if let Some(host) = local_network_host() {
            assert!(!host.is_empty());
            assert_ne!(host, "127.0.0.1");
            assert_ne!(host, "0.0.0.0");
        }
    }
}
