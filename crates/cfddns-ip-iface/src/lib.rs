// # Interface Address Source
//
// This crate reads the global-scope IPv6 address of a local network
// interface, for hosts whose public IPv6 address is assigned directly.
//
// ## Implementation
//
// The kernel is asked over an rtnetlink route socket:
// 1. Dump links (`RTM_GETLINK`) to find the interface index by name
// 2. Dump IPv6 addresses (`RTM_GETADDR`, `AF_INET6`)
// 3. Keep the interface's addresses with `RT_SCOPE_UNIVERSE`
// 4. Prefer one without `IFA_F_TENTATIVE` or `IFA_F_DEPRECATED`
//
// The socket is blocking and short-lived; the dump runs on tokio's
// blocking pool.
//
// ## Platform Support
//
// Netlink is Linux-only. Elsewhere the source builds but every lookup
// fails with an address detection error.

use cfddns_core::config::AddressSourceConfig;
use cfddns_core::traits::AddressSource;
use cfddns_core::{Error, IpVersion, Result};

use std::net::{IpAddr, Ipv6Addr};

/// An interface address, decoded from the kernel's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// The address itself
    pub address: Ipv6Addr,
    /// Scope is universe (global)
    pub global: bool,
    /// Neither tentative nor deprecated
    pub preferred: bool,
}

/// Pick the address to publish
///
/// Global addresses only; a preferred one wins over one that is tentative
/// or deprecated. Kernel order breaks ties.
pub fn select_global(addresses: &[InterfaceAddress]) -> Option<Ipv6Addr> {
    let global: Vec<&InterfaceAddress> = addresses.iter().filter(|a| a.global).collect();

    global
        .iter()
        .find(|a| a.preferred)
        .or_else(|| global.first())
        .map(|a| a.address)
}

#[cfg(target_os = "linux")]
mod netlink {
    use super::InterfaceAddress;
    use cfddns_core::{Error, Result};
    use netlink_packet_core::{
        NLM_F_DUMP, NLM_F_REQUEST, NLMSG_DONE, NetlinkHeader, NetlinkMessage, NetlinkPayload,
    };
    use netlink_packet_route::nlas::address::Nla as AddressNla;
    use netlink_packet_route::nlas::link::Nla as LinkNla;
    use netlink_packet_route::{
        AddressMessage, IFA_F_DEPRECATED, IFA_F_TENTATIVE, LinkMessage, RT_SCOPE_UNIVERSE,
        RtnlMessage,
    };
    use netlink_sys::protocols::NETLINK_ROUTE;
    use netlink_sys::{Socket, SocketAddr};
    use std::net::Ipv6Addr;

    const RECV_BUFFER_LEN: usize = 32 * 1024;

    fn socket_error(action: &str, e: std::io::Error) -> Error {
        Error::address_detection(format!("Netlink {} failed: {}", action, e))
    }

    /// Send a dump request and collect every message of the reply
    fn dump(socket: &Socket, request: RtnlMessage, sequence: u32) -> Result<Vec<RtnlMessage>> {
        let mut header = NetlinkHeader::default();
        header.flags = NLM_F_REQUEST | NLM_F_DUMP;
        header.sequence_number = sequence;

        let mut message = NetlinkMessage::new(header, NetlinkPayload::from(request));
        message.finalize();

        let mut buf = vec![0u8; message.header.length as usize];
        message.serialize(&mut buf[..]);
        socket
            .send(&buf[..], 0)
            .map_err(|e| socket_error("send", e))?;

        let mut replies = Vec::new();
        let mut receive = vec![0u8; RECV_BUFFER_LEN];

        loop {
            let size = socket
                .recv(&mut &mut receive[..], 0)
                .map_err(|e| socket_error("receive", e))?;

            let mut offset = 0;
            while offset < size {
                let reply = NetlinkMessage::<RtnlMessage>::deserialize(&receive[offset..size])
                    .map_err(|e| {
                        Error::address_detection(format!("Malformed netlink reply: {}", e))
                    })?;

                let length = reply.header.length as usize;
                if reply.header.message_type == NLMSG_DONE {
                    return Ok(replies);
                }

                match reply.payload {
                    NetlinkPayload::InnerMessage(inner) => replies.push(inner),
                    NetlinkPayload::Error(err) => {
                        return Err(Error::address_detection(format!(
                            "Netlink dump refused: {:?}",
                            err
                        )));
                    }
                    _ => {}
                }

                if length == 0 {
                    break;
                }
                offset += length;
            }
        }
    }

    fn link_name(link: &LinkMessage) -> Option<&str> {
        link.nlas.iter().find_map(|nla| match nla {
            LinkNla::IfName(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Decode one address message; `None` if it carries no IPv6 address
    pub(super) fn decode(message: &AddressMessage) -> Option<InterfaceAddress> {
        let mut address = None;
        // IFA_FLAGS, when present, supersedes the 8-bit header field
        let mut flags = message.header.flags as u32;

        for nla in &message.nlas {
            match nla {
                AddressNla::Address(bytes) => {
                    address = <[u8; 16]>::try_from(bytes.as_slice())
                        .ok()
                        .map(Ipv6Addr::from);
                }
                AddressNla::Flags(extended) => flags = *extended,
                _ => {}
            }
        }

        Some(InterfaceAddress {
            address: address?,
            global: message.header.scope == RT_SCOPE_UNIVERSE as u8,
            preferred: flags & (IFA_F_TENTATIVE | IFA_F_DEPRECATED) as u32 == 0,
        })
    }

    /// IPv6 addresses of `interface`, in kernel order
    pub(super) fn interface_addresses(interface: &str) -> Result<Vec<InterfaceAddress>> {
        let mut socket = Socket::new(NETLINK_ROUTE).map_err(|e| socket_error("open", e))?;
        socket.bind_auto().map_err(|e| socket_error("bind", e))?;
        socket
            .connect(&SocketAddr::new(0, 0))
            .map_err(|e| socket_error("connect", e))?;

        let index = dump(&socket, RtnlMessage::GetLink(LinkMessage::default()), 1)?
            .into_iter()
            .find_map(|reply| match reply {
                RtnlMessage::NewLink(link) if link_name(&link) == Some(interface) => {
                    Some(link.header.index)
                }
                _ => None,
            })
            .ok_or_else(|| Error::address_detection(format!("No such interface: {}", interface)))?;

        let mut request = AddressMessage::default();
        request.header.family = libc::AF_INET6 as u8;

        let addresses = dump(&socket, RtnlMessage::GetAddress(request), 2)?
            .into_iter()
            .filter_map(|reply| match reply {
                RtnlMessage::NewAddress(addr) if addr.header.index == index => decode(&addr),
                _ => None,
            })
            .collect();

        Ok(addresses)
    }
}

#[cfg(target_os = "linux")]
async fn interface_addresses(interface: &str) -> Result<Vec<InterfaceAddress>> {
    let interface = interface.to_string();
    tokio::task::spawn_blocking(move || netlink::interface_addresses(&interface))
        .await
        .map_err(|e| Error::address_detection(format!("Netlink lookup task failed: {}", e)))?
}

#[cfg(not(target_os = "linux"))]
async fn interface_addresses(interface: &str) -> Result<Vec<InterfaceAddress>> {
    Err(Error::address_detection(format!(
        "Reading the addresses of {} requires Linux netlink",
        interface
    )))
}

/// Global-scope IPv6 address of a named interface
pub struct InterfaceAddressSource {
    interface: String,
}

impl InterfaceAddressSource {
    /// Create a source for `interface` (e.g., "eth0")
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }
}

#[async_trait::async_trait]
impl AddressSource for InterfaceAddressSource {
    async fn current(&self, version: IpVersion) -> Result<IpAddr> {
        if version != IpVersion::V6 {
            return Err(Error::address_detection(
                "Interface address source only supports IPv6",
            ));
        }

        let addresses = interface_addresses(&self.interface).await?;
        tracing::debug!(
            "Interface {} has {} IPv6 address(es)",
            self.interface,
            addresses.len()
        );

        let address = select_global(&addresses).ok_or_else(|| {
            Error::address_detection(format!(
                "No global IPv6 address on interface {}",
                self.interface
            ))
        })?;

        tracing::debug!("Interface {} has global address {}", self.interface, address);
        Ok(IpAddr::V6(address))
    }

    fn source_name(&self) -> &'static str {
        "interface"
    }
}

/// Build the interface address source described by `config`
pub fn create(config: &AddressSourceConfig) -> Result<Box<dyn AddressSource>> {
    config.validate()?;

    match config {
        AddressSourceConfig::Interface { name } => {
            Ok(Box::new(InterfaceAddressSource::new(name.clone())))
        }
        _ => Err(Error::config("Invalid config for interface address source")),
    }
}
