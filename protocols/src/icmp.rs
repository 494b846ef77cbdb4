use anyhow::Context;
use pnet::packet::icmp::{
    self, IcmpCode, IcmpPacket, IcmpTypes, echo_reply::EchoReplyPacket,
    echo_request::MutableEchoRequestPacket,
};

pub const ICMP_ECHO_HDR_LEN: usize = 8;
const ECHO_PAYLOAD: &[u8] = b"netmgmt!";

/// Identifies one outstanding echo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EchoReply {
    pub identifier: u16,
    pub sequence: u16,
}

pub fn create_echo_request(identifier: u16, sequence: u16) -> anyhow::Result<Vec<u8>> {
    let mut buffer: Vec<u8> = vec![0u8; ICMP_ECHO_HDR_LEN + ECHO_PAYLOAD.len()];
    {
        let mut echo = MutableEchoRequestPacket::new(&mut buffer).context("creating echo request")?;
        echo.set_icmp_type(IcmpTypes::EchoRequest);
        echo.set_icmp_code(IcmpCode::new(0));
        echo.set_identifier(identifier);
        echo.set_sequence_number(sequence);
        echo.set_payload(ECHO_PAYLOAD);
    }

    let checksum: u16 = icmp::checksum(&IcmpPacket::new(&buffer).context("reading echo request")?);
    MutableEchoRequestPacket::new(&mut buffer)
        .context("creating echo request")?
        .set_checksum(checksum);

    Ok(buffer)
}

/// Parses an ICMP message, keeping it only if it is an echo reply.
pub fn get_echo_reply(bytes: &[u8]) -> Option<EchoReply> {
    let reply = EchoReplyPacket::new(bytes)?;
    if reply.get_icmp_type() != IcmpTypes::EchoReply {
        return None;
    }
    Some(EchoReply {
        identifier: reply.get_identifier(),
        sequence: reply.get_sequence_number(),
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_request_has_valid_checksum() {
        let bytes = create_echo_request(0x1234, 7).unwrap();
        let packet = IcmpPacket::new(&bytes).unwrap();

        assert_eq!(packet.get_icmp_type(), IcmpTypes::EchoRequest);
        assert_eq!(packet.get_checksum(), icmp::checksum(&packet));
    }

    #[test]
    fn echo_request_is_not_a_reply() {
        let bytes = create_echo_request(1, 1).unwrap();
        assert_eq!(get_echo_reply(&bytes), None);
    }

    #[test]
    fn echo_reply_carries_identifier_and_sequence() {
        let mut bytes = create_echo_request(0xABCD, 513).unwrap();
        // type 0 turns the request into a reply
        bytes[0] = 0;

        assert_eq!(
            get_echo_reply(&bytes),
            Some(EchoReply {
                identifier: 0xABCD,
                sequence: 513
            })
        );
    }

    #[test]
    fn truncated_message_is_ignored() {
        assert_eq!(get_echo_reply(&[0u8; 3]), None);
    }
}
