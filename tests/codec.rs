//! End-to-end codec tests on captured Neighbor Discovery fixtures

use ndisc::Error;
use ndisc::protocol::{
    MacAddr, Message, MessageType, Mtu, NdpOption, NeighborAdvertisement, Nonce, OptionContainer,
    OptionType, PrefixInformation, RecursiveDnsServer, RouterAdvertisement, RouterPreference,
    apply_checksum, parse_options, verify_checksum,
};
use std::net::Ipv6Addr;

const MAC: MacAddr = MacAddr([0xa1, 0xb2, 0xc3, 0xd4, 0xe5, 0xf6]);

fn all_routers() -> Ipv6Addr {
    "ff02::2".parse().unwrap()
}

fn all_nodes() -> Ipv6Addr {
    "ff02::1".parse().unwrap()
}

fn advertisement() -> RouterAdvertisement {
    RouterAdvertisement {
        hop_limit: 64,
        managed_address: true,
        other_stateful: true,
        home_agent: true,
        router_preference: RouterPreference::High,
        router_lifetime: 3600,
        reachable_time: 7200,
        retrans_timer: 1800,
        options: Vec::new(),
    }
}

#[test]
fn test_neighbor_advertisement_fixture() {
    let mut msg = Message::from(NeighborAdvertisement::new(
        "fe80::1".parse().unwrap(),
        true,
        true,
        true,
    ));

    let mut fixture = vec![136, 0, 0, 0, 224, 0, 0, 0, 254, 128];
    fixture.extend_from_slice(&[0; 13]);
    fixture.push(1);
    assert_eq!(msg.marshal().unwrap(), fixture);

    msg.add_option(NdpOption::target_link_layer(MAC));
    fixture.extend_from_slice(&[2, 1, 161, 178, 195, 212, 229, 246]);
    let bytes = msg.marshal().unwrap();
    assert_eq!(bytes.len(), 32);
    assert_eq!(bytes, fixture);
    assert_eq!(
        msg.to_string(),
        "neighbor advertisement, length 32, tgt is fe80::1, Flags [router solicited override]\n    \
         target link-layer address option (2), length 8 (1): a1:b2:c3:d4:e5:f6"
    );

    let parsed = Message::parse(&bytes).unwrap();
    assert_eq!(parsed, msg);
    assert_eq!(parsed.message_type(), MessageType::NeighborAdvertisement);
}

#[test]
fn test_router_advertisement_fixture() {
    let mut msg = Message::from(advertisement());
    let header = [134, 0, 0, 0, 64, 232, 14, 16, 0, 0, 28, 32, 0, 0, 7, 8];
    assert_eq!(msg.marshal().unwrap(), header);

    msg.add_option(NdpOption::RecursiveDnsServer(RecursiveDnsServer::new(
        300,
        vec![
            "2001:4860:4860::8844".parse().unwrap(),
            "2001:4860:4860::8888".parse().unwrap(),
        ],
    )));

    let fixture = vec![
        134, 0, 0, 0, 64, 232, 14, 16, 0, 0, 28, 32, 0, 0, 7, 8, 25, 5, 0, 0, 0, 0, 1, 44, 32, 1,
        72, 96, 72, 96, 0, 0, 0, 0, 0, 0, 0, 0, 136, 68, 32, 1, 72, 96, 72, 96, 0, 0, 0, 0, 0, 0,
        0, 0, 136, 136,
    ];
    assert_eq!(msg.marshal().unwrap(), fixture);
    assert_eq!(
        msg.to_string(),
        "router advertisement, length 56\n hop limit 64, \
         Flags [managed other stateful home agent], pref high, router lifetime 3600s, \
         reachable time 7200s, retrans time 1800s\n    \
         rdnss option (25), length 40 (5): lifetime 300s, \
         addr: 2001:4860:4860::8844 addr: 2001:4860:4860::8888"
    );
    assert_eq!(Message::parse(&fixture).unwrap(), msg);
}

#[test]
fn test_mtu_option_fixture() {
    let option = NdpOption::Mtu(Mtu::new(1500));
    let bytes = option.marshal().unwrap();
    assert_eq!(bytes, vec![5, 1, 0, 0, 0, 0, 5, 220]);

    let parsed = parse_options(&bytes).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].len_words(), 1);
    assert_eq!(parsed[0], option);
}

#[test]
fn test_nonce_option_fixture() {
    let mut nonce = Nonce::new(65766764768057);
    assert_eq!(
        NdpOption::Nonce(nonce).marshal().unwrap(),
        vec![14, 1, 59, 208, 132, 166, 235, 57]
    );

    nonce.nonce = 281474976710656;
    assert!(matches!(
        NdpOption::Nonce(nonce).marshal(),
        Err(Error::NonceOutOfRange(281474976710656))
    ));
}

#[test]
fn test_prefix_information_fixture() {
    let option = NdpOption::PrefixInformation(PrefixInformation::new(
        "2a00:1450:400e:802::".parse().unwrap(),
        64,
        true,
        true,
        2592000,
        604800,
    ));
    let fixture = vec![
        3, 4, 64, 192, 0, 39, 141, 0, 0, 9, 58, 128, 0, 0, 0, 0, 42, 0, 20, 80, 64, 14, 8, 2, 0,
        0, 0, 0, 0, 0, 0, 0,
    ];
    assert_eq!(option.marshal().unwrap(), fixture);
    assert_eq!(
        option.to_string(),
        "prefix info option (3), length 32 (4): 2a00:1450:400e:802::/64, \
         Flags [onlink auto], valid time 2592000s, pref. time 604800s"
    );
    assert_eq!(parse_options(&fixture).unwrap(), vec![option]);
}

#[test]
fn test_checksum_fixture() {
    let mut body = vec![134, 0, 0, 0, 64, 72, 14, 16, 0, 0, 0, 0, 0, 0, 0, 0];
    let checksum = apply_checksum(&mut body, &all_routers(), &all_nodes()).unwrap();
    assert_eq!(checksum.to_be_bytes(), [45, 84]);
    assert_eq!(&body[2..4], &[45, 84]);
    assert!(verify_checksum(&all_routers(), &all_nodes(), &body));
}

#[test]
fn test_checksum_with_mtu_option() {
    let mut ra = advertisement();
    ra.managed_address = false;
    ra.other_stateful = true;
    ra.home_agent = false;
    ra.router_preference = RouterPreference::High;
    ra.router_lifetime = 3600;
    ra.reachable_time = 0;
    ra.retrans_timer = 0;
    ra.add_option(NdpOption::Mtu(Mtu::new(1500)));

    let mut bytes = Message::from(ra).marshal().unwrap();
    assert_eq!(&bytes[..8], &[134, 0, 0, 0, 64, 72, 14, 16]);

    apply_checksum(&mut bytes, &all_routers(), &all_nodes()).unwrap();
    assert_eq!(&bytes[..4], &[134, 0, 34, 111]);

    // The checksum field is not part of the decoded message
    let parsed = Message::parse(&bytes).unwrap();
    assert_eq!(&parsed.marshal().unwrap()[2..4], &[0, 0]);
    assert!(parsed.has_option(OptionType::Mtu));
}

#[test]
fn test_option_buffer_underrun() {
    // Prefix information claims 32 bytes, only 16 present
    let buffer = [3, 4, 64, 192, 0, 39, 141, 0, 0, 9, 58, 128, 0, 0, 0, 0];
    match parse_options(&buffer) {
        Err(Error::OptionBufferUnderrun {
            kind,
            declared,
            available,
        }) => {
            assert_eq!(kind, OptionType::PrefixInformation);
            assert_eq!(declared, 32);
            assert_eq!(available, 16);
        }
        other => panic!("unexpected result {:?}", other),
    }

    // Same failure surfaced through the message parser
    let mut msg = vec![133, 0, 0, 0, 0, 0, 0, 0];
    msg.extend_from_slice(&buffer);
    assert!(matches!(
        Message::parse(&msg),
        Err(Error::OptionBufferUnderrun { .. })
    ));
}

#[test]
fn test_unknown_option_preserved() {
    let mut bytes = vec![133, 0, 0, 0, 0, 0, 0, 0];
    bytes.extend_from_slice(&[200, 1, 1, 2, 3, 4, 5, 6]);
    bytes.extend_from_slice(&[1, 1, 161, 178, 195, 212, 229, 246]);

    let msg = Message::parse(&bytes).unwrap();
    assert_eq!(msg.options().len(), 2);
    assert!(msg.has_option(OptionType::Unknown(200)));
    assert_eq!(
        msg.get_option(OptionType::SourceLinkLayerAddress),
        Some(&NdpOption::source_link_layer(MAC))
    );
    assert_eq!(msg.marshal().unwrap(), bytes);
}

#[test]
fn test_unsupported_and_short_messages() {
    assert!(matches!(
        Message::parse(&[128, 0, 0, 0, 0, 0, 0, 0]),
        Err(Error::UnsupportedMessageType(128))
    ));
    assert!(matches!(
        Message::parse(&[136, 0, 0]),
        Err(Error::MessageTooShort { .. })
    ));
    assert!(matches!(
        Message::parse(&[136, 0, 0, 0, 224, 0, 0, 0]),
        Err(Error::MessageTooShort {
            expected: 24,
            actual: 8
        })
    ));
}
