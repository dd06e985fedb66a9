use apexdns::dns::{
    DNSQuestion, DNSResourceClass, DNSResourceType, parse_message, parse_query, parse_questions,
};
use apexdns::error::DecodeError;

fn header(qdcount: u16) -> Vec<u8> {
    let mut buf = vec![0xAB, 0xCD, 0x01, 0x00];
    buf.extend_from_slice(&qdcount.to_be_bytes());
    buf.extend_from_slice(&[0; 6]);
    buf
}

#[test]
fn test_www_example_com_cursor() {
    let mut buf = header(1);
    buf.extend_from_slice(&[3, b'w', b'w', b'w', 7]);
    buf.extend_from_slice(b"example");
    buf.extend_from_slice(&[3, b'c', b'o', b'm', 0, 0x00, 0x01, 0x00, 0x01]);
    // trailing additional-section bytes must not be consumed
    buf.extend_from_slice(&[0xFF, 0xFF]);

    let (questions, end) = parse_questions(&buf, 12, 1).unwrap();
    assert_eq!(
        questions,
        vec![DNSQuestion::new("www.example.com", DNSResourceType::A, DNSResourceClass::IN)]
    );
    assert_eq!(end, buf.len() - 2);
}

#[test]
fn test_question_bytes_round_into_parser() {
    let questions = vec![
        DNSQuestion::new("example.com", DNSResourceType::MX, DNSResourceClass::IN),
        DNSQuestion::new("", DNSResourceType::NS, DNSResourceClass::IN),
        DNSQuestion::new("x.example.org", DNSResourceType::Unknown(65), DNSResourceClass::CH),
    ];
    let mut buf = header(questions.len() as u16);
    for question in &questions {
        buf.extend(question.to_bytes().unwrap());
    }

    assert_eq!(parse_query(&buf).unwrap(), questions);
}

#[test]
fn test_pointer_beyond_buffer() {
    let mut buf = header(1);
    buf.extend_from_slice(&[0xC0, 0xFF, 0x00, 0x01, 0x00, 0x01]);
    assert!(matches!(
        parse_query(&buf),
        Err(DecodeError::PointerOutOfRange { pointer: 255, .. })
    ));
}

#[test]
fn test_pointer_cycle_is_rejected() {
    let mut buf = header(1);
    // pointer at 12 referring to itself
    buf.extend_from_slice(&[0xC0, 12, 0x00, 0x01, 0x00, 0x01]);
    assert_eq!(
        parse_query(&buf),
        Err(DecodeError::PointerLoop { offset: 12 })
    );
}

#[test]
fn test_reserved_label_bits() {
    let mut buf = header(1);
    buf.extend_from_slice(&[0x41, b'a', 0, 0x00, 0x01, 0x00, 0x01]);
    assert_eq!(parse_query(&buf), Err(DecodeError::ReservedLabelType(0x40)));
}

#[test]
fn test_declared_count_exceeds_buffer() {
    let mut buf = header(2);
    buf.extend(
        DNSQuestion::new("example.com", DNSResourceType::A, DNSResourceClass::IN)
            .to_bytes()
            .unwrap(),
    );
    assert!(matches!(parse_query(&buf), Err(DecodeError::Truncated { .. })));
}

#[test]
fn test_to_bytes_rejects_bad_names() {
    let question = DNSQuestion::new("a..b", DNSResourceType::A, DNSResourceClass::IN);
    assert!(question.to_bytes().is_err());
}

/// `dig www.test.com` with an EDNS cookie; `dnssec` sets the DO bit
fn dig_query(dnssec: bool) -> Vec<u8> {
    let mut buf = vec![
        0x6b, 0xcd, 0x01, 0x20, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
    ];
    buf.extend_from_slice(&[3, b'w', b'w', b'w', 4, b't', b'e', b's', b't', 3, b'c', b'o', b'm', 0]);
    buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    // OPT: root owner, type 41, udp 4096, flags, 12 bytes of cookie option
    buf.extend_from_slice(&[0x00, 0x00, 0x29, 0x10, 0x00, 0x00, 0x00]);
    buf.push(if dnssec { 0x80 } else { 0x00 });
    buf.extend_from_slice(&[0x00, 0x00, 0x0c, 0x00, 0x0a, 0x00, 0x08]);
    buf.extend_from_slice(&[0xc2, 0x0f, 0xef, 0xfa, 0xb4, 0xa5, 0xdf, 0x5e]);
    buf
}

#[test]
fn test_dig_query_with_edns() {
    let query = parse_message(&dig_query(false)).unwrap();
    assert_eq!(query.header.qdcount, 1);
    assert_eq!(query.header.arcount, 1);
    assert_eq!(
        query.questions,
        vec![DNSQuestion::new("www.test.com", DNSResourceType::A, DNSResourceClass::IN)]
    );

    let opt = query.edns.as_ref().unwrap();
    assert_eq!(opt.udp_payload_size, 4096);
    assert_eq!(opt.options.len(), 1);
    assert_eq!(opt.options[0].code, 10);
    assert!(!query.dnssec_ok());
}

#[test]
fn test_dig_query_with_dnssec_ok() {
    let query = parse_message(&dig_query(true)).unwrap();
    assert_eq!(query.header.arcount, 1);
    assert!(query.dnssec_ok());
    // the question section alone is unaffected by the additional record
    assert_eq!(parse_query(&dig_query(true)).unwrap(), query.questions);
}

#[test]
fn test_query_without_additionals_has_no_edns() {
    let mut buf = header(1);
    buf.extend(
        DNSQuestion::new("example.com", DNSResourceType::A, DNSResourceClass::IN)
            .to_bytes()
            .unwrap(),
    );
    let query = parse_message(&buf).unwrap();
    assert_eq!(query.edns, None);
    assert!(!query.dnssec_ok());
}

#[test]
fn test_duplicate_opt_is_rejected() {
    let mut buf = dig_query(false);
    buf[11] = 2;
    buf.extend_from_slice(&[0x00, 0x00, 0x29, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    assert!(matches!(parse_message(&buf), Err(DecodeError::InvalidOpt(_))));
}

#[test]
fn test_truncated_opt_rdata() {
    let mut buf = dig_query(false);
    buf.truncate(buf.len() - 3);
    assert!(matches!(parse_message(&buf), Err(DecodeError::Truncated { .. })));
}
