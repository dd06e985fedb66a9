//! NSEC / NSEC3 type-coverage bitmap (RFC 4034 §4.1.2)

use super::enums::DNSResourceType;
use tracing::warn;

/// Types that can be flagged in a bitmap. All of them live in window 0.
const BITMAP_TYPES: [DNSResourceType; 17] = [
    DNSResourceType::A,
    DNSResourceType::NS,
    DNSResourceType::CNAME,
    DNSResourceType::SOA,
    DNSResourceType::PTR,
    DNSResourceType::HINFO,
    DNSResourceType::MX,
    DNSResourceType::TXT,
    DNSResourceType::AAAA,
    DNSResourceType::A6,
    DNSResourceType::DNAME,
    DNSResourceType::DS,
    DNSResourceType::RRSIG,
    DNSResourceType::NSEC,
    DNSResourceType::DNSKEY,
    DNSResourceType::NSEC3,
    DNSResourceType::NSEC3PARAM,
];

pub fn is_bitmap_type(rtype: DNSResourceType) -> bool {
    BITMAP_TYPES.contains(&rtype)
}

/// Build the window-0 bitmap block for `types`.
///
/// Types outside the bitmap set are logged and skipped. When no type
/// participates the result is empty, since a window without bits is omitted.
pub fn build_bitmap<'a, I>(types: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a DNSResourceType>,
{
    let mut codes = Vec::new();
    for rtype in types {
        if is_bitmap_type(*rtype) {
            codes.push(rtype.code());
        } else {
            warn!("Couldn't add {} to NSEC bit map", rtype);
        }
    }

    let Some(highest) = codes.iter().max().copied() else {
        return Vec::new();
    };

    let length = highest as usize / 8 + 1;
    let mut block = vec![0u8; 2 + length];
    block[0] = 0;
    block[1] = length as u8;
    for code in codes {
        block[2 + code as usize / 8] |= 0x80 >> (code % 8);
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_basic_bitmap() {
        let types = BTreeSet::from([
            DNSResourceType::A,
            DNSResourceType::NS,
            DNSResourceType::SOA,
            DNSResourceType::MX,
        ]);
        assert_eq!(build_bitmap(&types), vec![0x00, 0x02, 0x62, 0x01]);
    }

    #[test]
    fn test_dnssec_types() {
        let types = [
            DNSResourceType::A,
            DNSResourceType::RRSIG,
            DNSResourceType::NSEC,
            DNSResourceType::DNSKEY,
        ];
        // A=1, RRSIG=46, NSEC=47, DNSKEY=48
        assert_eq!(
            build_bitmap(&types),
            vec![0x00, 0x07, 0x40, 0x00, 0x00, 0x00, 0x00, 0x03, 0x80]
        );
    }

    #[test]
    fn test_every_supported_type() {
        let bitmap = build_bitmap(&BITMAP_TYPES);
        assert_eq!(
            bitmap,
            vec![0x00, 0x07, 0x66, 0x0D, 0x80, 0x08, 0x03, 0x13, 0xB0]
        );
    }

    #[test]
    fn test_unsupported_types_are_skipped() {
        let types = [
            DNSResourceType::OPT,
            DNSResourceType::TXT,
            DNSResourceType::Unknown(99),
            DNSResourceType::ANY,
        ];
        assert_eq!(build_bitmap(&types), vec![0x00, 0x03, 0x00, 0x00, 0x80]);
    }

    #[test]
    fn test_empty_bitmap() {
        assert!(build_bitmap(&[]).is_empty());
        assert!(build_bitmap(&[DNSResourceType::AXFR]).is_empty());
    }

    #[test]
    fn test_duplicate_types_set_one_bit() {
        let types = [DNSResourceType::A, DNSResourceType::A];
        assert_eq!(build_bitmap(&types), vec![0x00, 0x01, 0x40]);
    }
}
