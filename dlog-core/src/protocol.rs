//! Delivery protocol codes.
//!
//! Each record carries a one-hex-digit type code naming the protocol the
//! file was moved with. The code table is append-only; unknown digits make
//! the record malformed.

use serde::{Deserialize, Serialize};

/// Transfer protocol recorded for a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ftp,
    Ftps,
    Sftp,
    Scp,
    Http,
    Https,
    Smtp,
    Smtps,
    Loc,
    Exec,
    Wmo,
    Map,
    Dfax,
    DeMail,
}

impl Protocol {
    /// Decode the hex type-code digit of a record.
    pub fn from_type_code(digit: u8) -> Option<Protocol> {
        let value = (digit as char).to_digit(16)?;

        Some(match value {
            0x0 => Protocol::Ftp,
            0x1 => Protocol::Ftps,
            0x2 => Protocol::Sftp,
            0x3 => Protocol::Scp,
            0x4 => Protocol::Http,
            0x5 => Protocol::Https,
            0x6 => Protocol::Smtp,
            0x7 => Protocol::Smtps,
            0x8 => Protocol::Loc,
            0x9 => Protocol::Exec,
            0xa => Protocol::Wmo,
            0xb => Protocol::Map,
            0xc => Protocol::Dfax,
            0xd => Protocol::DeMail,
            _ => return None,
        })
    }

    /// Short upper-case name used in rendered rows.
    pub fn short_name(&self) -> &'static str {
        match self {
            Protocol::Ftp => "FTP",
            Protocol::Ftps => "FTPS",
            Protocol::Sftp => "SFTP",
            Protocol::Scp => "SCP",
            Protocol::Http => "HTTP",
            Protocol::Https => "HTTPS",
            Protocol::Smtp => "SMTP",
            Protocol::Smtps => "SMTPS",
            Protocol::Loc => "LOC",
            Protocol::Exec => "EXEC",
            Protocol::Wmo => "WMO",
            Protocol::Map => "MAP",
            Protocol::Dfax => "DFAX",
            Protocol::DeMail => "DEMAIL",
        }
    }

    /// Parse a protocol from its short name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Protocol> {
        let name = name.trim().to_ascii_uppercase();

        ALL_PROTOCOLS
            .iter()
            .copied()
            .find(|p| p.short_name() == name)
    }

    /// The mask bit selecting this protocol.
    pub fn mask_bit(&self) -> ProtocolMask {
        ProtocolMask::from_bits_truncate(1 << (*self as u16))
    }
}

const ALL_PROTOCOLS: [Protocol; 14] = [
    Protocol::Ftp,
    Protocol::Ftps,
    Protocol::Sftp,
    Protocol::Scp,
    Protocol::Http,
    Protocol::Https,
    Protocol::Smtp,
    Protocol::Smtps,
    Protocol::Loc,
    Protocol::Exec,
    Protocol::Wmo,
    Protocol::Map,
    Protocol::Dfax,
    Protocol::DeMail,
];

bitflags::bitflags! {
    /// Bitset over the supported protocols, used as the query toggle mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProtocolMask: u16 {
        const FTP = 1 << 0;
        const FTPS = 1 << 1;
        const SFTP = 1 << 2;
        const SCP = 1 << 3;
        const HTTP = 1 << 4;
        const HTTPS = 1 << 5;
        const SMTP = 1 << 6;
        const SMTPS = 1 << 7;
        const LOC = 1 << 8;
        const EXEC = 1 << 9;
        const WMO = 1 << 10;
        const MAP = 1 << 11;
        const DFAX = 1 << 12;
        const DE_MAIL = 1 << 13;
    }
}

impl Default for ProtocolMask {
    fn default() -> Self {
        ProtocolMask::all()
    }
}

impl Serialize for ProtocolMask {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.bits())
    }
}

impl<'de> Deserialize<'de> for ProtocolMask {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u16::deserialize(deserializer)?;
        Ok(ProtocolMask::from_bits_truncate(bits))
    }
}

impl ProtocolMask {
    /// Whether the mask admits the given protocol.
    pub fn admits(&self, protocol: Protocol) -> bool {
        self.contains(protocol.mask_bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_round_trip() {
        for (digit, expected) in [(b'0', Protocol::Ftp), (b'a', Protocol::Wmo), (b'd', Protocol::DeMail)] {
            assert_eq!(Protocol::from_type_code(digit), Some(expected));
        }

        assert_eq!(Protocol::from_type_code(b'e'), None);
        assert_eq!(Protocol::from_type_code(b'|'), None);
    }

    #[test]
    fn mask_admits_selected_protocols_only() {
        let mask = ProtocolMask::FTP | ProtocolMask::SFTP;

        assert!(mask.admits(Protocol::Ftp));
        assert!(mask.admits(Protocol::Sftp));
        assert!(!mask.admits(Protocol::Smtp));
        assert!(ProtocolMask::default().admits(Protocol::DeMail));
    }

    #[test]
    fn names_round_trip() {
        for protocol in ALL_PROTOCOLS {
            assert_eq!(Protocol::from_name(protocol.short_name()), Some(protocol));
        }

        assert_eq!(Protocol::from_name("de-mail"), None);
        assert_eq!(Protocol::from_name("sftp"), Some(Protocol::Sftp));
    }
}
