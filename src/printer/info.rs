use super::{backend::UsbBackend, io::Error as TransferError, Printer};

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str;

use thiserror::Error;
use tracing::{debug, warn};

/// Returned by `command_set` when the printer did not answer with a number.
pub const UNKNOWN_COMMAND_SET: i32 = -1;

const GET_COMMAND_SET: [u8; 4] = [0x1d, 0xf9, 0x43, 0x00];

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("The printer sent an empty reply.")]
    EmptyReply,

    #[error("The printer reply {reply:?} is not a number.")]
    NotNumeric { reply: String },
}

/// The metadata fields the printer can be asked for, in query order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InfoField {
    ProductCode,
    SerialNumber,
    ManufacturingDate,
    FirmwareVersion,
    ManufacturingTimestamp,
    Interface,
}

impl InfoField {
    pub const ALL: [InfoField; 6] = [
        InfoField::ProductCode,
        InfoField::SerialNumber,
        InfoField::ManufacturingDate,
        InfoField::FirmwareVersion,
        InfoField::ManufacturingTimestamp,
        InfoField::Interface,
    ];

    pub fn name(&self) -> &'static str {
        use InfoField::*;

        match self {
            ProductCode => "ProductCode",
            SerialNumber => "SerialNumber",
            ManufacturingDate => "ManufacturingDate",
            FirmwareVersion => "FirmwareVersion",
            ManufacturingTimestamp => "ManufacturingTimestamp",
            Interface => "Interface",
        }
    }

    /// GS 0xF9 ' n
    pub fn query(&self) -> [u8; 4] {
        use InfoField::*;

        let selector = match self {
            ProductCode => 0x00,
            SerialNumber => 0x31,
            ManufacturingDate => 0x32,
            FirmwareVersion => 0x33,
            ManufacturingTimestamp => 0x35,
            Interface => 0x38,
        };

        [0x1d, 0xf9, 0x27, selector]
    }
}

impl Display for InfoField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<&str> for InfoField {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        InfoField::ALL
            .into_iter()
            .find(|field| field.name() == value)
            .ok_or_else(|| format!("Unknown product info field: {}", value))
    }
}

/// Raw replies to the product info queries.
/// A field is only present if its query got a non-empty reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductInfo {
    fields: BTreeMap<InfoField, Vec<u8>>,
}

impl ProductInfo {
    pub fn get(&self, field: InfoField) -> Option<&[u8]> {
        self.fields.get(&field).map(Vec::as_slice)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&[u8]> {
        InfoField::try_from(name).ok().and_then(|field| self.get(field))
    }

    /// The reply as text, with trailing padding removed.
    pub fn text(&self, field: InfoField) -> Option<String> {
        self.get(field).map(reply_text)
    }

    pub fn insert(&mut self, field: InfoField, value: Vec<u8>) {
        self.fields.insert(field, value);
    }

    pub fn contains(&self, field: InfoField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InfoField, &[u8])> {
        self.fields.iter().map(|(field, value)| (*field, value.as_slice()))
    }
}

fn reply_text(reply: &[u8]) -> String {
    String::from_utf8_lossy(reply)
        .trim_matches(|c: char| c == '\0' || c.is_ascii_whitespace())
        .to_string()
}

/// Parse a command set reply. Replies are ASCII digits, possibly padded.
pub(super) fn parse_command_set(reply: &[u8]) -> Result<i32, Error> {
    if reply.is_empty() {
        return Err(Error::EmptyReply);
    }

    let text = reply_text(reply);

    text.parse::<i32>().map_err(|_| Error::NotNumeric {
        reply: String::from_utf8_lossy(reply).into_owned(),
    })
}

impl<B: UsbBackend> Printer<B> {
    pub fn try_command_set(&self) -> Result<i32, Error> {
        self.write(&GET_COMMAND_SET)?;
        let reply = self.try_read(self.in_addr)?;

        parse_command_set(&reply)
    }

    /// The command set identifier, or `UNKNOWN_COMMAND_SET` if the query failed.
    pub fn command_set(&self) -> i32 {
        self.try_command_set().unwrap_or_else(|err| {
            warn!("Failed to query the command set: {}", err);
            UNKNOWN_COMMAND_SET
        })
    }

    /// Ask for every metadata field. A failing field is skipped; the others are still queried.
    pub fn product_info(&self) -> ProductInfo {
        let mut info = ProductInfo::default();

        for field in InfoField::ALL {
            if let Err(err) = self.write(&field.query()) {
                warn!("Failed to query {}: {}", field, err);
                continue;
            }

            let reply = self.read(self.in_addr);

            if reply.is_empty() {
                debug!("No reply for {}", field);
                continue;
            }

            info.insert(field, reply);
        }

        info
    }
}
