use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::adb::enums::adb_command::AdbCommand;
use crate::adb::errors::adb_error::AdbError;
use crate::constants::ADB_HEADER_SIZE;

const BITWISE_INVERT_MASK: u32 = 0xFFFFFFFF;

/// One transport-layer packet: a 24-byte header followed by `data`.
#[derive(Debug, Clone)]
pub struct AdbPacket {
    command: AdbCommand,
    arg0: u32,
    arg1: u32,
    data: Vec<u8>,
}

/// Header fields as decoded off the wire, before the payload is read.
#[derive(Debug, Clone, Copy)]
pub struct AdbPacketHeader {
    pub command: AdbCommand,
    pub arg0: u32,
    pub arg1: u32,
    pub data_length: u32,
    pub checksum: u32,
}

impl AdbPacket {
    pub fn new(command: AdbCommand, arg0: u32, arg1: u32, data: Vec<u8>) -> Self {
        AdbPacket {
            command,
            arg0,
            arg1,
            data,
        }
    }

    pub fn command(&self) -> AdbCommand {
        self.command
    }

    pub fn arg0(&self) -> u32 {
        self.arg0
    }

    pub fn arg1(&self) -> u32 {
        self.arg1
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn checksum(&self) -> u32 {
        checksum(&self.data)
    }

    /// Packs the six little-endian header fields followed by the payload.
    pub fn encode(&self) -> Vec<u8> {
        let command = self.command.code();
        let mut packed = Vec::with_capacity(ADB_HEADER_SIZE + self.data.len());
        packed.write_u32::<LittleEndian>(command).unwrap();
        packed.write_u32::<LittleEndian>(self.arg0).unwrap();
        packed.write_u32::<LittleEndian>(self.arg1).unwrap();
        packed.write_u32::<LittleEndian>(self.data.len() as u32).unwrap();
        packed.write_u32::<LittleEndian>(self.checksum()).unwrap();
        packed.write_u32::<LittleEndian>(command ^ BITWISE_INVERT_MASK).unwrap();
        packed.extend_from_slice(&self.data);
        packed
    }

    /// Unpacks a 24-byte header. The command set and the XOR magic are
    /// validated; the checksum field is carried through unverified because
    /// modern peers may send zero.
    pub fn decode_header(header_bytes: &[u8]) -> Result<AdbPacketHeader, AdbError> {
        if header_bytes.len() < ADB_HEADER_SIZE {
            return Err(AdbError::ProtocolError(String::from(
                "buffer is too short to unpack",
            )));
        }

        let mut cursor = Cursor::new(header_bytes);
        let command_code = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| AdbError::ProtocolError(e.to_string()))?;
        let arg0 = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| AdbError::ProtocolError(e.to_string()))?;
        let arg1 = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| AdbError::ProtocolError(e.to_string()))?;
        let data_length = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| AdbError::ProtocolError(e.to_string()))?;
        let checksum = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| AdbError::ProtocolError(e.to_string()))?;
        let magic = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| AdbError::ProtocolError(e.to_string()))?;

        if magic != command_code ^ BITWISE_INVERT_MASK {
            return Err(AdbError::ProtocolError(String::from("invalid magic")));
        }

        let command = AdbCommand::try_from(command_code)
            .map_err(|_| AdbError::ProtocolError(String::from("unknown command")))?;

        Ok(AdbPacketHeader {
            command,
            arg0,
            arg1,
            data_length,
            checksum,
        })
    }
}

pub fn checksum(data: &[u8]) -> u32 {
    data.iter().fold(0u32, |sum, &byte| sum.wrapping_add(byte as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CNXN_CODE, WRTE_CODE};

    fn decode(bytes: &[u8]) -> (AdbPacketHeader, Vec<u8>) {
        let header = AdbPacket::decode_header(&bytes[..ADB_HEADER_SIZE]).unwrap();
        let data = bytes[ADB_HEADER_SIZE..ADB_HEADER_SIZE + header.data_length as usize].to_vec();
        (header, data)
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let packet = AdbPacket::new(AdbCommand::Wrte, 7, 42, b"hello device".to_vec());
        let encoded = packet.encode();
        assert_eq!(encoded.len(), ADB_HEADER_SIZE + 12);

        let (header, data) = decode(&encoded);
        assert_eq!(header.command, AdbCommand::Wrte);
        assert_eq!(header.arg0, 7);
        assert_eq!(header.arg1, 42);
        assert_eq!(header.data_length, 12);
        assert_eq!(header.checksum, packet.checksum());
        assert_eq!(data, b"hello device");

        let rebuilt = AdbPacket::new(header.command, header.arg0, header.arg1, data);
        assert_eq!(rebuilt.encode(), encoded);
    }

    #[test]
    fn header_layout_is_little_endian() {
        let packet = AdbPacket::new(AdbCommand::Cnxn, 0x01000000, 4096, vec![0x01, 0x02]);
        let encoded = packet.encode();

        assert_eq!(&encoded[0..4], &CNXN_CODE.to_le_bytes());
        assert_eq!(&encoded[4..8], &0x01000000u32.to_le_bytes());
        assert_eq!(&encoded[8..12], &4096u32.to_le_bytes());
        assert_eq!(&encoded[12..16], &2u32.to_le_bytes());
        assert_eq!(&encoded[16..20], &3u32.to_le_bytes());
        assert_eq!(&encoded[20..24], &(CNXN_CODE ^ 0xFFFFFFFF).to_le_bytes());
    }

    #[test]
    fn checksum_is_unsigned_byte_sum() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[1, 2, 3]), 6);
        assert_eq!(checksum(&[0xFF; 4]), 0x3FC);

        let wrapping = vec![0xFFu8; 0x0300_0000];
        let expected = (0x0300_0000u64 * 0xFF) as u32;
        assert_eq!(checksum(&wrapping), expected);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let packet = AdbPacket::new(AdbCommand::Okay, 1, 2, Vec::new());
        let mut encoded = packet.encode();
        encoded[20] ^= 0x01;

        match AdbPacket::decode_header(&encoded) {
            Err(AdbError::ProtocolError(msg)) => assert_eq!(msg, "invalid magic"),
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        let bogus: u32 = 0x12345678;
        let mut encoded = Vec::new();
        encoded.extend_from_slice(&bogus.to_le_bytes());
        encoded.extend_from_slice(&[0u8; 12]);
        encoded.extend_from_slice(&0u32.to_le_bytes());
        encoded.extend_from_slice(&(bogus ^ 0xFFFFFFFF).to_le_bytes());

        match AdbPacket::decode_header(&encoded) {
            Err(AdbError::ProtocolError(msg)) => assert_eq!(msg, "unknown command"),
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn zero_checksum_from_peer_is_accepted() {
        let packet = AdbPacket::new(AdbCommand::Wrte, 17, 1, b"payload".to_vec());
        let mut encoded = packet.encode();
        encoded[16..20].copy_from_slice(&0u32.to_le_bytes());

        let header = AdbPacket::decode_header(&encoded).unwrap();
        assert_eq!(header.checksum, 0);
        assert_eq!(header.command.code(), WRTE_CODE);
    }
}
