//! Just enough DER to pull the modulus and exponent out of an RSA public
//! key, whether it arrives as a bare PKCS#1 `RSAPublicKey` or wrapped in a
//! SubjectPublicKeyInfo.

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_SEQUENCE: u8 = 0x30;

#[derive(Debug, PartialEq, Eq)]
pub struct RsaPublicComponents {
    pub modulus: Vec<u8>,
    pub exponent: Vec<u8>,
}

struct DerReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> DerReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn read_byte(&mut self) -> Result<u8, String> {
        let byte = *self
            .bytes
            .get(self.position)
            .ok_or_else(|| String::from("truncated DER input"))?;
        self.position += 1;
        Ok(byte)
    }

    /// Reads a tag and a short- or long-form length.
    fn read_header(&mut self) -> Result<(u8, usize), String> {
        let tag = self.read_byte()?;
        let first = self.read_byte()?;

        let length = if first < 0x80 {
            first as usize
        } else {
            let length_octets = (first & 0x7F) as usize;
            if length_octets == 0 || length_octets > 4 {
                return Err(format!("unsupported DER length form: {:#04x}", first));
            }
            let mut length = 0usize;
            for _ in 0..length_octets {
                length = (length << 8) | self.read_byte()? as usize;
            }
            length
        };

        Ok((tag, length))
    }

    fn read_element(&mut self) -> Result<(u8, &'a [u8]), String> {
        let (tag, length) = self.read_header()?;
        let start = self.position;
        let end = start
            .checked_add(length)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| String::from("DER element overruns input"))?;
        self.position = end;
        Ok((tag, &self.bytes[start..end]))
    }
}

/// Accepts either a PKCS#1 `RSAPublicKey` (SEQUENCE of two INTEGERs) or a
/// SubjectPublicKeyInfo whose BIT STRING carries the PKCS#1 encoding.
pub fn parse_rsa_public_key(der: &[u8]) -> Result<RsaPublicComponents, String> {
    let mut outer = DerReader::new(der);
    let (tag, body) = outer.read_element()?;
    if tag != TAG_SEQUENCE {
        return Err(format!("expected SEQUENCE, found tag {:#04x}", tag));
    }

    let mut inner = DerReader::new(body);
    let (tag, first) = inner.read_element()?;
    match tag {
        TAG_INTEGER => {
            let (second_tag, second) = inner.read_element()?;
            if second_tag != TAG_INTEGER {
                return Err(format!(
                    "expected INTEGER exponent, found tag {:#04x}",
                    second_tag
                ));
            }
            Ok(RsaPublicComponents {
                modulus: first.to_vec(),
                exponent: second.to_vec(),
            })
        }
        // AlgorithmIdentifier consumed; the key itself sits in a BIT STRING.
        TAG_SEQUENCE => {
            let (bits_tag, bit_string) = inner.read_element()?;
            if bits_tag != TAG_BIT_STRING {
                return Err(format!(
                    "expected BIT STRING, found tag {:#04x}",
                    bits_tag
                ));
            }
            match bit_string.split_first() {
                Some((0, pkcs1)) => parse_rsa_public_key(pkcs1),
                Some((unused, _)) => {
                    Err(format!("unsupported BIT STRING unused bits: {}", unused))
                }
                None => Err(String::from("empty BIT STRING")),
            }
        }
        other => Err(format!("unexpected tag {:#04x} inside SEQUENCE", other)),
    }
}
