use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::Sha1;
use tracing::{info, warn};

use crate::adb::errors::adb_error::AdbError;
use crate::adb::keys::der;
use crate::constants::{ADB_PRIVATE_KEY_FILE, RSA_KEY_BITS};

/// The client's identity: a 2048-bit RSA keypair persisted as `adbkey`
/// (or a caller-chosen file) with a `.pub` sibling holding the `ssh-rsa`
/// line the device shows in its authorization prompt.
#[derive(Clone)]
pub struct AdbKeyStore {
    private_key: RsaPrivateKey,
    public_key_line: String,
}

impl AdbKeyStore {
    /// Reuses the key at `path` when it parses as a 2048-bit RSA private
    /// key; otherwise generates a fresh pair and persists both files.
    pub fn load_or_create(path: &Path) -> Result<Self, AdbError> {
        let private_key_path = resolve_key_path(path);

        if let Some(private_key) = try_load(&private_key_path) {
            let public_key_line = build_public_key_line(&private_key)?;
            return Ok(AdbKeyStore {
                private_key,
                public_key_line,
            });
        }

        info!("Generating new RSA keypair at {}", private_key_path.display());
        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|err| AdbError::KeyGenerationFailed(err.to_string()))?;
        let public_key_line = build_public_key_line(&private_key)?;
        persist(&private_key_path, &private_key, &public_key_line)?;

        Ok(AdbKeyStore {
            private_key,
            public_key_line,
        })
    }

    /// PKCS#1 v1.5 signature over the device-supplied token. The token is
    /// an already-hashed 20-byte value; the SHA-1 parameter only selects
    /// the DigestInfo OID wrapped around it.
    pub fn sign(&self, token: &[u8]) -> Result<Vec<u8>, AdbError> {
        self.private_key
            .sign(Pkcs1v15Sign::new::<Sha1>(), token)
            .map_err(|err| AdbError::ProtocolError(format!("token signing failed: {}", err)))
    }

    pub fn public_key_line(&self) -> &str {
        &self.public_key_line
    }

    #[cfg(test)]
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }
}

/// A directory or extensionless path gets `adbkey` appended; an existing
/// file, or a path carrying an extension, is used verbatim.
fn resolve_key_path(path: &Path) -> PathBuf {
    if path.is_file() {
        return path.to_path_buf();
    }
    if path.is_dir() || path.extension().is_none() {
        return path.join(ADB_PRIVATE_KEY_FILE);
    }
    path.to_path_buf()
}

fn try_load(private_key_path: &Path) -> Option<RsaPrivateKey> {
    let pem = fs::read_to_string(private_key_path).ok()?;

    let private_key = RsaPrivateKey::from_pkcs8_pem(&pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
        .map_err(|err| {
            warn!(
                "Existing key at {} is unusable, regenerating: {}",
                private_key_path.display(),
                err
            );
        })
        .ok()?;

    if private_key.size() * 8 != RSA_KEY_BITS {
        warn!(
            "Existing key at {} is {} bits, regenerating",
            private_key_path.display(),
            private_key.size() * 8
        );
        return None;
    }

    Some(private_key)
}

fn persist(
    private_key_path: &Path,
    private_key: &RsaPrivateKey,
    public_key_line: &str,
) -> Result<(), AdbError> {
    let pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|err| AdbError::KeyGenerationFailed(err.to_string()))?;

    let parent = private_key_path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|err| AdbError::KeyGenerationFailed(err.to_string()))?;

    write_atomically(private_key_path, pem.as_bytes(), true)?;
    write_atomically(
        &public_key_path(private_key_path),
        format!("{}\n", public_key_line).as_bytes(),
        false,
    )
}

/// The public-key line lives next to the private key under the same
/// name plus `.pub`, whatever that name is.
fn public_key_path(private_key_path: &Path) -> PathBuf {
    let mut name = private_key_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from(ADB_PRIVATE_KEY_FILE));
    name.push(".pub");
    private_key_path.with_file_name(name)
}

fn write_atomically(path: &Path, contents: &[u8], private: bool) -> Result<(), AdbError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staging = tempfile::Builder::new()
        .prefix(".adbkey-")
        .tempfile_in(parent)
        .map_err(|err| AdbError::KeyGenerationFailed(err.to_string()))?;

    staging
        .write_all(contents)
        .and_then(|_| staging.flush())
        .map_err(|err| AdbError::KeyGenerationFailed(err.to_string()))?;

    #[cfg(unix)]
    if private {
        use std::os::unix::fs::PermissionsExt;
        staging
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|err| AdbError::KeyGenerationFailed(err.to_string()))?;
    }
    #[cfg(not(unix))]
    let _ = private;

    staging
        .persist(path)
        .map_err(|err| AdbError::KeyGenerationFailed(err.to_string()))?;
    Ok(())
}

/// OpenSSH wire form: three length-prefixed fields (`"ssh-rsa"`, exponent,
/// modulus as mpints), base64-encoded. Modulus and exponent are recovered
/// by walking the key's own DER encoding.
fn build_public_key_line(private_key: &RsaPrivateKey) -> Result<String, AdbError> {
    let document = private_key
        .to_public_key()
        .to_public_key_der()
        .map_err(|err| AdbError::KeyGenerationFailed(err.to_string()))?;
    let components = der::parse_rsa_public_key(document.as_bytes())
        .map_err(AdbError::KeyGenerationFailed)?;

    let mut blob = Vec::new();
    write_ssh_string(&mut blob, b"ssh-rsa");
    write_ssh_string(&mut blob, &to_mpint(&components.exponent));
    write_ssh_string(&mut blob, &to_mpint(&components.modulus));

    Ok(format!(
        "ssh-rsa {} adbeam@{}",
        BASE64.encode(&blob),
        local_hostname()
    ))
}

fn write_ssh_string(blob: &mut Vec<u8>, field: &[u8]) {
    blob.extend_from_slice(&(field.len() as u32).to_be_bytes());
    blob.extend_from_slice(field);
}

/// Big-endian with leading zeros trimmed, then one zero byte restored when
/// the top bit is set.
fn to_mpint(bytes: &[u8]) -> Vec<u8> {
    let first_nonzero = bytes.iter().position(|&byte| byte != 0);
    let trimmed = match first_nonzero {
        Some(index) => &bytes[index..],
        None => return Vec::new(),
    };

    let mut mpint = Vec::with_capacity(trimmed.len() + 1);
    if trimmed[0] & 0x80 != 0 {
        mpint.push(0x00);
    }
    mpint.extend_from_slice(trimmed);
    mpint
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| String::from("localhost"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ADB_PUBLIC_KEY_FILE;
    use once_cell::sync::Lazy;
    use rsa::BigUint;

    static STORE: Lazy<(tempfile::TempDir, AdbKeyStore)> = Lazy::new(|| {
        let dir = tempfile::tempdir().unwrap();
        let store = AdbKeyStore::load_or_create(dir.path()).unwrap();
        (dir, store)
    });

    fn read_ssh_string<'a>(blob: &mut &'a [u8]) -> &'a [u8] {
        let (length_bytes, rest) = blob.split_at(4);
        let length = u32::from_be_bytes(length_bytes.try_into().unwrap()) as usize;
        let (field, rest) = rest.split_at(length);
        *blob = rest;
        field
    }

    #[test]
    fn public_key_line_round_trips_to_key_components() {
        let (_, store) = &*STORE;
        let line = store.public_key_line();
        let mut parts = line.split_whitespace();
        assert_eq!(parts.next(), Some("ssh-rsa"));

        let blob = BASE64.decode(parts.next().unwrap()).unwrap();
        let mut cursor = blob.as_slice();
        assert_eq!(read_ssh_string(&mut cursor), b"ssh-rsa");
        let exponent = BigUint::from_bytes_be(read_ssh_string(&mut cursor));
        let modulus = BigUint::from_bytes_be(read_ssh_string(&mut cursor));
        assert!(cursor.is_empty());

        assert_eq!(&exponent, store.private_key().e());
        assert_eq!(&modulus, store.private_key().n());
    }

    #[test]
    fn persisted_key_loads_back_and_signs_verifiably() {
        let (dir, store) = &*STORE;

        let reloaded = AdbKeyStore::load_or_create(dir.path()).unwrap();
        assert_eq!(reloaded.public_key_line(), store.public_key_line());

        let token = [0x5Au8; 20];
        let signature = reloaded.sign(&token).unwrap();
        assert_eq!(signature.len(), RSA_KEY_BITS / 8);
        store
            .private_key()
            .to_public_key()
            .verify(Pkcs1v15Sign::new::<Sha1>(), &token, &signature)
            .unwrap();
    }

    #[test]
    fn key_path_resolution_appends_adbkey() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_key_path(dir.path()),
            dir.path().join(ADB_PRIVATE_KEY_FILE)
        );
        assert_eq!(
            resolve_key_path(&dir.path().join("keys")),
            dir.path().join("keys").join(ADB_PRIVATE_KEY_FILE)
        );

        let explicit = dir.path().join("device.pem");
        assert_eq!(resolve_key_path(&explicit), explicit);

        let existing = dir.path().join(ADB_PRIVATE_KEY_FILE);
        fs::write(&existing, "placeholder").unwrap();
        assert_eq!(resolve_key_path(&existing), existing);
    }

    #[test]
    fn garbage_key_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join(ADB_PRIVATE_KEY_FILE);
        fs::write(&key_path, "not a key").unwrap();

        let store = AdbKeyStore::load_or_create(dir.path()).unwrap();
        let pem = fs::read_to_string(&key_path).unwrap();
        assert!(pem.contains("PRIVATE KEY"));
        assert!(store.public_key_line().starts_with("ssh-rsa "));
        assert!(dir.path().join(ADB_PUBLIC_KEY_FILE).exists());
    }

    #[test]
    fn custom_key_filename_gets_matching_pub_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("device.pem");
        fs::write(&key_path, "not a key").unwrap();

        let store = AdbKeyStore::load_or_create(&key_path).unwrap();
        assert!(fs::read_to_string(&key_path).unwrap().contains("PRIVATE KEY"));

        let pub_path = dir.path().join("device.pem.pub");
        assert_eq!(
            fs::read_to_string(&pub_path).unwrap().trim_end(),
            store.public_key_line()
        );
        assert!(!dir.path().join(ADB_PUBLIC_KEY_FILE).exists());
    }

    #[test]
    fn mpint_trims_and_pads() {
        assert_eq!(to_mpint(&[0x00, 0x00, 0x7F]), vec![0x7F]);
        assert_eq!(to_mpint(&[0x00, 0x80, 0x01]), vec![0x00, 0x80, 0x01]);
        assert_eq!(to_mpint(&[0x01, 0x00, 0x01]), vec![0x01, 0x00, 0x01]);
        assert!(to_mpint(&[0x00, 0x00]).is_empty());
    }
}
